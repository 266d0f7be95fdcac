//! Karma-based underwriting and loan application checks.
//!
//! The score itself comes from the external scoring service; the
//! rate/limit table and the request gates mirror what the marketplace
//! enforces before a transaction is attempted.

use bigdecimal::{BigDecimal, FromPrimitive, Signed, Zero};
use serde::{Deserialize, Serialize};

use crate::{
    derivation::LoanStatus,
    error::Error,
    metadata::{EmergencyContact, EmergencyContacts, LoanMetadata},
    model::LoanView,
    types::{FicoScore, LoanCategory},
};

/// Wallets scoring below this are rejected outright.
pub const MIN_APPROVAL_SCORE: f64 = 60.0;

/// Terms offered for an approved score bracket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub interest_rate: f64,
    pub max_loan_amount: f64,
}

/// Bank-style bracket table: better karma, cheaper and larger credit.
pub fn underwrite(score: f64) -> Option<LoanTerms> {
    if score >= 90.0 {
        Some(LoanTerms { interest_rate: 4.0, max_loan_amount: 1500.0 })
    } else if score >= 80.0 {
        Some(LoanTerms { interest_rate: 6.5, max_loan_amount: 800.0 })
    } else if score >= 70.0 {
        Some(LoanTerms { interest_rate: 10.0, max_loan_amount: 200.0 })
    } else if score >= MIN_APPROVAL_SCORE {
        Some(LoanTerms { interest_rate: 15.0, max_loan_amount: 10.0 })
    } else {
        None
    }
}

/// Display bracket for a 0-100 karma score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KarmaTier {
    Legendary,
    Master,
    Elite,
    Skilled,
    Rookie,
}

impl KarmaTier {
    pub fn from_score(score: f64) -> KarmaTier {
        if score >= 90.0 {
            KarmaTier::Legendary
        } else if score >= 75.0 {
            KarmaTier::Master
        } else if score >= 60.0 {
            KarmaTier::Elite
        } else if score >= 40.0 {
            KarmaTier::Skilled
        } else {
            KarmaTier::Rookie
        }
    }

    pub fn range(&self) -> &'static str {
        match self {
            KarmaTier::Legendary => "90-100",
            KarmaTier::Master => "75-89",
            KarmaTier::Elite => "60-74",
            KarmaTier::Skilled => "40-59",
            KarmaTier::Rookie => "0-39",
        }
    }
}

/// A borrower's loan application as submitted to the marketplace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanApplication {
    pub amount: BigDecimal,
    #[serde(alias = "duration")]
    pub duration_months: u32,
    pub description: String,
    pub category: LoanCategory,
    #[serde(default)]
    pub supporting_image: Option<String>,
    pub emergency_contact1: EmergencyContact,
    pub emergency_contact2: EmergencyContact,
}

impl LoanApplication {
    pub fn to_metadata(&self) -> LoanMetadata {
        LoanMetadata {
            description: self.description.to_owned(),
            category: self.category,
            supporting_image: self.supporting_image.to_owned(),
            emergency_contacts: Some(EmergencyContacts {
                contact1: self.emergency_contact1.to_owned(),
                contact2: self.emergency_contact2.to_owned(),
            }),
        }
    }
}

/// Phone check applied after stripping everything but digits and `+`:
/// optional leading `+`, first digit nonzero, at most 16 digits.
pub fn is_valid_phone(value: &str) -> bool {
    let cleaned: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();

    let digits = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    if digits.is_empty() || digits.len() > 16 || digits.contains('+') {
        return false;
    }

    digits.starts_with(|c: char| ('1'..='9').contains(&c))
        && digits.chars().all(|c| c.is_ascii_digit())
}

fn validate_contact(
    contact: &EmergencyContact,
    which: &str,
) -> Result<(), Error> {
    if contact.name.trim().is_empty() || contact.phone.trim().is_empty() {
        return Err(Error::Validation(format!(
            "Emergency contact {} must have a name and a phone number",
            which
        )));
    }
    if !is_valid_phone(&contact.phone) {
        return Err(Error::Validation(format!(
            "Emergency contact {} has an invalid phone number",
            which
        )));
    }
    Ok(())
}

/// Gate a loan application before anything is signed. Returns the
/// interest rate the borrower's karma entitles them to.
pub fn validate_application(
    application: &LoanApplication,
    score: &FicoScore,
    borrower_loans: &[LoanView],
) -> Result<f64, Error> {
    let interest_rate = score.interest_rate.ok_or(Error::KarmaTooLow)?;

    if !application.amount.is_positive() {
        return Err(Error::Validation(String::from(
            "Loan amount must be positive",
        )));
    }

    let max_amount = BigDecimal::from_f64(score.max_loan_amount)
        .unwrap_or_else(BigDecimal::zero);
    if application.amount > max_amount {
        return Err(Error::Validation(format!(
            "Loan amount exceeds the karma limit of {}",
            score.max_loan_amount
        )));
    }

    if application.duration_months == 0 {
        return Err(Error::Validation(String::from(
            "Loan duration must be at least one month",
        )));
    }

    validate_contact(&application.emergency_contact1, "1")?;
    validate_contact(&application.emergency_contact2, "2")?;

    if let Some(image) = &application.supporting_image {
        crate::metadata::validate_data_uri(image)?;
    }

    let has_open_loan = borrower_loans.iter().any(|loan| {
        matches!(loan.status, LoanStatus::Pending | LoanStatus::Active)
    });
    if has_open_loan {
        return Err(Error::Validation(String::from(
            "Only one loan at a time; pay off the current loan first",
        )));
    }

    Ok(interest_rate)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn score(value: f64) -> FicoScore {
        FicoScore {
            fico_score: value,
            interest_rate: underwrite(value).map(|t| t.interest_rate),
            max_loan_amount: underwrite(value)
                .map(|t| t.max_loan_amount)
                .unwrap_or(0.0),
        }
    }

    fn application(amount: &str) -> LoanApplication {
        LoanApplication {
            amount: BigDecimal::from_str(amount).unwrap(),
            duration_months: 12,
            description: String::from("expand the workshop"),
            category: LoanCategory::Crafts,
            supporting_image: None,
            emergency_contact1: EmergencyContact {
                name: String::from("Ana"),
                phone: String::from("+1 (555) 123-4567"),
            },
            emergency_contact2: EmergencyContact {
                name: String::from("Luis"),
                phone: String::from("5557654321"),
            },
        }
    }

    #[test]
    fn underwriting_brackets() {
        assert_eq!(
            underwrite(92.0),
            Some(LoanTerms { interest_rate: 4.0, max_loan_amount: 1500.0 })
        );
        assert_eq!(
            underwrite(90.0),
            Some(LoanTerms { interest_rate: 4.0, max_loan_amount: 1500.0 })
        );
        assert_eq!(underwrite(80.0).unwrap().interest_rate, 6.5);
        assert_eq!(underwrite(70.0).unwrap().max_loan_amount, 200.0);
        assert_eq!(underwrite(60.0).unwrap().interest_rate, 15.0);
        assert_eq!(underwrite(59.9), None);
    }

    #[test]
    fn tier_brackets() {
        assert_eq!(KarmaTier::from_score(95.0), KarmaTier::Legendary);
        assert_eq!(KarmaTier::from_score(75.0), KarmaTier::Master);
        assert_eq!(KarmaTier::from_score(74.9), KarmaTier::Elite);
        assert_eq!(KarmaTier::from_score(40.0), KarmaTier::Skilled);
        assert_eq!(KarmaTier::from_score(12.0), KarmaTier::Rookie);
    }

    #[test]
    fn phone_validation() {
        assert!(is_valid_phone("+1 (555) 123-4567"));
        assert!(is_valid_phone("5551234567"));
        assert!(!is_valid_phone("0123456"));
        assert!(!is_valid_phone(""));
        assert!(!is_valid_phone("abc"));
        assert!(!is_valid_phone("+"));
        assert!(!is_valid_phone("12345678901234567"));
    }

    #[test]
    fn application_passes_for_good_karma() {
        let rate =
            validate_application(&application("150"), &score(85.0), &[])
                .unwrap();
        assert_eq!(rate, 6.5);
    }

    #[test]
    fn application_rejected_below_floor() {
        let result =
            validate_application(&application("150"), &score(50.0), &[]);
        assert!(matches!(result, Err(Error::KarmaTooLow)));
    }

    #[test]
    fn application_rejected_above_limit() {
        let result =
            validate_application(&application("250"), &score(70.0), &[]);
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn one_open_loan_blocks_a_second_application() {
        use chrono::{TimeZone, Utc};

        use crate::{
            derivation::derive_loan_view, metadata::LoanMetadata,
            model::{LoanRecord, LoanView},
        };

        let record = LoanRecord {
            id: 0,
            borrower: String::from(
                "0x1234567890123456789012345678901234567890",
            ),
            token_address: String::new(),
            principal: BigDecimal::from(100),
            interest_bps: 650,
            due_date: Utc.with_ymd_and_hms(2031, 1, 1, 0, 0, 0).unwrap(),
            funded: false,
            repaid: false,
            monthly_payment: None,
            total_paid: BigDecimal::zero(),
            duration_months: Some(12),
            metadata_cid: String::new(),
        };
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let derived = derive_loan_view(&record, now);
        let open_loan =
            LoanView::from_parts(record, LoanMetadata::default(), derived);

        let result = validate_application(
            &application("150"),
            &score(85.0),
            &[open_loan],
        );
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn application_rejected_with_bad_contact() {
        let mut application = application("150");
        application.emergency_contact2.phone = String::from("0");
        let result =
            validate_application(&application, &score(85.0), &[]);
        assert!(matches!(result, Err(Error::Validation(_))));
    }
}
