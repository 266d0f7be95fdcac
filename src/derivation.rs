//! Pure schedule derivation over raw loan records.
//!
//! Every dashboard reads one validated structure computed here instead of
//! re-deriving balances ad hoc. All degenerate inputs (missing monthly
//! payment, zero duration, overpayment) produce zeroed or clamped output,
//! never an error.

use std::cmp;

use bigdecimal::{
    num_bigint::BigInt, rounding::RoundingMode, BigDecimal, Signed,
    ToPrimitive, Zero,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::{LoanRecord, LoanView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Pending,
    Active,
    Repaid,
    Defaulted,
}

/// Schedule state computed from one [`LoanRecord`]; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedLoanView {
    pub total_amount: BigDecimal,
    pub remaining_balance: BigDecimal,
    pub payments_remaining: u32,
    /// Ratio of total paid to total owed, unclamped.
    pub payment_progress: BigDecimal,
    /// Display progress, clamped to [0, 100] percent.
    pub progress_percent: BigDecimal,
    pub status: LoanStatus,
}

/// The raw figures the return split depends on, extractable from either
/// a chain record or an assembled view.
#[derive(Debug, Clone, PartialEq)]
pub struct RepaymentBasis {
    pub loan_id: u64,
    pub principal: BigDecimal,
    pub monthly_payment: Option<BigDecimal>,
    pub duration_months: Option<u32>,
    pub total_paid: BigDecimal,
}

impl From<&LoanRecord> for RepaymentBasis {
    fn from(record: &LoanRecord) -> RepaymentBasis {
        RepaymentBasis {
            loan_id: record.id,
            principal: record.principal.to_owned(),
            monthly_payment: record.monthly_payment.to_owned(),
            duration_months: record.duration_months,
            total_paid: record.total_paid.to_owned(),
        }
    }
}

impl From<&LoanView> for RepaymentBasis {
    fn from(view: &LoanView) -> RepaymentBasis {
        RepaymentBasis {
            loan_id: view.id,
            principal: view.amount.to_owned(),
            monthly_payment: view.monthly_payment.to_owned(),
            duration_months: view.duration,
            total_paid: view.total_paid.to_owned(),
        }
    }
}

/// Fixed-interest split for the investor side of a funded loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentReturn {
    pub total_interest: BigDecimal,
    pub interest_earned: BigDecimal,
    pub remaining_interest: BigDecimal,
    pub payments_received: u32,
    pub payment_progress: BigDecimal,
    pub is_complete: bool,
}

/// A loan counts as repaid once payments cover this share of the total,
/// which absorbs fixed-point rounding slack in the last installment.
fn completion_factor() -> BigDecimal {
    BigDecimal::new(BigInt::from(98), 2)
}

fn monthly_payment_of(record: &LoanRecord) -> BigDecimal {
    record.monthly_payment.to_owned().unwrap_or_else(BigDecimal::zero)
}

fn duration_of(record: &LoanRecord) -> u32 {
    cmp::max(record.duration_months.unwrap_or(1), 1)
}

/// Derive schedule state. Pure: same record and instant always yield the
/// same view.
pub fn derive_loan_view(
    record: &LoanRecord,
    now: DateTime<Utc>,
) -> DerivedLoanView {
    let monthly_payment = monthly_payment_of(record);
    let duration = duration_of(record);

    let total_amount = &monthly_payment * BigDecimal::from(duration);
    let remaining_balance = cmp::max(
        &total_amount - &record.total_paid,
        BigDecimal::zero(),
    );

    let payments_remaining = if monthly_payment.is_zero() {
        0
    } else {
        let pending = (&remaining_balance / &monthly_payment)
            .with_scale_round(0, RoundingMode::Ceiling)
            .to_u32()
            .unwrap_or(duration);
        cmp::min(duration, pending)
    };

    let payment_progress = if total_amount.is_zero() {
        BigDecimal::zero()
    } else {
        &record.total_paid / &total_amount
    };

    let progress_percent = cmp::min(
        cmp::max(&payment_progress * BigDecimal::from(100), BigDecimal::zero()),
        BigDecimal::from(100),
    );

    let status = derive_status(record, &total_amount, now);

    DerivedLoanView {
        total_amount,
        remaining_balance,
        payments_remaining,
        payment_progress,
        progress_percent,
        status,
    }
}

fn derive_status(
    record: &LoanRecord,
    total_amount: &BigDecimal,
    now: DateTime<Utc>,
) -> LoanStatus {
    let paid_through = !total_amount.is_zero()
        && record.total_paid >= total_amount * completion_factor();

    // The threshold overrides a stale contract flag.
    if record.repaid || paid_through {
        LoanStatus::Repaid
    } else if !record.funded {
        LoanStatus::Pending
    } else if record.due_date < now {
        LoanStatus::Defaulted
    } else {
        LoanStatus::Active
    }
}

/// Split the fixed total interest of a funded loan into earned and
/// remaining parts, proportional to payment progress.
pub fn derive_investment_return(basis: &RepaymentBasis) -> InvestmentReturn {
    let monthly_payment =
        basis.monthly_payment.to_owned().unwrap_or_else(BigDecimal::zero);
    let duration = cmp::max(basis.duration_months.unwrap_or(1), 1);

    let total_amount = &monthly_payment * BigDecimal::from(duration);
    let total_interest = &total_amount - &basis.principal;

    if total_interest.is_negative() {
        // Upstream data inconsistency: repayment total below principal.
        // Reported as-is rather than masked.
        warn!(
            loan = basis.loan_id,
            total_interest = %total_interest,
            "total repayment is below principal"
        );
    }

    let payment_progress = if total_amount.is_zero() {
        BigDecimal::zero()
    } else {
        &basis.total_paid / &total_amount
    };

    let interest_earned = &total_interest * &payment_progress;
    let remaining_interest = &total_interest - &interest_earned;

    let payments_received = if monthly_payment.is_zero() {
        0
    } else {
        (&basis.total_paid / &monthly_payment)
            .with_scale_round(0, RoundingMode::Down)
            .to_u32()
            .unwrap_or(0)
    };

    let is_complete = !total_amount.is_zero()
        && basis.total_paid >= &total_amount * completion_factor();

    InvestmentReturn {
        total_interest,
        interest_earned,
        remaining_interest,
        payments_received,
        payment_progress,
        is_complete,
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::TimeZone;

    use super::*;

    fn record(
        principal: &str,
        monthly_payment: Option<&str>,
        duration_months: Option<u32>,
        total_paid: &str,
    ) -> LoanRecord {
        LoanRecord {
            id: 0,
            borrower: String::from(
                "0x1234567890123456789012345678901234567890",
            ),
            token_address: String::from(
                "0x0000000000000000000000000000000000000000",
            ),
            principal: BigDecimal::from_str(principal).unwrap(),
            interest_bps: 1000,
            due_date: Utc.with_ymd_and_hms(2031, 1, 1, 0, 0, 0).unwrap(),
            funded: true,
            repaid: false,
            monthly_payment: monthly_payment
                .map(|value| BigDecimal::from_str(value).unwrap()),
            total_paid: BigDecimal::from_str(total_paid).unwrap(),
            duration_months,
            metadata_cid: String::new(),
        }
    }

    fn eval_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn amortized_schedule_matches_contract_figures() {
        // 1000 principal at 10% over 12 months, 3 installments in.
        let record = record("1000", Some("95.83"), Some(12), "287.49");
        let view = derive_loan_view(&record, eval_instant());

        assert_eq!(view.total_amount, BigDecimal::from_str("1149.96").unwrap());
        assert_eq!(
            view.remaining_balance,
            BigDecimal::from_str("862.47").unwrap()
        );
        assert_eq!(view.payments_remaining, 9);
        assert_eq!(view.status, LoanStatus::Active);

        let progress = view.payment_progress.to_f64().unwrap();
        assert!((progress - 0.25).abs() < 1e-3);

        let returns = derive_investment_return(&RepaymentBasis::from(&record));
        assert_eq!(returns.payments_received, 3);
        assert!(!returns.is_complete);
    }

    #[test]
    fn zero_monthly_payment_divides_nothing() {
        let record = record("1000", Some("0"), Some(12), "50");
        let view = derive_loan_view(&record, eval_instant());

        assert_eq!(view.payments_remaining, 0);
        assert_eq!(view.total_amount, BigDecimal::zero());
        assert_eq!(view.remaining_balance, BigDecimal::zero());
        assert_eq!(view.payment_progress, BigDecimal::zero());

        let returns = derive_investment_return(&RepaymentBasis::from(&record));
        assert_eq!(returns.payments_received, 0);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let record = record("1000", None, None, "0");
        let view = derive_loan_view(&record, eval_instant());

        assert_eq!(view.total_amount, BigDecimal::zero());
        assert_eq!(view.payments_remaining, 0);
        assert_eq!(view.status, LoanStatus::Active);
    }

    #[test]
    fn overpayment_never_goes_negative() {
        let record = record("1000", Some("100"), Some(10), "1000.07");
        let view = derive_loan_view(&record, eval_instant());

        assert_eq!(view.remaining_balance, BigDecimal::zero());
        assert_eq!(view.progress_percent, BigDecimal::from(100));
        assert_eq!(view.status, LoanStatus::Repaid);
    }

    #[test]
    fn derivation_is_idempotent() {
        let record = record("850", Some("78.54"), Some(18), "235.62");
        let now = eval_instant();

        assert_eq!(
            derive_loan_view(&record, now),
            derive_loan_view(&record, now)
        );
        assert_eq!(
            derive_investment_return(&RepaymentBasis::from(&record)),
            derive_investment_return(&RepaymentBasis::from(&record))
        );
    }

    #[test]
    fn interest_split_sums_to_total() {
        for paid in ["0", "287.49", "574.98", "1149.96"] {
            let record = record("1000", Some("95.83"), Some(12), paid);
            let returns = derive_investment_return(&RepaymentBasis::from(&record));

            assert_eq!(
                &returns.interest_earned + &returns.remaining_interest,
                returns.total_interest
            );
        }
    }

    #[test]
    fn negative_interest_is_reported_not_masked() {
        // Total repayment below principal: inconsistent upstream data.
        let record = record("2000", Some("100"), Some(10), "500");
        let returns = derive_investment_return(&RepaymentBasis::from(&record));

        assert_eq!(
            returns.total_interest,
            BigDecimal::from_str("-1000").unwrap()
        );
        assert!(returns.total_interest.is_negative());
    }

    #[test]
    fn near_complete_payment_reads_repaid_despite_stale_flag() {
        let record = record("1000", Some("100"), Some(10), "980");
        let view = derive_loan_view(&record, eval_instant());

        assert_eq!(view.status, LoanStatus::Repaid);

        let returns = derive_investment_return(&RepaymentBasis::from(&record));
        assert!(returns.is_complete);
    }

    #[test]
    fn unfunded_loan_is_pending() {
        let mut unfunded = record("1000", Some("100"), Some(10), "0");
        unfunded.funded = false;
        let view = derive_loan_view(&unfunded, eval_instant());

        assert_eq!(view.status, LoanStatus::Pending);
    }

    #[test]
    fn past_due_active_loan_is_defaulted() {
        let mut record = record("1000", Some("100"), Some(10), "300");
        record.due_date = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let view = derive_loan_view(&record, eval_instant());

        assert_eq!(view.status, LoanStatus::Defaulted);
    }

    #[test]
    fn payments_remaining_capped_at_duration() {
        let record = record("1000", Some("0.01"), Some(12), "0");
        let view = derive_loan_view(&record, eval_instant());

        assert_eq!(view.payments_remaining, 12);
    }
}
