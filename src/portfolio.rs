//! Wallet-level rollups over derived loan figures.

use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};

use crate::{
    derivation::{derive_investment_return, LoanStatus, RepaymentBasis},
    model::LoanView,
};

/// Summary statistics for one wallet's side of the book.
///
/// Sums are order-independent and the inputs are never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_invested: BigDecimal,
    pub total_earned: BigDecimal,
    pub total_interest_remaining: BigDecimal,
    pub active_count: usize,
    pub roi: BigDecimal,
}

impl PortfolioSummary {
    fn empty() -> PortfolioSummary {
        PortfolioSummary {
            total_invested: BigDecimal::zero(),
            total_earned: BigDecimal::zero(),
            total_interest_remaining: BigDecimal::zero(),
            active_count: 0,
            roi: BigDecimal::zero(),
        }
    }
}

fn summarize<'a>(
    loans: impl Iterator<Item = &'a LoanView>,
) -> PortfolioSummary {
    let mut summary = PortfolioSummary::empty();

    for view in loans {
        let returns = derive_investment_return(&RepaymentBasis::from(view));

        summary.total_invested += &view.amount;
        summary.total_earned += &returns.interest_earned;
        summary.total_interest_remaining += &returns.remaining_interest;
        if view.status == LoanStatus::Active {
            summary.active_count += 1;
        }
    }

    if !summary.total_invested.is_zero() {
        summary.roi = &summary.total_earned / &summary.total_invested;
    }

    summary
}

/// Borrower-side rollup: loans whose borrower matches the wallet.
pub fn borrower_summary(
    loans: &[LoanView],
    wallet: &str,
) -> PortfolioSummary {
    let wallet = wallet.to_lowercase();
    summarize(
        loans
            .iter()
            .filter(|view| view.borrower.to_lowercase() == wallet),
    )
}

/// Investor-side rollup over every funded loan. The contract keeps no
/// per-investor funding ledger, so the funded book is reported as a
/// whole; see DESIGN.md.
pub fn investor_summary(loans: &[LoanView]) -> PortfolioSummary {
    summarize(loans.iter().filter(|view| view.funded))
}

/// The funded loans behind [`investor_summary`], for the dashboard list.
pub fn funded_loans(loans: &[LoanView]) -> Vec<LoanView> {
    loans
        .iter()
        .filter(|view| view.funded)
        .map(ToOwned::to_owned)
        .collect()
}

/// The wallet's own loans, for the borrower dashboard list.
pub fn loans_of_borrower(loans: &[LoanView], wallet: &str) -> Vec<LoanView> {
    let wallet = wallet.to_lowercase();
    loans
        .iter()
        .filter(|view| view.borrower.to_lowercase() == wallet)
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::{
        derivation::derive_loan_view, metadata::LoanMetadata,
        model::LoanRecord,
    };

    fn view(
        id: u64,
        borrower: &str,
        principal: &str,
        monthly_payment: &str,
        duration: u32,
        total_paid: &str,
        funded: bool,
    ) -> LoanView {
        let record = LoanRecord {
            id,
            borrower: borrower.to_lowercase(),
            token_address: String::new(),
            principal: BigDecimal::from_str(principal).unwrap(),
            interest_bps: 1000,
            due_date: Utc.with_ymd_and_hms(2031, 1, 1, 0, 0, 0).unwrap(),
            funded,
            repaid: false,
            monthly_payment: Some(
                BigDecimal::from_str(monthly_payment).unwrap(),
            ),
            total_paid: BigDecimal::from_str(total_paid).unwrap(),
            duration_months: Some(duration),
            metadata_cid: String::new(),
        };
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let derived = derive_loan_view(&record, now);
        LoanView::from_parts(record, LoanMetadata::default(), derived)
    }

    #[test]
    fn borrower_summary_filters_by_wallet() {
        let loans = vec![
            view(0, "0xAAA0", "1000", "100", 12, "300", true),
            view(1, "0xBBB0", "500", "50", 12, "0", true),
        ];

        let summary = borrower_summary(&loans, "0xaaa0");
        assert_eq!(summary.total_invested, BigDecimal::from(1000));
        assert_eq!(summary.active_count, 1);
    }

    #[test]
    fn investor_summary_takes_only_funded_loans() {
        let loans = vec![
            view(0, "0xAAA0", "1000", "100", 12, "0", true),
            view(1, "0xBBB0", "500", "50", 12, "0", false),
        ];

        let summary = investor_summary(&loans);
        assert_eq!(summary.total_invested, BigDecimal::from(1000));
        assert_eq!(funded_loans(&loans).len(), 1);
    }

    #[test]
    fn roi_is_zero_on_empty_book() {
        let summary = investor_summary(&[]);
        assert_eq!(summary.roi, BigDecimal::zero());
        assert_eq!(summary.active_count, 0);
    }

    #[test]
    fn sums_are_insertion_order_independent() {
        let mut loans = vec![
            view(0, "0xAAA0", "1000", "100", 12, "300", true),
            view(1, "0xBBB0", "500", "50", 12, "250", true),
            view(2, "0xCCC0", "750", "80", 10, "160", true),
        ];

        let forward = investor_summary(&loans);
        loans.reverse();
        let backward = investor_summary(&loans);

        assert_eq!(forward.total_invested, backward.total_invested);
        assert_eq!(forward.total_earned, backward.total_earned);
        assert_eq!(
            forward.total_interest_remaining,
            backward.total_interest_remaining
        );
    }

    #[test]
    fn earned_plus_remaining_covers_total_interest() {
        // 100 * 12 - 1000 = 200 interest; 25% progress.
        let loans = vec![view(0, "0xAAA0", "1000", "100", 12, "300", true)];
        let summary = investor_summary(&loans);

        assert_eq!(summary.total_earned, BigDecimal::from(50));
        assert_eq!(summary.total_interest_remaining, BigDecimal::from(150));
        assert_eq!(
            summary.roi,
            BigDecimal::from(50) / BigDecimal::from(1000)
        );
    }
}
