//! Domain records and API view shapes.
//!
//! Raw chain records and the views assembled from them are consolidated
//! in loan.rs.

mod loan;

pub use loan::{BorrowerRef, LoanRecord, LoanView, MarketplaceLoan};
