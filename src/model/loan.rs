use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    derivation::{DerivedLoanView, LoanStatus},
    helpers::{bps_to_percent, short_address},
    metadata::{EmergencyContacts, LoanMetadata},
    types::LoanCategory,
};

/// One raw loan record as returned by `getLoan(id)`, decoded from
/// fixed-point into token amounts. Nothing here is derived; see
/// [`DerivedLoanView`] for schedule state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub id: u64,
    /// Lowercased hex address of the borrower.
    pub borrower: String,
    pub token_address: String,
    pub principal: BigDecimal,
    pub interest_bps: u32,
    pub due_date: DateTime<Utc>,
    pub funded: bool,
    pub repaid: bool,
    pub monthly_payment: Option<BigDecimal>,
    pub total_paid: BigDecimal,
    pub duration_months: Option<u32>,
    pub metadata_cid: String,
}

/// Fully expanded loan as served to the dashboards: raw record fields,
/// decoded metadata, and derived schedule state flattened together the
/// way the original client shaped them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanView {
    pub id: u64,
    pub borrower: String,
    pub amount: BigDecimal,
    /// Interest in percent, converted from basis points.
    pub interest: f64,
    pub due_date: DateTime<Utc>,
    pub funded: bool,
    pub repaid: bool,
    pub description: String,
    pub category: LoanCategory,
    pub supporting_image: Option<String>,
    pub emergency_contacts: Option<EmergencyContacts>,
    #[serde(rename = "metadataCID")]
    pub metadata_cid: String,
    pub monthly_payment: Option<BigDecimal>,
    pub total_paid: BigDecimal,
    pub duration: Option<u32>,
    pub status: LoanStatus,
    pub total_amount: BigDecimal,
    pub remaining_balance: BigDecimal,
    pub payments_remaining: u32,
    pub progress_percent: BigDecimal,
}

impl LoanView {
    pub fn from_parts(
        record: LoanRecord,
        metadata: LoanMetadata,
        derived: DerivedLoanView,
    ) -> LoanView {
        LoanView {
            id: record.id,
            borrower: record.borrower,
            amount: record.principal,
            interest: bps_to_percent(record.interest_bps),
            due_date: record.due_date,
            funded: record.funded,
            repaid: record.repaid,
            description: metadata.description,
            category: metadata.category,
            supporting_image: metadata.supporting_image,
            emergency_contacts: metadata.emergency_contacts,
            metadata_cid: record.metadata_cid,
            monthly_payment: record.monthly_payment,
            total_paid: record.total_paid,
            duration: record.duration_months,
            status: derived.status,
            total_amount: derived.total_amount,
            remaining_balance: derived.remaining_balance,
            payments_remaining: derived.payments_remaining,
            progress_percent: derived.progress_percent,
        }
    }
}

/// Borrower header shown on marketplace cards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorrowerRef {
    pub name: String,
    pub karma: i64,
    pub address: String,
}

/// Marketplace listing entry: a [`LoanView`] reduced to card fields and
/// enriched with the borrower's karma score.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceLoan {
    pub id: u64,
    pub borrower: BorrowerRef,
    pub amount: BigDecimal,
    pub interest: f64,
    pub duration: Option<u32>,
    /// Funding progress in percent; the contract tracks funded as a flag,
    /// so this is 0 or 100.
    pub funded: u8,
    pub category: LoanCategory,
    pub description: String,
    pub supporting_image: Option<String>,
    pub status: LoanStatus,
    pub due_date: DateTime<Utc>,
}

impl MarketplaceLoan {
    pub fn from_view(view: &LoanView, karma: i64) -> MarketplaceLoan {
        MarketplaceLoan {
            id: view.id,
            borrower: BorrowerRef {
                name: short_address(&view.borrower),
                karma,
                address: view.borrower.to_owned(),
            },
            amount: view.amount.to_owned(),
            interest: view.interest,
            duration: view.duration,
            funded: if view.funded { 100 } else { 0 },
            category: view.category,
            description: view.description.to_owned(),
            supporting_image: view.supporting_image.to_owned(),
            status: view.status,
            due_date: view.due_date,
        }
    }
}
