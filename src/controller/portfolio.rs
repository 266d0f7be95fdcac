//! Borrower and investor rollup endpoints.

use actix_web::{get, web, Responder};
use serde::Serialize;

use crate::{
    configuration::{AppState, State},
    error::Error,
    helpers::{normalize_address, parse_address},
    model::LoanView,
    portfolio::{
        borrower_summary, funded_loans, investor_summary, loans_of_borrower,
        PortfolioSummary,
    },
};

#[derive(Debug, Serialize)]
pub struct Portfolio {
    pub summary: PortfolioSummary,
    pub loans: Vec<LoanView>,
}

#[get("/portfolio/borrower/{address}")]
pub async fn borrower(
    state: web::Data<AppState<State>>,
    path: web::Path<String>,
) -> Result<impl Responder, Error> {
    // Reject junk addresses before touching the snapshot.
    let address = parse_address(&path.into_inner())?;
    let wallet = normalize_address(&address);

    let snapshot = state.loan_snapshot().await?;

    Ok(web::Json(Portfolio {
        summary: borrower_summary(&snapshot, &wallet),
        loans: loans_of_borrower(&snapshot, &wallet),
    }))
}

/// The funded-loan book as a whole: the contract keeps no per-investor
/// funding shares, so every funded loan counts toward the querying
/// investor (see DESIGN.md).
#[get("/portfolio/investor")]
pub async fn investor(
    state: web::Data<AppState<State>>,
) -> Result<impl Responder, Error> {
    let snapshot = state.loan_snapshot().await?;

    Ok(web::Json(Portfolio {
        summary: investor_summary(&snapshot),
        loans: funded_loans(&snapshot),
    }))
}
