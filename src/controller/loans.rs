//! Marketplace endpoints: listing, detail, and the three write paths
//! (request, fund, repay).

use actix_web::{get, post, web, Responder};
use bigdecimal::{BigDecimal, Signed, Zero};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    configuration::{AppState, State},
    error::Error,
    karma::{validate_application, LoanApplication},
    metadata,
    model::{LoanView, MarketplaceLoan},
    portfolio::loans_of_borrower,
    types::LoanCategory,
};

/// Karma shown for a borrower whose score cannot be fetched; listing
/// still renders rather than failing the whole marketplace.
const FALLBACK_BORROWER_KARMA: i64 = 650;

// =============================================================================
// Marketplace listing
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct MarketplaceQuery {
    search: Option<String>,
    category: Option<String>,
}

fn matches_search(view: &LoanView, term: &str) -> bool {
    let term = term.to_lowercase();
    view.borrower.to_lowercase().contains(&term)
        || view.description.to_lowercase().contains(&term)
        || view.category.as_str().contains(&term)
}

#[get("/loans")]
pub async fn marketplace(
    state: web::Data<AppState<State>>,
    query: web::Query<MarketplaceQuery>,
) -> Result<impl Responder, Error> {
    let snapshot = state.loan_snapshot().await?;

    let category = query
        .category
        .as_deref()
        .filter(|value| !value.eq_ignore_ascii_case("all"))
        .map(LoanCategory::parse);

    let filtered: Vec<&LoanView> = snapshot
        .iter()
        .filter(|view| match &query.search {
            Some(term) => matches_search(view, term),
            None => true,
        })
        .filter(|view| match category {
            Some(category) => view.category == category,
            None => true,
        })
        .collect();

    let entries = join_all(filtered.iter().map(|view| {
        let state = state.to_owned();
        async move {
            let karma = match state.karma_of(&view.borrower).await {
                Ok(score) => score.fico_score.round() as i64,
                Err(e) => {
                    warn!(
                        borrower = %view.borrower,
                        "karma lookup failed for listing: {}", e
                    );
                    FALLBACK_BORROWER_KARMA
                },
            };
            MarketplaceLoan::from_view(view, karma)
        }
    }))
    .await;

    Ok(web::Json(entries))
}

#[get("/loans/{id}")]
pub async fn loan_detail(
    state: web::Data<AppState<State>>,
    path: web::Path<u64>,
) -> Result<impl Responder, Error> {
    let id = path.into_inner();
    let snapshot = state.loan_snapshot().await?;

    let view = snapshot
        .into_iter()
        .find(|view| view.id == id)
        .ok_or(Error::LoanNotFound(id))?;

    Ok(web::Json(view))
}

// =============================================================================
// Loan request
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxResponse {
    pub tx_hash: String,
}

#[post("/loans")]
pub async fn request_loan(
    state: web::Data<AppState<State>>,
    body: web::Json<LoanApplication>,
) -> Result<impl Responder, Error> {
    let application = body.into_inner();
    let borrower = state.chain.signer_address();

    let score = state.karma_of(&borrower).await?;
    let snapshot = state.loan_snapshot().await?;
    let own_loans = loans_of_borrower(&snapshot, &borrower);

    let interest_rate =
        validate_application(&application, &score, &own_loans)?;
    let interest_bps = (interest_rate * 100.0).floor() as u32;

    let metadata_cid =
        metadata::encode_inline(&application.to_metadata())?;

    let tx_hash = state
        .chain
        .request_loan(
            &application.amount,
            interest_bps,
            application.duration_months,
            metadata_cid,
        )
        .await?;

    state.caches.invalidate_loans().await;
    Ok(web::Json(TxResponse { tx_hash }))
}

// =============================================================================
// Funding
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct FundRequest {
    pub amount: BigDecimal,
}

#[post("/loans/{id}/fund")]
pub async fn fund_loan(
    state: web::Data<AppState<State>>,
    path: web::Path<u64>,
    body: web::Json<FundRequest>,
) -> Result<impl Responder, Error> {
    let id = path.into_inner();
    let amount = body.into_inner().amount;

    if !amount.is_positive() {
        return Err(Error::Validation(String::from(
            "Investment amount must be positive",
        )));
    }

    if id >= state.chain.loan_counter().await? {
        return Err(Error::LoanNotFound(id));
    }

    let loan = state.chain.get_loan(id).await?;
    if amount > loan.principal {
        return Err(Error::Validation(format!(
            "Investment amount cannot exceed the remaining loan amount of {}",
            loan.principal
        )));
    }

    let tx_hash = state.chain.fund_loan(id, &amount).await?;

    state.caches.invalidate_loans().await;
    Ok(web::Json(TxResponse { tx_hash }))
}

// =============================================================================
// Repayment
// =============================================================================

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    /// One scheduled installment.
    Monthly,
    /// The whole outstanding balance.
    Full,
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub payment: PaymentKind,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub tx_hash: String,
    pub amount: BigDecimal,
}

#[post("/loans/{id}/payments")]
pub async fn make_payment(
    state: web::Data<AppState<State>>,
    path: web::Path<u64>,
    body: web::Json<PaymentRequest>,
) -> Result<impl Responder, Error> {
    let id = path.into_inner();
    let snapshot = state.loan_snapshot().await?;

    let view = snapshot
        .iter()
        .find(|view| view.id == id)
        .ok_or(Error::LoanNotFound(id))?;

    let amount = match body.payment {
        PaymentKind::Monthly => {
            view.monthly_payment.to_owned().ok_or_else(|| {
                Error::LoanState(String::from(
                    "This loan has no monthly payment schedule",
                ))
            })?
        },
        PaymentKind::Full => view.remaining_balance.to_owned(),
    };

    if amount.is_zero() {
        return Err(Error::LoanState(String::from(
            "Nothing outstanding on this loan",
        )));
    }

    let tx_hash = state.chain.make_payment(id, &amount).await?;

    state.caches.invalidate_loans().await;
    Ok(web::Json(PaymentResponse { tx_hash, amount }))
}
