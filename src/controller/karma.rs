//! Proxied scoring endpoints, enriched with the display tier.

use actix_web::{post, web, Responder};
use serde::{Deserialize, Serialize};

use crate::{
    configuration::{AppState, State},
    error::Error,
    karma::KarmaTier,
};

#[derive(Debug, Deserialize)]
pub struct KarmaQuery {
    pub wallet_address: String,
}

#[derive(Debug, Serialize)]
pub struct KarmaResponse {
    pub fico_score: f64,
    pub interest_rate: Option<f64>,
    pub max_loan_amount: f64,
    pub tier: KarmaTier,
    pub range: &'static str,
}

#[post("/karma")]
pub async fn karma(
    state: web::Data<AppState<State>>,
    body: web::Json<KarmaQuery>,
) -> Result<impl Responder, Error> {
    let score = state.karma_of(&body.wallet_address).await?;
    let tier = KarmaTier::from_score(score.fico_score);

    Ok(web::Json(KarmaResponse {
        fico_score: score.fico_score,
        interest_rate: score.interest_rate,
        max_loan_amount: score.max_loan_amount,
        range: tier.range(),
        tier,
    }))
}

#[post("/wallet-analytics")]
pub async fn wallet_analytics(
    state: web::Data<AppState<State>>,
    body: web::Json<KarmaQuery>,
) -> Result<impl Responder, Error> {
    let analytics = state.analytics_of(&body.wallet_address).await?;
    Ok(web::Json(analytics))
}
