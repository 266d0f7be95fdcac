use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Scoring API request/response shapes
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub wallet_address: String,
    pub chain: String,
}

/// `POST /api/fico-score` response.
///
/// `interest_rate` is absent when the score falls below the underwriting
/// floor; such wallets are rejected rather than priced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FicoScore {
    pub fico_score: f64,
    pub interest_rate: Option<f64>,
    pub max_loan_amount: f64,
}

/// `POST /api/wallet-analytics` response. Only the fields the dashboards
/// read are typed; the per-metric payloads pass through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletAnalytics {
    pub fico_score: Option<f64>,
    #[serde(default)]
    pub wallet_stats: Option<Value>,
    #[serde(default)]
    pub transaction_analytics: Option<Value>,
    #[serde(default)]
    pub karma_breakdown: Option<KarmaBreakdown>,
    #[serde(default)]
    pub risk_assessment: Option<RiskAssessment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KarmaBreakdown {
    pub breakdown: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    #[serde(flatten)]
    pub details: HashMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    #[serde(other)]
    Unknown,
}
