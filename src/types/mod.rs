pub use self::{
    category::LoanCategory,
    role::UserRole,
    scoring::{
        FicoScore, KarmaBreakdown, RiskAssessment, RiskLevel, ScoreRequest,
        WalletAnalytics,
    },
};

mod category;
mod role;
mod scoring;
