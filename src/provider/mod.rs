pub use self::{
    chain::{ChainClient, NATIVE_TOKEN},
    deployment::load_contract_address,
    http::ScoringApi,
};

mod chain;
mod deployment;
mod http;
