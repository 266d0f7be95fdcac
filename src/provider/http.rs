//! Clients for the external scoring service and the storage gateway.

use std::time::Duration;

use reqwest::Client;
use tracing::info;
use url::Url;

use crate::{
    error::Error,
    metadata::{self, LoanMetadata},
    types::{FicoScore, ScoreRequest, WalletAnalytics},
};

#[derive(Debug)]
pub struct ScoringApi {
    scoring_host: Url,
    gateway_host: Url,
    chain: String,
    pub http: Client,
}

impl ScoringApi {
    pub fn new(
        scoring_host: Url,
        gateway_host: Url,
        chain: String,
        timeout: u64,
    ) -> Result<ScoringApi, Error> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()?;

        Ok(ScoringApi { scoring_host, gateway_host, chain, http })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.scoring_host.as_str().trim_end_matches('/'),
            path
        )
    }

    /// Karma score plus the rate/limit the scoring service derives from
    /// it. Sub-floor wallets come back with no interest rate.
    pub async fn fico_score(&self, wallet: &str) -> Result<FicoScore, Error> {
        let url = self.endpoint("api/fico-score");
        let body = ScoreRequest {
            wallet_address: wallet.to_owned(),
            chain: self.chain.to_owned(),
        };

        let response = self.http.post(url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(Error::ScoringUnavailable(format!(
                "fico-score returned {}",
                response.status()
            )));
        }

        Ok(response.json::<FicoScore>().await?)
    }

    /// Full analytics payload for the karma dashboard.
    pub async fn wallet_analytics(
        &self,
        wallet: &str,
    ) -> Result<WalletAnalytics, Error> {
        let url = self.endpoint("api/wallet-analytics");
        let body = ScoreRequest {
            wallet_address: wallet.to_owned(),
            chain: self.chain.to_owned(),
        };

        let response = self.http.post(url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(Error::ScoringUnavailable(format!(
                "wallet-analytics returned {}",
                response.status()
            )));
        }

        Ok(response.json::<WalletAnalytics>().await?)
    }

    /// Resolve a non-inline metadata CID through the storage gateway.
    /// The document follows the same JSON contract as inline metadata,
    /// including the degrade-to-default behavior.
    pub async fn fetch_metadata(
        &self,
        cid: &str,
    ) -> Result<LoanMetadata, Error> {
        let url = format!(
            "{}/{}",
            self.gateway_host.as_str().trim_end_matches('/'),
            cid
        );
        info!(cid, "resolving metadata through gateway");

        let document = self.http.get(url).send().await?.text().await?;
        Ok(metadata::decode_document(&document, cid))
    }
}
