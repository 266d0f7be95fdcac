use std::{env, fs, ops::Deref, path::PathBuf, sync::Arc};

use chrono::Utc;
use tracing::warn;
use url::Url;

use crate::{
    cache::{ResponseCaches, LOAN_SNAPSHOT},
    derivation::derive_loan_view,
    error::Error,
    metadata::{self, LoanMetadata},
    model::LoanView,
    provider::{ChainClient, ScoringApi},
    session::RoleStore,
    types::{FicoScore, WalletAnalytics},
};

#[derive(Debug)]
pub struct AppState<T>(Arc<T>);

impl<T> AppState<T> {
    pub fn new(state: T) -> AppState<T> {
        AppState(Arc::new(state))
    }
}

impl<T> Clone for AppState<T> {
    fn clone(&self) -> AppState<T> {
        AppState(Arc::clone(&self.0))
    }
}

impl<T> Deref for AppState<T> {
    type Target = Arc<T>;

    fn deref(&self) -> &Arc<T> {
        &self.0
    }
}

#[derive(Debug)]
pub struct State {
    pub config: Config,
    pub chain: ChainClient,
    pub scoring: ScoringApi,
    pub caches: ResponseCaches,
    pub roles: RoleStore,
}

impl State {
    pub fn new(
        config: Config,
        chain: ChainClient,
        scoring: ScoringApi,
    ) -> Result<State, Error> {
        let caches = ResponseCaches::new(
            config.loans_cache_interval,
            config.scoring_cache_interval,
        );
        let roles = RoleStore::load(&config.role_store)?;

        Ok(Self { config, chain, scoring, caches, roles })
    }

    /// The decoded, derived marketplace snapshot, cache-backed. Loads are
    /// sequential fetch-all cycles; each dashboard request reads one
    /// consistent snapshot.
    pub async fn loan_snapshot(&self) -> Result<Vec<LoanView>, Error> {
        if let Some(cached) = self.caches.loans.get(LOAN_SNAPSHOT).await {
            return Ok(cached);
        }

        let records = self.chain.fetch_all_loans().await?;
        let now = Utc::now();

        let mut views = Vec::with_capacity(records.len());
        for record in records {
            let decoded = match metadata::decode_inline(&record.metadata_cid)
            {
                Some(decoded) => decoded,
                None => match self
                    .scoring
                    .fetch_metadata(&record.metadata_cid)
                    .await
                {
                    Ok(decoded) => decoded,
                    Err(e) => {
                        warn!(
                            loan = record.id,
                            "metadata gateway fetch failed: {}", e
                        );
                        LoanMetadata::default()
                    },
                },
            };

            let derived = derive_loan_view(&record, now);
            views.push(LoanView::from_parts(record, decoded, derived));
        }

        self.caches.loans.set(LOAN_SNAPSHOT, views.to_owned()).await;
        Ok(views)
    }

    /// Cached per-wallet karma lookup.
    pub async fn karma_of(&self, wallet: &str) -> Result<FicoScore, Error> {
        let key = wallet.to_lowercase();
        if let Some(cached) = self.caches.scores.get(&key).await {
            return Ok(cached);
        }

        let score = self.scoring.fico_score(&key).await?;
        self.caches.scores.set(&key, score.to_owned()).await;
        Ok(score)
    }

    /// Cached per-wallet analytics lookup.
    pub async fn analytics_of(
        &self,
        wallet: &str,
    ) -> Result<WalletAnalytics, Error> {
        let key = wallet.to_lowercase();
        if let Some(cached) = self.caches.analytics.get(&key).await {
            return Ok(cached);
        }

        let analytics = self.scoring.wallet_analytics(&key).await?;
        self.caches.analytics.set(&key, analytics.to_owned()).await;
        Ok(analytics)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_host: Url,
    pub network: String,
    pub abis_dir: PathBuf,
    pub signer_key: String,
    pub scoring_host: Url,
    pub gateway_host: Url,
    pub timeout: u64,
    pub server_host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub static_dir: String,
    pub loans_cache_interval: u64,
    pub scoring_cache_interval: u64,
    pub role_store: PathBuf,
}

pub fn get_configuration() -> Result<Config, Error> {
    let directory = env!("CARGO_MANIFEST_DIR");

    let rpc_host: Url = env::var("HOST")?.parse()?;
    let network = env::var("NETWORK")?;
    let abis_dir = PathBuf::from(format!(
        "{}/{}",
        directory,
        env::var("ABIS_DIRECTORY")?
    ));
    let signer_key = env::var("SIGNER_KEY")?;
    let scoring_host: Url = env::var("SCORING_HOST")?.parse()?;
    let gateway_host: Url = env::var("IPFS_GATEWAY")?.parse()?;
    let timeout = env::var("TIMEOUT")?.parse()?;

    let server_host = env::var("SERVER_HOST")?;
    let port: u16 = env::var("PORT")?.parse()?;
    let allowed_origins = env::var("ALLOWED_ORIGINS")?
        .split(',')
        .map(|item| item.to_owned())
        .collect::<Vec<String>>();
    let static_dir =
        format!("{}/{}", directory, env::var("STATIC_DIRECTORY")?);

    let loans_cache_interval =
        env::var("LOANS_CACHE_INTERVAL_IN_SEC")?.parse()?;
    let scoring_cache_interval =
        env::var("SCORING_CACHE_INTERVAL_IN_SEC")?.parse()?;
    let role_store = PathBuf::from(format!(
        "{}/{}",
        directory,
        env::var("ROLE_STORE")?
    ));

    let config = Config {
        rpc_host,
        network,
        abis_dir,
        signer_key,
        scoring_host,
        gateway_host,
        timeout,
        server_host,
        port,
        allowed_origins,
        static_dir,
        loans_cache_interval,
        scoring_cache_interval,
        role_store,
    };

    Ok(config)
}

pub fn set_configuration() -> Result<(), Error> {
    let config_file: &str = ".env";
    let service_config_file: &str = "karmalend.conf";

    let directory = env!("CARGO_MANIFEST_DIR");
    let env_path = format!("{}/{}", directory, config_file);
    let service_config_path =
        format!("{}/{}", directory, service_config_file);

    for path in [env_path, service_config_path] {
        match fs::read_to_string(&path) {
            Ok(config_string) => parse_config_string(config_string),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("configuration file {} not present", path);
            },
            Err(e) => return Err(Error::Io(e)),
        }
    }

    Ok(())
}

fn parse_config_string(config: String) {
    let params: Vec<Option<(&str, &str)>> = config
        .split('\n')
        .map(|s| {
            let element = s.find('=');
            if let Some(e) = element {
                return Some(s.split_at(e));
            }
            None
        })
        .map(|value| {
            if let Some((k, v)) = value {
                return Some((k, &v[1..]));
            }
            None
        })
        .collect();

    for (key, value) in params.into_iter().flatten() {
        // Real environment wins over file-provided defaults.
        if env::var(key).is_err() {
            env::set_var(key, value.trim());
        }
    }
}
