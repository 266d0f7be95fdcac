//! Background loan snapshot refresh task
//!
//! Re-warms the marketplace snapshot ahead of its TTL so dashboard loads
//! rarely pay the full sequential chain fetch. The initial load is fatal
//! (the chain is unreachable); later failures keep the previous snapshot
//! and retry on the next tick.

use std::time::Duration;

use anyhow::Result;
use tokio::time::interval;
use tracing::{info, warn};

use crate::{
    configuration::{AppState, State},
    error::Error,
};

pub async fn snapshot_refresh_task(
    app_state: AppState<State>,
) -> Result<(), Error> {
    let period =
        Duration::from_secs(app_state.config.loans_cache_interval.max(1));

    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.tick().await;

        let views = app_state.loan_snapshot().await?;
        info!(loans = views.len(), "initial loan snapshot loaded");

        loop {
            ticker.tick().await;
            app_state.caches.invalidate_loans().await;

            match app_state.loan_snapshot().await {
                Ok(views) => {
                    info!(loans = views.len(), "loan snapshot refreshed")
                },
                Err(e) => warn!("loan snapshot refresh failed: {}", e),
            }
        }
    })
    .await?
}
