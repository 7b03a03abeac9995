//! Background tasks: reservation expiry sweep and rate limiter cleanup

use std::time::Duration;

use tokio::task::JoinHandle;

use crate::services::reservations;
use crate::state::AppState;

const RATE_LIMIT_CLEANUP_SECS: u64 = 300;

/// Expire lapsed holds every `EXPIRY_SWEEP_INTERVAL_SECS`
pub fn spawn_expiry_sweeper(state: AppState) -> JoinHandle<()> {
    let period = Duration::from_secs(state.config.expiry_sweep_interval_secs);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let now = shared::util::now_millis();
            match reservations::expire_reservations(&state.pool, now).await {
                Ok(0) => tracing::debug!("Expiry sweep: nothing to expire"),
                Ok(count) => tracing::info!(expired = count, "Expiry sweep finished"),
                Err(e) => {
                    let err: shared::error::AppError = e.into();
                    tracing::warn!(error = %err, "Expiry sweep failed");
                }
            }
        }
    })
}

/// Drop stale rate limiter entries every 5 minutes
pub fn spawn_rate_limit_cleanup(state: &AppState) -> JoinHandle<()> {
    let rate_limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(RATE_LIMIT_CLEANUP_SECS));
        loop {
            interval.tick().await;
            rate_limiter.cleanup().await;
        }
    })
}
