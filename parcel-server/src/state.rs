//! Application state

use std::sync::Arc;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::auth::admin_auth::AdminCredentials;
use crate::auth::rate_limit::RateLimiter;
use crate::config::Config;
use crate::db;
use crate::email::{EmailSettings, Mailer};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    pub config: Arc<Config>,
    /// Confirmation email transport
    pub mailer: Mailer,
    pub email_settings: Arc<EmailSettings>,
    /// Admin token, password digest and session signing key
    pub admin: Arc<AdminCredentials>,
    /// Rate limiter for reservation and login routes
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Connect, migrate and seed the parcel catalogue
    pub async fn new(config: Config) -> Result<Self, BoxError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        let seeded = db::parcels::seed(&pool).await?;
        tracing::info!(changed = seeded, "Parcel catalogue ready");

        let mailer = Mailer::from_config(&config.mail);
        Ok(Self::with_pool(pool, config, mailer))
    }

    /// Assemble state around an existing pool (no migrations)
    pub fn with_pool(pool: PgPool, config: Config, mailer: Mailer) -> Self {
        Self {
            pool,
            email_settings: Arc::new(EmailSettings::from_config(&config)),
            admin: Arc::new(AdminCredentials::from_config(&config)),
            mailer,
            rate_limiter: RateLimiter::new(),
            config: Arc::new(config),
        }
    }

    /// Hold duration for new reservations, in milliseconds
    pub fn hold_duration_ms(&self) -> i64 {
        self.config.hold_duration_ms()
    }
}
