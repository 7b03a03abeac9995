//! Server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Sender and transport settings for outgoing mail
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Mailjet API key (mail is only logged when unset)
    pub mailjet_api_key: Option<String>,
    /// Mailjet secret key
    pub mailjet_secret_key: Option<String>,
    pub from_email: String,
    pub from_name: String,
}

/// Bank-transfer instructions printed in the confirmation email
#[derive(Debug, Clone)]
pub struct BankDetails {
    pub recipient: String,
    pub iban: String,
    pub bic: String,
    /// Prefix of the transfer reference, followed by the reservation number
    pub reference_prefix: String,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    pub database_max_connections: u32,
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// Static bearer token for scripted admin access
    pub admin_token: String,
    /// Password exchanged for a session token at `/api/admin/login`
    pub admin_password: String,
    /// Secret for admin session tokens
    pub jwt_secret: String,
    /// How long a pending reservation holds its parcels
    pub reservation_hold_hours: i64,
    /// Background expiry sweep period
    pub expiry_sweep_interval_secs: u64,
    pub mail: MailConfig,
    pub bank: BankDetails,
    pub club_name: String,
    pub club_contact_email: String,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(
        lookup: &impl Fn(&str) -> Option<String>,
        name: &str,
        environment: &str,
    ) -> Result<String, BoxError> {
        let val = match lookup(name) {
            Some(v) => v,
            None => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    fn parse_or<T: std::str::FromStr>(
        lookup: &impl Fn(&str) -> Option<String>,
        name: &str,
        default: T,
    ) -> Result<T, BoxError> {
        match lookup(name) {
            Some(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse()
                .map_err(|_| format!("{name} has an invalid value: {raw}").into()),
            _ => Ok(default),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, BoxError> {
        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".into());
        let text = |name: &str, default: &str| {
            lookup(name)
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let reservation_hold_hours = Self::parse_or(&lookup, "RESERVATION_HOLD_HOURS", 24i64)?;
        if reservation_hold_hours <= 0 {
            return Err("RESERVATION_HOLD_HOURS must be positive".into());
        }
        let expiry_sweep_interval_secs =
            Self::parse_or(&lookup, "EXPIRY_SWEEP_INTERVAL_SECS", 300u64)?;
        if expiry_sweep_interval_secs == 0 {
            return Err("EXPIRY_SWEEP_INTERVAL_SECS must be positive".into());
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL").ok_or("DATABASE_URL must be set")?,
            database_max_connections: Self::parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            http_port: Self::parse_or(&lookup, "HTTP_PORT", 8080)?,
            admin_token: Self::require_secret(&lookup, "ADMIN_TOKEN", &environment)?,
            admin_password: Self::require_secret(&lookup, "ADMIN_PASSWORD", &environment)?,
            jwt_secret: Self::require_secret(&lookup, "JWT_SECRET", &environment)?,
            reservation_hold_hours,
            expiry_sweep_interval_secs,
            mail: MailConfig {
                mailjet_api_key: lookup("MAILJET_API_KEY").filter(|s| !s.is_empty()),
                mailjet_secret_key: lookup("MAILJET_SECRET_KEY").filter(|s| !s.is_empty()),
                from_email: text("MAILJET_FROM_EMAIL", "noreply@sc-west-koeln.de"),
                from_name: text("MAILJET_FROM_NAME", "SC West Köln"),
            },
            bank: BankDetails {
                recipient: text("BANK_RECIPIENT", "SC West Köln 1900/11 e.V."),
                iban: text("BANK_IBAN", "DE XX XXXX XXXX XXXX XXXX XX"),
                bic: text("BANK_BIC", "XXXXXXXX"),
                reference_prefix: text("BANK_REFERENCE_PREFIX", "Kunstrasen"),
            },
            club_name: text("CLUB_NAME", "SC West Köln 1900/11 e.V."),
            club_contact_email: text("CLUB_CONTACT_EMAIL", "kontakt@sc-west-koeln.de"),
            environment,
        })
    }

    /// Pending hold duration in milliseconds
    pub fn hold_duration_ms(&self) -> i64 {
        self.reservation_hold_hours * 60 * 60 * 1000
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_development_defaults() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/turf")]))
            .unwrap();
        assert_eq!(config.environment, "development");
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.reservation_hold_hours, 24);
        assert_eq!(config.hold_duration_ms(), 86_400_000);
        assert_eq!(config.expiry_sweep_interval_secs, 300);
        assert_eq!(config.admin_token, "dev-ADMIN_TOKEN-not-for-production");
        assert!(config.mail.mailjet_api_key.is_none());
        assert_eq!(config.bank.reference_prefix, "Kunstrasen");
        assert!(config.is_development());
    }

    #[test]
    fn test_database_url_required() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err.to_string(), "DATABASE_URL must be set");
    }

    #[test]
    fn test_secrets_required_in_production() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/turf"),
            ("ENVIRONMENT", "production"),
            ("ADMIN_PASSWORD", "pw"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "ADMIN_TOKEN must be set in production environment"
        );

        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/turf"),
            ("ENVIRONMENT", "production"),
            ("ADMIN_TOKEN", ""),
            ("ADMIN_PASSWORD", "pw"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "ADMIN_TOKEN must not be empty in production environment"
        );
    }

    #[test]
    fn test_numeric_overrides_and_errors() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/turf"),
            ("HTTP_PORT", "9000"),
            ("RESERVATION_HOLD_HOURS", "48"),
            ("MAILJET_API_KEY", "key"),
            ("MAILJET_SECRET_KEY", "secret"),
        ]))
        .unwrap();
        assert_eq!(config.http_port, 9000);
        assert_eq!(config.hold_duration_ms(), 48 * 3_600_000);
        assert_eq!(config.mail.mailjet_api_key.as_deref(), Some("key"));

        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/turf"),
            ("HTTP_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert_eq!(err.to_string(), "HTTP_PORT has an invalid value: eighty");

        assert!(
            Config::from_lookup(lookup(&[
                ("DATABASE_URL", "postgres://db/turf"),
                ("RESERVATION_HOLD_HOURS", "0"),
            ]))
            .is_err()
        );
    }
}
