//! Admin authentication
//!
//! Two kinds of bearer token are accepted on `/api/admin/*`:
//! - the static `ADMIN_TOKEN` (scripts, cron jobs)
//! - a session JWT issued by `POST /api/admin/login`

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared::error::AppError;

use crate::config::Config;
use crate::state::AppState;

const SESSION_EXPIRY_HOURS: i64 = 12;
const ADMIN_ROLE: &str = "admin";

/// JWT claims for an admin session
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: String,
    pub role: String,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// How the current request authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminIdentity {
    StaticToken,
    Session,
}

impl AdminIdentity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StaticToken => "token",
            Self::Session => "session",
        }
    }
}

/// Issued session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSession {
    pub token: String,
    /// Expiry in Unix milliseconds
    pub expires_at: i64,
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}

/// Compare digests without short-circuiting
fn digests_match(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub struct AdminCredentials {
    token_digest: Option<[u8; 32]>,
    password_digest: Option<[u8; 32]>,
    jwt_secret: String,
}

impl AdminCredentials {
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.admin_token, &config.admin_password, &config.jwt_secret)
    }

    /// Empty token or password disables that login path
    pub fn new(admin_token: &str, admin_password: &str, jwt_secret: &str) -> Self {
        Self {
            token_digest: (!admin_token.is_empty()).then(|| digest(admin_token)),
            password_digest: (!admin_password.is_empty()).then(|| digest(admin_password)),
            jwt_secret: jwt_secret.to_string(),
        }
    }

    pub fn verify_password(&self, password: &str) -> bool {
        self.password_digest
            .as_ref()
            .is_some_and(|expected| digests_match(expected, &digest(password)))
    }

    pub fn is_static_token(&self, token: &str) -> bool {
        self.token_digest
            .as_ref()
            .is_some_and(|expected| digests_match(expected, &digest(token)))
    }

    pub fn create_session(&self) -> Result<AdminSession, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now();
        let expires = now + chrono::Duration::hours(SESSION_EXPIRY_HOURS);
        let claims = AdminClaims {
            sub: ADMIN_ROLE.to_string(),
            role: ADMIN_ROLE.to_string(),
            exp: expires.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;
        Ok(AdminSession {
            token,
            expires_at: expires.timestamp_millis(),
        })
    }

    pub fn verify_session(&self, token: &str) -> Result<AdminClaims, AppError> {
        let data = jsonwebtoken::decode::<AdminClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AppError::token_expired(),
            _ => {
                tracing::debug!("Admin JWT validation failed: {e}");
                AppError::invalid_token("Invalid admin token")
            }
        })?;

        if data.claims.role != ADMIN_ROLE {
            return Err(AppError::invalid_token("Invalid admin token"));
        }
        Ok(data.claims)
    }

    /// Accept either the static token or a valid session
    pub fn authenticate(&self, token: &str) -> Result<AdminIdentity, AppError> {
        if token.is_empty() {
            return Err(AppError::not_authenticated());
        }
        if self.is_static_token(token) {
            return Ok(AdminIdentity::StaticToken);
        }
        self.verify_session(token).map(|_| AdminIdentity::Session)
    }
}

/// Middleware that requires an admin bearer token
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or_else(AppError::not_authenticated)?;

    let identity = state.admin.authenticate(token)?;
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}
