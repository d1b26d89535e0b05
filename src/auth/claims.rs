use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::AuthError;
use crate::config::{ConfigError, SecurityConfig, MAX_JWT_EXPIRY_HOURS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
    /// Issue time in unix micros, compared against password changes
    pub iat_us: i64,
}

impl Claims {
    pub fn new(subject: Uuid, issued_at: DateTime<Utc>, lifetime: Duration) -> Self {
        Self {
            sub: subject,
            iat: issued_at.timestamp(),
            exp: (issued_at + lifetime).timestamp(),
            iat_us: issued_at.timestamp_micros(),
        }
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        Utc.timestamp_micros(self.iat_us).single().unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Signed session token plus the facts embedded in it
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub value: String,
    pub subject: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Signing secret and lifetime, copied out of the security config at startup
#[derive(Clone)]
pub struct TokenSettings {
    secret: String,
    lifetime: Duration,
}

impl std::fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &"<redacted>")
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

impl TokenSettings {
    pub fn new(secret: impl Into<String>, lifetime: Duration) -> Self {
        Self { secret: secret.into(), lifetime }
    }

    /// Out-of-range lifetimes are rejected by `AppConfig::validate`; clamp here
    pub fn from_config(security: &SecurityConfig) -> Self {
        let lifetime = security
            .token_lifetime()
            .unwrap_or_else(|_| Duration::hours(MAX_JWT_EXPIRY_HOURS as i64));
        Self::new(security.jwt_secret.clone(), lifetime)
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    fn secret(&self) -> Result<&[u8], AuthError> {
        if self.secret.trim().is_empty() {
            return Err(AuthError::Config(ConfigError::MissingSecret));
        }
        Ok(self.secret.as_bytes())
    }

    pub fn generate_jwt(&self, claims: &Claims) -> Result<String, AuthError> {
        let encoding_key = EncodingKey::from_secret(self.secret()?);
        let header = Header::default();

        encode(&header, claims, &encoding_key).map_err(|e| AuthError::Token(e.to_string()))
    }

    /// Verify signature and expiry; every failure is an authentication failure
    pub fn validate_jwt(&self, token: &str) -> Result<Claims, AuthError> {
        let decoding_key = DecodingKey::from_secret(self.secret()?);
        let mut validation = Validation::default();
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::unauthenticated("token expired"),
            ErrorKind::InvalidSignature => AuthError::unauthenticated("token signature invalid"),
            _ => AuthError::unauthenticated(format!("invalid token: {}", e)),
        })?;

        Ok(token_data.claims)
    }
}
