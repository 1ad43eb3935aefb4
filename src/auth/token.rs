//! JWT token issuance and verification

use crate::core::config::SecurityConfig;
use crate::core::error::{CuraError, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Identity ID of the token holder
    pub sub: String,
    /// Issued-at, unix seconds
    pub iat: i64,
    /// Expiry, unix seconds
    pub exp: i64,
}

/// Why a token was rejected. Never shown to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    #[error("malformed token")]
    Malformed,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,
}

impl VerificationError {
    /// Short code used in log fields
    pub fn reason(&self) -> &'static str {
        match self {
            VerificationError::Malformed => "malformed",
            VerificationError::InvalidSignature => "invalid_signature",
            VerificationError::Expired => "expired",
        }
    }
}

/// Issues and verifies HMAC-signed bearer tokens.
///
/// Built once from configuration and shared read-only between requests.
pub struct TokenService {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    /// Create a token service; only HMAC algorithms are accepted
    pub fn new(secret: &[u8], algorithm: Algorithm, ttl: Duration) -> Result<Self> {
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(CuraError::ConfigError(format!(
                "Unsupported token algorithm: {:?}",
                algorithm
            )));
        }
        if ttl <= Duration::zero() {
            return Err(CuraError::ConfigError("Token TTL must be positive".to_string()));
        }

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        })
    }

    /// Create a token service from the security section of the configuration
    pub fn from_config(config: &SecurityConfig) -> Result<Self> {
        let algorithm = Algorithm::from_str(&config.jwt_algorithm).map_err(|_| {
            CuraError::ConfigError(format!("Unknown token algorithm: {}", config.jwt_algorithm))
        })?;

        let ttl = Duration::try_minutes(config.token_ttl_minutes).ok_or_else(|| {
            CuraError::ConfigError(format!(
                "Token TTL out of range: {} minutes",
                config.token_ttl_minutes
            ))
        })?;

        Self::new(config.jwt_secret.as_bytes(), algorithm, ttl)
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `subject_id`, valid from `issued_at` until `issued_at + ttl`.
    ///
    /// `exp` is whole seconds, rounded up so a sub-second issue time never
    /// shortens the token's lifetime.
    pub fn issue(&self, subject_id: &str, issued_at: DateTime<Utc>) -> Result<String> {
        let expiration = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| CuraError::Internal("Failed to calculate expiration".to_string()))?;

        let mut exp = expiration.timestamp();
        if expiration.timestamp_subsec_nanos() > 0 {
            exp += 1;
        }

        let claims = Claims {
            sub: subject_id.to_string(),
            iat: issued_at.timestamp(),
            exp,
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| CuraError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Issue a token valid from now
    pub fn issue_now(&self, subject_id: &str) -> Result<String> {
        self.issue(subject_id, Utc::now())
    }

    /// Verify a token against the current time and return its subject
    pub fn verify(&self, token: &str) -> std::result::Result<String, VerificationError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as of `now`.
    ///
    /// The signature is checked before expiry; a token is expired once
    /// `now >= exp`, with no leeway.
    pub fn verify_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<String, VerificationError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature => VerificationError::InvalidSignature,
                _ => VerificationError::Malformed,
            },
        )?;

        if now.timestamp() >= token_data.claims.exp {
            return Err(VerificationError::Expired);
        }

        Ok(token_data.claims.sub)
    }
}
