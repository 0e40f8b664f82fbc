use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::utils::validate_secret_strength;
use notehub_config::Config;

/// Token kind discriminator baked into every JWT.
///
/// Access tokens open the auth gate; refresh tokens are only good for
/// minting a new pair. A token presented for the wrong purpose fails
/// verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,     // username
    pub exp: i64,        // Expiration time
    pub iat: i64,        // Issued at
    pub kind: TokenKind, // access | refresh
}

/// Issues and verifies HS256 tokens with a shared symmetric secret.
///
/// Every service holds the same secret: the monolith issues tokens, the
/// notes and folders services only ever verify them.
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    /// Access token TTL in minutes (short-lived)
    access_token_ttl_minutes: i64,
    /// Refresh token TTL in days
    refresh_token_ttl_days: i64,
}

impl AuthManager {
    pub fn new(config: &Config) -> Result<Self> {
        Self::from_parts(
            &config.jwt_secret,
            config.access_token_ttl_minutes,
            config.refresh_token_ttl_days,
        )
    }

    /// Build from raw parts. Fails on an empty secret or a non-positive
    /// lifetime rather than silently issuing dead-on-arrival tokens.
    pub fn from_parts(
        secret: &str,
        access_token_ttl_minutes: i64,
        refresh_token_ttl_days: i64,
    ) -> Result<Self> {
        if secret.trim().is_empty() {
            anyhow::bail!(
                "JWT_SECRET must be set: all NoteHub services share one HS256 signing secret"
            );
        }

        if let Err(reason) = validate_secret_strength(secret, 32) {
            tracing::warn!(
                reason = %reason,
                "JWT_SECRET is weak - acceptable for development, rotate it for production"
            );
        }

        if access_token_ttl_minutes <= 0 {
            anyhow::bail!(
                "Access token TTL must be positive (got {} minutes)",
                access_token_ttl_minutes
            );
        }

        if refresh_token_ttl_days <= 0 {
            anyhow::bail!(
                "Refresh token TTL must be positive (got {} days)",
                refresh_token_ttl_days
            );
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_ttl_minutes,
            refresh_token_ttl_days,
        })
    }

    fn lifetime(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => Duration::minutes(self.access_token_ttl_minutes),
            TokenKind::Refresh => Duration::days(self.refresh_token_ttl_days),
        }
    }

    /// Create a signed token of the given kind for a username
    pub fn issue_token(&self, username: &str, kind: TokenKind) -> Result<String> {
        self.issue_token_with_lifetime(username, kind, self.lifetime(kind))
    }

    fn issue_token_with_lifetime(
        &self,
        username: &str,
        kind: TokenKind,
        lifetime: Duration,
    ) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: username.to_string(),
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
            kind,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .context("Failed to encode JWT token")
    }

    /// Create an access + refresh pair for a username (login and refresh
    /// both respond with a fresh pair)
    pub fn issue_pair(&self, username: &str) -> Result<(String, String)> {
        let access = self.issue_token(username, TokenKind::Access)?;
        let refresh = self.issue_token(username, TokenKind::Refresh)?;
        Ok((access, refresh))
    }

    /// Verify signature and expiry, returning the claims
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        // No clock leeway: an expired token fails immediately
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .context("Invalid or expired token")?;
        Ok(token_data.claims)
    }

    /// Verify and additionally require the kind claim to match
    pub fn verify_token_of_kind(&self, token: &str, expected: TokenKind) -> Result<Claims> {
        let claims = self.verify_token(token)?;
        if claims.kind != expected {
            anyhow::bail!(
                "Expected {} token, got {}",
                expected.as_str(),
                claims.kind.as_str()
            );
        }
        Ok(claims)
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod auth_tests;
