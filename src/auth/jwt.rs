//! JWT token issuance and verification
//! Implements the access token + refresh token pattern. Tokens are stateless:
//! validity depends only on signature, expiry and the configured secret.

use crate::{config::SecurityConfig, error::AppError, models::account::Account};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token type discriminator, stored in the `type` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims
///
/// Identity claims are optional at the type level so that a token which
/// decodes but lacks them can be told apart from one that does not decode.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (account email)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<TokenType>,

    /// Issued at
    #[serde(default)]
    pub iat: i64,

    /// Expiration
    pub exp: i64,

    /// JWT ID (unique token identifier)
    #[serde(default)]
    pub jti: String,
}

/// Identity embedded into issued tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub email: String,
    pub user_id: Uuid,
    pub role: String,
}

impl TokenSubject {
    /// Build claims from the account's current state.
    ///
    /// Fails with `Forbidden` when the account has no role, since every token
    /// carries exactly one.
    pub fn from_account(account: &Account) -> Result<Self, AppError> {
        let role = account.primary_role_name().ok_or_else(|| {
            tracing::warn!(user_id = %account.id, "Account has no role assigned");
            AppError::Forbidden
        })?;

        Ok(Self {
            email: account.email.clone(),
            user_id: account.id,
            role: role.to_string(),
        })
    }
}

/// Token pair response
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Seconds until the access token expires
    pub expires_in: u64,
}

/// JWT service
pub struct JwtService {
    header: Header,
    validation: Validation,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_exp_secs: u64,
    refresh_token_exp_secs: u64,
}

impl JwtService {
    pub fn new(
        secret: &str,
        algorithm: Algorithm,
        access_token_exp_secs: u64,
        refresh_token_exp_secs: u64,
    ) -> Self {
        let mut validation = Validation::new(algorithm);
        // An expired token is rejected even one second past `exp`
        validation.leeway = 0;

        Self {
            header: Header::new(algorithm),
            validation,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_exp_secs,
            refresh_token_exp_secs,
        }
    }

    /// Create JWT service from config
    pub fn from_config(config: &SecurityConfig) -> Result<Self, AppError> {
        let secret = config.jwt_secret.expose_secret();

        if secret.len() < 32 {
            return Err(AppError::Config("JWT secret too short (min 32 chars)".to_string()));
        }

        Ok(Self::new(
            secret,
            config.algorithm()?,
            config.access_token_exp_secs,
            config.refresh_token_exp_secs,
        ))
    }

    pub fn access_token_exp_secs(&self) -> u64 {
        self.access_token_exp_secs
    }

    pub fn issue_access(&self, subject: &TokenSubject) -> Result<String, AppError> {
        self.issue(subject, TokenType::Access, self.access_token_exp_secs)
    }

    pub fn issue_refresh(&self, subject: &TokenSubject) -> Result<String, AppError> {
        self.issue(subject, TokenType::Refresh, self.refresh_token_exp_secs)
    }

    pub fn issue_pair(&self, subject: &TokenSubject) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.issue_access(subject)?,
            refresh_token: self.issue_refresh(subject)?,
            token_type: "bearer",
            expires_in: self.access_token_exp_secs,
        })
    }

    fn issue(
        &self,
        subject: &TokenSubject,
        token_type: TokenType,
        ttl_secs: u64,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now + Duration::seconds(ttl_secs as i64);

        let claims = Claims {
            sub: Some(subject.email.clone()),
            user_id: Some(subject.user_id),
            role: Some(subject.role.clone()),
            token_type: Some(token_type),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        self.encode(&claims)
    }

    /// Sign an arbitrary claim set
    pub fn encode(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&self.header, claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode token: {:?}", e);
            AppError::Internal(format!("Failed to encode token: {}", e))
        })
    }

    /// Verify signature and expiry.
    ///
    /// Every decode failure (bad signature, expired, malformed, wrong
    /// algorithm) collapses to `None`.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!("Token validation failed: {:?}", e.kind());
                None
            }
        }
    }
}
