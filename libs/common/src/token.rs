//! Bearer token issuance and validation
//!
//! Tokens are HS256-signed JWTs carrying the user id. Clients treat them as
//! opaque strings sent in the `Authorization: Bearer` header; both services
//! validate them with the same shared secret.

use crate::error::{TokenError, TokenResult};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Token configuration
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Shared secret used to sign and verify tokens
    pub secret: String,
    /// Token lifetime in seconds (default: 7 days)
    pub expiry: u64,
}

impl TokenConfig {
    /// Create a new TokenConfig from environment variables
    ///
    /// # Environment Variables
    /// - `TOKEN_SECRET`: Signing secret (required)
    /// - `TOKEN_EXPIRY`: Token lifetime in seconds (default: 604800)
    pub fn from_env() -> TokenResult<Self> {
        let secret = std::env::var("TOKEN_SECRET").map_err(|_| {
            TokenError::Configuration("TOKEN_SECRET environment variable not set".to_string())
        })?;

        if secret.trim().is_empty() {
            return Err(TokenError::Configuration(
                "TOKEN_SECRET must not be empty".to_string(),
            ));
        }

        let expiry = std::env::var("TOKEN_EXPIRY")
            .unwrap_or_else(|_| "604800".to_string()) // 7 days
            .parse()
            .unwrap_or(604800);

        Ok(TokenConfig { secret, expiry })
    }
}

/// Claims carried by every token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: i64,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// Issues and validates bearer tokens
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: TokenConfig,
}

impl TokenService {
    /// Initialize a new token service
    pub fn new(config: TokenConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        TokenService {
            encoding_key,
            decoding_key,
            validation,
            config,
        }
    }

    /// Issue a token for a user
    pub fn issue(&self, user_id: i64) -> TokenResult<String> {
        let now = now_secs()?;
        let claims = Claims {
            sub: user_id,
            iat: now,
            exp: now + self.config.expiry,
        };

        self.encode(&claims)
    }

    /// Validate a token and return its claims
    pub fn validate(&self, token: &str) -> TokenResult<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }

    fn encode(&self, claims: &Claims) -> TokenResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::Invalid(e.to_string()))
    }
}

fn now_secs() -> TokenResult<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| TokenError::Clock(e.to_string()))
}
