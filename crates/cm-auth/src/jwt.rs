//! JWT verification
//!
//! HS256 bearer tokens; the subject claim carries the user id.

use cm_core::Id;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JWT claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// JWT ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

/// JWT errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Token is expired")]
    Expired,
    #[error("Invalid token: {0}")]
    Invalid(String),
    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),
}

/// Creates and validates bearer tokens over a shared secret
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Issue a token for a user
    pub fn create_token(&self, user_id: Id, expires_in_seconds: i64) -> Result<String, JwtError> {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as usize;

        let claims = Claims {
            sub: user_id.to_string(),
            exp: now + expires_in_seconds as usize,
            iat: now,
            jti: Some(uuid::Uuid::new_v4().to_string()),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Validate and decode a token
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid(e.to_string()),
            })?;

        Ok(token_data.claims)
    }

    /// Extract the user id from a validated token
    pub fn user_id_from_token(&self, token: &str) -> Result<Id, JwtError> {
        let claims = self.validate_token(token)?;
        claims
            .sub
            .parse()
            .map_err(|_| JwtError::Invalid("subject is not a user id".to_string()))
    }
}

/// Extract the bearer token from an Authorization header value
pub fn extract_bearer_token(authorization: &str) -> Option<&str> {
    if authorization.len() > 7 && authorization[..7].eq_ignore_ascii_case("bearer ") {
        Some(authorization[7..].trim())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let service = JwtService::new(b"test-secret");
        let token = service.create_token(42, 3600).unwrap();

        assert_eq!(service.user_id_from_token(&token).unwrap(), 42);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtService::new(b"issuer-secret");
        let verifier = JwtService::new(b"other-secret");

        let token = issuer.create_token(42, 3600).unwrap();
        assert!(matches!(
            verifier.validate_token(&token),
            Err(JwtError::Invalid(_))
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let service = JwtService::new(b"test-secret");
        assert!(matches!(
            service.validate_token("not.a.token"),
            Err(JwtError::Invalid(_))
        ));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("Basic abc123"), None);
        assert_eq!(extract_bearer_token(""), None);
    }
}
