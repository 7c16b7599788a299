use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::SecurityConfig;

/// Token payload. The subject is the user's email; nothing else identifies the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(email: impl Into<String>, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: email.into(),
            exp: (issued_at + ttl).timestamp(),
            iat: issued_at.timestamp(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("JWT generation error: {0}")]
    Generation(String),
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// Issues and verifies signed, time-limited bearer tokens.
///
/// Verification never touches the database: it only proves the token was signed by us and
/// is still live, and hands back the embedded email.
#[derive(Clone)]
pub struct TokenGateway {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenGateway {
    pub fn new(config: &SecurityConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            ttl: Duration::minutes(config.jwt_expiry_minutes),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue_token(&self, email: &str) -> Result<String, TokenError> {
        self.issue_token_at(email, Utc::now())
    }

    pub fn issue_token_at(&self, email: &str, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims::new(email, issued_at, self.ttl);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }

    /// Returns the email the token was issued for
    pub fn verify_token(&self, token: &str) -> Result<String, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            }
        })?;

        if data.claims.sub.is_empty() {
            return Err(TokenError::Invalid("missing subject".to_string()));
        }
        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn gateway() -> TokenGateway {
        TokenGateway::new(&AppConfig::for_tests().security)
    }

    #[test]
    fn issued_token_verifies_to_email() {
        let gateway = gateway();
        let token = gateway.issue_token("a@x.com").unwrap();
        assert_eq!(gateway.verify_token(&token).unwrap(), "a@x.com");
    }

    #[test]
    fn expiry_is_issue_time_plus_ttl() {
        let issued_at = Utc::now();
        let claims = Claims::new("a@x.com", issued_at, Duration::minutes(30));
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn expired_token_is_rejected() {
        let gateway = gateway();
        let long_ago = Utc::now() - Duration::hours(2);
        let token = gateway.issue_token_at("a@x.com", long_ago).unwrap();
        assert!(matches!(gateway.verify_token(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let mut other = AppConfig::for_tests().security;
        other.jwt_secret = "someone-else".to_string();
        let forged = TokenGateway::new(&other).issue_token("a@x.com").unwrap();

        assert!(matches!(gateway().verify_token(&forged), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert!(matches!(gateway().verify_token("not.a.token"), Err(TokenError::Invalid(_))));
        assert!(matches!(gateway().verify_token(""), Err(TokenError::Invalid(_))));
    }
}
