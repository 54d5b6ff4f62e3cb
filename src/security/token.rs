use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How long an issued access token stays valid.
const TOKEN_LIFETIME_MINUTES: i64 = 30;

/// Claims carried by an access token. `sub` holds the email for log readability,
/// `user_id` is what authorization actually keys on.
#[derive(Serialize, Deserialize, Debug)]
pub struct Claims {
    pub sub: String,
    pub user_id: i32,
    pub exp: i64,
}

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("could not sign a new token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("token was rejected: {0}")]
    Rejected(#[source] jsonwebtoken::errors::Error),
}

/// Issues and verifies the HS256 bearer tokens guarding the API. Constructed once
/// at startup from the configured signing secret and shared behind the app state.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> TokenService {
        TokenService {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }

    /// Signs a fresh token for the given user, expiring in [TOKEN_LIFETIME_MINUTES]
    pub fn issue(&self, user_id: i32, email: &str) -> Result<String, TokenError> {
        let claims = Claims {
            sub: email.to_owned(),
            user_id,
            exp: (Utc::now() + Duration::minutes(TOKEN_LIFETIME_MINUTES)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(TokenError::Signing)
    }

    /// Verifies a presented token's signature and expiry, returning its claims
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|token_data| token_data.claims)
            .map_err(TokenError::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speculoos::prelude::*;

    #[test]
    fn verifies_its_own_tokens() {
        let tokens = TokenService::new("unit-test-secret");

        let token = tokens
            .issue(42, "somebody@example.com")
            .expect("issuing should succeed");
        let claims = tokens.verify(&token).expect("verification should succeed");

        assert_eq!(42, claims.user_id);
        assert_eq!("somebody@example.com", claims.sub);
        assert_that!(claims.exp).is_greater_than(Utc::now().timestamp());
    }

    #[test]
    fn rejects_tokens_signed_with_another_secret() {
        let tokens = TokenService::new("unit-test-secret");
        let other_tokens = TokenService::new("some-other-secret");

        let token = other_tokens
            .issue(42, "somebody@example.com")
            .expect("issuing should succeed");
        let verify_result = tokens.verify(&token);

        assert_that!(verify_result)
            .is_err()
            .matches(|err| matches!(err, TokenError::Rejected(_)));
    }

    #[test]
    fn rejects_garbage() {
        let tokens = TokenService::new("unit-test-secret");

        assert_that!(tokens.verify("not-even-a-jwt")).is_err();
    }
}
