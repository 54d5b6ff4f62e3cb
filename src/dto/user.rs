use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::domain;

/// DTO for registering a new account via the API
#[derive(Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
#[validate(schema(function = "passwords_match"))]
pub struct RegisterUser {
    #[validate(email, length(min = 3, max = 255))]
    #[schema(example = "jdoe@example.com")]
    pub email: String,
    #[validate(length(min = 3, max = 255))]
    #[schema(example = "jdoe")]
    pub username: String,
    #[validate(length(min = 8, max = 255))]
    pub password: String,
    pub password_confirmation: String,
}

fn passwords_match(user: &RegisterUser) -> Result<(), ValidationError> {
    if user.password == user.password_confirmation {
        return Ok(());
    }

    let mut mismatch = ValidationError::new("password_mismatch");
    mismatch.message = Some("password and password_confirmation must match".into());
    Err(mismatch)
}

/// DTO for a registered account. Deliberately has no password field.
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq, Debug))]
pub struct UserResponse {
    #[schema(example = 4)]
    pub id: i32,
    #[schema(example = "jdoe@example.com")]
    pub email: String,
    #[schema(example = "jdoe")]
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<domain::user::User> for UserResponse {
    fn from(value: domain::user::User) -> Self {
        UserResponse {
            id: value.id,
            email: value.email,
            username: value.username,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

/// DTO for exchanging credentials for an access token
#[derive(Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct LoginRequest {
    #[validate(email)]
    #[schema(example = "jdoe@example.com")]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// DTO carrying a freshly issued bearer token
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct TokenResponse {
    pub access_token: String,
    #[schema(example = "bearer")]
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> TokenResponse {
        TokenResponse {
            access_token,
            token_type: "bearer".to_owned(),
        }
    }
}
