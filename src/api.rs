pub mod auth;
pub mod groups;
pub mod lists;
pub mod swagger_main;
pub mod tasks;
pub mod users;

#[cfg(test)]
pub mod test_util;

use crate::SharedData;
use crate::routing_utils::UnauthenticatedResponse;
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use std::sync::Arc;

/// The account a request's bearer token resolved to. Extracting this from a request
/// rejects it with a 401 when the Authorization header is missing, malformed, or
/// carries an expired or forged token.
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub email: String,
}

#[axum::async_trait]
impl FromRequestParts<Arc<SharedData>> for AuthenticatedUser {
    type Rejection = UnauthenticatedResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<SharedData>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|header_value| header_value.to_str().ok())
            .ok_or(UnauthenticatedResponse)?;
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(UnauthenticatedResponse)?;

        let claims = state
            .tokens
            .verify(token)
            .map_err(|_| UnauthenticatedResponse)?;

        Ok(AuthenticatedUser {
            user_id: claims.user_id,
            email: claims.sub,
        })
    }
}
