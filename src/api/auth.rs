use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::post;
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;
use validator::Validate;

use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{
    DomainErrorResponse, GenericErrorResponse, Json, UnauthenticatedResponse,
    ValidationErrorResponse,
};
use crate::security::token::TokenService;
use crate::{AppState, SharedData, domain, dto, persistence, security};

#[derive(OpenApi)]
#[openapi(paths(register, log_in))]
pub struct AuthApi;

pub const AUTH_API_GROUP: &str = "Auth";

/// Builds a router for account registration and token issuance
pub fn auth_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/register",
            post(
                |State(app_data): AppState,
                 Json(registration): Json<dto::user::RegisterUser>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let user_service = domain::user::UserService {};

                    register(registration, &mut ext_cxn, &user_service).await
                },
            ),
        )
        .route(
            "/token",
            post(
                |State(app_data): AppState,
                 Json(credentials): Json<dto::user::LoginRequest>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let user_service = domain::user::UserService {};

                    log_in(credentials, &mut ext_cxn, &user_service, &app_data.tokens).await
                },
            ),
        )
}

/// Registers a new account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = AUTH_API_GROUP,
    request_body = dto::user::RegisterUser,
    responses(
        (status = 201, description = "Account successfully registered", body = dto::user::UserResponse),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 409, response = dto::err_resps::BasicError409),
        (status = 500, response = dto::err_resps::BasicError500),
    )
)]
async fn register(
    registration: dto::user::RegisterUser,
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl domain::user::driving_ports::UserPort,
) -> Result<(StatusCode, Json<dto::user::UserResponse>), ErrorResponse> {
    info!("Registering account for {}", registration.username);
    registration
        .validate()
        .map_err(ValidationErrorResponse::from)?;

    let password_hash =
        security::password::hash_password(&registration.password).map_err(GenericErrorResponse)?;
    let new_user = domain::user::CreateUser {
        email: registration.email,
        username: registration.username,
        password_hash,
    };

    let user_read = persistence::db_user_driven_ports::DbReadUsers {};
    let user_write = persistence::db_user_driven_ports::DbWriteUsers {};
    let created_user = user_service
        .register(&new_user, &mut *ext_cxn, &user_read, &user_write)
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok((
        StatusCode::CREATED,
        Json(dto::user::UserResponse::from(created_user)),
    ))
}

/// Exchanges account credentials for a bearer token
#[utoipa::path(
    post,
    path = "/auth/token",
    tag = AUTH_API_GROUP,
    request_body = dto::user::LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = dto::user::TokenResponse),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 500, response = dto::err_resps::BasicError500),
    )
)]
async fn log_in(
    credentials: dto::user::LoginRequest,
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl domain::user::driving_ports::UserPort,
    tokens: &TokenService,
) -> Result<Json<dto::user::TokenResponse>, ErrorResponse> {
    info!("Login attempt for {}", credentials.email);
    credentials
        .validate()
        .map_err(ValidationErrorResponse::from)?;

    let user_read = persistence::db_user_driven_ports::DbReadUsers {};
    let matched_user = user_service
        .find_by_login(&credentials.email, &mut *ext_cxn, &user_read)
        .await
        .map_err(DomainErrorResponse::from)?;

    // Same response for a missing account and a wrong password so the endpoint
    // can't be used to enumerate accounts.
    let Some(user) = matched_user else {
        return Err(UnauthenticatedResponse.into());
    };
    if !security::password::verify_password(&credentials.password, &user.password_hash) {
        return Err(UnauthenticatedResponse.into());
    }

    let access_token = tokens
        .issue(user.id, &user.email)
        .map_err(|token_err| GenericErrorResponse(token_err.into()))?;

    Ok(Json(dto::user::TokenResponse::bearer(access_token)))
}
