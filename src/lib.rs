use axum::Router;
use axum::extract::State;
use axum::routing::get;
use std::sync::Arc;

use crate::security::token::TokenService;

pub mod api;
pub mod app_env;
pub mod db;
pub mod domain;
pub mod dto;
pub mod external_connections;
pub mod logging;
pub mod persistence;
pub mod routing_utils;
pub mod security;

/// State shared by every request handler: the external connectivity clients and
/// the token service guarding the API
pub struct SharedData {
    pub ext_cxn: persistence::ExternalConnectivity,
    pub tokens: TokenService,
}

/// Extractor alias for the shared application state
pub type AppState = State<Arc<SharedData>>;

/// Assembles the application router from every route group, the swagger UI, and
/// the HTTP tracing layer
pub fn build_router(shared_data: Arc<SharedData>) -> Router {
    let app = Router::new()
        .route("/", get(|| async { "Listkeeper is running." }))
        .route("/health", get(|| async { "OK" }))
        .nest("/auth", api::auth::auth_routes())
        .nest("/users", api::users::user_routes())
        .nest("/tasks", api::tasks::task_routes())
        .nest("/lists", api::lists::list_routes())
        .nest("/groups", api::groups::group_routes())
        .merge(api::swagger_main::build_documentation())
        .with_state(shared_data);

    logging::attach_tracing_http(app)
}
