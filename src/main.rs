use dotenv::dotenv;
use std::env;
use std::sync::Arc;
use tracing::info;

use listkeeper::security::token::TokenService;
use listkeeper::{SharedData, app_env, build_router, db, logging, persistence};

#[tokio::main]
async fn main() {
    dotenv().ok();
    logging::setup_logging(logging::init_env_filter());

    let db_url = env::var(app_env::DB_URL).expect("Could not get database URL from environment");
    let jwt_secret =
        env::var(app_env::JWT_SECRET).expect("Could not get token signing secret from environment");
    let bind_address =
        env::var(app_env::BIND_ADDRESS).unwrap_or_else(|_| "0.0.0.0:8080".to_owned());

    let db_pool = db::connect_sqlx(&db_url).await;
    sqlx::migrate!()
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");

    let shared_data = Arc::new(SharedData {
        ext_cxn: persistence::ExternalConnectivity::new(db_pool),
        tokens: TokenService::new(&jwt_secret),
    });
    let router = build_router(shared_data);

    info!("Starting server on {bind_address}.");
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .expect("Failed to bind server address");
    axum::serve(listener, router)
        .await
        .expect("Server stopped unexpectedly");
}
