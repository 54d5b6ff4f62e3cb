use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

/// Builds the application's PostgreSQL connection pool. Panics if the database
/// cannot be reached, as the service cannot do anything useful without it.
pub async fn connect_sqlx(db_url: &str) -> PgPool {
    PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(2))
        .connect(db_url)
        .await
        .expect("Failed to build database connection pool")
}
