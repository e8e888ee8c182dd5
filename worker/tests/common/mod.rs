use sqlx::PgPool;

/// Connects to the integration-test database and applies migrations.
/// Mirrors the reference platform's `payment_collection_tests.rs` harness
/// shape: `TEST_DATABASE_URL`, migrate once per test, clean tables between
/// tests rather than dropping/recreating the schema.
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set for worker integration tests");

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("failed to connect to test database");

    sqlx::migrate!("../core/migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");

    pool
}

pub async fn cleanup(pool: &PgPool) {
    sqlx::query("DELETE FROM failed_events")
        .execute(pool)
        .await
        .expect("failed to clean failed_events");
    sqlx::query("DELETE FROM processed_events")
        .execute(pool)
        .await
        .expect("failed to clean processed_events");
    sqlx::query("DELETE FROM raw_events")
        .execute(pool)
        .await
        .expect("failed to clean raw_events");
}
