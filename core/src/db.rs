use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Sizes the pool to at least one connection per worker plus overflow
/// headroom, per §5's `2 * worker_count + 2` recommendation. The ingestion
/// binary passes `worker_count = 0`, yielding the plain default of 10.
pub async fn create_pool(database_url: &str, worker_count: u32) -> Result<PgPool, sqlx::Error> {
    let max_connections = if worker_count == 0 {
        10
    } else {
        2 * worker_count + 2
    };
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
