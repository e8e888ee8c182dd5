use std::sync::Arc;

use eventflow_core::Metrics;
use queue_adapter::QueueAdapter;
use sqlx::PgPool;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub queue: Arc<dyn QueueAdapter>,
    pub metrics: Arc<Metrics>,
    pub config: Config,
}
