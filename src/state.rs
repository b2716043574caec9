use std::sync::Arc;

use sqlx::SqlitePool;

use crate::api::ApiClient;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub api: Arc<ApiClient>,
}
