use std::sync::Arc;

use sqlx::{Pool, Sqlite};

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Sqlite>,
    pub config: Arc<Config>,
}
