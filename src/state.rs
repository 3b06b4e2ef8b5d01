use std::sync::Arc;

use crate::{config::Config, store::ScoringStore};
use axum::extract::FromRef;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    /// Storage used by submission and grading.
    pub store: Arc<dyn ScoringStore>,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<dyn ScoringStore> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}
