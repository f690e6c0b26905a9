pub mod auth;
pub mod health;

use std::sync::Arc;

use axum::Router;

use crate::AppState;

/// Full application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::router())
        .merge(auth::router(state))
}
