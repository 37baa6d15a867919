mod auth;
mod error;
mod health;
mod todos;
mod validate;

use axum::Router;
use std::sync::Arc;

use crate::auth::AuthService;
use crate::db::Database;
use crate::rate_limit::RateLimitConfig;

pub use error::{ApiError, ResultExt};
pub use validate::{Validate, ValidJson, parse_id};

/// Create the API router.
pub fn create_api_router(
    db: Database,
    auth: AuthService,
    rate_limit: Option<Arc<RateLimitConfig>>,
) -> Router {
    let auth_state = auth::AuthState {
        auth: auth.clone(),
        rate_limit,
    };

    let todos_state = todos::TodosState { db, auth };

    Router::new()
        .nest("/auth", auth::router(auth_state))
        .nest("/todos", todos::router(todos_state))
        .merge(health::router())
}
