//! Authentication endpoints: signup, login, token refresh, verification and logout.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use std::sync::Arc;

use super::error::ApiError;
use super::validate::ValidJson;
use crate::auth::{Auth, AuthService};
use crate::impl_has_auth_backend;
use crate::rate_limit::{RateLimitConfig, rate_limit_login, rate_limit_refresh, rate_limit_signup};
use crate::wire::{Credentials, MessageResponse, RefreshTokenRequest, VerifiedUser};

#[derive(Clone)]
pub struct AuthState {
    pub auth: AuthService,
    pub rate_limit: Option<Arc<RateLimitConfig>>,
}

impl_has_auth_backend!(AuthState);

pub fn router(state: AuthState) -> Router {
    let signup_router = Router::new()
        .route("/signup", post(signup))
        .with_state(state.clone());
    let login_router = Router::new()
        .route("/login", post(login))
        .with_state(state.clone());
    let refresh_router = Router::new()
        .route("/refresh-token", post(refresh_token))
        .with_state(state.clone());

    let (signup_router, login_router, refresh_router) = match state.rate_limit.clone() {
        Some(config) => (
            signup_router.layer(middleware::from_fn_with_state(
                config.clone(),
                rate_limit_signup,
            )),
            login_router.layer(middleware::from_fn_with_state(
                config.clone(),
                rate_limit_login,
            )),
            refresh_router.layer(middleware::from_fn_with_state(config, rate_limit_refresh)),
        ),
        None => (signup_router, login_router, refresh_router),
    };

    Router::new()
        .route("/verify-token", get(verify_token))
        .route("/logout", post(logout))
        .with_state(state)
        .merge(signup_router)
        .merge(login_router)
        .merge(refresh_router)
}

async fn signup(
    State(state): State<AuthState>,
    ValidJson(payload): ValidJson<Credentials>,
) -> Result<impl IntoResponse, ApiError> {
    let pair = state.auth.signup(&payload.email, &payload.password).await?;
    Ok((StatusCode::CREATED, Json(pair)))
}

async fn login(
    State(state): State<AuthState>,
    ValidJson(payload): ValidJson<Credentials>,
) -> Result<impl IntoResponse, ApiError> {
    let pair = state.auth.login(&payload.email, &payload.password).await?;
    Ok(Json(pair))
}

async fn refresh_token(
    State(state): State<AuthState>,
    ValidJson(payload): ValidJson<RefreshTokenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let pair = state.auth.refresh(&payload.refresh_token).await?;
    Ok(Json(pair))
}

async fn verify_token(Auth(user): Auth) -> Json<VerifiedUser> {
    Json(VerifiedUser {
        id: user.user_id,
        email: user.email,
    })
}

async fn logout(
    State(state): State<AuthState>,
    Auth(user): Auth,
) -> Result<impl IntoResponse, ApiError> {
    state.auth.logout(user.user_id).await?;
    Ok(Json(MessageResponse {
        message: "Logged out successfully".into(),
    }))
}
