//! Request pipeline that keeps the access token fresh.
//!
//! Every request carries the stored access token. When the API answers 401
//! the pipeline exchanges the stored refresh token for a new pair and
//! re-sends the request once. A request never triggers more than one
//! refresh nor more than one retry. Refreshes are serialized per session:
//! a request that waited on another request's refresh retries with the
//! rotated token instead of refreshing again.
//!
//! Requests to the signup, login and refresh endpoints are passed through
//! untouched.

use std::sync::Arc;

use reqwest::StatusCode;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::error::ClientResult;
use super::tokens::TokenStore;
use super::transport::{ApiRequest, ApiResponse, Refresher, Transport};
use crate::wire::TokenPair;

/// Endpoints whose 401 is final.
pub const EXCLUDED_PATHS: [&str; 3] = ["/auth/login", "/auth/signup", "/auth/refresh-token"];

fn is_excluded(path: &str) -> bool {
    let path = path.split('?').next().unwrap_or(path);
    EXCLUDED_PATHS.contains(&path)
}

/// Tokens of one logged-in client plus the lock that serializes refreshes.
pub struct Session {
    store: Arc<dyn TokenStore>,
    refresh_lock: Mutex<()>,
}

impl Session {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            store,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn tokens(&self) -> Option<TokenPair> {
        self.store.load()
    }

    pub fn access_token(&self) -> Option<String> {
        self.store.load().map(|t| t.access_token)
    }

    pub fn is_logged_in(&self) -> bool {
        self.store.load().is_some()
    }

    pub fn set_tokens(&self, tokens: &TokenPair) -> ClientResult<()> {
        self.store.save(tokens)
    }

    pub fn clear(&self) -> ClientResult<()> {
        self.store.clear()
    }
}

pub struct RequestPipeline<T, R> {
    transport: T,
    refresher: R,
    session: Arc<Session>,
}

impl<T: Transport, R: Refresher> RequestPipeline<T, R> {
    pub fn new(transport: T, refresher: R, session: Arc<Session>) -> Self {
        Self {
            transport,
            refresher,
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Send a request, refreshing and retrying once on 401.
    ///
    /// Returns the final response whatever its status. Fails only on
    /// transport errors or when the refresh itself fails, in which case the
    /// stored tokens have been cleared.
    pub async fn execute(&self, request: &ApiRequest) -> ClientResult<ApiResponse> {
        let sent_token = self.session.access_token();
        let response = self.transport.send(request, sent_token.as_deref()).await?;

        if response.status != StatusCode::UNAUTHORIZED || is_excluded(&request.path) {
            return Ok(response);
        }

        let Some(access_token) = self.renew(sent_token.as_deref()).await? else {
            return Ok(response);
        };

        debug!(method = %request.method, path = %request.path, "Retrying with refreshed token");
        self.transport.send(request, Some(&access_token)).await
    }

    /// Get an access token newer than `sent_token`, refreshing if no other
    /// request already did. `None` when there is no session to refresh.
    async fn renew(&self, sent_token: Option<&str>) -> ClientResult<Option<String>> {
        let _guard = self.session.refresh_lock.lock().await;

        let Some(stored) = self.session.tokens() else {
            debug!("Unauthorized without a stored session");
            return Ok(None);
        };

        if sent_token != Some(stored.access_token.as_str()) {
            debug!("Token pair already rotated by a concurrent request");
            return Ok(Some(stored.access_token));
        }

        match self.refresher.refresh(&stored.refresh_token).await {
            Ok(tokens) => {
                self.session.set_tokens(&tokens)?;
                info!("Refreshed access token");
                Ok(Some(tokens.access_token))
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, clearing session");
                if let Err(clear_err) = self.session.clear() {
                    warn!(error = %clear_err, "Failed to clear stored tokens");
                }
                Err(e)
            }
        }
    }
}
