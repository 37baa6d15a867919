//! HTTP plumbing underneath the request pipeline.

use std::future::Future;

use reqwest::{Method, StatusCode, header};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;
use url::Url;

use super::error::{ClientError, ClientResult};
use crate::auth::bearer_header_value;
use crate::wire::{ErrorResponse, RefreshTokenRequest, TokenPair};

/// A request the pipeline can dispatch more than once.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL, e.g. `/todos/3`
    pub path: String,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn json(mut self, body: &impl Serialize) -> ClientResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }
}

/// Status and raw body of an API response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Turn a non-success status into `ClientError::Api`, using the
    /// `{error}` body as the message when there is one.
    pub fn error_for_status(self) -> ClientResult<Self> {
        if self.status.is_success() {
            return Ok(self);
        }

        let message = serde_json::from_slice::<ErrorResponse>(&self.body)
            .map(|e| e.error)
            .unwrap_or_else(|_| {
                self.status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });

        Err(ClientError::Api {
            status: self.status,
            message,
        })
    }

    pub fn json<T: DeserializeOwned>(&self) -> ClientResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Sends one request, with an optional bearer access token.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: &ApiRequest,
        access_token: Option<&str>,
    ) -> impl Future<Output = ClientResult<ApiResponse>> + Send;
}

/// Exchanges a refresh token for a new token pair.
pub trait Refresher: Send + Sync {
    fn refresh(&self, refresh_token: &str) -> impl Future<Output = ClientResult<TokenPair>> + Send;
}

/// `reqwest`-backed transport against a running API.
#[derive(Clone)]
pub struct HttpTransport {
    http_client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    /// Create a transport for an API base URL such as `http://localhost:3000`.
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http_client: reqwest::Client::new(),
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }
}

impl Transport for HttpTransport {
    async fn send(
        &self,
        request: &ApiRequest,
        access_token: Option<&str>,
    ) -> ClientResult<ApiResponse> {
        let url = self.url(&request.path)?;

        let mut builder = self
            .http_client
            .request(request.method.clone(), url)
            .header(header::ACCEPT, "application/json");
        if let Some(token) = access_token {
            builder = builder.header(header::AUTHORIZATION, bearer_header_value(token));
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();

        debug!(method = %request.method, path = %request.path, %status, "API response");
        Ok(ApiResponse { status, body })
    }
}

impl Refresher for HttpTransport {
    async fn refresh(&self, refresh_token: &str) -> ClientResult<TokenPair> {
        let request = ApiRequest::post("/auth/refresh-token").json(&RefreshTokenRequest {
            refresh_token: refresh_token.to_string(),
        })?;

        self.send(&request, None)
            .await?
            .error_for_status()?
            .json()
    }
}
