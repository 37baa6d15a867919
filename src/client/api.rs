//! Typed todo API client.

use std::sync::Arc;

use tracing::warn;

use super::error::ClientResult;
use super::pipeline::{RequestPipeline, Session};
use super::tokens::TokenStore;
use super::transport::{ApiRequest, HttpTransport, Refresher, Transport};
use crate::wire::{CreateTodo, Credentials, TodoItem, TokenPair, UpdateTodo, VerifiedUser};

pub struct TodoClient<T, R> {
    pipeline: RequestPipeline<T, R>,
}

impl TodoClient<HttpTransport, HttpTransport> {
    /// Client for the API at `base_url` with its session kept in `store`.
    pub fn connect(base_url: &str, store: Arc<dyn TokenStore>) -> ClientResult<Self> {
        let transport = HttpTransport::new(base_url)?;
        Ok(Self::new(
            transport.clone(),
            transport,
            Arc::new(Session::new(store)),
        ))
    }
}

impl<T: Transport, R: Refresher> TodoClient<T, R> {
    pub fn new(transport: T, refresher: R, session: Arc<Session>) -> Self {
        Self {
            pipeline: RequestPipeline::new(transport, refresher, session),
        }
    }

    pub fn session(&self) -> &Session {
        self.pipeline.session()
    }

    pub fn is_logged_in(&self) -> bool {
        self.session().is_logged_in()
    }

    pub async fn signup(&self, email: &str, password: &str) -> ClientResult<()> {
        self.start_session("/auth/signup", email, password).await
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<()> {
        self.start_session("/auth/login", email, password).await
    }

    async fn start_session(&self, path: &str, email: &str, password: &str) -> ClientResult<()> {
        let request = ApiRequest::post(path).json(&Credentials {
            email: email.to_string(),
            password: password.to_string(),
        })?;

        let tokens: TokenPair = self
            .pipeline
            .execute(&request)
            .await?
            .error_for_status()?
            .json()?;
        self.session().set_tokens(&tokens)
    }

    /// End the session on the server and forget the local tokens.
    /// Local tokens are cleared even when the server call fails.
    pub async fn logout(&self) -> ClientResult<()> {
        if !self.is_logged_in() {
            return Ok(());
        }

        let result = match self.pipeline.execute(&ApiRequest::post("/auth/logout")).await {
            Ok(response) => response.error_for_status().map(|_| ()),
            Err(e) => Err(e),
        };

        self.session().clear()?;

        if let Err(e) = &result {
            warn!(error = %e, "Server-side logout failed");
        }
        result
    }

    pub async fn verify(&self) -> ClientResult<VerifiedUser> {
        self.call(ApiRequest::get("/auth/verify-token")).await
    }

    pub async fn list_todos(&self) -> ClientResult<Vec<TodoItem>> {
        self.call(ApiRequest::get("/todos")).await
    }

    pub async fn get_todo(&self, id: i64) -> ClientResult<TodoItem> {
        self.call(ApiRequest::get(format!("/todos/{id}"))).await
    }

    pub async fn create_todo(&self, title: &str) -> ClientResult<TodoItem> {
        let request = ApiRequest::post("/todos").json(&CreateTodo {
            title: title.to_string(),
        })?;
        self.call(request).await
    }

    pub async fn update_todo(&self, id: i64, changes: &UpdateTodo) -> ClientResult<TodoItem> {
        let request = ApiRequest::put(format!("/todos/{id}")).json(changes)?;
        self.call(request).await
    }

    pub async fn set_completed(&self, id: i64, completed: bool) -> ClientResult<TodoItem> {
        let changes = UpdateTodo {
            completed: Some(completed),
            ..Default::default()
        };
        self.update_todo(id, &changes).await
    }

    pub async fn rename_todo(&self, id: i64, title: &str) -> ClientResult<TodoItem> {
        let changes = UpdateTodo {
            title: Some(title.to_string()),
            ..Default::default()
        };
        self.update_todo(id, &changes).await
    }

    /// Flip the completed flag.
    pub async fn toggle_todo(&self, id: i64) -> ClientResult<TodoItem> {
        let todo = self.get_todo(id).await?;
        self.set_completed(id, !todo.completed).await
    }

    pub async fn delete_todo(&self, id: i64) -> ClientResult<()> {
        self.pipeline
            .execute(&ApiRequest::delete(format!("/todos/{id}")))
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn call<D: serde::de::DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<D> {
        self.pipeline
            .execute(&request)
            .await?
            .error_for_status()?
            .json()
    }
}
