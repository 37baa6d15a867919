//! Todo API. All endpoints require a bearer access token and only ever
//! see the caller's own todos; someone else's id is reported as 404.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tracing::debug;

use super::error::{ApiError, ResultExt};
use super::validate::{ValidJson, parse_id};
use crate::auth::{Auth, AuthService};
use crate::db::{Database, Todo, TodoChanges};
use crate::impl_has_auth_backend;
use crate::wire::{CreateTodo, TodoItem, UpdateTodo};

#[derive(Clone)]
pub struct TodosState {
    pub db: Database,
    pub auth: AuthService,
}

impl_has_auth_backend!(TodosState);

pub fn router(state: TodosState) -> Router {
    Router::new()
        .route("/", get(list_todos).post(create_todo))
        .route("/{id}", get(get_todo).put(update_todo).delete(delete_todo))
        .with_state(state)
}

impl From<Todo> for TodoItem {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id,
            title: todo.title,
            completed: todo.completed,
        }
    }
}

fn todo_not_found() -> ApiError {
    ApiError::not_found("Todo not found")
}

async fn list_todos(
    State(state): State<TodosState>,
    Auth(user): Auth,
) -> Result<impl IntoResponse, ApiError> {
    let todos = state
        .db
        .todos()
        .list_by_user(user.user_id)
        .await
        .db_err("Failed to list todos")?;

    let items: Vec<TodoItem> = todos.into_iter().map(TodoItem::from).collect();
    Ok(Json(items))
}

async fn get_todo(
    State(state): State<TodosState>,
    Auth(user): Auth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;

    let todo = state
        .db
        .todos()
        .get_for_user(id, user.user_id)
        .await
        .db_err("Failed to get todo")?
        .ok_or_else(todo_not_found)?;

    Ok(Json(TodoItem::from(todo)))
}

async fn create_todo(
    State(state): State<TodosState>,
    Auth(user): Auth,
    ValidJson(payload): ValidJson<CreateTodo>,
) -> Result<impl IntoResponse, ApiError> {
    let todo = state
        .db
        .todos()
        .create(user.user_id, &payload.title)
        .await
        .db_err("Failed to create todo")?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    debug!(user_id = user.user_id, todo_id = todo.id, "Created todo");
    Ok((StatusCode::CREATED, Json(TodoItem::from(todo))))
}

async fn update_todo(
    State(state): State<TodosState>,
    Auth(user): Auth,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<UpdateTodo>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;

    let changes = TodoChanges {
        title: payload.title.as_deref(),
        completed: payload.completed,
    };

    let todo = state
        .db
        .todos()
        .update(id, user.user_id, changes)
        .await
        .db_err("Failed to update todo")?
        .ok_or_else(todo_not_found)?;

    Ok(Json(TodoItem::from(todo)))
}

async fn delete_todo(
    State(state): State<TodosState>,
    Auth(user): Auth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;

    let deleted = state
        .db
        .todos()
        .delete(id, user.user_id)
        .await
        .db_err("Failed to delete todo")?;

    if !deleted {
        return Err(todo_not_found());
    }

    debug!(user_id = user.user_id, todo_id = id, "Deleted todo");
    Ok(StatusCode::NO_CONTENT)
}
