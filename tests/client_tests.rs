mod common;

use std::net::SocketAddr;
use std::sync::Arc;

use common::test_config;
use reqwest::StatusCode;
use taskbook::client::{ClientError, FileTokenStore, MemoryTokenStore, TodoClient, TokenStore};
use taskbook::clock::ManualClock;
use taskbook::jwt::ACCESS_TOKEN_DURATION_SECS;
use taskbook::start_server;

async fn start() -> (SocketAddr, ManualClock) {
    let (config, clock) = test_config().await;
    let (_handle, addr) = start_server(config, 0).await.expect("Failed to start server");
    (addr, clock)
}

fn client(addr: SocketAddr) -> TodoClient<taskbook::client::HttpTransport, taskbook::client::HttpTransport> {
    TodoClient::connect(&format!("http://{addr}"), Arc::new(MemoryTokenStore::new())).unwrap()
}

fn api_status<T: std::fmt::Debug>(result: Result<T, ClientError>) -> Option<StatusCode> {
    result.unwrap_err().status()
}

#[tokio::test]
async fn test_client_todo_flow() {
    let (addr, _) = start().await;
    let client = client(addr);

    client.signup("a@x.com", "pw").await.unwrap();
    assert!(client.is_logged_in());
    assert_eq!(client.verify().await.unwrap().email, "a@x.com");

    let todo = client.create_todo("buy milk").await.unwrap();
    assert_eq!(todo.title, "buy milk");
    assert!(!todo.completed);

    let toggled = client.toggle_todo(todo.id).await.unwrap();
    assert!(toggled.completed);

    let renamed = client.rename_todo(todo.id, "buy oat milk").await.unwrap();
    assert_eq!(renamed.title, "buy oat milk");
    assert!(renamed.completed);

    let undone = client.set_completed(todo.id, false).await.unwrap();
    assert!(!undone.completed);

    assert_eq!(client.list_todos().await.unwrap(), vec![undone]);

    client.delete_todo(todo.id).await.unwrap();
    assert_eq!(
        api_status(client.get_todo(todo.id).await),
        Some(StatusCode::NOT_FOUND)
    );
}

#[tokio::test]
async fn test_expired_access_token_is_refreshed_transparently() {
    let (addr, clock) = start().await;
    let store = Arc::new(MemoryTokenStore::new());
    let client = TodoClient::connect(&format!("http://{addr}"), store.clone()).unwrap();
    client.signup("a@x.com", "pw").await.unwrap();
    client.create_todo("survives expiry").await.unwrap();
    let before = store.load().unwrap();

    clock.advance(ACCESS_TOKEN_DURATION_SECS + 1);

    let todos = client.list_todos().await.unwrap();
    assert_eq!(todos.len(), 1);

    let after = store.load().unwrap();
    assert_ne!(after.access_token, before.access_token);
    assert_ne!(after.refresh_token, before.refresh_token);
}

#[tokio::test]
async fn test_concurrent_requests_after_expiry_both_succeed() {
    let (addr, clock) = start().await;
    let client = client(addr);
    client.signup("a@x.com", "pw").await.unwrap();
    let todo = client.create_todo("one").await.unwrap();

    clock.advance(ACCESS_TOKEN_DURATION_SECS + 1);

    let (list, single) = tokio::join!(client.list_todos(), client.get_todo(todo.id));
    assert_eq!(list.unwrap().len(), 1);
    assert_eq!(single.unwrap().title, "one");
}

#[tokio::test]
async fn test_stale_refresh_token_logs_the_client_out() {
    let (addr, clock) = start().await;
    let first = client(addr);
    let second = client(addr);
    first.signup("a@x.com", "pw").await.unwrap();

    // Logging in elsewhere replaces the stored refresh token
    second.login("a@x.com", "pw").await.unwrap();
    clock.advance(ACCESS_TOKEN_DURATION_SECS + 1);

    assert_eq!(
        api_status(first.list_todos().await),
        Some(StatusCode::UNAUTHORIZED)
    );
    assert!(!first.is_logged_in());
}

#[tokio::test]
async fn test_failed_login_keeps_existing_session() {
    let (addr, _) = start().await;
    let client = client(addr);
    client.signup("a@x.com", "pw").await.unwrap();

    assert_eq!(
        api_status(client.login("a@x.com", "wrong").await),
        Some(StatusCode::UNAUTHORIZED)
    );
    assert!(client.is_logged_in());
    assert!(client.list_todos().await.is_ok());
}

#[tokio::test]
async fn test_signup_conflict_surfaces_as_api_error() {
    let (addr, _) = start().await;
    client(addr).signup("a@x.com", "pw").await.unwrap();

    match client(addr).signup("a@x.com", "other").await {
        Err(ClientError::Api { status, message }) => {
            assert_eq!(status, StatusCode::CONFLICT);
            assert_eq!(message, "User already exists");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn test_logout_clears_session() {
    let (addr, _) = start().await;
    let client = client(addr);
    client.signup("a@x.com", "pw").await.unwrap();

    client.logout().await.unwrap();
    assert!(!client.is_logged_in());

    // Second logout is a no-op
    client.logout().await.unwrap();

    assert_eq!(
        api_status(client.list_todos().await),
        Some(StatusCode::UNAUTHORIZED)
    );
}

#[tokio::test]
async fn test_file_session_is_shared_between_clients() {
    let (addr, _) = start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let url = format!("http://{addr}");

    let first = TodoClient::connect(&url, Arc::new(FileTokenStore::new(&path))).unwrap();
    first.signup("a@x.com", "pw").await.unwrap();
    first.create_todo("persisted").await.unwrap();

    let second = TodoClient::connect(&url, Arc::new(FileTokenStore::new(&path))).unwrap();
    let todos = second.list_todos().await.unwrap();
    assert_eq!(todos[0].title, "persisted");

    second.logout().await.unwrap();
    assert!(!path.exists());
    assert!(!first.is_logged_in());
}
