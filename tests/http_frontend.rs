//! End-to-end coverage of the loopback HTTP frontend: a real bound socket,
//! a real token, real requests over `reqwest`.

use std::sync::Arc;

use betterhist::auth::{AuthToken, AUTH_HEADER};
use betterhist::http;
use betterhist::store::{Snapshot, SnapshotStore};

fn snapshot(user: &str, command: &str) -> Snapshot {
    Snapshot {
        timestamp: 1_700_000_000.0,
        columns: 80,
        lines: 24,
        user_view: user.to_string(),
        command_view: command.to_string(),
    }
}

#[tokio::test]
async fn requests_without_the_token_are_rejected() {
    let store = Arc::new(SnapshotStore::new("history"));
    let token = AuthToken::generate();
    let frontend = http::serve("history", store, token).await.unwrap();

    let client = reqwest::Client::new();
    let response = client
        .get(format!("http://127.0.0.1:{}/history/items/0", frontend.port))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
    frontend.shutdown().await;
}

#[tokio::test]
async fn negative_index_fetches_the_most_recent_entry() {
    let store = Arc::new(SnapshotStore::new("history"));
    store.append(snapshot("ls", "a b c"));
    store.append(snapshot("pwd", "/home/user"));

    let token = AuthToken::generate();
    let auth_header = token.as_str().to_string();
    let frontend = http::serve("history", store, token).await.unwrap();

    let client = reqwest::Client::new();
    let response = client
        .get(format!("http://127.0.0.1:{}/history/items/-1", frontend.port))
        .header(AUTH_HEADER, &auth_header)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["snapshot"]["user_view"], "pwd");
    frontend.shutdown().await;
}

#[tokio::test]
async fn out_of_range_index_is_a_404() {
    let store = Arc::new(SnapshotStore::new("history"));
    store.append(snapshot("ls", "a b c"));

    let token = AuthToken::generate();
    let auth_header = token.as_str().to_string();
    let frontend = http::serve("history", store, token).await.unwrap();

    let client = reqwest::Client::new();
    let response = client
        .get(format!("http://127.0.0.1:{}/history/items/5", frontend.port))
        .header(AUTH_HEADER, &auth_header)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    frontend.shutdown().await;
}

#[tokio::test]
async fn search_finds_the_most_recent_match_first() {
    let store = Arc::new(SnapshotStore::new("history"));
    store.append(snapshot("git status", ""));
    store.append(snapshot("ls", ""));
    store.append(snapshot("git log", ""));

    let token = AuthToken::generate();
    let auth_header = token.as_str().to_string();
    let frontend = http::serve("history", store, token).await.unwrap();

    let client = reqwest::Client::new();
    let response = client
        .get(format!(
            "http://127.0.0.1:{}/history/search/?pattern=git",
            frontend.port
        ))
        .header(AUTH_HEADER, &auth_header)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["snapshot"]["user_view"], "git log");
    frontend.shutdown().await;
}

#[tokio::test]
async fn adding_an_item_over_http_increases_the_store_length() {
    let store = Arc::new(SnapshotStore::new("history"));
    let token = AuthToken::generate();
    let auth_header = token.as_str().to_string();
    let frontend = http::serve("history", store.clone(), token).await.unwrap();

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://127.0.0.1:{}/history/items/", frontend.port))
        .header(AUTH_HEADER, &auth_header)
        .json(&snapshot("echo hi", "hi"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(store.len(), 1);
    frontend.shutdown().await;
}
