//! The loopback HTTP frontend: a token-authenticated `axum` router exposing
//! the snapshot store to sibling `betterhist get` invocations.

mod auth;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::middleware;
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::AuthToken;
use crate::store::SnapshotStore;

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SnapshotStore>,
    pub token: AuthToken,
    pub name: Arc<str>,
}

/// A running frontend: the assigned port and a handle used to shut the
/// server down cooperatively.
pub struct Frontend {
    pub port: u16,
    shutdown: tokio::sync::oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl Frontend {
    /// Cancel in-flight requests, close the listener, and wait for the
    /// serve task to finish releasing the store.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        let _ = self.handle.await;
    }
}

/// Bind to `127.0.0.1:0` and start serving. The assigned port is available
/// on the returned [`Frontend`] *before* this function returns — the
/// listener is bound and its port read prior to spawning the serve task,
/// so no caller can observe a frontend whose port isn't real yet.
pub async fn serve(name: impl Into<Arc<str>>, store: Arc<SnapshotStore>, token: AuthToken) -> anyhow::Result<Frontend> {
    let name = name.into();
    let state = AppState { store, token, name: name.clone() };
    let router = build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], 0));
    let listener = TcpListener::bind(addr).await?;
    let port = listener.local_addr()?.port();
    info!(port, %name, "history server listening");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = tokio::spawn(async move {
        let result = axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await;
        if let Err(err) = result {
            tracing::error!(%err, "history server exited with an error");
        }
    });

    Ok(Frontend { port, shutdown: shutdown_tx, handle })
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::router())
        .layer(middleware::from_fn_with_state(state.clone(), auth::require_token))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;

    fn test_state() -> AppState {
        AppState {
            store: Arc::new(SnapshotStore::new("history")),
            token: AuthToken::from("test-token".to_string()),
            name: Arc::from("history"),
        }
    }

    #[tokio::test]
    async fn unauthenticated_request_never_reaches_the_handler() {
        let app = build_router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/history/items/0")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn authenticated_request_with_empty_store_is_out_of_range() {
        let app = build_router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/history/items/0")
                    .header(crate::auth::AUTH_HEADER, "test-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
