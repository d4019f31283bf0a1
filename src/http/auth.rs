//! Bearer-token middleware shared by every endpoint.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

use crate::auth::AUTH_HEADER;
use crate::http::AppState;

/// Rejects any request whose `X-Betterhist-Auth` header doesn't match the
/// session token. Applied as a layer over the whole router rather than
/// per-handler, since every endpoint requires it uniformly.
pub async fn require_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let presented = request
        .headers()
        .get(AUTH_HEADER)
        .and_then(|value| value.to_str().ok());

    match presented {
        Some(token) if token == state.token.as_str() => Ok(next.run(request).await),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}
