use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

/// Reject requests whose Host header is not in the configured allow list.
/// A `*` entry or an empty list disables the check.
pub async fn enforce_trusted_hosts(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let trusted = &state.config.trusted_hosts;
    if trusted.is_empty() || trusted.iter().any(|host| host == "*") {
        return Ok(next.run(request).await);
    }

    let hostname = request
        .headers()
        .get(http::header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .split(':')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if trusted
        .iter()
        .any(|host| host.eq_ignore_ascii_case(&hostname))
    {
        Ok(next.run(request).await)
    } else {
        Err(AppError::BadRequest("Untrusted host header.".to_string()))
    }
}
