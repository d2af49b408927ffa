use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

/// Reject requests whose Host header is not on the configured allow-list.
/// An empty list or a `*` entry disables the check.
pub async fn enforce_trusted_hosts(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let trusted = &state.config.trusted_hosts;
    if trusted.is_empty() || trusted.iter().any(|host| host == "*") {
        return Ok(next.run(request).await);
    }

    let host = request
        .headers()
        .get(http::header::HOST)
        .and_then(|value| value.to_str().ok());

    if !host_is_trusted(host, trusted) {
        let presented = host.unwrap_or_default();
        return Err(AppError::BadRequest(format!(
            "Untrusted host '{presented}'."
        )));
    }

    Ok(next.run(request).await)
}

fn host_is_trusted(host_header: Option<&str>, trusted: &[String]) -> bool {
    let Some(raw) = host_header.map(str::trim) else {
        return false;
    };

    // Host is either name[:port] or a bracketed IPv6 literal like [::1]:3000.
    let host = if let Some(rest) = raw.strip_prefix('[') {
        match rest.split_once(']') {
            Some((address, _port)) => address,
            None => return false,
        }
    } else if raw.matches(':').count() > 1 {
        // Bare IPv6 literal; the colons are part of the address.
        raw
    } else {
        raw.split(':').next().unwrap_or(raw).trim()
    };

    if host.is_empty() {
        return false;
    }
    trusted
        .iter()
        .any(|allowed| strip_brackets(allowed.trim()).eq_ignore_ascii_case(host))
}

fn strip_brackets(value: &str) -> &str {
    value
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(value)
}
