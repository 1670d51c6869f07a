use axum::http::{header, HeaderMap};

/// Request-scoped pieces needed to build absolute media URLs. Passed into the
/// serializer explicitly rather than read from ambient state.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub scheme: String,
    pub host: String,
}

impl RequestContext {
    /// None when the request carries no Host header, in which case the
    /// serializer falls back to rooted relative paths.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let host = headers.get(header::HOST)?.to_str().ok()?.to_string();
        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("http")
            .to_string();
        Some(Self { scheme, host })
    }
}

/// Resolve a stored-file reference (e.g. `course_images/intro.jpg`) to the
/// URL a client can fetch. Empty references resolve to None so the JSON
/// representation carries null.
pub fn media_url(
    media_prefix: &str,
    stored: Option<&str>,
    ctx: Option<&RequestContext>,
) -> Option<String> {
    let stored = stored?.trim();
    if stored.is_empty() {
        return None;
    }
    let path = format!("{}{}", media_prefix, stored.trim_start_matches('/'));
    match ctx {
        Some(c) => Some(format!("{}://{}{}", c.scheme, c.host, path)),
        None => Some(path),
    }
}
