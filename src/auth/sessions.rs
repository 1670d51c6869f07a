use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use axum_extra::extract::CookieJar;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use tracing::warn;
use uuid::Uuid;

use crate::auth::repo::User;
use crate::error::ApiError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "sessionid";
pub const CSRF_COOKIE: &str = "csrftoken";

/// Mint an opaque token suitable for a cookie. Only its SHA-256 hash is
/// stored server-side.
pub fn generate_token() -> String {
    let mut buf = [0u8; 32];
    OsRng.fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Create a session row for the user and return the raw cookie token.
pub async fn create_session(
    db: &PgPool,
    user_id: Uuid,
    ttl_minutes: i64,
) -> anyhow::Result<String> {
    // Expired rows are invisible to resolve_session but would otherwise
    // accumulate forever; login is a natural point to sweep them out.
    sqlx::query(r#"DELETE FROM sessions WHERE expires_at <= now()"#)
        .execute(db)
        .await?;

    let token = generate_token();
    let expires_at = OffsetDateTime::now_utc() + Duration::minutes(ttl_minutes);
    sqlx::query(
        r#"
        INSERT INTO sessions (user_id, token_hash, expires_at)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(user_id)
    .bind(hash_token(&token))
    .bind(expires_at)
    .execute(db)
    .await?;
    Ok(token)
}

/// Resolve a cookie token to its user, ignoring expired sessions.
pub async fn resolve_session(db: &PgPool, token: &str) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.username, u.email, u.password_hash, u.created_at
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token_hash = $1 AND s.expires_at > now()
        "#,
    )
    .bind(hash_token(token))
    .fetch_optional(db)
    .await?;
    Ok(user)
}

/// Delete the session for a cookie token. A no-op when none exists, so
/// logout stays idempotent.
pub async fn delete_session(db: &PgPool, token: &str) -> anyhow::Result<()> {
    sqlx::query(r#"DELETE FROM sessions WHERE token_hash = $1"#)
        .bind(hash_token(token))
        .execute(db)
        .await?;
    Ok(())
}

/// Extracts the authenticated user from the session cookie. Write handlers
/// take this as an argument; read handlers simply omit it.
pub struct SessionUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or(ApiError::Unauthorized)?;

        match resolve_session(&state.db, &token).await {
            Ok(Some(user)) => Ok(SessionUser(user)),
            Ok(None) => {
                warn!("session cookie did not match an active session");
                Err(ApiError::Unauthorized)
            }
            Err(e) => Err(ApiError::server("Server error", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique_and_url_safe() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        // 32 bytes, base64url without padding
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn token_hash_is_stable_sha256_hex() {
        let h1 = hash_token("some-token");
        let h2 = hash_token("some-token");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(hash_token("other-token"), h1);
    }
}
