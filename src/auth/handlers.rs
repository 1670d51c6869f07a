use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, CsrfResponse, LoginRequest, LogoutResponse, SignupRequest},
        password::{hash_password, verify_password},
        repo::User,
        services::{is_valid_email, validate_password, validate_username},
        sessions::{self, CSRF_COOKIE, SESSION_COOKIE},
    },
    error::{parse_json_body_or_default, ApiError},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/csrf-token/", get(csrf_token))
        .route("/signup/", post(signup))
        .route("/login/", post(login))
        .route("/logout/", post(logout))
}

/// GET /csrf-token/ — mint a fresh anti-forgery token and mirror it into a
/// cookie for the double-submit pattern.
#[instrument(skip(jar))]
pub async fn csrf_token(jar: CookieJar) -> (CookieJar, Json<CsrfResponse>) {
    let token = sessions::generate_token();
    let cookie = Cookie::build((CSRF_COOKIE, token.clone()))
        .path("/")
        .same_site(SameSite::Lax)
        .build();
    (jar.add(cookie), Json(CsrfResponse { csrf_token: token }))
}

/// POST /signup/
#[instrument(skip(state, body))]
pub async fn signup(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    // An empty or `{}` body is just a payload with every field missing; the
    // required-fields check below owns that reply.
    let payload: SignupRequest = parse_json_body_or_default(&body)?;

    // Empty strings count as missing, same as absent keys.
    let (username, email, password) = match (
        payload.username.filter(|v| !v.is_empty()),
        payload.email.filter(|v| !v.is_empty()),
        payload.password.filter(|v| !v.is_empty()),
    ) {
        (Some(u), Some(e), Some(p)) => (u, e, p),
        _ => {
            return Err(ApiError::auth_rule(
                "Please provide all required fields: username, email, and password",
            ))
        }
    };

    if let Err(reason) = validate_username(&username) {
        warn!(%username, "signup rejected: {reason}");
        return Err(ApiError::AuthRule(reason));
    }
    if !is_valid_email(&email) {
        warn!(%email, "signup rejected: invalid email");
        return Err(ApiError::auth_rule("Please enter a valid email address"));
    }
    if let Err(violations) = validate_password(
        &password,
        &username,
        &email,
        state.config.security.password_min_length,
    ) {
        warn!(%username, "signup rejected: weak password");
        return Err(ApiError::PasswordPolicy(violations));
    }

    let hash = hash_password(&password)?;

    // No existence pre-check; the unique constraints decide, which closes
    // the duplicate race window under concurrent signups.
    let user = User::create(&state.db, &username, &email, &hash)
        .await
        .map_err(classify_signup_error)?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully",
            username: user.username,
            email: user.email,
        }),
    ))
}

fn classify_signup_error(err: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(db) = &err {
        if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) {
            return match db.constraint() {
                Some(c) if c.contains("username") => ApiError::auth_rule("Username already exists"),
                Some(c) if c.contains("email") => ApiError::auth_rule("Email already exists"),
                _ => ApiError::Database(db.to_string()),
            };
        }
    }
    error!(error = %err, "create user failed");
    ApiError::server("Server error", err)
}

/// POST /login/
#[instrument(skip(state, jar, body))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    let payload: LoginRequest = parse_json_body_or_default(&body)?;

    let (username, password) = match (
        payload.username.filter(|v| !v.is_empty()),
        payload.password.filter(|v| !v.is_empty()),
    ) {
        (Some(u), Some(p)) => (u, p),
        _ => {
            return Err(ApiError::auth_rule(
                "Please provide both username and password",
            ))
        }
    };

    // Username format is checked again on login, matching signup.
    if let Err(reason) = validate_username(&username) {
        return Err(ApiError::AuthRule(reason));
    }

    // A single failure path for unknown user and wrong password, so callers
    // cannot enumerate accounts.
    let user = match User::find_by_username(&state.db, &username).await? {
        Some(u) => u,
        None => {
            warn!(%username, "login unknown username");
            return Err(ApiError::InvalidCredentials);
        }
    };
    if !verify_password(&password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let ttl = state.config.security.session_ttl_minutes;
    let token = sessions::create_session(&state.db, user.id, ttl).await?;
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(ttl))
        .build();

    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok((
        jar.add(cookie),
        Json(AuthResponse {
            message: "Login successful",
            username: user.username,
            email: user.email,
        }),
    ))
}

/// POST /logout/ — idempotent; succeeds whether or not a session exists.
#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<LogoutResponse>), ApiError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        sessions::delete_session(&state.db, cookie.value()).await?;
    }
    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    Ok((
        jar,
        Json(LogoutResponse {
            message: "Logged out successfully",
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_object_signup_reports_missing_fields() {
        let state = AppState::fake();
        for body in [Bytes::from_static(b"{}"), Bytes::new()] {
            let err = signup(State(state.clone()), body).await.unwrap_err();
            match err {
                ApiError::AuthRule(reason) => assert_eq!(
                    reason,
                    "Please provide all required fields: username, email, and password"
                ),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn empty_object_login_reports_missing_fields() {
        let state = AppState::fake();
        let jar = CookieJar::from_headers(&axum::http::HeaderMap::new());
        let err = login(State(state), jar, Bytes::from_static(b"{}"))
            .await
            .unwrap_err();
        match err {
            ApiError::AuthRule(reason) => {
                assert_eq!(reason, "Please provide both username and password")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn csrf_token_sets_matching_cookie() {
        let empty = CookieJar::from_headers(&axum::http::HeaderMap::new());
        let (jar, Json(body)) = csrf_token(empty).await;
        let cookie = jar.get(CSRF_COOKIE).expect("csrf cookie set");
        assert_eq!(cookie.value(), body.csrf_token);
        assert!(!body.csrf_token.is_empty());
    }

    #[test]
    fn auth_response_never_serializes_password() {
        let json = serde_json::to_string(&AuthResponse {
            message: "User created successfully",
            username: "valid_123".into(),
            email: "student@example.com".into(),
        })
        .unwrap();
        assert!(json.contains("valid_123"));
        assert!(!json.contains("password"));
    }
}
