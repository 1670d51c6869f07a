use serde::{Deserialize, Serialize};

/// Request body for signup. Fields are optional so missing ones can be
/// reported with the contract's message instead of a deserialization error;
/// an empty or `{}` body likewise lands on the missing-fields reply.
#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request body for login.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Response for CSRF token issuance.
#[derive(Debug, Serialize)]
pub struct CsrfResponse {
    pub csrf_token: String,
}

/// Response returned after signup or login. Never carries the password.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: &'static str,
}
