// ============================================================================
// Authentication Routes
// ============================================================================
//
// Endpoints:
// - POST /auth/register - Create a new account
// - POST /auth/login    - Exchange credentials for an access/refresh pair
// - POST /auth/refresh  - Exchange a refresh token for a new pair
// - GET  /auth/me       - Current user's profile
// - PUT  /auth/me       - Partial profile update
//
// Token issuance lives here and only here; the notes and folders
// services verify tokens but never mint them.
//
// ============================================================================

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::TokenKind;
use crate::context::AppContext;
use crate::db::{self, User};
use crate::routes::extractors::CurrentUser;
use crate::utils::{
    log_safe_id, validate_email, validate_password_strength, validate_username, SecureString,
};
use notehub_error::AppError;
use notehub_metrics::USERS_REGISTERED_TOTAL;

/// Request body for POST /auth/register
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: SecureString,
    pub full_name: Option<String>,
}

/// Request body for POST /auth/login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: SecureString,
}

/// Request body for POST /auth/refresh
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token (JWT)
    pub refresh_token: String,
}

/// Request body for PUT /auth/me. Absent fields keep their value.
#[derive(Debug, Deserialize)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub is_active: Option<bool>,
}

/// Access/refresh pair returned by login and refresh
#[derive(Debug, Serialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

impl Token {
    fn new(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// Public view of a user row. The password hash never leaves the backend.
#[derive(Debug, Serialize)]
pub struct UserRead {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserRead {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

/// POST /auth/register
///
/// Register a new account.
///
/// Security:
/// - Username, email and password policy enforced before any write
/// - Duplicate username or email rejected with 409
/// - Password stored as a bcrypt hash only
pub async fn register(
    State(context): State<Arc<AppContext>>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let username_hash = log_safe_id(&request.username, &context.config.logging.hash_salt);

    // Validate username
    if let Err(error_msg) = validate_username(&request.username) {
        tracing::warn!(
            username_hash = %username_hash,
            "Registration rejected: invalid username format"
        );
        return Err(AppError::Validation(error_msg));
    }

    // Validate email
    if let Err(error_msg) = validate_email(&request.email) {
        tracing::warn!(
            username_hash = %username_hash,
            "Registration rejected: invalid email format"
        );
        return Err(AppError::Validation(error_msg));
    }

    // Validate password strength
    if let Err(error_msg) = validate_password_strength(request.password.as_str()) {
        tracing::warn!(
            username_hash = %username_hash,
            "Registration rejected: weak password"
        );
        return Err(AppError::Validation(error_msg));
    }

    // Duplicate checks before the write
    if db::get_user_by_username(&context.db_pool, &request.username)
        .await?
        .is_some()
    {
        tracing::warn!(
            username_hash = %username_hash,
            "Registration rejected: username already taken"
        );
        return Err(AppError::conflict("Username already registered"));
    }

    if db::get_user_by_email(&context.db_pool, &request.email)
        .await?
        .is_some()
    {
        tracing::warn!(
            username_hash = %username_hash,
            "Registration rejected: email already taken"
        );
        return Err(AppError::conflict("Email already registered"));
    }

    // Create user
    let user = match db::create_user(
        &context.db_pool,
        &request.username,
        &request.email,
        request.password.as_str(),
        request.full_name.as_deref(),
    )
    .await
    {
        Ok(user) => user,
        Err(e) => {
            // Two concurrent registrations can both pass the pre-check;
            // the unique constraint catches the loser
            let error_msg = e.to_string();
            if error_msg.contains("duplicate") || error_msg.contains("unique") {
                tracing::warn!(
                    username_hash = %username_hash,
                    "Registration rejected: duplicate caught by constraint"
                );
                return Err(AppError::conflict("Username or email already registered"));
            }

            tracing::error!(
                error = %e,
                username_hash = %username_hash,
                "Registration failed"
            );
            return Err(AppError::Unknown(e));
        }
    };

    USERS_REGISTERED_TOTAL.inc();

    tracing::info!(
        user_hash = %username_hash,
        "User registered successfully"
    );

    Ok((StatusCode::CREATED, Json(UserRead::from(user))))
}

/// POST /auth/login
///
/// Exchange username + password for an access/refresh token pair.
///
/// Security:
/// - Unknown user and wrong password return the same message
/// - Successful login records last_login (best effort)
pub async fn login(
    State(context): State<Arc<AppContext>>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let username_hash = log_safe_id(&request.username, &context.config.logging.hash_salt);

    // Get user by username
    let user = match db::get_user_by_username(&context.db_pool, &request.username).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!(
                username_hash = %username_hash,
                "Login failed: user not found"
            );
            return Err(AppError::auth("Invalid username or password"));
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to get user by username");
            return Err(AppError::Unknown(e));
        }
    };

    // Verify password
    match db::verify_password(request.password.as_str(), &user.hashed_password) {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!(
                username_hash = %username_hash,
                "Login failed: invalid password"
            );
            return Err(AppError::auth("Invalid username or password"));
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to verify password");
            return Err(AppError::internal("Password verification failed"));
        }
    }

    // Best effort: a missed timestamp must not block the login
    if let Err(e) = db::touch_last_login(&context.db_pool, user.id).await {
        tracing::warn!(error = %e, "Failed to record last_login");
    }

    let (access_token, refresh_token) =
        context.auth_manager.issue_pair(&user.username).map_err(|e| {
            tracing::error!(error = %e, "Failed to issue token pair");
            AppError::Unknown(e)
        })?;

    tracing::info!(
        user_hash = %username_hash,
        "User logged in successfully"
    );

    Ok(Json(Token::new(access_token, refresh_token)))
}

/// POST /auth/refresh
///
/// Exchange a valid refresh token for a new access/refresh pair.
///
/// Security:
/// - The token's kind claim must be `refresh`; access tokens are rejected
/// - The subject must still exist
/// - The old refresh token stays valid until it expires (no rotation)
pub async fn refresh(
    State(context): State<Arc<AppContext>>,
    Json(request): Json<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    // 1. Verify signature, expiry and kind
    let claims = context
        .auth_manager
        .verify_token_of_kind(&request.refresh_token, TokenKind::Refresh)
        .map_err(|e| {
            tracing::warn!(error = %e, "Invalid refresh token");
            AppError::auth("Invalid or expired refresh token")
        })?;

    // 2. The subject must still exist
    let user = match db::get_user_by_username(&context.db_pool, &claims.sub).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!(
                user_hash = %log_safe_id(&claims.sub, &context.config.logging.hash_salt),
                "Refresh rejected: subject no longer exists"
            );
            return Err(AppError::auth("Invalid or expired refresh token"));
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load user for refresh");
            return Err(AppError::Unknown(e));
        }
    };

    // 3. Issue a fresh pair
    let (access_token, refresh_token) =
        context.auth_manager.issue_pair(&user.username).map_err(|e| {
            tracing::error!(error = %e, "Failed to issue token pair");
            AppError::Unknown(e)
        })?;

    tracing::info!(
        user_hash = %log_safe_id(&user.username, &context.config.logging.hash_salt),
        "Token refreshed successfully"
    );

    Ok(Json(Token::new(access_token, refresh_token)))
}

/// GET /auth/me
///
/// Current user's profile.
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<UserRead> {
    Json(UserRead::from(user))
}

/// PUT /auth/me
///
/// Partial profile update for the current user.
pub async fn update_me(
    State(context): State<Arc<AppContext>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<UserUpdate>,
) -> Result<Json<UserRead>, AppError> {
    if let Some(email) = &request.email {
        if let Err(error_msg) = validate_email(email) {
            return Err(AppError::Validation(error_msg));
        }

        // Another account may already own the requested address
        if let Some(existing) = db::get_user_by_email(&context.db_pool, email).await? {
            if existing.id != user.id {
                return Err(AppError::conflict("Email already registered"));
            }
        }
    }

    let updated = db::update_user_profile(
        &context.db_pool,
        user.id,
        request.email.as_deref(),
        request.full_name.as_deref(),
        request.is_active,
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to update profile");
        AppError::Unknown(e)
    })?;

    tracing::info!(
        user_hash = %log_safe_id(&updated.username, &context.config.logging.hash_salt),
        "Profile updated"
    );

    Ok(Json(UserRead::from(updated)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_reports_bearer_type() {
        let token = Token::new("aaa".to_string(), "bbb".to_string());
        let value = serde_json::to_value(&token).unwrap();
        assert_eq!(value["token_type"], "bearer");
        assert_eq!(value["access_token"], "aaa");
        assert_eq!(value["refresh_token"], "bbb");
    }

    #[test]
    fn test_user_read_hides_password_hash() {
        let user = User {
            id: 7,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            hashed_password: "$2b$12$secret".to_string(),
            full_name: None,
            is_active: true,
            created_at: Utc::now(),
            last_login: None,
        };

        let value = serde_json::to_value(UserRead::from(user)).unwrap();
        assert!(value.get("hashed_password").is_none());
        assert!(value.get("password").is_none());
        assert_eq!(value["username"], "alice");
        assert_eq!(value["is_active"], true);
    }
}
