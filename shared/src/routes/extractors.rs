// ============================================================================
// Axum Extractors Module
// ============================================================================
//
// Custom extractors for protected routes:
// - CurrentUser: resolves a bearer access token to an active user row
//
// ============================================================================

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::auth::TokenKind;
use crate::context::AppContext;
use crate::db::{self, User};
use notehub_error::AppError;

/// The request's acting identity.
///
/// Every protected handler takes this extractor. All resource queries
/// filter by the resolved user's id, so another user's rows look like
/// missing rows rather than forbidden ones.
///
/// Usage:
/// ```ignore
/// async fn handler(CurrentUser(user): CurrentUser, ...) -> AppResult<...> {
///     // user.id scopes every query
/// }
/// ```
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppContext>> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppContext>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).map_err(|e| e.into_response())?;

        // Refresh tokens must not open the gate, only access tokens
        let claims = state
            .auth_manager
            .verify_token_of_kind(token, TokenKind::Access)
            .map_err(|e| {
                tracing::debug!(error = %e, "Access token rejected");
                AppError::auth("Could not validate credentials").into_response()
            })?;

        let user = db::get_user_by_username(&state.db_pool, &claims.sub)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to load user for access token");
                AppError::Unknown(e).into_response()
            })?
            .ok_or_else(|| {
                tracing::warn!("Access token subject no longer exists");
                AppError::auth("Could not validate credentials").into_response()
            })?;

        if !user.is_active {
            return Err(AppError::auth("Inactive user").into_response());
        }

        Ok(CurrentUser(user))
    }
}

/// Pull the token out of `Authorization: Bearer <token>`
fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::auth("Missing Authorization header"))?;

    header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::auth("Authorization header must use the Bearer scheme"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/notes");
        if let Some(v) = value {
            builder = builder.header(AUTHORIZATION, v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_extracted() {
        let parts = parts_with_auth(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&parts).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_missing_header_rejected() {
        let parts = parts_with_auth(None);
        assert!(bearer_token(&parts).is_err());
    }

    #[test]
    fn test_non_bearer_scheme_rejected() {
        let parts = parts_with_auth(Some("Basic dXNlcjpwYXNz"));
        assert!(bearer_token(&parts).is_err());
    }
}
