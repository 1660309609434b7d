//! Authentication handlers.
//!
//! Each call runs its own [`SessionStore`]; the token it ends up holding is
//! handed back to the client, which sends it as a Bearer token afterwards.

use actix_web::{HttpResponse, web};
use std::sync::Arc;

use blogify_core::SessionStore;
use blogify_core::domain::Identity;
use blogify_shared::dto::{
    AuthResponse, IdentityResponse, LoginRequest, MessageResponse, RegisterRequest,
    ResetPasswordRequest,
};

use crate::middleware::auth::{Authenticated, CurrentSession};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;
use crate::views::auth_forms::{
    RESET_SENT, login_error_message, reset_error_message, signup_error_message,
    validate_login, validate_reset, validate_signup,
};

pub(crate) fn identity_response(identity: Identity) -> IdentityResponse {
    IdentityResponse {
        id: identity.id,
        email: identity.email,
        display_name: identity.display_name,
        email_verified: identity.email_verified,
        created_at: identity.created_at,
        last_sign_in_at: identity.last_sign_in_at,
    }
}

fn auth_response(
    state: &AppState,
    session: &SessionStore,
    identity: Identity,
) -> AppResult<AuthResponse> {
    let access_token = session
        .token()
        .ok_or_else(|| AppError::Internal("Signed in without a session token".to_string()))?;

    Ok(AuthResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.token_ttl_secs,
        identity: identity_response(identity),
    })
}

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    validate_signup(&req).map_err(|msg| AppError::BadRequest(msg.to_string()))?;

    let session = SessionStore::new(Arc::clone(&state.auth));
    let identity = session
        .register(req.email.trim(), &req.password, req.display_name.as_deref())
        .await
        .map_err(|e| AppError::auth(&e, signup_error_message(&e)))?;

    Ok(HttpResponse::Created().json(auth_response(&state, &session, identity)?))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    validate_login(&req).map_err(|msg| AppError::BadRequest(msg.to_string()))?;

    let session = SessionStore::new(Arc::clone(&state.auth));
    let identity = session
        .login(req.email.trim(), &req.password)
        .await
        .map_err(|e| AppError::auth(&e, login_error_message(&e)))?;

    Ok(HttpResponse::Ok().json(auth_response(&state, &session, identity)?))
}

/// POST /api/auth/logout - ends the Bearer session; a no-op when signed out.
pub async fn logout(CurrentSession(session): CurrentSession) -> AppResult<HttpResponse> {
    session
        .logout()
        .await
        .map_err(|e| AppError::auth(&e, e.to_string()))?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Logged out")))
}

/// POST /api/auth/reset-password
pub async fn reset_password(
    state: web::Data<AppState>,
    body: web::Json<ResetPasswordRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    validate_reset(&req).map_err(|msg| AppError::BadRequest(msg.to_string()))?;

    SessionStore::new(Arc::clone(&state.auth))
        .request_password_reset(req.email.trim())
        .await
        .map_err(|e| AppError::auth(&e, reset_error_message(&e)))?;

    Ok(HttpResponse::Ok().json(MessageResponse::new(RESET_SENT)))
}

/// GET /api/auth/me - Protected route
pub async fn me(auth: Authenticated) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(identity_response(auth.identity)))
}
