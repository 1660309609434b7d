//! Session extractors.
//!
//! Every request gets its own [`SessionStore`], initialized from the
//! `Authorization: Bearer <token>` header. A missing or unusable header is a
//! signed-out session, not an error.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};

use blogify_core::SessionStore;
use blogify_core::domain::Identity;

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Bearer token carried by the request, if any.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// The resolved session of the calling client.
pub struct CurrentSession(pub Arc<SessionStore>);

impl CurrentSession {
    pub fn identity(&self) -> Option<Identity> {
        self.0.current_identity()
    }
}

impl FromRequest for CurrentSession {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = bearer_token(req).map(str::to_string);

        Box::pin(async move {
            let state = state.ok_or_else(|| {
                tracing::error!("AppState not found in app data");
                AppError::Internal("Server configuration error".to_string())
            })?;

            let session = SessionStore::new(Arc::clone(&state.auth));
            session.initialize(token.as_deref()).await;
            Ok(CurrentSession(Arc::new(session)))
        })
    }
}

/// A session that must be signed in; rejects the request with 401 otherwise.
///
/// ```ignore
/// async fn protected_route(auth: Authenticated) -> impl Responder {
///     format!("Hello, {}!", auth.identity.label())
/// }
/// ```
pub struct Authenticated {
    pub identity: Identity,
}

impl FromRequest for Authenticated {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let session = CurrentSession::from_request(req, payload);

        Box::pin(async move {
            let CurrentSession(session) = session.await?;
            match session.current_identity() {
                Some(identity) => Ok(Authenticated { identity }),
                None => Err(AppError::Unauthorized(
                    "Please provide a valid Bearer token in the Authorization header.".to_string(),
                )),
            }
        })
    }
}
