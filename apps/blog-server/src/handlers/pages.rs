//! Page handlers - answer with the page's view model as JSON.
//!
//! Protected pages go through the route guard: a signed-out request is
//! redirected to `/login` with `303 See Other`.

use actix_web::{HttpResponse, http::header, web};

use blogify_core::domain::Identity;
use blogify_core::routing::{GuardState, Route, RouteGuard};
use blogify_shared::{ApiResponse, ErrorResponse};
use serde::Serialize;

use crate::middleware::auth::CurrentSession;
use crate::state::AppState;
use crate::views::{AboutPage, AuthFormPage, DashboardPage, FeedPage, FeedQuery, LandingPage};

/// Run the guard for `route`; `Err` carries the response to send instead.
fn guard(route: Route, session: &CurrentSession) -> Result<Identity, HttpResponse> {
    let mut guard = RouteGuard::new();
    match guard.enter(route, &session.0.state()) {
        GuardState::Allowed => session.identity().ok_or_else(|| redirect(Route::Login)),
        GuardState::Redirecting { to } => {
            tracing::debug!(from = route.path(), to = to.path(), "Redirecting signed-out request");
            Err(redirect(to))
        }
        GuardState::Pending => Err(HttpResponse::ServiceUnavailable().json(
            ErrorResponse::service_unavailable("Session is still being resolved")
                .with_instance(route.path()),
        )),
    }
}

fn redirect(to: Route) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, to.path()))
        .finish()
}

fn page<T: Serialize>(view: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(view))
}

/// GET /
pub async fn landing(state: web::Data<AppState>, session: CurrentSession) -> HttpResponse {
    match guard(Route::Home, &session) {
        Ok(identity) => page(LandingPage::new(Some(&identity), &state.config.backend)),
        Err(response) => response,
    }
}

/// GET /about
pub async fn about(session: CurrentSession) -> HttpResponse {
    match guard(Route::About, &session) {
        Ok(identity) => page(AboutPage::new(Some(&identity))),
        Err(response) => response,
    }
}

/// GET /blog-feed
pub async fn blog_feed(
    state: web::Data<AppState>,
    session: CurrentSession,
    query: web::Query<FeedQuery>,
) -> HttpResponse {
    let identity = match guard(Route::BlogFeed, &session) {
        Ok(identity) => identity,
        Err(response) => return response,
    };
    let posts = state.posts.snapshot_all().await;
    page(FeedPage::new(Some(&identity), &posts, &query))
}

/// GET /dashboard
pub async fn dashboard(state: web::Data<AppState>, session: CurrentSession) -> HttpResponse {
    let identity = match guard(Route::Dashboard, &session) {
        Ok(identity) => identity,
        Err(response) => return response,
    };
    let posts = state.posts.snapshot_all().await;
    page(DashboardPage::new(&identity, &posts))
}

/// GET /login
pub async fn login() -> HttpResponse {
    page(AuthFormPage::login())
}

/// GET /signup
pub async fn signup() -> HttpResponse {
    page(AuthFormPage::signup())
}

/// GET /forgot-password
pub async fn forgot_password() -> HttpResponse {
    page(AuthFormPage::forgot_password())
}
