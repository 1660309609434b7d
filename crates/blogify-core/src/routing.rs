//! Routes and the guard that keeps signed-out visitors off protected views.

use serde::Serialize;

use crate::services::SessionState;

/// A routed view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Route {
    Login,
    Signup,
    ForgotPassword,
    Home,
    About,
    BlogFeed,
    Dashboard,
}

impl Route {
    pub const ALL: [Route; 7] = [
        Route::Login,
        Route::Signup,
        Route::ForgotPassword,
        Route::Home,
        Route::About,
        Route::BlogFeed,
        Route::Dashboard,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Signup => "/signup",
            Route::ForgotPassword => "/forgot-password",
            Route::Home => "/",
            Route::About => "/about",
            Route::BlogFeed => "/blog-feed",
            Route::Dashboard => "/dashboard",
        }
    }

    /// Route for a request path; a trailing slash is ignored.
    pub fn from_path(path: &str) -> Option<Self> {
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        Self::ALL.into_iter().find(|route| route.path() == path)
    }

    /// Whether the view requires a signed-in identity.
    pub fn is_protected(self) -> bool {
        !matches!(self, Route::Login | Route::Signup | Route::ForgotPassword)
    }
}

/// Outcome of guarding a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// The session has not resolved yet; render nothing.
    Pending,
    Allowed,
    Redirecting { to: Route },
}

/// Guard decision for entering `route` in the given session state.
pub fn evaluate(route: Route, session: &SessionState) -> GuardState {
    if !route.is_protected() {
        return GuardState::Allowed;
    }
    match session {
        SessionState::Resolved(Some(_)) => GuardState::Allowed,
        SessionState::Resolved(None) => GuardState::Redirecting { to: Route::Login },
        SessionState::Uninitialized | SessionState::Resolving => GuardState::Pending,
    }
}

/// Tracks the active view and re-evaluates it on every session change.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    active: Option<Route>,
    state: GuardState,
}

impl RouteGuard {
    pub fn new() -> Self {
        Self {
            active: None,
            state: GuardState::Pending,
        }
    }

    /// Navigate to `route`.
    pub fn enter(&mut self, route: Route, session: &SessionState) -> GuardState {
        self.active = Some(route);
        self.state = evaluate(route, session);
        self.state
    }

    /// React to a session change while the active view is displayed.
    pub fn on_session_change(&mut self, session: &SessionState) -> GuardState {
        if let Some(route) = self.active {
            self.state = evaluate(route, session);
        }
        self.state
    }

    pub fn active(&self) -> Option<Route> {
        self.active
    }

    pub fn state(&self) -> GuardState {
        self.state
    }
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new()
    }
}
