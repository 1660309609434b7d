//! Application configuration loaded from environment variables.

use std::env;

/// Identifiers of the hosted backend project, shown on the landing page.
#[derive(Debug, Clone)]
pub struct BackendInfo {
    pub project_id: String,
    pub auth_domain: String,
}

impl Default for BackendInfo {
    fn default() -> Self {
        Self {
            project_id: "blogify-local".to_string(),
            auth_domain: "localhost".to_string(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub backend: BackendInfo,
    /// Default page size of `GET /api/posts`; all posts when unset.
    pub recent_posts_limit: Option<usize>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            backend: BackendInfo::default(),
            recent_posts_limit: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            backend: BackendInfo {
                project_id: env::var("BLOGIFY_PROJECT_ID").unwrap_or(defaults.backend.project_id),
                auth_domain: env::var("BLOGIFY_AUTH_DOMAIN")
                    .unwrap_or(defaults.backend.auth_domain),
            },
            recent_posts_limit: env::var("RECENT_POSTS_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|limit| *limit > 0),
        }
    }
}
