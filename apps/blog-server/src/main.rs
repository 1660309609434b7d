//! # Blogify Server
//!
//! The main entry point for the Actix-web HTTP server: auth and posts API,
//! the live feed stream and the page view models.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

mod config;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;
mod views;

use config::AppConfig;
use observability::RequestIdMiddleware;
use state::AppState;
use telemetry::{TelemetryConfig, init_telemetry};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_telemetry(&TelemetryConfig::from_env());

    // Load configuration
    let config = AppConfig::from_env();
    let (host, port) = (config.host.clone(), config.port);

    tracing::info!("Starting Blogify server on {}:{}", host, port);

    // Build application state
    let state = AppState::in_memory(config);

    // Start HTTP server
    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(RequestIdMiddleware)
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(|cfg| handlers::configure_routes(cfg, &state))
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
