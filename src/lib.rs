//! Fleet Reports Server Library
//!
//! Reporting backend of the fleet compliance application. The main
//! server binary is in main.rs.
//!
//! # Modules
//!
//! - `export`: Bulk inspection PDF export (selection, rendering, merging, packaging, progress)
//! - `db`: SQLite access to inspections and profiles, plus demo seeding
//! - `auth`: Bearer-token caller resolution and roles
//! - `routes`: HTTP endpoints

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/health", routes::health::router())
        .nest("/api/reports", routes::reports::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
