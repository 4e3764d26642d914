pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health::health))
        // Booking flows
        .route("/api/flows", post(handlers::flows::start_flow))
        .route(
            "/api/flows/:id",
            get(handlers::flows::get_flow).delete(handlers::flows::abandon_flow),
        )
        .route("/api/flows/:id/month", post(handlers::flows::navigate_month))
        .route("/api/flows/:id/date", post(handlers::flows::select_date))
        .route("/api/flows/:id/time", post(handlers::flows::select_time))
        .route(
            "/api/flows/:id/continue",
            post(handlers::flows::continue_to_contact),
        )
        .route("/api/flows/:id/contact", post(handlers::flows::submit_contact))
        .route("/api/flows/:id/back", post(handlers::flows::go_back))
        .route("/api/flows/:id/submit", post(handlers::flows::submit_booking))
        // Profile dashboard
        .route("/api/profile/tabs", get(handlers::profile::get_tabs))
        .route("/api/profile/views/:view", get(handlers::profile::get_view))
        // Sidebar actions
        .route("/api/actions", post(handlers::actions::publish_action))
        .route("/api/actions/events", get(handlers::actions::action_events))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
