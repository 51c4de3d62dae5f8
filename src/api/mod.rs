use crate::queue::QueueController;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;

pub mod handlers;
pub mod responses;

pub fn router(controller: Arc<QueueController>) -> Router {
    Router::new()
        .route("/api/queue", get(handlers::get_queue))
        .route("/api/queue/join", post(handlers::post_join))
        .route("/api/queue/leave", post(handlers::post_leave))
        .route("/api/simulate/spike", post(handlers::post_spike))
        .route("/api/simulate/drop", post(handlers::post_drop))
        .route("/api/simulate/ramp", post(handlers::post_ramp))
        .route("/api/health", get(handlers::get_health))
        .with_state(controller)
}
