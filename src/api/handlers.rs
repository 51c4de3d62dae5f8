use crate::api::responses::{
    HealthResponse, HealthStatus, QueueErrorCode, QueueErrorResponse, QueueSuccessResponse,
    RampAcceptedResponse, RampRequest, SimulateSuccessResponse,
};
use crate::error::AppError;
use crate::queue::{QueueController, QueueSnapshot};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use std::time::SystemTime;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::error;

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

pub enum QueueResponse {
    Success(QueueSuccessResponse),
    Error {
        status: StatusCode,
        body: QueueErrorResponse,
    },
}

impl IntoResponse for QueueResponse {
    fn into_response(self) -> Response {
        match self {
            QueueResponse::Success(body) => (StatusCode::OK, Json(body)).into_response(),
            QueueResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub enum SimulateResponse {
    Success(SimulateSuccessResponse),
    Ramp(RampAcceptedResponse),
    Error {
        status: StatusCode,
        body: QueueErrorResponse,
    },
}

impl IntoResponse for SimulateResponse {
    fn into_response(self) -> Response {
        match self {
            SimulateResponse::Success(body) => (StatusCode::OK, Json(body)).into_response(),
            SimulateResponse::Ramp(body) => (StatusCode::ACCEPTED, Json(body)).into_response(),
            SimulateResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn get_queue(State(controller): State<Arc<QueueController>>) -> impl IntoResponse {
    build_queue_response(&controller)
}

pub async fn post_join(State(controller): State<Arc<QueueController>>) -> impl IntoResponse {
    match controller.join() {
        Ok(_) => build_queue_response(&controller),
        Err(err) => internal_error(&format!("join failed: {err}")),
    }
}

pub async fn post_leave(State(controller): State<Arc<QueueController>>) -> impl IntoResponse {
    match controller.leave() {
        Ok(()) => build_queue_response(&controller),
        Err(err) => internal_error(&format!("leave failed: {err}")),
    }
}

pub async fn post_spike(State(controller): State<Arc<QueueController>>) -> impl IntoResponse {
    build_load_response(&controller, controller.spike())
}

pub async fn post_drop(State(controller): State<Arc<QueueController>>) -> impl IntoResponse {
    build_load_response(&controller, controller.drop_load())
}

pub async fn post_ramp(
    State(controller): State<Arc<QueueController>>,
    Json(request): Json<RampRequest>,
) -> impl IntoResponse {
    build_ramp_response(&controller, request)
}

pub async fn get_health(State(controller): State<Arc<QueueController>>) -> impl IntoResponse {
    build_health_response(&controller, SystemTime::now())
}

fn build_queue_response(controller: &QueueController) -> QueueResponse {
    let snapshot = match controller.snapshot() {
        Ok(snapshot) => snapshot,
        Err(err) => {
            return internal_error(&format!("state unreadable: {err}"));
        }
    };

    match format_timestamp(SystemTime::now()) {
        Some(timestamp) => QueueResponse::Success(snapshot_body(snapshot, timestamp)),
        None => internal_error("timestamp formatting failure"),
    }
}

fn snapshot_body(snapshot: QueueSnapshot, timestamp: String) -> QueueSuccessResponse {
    let position = snapshot.membership.as_ref().map(|m| m.position);
    QueueSuccessResponse {
        user_count: snapshot.user_count,
        traffic_status: snapshot.status,
        in_queue: position.is_some(),
        position,
        wait_time_seconds: snapshot.wait_seconds,
        timestamp,
    }
}

fn build_load_response(
    controller: &QueueController,
    result: Result<u32, AppError>,
) -> SimulateResponse {
    let user_count = match result {
        Ok(user_count) => user_count,
        Err(err) => {
            return simulate_internal_error(&format!("load event failed: {err}"));
        }
    };
    let status = match controller.snapshot() {
        Ok(snapshot) => snapshot.status,
        Err(err) => {
            return simulate_internal_error(&format!("state unreadable: {err}"));
        }
    };

    match format_timestamp(SystemTime::now()) {
        Some(timestamp) => SimulateResponse::Success(SimulateSuccessResponse {
            user_count,
            traffic_status: status,
            timestamp,
        }),
        None => simulate_internal_error("timestamp formatting failure"),
    }
}

fn build_ramp_response(controller: &QueueController, request: RampRequest) -> SimulateResponse {
    let plan = match controller.ramp_to(request.target) {
        Ok(plan) => plan,
        Err(err) => {
            return simulate_internal_error(&format!("ramp failed: {err}"));
        }
    };
    let snapshot = match controller.snapshot() {
        Ok(snapshot) => snapshot,
        Err(err) => {
            return simulate_internal_error(&format!("state unreadable: {err}"));
        }
    };

    match format_timestamp(SystemTime::now()) {
        Some(timestamp) => SimulateResponse::Ramp(RampAcceptedResponse {
            target: plan.target,
            step: plan.step,
            user_count: snapshot.user_count,
            traffic_status: snapshot.status,
            timestamp,
        }),
        None => simulate_internal_error("timestamp formatting failure"),
    }
}

fn build_health_response(controller: &QueueController, now: SystemTime) -> Response {
    let status = match controller.snapshot() {
        Ok(_) => HealthStatus::Ok,
        Err(_) => HealthStatus::Ko,
    };
    let status_code = match status {
        HealthStatus::Ok => StatusCode::OK,
        HealthStatus::Ko => StatusCode::SERVICE_UNAVAILABLE,
    };
    let timestamp = format_timestamp(now).unwrap_or_else(fallback_timestamp);

    (status_code, Json(HealthResponse { status, timestamp })).into_response()
}

fn internal_error(message: &str) -> QueueResponse {
    error!(message = message, "Internal error while handling /api/queue");
    QueueResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: QueueErrorResponse {
            error_code: QueueErrorCode::InternalError,
            error_message: INTERNAL_ERROR_MESSAGE.to_string(),
            timestamp: format_timestamp(SystemTime::now()).unwrap_or_else(fallback_timestamp),
        },
    }
}

fn simulate_internal_error(message: &str) -> SimulateResponse {
    error!(
        message = message,
        "Internal error while handling /api/simulate"
    );
    SimulateResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: QueueErrorResponse {
            error_code: QueueErrorCode::InternalError,
            error_message: INTERNAL_ERROR_MESSAGE.to_string(),
            timestamp: format_timestamp(SystemTime::now()).unwrap_or_else(fallback_timestamp),
        },
    }
}

fn format_timestamp(timestamp: SystemTime) -> Option<String> {
    match OffsetDateTime::from(timestamp).format(&Rfc3339) {
        Ok(formatted) => Some(formatted),
        Err(err) => {
            error!(error = %err, "Failed to format timestamp");
            None
        }
    }
}

fn fallback_timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
