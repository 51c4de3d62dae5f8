use crate::traffic::TrafficStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct QueueSuccessResponse {
    pub user_count: u32,
    pub traffic_status: TrafficStatus,
    pub in_queue: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    pub wait_time_seconds: u64,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct QueueErrorResponse {
    pub error_code: QueueErrorCode,
    pub error_message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueErrorCode {
    InternalError,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SimulateSuccessResponse {
    pub user_count: u32,
    pub traffic_status: TrafficStatus,
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
pub struct RampRequest {
    pub target: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RampAcceptedResponse {
    pub target: u32,
    pub step: u32,
    pub user_count: u32,
    pub traffic_status: TrafficStatus,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Ko,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: String,
}
