//! Health check endpoint.

use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use pulse_core::ports::Clock;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
    pub storage: &'static str,
    pub scheduler: SchedulerHealth,
}

#[derive(Serialize)]
pub struct SchedulerHealth {
    pub enabled: bool,
    pub interval_secs: u64,
    pub last_tick_at: Option<DateTime<Utc>>,
}

/// Health check endpoint - returns server status.
///
/// GET /api/health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let response = HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: state.clock.now(),
        storage: state.storage,
        scheduler: SchedulerHealth {
            enabled: state.scheduler_enabled,
            interval_secs: state.scheduler.settings().interval().as_secs(),
            last_tick_at: state.scheduler.last_tick_at(),
        },
    };

    HttpResponse::Ok().json(response)
}
