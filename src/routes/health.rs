//! Health Check Endpoint
//!
//! 프로세스, 저장소 연결, 컨트랙트 바인딩 상태를 함께 보고한다.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{services::GatewayStatus, AppState};

/// Health check 응답
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: DatabaseStatus,
    pub chain: GatewayStatus,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct DatabaseStatus {
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_start = std::time::Instant::now();
    let db_status = match state.db.health_check().await {
        Ok(_) => DatabaseStatus {
            connected: true,
            latency_ms: Some(db_start.elapsed().as_millis() as u64),
        },
        Err(e) => {
            tracing::warn!(error = %e, "database health check failed");
            DatabaseStatus {
                connected: false,
                latency_ms: None,
            }
        }
    };

    let chain = state.chain.status();

    // 컨트랙트가 없어도 조회 API는 동작하므로 degraded로 본다
    let healthy = db_status.connected && chain.subscription_contract;

    Json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
        chain,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
