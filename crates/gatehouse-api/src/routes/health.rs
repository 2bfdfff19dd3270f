//! 헬스 체크 및 메트릭 endpoint.
//!
//! 제어 평면 라우트로 등록되어 자격증명 없이 접근할 수 있습니다.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json};
use serde::{Deserialize, Serialize};

use crate::auth::SecuredRouter;
use crate::state::AppState;

/// 헬스 체크 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" | "unhealthy"
    pub status: String,
    pub version: String,
    pub uptime_secs: i64,
    /// ISO 8601
    pub timestamp: String,
    pub components: ComponentHealth,
}

/// 개별 컴포넌트 상태.
#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub field_cipher: ComponentStatus,
    pub token_registry: ComponentStatus,
    pub metrics: ComponentStatus,
}

/// 컴포넌트 상태.
#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentStatus {
    /// "up" | "down" | "not_configured"
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentStatus {
    pub fn up() -> Self {
        Self {
            status: "up".to_string(),
            message: None,
        }
    }

    pub fn up_with_info(message: impl Into<String>) -> Self {
        Self {
            status: "up".to_string(),
            message: Some(message.into()),
        }
    }

    pub fn down(message: impl Into<String>) -> Self {
        Self {
            status: "down".to_string(),
            message: Some(message.into()),
        }
    }

    pub fn not_configured() -> Self {
        Self {
            status: "not_configured".to_string(),
            message: None,
        }
    }

    fn is_down(&self) -> bool {
        self.status == "down"
    }
}

/// Liveness check.
///
/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Readiness check.
///
/// GET /health/ready
///
/// 필드 암호화 왕복을 실제로 수행해 키 상태를 확인합니다.
pub async fn health_ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let field_cipher = match state
        .cipher
        .encrypt("readiness")
        .and_then(|payload| state.cipher.decrypt(&payload))
    {
        Ok(plain) if plain == "readiness" => ComponentStatus::up(),
        Ok(_) => ComponentStatus::down("round trip mismatch"),
        Err(e) => ComponentStatus::down(e.to_string()),
    };

    let token_registry = ComponentStatus::up_with_info(format!(
        "{} refresh tokens tracked",
        state.tokens.registry().len().await
    ));

    let metrics = match state.metrics {
        Some(_) => ComponentStatus::up(),
        None => ComponentStatus::not_configured(),
    };

    let healthy = !field_cipher.is_down();
    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        components: ComponentHealth {
            field_cipher,
            token_registry,
            metrics,
        },
    };

    (status_code, Json(response))
}

/// Prometheus 메트릭.
///
/// GET /metrics
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::SERVICE_UNAVAILABLE, String::new()),
    }
}

/// 제어 평면 라우터.
pub fn management_router() -> SecuredRouter<Arc<AppState>> {
    SecuredRouter::new()
        .management_route("/health", get(health_check))
        .management_route("/health/ready", get(health_ready))
        .management_route("/metrics", get(metrics_handler))
}
