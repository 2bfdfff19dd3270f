//! 관리자 API.
//!
//! 모든 라우트가 `admin` 역할을 요구합니다.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json};
use serde::{Deserialize, Serialize};

use crate::auth::{CurrentUser, Role, RouteAuthorizationRequirement, SecuredRouter};
use crate::state::AppState;

/// 관리자 확인 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct PingResponse {
    pub status: String,
    pub subject_id: String,
}

/// 세션 통계 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionStatsResponse {
    /// 레지스트리가 추적 중인 Refresh Token 수 (모든 상태)
    pub tracked_refresh_tokens: usize,
}

/// GET /api/v1/admin/ping
pub async fn ping(CurrentUser(identity): CurrentUser) -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok".to_string(),
        subject_id: identity.subject_id,
    })
}

/// GET /api/v1/admin/sessions
pub async fn session_stats(State(state): State<Arc<AppState>>) -> Json<SessionStatsResponse> {
    Json(SessionStatsResponse {
        tracked_refresh_tokens: state.tokens.registry().len().await,
    })
}

/// 관리자 라우터.
pub fn admin_router() -> SecuredRouter<Arc<AppState>> {
    let admin_only = || RouteAuthorizationRequirement::roles([Role::Admin]);

    SecuredRouter::new()
        .route("/ping", get(ping), admin_only())
        .route("/sessions", get(session_stats), admin_only())
}
