//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health`, `/health/ready`, `/metrics` - 제어 평면 (공개)
//! - `/api/v1/auth` - 로그인, 토큰 교체, 로그아웃, 현재 사용자
//! - `/api/v1/admin` - 관리자 전용

pub mod admin;
pub mod auth;
pub mod health;

pub use admin::{admin_router, PingResponse, SessionStatsResponse};
pub use auth::{
    auth_router, LoginRequest, LogoutRequest, LogoutResponse, MeResponse, RefreshRequest,
};
pub use health::{management_router, ComponentHealth, ComponentStatus, HealthResponse};

use std::sync::Arc;

use crate::auth::SecuredRouter;
use crate::state::AppState;

/// 전체 API 라우터 생성.
///
/// 라우트와 인가 요구사항 표를 함께 구성합니다.
pub fn create_api_router() -> SecuredRouter<Arc<AppState>> {
    SecuredRouter::new()
        .merge(management_router())
        .nest("/api/v1/auth", auth_router())
        .nest("/api/v1/admin", admin_router())
}
