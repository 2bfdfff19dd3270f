//! 요청 인가 파이프라인 REST API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Argon2id 비밀번호 해싱
//! - Access/Refresh 토큰 발급과 일회성 교체
//! - 라우트 단위 인가 선언과 Guard Chain 미들웨어
//! - 역할 기반 접근 제어
//! - 헬스 체크, Prometheus 메트릭
//!
//! # 모듈 구성
//!
//! - [`auth`]: 자격증명, 토큰, 역할 정책, Guard Chain
//! - [`routes`]: REST API 엔드포인트
//! - [`repository`]: 사용자 디렉터리
//! - [`middleware`]: 요청 제한, HTTP 메트릭
//! - [`services`]: 백그라운드 정리 작업
//! - [`state`]: 애플리케이션 공유 상태

pub mod app;
pub mod auth;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod repository;
pub mod routes;
pub mod services;
pub mod state;

pub use app::create_app;
pub use auth::{
    hash_password, verify_password, AuthError, CurrentUser, GuardChain, Identity, Role,
    RouteAuthorizationRequirement, SecuredRouter, TokenPair, TokenService,
};
pub use error::{ApiErrorResponse, ApiResult};
pub use self::metrics::setup_metrics_recorder;
pub use middleware::{metrics_layer, RateLimitConfig, RateLimiter};
pub use repository::{InMemoryUserDirectory, UserDirectory, UserRecord};
pub use routes::*;
pub use services::start_maintenance_service;
pub use state::AppState;

#[cfg(any(test, feature = "test-utils"))]
pub use state::create_test_state;
