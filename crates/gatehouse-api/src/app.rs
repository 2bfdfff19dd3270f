//! 라우터 조립.
//!
//! 레이어 순서 (바깥 → 안): 요청 제한 → HTTP 메트릭 → Guard Chain → 핸들러.
//! Guard Chain은 `Router::layer`로 붙여 `MatchedPath`를 볼 수 있게 합니다.

use std::sync::Arc;

use axum::{middleware, Router};

use crate::auth::{authorize, GuardChain};
use crate::middleware::{metrics_layer, rate_limit_middleware, RateLimiter};
use crate::routes::create_api_router;
use crate::state::AppState;

/// 인가 파이프라인이 적용된 전체 라우터.
///
/// `limiter`가 `None`이면 요청 제한을 적용하지 않습니다.
pub fn create_app(state: Arc<AppState>, limiter: Option<RateLimiter>) -> Router {
    let (router, table) = create_api_router().into_parts();
    tracing::debug!(routes = table.len(), "Route authorization table built");

    let guard = GuardChain::new(state.tokens.clone(), table);

    let app = router
        .layer(middleware::from_fn_with_state(guard, authorize))
        .with_state(state)
        .layer(middleware::from_fn(metrics_layer));

    match limiter {
        Some(limiter) => app.layer(middleware::from_fn_with_state(limiter, rate_limit_middleware)),
        None => app,
    }
}
