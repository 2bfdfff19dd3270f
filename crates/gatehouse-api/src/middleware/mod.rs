//! HTTP 미들웨어.
//!
//! 적용 순서 (바깥 → 안): 요청 제한 → 메트릭 → Guard Chain.

mod metrics;
mod rate_limit;

pub use self::metrics::metrics_layer;
pub use rate_limit::{rate_limit_middleware, RateLimitConfig, RateLimitResult, RateLimiter};
