//! 요청 제한 미들웨어.
//!
//! 클라이언트 IP별 Token Bucket. Guard Chain보다 바깥에 적용되어
//! 인가 판정 전에 실행됩니다.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use metrics::counter;
use tokio::sync::RwLock;

use gatehouse_core::RateLimitSettings;

use crate::error::ApiErrorResponse;

/// 요청 제한 설정.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// 분당 최대 요청 수
    pub requests_per_minute: u32,
    /// 버스트 허용량
    pub burst_size: u32,
    /// 유휴 버킷 보존 시간
    pub idle_timeout: Duration,
    /// `X-Forwarded-For`/`X-Real-IP`를 클라이언트 주소로 사용 (리버스 프록시 뒤에서만)
    pub trust_forwarded_headers: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 1200,
            burst_size: 50,
            idle_timeout: Duration::from_secs(60),
            trust_forwarded_headers: false,
        }
    }
}

impl RateLimitConfig {
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
            burst_size: requests_per_minute / 10,
            ..Default::default()
        }
    }

    /// 버스트 없는 설정.
    pub fn strict(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
            burst_size: 0,
            ..Default::default()
        }
    }
}

impl From<&RateLimitSettings> for RateLimitConfig {
    fn from(settings: &RateLimitSettings) -> Self {
        Self {
            requests_per_minute: settings.requests_per_minute,
            burst_size: settings.burst_size,
            trust_forwarded_headers: settings.trust_forwarded_headers,
            ..Default::default()
        }
    }
}

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
    max_tokens: f64,
    /// 초당 리필 토큰 수
    refill_rate: f64,
}

impl TokenBucket {
    fn new(config: &RateLimitConfig) -> Self {
        let refill_rate = f64::from(config.requests_per_minute) / 60.0;
        let max_tokens = refill_rate.max(1.0) + f64::from(config.burst_size);

        Self {
            tokens: max_tokens,
            last_refill: Instant::now(),
            max_tokens,
            refill_rate,
        }
    }

    fn try_acquire(&mut self) -> bool {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();

        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_refill = now;
    }

    /// 다음 토큰까지 대기 시간 (초).
    fn retry_after_secs(&self) -> u64 {
        if self.tokens >= 1.0 || self.refill_rate <= 0.0 {
            return 1;
        }
        (((1.0 - self.tokens) / self.refill_rate).ceil() as u64).max(1)
    }
}

/// 요청 제한 판정.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitResult {
    Allowed,
    Limited {
        /// 재시도까지 대기 시간 (초)
        retry_after: u64,
    },
}

/// IP별 Rate Limiter.
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Arc<RwLock<HashMap<IpAddr, TokenBucket>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn check(&self, ip: IpAddr) -> RateLimitResult {
        let mut buckets = self.buckets.write().await;
        let bucket = buckets
            .entry(ip)
            .or_insert_with(|| TokenBucket::new(&self.config));

        if bucket.try_acquire() {
            RateLimitResult::Allowed
        } else {
            RateLimitResult::Limited {
                retry_after: bucket.retry_after_secs(),
            }
        }
    }

    /// 유휴 버킷 정리. 제거한 개수를 반환합니다.
    pub async fn cleanup(&self) -> usize {
        let mut buckets = self.buckets.write().await;
        let before = buckets.len();
        let timeout = self.config.idle_timeout;
        buckets.retain(|_, bucket| bucket.last_refill.elapsed() < timeout);
        before - buckets.len()
    }

    pub async fn tracked_ips(&self) -> usize {
        self.buckets.read().await.len()
    }
}

/// 요청 제한 미들웨어.
///
/// 제한을 넘으면 `TOO_MANY_REQUESTS` 본문과 `Retry-After` 헤더로 429를 응답합니다.
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&request, limiter.config.trust_forwarded_headers);

    match limiter.check(ip).await {
        RateLimitResult::Allowed => {
            counter!("rate_limit_requests_total", "status" => "allowed").increment(1);
            next.run(request).await
        }
        RateLimitResult::Limited { retry_after } => {
            counter!("rate_limit_requests_total", "status" => "limited").increment(1);
            tracing::warn!(client_ip = %ip, retry_after, "Rate limit exceeded");

            let mut response = ApiErrorResponse::new("TOO_MANY_REQUESTS", "rate_limit.exceeded")
                .with_details(serde_json::json!({ "retry_after": retry_after }))
                .with_request_info(request.method(), request.uri())
                .into_response_with(StatusCode::TOO_MANY_REQUESTS);

            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after));
            response
        }
    }
}

/// 버킷 키로 쓸 클라이언트 IP.
///
/// 기본은 연결의 peer 주소(`ConnectInfo`)입니다. `trust_forwarded`일 때만
/// `X-Forwarded-For`, `X-Real-IP`를 먼저 봅니다. 둘 다 없으면 루프백.
fn client_ip(request: &Request, trust_forwarded: bool) -> IpAddr {
    let peer = || -> Option<IpAddr> {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    };

    if !trust_forwarded {
        return peer().unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    let headers = request.headers();

    let forwarded: Option<IpAddr> = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|ip| ip.trim().parse().ok());

    let real_ip = || -> Option<IpAddr> {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|ip| ip.trim().parse().ok())
    };

    forwarded
        .or_else(real_ip)
        .or_else(peer)
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}
