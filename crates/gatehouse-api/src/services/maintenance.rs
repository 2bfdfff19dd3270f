//! 주기 정리 작업.
//!
//! 만료된 Refresh Token 레지스트리 항목과 유휴 요청 제한 버킷을 정리합니다.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::auth::TokenService;
use crate::middleware::RateLimiter;

/// 주기 정리 서비스.
pub struct MaintenanceService {
    tokens: Arc<TokenService>,
    limiter: Option<RateLimiter>,
    interval: Duration,
}

impl MaintenanceService {
    pub fn new(tokens: Arc<TokenService>, limiter: Option<RateLimiter>, interval: Duration) -> Self {
        Self {
            tokens,
            limiter,
            interval,
        }
    }

    /// 한 번 정리. (레지스트리 제거 수, 버킷 제거 수)
    pub async fn sweep(&self) -> (usize, usize) {
        let purged = self.tokens.purge_expired().await;
        let buckets = match &self.limiter {
            Some(limiter) => limiter.cleanup().await,
            None => 0,
        };

        if purged > 0 || buckets > 0 {
            tracing::debug!(purged, buckets, "Maintenance sweep completed");
        }
        (purged, buckets)
    }

    /// 종료 신호까지 주기적으로 정리합니다.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        // 첫 tick은 즉시 완료됨
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep().await;
                }
                _ = shutdown.cancelled() => {
                    tracing::info!("Maintenance service stopped");
                    break;
                }
            }
        }
    }
}

/// 정리 서비스를 백그라운드 task로 시작합니다.
pub fn start_maintenance_service(
    tokens: Arc<TokenService>,
    limiter: Option<RateLimiter>,
    interval: Duration,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let service = MaintenanceService::new(tokens, limiter, interval);
    tokio::spawn(async move {
        service.run(shutdown).await;
    })
}
