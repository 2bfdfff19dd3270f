//! 애플리케이션 상태.
//!
//! 모든 핸들러가 공유하는 협력 객체를 담습니다. 생성 후에는 내부 가변성을 가진
//! 컴포넌트(토큰 레지스트리, 사용자 저장소)만 변경됩니다.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use gatehouse_core::FieldCipher;

use crate::auth::TokenService;
use crate::repository::UserDirectory;

/// 공유 애플리케이션 상태.
#[derive(Clone)]
pub struct AppState {
    /// 토큰 발급, 검증, 교체
    pub tokens: Arc<TokenService>,
    /// 민감 필드 암호화
    pub cipher: Arc<FieldCipher>,
    /// 사용자 조회
    pub users: Arc<dyn UserDirectory>,
    /// `/metrics` 렌더링 핸들
    pub metrics: Option<PrometheusHandle>,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

impl AppState {
    pub fn new(
        tokens: Arc<TokenService>,
        cipher: Arc<FieldCipher>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            tokens,
            cipher,
            users,
            metrics: None,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// 서버 업타임 (초).
    pub fn uptime_secs(&self) -> i64 {
        (chrono::Utc::now() - self.started_at).num_seconds()
    }
}

/// 테스트용 상태. 사용자가 없는 메모리 저장소와 임시 암호화 키를 사용합니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    use crate::repository::InMemoryUserDirectory;
    use gatehouse_core::CipherKeyMaterial;

    let tokens = TokenService::new(
        b"test-access-secret-0123456789-abcdefgh",
        chrono::Duration::minutes(15),
        b"test-refresh-secret-0123456789-abcdefg",
        chrono::Duration::days(7),
    );
    let cipher = FieldCipher::new(&CipherKeyMaterial::generate())
        .expect("generated key material is always valid");

    AppState::new(
        Arc::new(tokens),
        Arc::new(cipher),
        Arc::new(InMemoryUserDirectory::new()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_defaults() {
        let state = create_test_state();
        assert!(state.metrics.is_none());
        assert!(state.uptime_secs() >= 0);
        assert!(!state.version.is_empty());
    }
}
