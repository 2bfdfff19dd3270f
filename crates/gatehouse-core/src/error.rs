//! 코어 에러 타입.

use thiserror::Error;

use crate::crypto::CipherError;

/// 설정/키 준비 단계의 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 암호화 에러
    #[error("암호화 에러: {0}")]
    Cipher(#[from] CipherError),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 코어 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// 프로세스 시작을 중단해야 하는 에러인지 확인합니다.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CoreError::Config(_) | CoreError::Cipher(CipherError::KeyUnavailable(_))
        )
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::Config(err.to_string())
    }
}
