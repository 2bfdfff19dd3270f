//! 비밀번호 해싱.
//!
//! Argon2id 기반 해싱 및 검증.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use serde::{Deserialize, Serialize};

/// 비밀번호 처리 에러.
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("비밀번호 해싱 실패")]
    HashingFailed,
    #[error("비밀번호 강도 부족: {0}")]
    TooWeak(&'static str),
    #[error("PHC 형식이 아닌 해시: {0}")]
    MalformedHash(String),
}

/// PHC 형식 해시 문자열 (솔트 포함).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashedSecret(String);

impl HashedSecret {
    /// 저장소에서 읽은 PHC 문자열을 감쌉니다. 형식은 검증 시점에 확인합니다.
    pub fn from_phc(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    /// 설정 등 외부 입력의 PHC 문자열을 검증 후 감쌉니다.
    pub fn parse(phc: &str) -> Result<Self, PasswordError> {
        let phc = phc.trim();
        PasswordHash::new(phc).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;
        Ok(Self(phc.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 비밀번호 해싱.
///
/// 호출마다 새 솔트를 생성하므로 같은 입력이라도 결과가 매번 다릅니다.
///
/// ```rust,ignore
/// let hash = hash_password("my_secure_password")?;
/// // "$argon2id$v=19$m=19456,t=2,p=1$..."
/// ```
pub fn hash_password(password: &str) -> Result<HashedSecret, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| PasswordError::HashingFailed)?;

    Ok(HashedSecret(hash.to_string()))
}

/// 비밀번호 검증.
///
/// 불일치는 에러가 아니라 `false`입니다. 저장된 해시의 형식이 잘못된 경우에도
/// `false`를 반환하고 경고 로그를 남깁니다.
pub fn verify_password(hashed: &HashedSecret, candidate: &str) -> bool {
    let parsed = match PasswordHash::new(hashed.as_str()) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is not a valid PHC string");
            return false;
        }
    };

    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok()
}

/// 비밀번호 강도 검증.
///
/// - 최소 8자 이상
/// - 최소 1개의 숫자 포함
/// - 최소 1개의 영문자 포함
pub fn validate_password_strength(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < 8 {
        return Err(PasswordError::TooWeak("최소 8자 이상이어야 합니다"));
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordError::TooWeak("최소 1개의 숫자가 포함되어야 합니다"));
    }

    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(PasswordError::TooWeak("최소 1개의 영문자가 포함되어야 합니다"));
    }

    Ok(())
}
