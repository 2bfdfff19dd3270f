//! # Gatehouse Core
//!
//! 인가 서비스 전반에서 공유하는 기반 구성 요소를 제공합니다:
//! - 필드 암호화 (AES-256-GCM) 및 프로세스 키 재료
//! - 설정 관리
//! - 로깅 인프라
//! - 코어 에러 타입

pub mod config;
pub mod crypto;
pub mod error;
pub mod logging;

pub use self::config::*;
pub use crypto::{generate_secret, CipherError, CipherKeyMaterial, EncryptedPayload, FieldCipher};
pub use error::*;
pub use logging::*;
