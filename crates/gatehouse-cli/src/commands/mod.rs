//! CLI 명령어 구현 모듈.

pub mod cipher;
pub mod keygen;
pub mod password;
pub mod token;

// 각 서브모듈 직접 사용 권장
