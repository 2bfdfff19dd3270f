//! Gatehouse 운영 도구.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 암호화 키와 토큰 서명 비밀 생성
//! - 비밀번호 해시 생성/검증
//! - 토큰 발급/검사
//! - 필드 암호화/복호화

pub mod commands;
