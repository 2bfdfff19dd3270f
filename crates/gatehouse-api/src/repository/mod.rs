//! 저장소 경계.
//!
//! 인가 코어가 참조하는 사용자 조회만 trait으로 정의합니다.
//! 영속화 스키마는 이 크레이트의 범위 밖이며 기본 구현은 메모리 저장소입니다.

pub mod users;

pub use users::{InMemoryUserDirectory, SeedError, UserDirectory, UserRecord};
