//! 설정 관리.
//!
//! 기본값 → TOML 파일 → 환경 변수(`GATEHOUSE__SECTION__KEY`) 순서로 덮어씁니다.
//! 비밀 값은 [`SecretString`]으로만 보관하며 직렬화하지 않습니다.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::CoreError;

/// 서명 비밀 키 최소 길이 (바이트)
pub const MIN_SECRET_LEN: usize = 32;

/// Access Token 최대 유효 기간 (분, 1일)
pub const MAX_ACCESS_EXPIRY_MINUTES: i64 = 24 * 60;

/// Refresh Token 최대 유효 기간 (일)
pub const MAX_REFRESH_EXPIRY_DAYS: i64 = 365;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// 서버 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 토큰 및 초기 사용자 설정
    pub auth: AuthConfig,
    /// 필드 암호화 키 소스
    #[serde(default)]
    pub cipher: CipherConfig,
    /// 요청 제한 설정
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 토큰 발급 설정.
///
/// Access/Refresh 토큰은 서로 다른 비밀 키와 만료 시간을 사용합니다.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Access Token 서명 키
    pub access_secret: SecretString,
    /// Access Token 만료 시간 (분)
    #[serde(default = "default_access_expiry")]
    pub access_expiry_minutes: i64,
    /// Refresh Token 서명 키
    pub refresh_secret: SecretString,
    /// Refresh Token 만료 시간 (일)
    #[serde(default = "default_refresh_expiry")]
    pub refresh_expiry_days: i64,
    /// 만료된 refresh 토큰 기록 정리 주기 (초)
    #[serde(default = "default_purge_interval")]
    pub registry_purge_interval_secs: u64,
    /// 시작 시 등록할 사용자
    #[serde(default)]
    pub bootstrap_users: Vec<BootstrapUser>,
}

fn default_access_expiry() -> i64 {
    15
}
fn default_refresh_expiry() -> i64 {
    7
}
fn default_purge_interval() -> u64 {
    300
}

impl AuthConfig {
    /// 설정 값 검증.
    ///
    /// 짧은 키, 동일한 access/refresh 키, 범위를 벗어난 만료 시간을 거부합니다.
    pub fn validate(&self) -> Result<(), CoreError> {
        let access = self.access_secret.expose_secret();
        let refresh = self.refresh_secret.expose_secret();

        if access.len() < MIN_SECRET_LEN {
            return Err(CoreError::Config(format!(
                "auth.access_secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        if refresh.len() < MIN_SECRET_LEN {
            return Err(CoreError::Config(format!(
                "auth.refresh_secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        if access == refresh {
            return Err(CoreError::Config(
                "auth.access_secret and auth.refresh_secret must differ".to_string(),
            ));
        }
        if !(1..=MAX_ACCESS_EXPIRY_MINUTES).contains(&self.access_expiry_minutes) {
            return Err(CoreError::Config(format!(
                "auth.access_expiry_minutes must be between 1 and {MAX_ACCESS_EXPIRY_MINUTES}"
            )));
        }
        if !(1..=MAX_REFRESH_EXPIRY_DAYS).contains(&self.refresh_expiry_days) {
            return Err(CoreError::Config(format!(
                "auth.refresh_expiry_days must be between 1 and {MAX_REFRESH_EXPIRY_DAYS}"
            )));
        }
        if self.registry_purge_interval_secs == 0 {
            return Err(CoreError::Config(
                "auth.registry_purge_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// 시작 시 디렉터리에 등록되는 사용자.
///
/// `password`(평문, 시작 시 해싱) 또는 `password_hash`(`gatehouse hash-password`로 만든
/// PHC 문자열) 중 정확히 하나를 지정합니다.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapUser {
    pub username: String,
    #[serde(default)]
    pub password: Option<SecretString>,
    #[serde(default)]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// 필드 암호화 키 소스.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeySource {
    /// 프로세스 시작 시 생성 (재시작 후 기존 암호문 복구 불가)
    #[default]
    Ephemeral,
    /// `cipher.key` / `cipher.iv`에서 로드
    Configured,
}

/// 필드 암호화 설정.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CipherConfig {
    #[serde(default)]
    pub key_source: KeySource,
    /// Base64 인코딩된 32바이트 키
    #[serde(default)]
    pub key: Option<SecretString>,
    /// Base64 인코딩된 12바이트 iv
    #[serde(default)]
    pub iv: Option<String>,
}

/// 요청 제한 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub enabled: bool,
    /// 분당 최대 요청 수
    pub requests_per_minute: u32,
    /// 순간적으로 허용되는 추가 요청 수
    pub burst_size: u32,
    /// 프록시 헤더(`X-Forwarded-For`, `X-Real-IP`)를 클라이언트 주소로 신뢰.
    /// 신뢰할 수 있는 리버스 프록시 뒤에서만 켭니다.
    pub trust_forwarded_headers: bool,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_minute: 1200,
            burst_size: 50,
            trust_forwarded_headers: false,
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값과 환경 변수만 사용합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let builder = Self::defaults()?
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(Self::environment());
        Self::finish(builder)
    }

    /// 환경 변수만으로 설정을 로드합니다.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::finish(Self::defaults()?.add_source(Self::environment()))
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, CoreError> {
        Ok(config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("cipher.key_source", "ephemeral")?)
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix("GATEHOUSE")
            .separator("__")
            .try_parsing(true)
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, CoreError> {
        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.auth.validate()?;
        Ok(config)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, CoreError> {
        Self::load("config/default.toml")
    }

    /// 바인딩 주소 문자열.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_config(access: &str, refresh: &str) -> AuthConfig {
        AuthConfig {
            access_secret: SecretString::from(access.to_string()),
            access_expiry_minutes: 15,
            refresh_secret: SecretString::from(refresh.to_string()),
            refresh_expiry_days: 7,
            registry_purge_interval_secs: 300,
            bootstrap_users: Vec::new(),
        }
    }

    #[test]
    fn test_auth_config_validate() {
        let ok = auth_config(&"a".repeat(32), &"b".repeat(32));
        assert!(ok.validate().is_ok());

        let short = auth_config("short", &"b".repeat(32));
        assert!(short.validate().is_err());

        let same = auth_config(&"a".repeat(32), &"a".repeat(32));
        assert!(same.validate().is_err());

        let mut expired = auth_config(&"a".repeat(32), &"b".repeat(32));
        expired.access_expiry_minutes = 0;
        assert!(expired.validate().is_err());
    }

    #[test]
    fn test_auth_config_expiry_upper_bounds() {
        let mut config = auth_config(&"a".repeat(32), &"b".repeat(32));
        config.access_expiry_minutes = MAX_ACCESS_EXPIRY_MINUTES;
        config.refresh_expiry_days = MAX_REFRESH_EXPIRY_DAYS;
        assert!(config.validate().is_ok());

        config.refresh_expiry_days = i64::MAX;
        assert!(config.validate().is_err());

        config.refresh_expiry_days = MAX_REFRESH_EXPIRY_DAYS;
        config.access_expiry_minutes = MAX_ACCESS_EXPIRY_MINUTES + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_from_toml() {
        let toml = r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [auth]
            access_secret = "access-secret-for-config-tests-0123456789"
            refresh_secret = "refresh-secret-for-config-tests-0123456789"
            access_expiry_minutes = 5

            [[auth.bootstrap_users]]
            username = "admin"
            password = "Admin12345"
            roles = ["admin"]

            [[auth.bootstrap_users]]
            username = "ops"
            password_hash = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$aGFzaA"

            [cipher]
            key_source = "configured"
            key = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA="
            iv = "AAAAAAAAAAAAAAAA"
        "#;

        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.auth.access_expiry_minutes, 5);
        assert_eq!(config.auth.refresh_expiry_days, 7);
        assert_eq!(config.auth.bootstrap_users.len(), 2);
        assert_eq!(config.auth.bootstrap_users[0].roles, vec!["admin"]);
        assert!(config.auth.bootstrap_users[0].password.is_some());
        assert!(config.auth.bootstrap_users[1].password.is_none());
        assert!(config.auth.bootstrap_users[1].password_hash.is_some());
        assert_eq!(config.cipher.key_source, KeySource::Configured);
        assert!(config.rate_limit.enabled);
        assert_eq!(config.logging.format, "pretty");
        assert!(config.auth.validate().is_ok());
    }
}
