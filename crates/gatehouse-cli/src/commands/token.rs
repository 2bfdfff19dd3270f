//! 토큰 발급/검사.
//!
//! 서버와 같은 설정 파일의 서명 비밀을 사용합니다. CLI에서 발급한 Refresh Token은
//! 이 프로세스의 레지스트리에만 기록되므로 서버에서 교체할 수 없습니다.

use anyhow::{anyhow, Context, Result};
use serde::Serialize;

use gatehouse_api::auth::{Identity, Role, TokenError, TokenPair, TokenService};
use gatehouse_core::AppConfig;

/// 검사할 토큰 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// 검사 결과.
#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    pub roles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

fn load_service(config_path: &str) -> Result<TokenService> {
    let config = AppConfig::load(config_path)
        .with_context(|| format!("Failed to load config from {config_path}"))?;
    Ok(TokenService::from_config(&config.auth))
}

/// 역할 이름 목록을 파싱합니다. 알 수 없는 이름은 에러입니다.
pub fn parse_roles(names: &[String]) -> Result<Vec<Role>> {
    names
        .iter()
        .map(|name| Role::parse(name).ok_or_else(|| anyhow!("Unknown role: {name}. Use: admin, user")))
        .collect()
}

/// 주체에 대한 토큰 쌍 발급.
pub async fn issue(config_path: &str, subject: &str, roles: &[String]) -> Result<TokenPair> {
    let service = load_service(config_path)?;
    let identity = Identity::with_roles(subject, parse_roles(roles)?);
    service
        .issue(&identity)
        .await
        .context("Failed to sign token pair")
}

/// 토큰 검증 결과를 보고서로 변환.
pub fn inspect_with(service: &TokenService, token: &str, kind: TokenKind) -> InspectReport {
    let result = match kind {
        TokenKind::Access => service.verify_access(token),
        TokenKind::Refresh => service.verify_refresh(token),
    };

    match result {
        Ok(identity) => InspectReport {
            valid: true,
            subject_id: Some(identity.subject_id),
            roles: identity.roles.iter().map(|r| r.as_str().to_string()).collect(),
            reason: None,
        },
        Err(e) => InspectReport {
            valid: false,
            subject_id: None,
            roles: Vec::new(),
            reason: Some(match e {
                TokenError::Expired => "expired".to_string(),
                other => other.to_string(),
            }),
        },
    }
}

/// 설정 파일의 비밀로 토큰 검사.
pub fn inspect(config_path: &str, token: &str, kind: TokenKind) -> Result<InspectReport> {
    Ok(inspect_with(&load_service(config_path)?, token, kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn service() -> TokenService {
        TokenService::new(
            b"cli-access-secret-0123456789-abcdefghij",
            Duration::minutes(5),
            b"cli-refresh-secret-0123456789-abcdefghi",
            Duration::days(1),
        )
    }

    #[tokio::test]
    async fn test_inspect_access_and_refresh() {
        let service = service();
        let identity = Identity::with_roles("ops", [Role::Admin]);
        let pair = service.issue(&identity).await.unwrap();

        let report = inspect_with(&service, &pair.access_token, TokenKind::Access);
        assert!(report.valid);
        assert_eq!(report.subject_id.as_deref(), Some("ops"));
        assert_eq!(report.roles, vec!["admin"]);

        let wrong_kind = inspect_with(&service, &pair.access_token, TokenKind::Refresh);
        assert!(!wrong_kind.valid);
        assert!(wrong_kind.reason.is_some());

        assert!(inspect_with(&service, &pair.refresh_token, TokenKind::Refresh).valid);
    }

    #[test]
    fn test_parse_roles() {
        let roles = parse_roles(&["admin".to_string(), "USER".to_string()]).unwrap();
        assert_eq!(roles, vec![Role::Admin, Role::User]);
        assert!(parse_roles(&["root".to_string()]).is_err());
    }
}
