//! 역할 및 요청 주체(Identity).
//!
//! 토큰의 `role` 클레임은 문자열 하나이거나 문자열 배열일 수 있습니다.
//! 이 경계에서 항상 `BTreeSet<Role>`로 정규화하여 정책 평가기가
//! 한 가지 입력 형태만 다루도록 합니다.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// 사용자 역할.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 관리자
    Admin,
    /// 일반 사용자
    User,
}

impl Role {
    /// 문자열에서 역할 파싱 (대소문자 무시).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 토큰에 실리는 역할 클레임의 원시 형태.
///
/// 문자열/문자열 배열이 아닌 값(숫자, 객체, 섞인 배열)도 디코딩은 성공하고
/// `Other`로 남습니다. 서명이 유효한 토큰은 역할 형식 때문에 401이 되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleClaim {
    One(String),
    Many(Vec<String>),
    Other(serde_json::Value),
}

impl RoleClaim {
    /// 역할 집합을 클레임으로 변환. 역할이 하나면 문자열 하나로 기록합니다.
    pub fn from_roles(roles: &BTreeSet<Role>) -> Self {
        let mut names: Vec<String> = roles.iter().map(|r| r.as_str().to_string()).collect();
        if names.len() == 1 {
            RoleClaim::One(names.remove(0))
        } else {
            RoleClaim::Many(names)
        }
    }

    /// 클레임을 역할 집합으로 정규화.
    ///
    /// 알 수 없는 역할이 하나라도 있으면 빈 집합을 반환합니다 (fail closed).
    pub fn normalize(&self) -> BTreeSet<Role> {
        let names: Vec<&str> = match self {
            RoleClaim::One(name) => vec![name.as_str()],
            RoleClaim::Many(names) => names.iter().map(String::as_str).collect(),
            RoleClaim::Other(value) => {
                tracing::warn!(claim = %value, "Role claim is not a string or string array, treating identity as roleless");
                return BTreeSet::new();
            }
        };

        let parsed: Option<BTreeSet<Role>> = names.into_iter().map(Role::parse).collect();
        match parsed {
            Some(roles) => roles,
            None => {
                tracing::warn!(claim = ?self, "Malformed role claim, treating identity as roleless");
                BTreeSet::new()
            }
        }
    }
}

/// 검증된 Access Token에서 얻은 요청 주체.
///
/// 요청마다 새로 만들어지며 요청 처리 동안 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// 사용자 ID
    pub subject_id: String,
    /// 정규화된 역할 집합 (비어 있으면 역할 없음/형식 오류)
    pub roles: BTreeSet<Role>,
}

impl Identity {
    /// 단일 역할 주체 생성.
    pub fn new(subject_id: impl Into<String>, role: Role) -> Self {
        Self {
            subject_id: subject_id.into(),
            roles: BTreeSet::from([role]),
        }
    }

    /// 여러 역할을 가진 주체 생성.
    pub fn with_roles(subject_id: impl Into<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            subject_id: subject_id.into(),
            roles: roles.into_iter().collect(),
        }
    }

    /// 토큰 클레임에서 주체 생성. 역할 클레임이 없으면 역할 없는 주체가 됩니다.
    pub fn from_claim(subject_id: impl Into<String>, claim: Option<&RoleClaim>) -> Self {
        Self {
            subject_id: subject_id.into(),
            roles: claim.map(RoleClaim::normalize).unwrap_or_default(),
        }
    }

    /// 토큰에 기록할 역할 클레임.
    pub fn role_claim(&self) -> RoleClaim {
        RoleClaim::from_roles(&self.roles)
    }
}
