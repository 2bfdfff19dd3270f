//! 라우트별 인가 요구사항.
//!
//! 라우트를 등록할 때 요구사항을 함께 선언하고 [`RouteTable`]에 기록합니다.
//! Guard Chain은 매칭된 경로로 이 표를 조회할 뿐 런타임 리플렉션은 없습니다.
//!
//! 라우트는 두 가지 경로로 공개될 수 있습니다:
//! - 애플리케이션 선언 ([`RouteAuthorizationRequirement::public`])
//! - 제어 평면 등록 ([`SecuredRouter::management_route`]): 헬스 체크, 메트릭 등
//!
//! 두 신호는 등록 시점에 논리합으로 하나의 `is_public` 값으로 정규화됩니다.

use std::collections::{BTreeSet, HashMap};

use axum::{routing::MethodRouter, Router};

use super::Role;

/// 라우트가 공개된 경로.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicVia {
    /// 애플리케이션 라우트 선언
    Route,
    /// 제어 평면 등록
    ControlPlane,
    /// 둘 다
    Both,
}

impl PublicVia {
    fn combine(a: Option<Self>, b: Option<Self>) -> Option<Self> {
        match (a, b) {
            (None, x) | (x, None) => x,
            (Some(x), Some(y)) if x == y => Some(x),
            _ => Some(PublicVia::Both),
        }
    }
}

/// 라우트 인가 요구사항.
///
/// 등록 후 변경되지 않는 읽기 전용 값입니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteAuthorizationRequirement {
    is_public: bool,
    public_via: Option<PublicVia>,
    required_roles: BTreeSet<Role>,
}

impl RouteAuthorizationRequirement {
    /// 인증 없이 접근 가능한 라우트.
    pub fn public() -> Self {
        Self {
            is_public: true,
            public_via: Some(PublicVia::Route),
            required_roles: BTreeSet::new(),
        }
    }

    /// 제어 평면 라우트 (프로토콜 수준 공개).
    pub fn control_plane() -> Self {
        Self {
            is_public: true,
            public_via: Some(PublicVia::ControlPlane),
            required_roles: BTreeSet::new(),
        }
    }

    /// 유효한 Access Token만 요구 (역할 무관).
    pub fn authenticated() -> Self {
        Self {
            is_public: false,
            public_via: None,
            required_roles: BTreeSet::new(),
        }
    }

    /// 나열한 역할 중 하나를 요구.
    pub fn roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            is_public: false,
            public_via: None,
            required_roles: roles.into_iter().collect(),
        }
    }

    /// 같은 경로에 대한 두 선언을 하나로 정규화.
    ///
    /// 공개 여부는 논리합, 요구 역할은 합집합입니다.
    pub fn combine(self, other: Self) -> Self {
        Self {
            is_public: self.is_public || other.is_public,
            public_via: PublicVia::combine(self.public_via, other.public_via),
            required_roles: self.required_roles.union(&other.required_roles).copied().collect(),
        }
    }

    pub fn is_public(&self) -> bool {
        self.is_public
    }

    pub fn public_via(&self) -> Option<PublicVia> {
        self.public_via
    }

    pub fn required_roles(&self) -> &BTreeSet<Role> {
        &self.required_roles
    }
}

impl Default for RouteAuthorizationRequirement {
    /// 선언이 없는 라우트는 인증을 요구합니다.
    fn default() -> Self {
        Self::authenticated()
    }
}

/// 경로 패턴 → 요구사항 조회 표.
///
/// 키는 axum `MatchedPath`와 같은 전체 경로 패턴입니다 (예: `/api/v1/users/{id}`).
/// 요구사항은 경로 단위이며 메서드와 무관합니다.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: HashMap<String, RouteAuthorizationRequirement>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 요구사항 선언. 같은 경로에 이미 선언이 있으면 병합합니다.
    pub fn declare(&mut self, path: impl Into<String>, requirement: RouteAuthorizationRequirement) {
        let path = path.into();
        let merged = match self.entries.remove(&path) {
            Some(existing) => existing.combine(requirement),
            None => requirement,
        };
        self.entries.insert(path, merged);
    }

    pub fn get(&self, path: &str) -> Option<&RouteAuthorizationRequirement> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn absorb(&mut self, prefix: &str, other: RouteTable) {
        for (path, requirement) in other.entries {
            // 중첩 라우터의 "/"는 접두사 자체로 매칭됩니다
            let full = if path == "/" && !prefix.is_empty() {
                prefix.to_string()
            } else {
                format!("{prefix}{path}")
            };
            self.declare(full, requirement);
        }
    }
}

/// 요구사항을 함께 기록하는 라우터 빌더.
pub struct SecuredRouter<S = ()> {
    router: Router<S>,
    table: RouteTable,
}

impl<S> Default for SecuredRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> SecuredRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            table: RouteTable::new(),
        }
    }

    /// 애플리케이션 라우트 등록.
    pub fn route(
        mut self,
        path: &str,
        method_router: MethodRouter<S>,
        requirement: RouteAuthorizationRequirement,
    ) -> Self {
        self.table.declare(path, requirement);
        self.router = self.router.route(path, method_router);
        self
    }

    /// 제어 평면 라우트 등록 (프로토콜 수준 공개).
    pub fn management_route(mut self, path: &str, method_router: MethodRouter<S>) -> Self {
        self.table
            .declare(path, RouteAuthorizationRequirement::control_plane());
        self.router = self.router.route(path, method_router);
        self
    }

    /// 하위 라우터를 접두사 아래에 중첩.
    pub fn nest(mut self, prefix: &str, other: SecuredRouter<S>) -> Self {
        self.table.absorb(prefix, other.table);
        self.router = self.router.nest(prefix, other.router);
        self
    }

    /// 다른 라우터 병합.
    pub fn merge(mut self, other: SecuredRouter<S>) -> Self {
        self.table.absorb("", other.table);
        self.router = self.router.merge(other.router);
        self
    }

    pub fn into_parts(self) -> (Router<S>, RouteTable) {
        (self.router, self.table)
    }
}
