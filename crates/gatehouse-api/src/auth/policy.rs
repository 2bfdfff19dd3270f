//! 역할 기반 접근 제어 (RBAC).

use std::collections::BTreeSet;

use super::{AuthError, Identity, Role};

/// 역할 정책 평가기.
///
/// - 요구 역할이 비어 있으면 통과 (라우트별 opt-in)
/// - 그 외에는 주체의 역할 집합과 요구 역할 집합이 겹쳐야 통과
/// - 역할이 없거나 형식이 잘못된 주체는 요구 역할이 있는 라우트를 절대 통과하지 못함
#[derive(Debug, Clone, Copy, Default)]
pub struct RolePolicy;

impl RolePolicy {
    pub fn check(&self, identity: &Identity, required: &BTreeSet<Role>) -> bool {
        if required.is_empty() {
            return true;
        }
        !identity.roles.is_disjoint(required)
    }

    /// 권한이 충분하면 Ok(()), 부족하면 `InsufficientRole`.
    pub fn require(&self, identity: &Identity, required: &BTreeSet<Role>) -> Result<(), AuthError> {
        if self.check(identity, required) {
            Ok(())
        } else {
            Err(AuthError::InsufficientRole)
        }
    }
}
