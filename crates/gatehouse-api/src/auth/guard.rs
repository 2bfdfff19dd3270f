//! 인가 Guard Chain.
//!
//! 요청마다 한 번, 다음 순서로 평가하며 첫 실패에서 멈춥니다:
//!
//! 1. 요청 제한: [`crate::middleware::rate_limit_middleware`]가 이 체인보다 바깥에서 처리
//! 2. 공개 라우트 / 3. 제어 평면 공개: 등록 시 하나의 `is_public`으로 정규화됨.
//!    공개 라우트는 토큰 서비스를 호출하지 않으며 Identity도 만들지 않습니다.
//! 4. 자격증명 검증: Bearer 토큰 추출 후 `verify_access`. 실패 시 401
//! 5. 역할 검사: [`RolePolicy`]. 실패 시 403
//!
//! 통과한 요청에는 [`RequestIdentity`]가 extension으로 붙습니다.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, MatchedPath, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use metrics::counter;
use tracing::Instrument;

use super::{
    AccessTokenVerifier, AuthError, Identity, RolePolicy, RouteAuthorizationRequirement,
    RouteTable,
};

/// 판정이 내려진 단계.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardStage {
    PublicOverride,
    Credential,
    RoleCheck,
}

impl GuardStage {
    fn as_str(&self) -> &'static str {
        match self {
            GuardStage::PublicOverride => "public_override",
            GuardStage::Credential => "credential",
            GuardStage::RoleCheck => "role_check",
        }
    }
}

fn record_decision(stage: GuardStage, allowed: bool) {
    counter!(
        "auth_decisions_total",
        "stage" => stage.as_str(),
        "outcome" => if allowed { "allow" } else { "deny" }
    )
    .increment(1);
}

/// 요청에 붙는 인가 결과. 공개 라우트에서는 `None`입니다.
#[derive(Debug, Clone)]
pub struct RequestIdentity(pub Option<Identity>);

/// Authorization 헤더에서 Bearer 토큰 추출.
///
/// 헤더가 없거나, 스킴이 Bearer가 아니거나, 토큰이 비어 있으면 `MissingCredential`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingCredential)?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::MissingCredential)?;

    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::MissingCredential);
    }
    Ok(token)
}

/// 인가 Guard Chain.
#[derive(Clone)]
pub struct GuardChain {
    verifier: Arc<dyn AccessTokenVerifier>,
    policy: RolePolicy,
    routes: Arc<RouteTable>,
}

impl GuardChain {
    pub fn new(verifier: Arc<dyn AccessTokenVerifier>, routes: RouteTable) -> Self {
        Self {
            verifier,
            policy: RolePolicy,
            routes: Arc::new(routes),
        }
    }

    /// 매칭된 경로의 요구사항. 선언이 없으면 인증을 요구합니다.
    pub fn requirement_for(&self, matched_path: &str) -> RouteAuthorizationRequirement {
        match self.routes.get(matched_path) {
            Some(requirement) => requirement.clone(),
            None => {
                tracing::debug!(path = %matched_path, "No authorization declared, requiring authentication");
                RouteAuthorizationRequirement::default()
            }
        }
    }

    /// 요구사항과 요청 헤더로 인가 판정.
    ///
    /// 공개 라우트면 `Ok(None)`, 인증된 요청이면 `Ok(Some(identity))`.
    pub fn evaluate(
        &self,
        requirement: &RouteAuthorizationRequirement,
        headers: &HeaderMap,
    ) -> Result<Option<Identity>, AuthError> {
        if requirement.is_public() {
            tracing::trace!(via = ?requirement.public_via(), "Public route, skipping credential check");
            record_decision(GuardStage::PublicOverride, true);
            return Ok(None);
        }

        let identity = bearer_token(headers)
            .and_then(|token| self.verifier.verify_access(token).map_err(AuthError::from))
            .inspect_err(|_| record_decision(GuardStage::Credential, false))?;
        record_decision(GuardStage::Credential, true);

        self.policy
            .require(&identity, requirement.required_roles())
            .inspect_err(|_| record_decision(GuardStage::RoleCheck, false))?;

        record_decision(GuardStage::RoleCheck, true);
        Ok(Some(identity))
    }
}

/// Guard Chain 미들웨어.
///
/// `Router::layer`로 적용해야 `MatchedPath`를 볼 수 있습니다.
/// 매칭된 라우트가 없는 요청은 그대로 통과시켜 라우터의 404가 응답하게 합니다.
pub async fn authorize(State(guard): State<GuardChain>, mut request: Request, next: Next) -> Response {
    let Some(path) = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
    else {
        return next.run(request).await;
    };

    let span = gatehouse_core::auth_span!("authorize", path);
    let requirement = guard.requirement_for(&path);

    match guard.evaluate(&requirement, request.headers()) {
        Ok(identity) => {
            if let Some(identity) = &identity {
                span.record("subject", identity.subject_id.as_str());
            }
            request.extensions_mut().insert(RequestIdentity(identity));
            next.run(request).instrument(span).await
        }
        Err(err) => {
            span.in_scope(|| {
                tracing::info!(
                    method = %request.method(),
                    code = err.code(),
                    "Request rejected by guard chain"
                );
            });
            err.into_response_for(request.method(), request.uri())
        }
    }
}

/// 인증된 사용자 추출기.
///
/// Guard Chain을 통과해 Identity가 붙은 요청에서만 성공합니다.
///
/// ```rust,ignore
/// async fn me(CurrentUser(identity): CurrentUser) -> impl IntoResponse {
///     format!("Hello, {}!", identity.subject_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<RequestIdentity>() {
            Some(RequestIdentity(Some(identity))) => Ok(CurrentUser(identity.clone())),
            _ => Err(AuthError::MissingCredential),
        }
    }
}
