//! 인증 및 권한 부여.
//!
//! 요청 인가 파이프라인과 자격증명 수명주기를 제공합니다.
//!
//! # 구성 요소
//!
//! - [`hash_password`] / [`verify_password`]: Argon2id 비밀번호 해싱
//! - [`TokenService`]: Access/Refresh 토큰 쌍 발급, 검증, 교체
//! - [`RolePolicy`]: 역할 기반 접근 제어
//! - [`RouteAuthorizationRequirement`] / [`SecuredRouter`]: 라우트별 인가 선언
//! - [`GuardChain`] / [`authorize`]: 요청마다 실행되는 인가 미들웨어
//! - [`CurrentUser`]: 핸들러용 인증 사용자 추출기
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! let routes = SecuredRouter::new()
//!     .route("/me", get(me), RouteAuthorizationRequirement::authenticated())
//!     .route("/admin", get(admin), RouteAuthorizationRequirement::roles([Role::Admin]));
//! let (router, table) = routes.into_parts();
//! let guard = GuardChain::new(token_service, table);
//! let app = router.layer(middleware::from_fn_with_state(guard, authorize));
//! ```

mod error;
mod guard;
mod identity;
mod password;
mod policy;
mod requirement;
mod token;

pub use error::AuthError;
pub use guard::{
    authorize, bearer_token, CurrentUser, GuardChain, GuardStage, RequestIdentity,
};
pub use identity::{Identity, Role, RoleClaim};
pub use password::{
    hash_password, validate_password_strength, verify_password, HashedSecret, PasswordError,
};
pub use policy::RolePolicy;
pub use requirement::{PublicVia, RouteAuthorizationRequirement, RouteTable, SecuredRouter};
pub use token::{
    AccessTokenVerifier, RefreshState, RefreshTokenRegistry, TokenClaims, TokenError, TokenPair,
    TokenService,
};
