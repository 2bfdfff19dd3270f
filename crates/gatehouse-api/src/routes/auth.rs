//! 인증 API.
//!
//! 로그인, 토큰 교체, 로그아웃, 현재 사용자 조회.
//!
//! # 라우트
//!
//! - `POST /login` - 공개
//! - `POST /refresh` - 공개 (Refresh Token을 본문으로 전달)
//! - `POST /logout` - 인증 필요 (본문에 `refresh_token`이 있으면 그 토큰만 폐기)
//! - `GET /me` - 인증 필요

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{
    verify_password, AuthError, CurrentUser, RefreshState, RouteAuthorizationRequirement,
    SecuredRouter, TokenError, TokenPair,
};
use crate::error::{internal_error, ApiErrorResponse, ApiResult};
use crate::metrics::{record_login, record_refresh};
use crate::state::AppState;

/// 로그인 요청.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// 토큰 교체 요청.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// 로그아웃 요청. 본문 없이 호출하면 모든 Refresh Token을 폐기합니다.
#[derive(Debug, Default, Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// 로그아웃 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    /// 폐기된 Refresh Token 수
    pub revoked: usize,
}

/// 현재 사용자 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub id: String,
    pub username: String,
    pub roles: Vec<String>,
    /// 복호화에 실패하면 생략됨
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

fn invalid_login() -> (StatusCode, Json<ApiErrorResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiErrorResponse::new("INVALID_LOGIN", "auth.login.invalid")),
    )
}

/// 로그인.
///
/// POST /api/v1/auth/login
///
/// 없는 사용자와 틀린 비밀번호는 같은 응답(`INVALID_LOGIN`)을 받습니다.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenPair>> {
    let Some(user) = state.users.find_by_username(&req.username).await else {
        record_login("unknown_user");
        info!(username = %req.username, "Login rejected: unknown user");
        return Err(invalid_login());
    };

    if !verify_password(&user.password_hash, &req.password) {
        record_login("bad_password");
        info!(subject = %user.id, "Login rejected: password mismatch");
        return Err(invalid_login());
    }

    let pair = state
        .tokens
        .issue(&user.identity())
        .await
        .map_err(internal_error)?;

    record_login("success");
    info!(subject = %user.id, "User logged in");
    Ok(Json(pair))
}

/// 교체 거부 사유 (`auth_refresh_total`의 outcome 레이블).
///
/// `replayed`는 이미 교체에 쓰인 토큰의 재사용으로, 토큰 탈취 신호입니다.
fn rejection_outcome(state: Result<RefreshState, TokenError>) -> &'static str {
    match state {
        Ok(RefreshState::Rotated) => "replayed",
        Ok(RefreshState::Revoked) => "revoked",
        Ok(RefreshState::Expired) => "expired",
        Ok(RefreshState::Unknown) => "unknown",
        Ok(RefreshState::Active) | Err(_) => "invalid",
    }
}

/// Refresh Token으로 토큰 쌍 교체.
///
/// POST /api/v1/auth/refresh
///
/// 한 번 사용한 Refresh Token은 다시 사용할 수 없습니다.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<TokenPair>> {
    match state.tokens.rotate(&req.refresh_token).await {
        Ok(pair) => {
            record_refresh("success");
            Ok(Json(pair))
        }
        Err(err) => {
            let outcome = rejection_outcome(state.tokens.refresh_state(&req.refresh_token).await);
            record_refresh(outcome);
            Err(AuthError::from(err).into())
        }
    }
}

/// 로그아웃.
///
/// POST /api/v1/auth/logout
///
/// 본문에 `refresh_token`이 있으면 호출자 소유의 그 토큰만, 없으면 호출자의
/// 모든 Refresh Token을 폐기합니다. 이미 발급된 Access Token은 만료될 때까지 유효합니다.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    body: Option<Json<LogoutRequest>>,
) -> ApiResult<Json<LogoutResponse>> {
    let revoked = match body.and_then(|Json(req)| req.refresh_token) {
        Some(token) => {
            state
                .tokens
                .revoke(&token, &identity.subject_id)
                .await
                .map_err(AuthError::from)?;
            1
        }
        None => state.tokens.revoke_subject(&identity.subject_id).await,
    };

    info!(subject = %identity.subject_id, revoked, "User logged out");
    Ok(Json(LogoutResponse { revoked }))
}

/// 현재 사용자 정보.
///
/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
) -> ApiResult<Json<MeResponse>> {
    let user = state
        .users
        .find_by_id(&identity.subject_id)
        .await
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ApiErrorResponse::new("USER_NOT_FOUND", "user.not_found")),
            )
        })?;

    let email = match user.email.as_ref().map(|payload| state.cipher.decrypt(payload)) {
        None => None,
        Some(Ok(email)) => Some(email),
        Some(Err(e)) if e.is_decryption() => {
            warn!(subject = %user.id, error = %e, "Stored email could not be decrypted, omitting");
            None
        }
        Some(Err(e)) => return Err(internal_error(e)),
    };

    Ok(Json(MeResponse {
        id: user.id,
        username: user.username,
        roles: identity.roles.iter().map(|r| r.as_str().to_string()).collect(),
        email,
    }))
}

/// 인증 라우터.
pub fn auth_router() -> SecuredRouter<Arc<AppState>> {
    SecuredRouter::new()
        .route("/login", post(login), RouteAuthorizationRequirement::public())
        .route("/refresh", post(refresh), RouteAuthorizationRequirement::public())
        .route(
            "/logout",
            post(logout),
            RouteAuthorizationRequirement::authenticated(),
        )
        .route("/me", get(me), RouteAuthorizationRequirement::authenticated())
}
