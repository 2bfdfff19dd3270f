//! 인가 거부 에러.

use axum::{
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};

use super::token::TokenError;
use crate::error::ApiErrorResponse;

/// 인가 파이프라인의 거부 사유.
///
/// 자격증명 단계의 실패는 401, 역할 단계의 실패는 403입니다.
/// 어느 쪽도 재시도하거나 허용으로 완화하지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("인증 토큰이 필요합니다")]
    MissingCredential,
    #[error("유효하지 않은 토큰")]
    InvalidCredential,
    #[error("토큰이 만료되었습니다")]
    ExpiredCredential,
    #[error("권한이 부족합니다")]
    InsufficientRole,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InsufficientRole => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "MISSING_CREDENTIAL",
            AuthError::InvalidCredential => "INVALID_CREDENTIAL",
            AuthError::ExpiredCredential => "EXPIRED_CREDENTIAL",
            AuthError::InsufficientRole => "INSUFFICIENT_ROLE",
        }
    }

    pub fn message_key(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "auth.credential.missing",
            AuthError::InvalidCredential => "auth.credential.invalid",
            AuthError::ExpiredCredential => "auth.credential.expired",
            AuthError::InsufficientRole => "auth.role.insufficient",
        }
    }

    pub fn to_body(&self) -> ApiErrorResponse {
        ApiErrorResponse::new(self.code(), self.message_key())
    }

    /// 요청 정보를 포함한 거부 응답.
    pub fn into_response_for(self, method: &Method, uri: &Uri) -> Response {
        self.to_body()
            .with_request_info(method, uri)
            .into_response_with(self.status())
    }
}

impl From<AuthError> for (StatusCode, Json<ApiErrorResponse>) {
    fn from(err: AuthError) -> Self {
        (err.status(), Json(err.to_body()))
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::ExpiredCredential,
            TokenError::Invalid | TokenError::Encoding(_) => AuthError::InvalidCredential,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.to_body().into_response_with(self.status())
    }
}
