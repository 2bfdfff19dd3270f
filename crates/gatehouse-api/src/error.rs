//! 통합 API 에러 응답 타입.
//!
//! 모든 거부 응답은 기계가 읽을 수 있는 `code`와, 호출자가 현지화할 수 있는
//! 메시지 키(`message_key`)를 가집니다. 포맷된 문장은 보내지 않습니다.
//!
//! ```json
//! {
//!   "code": "MISSING_CREDENTIAL",
//!   "message_key": "auth.credential.missing",
//!   "timestamp": 1738300800,
//!   "method": "GET",
//!   "path": "/api/v1/auth/me"
//! }
//! ```

use axum::{
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 통합 API 에러 응답.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "INVALID_CREDENTIAL")
    pub code: String,
    /// 현지화용 메시지 키 (예: "auth.credential.invalid")
    pub message_key: String,
    /// 추가 에러 상세 정보
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// HTTP 메서드
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// 요청 경로
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    pub fn new(code: impl Into<String>, message_key: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message_key: message_key.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
            method: None,
            path: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// 요청 정보(메서드, 경로)를 추가합니다.
    #[must_use]
    pub fn with_request_info(mut self, method: &Method, uri: &Uri) -> Self {
        self.method = Some(method.to_string());
        self.path = Some(uri.path().to_string());
        self
    }

    /// 상태 코드와 함께 응답으로 변환.
    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message_key)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiErrorResponse>)>;

/// 내부 에러를 500 응답으로 변환 (원인은 로그에만 남김).
pub fn internal_error(err: impl std::fmt::Display) -> (StatusCode, Json<ApiErrorResponse>) {
    tracing::error!(error = %err, "Internal error while handling request");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiErrorResponse::new("INTERNAL_ERROR", "error.internal")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_response_new() {
        let error = ApiErrorResponse::new("TEST_ERROR", "test.key");
        assert_eq!(error.code, "TEST_ERROR");
        assert_eq!(error.message_key, "test.key");
        assert!(error.timestamp.is_some());
        assert!(error.details.is_none());
        assert!(error.method.is_none());
    }

    #[test]
    fn test_with_request_info() {
        let uri: Uri = "/api/v1/auth/me?x=1".parse().unwrap();
        let error = ApiErrorResponse::new("CODE", "key").with_request_info(&Method::GET, &uri);
        assert_eq!(error.method.as_deref(), Some("GET"));
        assert_eq!(error.path.as_deref(), Some("/api/v1/auth/me"));
    }

    #[test]
    fn test_json_skips_empty_fields() {
        let error = ApiErrorResponse::new("CODE", "key");
        let json = serde_json::to_value(&error).unwrap();
        assert!(json.get("details").is_none());
        assert!(json.get("path").is_none());
        assert_eq!(json["message_key"], "key");
    }

    #[test]
    fn test_internal_error_hides_cause() {
        let (status, Json(body)) = internal_error("db password leaked in message");
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.code, "INTERNAL_ERROR");
        assert!(!body.to_string().contains("password"));
    }
}
