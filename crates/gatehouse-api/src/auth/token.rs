//! 토큰 서비스.
//!
//! Access/Refresh 토큰 쌍의 발급, 검증, 교체(rotation), 폐기.
//!
//! 두 토큰은 서로 다른 비밀 키와 만료 시간을 사용합니다. 유출된 Access Token으로는
//! 새 세션을 만들 수 없고, Refresh Token은 교체 엔드포인트에서만 사용됩니다.
//!
//! Refresh Token은 일회용입니다. 교체에 사용된 토큰은 [`RefreshTokenRegistry`]에서
//! `Rotated` 상태가 되며 다시 제시하면 `InvalidCredential`로 거부됩니다.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use gatehouse_core::AuthConfig;

use super::identity::{Identity, Role, RoleClaim};

const ACCESS_TOKEN_TYPE: &str = "access";
const REFRESH_TOKEN_TYPE: &str = "refresh";

/// JWT 페이로드 (Access/Refresh 공통).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject - 사용자 ID
    pub sub: String,
    /// 역할 (문자열 또는 배열)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<RoleClaim>,
    /// Issued At (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// JWT ID
    pub jti: String,
    /// "access" | "refresh"
    pub token_type: String,
}

impl TokenClaims {
    fn identity(&self) -> Identity {
        Identity::from_claim(self.sub.clone(), self.role.as_ref())
    }
}

/// Access Token + Refresh Token 쌍.
///
/// 두 토큰은 항상 같은 주체와 발급 시각을 공유하며 함께 발급됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// 항상 "Bearer"
    pub token_type: String,
    /// 발급 시각 (Unix timestamp)
    pub issued_at: i64,
    /// Access Token 만료 시각 (Unix timestamp)
    pub access_expires_at: i64,
    /// Refresh Token 만료 시각 (Unix timestamp)
    pub refresh_expires_at: i64,
    /// Access Token 유효 기간 (초)
    pub expires_in: i64,
    pub subject_id: String,
    pub roles: BTreeSet<Role>,
}

/// 토큰 에러.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("토큰 인코딩 실패: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
    #[error("토큰이 만료되었습니다")]
    Expired,
    #[error("유효하지 않은 토큰")]
    Invalid,
}

/// Access Token 검증기.
///
/// Guard Chain은 이 trait을 통해서만 토큰 서비스에 접근합니다.
pub trait AccessTokenVerifier: Send + Sync {
    fn verify_access(&self, token: &str) -> Result<Identity, TokenError>;
}

/// Refresh Token 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    /// 발급되어 사용 가능
    Active,
    /// 교체에 사용됨
    Rotated,
    /// 로그아웃 등으로 폐기됨
    Revoked,
    /// 만료됨 (정리 전)
    Expired,
    /// 기록 없음 (정리되었거나 이 프로세스가 발급하지 않음)
    Unknown,
}

#[derive(Debug)]
struct RefreshEntry {
    subject: String,
    expires_at: i64,
    state: RefreshState,
}

/// 발급된 Refresh Token의 jti 기록.
///
/// 사용된/폐기된 항목도 만료 전까지 남겨 재사용 시도를 구분합니다.
#[derive(Debug, Default)]
pub struct RefreshTokenRegistry {
    entries: RwLock<HashMap<String, RefreshEntry>>,
}

impl RefreshTokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    async fn register(&self, jti: String, subject: String, expires_at: i64) {
        self.entries.write().await.insert(
            jti,
            RefreshEntry {
                subject,
                expires_at,
                state: RefreshState::Active,
            },
        );
    }

    /// 현재 상태 조회.
    pub async fn state(&self, jti: &str) -> RefreshState {
        let entries = self.entries.read().await;
        match entries.get(jti) {
            None => RefreshState::Unknown,
            Some(entry) if entry.state == RefreshState::Active
                && entry.expires_at < Utc::now().timestamp() =>
            {
                RefreshState::Expired
            }
            Some(entry) => entry.state,
        }
    }

    /// `Active` 항목을 `next` 상태로 전환.
    ///
    /// 확인과 전환은 하나의 쓰기 잠금 안에서 일어나므로 같은 토큰의
    /// 동시 교체 중 하나만 성공합니다. 실패 시 현재 상태를 반환합니다.
    async fn transition(&self, jti: &str, next: RefreshState) -> Result<(), RefreshState> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(jti) {
            Some(entry) if entry.state == RefreshState::Active => {
                entry.state = next;
                Ok(())
            }
            Some(entry) => Err(entry.state),
            None => Err(RefreshState::Unknown),
        }
    }

    /// 주체의 모든 활성 토큰 폐기. 폐기된 개수 반환.
    pub async fn revoke_subject(&self, subject: &str) -> usize {
        let mut entries = self.entries.write().await;
        let mut revoked = 0;
        for entry in entries.values_mut() {
            if entry.subject == subject && entry.state == RefreshState::Active {
                entry.state = RefreshState::Revoked;
                revoked += 1;
            }
        }
        revoked
    }

    /// 만료된 항목 정리. 정리된 개수 반환.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        let now = now.timestamp();
        entries.retain(|_, entry| entry.expires_at >= now);
        before - entries.len()
    }

    /// 현재 추적 중인 항목 수.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    token_type: &'static str,
}

impl TokenKeys {
    fn new(secret: &[u8], ttl: Duration, token_type: &'static str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
            token_type,
        }
    }

    fn sign(&self, identity: &Identity, issued_at: i64) -> Result<(String, TokenClaims), TokenError> {
        let claims = TokenClaims {
            sub: identity.subject_id.clone(),
            role: Some(identity.role_claim()),
            iat: issued_at,
            exp: issued_at + self.ttl.num_seconds(),
            jti: uuid::Uuid::new_v4().to_string(),
            token_type: self.token_type.to_string(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok((token, claims))
    }

    fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<TokenClaims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;

        if data.claims.token_type != self.token_type {
            return Err(TokenError::Invalid);
        }
        Ok(data.claims)
    }
}

/// 토큰 서비스.
///
/// 서명 키는 생성 후 읽기 전용입니다. 변경 가능한 공유 상태는
/// Refresh Token 기록뿐입니다.
pub struct TokenService {
    access: TokenKeys,
    refresh: TokenKeys,
    registry: RefreshTokenRegistry,
}

impl TokenService {
    /// 새로운 토큰 서비스 생성.
    ///
    /// # Arguments
    ///
    /// * `access_secret` / `access_ttl` - Access Token 서명 키와 유효 기간
    /// * `refresh_secret` / `refresh_ttl` - Refresh Token 서명 키와 유효 기간
    pub fn new(
        access_secret: &[u8],
        access_ttl: Duration,
        refresh_secret: &[u8],
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            access: TokenKeys::new(access_secret, access_ttl, ACCESS_TOKEN_TYPE),
            refresh: TokenKeys::new(refresh_secret, refresh_ttl, REFRESH_TOKEN_TYPE),
            registry: RefreshTokenRegistry::new(),
        }
    }

    /// 설정에서 토큰 서비스 생성.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.access_secret.expose_secret().as_bytes(),
            Duration::minutes(config.access_expiry_minutes),
            config.refresh_secret.expose_secret().as_bytes(),
            Duration::days(config.refresh_expiry_days),
        )
    }

    /// 현재 시각 기준으로 토큰 쌍 발급.
    pub async fn issue(&self, identity: &Identity) -> Result<TokenPair, TokenError> {
        self.issue_at(identity, Utc::now()).await
    }

    /// 지정한 발급 시각으로 토큰 쌍 발급.
    ///
    /// 두 토큰은 같은 `iat`를 공유합니다.
    pub async fn issue_at(
        &self,
        identity: &Identity,
        issued_at: DateTime<Utc>,
    ) -> Result<TokenPair, TokenError> {
        let iat = issued_at.timestamp();
        let (access_token, access_claims) = self.access.sign(identity, iat)?;
        let (refresh_token, refresh_claims) = self.refresh.sign(identity, iat)?;

        self.registry
            .register(
                refresh_claims.jti,
                identity.subject_id.clone(),
                refresh_claims.exp,
            )
            .await;

        tracing::debug!(subject = %identity.subject_id, "Issued token pair");

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            issued_at: iat,
            access_expires_at: access_claims.exp,
            refresh_expires_at: refresh_claims.exp,
            expires_in: self.access.ttl.num_seconds(),
            subject_id: identity.subject_id.clone(),
            roles: identity.roles.clone(),
        })
    }

    /// Access Token 검증.
    ///
    /// 요청이 Identity를 얻는 유일한 경로입니다.
    pub fn verify_access(&self, token: &str) -> Result<Identity, TokenError> {
        self.access.verify(token).map(|claims| claims.identity())
    }

    /// Refresh Token 서명/만료 검증.
    ///
    /// 일회용 여부는 확인하지 않습니다. 교체는 [`TokenService::rotate`]를 사용합니다.
    pub fn verify_refresh(&self, token: &str) -> Result<Identity, TokenError> {
        self.refresh.verify(token).map(|claims| claims.identity())
    }

    /// Refresh Token으로 새 토큰 쌍 발급.
    ///
    /// 기존 Refresh Token은 이 호출 이후 재사용할 수 없습니다.
    pub async fn rotate(&self, refresh_token: &str) -> Result<TokenPair, TokenError> {
        let claims = self.refresh.verify(refresh_token)?;

        if let Err(state) = self
            .registry
            .transition(&claims.jti, RefreshState::Rotated)
            .await
        {
            tracing::warn!(
                subject = %claims.sub,
                jti = %claims.jti,
                state = ?state,
                "Rejected refresh token that is no longer active"
            );
            return Err(TokenError::Invalid);
        }

        self.issue(&claims.identity()).await
    }

    /// 주체 본인의 Refresh Token 하나를 폐기 (로그아웃).
    ///
    /// 다른 주체의 토큰이거나 이미 사용/폐기된 토큰이면 `Invalid`.
    pub async fn revoke(&self, refresh_token: &str, subject_id: &str) -> Result<(), TokenError> {
        let claims = self.refresh.verify(refresh_token)?;
        if claims.sub != subject_id {
            return Err(TokenError::Invalid);
        }
        self.registry
            .transition(&claims.jti, RefreshState::Revoked)
            .await
            .map_err(|_| TokenError::Invalid)
    }

    /// 주체의 모든 활성 Refresh Token 폐기.
    pub async fn revoke_subject(&self, subject_id: &str) -> usize {
        self.registry.revoke_subject(subject_id).await
    }

    /// 만료된 Refresh Token 기록 정리.
    pub async fn purge_expired(&self) -> usize {
        self.registry.purge_expired(Utc::now()).await
    }

    pub fn registry(&self) -> &RefreshTokenRegistry {
        &self.registry
    }

    /// Refresh Token의 현재 상태. 교체 거부 사유 분류에 사용합니다.
    pub async fn refresh_state(&self, refresh_token: &str) -> Result<RefreshState, TokenError> {
        let claims = match self.refresh.verify(refresh_token) {
            Err(TokenError::Expired) => return Ok(RefreshState::Expired),
            other => other?,
        };
        Ok(self.registry.state(&claims.jti).await)
    }
}

impl AccessTokenVerifier for TokenService {
    fn verify_access(&self, token: &str) -> Result<Identity, TokenError> {
        TokenService::verify_access(self, token)
    }
}
