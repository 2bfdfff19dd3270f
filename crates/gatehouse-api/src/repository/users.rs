//! 사용자 디렉터리.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use secrecy::ExposeSecret;
use tokio::sync::RwLock;

use gatehouse_core::{BootstrapUser, CipherError, EncryptedPayload, FieldCipher};

use crate::auth::{hash_password, validate_password_strength, HashedSecret, Identity, PasswordError, Role};

/// 사용자 레코드.
///
/// 비밀번호는 해시로만, 이메일은 필드 암호화된 상태로만 보관합니다.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub password_hash: HashedSecret,
    pub roles: BTreeSet<Role>,
    pub email: Option<EncryptedPayload>,
}

impl UserRecord {
    /// 토큰 발급용 Identity.
    pub fn identity(&self) -> Identity {
        Identity::with_roles(self.id.clone(), self.roles.iter().copied())
    }
}

/// 사용자 조회 인터페이스.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Option<UserRecord>;

    async fn find_by_id(&self, id: &str) -> Option<UserRecord>;
}

/// 초기 사용자 등록 에러.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("알 수 없는 역할 '{role}' (사용자: {username})")]
    UnknownRole { username: String, role: String },
    #[error("중복된 사용자 이름: {0}")]
    DuplicateUsername(String),
    #[error("password와 password_hash 중 정확히 하나가 필요합니다 (사용자: {0})")]
    PasswordSource(String),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Cipher(#[from] CipherError),
}

/// 메모리 기반 사용자 디렉터리.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 사용자 추가. 같은 이름이 있으면 에러.
    pub async fn insert(&self, record: UserRecord) -> Result<(), SeedError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == record.username) {
            return Err(SeedError::DuplicateUsername(record.username));
        }
        users.insert(record.id.clone(), record);
        Ok(())
    }

    /// 설정의 초기 사용자 등록.
    ///
    /// 평문 비밀번호는 해싱하고, 미리 만든 해시는 PHC 형식만 확인합니다.
    /// 이메일은 `cipher`로 암호화합니다.
    pub async fn seed(
        &self,
        bootstrap: &[BootstrapUser],
        cipher: &FieldCipher,
    ) -> Result<usize, SeedError> {
        for user in bootstrap {
            let roles = user
                .roles
                .iter()
                .map(|name| {
                    Role::parse(name).ok_or_else(|| SeedError::UnknownRole {
                        username: user.username.clone(),
                        role: name.clone(),
                    })
                })
                .collect::<Result<BTreeSet<_>, _>>()?;

            let password_hash = match (&user.password, &user.password_hash) {
                (Some(password), None) => {
                    let password = password.expose_secret();
                    if let Err(e) = validate_password_strength(password) {
                        tracing::warn!(username = %user.username, reason = %e, "Bootstrap user has a weak password");
                    }
                    hash_password(password)?
                }
                (None, Some(phc)) => HashedSecret::parse(phc)?,
                _ => return Err(SeedError::PasswordSource(user.username.clone())),
            };

            let email = user
                .email
                .as_deref()
                .map(|email| cipher.encrypt(email))
                .transpose()?;

            self.insert(UserRecord {
                id: uuid::Uuid::new_v4().to_string(),
                username: user.username.clone(),
                password_hash,
                roles,
                email,
            })
            .await?;
        }

        Ok(bootstrap.len())
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_username(&self, username: &str) -> Option<UserRecord> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned()
    }

    async fn find_by_id(&self, id: &str) -> Option<UserRecord> {
        self.users.read().await.get(id).cloned()
    }
}
