//! # 필드 암호화 모듈
//!
//! AES-256-GCM을 사용한 필드 단위 암호화/복호화 기능을 제공합니다.
//!
//! ## 키 재료
//! - [`CipherKeyMaterial`]은 프로세스 시작 시 한 번 생성(또는 설정에서 로드)되며
//!   이후 읽기 전용으로 모든 암호화 호출에서 공유됩니다.
//! - 키 재료의 `iv`는 모든 암호문에 associated data로 바인딩됩니다.
//!   다른 키 재료 인스턴스로는 복호화되지 않습니다.
//! - 임시(ephemeral) 키로 암호화한 데이터는 프로세스 재시작 후 복구할 수 없습니다.
//!   데이터를 보존하려면 키 재료를 외부에 저장하고 `configured` 소스로 로드해야 합니다.
//!
//! ## 암호문
//! - 매 암호화마다 고유한 nonce (12바이트)를 생성하여 [`EncryptedPayload::iv`]로 반환
//! - `iv`와 `ciphertext`는 하나의 단위로만 저장/전송

use std::fmt;
use std::str::FromStr;

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng, Payload},
    Aes256Gcm, Nonce,
};
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{CipherConfig, KeySource};

/// 암호화 에러
#[derive(Error, Debug)]
pub enum CipherError {
    /// 키 재료를 준비할 수 없음 (시작 시 치명적)
    #[error("Encryption key unavailable: {0}")]
    KeyUnavailable(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// 잘못된 형식이거나 현재 키로 복구할 수 없는 페이로드
    #[error("Decryption failed: {0}")]
    Decryption(String),
}

impl CipherError {
    /// 복호화 실패 여부.
    ///
    /// 호출자가 "값 없음"으로 취급할지 결정할 때 사용합니다.
    pub fn is_decryption(&self) -> bool {
        matches!(self, CipherError::Decryption(_))
    }
}

/// AES-256-GCM nonce 크기 (바이트)
pub const IV_SIZE: usize = 12;

/// AES-256 키 크기 (바이트)
pub const KEY_SIZE: usize = 32;

const B64: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

/// 프로세스 전역 암호화 키 재료.
///
/// 컴포지션 루트에서 한 번 만들어 [`FieldCipher`]에 참조로 전달합니다.
/// 호출마다 다시 생성하지 않습니다.
#[derive(Clone)]
pub struct CipherKeyMaterial {
    key: [u8; KEY_SIZE],
    iv: [u8; IV_SIZE],
}

impl CipherKeyMaterial {
    /// 새로운 랜덤 키 재료 생성.
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        let mut iv = [0u8; IV_SIZE];
        OsRng.fill_bytes(&mut key);
        OsRng.fill_bytes(&mut iv);
        Self { key, iv }
    }

    /// Base64로 인코딩된 키/iv에서 키 재료 생성.
    pub fn from_base64(key: &str, iv: &str) -> Result<Self, CipherError> {
        let key_bytes = B64
            .decode(key.trim())
            .map_err(|e| CipherError::KeyUnavailable(format!("key is not valid base64: {e}")))?;
        let iv_bytes = B64
            .decode(iv.trim())
            .map_err(|e| CipherError::KeyUnavailable(format!("iv is not valid base64: {e}")))?;

        let key: [u8; KEY_SIZE] = key_bytes.as_slice().try_into().map_err(|_| {
            CipherError::KeyUnavailable(format!(
                "expected {KEY_SIZE} byte key, got {}",
                key_bytes.len()
            ))
        })?;
        let iv: [u8; IV_SIZE] = iv_bytes.as_slice().try_into().map_err(|_| {
            CipherError::KeyUnavailable(format!(
                "expected {IV_SIZE} byte iv, got {}",
                iv_bytes.len()
            ))
        })?;

        Ok(Self { key, iv })
    }

    /// 설정의 키 소스에 따라 키 재료 준비.
    ///
    /// `ephemeral`이면 새로 생성하고, `configured`이면 설정된 값을 로드합니다.
    pub fn from_config(config: &CipherConfig) -> Result<Self, CipherError> {
        use secrecy::ExposeSecret;

        match config.key_source {
            KeySource::Ephemeral => {
                tracing::warn!(
                    "Using ephemeral cipher key material; encrypted fields will not survive a restart"
                );
                Ok(Self::generate())
            }
            KeySource::Configured => {
                let key = config.key.as_ref().ok_or_else(|| {
                    CipherError::KeyUnavailable("cipher.key is not configured".to_string())
                })?;
                let iv = config.iv.as_deref().ok_or_else(|| {
                    CipherError::KeyUnavailable("cipher.iv is not configured".to_string())
                })?;
                Self::from_base64(key.expose_secret(), iv)
            }
        }
    }

    /// Base64 인코딩된 `(key, iv)` 반환 (키 저장/배포용).
    pub fn to_base64(&self) -> (String, String) {
        (B64.encode(self.key), B64.encode(self.iv))
    }

    /// 프로세스 iv.
    pub fn iv(&self) -> &[u8; IV_SIZE] {
        &self.iv
    }
}

impl fmt::Debug for CipherKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherKeyMaterial")
            .field("key", &"[REDACTED]")
            .field("iv", &B64.encode(self.iv))
            .finish()
    }
}

/// 암호화된 필드 값.
///
/// `iv`와 `ciphertext`는 분리할 수 없는 하나의 단위입니다.
/// JSON에서는 두 필드 모두 Base64 문자열로 직렬화됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    #[serde(with = "base64_bytes")]
    pub iv: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub ciphertext: Vec<u8>,
}

impl EncryptedPayload {
    /// 단일 컬럼 저장용 `"<iv>:<ciphertext>"` 형식.
    pub fn to_compact(&self) -> String {
        format!("{}:{}", B64.encode(&self.iv), B64.encode(&self.ciphertext))
    }
}

impl fmt::Display for EncryptedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_compact())
    }
}

impl FromStr for EncryptedPayload {
    type Err = CipherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (iv, ciphertext) = s
            .split_once(':')
            .ok_or_else(|| CipherError::Decryption("missing iv separator".to_string()))?;

        let iv = B64
            .decode(iv)
            .map_err(|e| CipherError::Decryption(format!("iv is not valid base64: {e}")))?;
        let ciphertext = B64
            .decode(ciphertext)
            .map_err(|e| CipherError::Decryption(format!("ciphertext is not valid base64: {e}")))?;

        Ok(Self { iv, ciphertext })
    }
}

mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::B64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::B64.decode(s).map_err(serde::de::Error::custom)
    }
}

/// 필드 암호화기.
///
/// 키 재료는 생성 시점에 고정되며 이후 읽기 전용입니다.
/// `Clone`은 내부 cipher 상태를 복사할 뿐 키를 다시 만들지 않습니다.
#[derive(Clone)]
pub struct FieldCipher {
    cipher: Aes256Gcm,
    aad: [u8; IV_SIZE],
}

impl FieldCipher {
    /// 키 재료로 암호화기 생성
    pub fn new(material: &CipherKeyMaterial) -> Result<Self, CipherError> {
        let cipher = Aes256Gcm::new_from_slice(&material.key)
            .map_err(|e| CipherError::KeyUnavailable(e.to_string()))?;

        Ok(Self {
            cipher,
            aad: material.iv,
        })
    }

    /// 랜덤 nonce 생성
    fn generate_iv() -> [u8; IV_SIZE] {
        let mut iv = [0u8; IV_SIZE];
        OsRng.fill_bytes(&mut iv);
        iv
    }

    /// 문자열 암호화
    pub fn encrypt(&self, plaintext: &str) -> Result<EncryptedPayload, CipherError> {
        let iv = Self::generate_iv();

        let ciphertext = self
            .cipher
            .encrypt(
                Nonce::from_slice(&iv),
                Payload {
                    msg: plaintext.as_bytes(),
                    aad: &self.aad,
                },
            )
            .map_err(|e| CipherError::Encryption(e.to_string()))?;

        Ok(EncryptedPayload {
            iv: iv.to_vec(),
            ciphertext,
        })
    }

    /// 암호화된 데이터 복호화
    ///
    /// 같은 키 재료 인스턴스로 만든 페이로드만 복호화됩니다.
    pub fn decrypt(&self, payload: &EncryptedPayload) -> Result<String, CipherError> {
        if payload.iv.len() != IV_SIZE {
            return Err(CipherError::Decryption(format!(
                "expected {IV_SIZE} byte iv, got {}",
                payload.iv.len()
            )));
        }

        let plaintext = self
            .cipher
            .decrypt(
                Nonce::from_slice(&payload.iv),
                Payload {
                    msg: &payload.ciphertext,
                    aad: &self.aad,
                },
            )
            .map_err(|_| {
                CipherError::Decryption("authentication failed under current key".to_string())
            })?;

        String::from_utf8(plaintext)
            .map_err(|e| CipherError::Decryption(format!("plaintext is not UTF-8: {e}")))
    }

    /// JSON 암호화 (구조화된 필드용)
    pub fn encrypt_json<T: Serialize>(&self, data: &T) -> Result<EncryptedPayload, CipherError> {
        let json = serde_json::to_string(data).map_err(|e| CipherError::Encryption(e.to_string()))?;
        self.encrypt(&json)
    }

    /// 암호화된 JSON 복호화
    pub fn decrypt_json<T: serde::de::DeserializeOwned>(
        &self,
        payload: &EncryptedPayload,
    ) -> Result<T, CipherError> {
        let json = self.decrypt(payload)?;
        serde_json::from_str(&json).map_err(|e| CipherError::Decryption(e.to_string()))
    }
}

impl fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldCipher").finish_non_exhaustive()
    }
}

/// 토큰 서명용 랜덤 비밀 값 (URL-safe Base64, 패딩 없음).
pub fn generate_secret(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buf);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf)
}
