//! 필드 암호화 도구.
//!
//! 설정된 키 재료(`cipher.key_source = "configured"`)가 있어야 합니다.
//! 임시 키로 만든 값은 서버가 복호화할 수 없으므로 거부합니다.

use anyhow::{bail, Context, Result};

use gatehouse_core::{AppConfig, CipherKeyMaterial, EncryptedPayload, FieldCipher, KeySource};

fn load_cipher(config_path: &str) -> Result<FieldCipher> {
    let config = AppConfig::load(config_path)
        .with_context(|| format!("Failed to load config from {config_path}"))?;
    if config.cipher.key_source != KeySource::Configured {
        bail!("cipher.key_source must be \"configured\" to encrypt or decrypt stored values");
    }
    let material = CipherKeyMaterial::from_config(&config.cipher)?;
    Ok(FieldCipher::new(&material)?)
}

/// 평문을 `"<iv>:<ciphertext>"` 형식으로 암호화.
pub fn encrypt(config_path: &str, plaintext: &str) -> Result<String> {
    let payload = load_cipher(config_path)?.encrypt(plaintext)?;
    Ok(payload.to_compact())
}

/// `"<iv>:<ciphertext>"` 형식의 값을 복호화.
pub fn decrypt(config_path: &str, compact: &str) -> Result<String> {
    let payload: EncryptedPayload = compact.trim().parse()?;
    let plaintext = load_cipher(config_path)?
        .decrypt(&payload)
        .context("Decryption failed (wrong key or tampered value)")?;
    Ok(plaintext)
}
