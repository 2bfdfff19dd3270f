//! 비밀번호 해시 도구.
//!
//! `hash` 출력은 `auth.bootstrap_users[].password_hash`에 그대로 넣을 수 있습니다.

use anyhow::{bail, Context, Result};

use gatehouse_api::auth::{hash_password, validate_password_strength, verify_password, HashedSecret};

/// 비밀번호 해시 생성.
///
/// `skip_strength_check`가 아니면 강도 검증을 먼저 수행합니다.
pub fn hash(password: &str, skip_strength_check: bool) -> Result<String> {
    if !skip_strength_check {
        validate_password_strength(password).context("Password rejected")?;
    }
    let hashed = hash_password(password).context("Failed to hash password")?;
    Ok(hashed.as_str().to_string())
}

/// 저장된 해시와 비밀번호 비교. 불일치는 에러입니다.
pub fn verify(stored_hash: &str, password: &str) -> Result<()> {
    let stored = HashedSecret::parse(stored_hash).context("Stored hash is not a PHC string")?;
    if verify_password(&stored, password) {
        Ok(())
    } else {
        bail!("Password does not match")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let phc = hash("Password123", false).unwrap();
        assert!(phc.starts_with("$argon2"));
        assert!(verify(&phc, "Password123").is_ok());
        assert!(verify(&phc, "Password124").is_err());
        assert!(verify("Password123", "Password123").is_err());
    }

    #[test]
    fn test_hash_is_accepted_as_bootstrap_hash() {
        let phc = hash("Password123", false).unwrap();
        let stored = HashedSecret::parse(&phc).unwrap();
        assert!(verify_password(&stored, "Password123"));
    }

    #[test]
    fn test_strength_check() {
        assert!(hash("short", false).is_err());
        assert!(hash("short", true).is_ok());
    }
}
