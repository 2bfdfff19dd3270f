//! 키 재료 생성.

use gatehouse_core::{generate_secret, CipherKeyMaterial};

/// 서명 비밀 길이 (바이트)
const SECRET_BYTES: usize = 48;

/// 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFormat {
    /// `.env`용 `GATEHOUSE__...=...` 줄
    Env,
    /// `config/*.toml`용 섹션
    Toml,
}

impl KeyFormat {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "env" => Ok(Self::Env),
            "toml" => Ok(Self::Toml),
            _ => Err(anyhow::anyhow!("Invalid format: {}. Use: env, toml", s)),
        }
    }
}

/// 생성된 키 묶음.
#[derive(Debug)]
pub struct GeneratedKeys {
    pub cipher_key: String,
    pub cipher_iv: String,
    pub access_secret: Option<String>,
    pub refresh_secret: Option<String>,
}

/// 새 암호화 키 재료를 만들고, 요청하면 토큰 서명 비밀도 함께 만듭니다.
pub fn generate(with_secrets: bool) -> GeneratedKeys {
    let (cipher_key, cipher_iv) = CipherKeyMaterial::generate().to_base64();
    let (access_secret, refresh_secret) = if with_secrets {
        (Some(generate_secret(SECRET_BYTES)), Some(generate_secret(SECRET_BYTES)))
    } else {
        (None, None)
    };

    GeneratedKeys {
        cipher_key,
        cipher_iv,
        access_secret,
        refresh_secret,
    }
}

/// 형식에 맞게 렌더링.
pub fn render(keys: &GeneratedKeys, format: KeyFormat) -> String {
    let mut out = String::new();
    match format {
        KeyFormat::Env => {
            out.push_str("GATEHOUSE__CIPHER__KEY_SOURCE=configured\n");
            out.push_str(&format!("GATEHOUSE__CIPHER__KEY={}\n", keys.cipher_key));
            out.push_str(&format!("GATEHOUSE__CIPHER__IV={}\n", keys.cipher_iv));
            if let (Some(access), Some(refresh)) = (&keys.access_secret, &keys.refresh_secret) {
                out.push_str(&format!("GATEHOUSE__AUTH__ACCESS_SECRET={access}\n"));
                out.push_str(&format!("GATEHOUSE__AUTH__REFRESH_SECRET={refresh}\n"));
            }
        }
        KeyFormat::Toml => {
            if let (Some(access), Some(refresh)) = (&keys.access_secret, &keys.refresh_secret) {
                out.push_str("[auth]\n");
                out.push_str(&format!("access_secret = \"{access}\"\n"));
                out.push_str(&format!("refresh_secret = \"{refresh}\"\n\n"));
            }
            out.push_str("[cipher]\n");
            out.push_str("key_source = \"configured\"\n");
            out.push_str(&format!("key = \"{}\"\n", keys.cipher_key));
            out.push_str(&format!("iv = \"{}\"\n", keys.cipher_iv));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_material_loads_back() {
        let keys = generate(false);
        assert!(CipherKeyMaterial::from_base64(&keys.cipher_key, &keys.cipher_iv).is_ok());
        assert!(keys.access_secret.is_none());
    }

    #[test]
    fn test_render_env() {
        let keys = generate(true);
        let env = render(&keys, KeyFormat::Env);
        assert!(env.contains("GATEHOUSE__CIPHER__KEY_SOURCE=configured"));
        assert!(env.contains("GATEHOUSE__AUTH__ACCESS_SECRET="));
        assert_eq!(env.lines().count(), 5);
        assert_ne!(keys.access_secret, keys.refresh_secret);
    }

    #[test]
    fn test_render_toml_without_secrets() {
        let toml = render(&generate(false), KeyFormat::Toml);
        assert!(toml.starts_with("[cipher]"));
        assert!(!toml.contains("[auth]"));
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(KeyFormat::parse("ENV").unwrap(), KeyFormat::Env);
        assert!(KeyFormat::parse("yaml").is_err());
    }
}
