//! Gatehouse 운영 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 암호화 키와 서명 비밀 생성 (.env 형식)
//! gatehouse keygen --with-secrets
//!
//! # 초기 사용자용 비밀번호 해시
//! gatehouse hash-password --password 'Password123'
//!
//! # 운영 점검용 토큰 발급 및 검사
//! gatehouse token issue --subject ops --role admin
//! gatehouse token inspect <ACCESS_TOKEN>
//!
//! # 저장된 암호화 필드 확인
//! gatehouse decrypt 'AAAA...:BBBB...'
//! ```

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use gatehouse_cli::commands::{cipher, keygen, password, token};
use gatehouse_core::{init_logging, LogConfig};

#[derive(Parser)]
#[command(name = "gatehouse")]
#[command(about = "Gatehouse CLI - 키, 비밀번호 해시, 토큰 관리 도구", long_about = None)]
#[command(version)]
struct Cli {
    /// 로그 레벨
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 필드 암호화 키 재료 생성
    Keygen {
        /// 출력 형식 (env, toml)
        #[arg(short, long, default_value = "env")]
        format: String,

        /// Access/Refresh 토큰 서명 비밀도 생성
        #[arg(long)]
        with_secrets: bool,
    },

    /// Argon2id 비밀번호 해시 생성 (bootstrap_users의 password_hash 값)
    HashPassword {
        #[arg(short, long)]
        password: String,

        /// 강도 검증 생략
        #[arg(long)]
        skip_strength_check: bool,
    },

    /// 비밀번호와 저장된 해시 비교
    VerifyPassword {
        /// PHC 형식 해시
        #[arg(long)]
        hash: String,

        #[arg(short, long)]
        password: String,
    },

    /// 토큰 발급/검사
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// 값 암호화 (설정된 키 필요)
    Encrypt {
        value: String,

        #[arg(short, long, default_value = "config/default.toml")]
        config: String,
    },

    /// `<iv>:<ciphertext>` 값 복호화 (설정된 키 필요)
    Decrypt {
        payload: String,

        #[arg(short, long, default_value = "config/default.toml")]
        config: String,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// 토큰 쌍 발급
    Issue {
        /// 주체 ID
        #[arg(short, long)]
        subject: String,

        /// 역할 (여러 번 지정 가능)
        #[arg(short, long = "role")]
        roles: Vec<String>,

        #[arg(short, long, default_value = "config/default.toml")]
        config: String,
    },

    /// 토큰 서명/만료 검사
    Inspect {
        token: String,

        /// Refresh Token으로 검사
        #[arg(long)]
        refresh: bool,

        #[arg(short, long, default_value = "config/default.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(LogConfig::new(cli.log_level.clone())).map_err(|e| anyhow!(e.to_string()))?;

    match cli.command {
        Commands::Keygen {
            format,
            with_secrets,
        } => {
            let format = keygen::KeyFormat::parse(&format)?;
            let keys = keygen::generate(with_secrets);
            print!("{}", keygen::render(&keys, format));
        }

        Commands::HashPassword {
            password,
            skip_strength_check,
        } => {
            println!("{}", password::hash(&password, skip_strength_check)?);
        }

        Commands::VerifyPassword { hash, password } => {
            password::verify(&hash, &password)?;
            println!("Password matches");
        }

        Commands::Token { action } => match action {
            TokenAction::Issue {
                subject,
                roles,
                config,
            } => {
                let pair = token::issue(&config, &subject, &roles).await?;
                info!(subject = %pair.subject_id, "Issued token pair");
                println!("{}", serde_json::to_string_pretty(&pair)?);
            }
            TokenAction::Inspect {
                token: raw,
                refresh,
                config,
            } => {
                let kind = if refresh {
                    token::TokenKind::Refresh
                } else {
                    token::TokenKind::Access
                };
                let report = token::inspect(&config, &raw, kind)?;
                println!("{}", serde_json::to_string_pretty(&report)?);
                if !report.valid {
                    std::process::exit(1);
                }
            }
        },

        Commands::Encrypt { value, config } => {
            println!("{}", cipher::encrypt(&config, &value)?);
        }

        Commands::Decrypt { payload, config } => {
            println!("{}", cipher::decrypt(&config, &payload)?);
        }
    }

    Ok(())
}
