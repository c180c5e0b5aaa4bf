//! API 서버 설정

use std::env;

use anyhow::Context;
use chrono::Duration;
use rand::RngCore;

use gy_core::auth::{PasswordHasher, SessionPolicy, DEFAULT_COST};

/// Access token 수명 상한 (1일)
const MAX_ACCESS_TOKEN_MINUTES: i64 = 60 * 24;

/// Refresh token 수명 상한 (1년)
const MAX_REFRESH_TOKEN_MINUTES: i64 = 60 * 24 * 365;

/// API 서버 설정
#[derive(Clone)]
pub struct Config {
    /// 서버 포트
    pub port: u16,

    /// SQLite URL
    pub database_url: String,

    /// 토큰 서명 시크릿 (HMAC-SHA256)
    pub secret_key: Vec<u8>,

    /// Access token 수명 (분)
    pub access_token_expire_minutes: i64,

    /// Refresh token 수명 (분)
    pub refresh_token_expire_minutes: i64,

    /// refresh 쿠키 `Secure` 속성
    pub cookie_secure: bool,

    /// bcrypt work factor
    pub password_hash_cost: u32,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("database_url", &self.database_url)
            .field("secret_key", &"<redacted>")
            .field("access_token_expire_minutes", &self.access_token_expire_minutes)
            .field("refresh_token_expire_minutes", &self.refresh_token_expire_minutes)
            .field("cookie_secure", &self.cookie_secure)
            .field("password_hash_cost", &self.password_hash_cost)
            .finish()
    }
}

impl Config {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> anyhow::Result<Self> {
        let secret_key = match env::var("GY_SECRET_KEY") {
            Ok(secret) if !secret.trim().is_empty() => secret.into_bytes(),
            _ => {
                tracing::warn!(
                    "GY_SECRET_KEY not set; using a random key, tokens will not survive a restart"
                );
                let mut bytes = vec![0u8; 32];
                rand::thread_rng().fill_bytes(&mut bytes);
                bytes
            }
        };

        let cookie_secure = env::var("GY_COOKIE_SECURE")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);
        if !cookie_secure {
            tracing::warn!("GY_COOKIE_SECURE=false; refresh cookie will be sent over plain HTTP");
        }

        Ok(Self {
            port: env::var("GY_API_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .context("GY_API_PORT must be a port number")?,

            database_url: env::var("GY_DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://data/gityard.db".to_string()),

            secret_key,

            access_token_expire_minutes: minutes_var(
                "GY_ACCESS_TOKEN_EXPIRE_MINUTES",
                env::var("GY_ACCESS_TOKEN_EXPIRE_MINUTES").ok(),
                5,
                MAX_ACCESS_TOKEN_MINUTES,
            )?,

            refresh_token_expire_minutes: minutes_var(
                "GY_REFRESH_TOKEN_EXPIRE_MINUTES",
                env::var("GY_REFRESH_TOKEN_EXPIRE_MINUTES").ok(),
                60 * 24 * 7,
                MAX_REFRESH_TOKEN_MINUTES,
            )?,

            cookie_secure,

            password_hash_cost: env::var("GY_PASSWORD_HASH_COST")
                .unwrap_or_else(|_| DEFAULT_COST.to_string())
                .parse()
                .unwrap_or(DEFAULT_COST),
        })
    }

    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            access_ttl: Duration::minutes(self.access_token_expire_minutes),
            refresh_ttl: Duration::minutes(self.refresh_token_expire_minutes),
        }
    }

    pub fn password_hasher(&self) -> PasswordHasher {
        PasswordHasher::new(self.password_hash_cost)
    }

    /// 테스트용 설정 (낮은 bcrypt 비용)
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            port: 0,
            database_url: "sqlite::memory:".to_string(),
            secret_key: b"api-test-secret".to_vec(),
            access_token_expire_minutes: 5,
            refresh_token_expire_minutes: 60 * 24 * 7,
            cookie_secure: true,
            password_hash_cost: 4,
        }
    }
}

/// 분 단위 수명 변수 파싱 (1..=max)
fn minutes_var(name: &str, raw: Option<String>, default: i64, max: i64) -> anyhow::Result<i64> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let minutes: i64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{name} must be an integer"))?;
    if !(1..=max).contains(&minutes) {
        anyhow::bail!("{name} must be between 1 and {max}, got {minutes}");
    }
    Ok(minutes)
}
