//! 토큰 Claims
//!
//! Access Token과 Refresh Token은 같은 서명 방식을 쓰고, `term` 값으로만 구분됩니다.
//! 탈취된 access token을 refresh 용도로 재사용하는 것을 막기 위함입니다.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// Refresh Token 쿠키 이름
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// 토큰 용도 구분자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenTerm {
    /// Access Token (짧은 수명, 무상태 검증)
    Short,

    /// Refresh Token (긴 수명, 저장된 레코드와 대조)
    Long,
}

impl TokenTerm {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenTerm::Short => "short",
            TokenTerm::Long => "long",
        }
    }
}

impl std::fmt::Display for TokenTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 토큰 페이로드 (JWT claims)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (사용자 ID)
    pub sub: String,

    /// 용도 구분자
    pub term: TokenTerm,

    /// 발급 시각 (unix seconds)
    pub iat: i64,

    /// 만료 시각 (unix seconds)
    pub exp: i64,

    /// 토큰 고유 ID
    ///
    /// 같은 초에 두 번 발급해도 토큰 문자열이 달라지도록 보장합니다.
    pub jti: String,
}

impl TokenClaims {
    /// 새 claims 생성
    pub fn new(subject: &UserId, term: TokenTerm, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: subject.as_str().to_string(),
            term,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: ulid::Ulid::new().to_string(),
        }
    }

    pub fn subject(&self) -> UserId {
        UserId::new(self.sub.clone())
    }
}
