//! 식별자 타입
//!
//! - `UserId`: UUID v4 (토큰의 `sub` claim에 그대로 들어감)
//! - 공개키 레코드 ID: ULID (시간순 정렬 가능)

use serde::{Deserialize, Serialize};

/// 사용자 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// 기존 값으로 생성 (DB/토큰에서 읽은 값)
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// 새 랜덤 ID 생성
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// 내부 값 참조
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// 공개키 레코드 ID 생성
pub fn generate_key_id() -> String {
    ulid::Ulid::new().to_string()
}
