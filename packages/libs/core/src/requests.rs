//! 요청 구조체와 사전 조건 검증
//!
//! 핸들러는 코어 로직을 호출하기 전에 `validate()`를 반드시 호출합니다.

use serde::Deserialize;

use crate::auth::MAX_PASSWORD_BYTES;
use crate::error::{Error, Result};

pub const DEFAULT_USER_NAME: &str = "unknown";
pub const MAX_NAME_LEN: usize = 255;
pub const MAX_EMAIL_LEN: usize = 255;
pub const PASSWORD_LEN: std::ops::RangeInclusive<usize> = 8..=40;
pub const KEY_NAME_LEN: std::ops::RangeInclusive<usize> = 5..=255;
pub const MAX_KEY_TEXT_LEN: usize = 2000;
pub const DEFAULT_PAGE_LIMIT: u64 = 100;
pub const MAX_PAGE_LIMIT: u64 = 100;

// ─────────────────────────────────────────────────────────────────────────────
// Signup
// ─────────────────────────────────────────────────────────────────────────────

/// 회원가입 요청
#[derive(Clone, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl SignupRequest {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            check_max_len("name", name, MAX_NAME_LEN)?;
        }
        check_email(&self.email)?;
        check_len_range("password", &self.password, PASSWORD_LEN)?;
        if self.password.len() > MAX_PASSWORD_BYTES {
            return Err(Error::validation(
                "password",
                format!("must be at most {MAX_PASSWORD_BYTES} bytes"),
            ));
        }
        Ok(())
    }

    /// 이름이 없거나 공백이면 기본값
    pub fn display_name(&self) -> &str {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => DEFAULT_USER_NAME,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Public Keys
// ─────────────────────────────────────────────────────────────────────────────

/// 공개키 등록 요청
#[derive(Debug, Clone, Deserialize)]
pub struct KeyRegistration {
    pub name: String,
    pub full_text: String,
}

impl KeyRegistration {
    pub fn validate(&self) -> Result<()> {
        check_len_range("name", self.name.trim(), KEY_NAME_LEN)?;
        check_max_len("full_text", &self.full_text, MAX_KEY_TEXT_LEN)
    }
}

/// 공개키 삭제 요청
#[derive(Debug, Clone, Deserialize)]
pub struct KeyDeletion {
    pub fingerprint: String,
}

/// 목록 페이지 파라미터
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub skip: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
}

impl PageQuery {
    /// (offset, limit), limit은 1..=MAX_PAGE_LIMIT로 보정
    pub fn resolve(&self) -> (u64, u64) {
        let offset = self.skip.unwrap_or(0);
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT);
        (offset, limit)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Checks
// ─────────────────────────────────────────────────────────────────────────────

fn check_max_len(field: &'static str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(Error::validation(field, format!("must be at most {max} characters")));
    }
    Ok(())
}

fn check_len_range(
    field: &'static str,
    value: &str,
    range: std::ops::RangeInclusive<usize>,
) -> Result<()> {
    if !range.contains(&value.chars().count()) {
        return Err(Error::validation(
            field,
            format!(
                "must be between {} and {} characters",
                range.start(),
                range.end()
            ),
        ));
    }
    Ok(())
}

fn check_email(email: &str) -> Result<()> {
    check_max_len("email", email, MAX_EMAIL_LEN)?;

    let invalid = || Error::validation("email", "not a valid email address");
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }
    Ok(())
}
