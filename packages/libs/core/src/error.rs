//! 공통 에러 타입
//!
//! 인증/키 등록 흐름에서 발생하는 모든 실패를 하나의 enum으로 표현합니다.
//! 스토리지 장애를 제외한 모든 variant는 호출자가 분기 처리해야 하는 "예상된" 결과입니다.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// 스토리지 계층의 원본 에러 (해석하지 않고 전달)
pub type StorageSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Gityard 공통 에러
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────────
    // Auth Errors
    // ─────────────────────────────────────────────────────────────────────────────
    /// 이메일 없음/비밀번호 불일치를 구분하지 않습니다.
    #[error("incorrect email or password")]
    InvalidCredentials,

    #[error("invalid token: {reason}")]
    InvalidToken { reason: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Public Key Errors
    // ─────────────────────────────────────────────────────────────────────────────
    /// `reason`은 로그용이며 클라이언트에 노출하지 않습니다.
    #[error("malformed public key: {reason}")]
    MalformedKey { reason: String },

    #[error("public key already registered")]
    DuplicateFingerprint,

    // ─────────────────────────────────────────────────────────────────────────────
    // Account Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("email already registered")]
    DuplicateEmail,

    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Infrastructure Errors
    // ─────────────────────────────────────────────────────────────────────────────
    /// 해시/서명 백엔드 실패
    #[error("crypto backend failure: {0}")]
    Crypto(String),

    #[error("storage error: {0}")]
    Storage(#[source] StorageSource),
}

impl Error {
    pub fn invalid_token(reason: impl Into<String>) -> Self {
        Error::InvalidToken {
            reason: reason.into(),
        }
    }

    pub fn malformed_key(reason: impl Into<String>) -> Self {
        Error::MalformedKey {
            reason: reason.into(),
        }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Error::Validation {
            field,
            message: message.into(),
        }
    }

    /// 스토리지 에러 래핑
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Storage(Box::new(err))
    }

    /// HTTP 상태 코드로 변환
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Error::InvalidCredentials | Error::DuplicateEmail => 400,

            // 401 Unauthorized
            Error::InvalidToken { .. } => 401,

            // 404 Not Found
            Error::NotFound { .. } => 404,

            // 422 Unprocessable Entity
            Error::MalformedKey { .. }
            | Error::DuplicateFingerprint
            | Error::Validation { .. } => 422,

            // 500 Internal Server Error
            Error::Crypto(_) | Error::Storage(_) => 500,
        }
    }

    /// 에러 코드 (클라이언트용)
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidCredentials => "INVALID_CREDENTIALS",
            Error::InvalidToken { .. } => "INVALID_TOKEN",
            Error::MalformedKey { .. } => "MALFORMED_KEY",
            Error::DuplicateFingerprint => "DUPLICATE_FINGERPRINT",
            Error::DuplicateEmail => "DUPLICATE_EMAIL",
            Error::NotFound { .. } => "NOT_FOUND",
            Error::Validation { .. } => "VALIDATION_ERROR",
            Error::Crypto(_) => "INTERNAL_ERROR",
            Error::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// 클라이언트에 보여줄 메시지
    ///
    /// 토큰 검증 실패 사유와 키 파서 내부 정보는 숨깁니다.
    pub fn public_message(&self) -> String {
        match self {
            Error::InvalidToken { .. } => "could not validate credentials".to_string(),
            Error::MalformedKey { .. } => "invalid key provided".to_string(),
            Error::Crypto(_) | Error::Storage(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }

    /// 호출자가 처리해야 하는 예상된 결과인지 여부
    pub fn is_expected(&self) -> bool {
        !matches!(self, Error::Crypto(_) | Error::Storage(_))
    }
}
