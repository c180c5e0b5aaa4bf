//! 인증 관련 타입 및 로직
//!
//! # 토큰 종류
//!
//! - **Access Token** (`term = short`): HS256 JWT, 무상태 검증, 기본 5분
//! - **Refresh Token** (`term = long`): HS256 JWT, 사용자당 1개만 저장소에 보관, 기본 7일
//!
//! 두 토큰은 같은 시크릿으로 서명되며 `term` claim으로만 구분됩니다.

mod claims;
mod password;
mod session;
mod token;

pub use claims::{TokenClaims, TokenTerm, REFRESH_COOKIE_NAME};
pub use password::{PasswordHasher, DEFAULT_COST, MAX_PASSWORD_BYTES};
pub use session::{IssuedTokens, SessionManager, SessionPolicy};
pub use token::{bearer_token, TokenCodec};
