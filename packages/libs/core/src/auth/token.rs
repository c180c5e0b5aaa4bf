//! 토큰 발급 및 검증
//!
//! HS256 JWT를 사용합니다. 서명 키는 프로세스 시작 시 한 번 주입되고 이후 읽기 전용입니다.

use chrono::Duration;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::error::{Error, Result};
use crate::id::UserId;

use super::claims::{TokenClaims, TokenTerm};

/// 토큰 코덱
///
/// 상태가 없으므로 여러 요청에서 잠금 없이 공유할 수 있습니다.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &Algorithm::HS256)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// 대칭 시크릿으로 생성
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// 토큰 발급
    pub fn issue(&self, subject: &UserId, term: TokenTerm, ttl: Duration) -> Result<String> {
        let claims = TokenClaims::new(subject, term, ttl);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::Crypto(e.to_string()))
    }

    /// 토큰 검증 후 subject 반환
    ///
    /// 서명 불일치, 만료, `term` 불일치는 모두 `InvalidToken`입니다.
    pub fn verify(&self, token: &str, expected: TokenTerm) -> Result<UserId> {
        self.decode_claims(token, expected).map(|claims| claims.subject())
    }

    /// 토큰 검증 후 전체 claims 반환
    pub fn decode_claims(&self, token: &str, expected: TokenTerm) -> Result<TokenClaims> {
        let data = decode::<TokenClaims>(token.trim(), &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => Error::invalid_token("token expired"),
                ErrorKind::InvalidSignature => Error::invalid_token("signature mismatch"),
                other => Error::invalid_token(format!("{other:?}")),
            })?;

        if data.claims.term != expected {
            return Err(Error::invalid_token(format!(
                "expected {expected} term token, got {}",
                data.claims.term
            )));
        }

        if data.claims.sub.is_empty() {
            return Err(Error::invalid_token("empty subject"));
        }

        Ok(data.claims)
    }
}

/// `Authorization: Bearer ...` 헤더에서 토큰 추출
pub fn bearer_token(auth_header: Option<&str>) -> Option<&str> {
    let value = auth_header?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
