//! 비밀번호 해시
//!
//! bcrypt (`$2b$<cost>$<salt><hash>`) 형식을 사용합니다.
//! 해시 문자열에 알고리즘/비용/솔트가 모두 들어 있으므로 검증에 별도 상태가 필요 없습니다.

use crate::error::{Error, Result};

/// 기본 work factor
pub const DEFAULT_COST: u32 = 10;

/// bcrypt가 읽는 최대 입력 길이 (UTF-8 바이트)
///
/// 이후 바이트는 bcrypt가 무시하므로 더 긴 비밀번호는 받지 않습니다.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// 비밀번호 해셔
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

impl PasswordHasher {
    /// 비용 지정 생성 (bcrypt 허용 범위 4..=31로 보정)
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(4, 31),
        }
    }

    /// 랜덤 솔트로 해시 생성
    pub fn hash(&self, password: &str) -> Result<String> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(Error::validation("password", "must be at most 72 bytes"));
        }
        bcrypt::hash(password, self.cost).map_err(|e| Error::Crypto(e.to_string()))
    }

    /// 비밀번호 검증
    ///
    /// 저장된 해시가 손상된 경우에도 에러 대신 `false`를 반환합니다.
    /// 72바이트를 넘는 입력은 어떤 해시와도 일치하지 않습니다.
    pub fn verify(&self, password: &str, stored_hash: &str) -> bool {
        if password.len() > MAX_PASSWORD_BYTES {
            return false;
        }
        match bcrypt::verify(password, stored_hash) {
            Ok(matched) => matched,
            Err(e) => {
                tracing::warn!(error = %e, "stored password hash is unreadable");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(4)
    }

    #[test]
    fn test_hash_then_verify() {
        let hasher = hasher();
        let hash = hasher.hash("longenough1").unwrap();

        assert!(hash.starts_with("$2"));
        assert!(hasher.verify("longenough1", &hash));
        assert!(!hasher.verify("longenough2", &hash));
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = hasher();
        let a = hasher.hash("samepassword").unwrap();
        let b = hasher.hash("samepassword").unwrap();
        assert_ne!(a, b);
        assert!(hasher.verify("samepassword", &a));
        assert!(hasher.verify("samepassword", &b));
    }

    #[test]
    fn test_cost_is_encoded_in_hash() {
        let hash = PasswordHasher::new(5).hash("password123").unwrap();
        assert!(hash.contains("$05$"));
    }

    #[test]
    fn test_malformed_hash_fails_closed() {
        let hasher = hasher();
        assert!(!hasher.verify("password123", "not-a-bcrypt-hash"));
        assert!(!hasher.verify("password123", ""));
    }

    #[test]
    fn test_cost_is_clamped() {
        let hash = PasswordHasher::new(1).hash("password123").unwrap();
        assert!(hash.contains("$04$"));
        assert!(format!("{:?}", PasswordHasher::new(99)).contains("cost: 31"));
        assert!(format!("{:?}", PasswordHasher::default()).contains("cost: 10"));
    }

    /// 앞 72바이트가 같은 두 비밀번호가 같은 해시로 취급되지 않아야 함
    #[test]
    fn test_rejects_input_past_72_bytes() {
        let hasher = hasher();
        let prefix = "가".repeat(24);
        assert_eq!(prefix.len(), MAX_PASSWORD_BYTES);

        let first = format!("{prefix}A");
        let second = format!("{prefix}B");
        assert!(matches!(
            hasher.hash(&first),
            Err(Error::Validation { field: "password", .. })
        ));
        assert!(hasher.hash(&second).is_err());

        let stored = hasher.hash(&prefix).unwrap();
        assert!(hasher.verify(&prefix, &stored));
        assert!(!hasher.verify(&first, &stored));
        assert!(!hasher.verify(&second, &stored));
    }
}
