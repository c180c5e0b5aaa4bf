//! SSH 공개키 정규화
//!
//! 입력 텍스트(PEM 또는 OpenSSH 한 줄)를 검증하고 OpenSSH 형식으로 정규화한 뒤
//! fingerprint를 계산합니다.
//!
//! ```text
//! 입력 ──▶ 형식 판별 ──▶ 파싱/검증 ──▶ 토큰 분리 ──▶ fingerprint
//!          (PEM 표식)    (PEM → OpenSSH)  (alg, body, comment)
//! ```
//!
//! 재시도 없이 한 번에 처리하며, 실패는 모두 `MalformedKey`입니다.

mod fingerprint;
mod pem;

pub use fingerprint::{fingerprint_blob, fingerprint_body, FINGERPRINT_PREFIX};
pub use pem::is_pem;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ssh_key::PublicKey;

use crate::error::{Error, Result};

/// 정규화된 공개키
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedKey {
    /// `<algorithm> <body>[ <comment>]`
    pub openssh: String,
    pub algorithm: String,
    pub key_body: String,
    /// 없으면 빈 문자열
    pub comment: String,
    pub fingerprint: String,
}

/// 공개키 정규화기
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyNormalizer;

impl KeyNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// 입력 텍스트를 정규화
    pub fn normalize(&self, text: &str) -> Result<NormalizedKey> {
        if text.trim().is_empty() {
            return Err(Error::malformed_key("empty input"));
        }

        if pem::is_pem(text) {
            self.normalize_pem(text)
        } else {
            self.normalize_openssh(text)
        }
    }

    fn normalize_pem(&self, text: &str) -> Result<NormalizedKey> {
        let key_data = pem::decode(text)?;
        let public_key = PublicKey::new(key_data, "");
        let blob = public_key
            .to_bytes()
            .map_err(|e| Error::malformed_key(format!("encode: {e}")))?;

        let algorithm = public_key.algorithm().as_str().to_string();
        let key_body = STANDARD.encode(&blob);

        Ok(NormalizedKey {
            openssh: format!("{algorithm} {key_body}"),
            algorithm,
            key_body,
            comment: String::new(),
            fingerprint: fingerprint_blob(&blob),
        })
    }

    fn normalize_openssh(&self, text: &str) -> Result<NormalizedKey> {
        let mut fields = text.split_whitespace();
        let (Some(algorithm), Some(key_body)) = (fields.next(), fields.next()) else {
            return Err(Error::malformed_key("expected `<algorithm> <base64> [comment]`"));
        };
        let comment = fields.collect::<Vec<_>>().join(" ");

        // 알고리즘 이름과 blob 내부 알고리즘의 일치까지 검증
        PublicKey::from_openssh(&format!("{algorithm} {key_body}"))
            .map_err(|e| Error::malformed_key(format!("openssh: {e}")))?;

        let fingerprint = fingerprint_body(key_body)?;
        let openssh = if comment.is_empty() {
            format!("{algorithm} {key_body}")
        } else {
            format!("{algorithm} {key_body} {comment}")
        };

        Ok(NormalizedKey {
            openssh,
            algorithm: algorithm.to_string(),
            key_body: key_body.to_string(),
            comment,
            fingerprint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssh_key::HashAlg;

    const ED25519_LINE: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIH0VbS/o1S7rE5UMgGO1Ze536UZVakIM39nsKKavJWMl your_email@example.com";
    const ED25519_FP: &str = "SHA256:C7gepW1lz1Nue4kHaWYrl/8/n2tyyFcpwXPfsZwqrj4";
    const ED25519_SPKI: &str = "-----BEGIN PUBLIC KEY-----
MCowBQYDK2VwAyEAfRVtL+jVLusTlQyAY7Vl7nfpRlVqQgzf2ewopq8lYyU=
-----END PUBLIC KEY-----
";

    const RSA_LINE: &str = "ssh-rsa AAAAB3NzaC1yc2EAAAADAQABAAABAQClANC7RUjXnwWnyYrnXT2hh8/R42HjEWvDtId/Hk7ZReaugKLv4yj40KsfHelTOEjsMcQFzRIDQ/ODCMGYLzpCvWdpqG58x9Y5F6JcFQxWmSGOIV8B8jRVFn7CTuuvHd7fmBINLnUWba+mM57XKuUE3RLjJAU4T18JnQcRDd2KGYnr4TnjnKgG7qUxi/uNZn15v2XYuQz7oPzFmsbRJF4cWHTlcWLaS/JeXkIClc+AUDHvyeQ9/OglU4n5tNcKEyQ8BHw5SSwH3clWBapZi1QSCNEguXZniwLX2M4pjjMp7e7WyN7FSeALVOkO+6m7GSKlNZHTkjZzX+/THfcMgNel";
    const RSA_FP: &str = "SHA256:+u601YXftP0lx2Az7iYLTD1pLjxbyY+mc0vULZv/IFQ";
    const RSA_SPKI: &str = "-----BEGIN PUBLIC KEY-----
MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEApQDQu0VI158Fp8mK5109
oYfP0eNh4xFrw7SHfx5O2UXmroCi7+Mo+NCrHx3pUzhI7DHEBc0SA0PzgwjBmC86
Qr1naahufMfWOReiXBUMVpkhjiFfAfI0VRZ+wk7rrx3e35gSDS51Fm2vpjOe1yrl
BN0S4yQFOE9fCZ0HEQ3dihmJ6+E545yoBu6lMYv7jWZ9eb9l2LkM+6D8xZrG0SRe
HFh05XFi2kvyXl5CApXPgFAx78nkPfzoJVOJ+bTXChMkPAR8OUksB93JVgWqWYtU
EgjRILl2Z4sC19jOKY4zKe3u1sjexUngC1TpDvupuxkipTWR05I2c1/v0x33DIDX
pQIDAQAB
-----END PUBLIC KEY-----
";
    const RSA_PKCS1: &str = "-----BEGIN RSA PUBLIC KEY-----
MIIBCgKCAQEApQDQu0VI158Fp8mK5109oYfP0eNh4xFrw7SHfx5O2UXmroCi7+Mo
+NCrHx3pUzhI7DHEBc0SA0PzgwjBmC86Qr1naahufMfWOReiXBUMVpkhjiFfAfI0
VRZ+wk7rrx3e35gSDS51Fm2vpjOe1yrlBN0S4yQFOE9fCZ0HEQ3dihmJ6+E545yo
Bu6lMYv7jWZ9eb9l2LkM+6D8xZrG0SReHFh05XFi2kvyXl5CApXPgFAx78nkPfzo
JVOJ+bTXChMkPAR8OUksB93JVgWqWYtUEgjRILl2Z4sC19jOKY4zKe3u1sjexUng
C1TpDvupuxkipTWR05I2c1/v0x33DIDXpQIDAQAB
-----END RSA PUBLIC KEY-----
";

    const P256_LINE: &str = "ecdsa-sha2-nistp256 AAAAE2VjZHNhLXNoYTItbmlzdHAyNTYAAAAIbmlzdHAyNTYAAABBBLiaUVat4qEC8LzxxXHo2jHbcGGOBkFil5OLpkiBNIoN3Hko6gussrexsL8dVXbvMkwwFZSEpd7dbZquRDUL4vw= ci@example.com";
    const P256_FP: &str = "SHA256:D7SysVFmRVRyFVLyXVeiAXmxzVdN4EN6IlWHhP1R7/A";
    const P256_SPKI: &str = "-----BEGIN PUBLIC KEY-----
MFkwEwYHKoZIzj0CAQYIKoZIzj0DAQcDQgAEuJpRVq3ioQLwvPHFcejaMdtwYY4G
QWKXk4umSIE0ig3ceSjqC6yyt7Gwvx1Vdu8yTDAVlISl3t1tmq5ENQvi/A==
-----END PUBLIC KEY-----
";

    const P384_LINE: &str = "ecdsa-sha2-nistp384 AAAAE2VjZHNhLXNoYTItbmlzdHAzODQAAAAIbmlzdHAzODQAAABhBA1Ucm/gKIh+qf6bCPV+/bXELTPmVr5HOiMHyy64ar5Tk8xO6734Rmz415RJ7ESYt8X++UejSfgxJ0nZLyoC8yZi7tqcII5Abn+hJXKUhWrIhs1/tZRDa2nHvkdLglNSYA==";
    const P384_FP: &str = "SHA256:zDaelLeaJbtj+In1fYsM068t2iY71LW/gsmV5VkHM5U";
    const P384_SPKI: &str = "-----BEGIN PUBLIC KEY-----
MHYwEAYHKoZIzj0CAQYFK4EEACIDYgAEDVRyb+AoiH6p/psI9X79tcQtM+ZWvkc6
IwfLLrhqvlOTzE7rvfhGbPjXlEnsRJi3xf75R6NJ+DEnSdkvKgLzJmLu2pwgjkBu
f6ElcpSFasiGzX+1lENrace+R0uCU1Jg
-----END PUBLIC KEY-----
";

    fn normalize(text: &str) -> Result<NormalizedKey> {
        KeyNormalizer::new().normalize(text)
    }

    #[test]
    fn test_openssh_line() {
        let key = normalize(ED25519_LINE).unwrap();
        assert_eq!(key.algorithm, "ssh-ed25519");
        assert_eq!(key.comment, "your_email@example.com");
        assert_eq!(key.fingerprint, ED25519_FP);
        assert_eq!(key.openssh, ED25519_LINE);
    }

    #[test]
    fn test_matches_ssh_key_fingerprint() {
        for line in [ED25519_LINE, RSA_LINE, P256_LINE, P384_LINE] {
            let expected = PublicKey::from_openssh(line)
                .unwrap()
                .fingerprint(HashAlg::Sha256)
                .to_string();
            assert_eq!(normalize(line).unwrap().fingerprint, expected);
        }
    }

    #[test]
    fn test_ed25519_pem_matches_openssh() {
        let from_pem = normalize(ED25519_SPKI).unwrap();
        let from_line = normalize(ED25519_LINE).unwrap();

        assert_eq!(from_pem.fingerprint, ED25519_FP);
        assert_eq!(from_pem.fingerprint, from_line.fingerprint);
        assert_eq!(from_pem.key_body, from_line.key_body);
        assert_eq!(from_pem.algorithm, "ssh-ed25519");
        assert_eq!(from_pem.comment, "");
    }

    #[test]
    fn test_rsa_pem_matches_openssh() {
        let spki = normalize(RSA_SPKI).unwrap();
        let pkcs1 = normalize(RSA_PKCS1).unwrap();

        assert_eq!(spki.fingerprint, RSA_FP);
        assert_eq!(pkcs1.fingerprint, RSA_FP);
        assert_eq!(spki.openssh, RSA_LINE);
        assert_eq!(pkcs1.algorithm, "ssh-rsa");
    }

    #[test]
    fn test_ecdsa_pem_matches_openssh() {
        let p256 = normalize(P256_SPKI).unwrap();
        let line = normalize(P256_LINE).unwrap();
        assert_eq!(p256.algorithm, "ecdsa-sha2-nistp256");
        assert_eq!(p256.fingerprint, P256_FP);
        assert_eq!(p256.key_body, line.key_body);
        assert_eq!(line.comment, "ci@example.com");

        let p384 = normalize(P384_SPKI).unwrap();
        assert_eq!(p384.algorithm, "ecdsa-sha2-nistp384");
        assert_eq!(p384.fingerprint, P384_FP);
        assert_eq!(p384.openssh, P384_LINE);
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = normalize(RSA_LINE).unwrap();
        let b = normalize(RSA_LINE).unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn test_comment_handling() {
        let body = "AAAAC3NzaC1lZDI1NTE5AAAAIH0VbS/o1S7rE5UMgGO1Ze536UZVakIM39nsKKavJWMl";

        let key = normalize(&format!("ssh-ed25519 {body}")).unwrap();
        assert_eq!(key.comment, "");

        let key = normalize(&format!("ssh-ed25519 {body}   \t ")).unwrap();
        assert_eq!(key.comment, "");

        let key = normalize(&format!("ssh-ed25519 {body} work laptop")).unwrap();
        assert_eq!(key.comment, "work laptop");
        assert_eq!(key.fingerprint, ED25519_FP);
    }

    #[test]
    fn test_malformed_inputs() {
        let inputs = [
            "",
            "   ",
            "not a key",
            "ssh-ed25519",
            "ssh-ed25519 !!!notbase64!!! comment",
            // 알고리즘 이름과 blob 불일치
            "ssh-rsa AAAAC3NzaC1lZDI1NTE5AAAAIH0VbS/o1S7rE5UMgGO1Ze536UZVakIM39nsKKavJWMl",
            "-----BEGIN PUBLIC KEY-----\n-----END PUBLIC KEY-----",
            "-----BEGIN PUBLIC KEY-----\nnot base64 at all\n-----END PUBLIC KEY-----",
        ];
        for input in inputs {
            assert!(
                matches!(normalize(input), Err(Error::MalformedKey { .. })),
                "expected MalformedKey for {input:?}"
            );
        }
    }
}
