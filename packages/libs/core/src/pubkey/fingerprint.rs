//! 공개키 fingerprint
//!
//! `SHA256:` + base64(no pad)(sha256(key blob)). `ssh-keygen -lf`와 동일한 값입니다.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

pub const FINGERPRINT_PREFIX: &str = "SHA256:";

/// base64 key body로부터 fingerprint 계산
pub fn fingerprint_body(key_body: &str) -> Result<String> {
    let blob = STANDARD
        .decode(key_body.trim())
        .map_err(|e| Error::malformed_key(format!("key body is not base64: {e}")))?;
    if blob.is_empty() {
        return Err(Error::malformed_key("empty key body"));
    }
    Ok(fingerprint_blob(&blob))
}

/// wire format key blob으로부터 fingerprint 계산
pub fn fingerprint_blob(blob: &[u8]) -> String {
    let digest = Sha256::digest(blob);
    format!("{FINGERPRINT_PREFIX}{}", STANDARD_NO_PAD.encode(digest))
}
