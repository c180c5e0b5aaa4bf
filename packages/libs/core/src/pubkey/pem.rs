//! PEM 공개키 디코딩
//!
//! 지원 형식:
//! - `RSA PUBLIC KEY` (PKCS#1)
//! - `PUBLIC KEY` (SPKI): RSA, Ed25519, ECDSA (P-256, P-384)
//!
//! SPKI는 알고리즘 OID를 먼저 읽고 해당 파서 하나만 사용합니다.

use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::spki::SubjectPublicKeyInfoRef;
use rsa::pkcs8::{DecodePublicKey, Document, ObjectIdentifier};
use ssh_key::public::{EcdsaPublicKey, Ed25519PublicKey, KeyData, RsaPublicKey};

use crate::error::{Error, Result};

const PKCS1_LABEL: &str = "BEGIN RSA PUBLIC KEY";
const SPKI_LABEL: &str = "PUBLIC KEY";

const OID_RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const OID_ED25519: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");
const OID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const OID_NIST_P256: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
const OID_NIST_P384: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");

/// PEM 봉투 표식 포함 여부
pub fn is_pem(text: &str) -> bool {
    text.contains("-----BEGIN ") || text.contains("-----END ")
}

/// PEM 텍스트를 SSH key data로 변환
pub fn decode(text: &str) -> Result<KeyData> {
    let text = text.trim();

    if text.contains(PKCS1_LABEL) {
        let key = rsa::RsaPublicKey::from_pkcs1_pem(text)
            .map_err(|e| Error::malformed_key(format!("pkcs1: {e}")))?;
        return rsa_key_data(&key);
    }

    let (label, document) =
        Document::from_pem(text).map_err(|e| Error::malformed_key(format!("pem: {e}")))?;
    if label != SPKI_LABEL {
        return Err(Error::malformed_key(format!("unsupported pem label `{label}`")));
    }
    decode_spki(document.as_bytes())
}

fn decode_spki(der: &[u8]) -> Result<KeyData> {
    let spki = SubjectPublicKeyInfoRef::try_from(der)
        .map_err(|e| Error::malformed_key(format!("spki: {e}")))?;
    let oid = spki.algorithm.oid;

    if oid == OID_RSA_ENCRYPTION {
        let key = rsa::RsaPublicKey::from_public_key_der(der)
            .map_err(|e| Error::malformed_key(format!("spki rsa: {e}")))?;
        rsa_key_data(&key)
    } else if oid == OID_ED25519 {
        let key = ed25519_dalek::VerifyingKey::from_public_key_der(der)
            .map_err(|e| Error::malformed_key(format!("spki ed25519: {e}")))?;
        Ok(KeyData::Ed25519(Ed25519PublicKey::from(&key)))
    } else if oid == OID_EC_PUBLIC_KEY {
        let curve = spki
            .algorithm
            .parameters_oid()
            .map_err(|e| Error::malformed_key(format!("spki ec curve: {e}")))?;
        ecdsa_key_data(der, curve)
    } else {
        Err(Error::malformed_key(format!("unsupported spki algorithm {oid}")))
    }
}

fn ecdsa_key_data(der: &[u8], curve: ObjectIdentifier) -> Result<KeyData> {
    use p256::elliptic_curve::sec1::ToEncodedPoint;

    let point = if curve == OID_NIST_P256 {
        p256::PublicKey::from_public_key_der(der)
            .map_err(|e| Error::malformed_key(format!("spki p256: {e}")))?
            .to_encoded_point(false)
            .as_bytes()
            .to_vec()
    } else if curve == OID_NIST_P384 {
        p384::PublicKey::from_public_key_der(der)
            .map_err(|e| Error::malformed_key(format!("spki p384: {e}")))?
            .to_encoded_point(false)
            .as_bytes()
            .to_vec()
    } else {
        return Err(Error::malformed_key(format!("unsupported ec curve {curve}")));
    };

    EcdsaPublicKey::from_sec1_bytes(&point)
        .map(KeyData::Ecdsa)
        .map_err(|e| Error::malformed_key(format!("ecdsa: {e}")))
}

fn rsa_key_data(key: &rsa::RsaPublicKey) -> Result<KeyData> {
    RsaPublicKey::try_from(key)
        .map(KeyData::Rsa)
        .map_err(|e| Error::malformed_key(format!("rsa: {e}")))
}
