//! 영속 저장소 계약
//!
//! 코어 로직은 이 trait만 통해 사용자/refresh token/공개키를 읽고 씁니다.
//!
//! # 순서 보장
//!
//! 구현체는 다음을 보장해야 합니다:
//!
//! - `upsert_refresh_record`: user id 키마다 쓰기의 전체 순서가 하나로 정해짐 (원자적 upsert)
//! - `insert_key`: fingerprint 유일성 제약 (동시 삽입 시 한쪽은 `DuplicateFingerprint`)
//! - `create_user`: email 유일성 제약 (동시 가입 시 한쪽은 `DuplicateEmail`)

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::id::UserId;

/// 사용자
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// 비밀번호 해시를 제외한 공개 프로필
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// 공개 프로필
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// 신규 사용자 (해시 완료 상태)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// 사용자별 현재 유효한 refresh token (1:1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub user_id: UserId,
    pub token: String,
    pub updated_at: DateTime<Utc>,
}

/// 등록된 공개키
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyRecord {
    pub id: String,
    pub user_id: UserId,
    pub name: String,
    /// 사용자가 제출한 원문
    pub full_text: String,
    /// `SHA256:<base64 no pad>`, 저장소 전체에서 유일
    pub fingerprint: String,
    pub algorithm: String,
    pub key_body: String,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl PublicKeyRecord {
    pub fn summary(&self) -> KeySummary {
        KeySummary {
            name: self.name.clone(),
            fingerprint: self.fingerprint.clone(),
        }
    }
}

/// 신규 공개키
#[derive(Debug, Clone)]
pub struct NewPublicKey {
    pub user_id: UserId,
    pub name: String,
    pub full_text: String,
    pub fingerprint: String,
    pub algorithm: String,
    pub key_body: String,
    pub comment: String,
}

/// 목록 응답용 요약
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySummary {
    pub name: String,
    pub fingerprint: String,
}

/// 페이지 조회 결과
#[derive(Debug, Clone)]
pub struct KeyPage {
    pub records: Vec<PublicKeyRecord>,
    /// 사용자의 전체 키 개수 (페이지와 무관)
    pub total: u64,
}

/// 저장소 계약
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_user_by_id(&self, id: &UserId) -> Result<Option<User>>;

    /// email 중복 시 `DuplicateEmail`
    async fn create_user(&self, user: NewUser) -> Result<User>;

    async fn get_refresh_record(&self, user_id: &UserId) -> Result<Option<RefreshTokenRecord>>;

    /// 원자적 create-or-replace
    async fn upsert_refresh_record(&self, user_id: &UserId, token: &str) -> Result<()>;

    async fn delete_refresh_record(&self, user_id: &UserId) -> Result<bool>;

    async fn find_key_by_fingerprint(&self, fingerprint: &str) -> Result<Option<PublicKeyRecord>>;

    /// fingerprint 중복 시 `DuplicateFingerprint`
    async fn insert_key(&self, key: NewPublicKey) -> Result<PublicKeyRecord>;

    async fn delete_key(&self, user_id: &UserId, fingerprint: &str) -> Result<bool>;

    async fn list_keys(&self, user_id: &UserId, offset: u64, limit: u64) -> Result<KeyPage>;
}
