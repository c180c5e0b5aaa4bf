//! 인메모리 저장소
//!
//! 테스트와 로컬 실행용입니다. 단일 mutex로 모든 read-modify-write를 직렬화합니다.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::id::{generate_key_id, UserId};

use super::{
    IdentityStore, KeyPage, NewPublicKey, NewUser, PublicKeyRecord, RefreshTokenRecord, User,
};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    refresh: HashMap<UserId, RefreshTokenRecord>,
    /// 삽입 순서 유지
    keys: Vec<PublicKeyRecord>,
}

/// 인메모리 `IdentityStore`
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: &UserId) -> Result<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.get(id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(Error::DuplicateEmail);
        }

        let created = User {
            id: UserId::generate(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        tables.users.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn get_refresh_record(&self, user_id: &UserId) -> Result<Option<RefreshTokenRecord>> {
        let tables = self.tables.lock().await;
        Ok(tables.refresh.get(user_id).cloned())
    }

    async fn upsert_refresh_record(&self, user_id: &UserId, token: &str) -> Result<()> {
        let mut tables = self.tables.lock().await;
        tables.refresh.insert(
            user_id.clone(),
            RefreshTokenRecord {
                user_id: user_id.clone(),
                token: token.to_string(),
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn delete_refresh_record(&self, user_id: &UserId) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        Ok(tables.refresh.remove(user_id).is_some())
    }

    async fn find_key_by_fingerprint(&self, fingerprint: &str) -> Result<Option<PublicKeyRecord>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .keys
            .iter()
            .find(|k| k.fingerprint == fingerprint)
            .cloned())
    }

    async fn insert_key(&self, key: NewPublicKey) -> Result<PublicKeyRecord> {
        let mut tables = self.tables.lock().await;
        if tables.keys.iter().any(|k| k.fingerprint == key.fingerprint) {
            return Err(Error::DuplicateFingerprint);
        }

        let record = PublicKeyRecord {
            id: generate_key_id(),
            user_id: key.user_id,
            name: key.name,
            full_text: key.full_text,
            fingerprint: key.fingerprint,
            algorithm: key.algorithm,
            key_body: key.key_body,
            comment: key.comment,
            created_at: Utc::now(),
        };
        tables.keys.push(record.clone());
        Ok(record)
    }

    async fn delete_key(&self, user_id: &UserId, fingerprint: &str) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.keys.len();
        tables
            .keys
            .retain(|k| !(k.user_id == *user_id && k.fingerprint == fingerprint));
        Ok(tables.keys.len() != before)
    }

    async fn list_keys(&self, user_id: &UserId, offset: u64, limit: u64) -> Result<KeyPage> {
        let tables = self.tables.lock().await;
        let owned: Vec<&PublicKeyRecord> =
            tables.keys.iter().filter(|k| k.user_id == *user_id).collect();
        let total = owned.len() as u64;
        let records = owned
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(KeyPage { records, total })
    }
}
