//! 계정 및 공개키 관리
//!
//! 회원가입, 프로필 조회, 공개키 등록/목록/삭제를 담당합니다.

use std::sync::Arc;

use serde::Serialize;

use crate::auth::PasswordHasher;
use crate::error::{Error, Result};
use crate::id::UserId;
use crate::pubkey::KeyNormalizer;
use crate::requests::{KeyRegistration, PageQuery, SignupRequest};
use crate::store::{IdentityStore, KeySummary, NewPublicKey, NewUser, PublicKeyRecord, PublicUser};

/// 공개키 목록 응답 (`{"data": [...], "count": n}`)
#[derive(Debug, Clone, Serialize)]
pub struct KeyList {
    #[serde(rename = "data")]
    pub keys: Vec<KeySummary>,
    /// 페이지와 무관한 전체 개수
    #[serde(rename = "count")]
    pub total: u64,
}

/// 계정 서비스
pub struct AccountService {
    store: Arc<dyn IdentityStore>,
    hasher: PasswordHasher,
    normalizer: KeyNormalizer,
}

impl AccountService {
    pub fn new(store: Arc<dyn IdentityStore>, hasher: PasswordHasher) -> Self {
        Self {
            store,
            hasher,
            normalizer: KeyNormalizer::new(),
        }
    }

    /// 회원가입
    pub async fn signup(&self, request: SignupRequest) -> Result<PublicUser> {
        request.validate()?;

        if self.store.find_user_by_email(&request.email).await?.is_some() {
            return Err(Error::DuplicateEmail);
        }

        let hasher = self.hasher;
        let password = request.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| Error::Crypto(e.to_string()))??;

        let user = self
            .store
            .create_user(NewUser {
                name: request.display_name().to_string(),
                email: request.email,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, "user signed up");
        Ok(user.to_public())
    }

    /// 공개 프로필 조회
    pub async fn profile(&self, user_id: &UserId) -> Result<PublicUser> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .map(|user| user.to_public())
            .ok_or(Error::NotFound { entity: "user" })
    }

    /// 공개키 등록
    ///
    /// 검증 → 정규화 → fingerprint 중복 확인 → 저장.
    /// 사전 확인을 통과한 동시 등록은 저장소의 유일성 제약이 `DuplicateFingerprint`로 막습니다.
    pub async fn register_key(
        &self,
        user_id: &UserId,
        request: KeyRegistration,
    ) -> Result<PublicKeyRecord> {
        request.validate()?;

        let normalized = self.normalizer.normalize(&request.full_text).map_err(|e| {
            tracing::debug!(user_id = %user_id, error = %e, "key rejected");
            e
        })?;

        if self
            .store
            .find_key_by_fingerprint(&normalized.fingerprint)
            .await?
            .is_some()
        {
            tracing::warn!(
                user_id = %user_id,
                fingerprint = %normalized.fingerprint,
                "duplicate key registration"
            );
            return Err(Error::DuplicateFingerprint);
        }

        let record = self
            .store
            .insert_key(NewPublicKey {
                user_id: user_id.clone(),
                name: request.name.trim().to_string(),
                full_text: request.full_text,
                fingerprint: normalized.fingerprint,
                algorithm: normalized.algorithm,
                key_body: normalized.key_body,
                comment: normalized.comment,
            })
            .await?;

        tracing::info!(
            user_id = %user_id,
            fingerprint = %record.fingerprint,
            algorithm = %record.algorithm,
            "public key registered"
        );
        Ok(record)
    }

    /// 공개키 목록
    pub async fn list_keys(&self, user_id: &UserId, query: PageQuery) -> Result<KeyList> {
        let (offset, limit) = query.resolve();
        let page = self.store.list_keys(user_id, offset, limit).await?;
        Ok(KeyList {
            keys: page.records.iter().map(PublicKeyRecord::summary).collect(),
            total: page.total,
        })
    }

    /// 공개키 삭제 (본인 소유만)
    pub async fn delete_key(&self, user_id: &UserId, fingerprint: &str) -> Result<()> {
        if !self.store.delete_key(user_id, fingerprint.trim()).await? {
            return Err(Error::NotFound { entity: "key" });
        }
        tracing::info!(user_id = %user_id, fingerprint = %fingerprint.trim(), "public key deleted");
        Ok(())
    }
}
