//! 세션 수명주기
//!
//! 로그인, refresh token 회전, 로그아웃을 담당합니다.
//!
//! # Refresh token 상태
//!
//! ```text
//! issued(유효) ──▶ superseded(무효, 같은 사용자의 다음 발급)
//!      │
//!      └────────▶ revoked(무효, 로그아웃)
//! ```
//!
//! 사용자마다 저장소에 "최신 유효 토큰" 한 칸만 두고 발급할 때마다 덮어씁니다.
//! 제시된 토큰이 그 칸의 값과 바이트 단위로 같지 않으면 거부합니다.
//! 한 사용자의 읽기-비교-회전은 사용자별 잠금 안에서 일어나며, 다른 사용자끼리는 서로 막지 않습니다.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use tokio::sync::{Mutex, OnceCell, OwnedMutexGuard};

use crate::error::{Error, Result};
use crate::id::UserId;
use crate::store::{IdentityStore, User};

use super::claims::TokenTerm;
use super::password::PasswordHasher;
use super::token::TokenCodec;

/// 토큰 수명 설정
#[derive(Debug, Clone, Copy)]
pub struct SessionPolicy {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            access_ttl: Duration::minutes(5),
            refresh_ttl: Duration::days(7),
        }
    }
}

/// 로그인/refresh 결과
#[derive(Clone)]
pub struct IssuedTokens {
    pub user_id: UserId,
    pub access_token: String,
    pub refresh_token: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl std::fmt::Debug for IssuedTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedTokens")
            .field("user_id", &self.user_id)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

/// 존재하지 않는 email의 로그인도 같은 bcrypt 비용을 치르게 하는 대조용 입력
const TIMING_DUMMY_PASSWORD: &str = "gityard-timing-dummy";

/// 세션 관리자
pub struct SessionManager {
    store: Arc<dyn IdentityStore>,
    codec: TokenCodec,
    hasher: PasswordHasher,
    policy: SessionPolicy,
    /// 사용자별 refresh 레코드 read-modify-write 직렬화
    rotation_locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
    /// 알 수 없는 email 검증용 해시 (첫 사용 시 생성)
    dummy_hash: OnceCell<String>,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        codec: TokenCodec,
        hasher: PasswordHasher,
        policy: SessionPolicy,
    ) -> Self {
        Self {
            store,
            codec,
            hasher,
            policy,
            rotation_locks: Mutex::new(HashMap::new()),
            dummy_hash: OnceCell::new(),
        }
    }

    /// email/비밀번호 로그인
    ///
    /// 사용자 없음과 비밀번호 불일치는 모두 `InvalidCredentials`이며,
    /// 사용자가 없어도 bcrypt 검증을 한 번 수행해 응답 시간이 같아집니다.
    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedTokens> {
        let Some(user) = self.store.find_user_by_email(email).await? else {
            let dummy = self.dummy_hash().await?.to_string();
            self.verify_password(password, dummy).await?;
            tracing::debug!("login rejected: unknown email");
            return Err(Error::InvalidCredentials);
        };

        let matched = self
            .verify_password(password, user.password_hash.clone())
            .await?;
        if !matched {
            tracing::debug!(user_id = %user.id, "login rejected: password mismatch");
            return Err(Error::InvalidCredentials);
        }

        let _guard = self.lock_user(&user.id).await;
        let refresh_token = self.rotate_locked(&user.id).await?;
        let tokens = self.finish(user.id, refresh_token)?;
        tracing::info!(user_id = %tokens.user_id, "user logged in");
        Ok(tokens)
    }

    /// refresh token으로 새 토큰 쌍 발급
    ///
    /// 검증 → 저장 레코드와 비교 → 회전 순서이며, 회전된 이후의 옛 토큰은 `InvalidToken`입니다.
    pub async fn refresh(&self, presented: &str) -> Result<IssuedTokens> {
        let presented = presented.trim();
        let user_id = self.codec.verify(presented, TokenTerm::Long)?;

        let _guard = self.lock_user(&user_id).await;
        let record = self.store.get_refresh_record(&user_id).await?;
        match record {
            Some(record) if record.token == presented => {}
            Some(_) => {
                tracing::warn!(user_id = %user_id, "stale refresh token presented");
                return Err(Error::invalid_token("refresh token superseded"));
            }
            None => {
                tracing::warn!(user_id = %user_id, "refresh token presented after revocation");
                return Err(Error::invalid_token("no active refresh token"));
            }
        }

        let refresh_token = self.rotate_locked(&user_id).await?;
        self.finish(user_id, refresh_token)
    }

    /// 새 refresh token을 발급하고 사용자 레코드를 덮어씀
    pub async fn rotate_refresh_token(&self, user_id: &UserId) -> Result<String> {
        let _guard = self.lock_user(user_id).await;
        self.rotate_locked(user_id).await
    }

    /// refresh 레코드 삭제
    pub async fn logout(&self, user_id: &UserId) -> Result<bool> {
        let _guard = self.lock_user(user_id).await;
        let revoked = self.store.delete_refresh_record(user_id).await?;
        tracing::info!(user_id = %user_id, revoked, "user logged out");
        Ok(revoked)
    }

    /// access token으로 현재 사용자 조회
    pub async fn authenticate(&self, access_token: &str) -> Result<User> {
        let user_id = self.codec.verify(access_token, TokenTerm::Short)?;
        self.store
            .find_user_by_id(&user_id)
            .await?
            .ok_or(Error::NotFound { entity: "user" })
    }

    /// 사용자별 잠금 획득
    ///
    /// 아무도 잡고 있지 않은 항목은 이때 함께 정리합니다.
    async fn lock_user(&self, user_id: &UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.rotation_locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(user_id.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    async fn dummy_hash(&self) -> Result<&str> {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| async {
                let hasher = self.hasher;
                tokio::task::spawn_blocking(move || hasher.hash(TIMING_DUMMY_PASSWORD))
                    .await
                    .map_err(|e| Error::Crypto(e.to_string()))?
            })
            .await?;
        Ok(hash.as_str())
    }

    async fn verify_password(&self, password: &str, stored_hash: String) -> Result<bool> {
        let hasher = self.hasher;
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash))
            .await
            .map_err(|e| Error::Crypto(e.to_string()))
    }

    async fn rotate_locked(&self, user_id: &UserId) -> Result<String> {
        let token = self
            .codec
            .issue(user_id, TokenTerm::Long, self.policy.refresh_ttl)?;
        self.store.upsert_refresh_record(user_id, &token).await?;
        Ok(token)
    }

    fn finish(&self, user_id: UserId, refresh_token: String) -> Result<IssuedTokens> {
        let access_token = self
            .codec
            .issue(&user_id, TokenTerm::Short, self.policy.access_ttl)?;
        Ok(IssuedTokens {
            user_id,
            access_token,
            refresh_token,
            access_ttl: self.policy.access_ttl,
            refresh_ttl: self.policy.refresh_ttl,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, NewUser};

    const SECRET: &[u8] = b"session-test-secret";

    async fn setup() -> (SessionManager, Arc<MemoryStore>, User) {
        let store = Arc::new(MemoryStore::new());
        let hasher = PasswordHasher::new(4);
        let user = store
            .create_user(NewUser {
                name: "unknown".to_string(),
                email: "a@x.com".to_string(),
                password_hash: hasher.hash("longenough1").unwrap(),
            })
            .await
            .unwrap();

        let manager = SessionManager::new(
            store.clone(),
            TokenCodec::new(SECRET),
            hasher,
            SessionPolicy::default(),
        );
        (manager, store, user)
    }

    #[tokio::test]
    async fn test_login_issues_tokens() {
        let (manager, store, user) = setup().await;
        let tokens = manager.login("a@x.com", "longenough1").await.unwrap();

        let codec = TokenCodec::new(SECRET);
        assert_eq!(codec.verify(&tokens.access_token, TokenTerm::Short).unwrap(), user.id);
        assert_eq!(codec.verify(&tokens.refresh_token, TokenTerm::Long).unwrap(), user.id);
        assert_eq!(tokens.refresh_ttl, Duration::days(7));

        let record = store.get_refresh_record(&user.id).await.unwrap().unwrap();
        assert_eq!(record.token, tokens.refresh_token);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (manager, _, _) = setup().await;

        let unknown = manager.login("nobody@x.com", "longenough1").await.unwrap_err();
        let wrong = manager.login("a@x.com", "wrongpassword").await.unwrap_err();

        assert!(matches!(unknown, Error::InvalidCredentials));
        assert!(matches!(wrong, Error::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    /// 알 수 없는 email도 bcrypt 검증을 거쳐야 함
    #[tokio::test]
    async fn test_unknown_email_runs_bcrypt() {
        let (manager, _, _) = setup().await;
        assert!(manager.dummy_hash.get().is_none());

        let err = manager.login("nobody@x.com", "longenough1").await.unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials));

        let dummy = manager.dummy_hash.get().unwrap();
        assert!(dummy.starts_with("$2"));
        assert!(dummy.contains("$04$"));

        // 두 번째 실패는 같은 해시를 재사용
        let before = dummy.clone();
        manager.login("other@x.com", "longenough1").await.unwrap_err();
        assert_eq!(manager.dummy_hash.get().unwrap(), &before);
    }

    #[tokio::test]
    async fn test_refresh_rotates() {
        let (manager, _, user) = setup().await;
        let first = manager.login("a@x.com", "longenough1").await.unwrap();

        let second = manager.refresh(&first.refresh_token).await.unwrap();
        assert_ne!(second.refresh_token, first.refresh_token);
        assert_eq!(
            manager.authenticate(&second.access_token).await.unwrap().id,
            user.id
        );
    }

    #[tokio::test]
    async fn test_refresh_replay_rejected() {
        let (manager, _, _) = setup().await;
        let tokens = manager.login("a@x.com", "longenough1").await.unwrap();

        assert!(manager.refresh(&tokens.refresh_token).await.is_ok());
        assert!(matches!(
            manager.refresh(&tokens.refresh_token).await,
            Err(Error::InvalidToken { .. })
        ));
    }

    #[tokio::test]
    async fn test_rotate_supersedes_previous() {
        let (manager, _, user) = setup().await;

        let t1 = manager.rotate_refresh_token(&user.id).await.unwrap();
        let t2 = manager.rotate_refresh_token(&user.id).await.unwrap();
        assert_ne!(t1, t2);

        assert!(matches!(
            manager.refresh(&t1).await,
            Err(Error::InvalidToken { .. })
        ));
        assert!(manager.refresh(&t2).await.is_ok());
    }

    #[tokio::test]
    async fn test_second_login_invalidates_first_refresh() {
        let (manager, _, _) = setup().await;
        let first = manager.login("a@x.com", "longenough1").await.unwrap();
        let _second = manager.login("a@x.com", "longenough1").await.unwrap();

        assert!(manager.refresh(&first.refresh_token).await.is_err());
    }

    #[tokio::test]
    async fn test_logout_revokes() {
        let (manager, _, user) = setup().await;
        let tokens = manager.login("a@x.com", "longenough1").await.unwrap();

        assert!(manager.logout(&user.id).await.unwrap());
        assert!(!manager.logout(&user.id).await.unwrap());
        assert!(matches!(
            manager.refresh(&tokens.refresh_token).await,
            Err(Error::InvalidToken { .. })
        ));
    }

    #[tokio::test]
    async fn test_access_token_is_not_a_refresh_token() {
        let (manager, _, _) = setup().await;
        let tokens = manager.login("a@x.com", "longenough1").await.unwrap();

        assert!(matches!(
            manager.refresh(&tokens.access_token).await,
            Err(Error::InvalidToken { .. })
        ));
        assert!(matches!(
            manager.authenticate(&tokens.refresh_token).await,
            Err(Error::InvalidToken { .. })
        ));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_user() {
        let (manager, _, _) = setup().await;
        let codec = TokenCodec::new(SECRET);
        let ghost = codec
            .issue(&UserId::new("ghost"), TokenTerm::Short, Duration::minutes(5))
            .unwrap();

        assert!(matches!(
            manager.authenticate(&ghost).await,
            Err(Error::NotFound { entity: "user" })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_refresh_has_single_winner() {
        let (manager, _, _) = setup().await;
        let manager = Arc::new(manager);
        let tokens = manager.login("a@x.com", "longenough1").await.unwrap();

        let a = {
            let manager = manager.clone();
            let token = tokens.refresh_token.clone();
            tokio::spawn(async move { manager.refresh(&token).await })
        };
        let b = {
            let manager = manager.clone();
            let token = tokens.refresh_token.clone();
            tokio::spawn(async move { manager.refresh(&token).await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    }

    /// 한 사용자의 잠금이 다른 사용자의 회전을 막지 않아야 함
    #[tokio::test]
    async fn test_rotation_lock_is_per_user() {
        let (manager, _, user) = setup().await;
        let other = UserId::new("other");

        let held = manager.lock_user(&user.id).await;
        let rotated = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            manager.rotate_refresh_token(&other),
        )
        .await;
        assert!(matches!(rotated, Ok(Ok(_))));

        // 같은 사용자는 잠금이 풀릴 때까지 대기
        let blocked = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            manager.rotate_refresh_token(&user.id),
        )
        .await;
        assert!(blocked.is_err());

        drop(held);
        assert!(manager.rotate_refresh_token(&user.id).await.is_ok());
        assert_eq!(manager.rotation_locks.lock().await.len(), 1);
    }
}
