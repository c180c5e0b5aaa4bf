//! SQLite 저장소
//!
//! 테이블:
//! - `"user"`: 사용자 (email UNIQUE)
//! - `longtermtoken`: 사용자당 refresh token 1개 (PK = user_id)
//! - `pubkey`: 공개키 (fingerprint UNIQUE)

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use gy_core::error::{Error, Result};
use gy_core::id::{generate_key_id, UserId};
use gy_core::store::{
    IdentityStore, KeyPage, NewPublicKey, NewUser, PublicKeyRecord, RefreshTokenRecord, User,
};

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn new(db_url: &str) -> anyhow::Result<Self> {
        let in_memory = db_url.contains(":memory:");
        let options = if let Some(path) = db_url.strip_prefix("sqlite://") {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
        } else {
            SqliteConnectOptions::from_str(db_url)?.create_if_missing(true)
        };

        // 인메모리 DB는 연결마다 별개이므로 하나만 사용
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .connect_with(options.foreign_keys(true))
            .await?;

        let db = Self { pool };
        db.init().await?;
        Ok(db)
    }

    async fn init(&self) -> anyhow::Result<()> {
        let queries = [
            r#"CREATE TABLE IF NOT EXISTS "user" (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            );"#,
            r#"CREATE TABLE IF NOT EXISTS longtermtoken (
                user_id TEXT PRIMARY KEY REFERENCES "user"(id) ON DELETE CASCADE,
                token TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );"#,
            r#"CREATE TABLE IF NOT EXISTS pubkey (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES "user"(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                full_text TEXT NOT NULL,
                fingerprint TEXT NOT NULL,
                algorithm TEXT NOT NULL,
                keybody TEXT NOT NULL,
                comment TEXT NOT NULL,
                created_at TEXT NOT NULL
            );"#,
            r#"CREATE UNIQUE INDEX IF NOT EXISTS ix_pubkey_fingerprint ON pubkey (fingerprint);"#,
            r#"CREATE INDEX IF NOT EXISTS ix_pubkey_user_id ON pubkey (user_id);"#,
        ];

        for q in queries {
            sqlx::query(q).execute(&self.pool).await?;
        }

        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn parse_time(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(Error::storage)
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl IdentityStore for SqliteStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"SELECT id, name, email, password_hash, created_at FROM "user" WHERE email = ?1"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::storage)?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_user_by_id(&self, id: &UserId) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"SELECT id, name, email, password_hash, created_at FROM "user" WHERE id = ?1"#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::storage)?;

        row.map(UserRow::into_user).transpose()
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let id = UserId::generate();
        let created_at = Utc::now();

        sqlx::query(
            r#"INSERT INTO "user" (id, name, email, password_hash, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
        )
        .bind(id.as_str())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::DuplicateEmail
            } else {
                Error::storage(e)
            }
        })?;

        Ok(User {
            id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at,
        })
    }

    async fn get_refresh_record(&self, user_id: &UserId) -> Result<Option<RefreshTokenRecord>> {
        let row = sqlx::query_as::<_, LongTermTokenRow>(
            r#"SELECT user_id, token, updated_at FROM longtermtoken WHERE user_id = ?1"#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::storage)?;

        row.map(LongTermTokenRow::into_record).transpose()
    }

    async fn upsert_refresh_record(&self, user_id: &UserId, token: &str) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO longtermtoken (user_id, token, updated_at)
               VALUES (?1, ?2, ?3)
               ON CONFLICT(user_id) DO UPDATE SET token=excluded.token, updated_at=excluded.updated_at"#,
        )
        .bind(user_id.as_str())
        .bind(token)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(Error::storage)?;
        Ok(())
    }

    async fn delete_refresh_record(&self, user_id: &UserId) -> Result<bool> {
        let result = sqlx::query(r#"DELETE FROM longtermtoken WHERE user_id = ?1"#)
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(Error::storage)?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_key_by_fingerprint(&self, fingerprint: &str) -> Result<Option<PublicKeyRecord>> {
        let row = sqlx::query_as::<_, PubkeyRow>(
            r#"SELECT id, user_id, name, full_text, fingerprint, algorithm, keybody, comment, created_at
               FROM pubkey WHERE fingerprint = ?1"#,
        )
        .bind(fingerprint)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::storage)?;

        row.map(PubkeyRow::into_record).transpose()
    }

    async fn insert_key(&self, key: NewPublicKey) -> Result<PublicKeyRecord> {
        let id = generate_key_id();
        let created_at = Utc::now();

        sqlx::query(
            r#"INSERT INTO pubkey (id, user_id, name, full_text, fingerprint, algorithm, keybody, comment, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
        )
        .bind(&id)
        .bind(key.user_id.as_str())
        .bind(&key.name)
        .bind(&key.full_text)
        .bind(&key.fingerprint)
        .bind(&key.algorithm)
        .bind(&key.key_body)
        .bind(&key.comment)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::DuplicateFingerprint
            } else {
                Error::storage(e)
            }
        })?;

        Ok(PublicKeyRecord {
            id,
            user_id: key.user_id,
            name: key.name,
            full_text: key.full_text,
            fingerprint: key.fingerprint,
            algorithm: key.algorithm,
            key_body: key.key_body,
            comment: key.comment,
            created_at,
        })
    }

    async fn delete_key(&self, user_id: &UserId, fingerprint: &str) -> Result<bool> {
        let result = sqlx::query(r#"DELETE FROM pubkey WHERE user_id = ?1 AND fingerprint = ?2"#)
            .bind(user_id.as_str())
            .bind(fingerprint)
            .execute(&self.pool)
            .await
            .map_err(Error::storage)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_keys(&self, user_id: &UserId, offset: u64, limit: u64) -> Result<KeyPage> {
        let total: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM pubkey WHERE user_id = ?1"#)
            .bind(user_id.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(Error::storage)?;

        let rows = sqlx::query_as::<_, PubkeyRow>(
            r#"SELECT id, user_id, name, full_text, fingerprint, algorithm, keybody, comment, created_at
               FROM pubkey WHERE user_id = ?1
               ORDER BY rowid
               LIMIT ?2 OFFSET ?3"#,
        )
        .bind(user_id.as_str())
        .bind(to_i64(limit))
        .bind(to_i64(offset))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::storage)?;

        let records = rows
            .into_iter()
            .map(PubkeyRow::into_record)
            .collect::<Result<Vec<_>>>()?;

        Ok(KeyPage {
            records,
            total: u64::try_from(total).unwrap_or(0),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rows
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, sqlx::FromRow)]
struct UserRow {
    id: String,
    name: String,
    email: String,
    password_hash: String,
    created_at: String,
}

impl UserRow {
    fn into_user(self) -> Result<User> {
        Ok(User {
            id: UserId::new(self.id),
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            created_at: parse_time(&self.created_at)?,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct LongTermTokenRow {
    user_id: String,
    token: String,
    updated_at: String,
}

impl LongTermTokenRow {
    fn into_record(self) -> Result<RefreshTokenRecord> {
        Ok(RefreshTokenRecord {
            user_id: UserId::new(self.user_id),
            token: self.token,
            updated_at: parse_time(&self.updated_at)?,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct PubkeyRow {
    id: String,
    user_id: String,
    name: String,
    full_text: String,
    fingerprint: String,
    algorithm: String,
    keybody: String,
    comment: String,
    created_at: String,
}

impl PubkeyRow {
    fn into_record(self) -> Result<PublicKeyRecord> {
        Ok(PublicKeyRecord {
            id: self.id,
            user_id: UserId::new(self.user_id),
            name: self.name,
            full_text: self.full_text,
            fingerprint: self.fingerprint,
            algorithm: self.algorithm,
            key_body: self.keybody,
            comment: self.comment,
            created_at: parse_time(&self.created_at)?,
        })
    }
}
