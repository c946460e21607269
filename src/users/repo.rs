use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo_types::{NewUser, UserRecord};

const EMAIL_UNIQUE_CONSTRAINT: &str = "users_email_key";

/// Raised by [`UserDirectory::insert`] when the email is already taken.
#[derive(Debug, Error)]
#[error("duplicate email: {0}")]
pub struct DuplicateEmail(pub String);

/// Persistent store of user records.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn exists_by_email(&self, email: &str) -> anyhow::Result<bool>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>>;
    async fn find_by_uuid(&self, uuid: Uuid) -> anyhow::Result<Option<UserRecord>>;
    async fn list(&self) -> anyhow::Result<Vec<UserRecord>>;
    async fn insert(&self, user: NewUser) -> anyhow::Result<UserRecord>;
    /// Overwrites name, birth date, password and role of the row with `user.id`.
    async fn save(&self, user: &UserRecord) -> anyhow::Result<()>;
    async fn delete_by_id(&self, id: i64) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgUserDirectory {
    db: PgPool,
}

impl PgUserDirectory {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn exists_by_email(&self, email: &str) -> anyhow::Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)"#,
        )
        .bind(email)
        .fetch_one(&self.db)
        .await
        .context("exists_by_email")?;
        Ok(exists)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, uuid, name, email, birth_date, password, role
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find_by_email")?;
        Ok(user)
    }

    async fn find_by_uuid(&self, uuid: Uuid) -> anyhow::Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, uuid, name, email, birth_date, password, role
            FROM users
            WHERE uuid = $1
            "#,
        )
        .bind(uuid)
        .fetch_optional(&self.db)
        .await
        .context("find_by_uuid")?;
        Ok(user)
    }

    async fn list(&self) -> anyhow::Result<Vec<UserRecord>> {
        let rows = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, uuid, name, email, birth_date, password, role
            FROM users
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        Ok(rows)
    }

    async fn insert(&self, user: NewUser) -> anyhow::Result<UserRecord> {
        let row = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (uuid, name, email, birth_date, password, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, uuid, name, email, birth_date, password, role
            "#,
        )
        .bind(user.uuid)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.birth_date)
        .bind(&user.password)
        .bind(user.role)
        .fetch_one(&self.db)
        .await;

        match row {
            Ok(row) => Ok(row),
            Err(sqlx::Error::Database(e))
                if e.is_unique_violation() && e.constraint() == Some(EMAIL_UNIQUE_CONSTRAINT) =>
            {
                Err(DuplicateEmail(user.email).into())
            }
            Err(e) => Err(anyhow::Error::new(e).context("insert user")),
        }
    }

    async fn save(&self, user: &UserRecord) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
               SET name = $2, birth_date = $3, password = $4, role = $5
             WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.birth_date)
        .bind(&user.password)
        .bind(user.role)
        .execute(&self.db)
        .await
        .context("update user")?;
        Ok(())
    }

    async fn delete_by_id(&self, id: i64) -> anyhow::Result<()> {
        sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete user")?;
        Ok(())
    }
}

/// Process-local directory keyed by internal id.
#[derive(Default)]
pub struct MemoryUserDirectory {
    rows: RwLock<BTreeMap<i64, UserRecord>>,
    last_id: AtomicI64,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn exists_by_email(&self, email: &str) -> anyhow::Result<bool> {
        Ok(self.rows.read().await.values().any(|u| u.email == email))
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_uuid(&self, uuid: Uuid) -> anyhow::Result<Option<UserRecord>> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|u| u.uuid == uuid)
            .cloned())
    }

    async fn list(&self) -> anyhow::Result<Vec<UserRecord>> {
        Ok(self.rows.read().await.values().cloned().collect())
    }

    async fn insert(&self, user: NewUser) -> anyhow::Result<UserRecord> {
        let mut rows = self.rows.write().await;
        if rows.values().any(|u| u.email == user.email) {
            return Err(DuplicateEmail(user.email).into());
        }
        if rows.values().any(|u| u.uuid == user.uuid) {
            anyhow::bail!("duplicate uuid: {}", user.uuid);
        }
        let id = self.last_id.fetch_add(1, Ordering::Relaxed) + 1;
        let record = UserRecord {
            id,
            uuid: user.uuid,
            name: user.name,
            email: user.email,
            birth_date: user.birth_date,
            password: user.password,
            role: user.role,
        };
        rows.insert(id, record.clone());
        Ok(record)
    }

    async fn save(&self, user: &UserRecord) -> anyhow::Result<()> {
        if let Some(row) = self.rows.write().await.get_mut(&user.id) {
            row.name = user.name.clone();
            row.birth_date = user.birth_date.clone();
            row.password = user.password.clone();
            row.role = user.role;
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: i64) -> anyhow::Result<()> {
        self.rows.write().await.remove(&id);
        Ok(())
    }
}
