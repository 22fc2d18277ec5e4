//! Postgres-backed credential store.
//!
//! Table `users`: `id UUID PRIMARY KEY`, `username TEXT UNIQUE`,
//! `password_hash TEXT`, `role TEXT`, `created_at TIMESTAMPTZ`. A unique
//! violation on insert (`23505`) maps to `Conflict`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use postgate_auth::{CredentialStore, Role, UserAccount};
use postgate_core::{DomainError, DomainResult, UserId};

use crate::pg::map_sqlx_error;

#[derive(Debug, Clone)]
pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn account_from_row(row: &sqlx::postgres::PgRow) -> DomainResult<UserAccount> {
    let read = |e: sqlx::Error| DomainError::unavailable(format!("malformed users row: {e}"));
    let id: Uuid = row.try_get("id").map_err(read)?;
    let role: String = row.try_get("role").map_err(read)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(read)?;
    Ok(UserAccount {
        id: UserId::from_uuid(id),
        username: row.try_get("username").map_err(read)?,
        password_hash: row.try_get("password_hash").map_err(read)?,
        role: role
            .parse::<Role>()
            .map_err(|e| DomainError::unavailable(format!("malformed users row: {e}")))?,
        created_at,
    })
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn find_by_username(&self, username: &str) -> DomainResult<UserAccount> {
        let row = sqlx::query(
            r#"
            SELECT id, username, password_hash, role, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user", e))?;

        match row {
            Some(row) => account_from_row(&row),
            None => Err(DomainError::NotFound),
        }
    }

    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> DomainResult<UserAccount> {
        let account = UserAccount::new(username, password_hash, role);
        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_user", e))?;

        Ok(account)
    }
}
