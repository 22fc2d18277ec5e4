//! Shared Postgres plumbing: pool construction, bootstrap DDL and error mapping.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Code | DomainError |
//! |------------|-----------------|-------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (other) | any | `Unavailable` |
//! | PoolTimedOut | N/A | `Unavailable` (timeout) |
//! | PoolClosed / Io / Tls / other | N/A | `Unavailable` |
//!
//! `RowNotFound` never reaches callers: queries use `fetch_optional` or check
//! `rows_affected`.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use postgate_core::DomainError;

/// Tables the Postgres adapters expect. Idempotent.
const BOOTSTRAP_DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS items (
        id UUID PRIMARY KEY,
        owner_id UUID NOT NULL,
        blogname TEXT NOT NULL,
        author TEXT NOT NULL,
        content TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )
    "#,
];

/// Connect a pool whose acquire timeout bounds every storage call.
pub async fn connect(database_url: &str, acquire_timeout: Duration) -> Result<PgPool, DomainError> {
    PgPoolOptions::new()
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))
}

/// Create the `users` and `items` tables when absent.
pub async fn ensure_tables(pool: &PgPool) -> Result<(), DomainError> {
    for ddl in BOOTSTRAP_DDL {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_tables", e))?;
    }
    Ok(())
}

pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> DomainError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => DomainError::Conflict(msg),
                _ => DomainError::Unavailable(msg),
            }
        }
        sqlx::Error::PoolTimedOut => {
            DomainError::unavailable(format!("timed out acquiring connection in {operation}"))
        }
        sqlx::Error::PoolClosed => {
            DomainError::unavailable(format!("connection pool closed in {operation}"))
        }
        other => DomainError::unavailable(format!("{operation}: {other}")),
    }
}
