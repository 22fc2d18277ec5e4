//! Postgres-backed item repository (table `items`, see [`crate::pg`]).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use postgate_blog::Item;
use postgate_core::{DomainError, DomainResult, ItemId, UserId};

use super::ItemRepository;
use crate::pg::map_sqlx_error;

const SELECT_COLUMNS: &str = "id, owner_id, blogname, author, content, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresItemRepository {
    pool: PgPool,
}

impl PostgresItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn item_from_row(row: &sqlx::postgres::PgRow) -> DomainResult<Item> {
    let read = |e: sqlx::Error| DomainError::unavailable(format!("malformed items row: {e}"));
    let id: Uuid = row.try_get("id").map_err(read)?;
    let owner_id: Uuid = row.try_get("owner_id").map_err(read)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(read)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(read)?;
    Ok(Item {
        id: ItemId::from_uuid(id),
        owner_id: UserId::from_uuid(owner_id),
        blogname: row.try_get("blogname").map_err(read)?,
        author: row.try_get("author").map_err(read)?,
        content: row.try_get("content").map_err(read)?,
        created_at,
        updated_at,
    })
}

#[async_trait]
impl ItemRepository for PostgresItemRepository {
    async fn create(&self, item: Item) -> DomainResult<Item> {
        sqlx::query(
            r#"
            INSERT INTO items (id, owner_id, blogname, author, content, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(item.owner_id.as_uuid())
        .bind(&item.blogname)
        .bind(&item.author)
        .bind(&item.content)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_item", e))?;

        Ok(item)
    }

    async fn get_by_id(&self, id: ItemId) -> DomainResult<Item> {
        let row = sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM items WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_item", e))?;

        match row {
            Some(row) => item_from_row(&row),
            None => Err(DomainError::NotFound),
        }
    }

    async fn list(&self) -> DomainResult<Vec<Item>> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM items ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_items", e))?;

        rows.iter().map(item_from_row).collect()
    }

    async fn update(&self, item: Item) -> DomainResult<Item> {
        let result = sqlx::query(
            r#"
            UPDATE items
            SET blogname = $2, author = $3, content = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(&item.blogname)
        .bind(&item.author)
        .bind(&item.content)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_item", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(item)
    }

    async fn delete(&self, id: ItemId) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_item", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }

    async fn delete_all(&self) -> DomainResult<u64> {
        let result = sqlx::query("DELETE FROM items")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_all_items", e))?;
        Ok(result.rows_affected())
    }
}
