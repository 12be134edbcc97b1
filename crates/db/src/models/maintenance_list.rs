use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, types::Json};
use ts_rs::TS;
use uuid::Uuid;

use super::firearm::FirearmSnapshot;

/// A maintainer's working list: an ordered set of firearm snapshots taken at
/// generation time. At most one open list exists per owner, enforced by a
/// partial unique index on `(owner_id) WHERE is_completed = 0`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MaintenanceList {
    pub id: Uuid,
    pub owner_id: Uuid,
    #[sqlx(json)]
    pub items: Vec<FirearmSnapshot>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MaintenanceList {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT id, owner_id, items, is_completed, created_at, updated_at
               FROM maintenance_lists
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_open_by_owner(
        pool: &SqlitePool,
        owner_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT id, owner_id, items, is_completed, created_at, updated_at
               FROM maintenance_lists
               WHERE owner_id = $1 AND is_completed = 0"#,
        )
        .bind(owner_id)
        .fetch_optional(pool)
        .await
    }

    /// Insert a new open list. Fails with a unique violation if the owner
    /// already has one.
    pub async fn create(
        pool: &SqlitePool,
        owner_id: Uuid,
        items: &[FirearmSnapshot],
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Self>(
            r#"INSERT INTO maintenance_lists (id, owner_id, items, is_completed)
               VALUES ($1, $2, $3, 0)
               RETURNING id, owner_id, items, is_completed, created_at, updated_at"#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(Json(items))
        .fetch_one(pool)
        .await
    }

    pub async fn update_items<'e, E>(
        executor: E,
        id: Uuid,
        items: &[FirearmSnapshot],
    ) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"UPDATE maintenance_lists
               SET items = $1, updated_at = datetime('now', 'subsec')
               WHERE id = $2"#,
        )
        .bind(Json(items))
        .bind(id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn mark_completed<'e, E>(executor: E, id: Uuid) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"UPDATE maintenance_lists
               SET is_completed = 1, updated_at = datetime('now', 'subsec')
               WHERE id = $1"#,
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(())
    }
}
