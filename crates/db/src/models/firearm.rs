use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

/// Partition key for rotation windows. Window order is fixed: handguns
/// before long guns.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize, TS, EnumString, Display,
)]
#[sqlx(type_name = "firearm_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FirearmCategory {
    Handgun,
    LongGun,
}

impl FirearmCategory {
    pub const ALL: [FirearmCategory; 2] = [FirearmCategory::Handgun, FirearmCategory::LongGun];
}

/// Authoritative catalog row. `last_service_date = NULL` means the firearm
/// has never been serviced and is maximally overdue.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Firearm {
    pub id: Uuid,
    pub name: String,
    pub category: FirearmCategory,
    pub last_service_date: Option<DateTime<Utc>>,
    pub service_interval_days: i64,
    pub notes: Option<String>,
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateFirearm {
    pub name: String,
    pub category: FirearmCategory,
    pub service_interval_days: i64,
    pub last_service_date: Option<DateTime<Utc>>,
}

/// Point-in-time copy of a firearm stored inside a maintenance list. Kept in
/// sync with the catalog by explicit write-through, never by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FirearmSnapshot {
    pub id: Uuid,
    pub name: String,
    pub category: FirearmCategory,
    pub last_service_date: Option<DateTime<Utc>>,
    pub service_interval_days: i64,
    pub notes: Option<String>,
    pub status: Option<String>,
}

impl From<&Firearm> for FirearmSnapshot {
    fn from(firearm: &Firearm) -> Self {
        Self {
            id: firearm.id,
            name: firearm.name.clone(),
            category: firearm.category,
            last_service_date: firearm.last_service_date,
            service_interval_days: firearm.service_interval_days,
            notes: firearm.notes.clone(),
            status: firearm.status.clone(),
        }
    }
}

impl FirearmSnapshot {
    /// Copy the maintainer-mutable fields from an authoritative row onto this
    /// snapshot. Identity and position in the list are untouched.
    pub fn overlay(&mut self, source: &Firearm) {
        self.name = source.name.clone();
        self.last_service_date = source.last_service_date;
        self.service_interval_days = source.service_interval_days;
        self.notes = source.notes.clone();
        self.status = source.status.clone();
    }

    pub fn reset_status(&mut self) {
        self.status = None;
    }
}

impl Firearm {
    /// Full catalog, oldest service first. SQLite sorts NULLs first under
    /// ASC, so never-serviced firearms lead.
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT id, name, category, last_service_date, service_interval_days,
                      notes, status, created_at, updated_at
               FROM firearms_maintenance
               ORDER BY last_service_date ASC"#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT id, name, category, last_service_date, service_interval_days,
                      notes, status, created_at, updated_at
               FROM firearms_maintenance
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(pool: &SqlitePool, data: &CreateFirearm) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, Self>(
            r#"INSERT INTO firearms_maintenance (id, name, category, last_service_date, service_interval_days)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id, name, category, last_service_date, service_interval_days,
                         notes, status, created_at, updated_at"#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(data.category)
        .bind(data.last_service_date)
        .bind(data.service_interval_days)
        .fetch_one(pool)
        .await
    }

    pub async fn update_status<'e, E>(
        executor: E,
        id: Uuid,
        status: Option<&str>,
    ) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"UPDATE firearms_maintenance
               SET status = $1, updated_at = datetime('now', 'subsec')
               WHERE id = $2"#,
        )
        .bind(status)
        .bind(id)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Notes edits count as performing service, so the service date moves too.
    pub async fn update_notes_and_service_date<'e, E>(
        executor: E,
        id: Uuid,
        notes: &str,
        serviced_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"UPDATE firearms_maintenance
               SET notes = $1, last_service_date = $2, updated_at = datetime('now', 'subsec')
               WHERE id = $3"#,
        )
        .bind(notes)
        .bind(serviced_at)
        .bind(id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn update_interval<'e, E>(
        executor: E,
        id: Uuid,
        service_interval_days: i64,
    ) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"UPDATE firearms_maintenance
               SET service_interval_days = $1, updated_at = datetime('now', 'subsec')
               WHERE id = $2"#,
        )
        .bind(service_interval_days)
        .bind(id)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Write-back of a completed round: notes, status and the service date
    /// recorded on the snapshot.
    pub async fn record_service<'e, E>(
        executor: E,
        id: Uuid,
        notes: Option<&str>,
        status: Option<&str>,
        last_service_date: Option<DateTime<Utc>>,
    ) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"UPDATE firearms_maintenance
               SET notes = $1, status = $2, last_service_date = $3,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $4"#,
        )
        .bind(notes)
        .bind(status)
        .bind(last_service_date)
        .bind(id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query("DELETE FROM firearms_maintenance WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
