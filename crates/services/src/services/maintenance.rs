//! Maintenance list lifecycle: get-or-create with catalog overlay,
//! transactional write-through edits, regeneration and submission.

use chrono::Utc;
use db::{
    DBService,
    models::{
        firearm::{CreateFirearm, Firearm, FirearmSnapshot},
        maintenance_list::MaintenanceList,
    },
};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    catalog_events::{CatalogEvent, CatalogEvents},
    rotation::{self, RotationError},
};

#[derive(Debug, Error)]
pub enum MaintenanceError {
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(#[source] sqlx::Error),
    #[error(transparent)]
    Rotation(#[from] RotationError),
    #[error("write to {entity} {id} failed: {source}")]
    WriteFailed {
        entity: &'static str,
        id: Uuid,
        #[source]
        source: sqlx::Error,
    },
    #[error("cannot submit: items missing notes or status: {0:?}")]
    IncompleteSubmission(Vec<Uuid>),
    #[error("an open maintenance list already exists for owner {0}")]
    ConcurrentListCreation(Uuid),
    #[error("maintenance list {0} not found")]
    ListNotFound(Uuid),
    #[error("maintenance list {0} is already completed")]
    ListCompleted(Uuid),
    #[error("firearm {item_id} is not part of list {list_id}")]
    ItemNotInList { list_id: Uuid, item_id: Uuid },
    #[error("service interval must be positive, got {0}")]
    InvalidInterval(i64),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db_error) if db_error.is_unique_violation())
}

/// Owns the lifecycle of maintainers' working lists.
#[derive(Clone)]
pub struct MaintenanceService {
    db: DBService,
    events: CatalogEvents,
}

impl MaintenanceService {
    pub fn new(db: DBService, events: CatalogEvents) -> Self {
        Self { db, events }
    }

    /// Fetch the owner's open list, overlaying any out-of-band catalog edits
    /// onto its snapshots (membership and order never change). Creates a
    /// fresh list from the rotation scheduler when none is open.
    pub async fn get_or_create_current_list(
        &self,
        owner_id: Uuid,
    ) -> Result<MaintenanceList, MaintenanceError> {
        let pool = &self.db.pool;

        if let Some(mut list) = MaintenanceList::find_open_by_owner(pool, owner_id).await? {
            for snapshot in &mut list.items {
                // A firearm deleted from the catalog elsewhere stays in the
                // list untouched; membership is fixed at generation time.
                if let Some(firearm) = Firearm::find_by_id(pool, snapshot.id).await? {
                    snapshot.overlay(&firearm);
                }
            }
            MaintenanceList::update_items(pool, list.id, &list.items).await?;
            return Ok(list);
        }

        self.create_new_list(owner_id).await
    }

    /// Generate a fresh window and persist it as the owner's open list.
    /// Fails with `ConcurrentListCreation` when an open list already exists,
    /// as for a caller that lost the race after checking for one.
    pub async fn create_new_list(
        &self,
        owner_id: Uuid,
    ) -> Result<MaintenanceList, MaintenanceError> {
        let pool = &self.db.pool;

        let catalog = Firearm::list_all(pool)
            .await
            .map_err(MaintenanceError::CatalogUnavailable)?;
        let mut items = rotation::generate_window(&catalog, rotation::DEFAULT_WINDOW_SIZE, 0)?;
        for item in &mut items {
            item.reset_status();
        }

        let list = MaintenanceList::create(pool, owner_id, &items)
            .await
            .map_err(|error| {
                if is_unique_violation(&error) {
                    MaintenanceError::ConcurrentListCreation(owner_id)
                } else {
                    MaintenanceError::Database(error)
                }
            })?;

        info!(
            list_id = %list.id,
            owner_id = %owner_id,
            items = list.items.len(),
            "created new maintenance list"
        );
        Ok(list)
    }

    /// Set an item's status on the authoritative catalog row and the list
    /// snapshot in one transaction.
    pub async fn set_item_status(
        &self,
        list_id: Uuid,
        item_id: Uuid,
        status: Option<String>,
    ) -> Result<MaintenanceList, MaintenanceError> {
        let mut list = self.load_open_list(list_id).await?;
        let status_for_items = status.clone();
        apply_to_item(&mut list, item_id, |item| {
            item.status = status_for_items.clone();
        })?;

        let mut tx = self.db.pool.begin().await?;
        Firearm::update_status(&mut *tx, item_id, status.as_deref())
            .await
            .map_err(|source| MaintenanceError::WriteFailed {
                entity: "firearms_maintenance",
                id: item_id,
                source,
            })?;
        MaintenanceList::update_items(&mut *tx, list_id, &list.items)
            .await
            .map_err(|source| MaintenanceError::WriteFailed {
                entity: "maintenance_lists",
                id: list_id,
                source,
            })?;
        tx.commit().await?;

        self.publish_updated(item_id).await;
        Ok(list)
    }

    /// Update an item's notes. Editing notes counts as performing service, so
    /// the service date is stamped on both the catalog row and the snapshot.
    pub async fn set_item_notes(
        &self,
        list_id: Uuid,
        item_id: Uuid,
        notes: String,
    ) -> Result<MaintenanceList, MaintenanceError> {
        let now = Utc::now();
        let mut list = self.load_open_list(list_id).await?;
        let notes_for_items = notes.clone();
        apply_to_item(&mut list, item_id, |item| {
            item.notes = Some(notes_for_items.clone());
            item.last_service_date = Some(now);
        })?;

        let mut tx = self.db.pool.begin().await?;
        Firearm::update_notes_and_service_date(&mut *tx, item_id, &notes, now)
            .await
            .map_err(|source| MaintenanceError::WriteFailed {
                entity: "firearms_maintenance",
                id: item_id,
                source,
            })?;
        MaintenanceList::update_items(&mut *tx, list_id, &list.items)
            .await
            .map_err(|source| MaintenanceError::WriteFailed {
                entity: "maintenance_lists",
                id: list_id,
                source,
            })?;
        tx.commit().await?;

        self.publish_updated(item_id).await;
        Ok(list)
    }

    /// Change an item's service interval on both stores.
    pub async fn set_item_interval(
        &self,
        list_id: Uuid,
        item_id: Uuid,
        service_interval_days: i64,
    ) -> Result<MaintenanceList, MaintenanceError> {
        if service_interval_days <= 0 {
            return Err(MaintenanceError::InvalidInterval(service_interval_days));
        }

        let mut list = self.load_open_list(list_id).await?;
        apply_to_item(&mut list, item_id, |item| {
            item.service_interval_days = service_interval_days;
        })?;

        let mut tx = self.db.pool.begin().await?;
        Firearm::update_interval(&mut *tx, item_id, service_interval_days)
            .await
            .map_err(|source| MaintenanceError::WriteFailed {
                entity: "firearms_maintenance",
                id: item_id,
                source,
            })?;
        MaintenanceList::update_items(&mut *tx, list_id, &list.items)
            .await
            .map_err(|source| MaintenanceError::WriteFailed {
                entity: "maintenance_lists",
                id: list_id,
                source,
            })?;
        tx.commit().await?;

        self.publish_updated(item_id).await;
        Ok(list)
    }

    /// Delete the authoritative firearm and drop it from the list.
    pub async fn delete_item(
        &self,
        list_id: Uuid,
        item_id: Uuid,
    ) -> Result<MaintenanceList, MaintenanceError> {
        let mut list = self.load_open_list(list_id).await?;
        if !list.items.iter().any(|item| item.id == item_id) {
            return Err(MaintenanceError::ItemNotInList { list_id, item_id });
        }
        list.items.retain(|item| item.id != item_id);

        let mut tx = self.db.pool.begin().await?;
        Firearm::delete(&mut *tx, item_id)
            .await
            .map_err(|source| MaintenanceError::WriteFailed {
                entity: "firearms_maintenance",
                id: item_id,
                source,
            })?;
        MaintenanceList::update_items(&mut *tx, list_id, &list.items)
            .await
            .map_err(|source| MaintenanceError::WriteFailed {
                entity: "maintenance_lists",
                id: list_id,
                source,
            })?;
        tx.commit().await?;

        self.events.publish(CatalogEvent::Deleted(item_id));
        info!(%list_id, %item_id, "deleted firearm from catalog and list");
        Ok(list)
    }

    /// Replace the list's items with a freshly generated window without
    /// closing the list. Statuses reset to the not-started sentinel, same as
    /// a new list.
    pub async fn regenerate(&self, list_id: Uuid) -> Result<MaintenanceList, MaintenanceError> {
        let mut list = self.load_open_list(list_id).await?;

        let pool = &self.db.pool;
        let catalog = Firearm::list_all(pool)
            .await
            .map_err(MaintenanceError::CatalogUnavailable)?;
        let mut items = rotation::generate_window(&catalog, rotation::DEFAULT_WINDOW_SIZE, 0)?;
        for item in &mut items {
            item.reset_status();
        }

        MaintenanceList::update_items(pool, list_id, &items).await?;
        list.items = items;

        info!(%list_id, items = list.items.len(), "regenerated maintenance list");
        Ok(list)
    }

    /// Submit a completed round: validate, write every item back to the
    /// catalog and close the list in one transaction, then hand the owner the
    /// next freshly generated list.
    pub async fn submit(&self, list_id: Uuid) -> Result<MaintenanceList, MaintenanceError> {
        let list = self.load_open_list(list_id).await?;

        let incomplete: Vec<Uuid> = list
            .items
            .iter()
            .filter(|item| is_blank(&item.notes) || is_blank(&item.status))
            .map(|item| item.id)
            .collect();
        if !incomplete.is_empty() {
            return Err(MaintenanceError::IncompleteSubmission(incomplete));
        }

        let mut tx = self.db.pool.begin().await?;
        for item in &list.items {
            Firearm::record_service(
                &mut *tx,
                item.id,
                item.notes.as_deref(),
                item.status.as_deref(),
                item.last_service_date,
            )
            .await
            .map_err(|source| MaintenanceError::WriteFailed {
                entity: "firearms_maintenance",
                id: item.id,
                source,
            })?;
        }
        MaintenanceList::mark_completed(&mut *tx, list_id)
            .await
            .map_err(|source| MaintenanceError::WriteFailed {
                entity: "maintenance_lists",
                id: list_id,
                source,
            })?;
        tx.commit().await?;

        for item in &list.items {
            self.publish_updated(item.id).await;
        }

        info!(
            %list_id,
            owner_id = %list.owner_id,
            items = list.items.len(),
            "maintenance list submitted"
        );

        self.get_or_create_current_list(list.owner_id).await
    }

    /// Add a firearm to the catalog. It joins the rotation on the next
    /// generated window.
    pub async fn add_firearm(&self, data: &CreateFirearm) -> Result<Firearm, MaintenanceError> {
        if data.service_interval_days <= 0 {
            return Err(MaintenanceError::InvalidInterval(data.service_interval_days));
        }

        let firearm = Firearm::create(&self.db.pool, data).await?;
        self.events.publish(CatalogEvent::Created(firearm.clone()));
        info!(firearm_id = %firearm.id, name = %firearm.name, "added firearm to catalog");
        Ok(firearm)
    }

    /// Remove a firearm from the catalog. Open lists keep their snapshot of
    /// it; live views drop it via the change feed.
    pub async fn remove_firearm(&self, firearm_id: Uuid) -> Result<(), MaintenanceError> {
        Firearm::delete(&self.db.pool, firearm_id).await?;
        self.events.publish(CatalogEvent::Deleted(firearm_id));
        info!(%firearm_id, "removed firearm from catalog");
        Ok(())
    }

    async fn load_open_list(&self, list_id: Uuid) -> Result<MaintenanceList, MaintenanceError> {
        let list = MaintenanceList::find_by_id(&self.db.pool, list_id)
            .await?
            .ok_or(MaintenanceError::ListNotFound(list_id))?;
        if list.is_completed {
            return Err(MaintenanceError::ListCompleted(list_id));
        }
        Ok(list)
    }

    async fn publish_updated(&self, firearm_id: Uuid) {
        match Firearm::find_by_id(&self.db.pool, firearm_id).await {
            Ok(Some(firearm)) => self.events.publish(CatalogEvent::Updated(firearm)),
            Ok(None) => {}
            Err(error) => {
                warn!(%firearm_id, %error, "failed to load firearm for change event");
            }
        }
    }
}

/// Apply an edit to every snapshot of the firearm. A cyclic window over a
/// short partition can hold the same firearm more than once, and all copies
/// mirror the same authoritative row.
fn apply_to_item<F>(
    list: &mut MaintenanceList,
    item_id: Uuid,
    mutate: F,
) -> Result<(), MaintenanceError>
where
    F: Fn(&mut FirearmSnapshot),
{
    let mut found = false;
    for item in list.items.iter_mut().filter(|item| item.id == item_id) {
        mutate(item);
        found = true;
    }
    if found {
        Ok(())
    } else {
        Err(MaintenanceError::ItemNotInList {
            list_id: list.id,
            item_id,
        })
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value
        .as_deref()
        .map(|text| text.trim().is_empty())
        .unwrap_or(true)
}
