//! Catalog change feed: a broadcast channel of insert/update/delete events
//! plus the reducer that applies them to a local snapshot list.

use db::models::firearm::{Firearm, FirearmSnapshot};
use serde::Serialize;
use tokio::sync::broadcast;
use ts_rs::TS;
use uuid::Uuid;

/// Change event emitted after a committed catalog mutation.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum CatalogEvent {
    Created(Firearm),
    Updated(Firearm),
    Deleted(Uuid),
}

/// Broadcast channel for catalog events. Cloning shares the sender; views
/// subscribe for their own receiver.
#[derive(Clone)]
pub struct CatalogEvents {
    tx: broadcast::Sender<CatalogEvent>,
}

impl CatalogEvents {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. A send with no subscribers is not an error.
    pub fn publish(&self, event: CatalogEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for CatalogEvents {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Apply a catalog event to a working list's snapshots.
///
/// Membership of a working list is fixed at generation time, so `Created` is
/// a no-op. `Updated` overlays the mutable fields onto a matching snapshot in
/// place; `Deleted` removes it.
pub fn apply_event(items: &mut Vec<FirearmSnapshot>, event: &CatalogEvent) {
    match event {
        CatalogEvent::Created(_) => {}
        CatalogEvent::Updated(firearm) => {
            if let Some(snapshot) = items.iter_mut().find(|item| item.id == firearm.id) {
                snapshot.overlay(firearm);
            }
        }
        CatalogEvent::Deleted(id) => {
            items.retain(|item| item.id != *id);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use db::models::firearm::FirearmCategory;

    use super::*;

    fn firearm(id: Uuid, status: Option<&str>) -> Firearm {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        Firearm {
            id,
            name: "Test".to_string(),
            category: FirearmCategory::Handgun,
            last_service_date: None,
            service_interval_days: 30,
            notes: None,
            status: status.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    fn snapshots() -> Vec<FirearmSnapshot> {
        vec![
            FirearmSnapshot::from(&firearm(Uuid::new_v4(), None)),
            FirearmSnapshot::from(&firearm(Uuid::new_v4(), None)),
        ]
    }

    #[test]
    fn updated_overlays_matching_snapshot_in_place() {
        let mut items = snapshots();
        let target = items[1].id;
        let order: Vec<Uuid> = items.iter().map(|item| item.id).collect();

        apply_event(
            &mut items,
            &CatalogEvent::Updated(firearm(target, Some("Repaired"))),
        );

        assert_eq!(
            items.iter().map(|item| item.id).collect::<Vec<_>>(),
            order,
            "order and membership unchanged"
        );
        assert_eq!(items[1].status.as_deref(), Some("Repaired"));
        assert_eq!(items[0].status, None);
    }

    #[test]
    fn updated_for_unknown_firearm_is_a_noop() {
        let mut items = snapshots();
        let before = items.clone();
        apply_event(
            &mut items,
            &CatalogEvent::Updated(firearm(Uuid::new_v4(), Some("x"))),
        );
        assert_eq!(items, before);
    }

    #[test]
    fn deleted_removes_snapshot() {
        let mut items = snapshots();
        let target = items[0].id;
        apply_event(&mut items, &CatalogEvent::Deleted(target));
        assert_eq!(items.len(), 1);
        assert!(items.iter().all(|item| item.id != target));
    }

    #[test]
    fn created_does_not_grow_a_working_list() {
        let mut items = snapshots();
        apply_event(
            &mut items,
            &CatalogEvent::Created(firearm(Uuid::new_v4(), None)),
        );
        assert_eq!(items.len(), 2);
    }
}
