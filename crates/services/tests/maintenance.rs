//! Integration tests for the maintenance list lifecycle against an
//! in-memory SQLite database.

use chrono::{Duration, Utc};
use db::{
    DBService,
    models::{
        firearm::{CreateFirearm, Firearm, FirearmCategory},
        maintenance_list::MaintenanceList,
    },
};
use services::services::{
    catalog_events::CatalogEvents,
    maintenance::{MaintenanceError, MaintenanceService},
    rotation::DEFAULT_WINDOW_SIZE,
};
use uuid::Uuid;

async fn service() -> (MaintenanceService, DBService) {
    let db = DBService::new_in_memory().await.expect("in-memory db");
    let service = MaintenanceService::new(db.clone(), CatalogEvents::default());
    (service, db)
}

async fn seed_firearm(
    db: &DBService,
    name: &str,
    category: FirearmCategory,
    last_service_days_ago: Option<i64>,
) -> Firearm {
    Firearm::create(
        &db.pool,
        &CreateFirearm {
            name: name.to_string(),
            category,
            service_interval_days: 30,
            last_service_date: last_service_days_ago.map(|days| Utc::now() - Duration::days(days)),
        },
    )
    .await
    .expect("seed firearm")
}

async fn seed_catalog(db: &DBService) -> Vec<Firearm> {
    let mut firearms = Vec::new();
    for (name, days) in [("HG-A", Some(10)), ("HG-B", Some(20)), ("HG-C", None)] {
        firearms.push(seed_firearm(db, name, FirearmCategory::Handgun, days).await);
    }
    for (name, days) in [("LG-A", Some(5)), ("LG-B", None)] {
        firearms.push(seed_firearm(db, name, FirearmCategory::LongGun, days).await);
    }
    firearms
}

#[tokio::test]
async fn creates_list_when_none_open() {
    let (service, db) = service().await;
    seed_catalog(&db).await;

    let owner = Uuid::new_v4();
    let list = service.get_or_create_current_list(owner).await.unwrap();

    assert_eq!(list.owner_id, owner);
    assert!(!list.is_completed);
    assert_eq!(list.items.len(), DEFAULT_WINDOW_SIZE * 2);
    assert!(
        list.items.iter().all(|item| item.status.is_none()),
        "fresh lists start with statuses reset"
    );

    let handguns = list
        .items
        .iter()
        .take_while(|item| item.category == FirearmCategory::Handgun)
        .count();
    assert_eq!(handguns, DEFAULT_WINDOW_SIZE, "handgun window comes first");
}

#[tokio::test]
async fn get_or_create_returns_existing_open_list() {
    let (service, db) = service().await;
    seed_catalog(&db).await;

    let owner = Uuid::new_v4();
    let first = service.get_or_create_current_list(owner).await.unwrap();
    let second = service.get_or_create_current_list(owner).await.unwrap();

    assert_eq!(first.id, second.id);
}

#[tokio::test]
async fn reconciliation_overlays_catalog_edits_without_changing_membership() {
    let (service, db) = service().await;
    let firearms = seed_catalog(&db).await;

    let owner = Uuid::new_v4();
    let list = service.get_or_create_current_list(owner).await.unwrap();
    let order: Vec<Uuid> = list.items.iter().map(|item| item.id).collect();

    // Out-of-band edit from another view.
    let edited = &firearms[0];
    Firearm::update_status(&db.pool, edited.id, Some("Repaired"))
        .await
        .unwrap();

    let reloaded = service.get_or_create_current_list(owner).await.unwrap();

    assert_eq!(
        reloaded.items.iter().map(|item| item.id).collect::<Vec<_>>(),
        order,
        "membership and order are preserved"
    );
    for item in reloaded.items.iter().filter(|item| item.id == edited.id) {
        assert_eq!(item.status.as_deref(), Some("Repaired"));
    }
}

#[tokio::test]
async fn empty_category_fails_generation() {
    let (service, db) = service().await;
    seed_firearm(&db, "HG-only", FirearmCategory::Handgun, None).await;

    let result = service.get_or_create_current_list(Uuid::new_v4()).await;
    assert!(matches!(result, Err(MaintenanceError::Rotation(_))));
}

#[tokio::test]
async fn open_list_per_owner_is_unique() {
    let (service, db) = service().await;
    seed_catalog(&db).await;

    let owner = Uuid::new_v4();
    let list = service.get_or_create_current_list(owner).await.unwrap();

    // A creator that lost the race after checking for an open list gets the
    // conflict error, not a raw database failure.
    let conflict = service.create_new_list(owner).await;
    assert!(matches!(
        conflict,
        Err(MaintenanceError::ConcurrentListCreation(id)) if id == owner
    ));

    // The partial unique index is what enforces it at the store.
    let raw = MaintenanceList::create(&db.pool, owner, &list.items).await;
    let error = raw.expect_err("second open list must be rejected");
    assert!(
        matches!(&error, sqlx::Error::Database(db_error) if db_error.is_unique_violation())
    );
}

#[tokio::test]
async fn set_item_status_is_idempotent() {
    let (service, db) = service().await;
    seed_catalog(&db).await;

    let list = service
        .get_or_create_current_list(Uuid::new_v4())
        .await
        .unwrap();
    let item_id = list.items[0].id;

    let once = service
        .set_item_status(list.id, item_id, Some("Cleaned".to_string()))
        .await
        .unwrap();
    let twice = service
        .set_item_status(list.id, item_id, Some("Cleaned".to_string()))
        .await
        .unwrap();

    assert_eq!(once.items, twice.items);
    let firearm = Firearm::find_by_id(&db.pool, item_id).await.unwrap().unwrap();
    assert_eq!(firearm.status.as_deref(), Some("Cleaned"));
}

#[tokio::test]
async fn set_item_notes_stamps_service_date_on_both_stores() {
    let (service, db) = service().await;
    seed_catalog(&db).await;

    let list = service
        .get_or_create_current_list(Uuid::new_v4())
        .await
        .unwrap();
    let item_id = list.items[0].id;

    let before = Utc::now();
    let updated = service
        .set_item_notes(list.id, item_id, "Oiled and inspected".to_string())
        .await
        .unwrap();

    let snapshot = updated.items.iter().find(|item| item.id == item_id).unwrap();
    assert_eq!(snapshot.notes.as_deref(), Some("Oiled and inspected"));
    assert!(snapshot.last_service_date.unwrap() >= before);

    let firearm = Firearm::find_by_id(&db.pool, item_id).await.unwrap().unwrap();
    assert_eq!(firearm.notes.as_deref(), Some("Oiled and inspected"));
    assert!(firearm.last_service_date.unwrap() >= before);
}

#[tokio::test]
async fn set_item_interval_rejects_non_positive() {
    let (service, db) = service().await;
    seed_catalog(&db).await;

    let list = service
        .get_or_create_current_list(Uuid::new_v4())
        .await
        .unwrap();
    let item_id = list.items[0].id;

    let result = service.set_item_interval(list.id, item_id, 0).await;
    assert!(matches!(result, Err(MaintenanceError::InvalidInterval(0))));

    let updated = service.set_item_interval(list.id, item_id, 45).await.unwrap();
    let snapshot = updated.items.iter().find(|item| item.id == item_id).unwrap();
    assert_eq!(snapshot.service_interval_days, 45);

    let firearm = Firearm::find_by_id(&db.pool, item_id).await.unwrap().unwrap();
    assert_eq!(firearm.service_interval_days, 45);
}

#[tokio::test]
async fn extreme_interval_does_not_break_generation() {
    let (service, db) = service().await;
    seed_catalog(&db).await;

    let list = service
        .get_or_create_current_list(Uuid::new_v4())
        .await
        .unwrap();
    // A serviced firearm, so the huge interval actually feeds the due date.
    let item_id = list
        .items
        .iter()
        .find(|item| item.last_service_date.is_some())
        .unwrap()
        .id;

    service
        .set_item_interval(list.id, item_id, i64::MAX)
        .await
        .unwrap();

    // Due dates saturate instead of overflowing, so later generations still
    // work with the huge interval in the catalog.
    let regenerated = service.regenerate(list.id).await.unwrap();
    assert_eq!(regenerated.items.len(), DEFAULT_WINDOW_SIZE * 2);
}

#[tokio::test]
async fn delete_item_removes_from_catalog_and_list() {
    let (service, db) = service().await;
    seed_catalog(&db).await;

    let list = service
        .get_or_create_current_list(Uuid::new_v4())
        .await
        .unwrap();
    let item_id = list.items[0].id;

    let updated = service.delete_item(list.id, item_id).await.unwrap();

    assert!(updated.items.iter().all(|item| item.id != item_id));
    let firearm = Firearm::find_by_id(&db.pool, item_id).await.unwrap();
    assert!(firearm.is_none());
}

#[tokio::test]
async fn edits_to_unknown_items_are_rejected() {
    let (service, db) = service().await;
    seed_catalog(&db).await;

    let list = service
        .get_or_create_current_list(Uuid::new_v4())
        .await
        .unwrap();

    let result = service
        .set_item_status(list.id, Uuid::new_v4(), Some("x".to_string()))
        .await;
    assert!(matches!(
        result,
        Err(MaintenanceError::ItemNotInList { .. })
    ));
}

#[tokio::test]
async fn submission_gate_blocks_incomplete_lists_without_writing() {
    let (service, db) = service().await;
    seed_catalog(&db).await;

    let list = service
        .get_or_create_current_list(Uuid::new_v4())
        .await
        .unwrap();

    let result = service.submit(list.id).await;
    let Err(MaintenanceError::IncompleteSubmission(ids)) = result else {
        panic!("expected IncompleteSubmission");
    };
    assert!(!ids.is_empty());

    // No write-back happened: catalog statuses are untouched and the list is
    // still open.
    for firearm in Firearm::list_all(&db.pool).await.unwrap() {
        assert!(firearm.status.is_none());
    }
    let reloaded = MaintenanceList::find_by_id(&db.pool, list.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!reloaded.is_completed);
}

#[tokio::test]
async fn submit_closes_list_writes_back_and_generates_next() {
    let (service, db) = service().await;
    seed_catalog(&db).await;

    let owner = Uuid::new_v4();
    let list = service.get_or_create_current_list(owner).await.unwrap();

    let item_ids: Vec<Uuid> = {
        let mut ids: Vec<Uuid> = list.items.iter().map(|item| item.id).collect();
        ids.sort();
        ids.dedup();
        ids
    };
    for item_id in &item_ids {
        service
            .set_item_notes(list.id, *item_id, "Cleaned barrel".to_string())
            .await
            .unwrap();
        service
            .set_item_status(list.id, *item_id, Some("Maintained".to_string()))
            .await
            .unwrap();
    }

    let next = service.submit(list.id).await.unwrap();

    assert_ne!(next.id, list.id);
    assert_eq!(next.owner_id, owner);
    assert!(!next.is_completed);
    assert!(next.items.iter().all(|item| item.status.is_none()));

    let closed = MaintenanceList::find_by_id(&db.pool, list.id)
        .await
        .unwrap()
        .unwrap();
    assert!(closed.is_completed);

    for item_id in &item_ids {
        let firearm = Firearm::find_by_id(&db.pool, *item_id).await.unwrap().unwrap();
        assert_eq!(firearm.status.as_deref(), Some("Maintained"));
        assert_eq!(firearm.notes.as_deref(), Some("Cleaned barrel"));
        assert!(firearm.last_service_date.is_some());
    }

    // Submitting the closed list again is rejected.
    let again = service.submit(list.id).await;
    assert!(matches!(again, Err(MaintenanceError::ListCompleted(_))));
}

#[tokio::test]
async fn regenerate_replaces_items_and_resets_statuses() {
    let (service, db) = service().await;
    seed_catalog(&db).await;

    let list = service
        .get_or_create_current_list(Uuid::new_v4())
        .await
        .unwrap();
    let item_id = list.items[0].id;

    service
        .set_item_status(list.id, item_id, Some("Maintained".to_string()))
        .await
        .unwrap();
    let shrunk = service.delete_item(list.id, item_id).await.unwrap();
    assert!(shrunk.items.len() < DEFAULT_WINDOW_SIZE * 2);

    let regenerated = service.regenerate(list.id).await.unwrap();

    assert_eq!(regenerated.id, list.id, "list stays open under the same id");
    assert_eq!(regenerated.items.len(), DEFAULT_WINDOW_SIZE * 2);
    assert!(regenerated.items.iter().all(|item| item.status.is_none()));
}
