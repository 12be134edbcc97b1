use db::DBService;
use services::services::{
    catalog_events::CatalogEvents, identity::IdentityService, maintenance::MaintenanceService,
};

#[derive(Clone)]
pub struct AppState {
    pub db: DBService,
    pub maintenance: MaintenanceService,
    pub identity: IdentityService,
    pub events: CatalogEvents,
}

impl AppState {
    pub fn new(db: DBService) -> Self {
        let events = CatalogEvents::default();
        let maintenance = MaintenanceService::new(db.clone(), events.clone());
        let identity = IdentityService::new(db.pool.clone());
        Self {
            db,
            maintenance,
            identity,
            events,
        }
    }
}
