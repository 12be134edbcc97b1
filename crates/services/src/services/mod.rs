pub mod catalog_events;
pub mod identity;
pub mod maintenance;
pub mod rotation;
