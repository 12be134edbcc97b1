pub mod events;
pub mod firearms;
pub mod health;
pub mod maintenance;
