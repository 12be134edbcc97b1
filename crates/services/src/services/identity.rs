//! Role lookups for maintainers, with a TTL cache in front of the
//! `employees` table.

use std::time::Duration;

use db::models::employee::{Employee, Role};
use moka::future::Cache;
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

/// Roles allowed to work a maintenance list.
pub const MAINTENANCE_ROLES: &[Role] = &[Role::Gunsmith, Role::Admin, Role::SuperAdmin];

/// Roles allowed to add or remove catalog firearms.
pub const CATALOG_ADMIN_ROLES: &[Role] = &[Role::Admin, Role::SuperAdmin];

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("unknown user {0}")]
    UnknownUser(Uuid),
    #[error("user {user_id} with role {role} is not permitted to do this")]
    Forbidden { user_id: Uuid, role: Role },
}

/// Role provider. Lookups are cached for a minute; role changes take effect
/// on the next cache miss.
#[derive(Clone)]
pub struct IdentityService {
    pool: SqlitePool,
    roles: Cache<Uuid, Role>,
}

impl IdentityService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            roles: Cache::builder()
                .max_capacity(1024)
                .time_to_live(Duration::from_secs(60))
                .build(),
        }
    }

    pub async fn role_of(&self, user_id: Uuid) -> Result<Role, IdentityError> {
        if let Some(role) = self.roles.get(&user_id).await {
            return Ok(role);
        }

        let employee = Employee::find_by_id(&self.pool, user_id)
            .await?
            .ok_or(IdentityError::UnknownUser(user_id))?;

        self.roles.insert(user_id, employee.role).await;
        Ok(employee.role)
    }

    /// Resolve the user's role and check it against the allowed set.
    pub async fn require(&self, user_id: Uuid, allowed: &[Role]) -> Result<Role, IdentityError> {
        let role = self.role_of(user_id).await?;
        if allowed.contains(&role) {
            Ok(role)
        } else {
            Err(IdentityError::Forbidden { user_id, role })
        }
    }
}
