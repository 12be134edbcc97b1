//! Rotation scheduler: deterministic, fixed-size maintenance windows over the
//! firearm catalog, partitioned by category and ordered by due date.

use chrono::{DateTime, Duration, Utc};
use db::models::firearm::{Firearm, FirearmCategory, FirearmSnapshot};
use thiserror::Error;

/// Firearms selected per category for one maintenance round.
pub const DEFAULT_WINDOW_SIZE: usize = 13;

#[derive(Debug, Error, PartialEq)]
pub enum RotationError {
    #[error("no {0} firearms in the catalog to rotate")]
    EmptyCategory(FirearmCategory),
}

/// When the firearm is next due for service. `None` means never serviced,
/// which sorts before every concrete date. Intervals too large to represent
/// saturate to the far future rather than overflowing.
pub fn due_date(firearm: &Firearm) -> Option<DateTime<Utc>> {
    firearm.last_service_date.map(|serviced| {
        Duration::try_days(firearm.service_interval_days)
            .and_then(|interval| serviced.checked_add_signed(interval))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    })
}

/// Build one maintenance window over the catalog.
///
/// Each category partition is stable-sorted ascending by due date (ties keep
/// catalog order), then `window_size` items are taken circularly starting at
/// `start_index`. Partitions shorter than the window repeat items; an empty
/// partition is an error rather than an infinite loop. Per-category windows
/// are concatenated in `FirearmCategory::ALL` order.
///
/// Pure and deterministic for identical inputs.
pub fn generate_window(
    catalog: &[Firearm],
    window_size: usize,
    start_index: usize,
) -> Result<Vec<FirearmSnapshot>, RotationError> {
    let mut window = Vec::with_capacity(window_size * FirearmCategory::ALL.len());

    for category in FirearmCategory::ALL {
        let mut partition: Vec<&Firearm> = catalog
            .iter()
            .filter(|firearm| firearm.category == category)
            .collect();

        if partition.is_empty() {
            if window_size == 0 {
                continue;
            }
            return Err(RotationError::EmptyCategory(category));
        }

        partition.sort_by_key(|firearm| due_date(firearm));

        let mut index = start_index % partition.len();
        for _ in 0..window_size {
            window.push(FirearmSnapshot::from(partition[index]));
            index = (index + 1) % partition.len();
        }
    }

    Ok(window)
}
