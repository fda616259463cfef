//! Analytics core.
//!
//! This module contains:
//! - Session queries and the activity index
//! - The player filter/aggregate pipeline
//! - Retention feature extraction and the nearest-centroid classifier

pub mod activity;
pub mod parallel;
pub mod players;
pub mod retention;
pub mod sessions;
pub mod time;

// Re-export commonly used types
pub use activity::{ActivityGroup, ActivityIndex, ActivitySettings};
pub use players::{ActivityDataMap, PlayerFilter, PlayersMutator};
pub use retention::{NearestCentroid, RetentionData, RetentionError};
pub use sessions::SessionsMutator;
pub use time::{DayBucketer, DAY_MS, HOUR_MS, MINUTE_MS, MONTH_MS, SECOND_MS, WEEK_MS};
