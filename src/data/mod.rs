//! Player records and the storage boundary.
//!
//! The storage layer materializes these records once per request; the
//! analytics core only ever reads them.

pub mod online;
pub mod snapshot;
pub mod types;

// Re-export commonly used types
pub use online::{OnlineResolver, OnlineSample, PlayersOnlineResolver};
pub use snapshot::{AnalysisWarning, DataContainer, Diagnosed, ServerSnapshot, SnapshotError};
pub use types::{GeoInfo, PlayerContainer, Session};
