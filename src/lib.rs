//! Plan Analytics - player activity aggregation and retention prediction.
//!
//! This library derives population metrics for multiplayer game server
//! dashboards from immutable snapshots of player history.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Plan Analytics                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌────────────────┐   ┌────────────────┐   │
//! │  │  Snapshot   │──▶│ PlayersMutator │──▶│   Aggregates   │   │
//! │  │  (storage)  │   │   (filters)    │   │ (counts, maps) │   │
//! │  └─────────────┘   └────────────────┘   └────────────────┘   │
//! │                           │                     │            │
//! │                           ▼                     ▼            │
//! │                   ┌───────────────┐     ┌───────────────┐    │
//! │                   │ ActivityIndex │     │   Retention   │    │
//! │                   │ (weekly bins) │     │  (centroids)  │    │
//! │                   └───────────────┘     └───────────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use plan_analytics::{PlayerContainer, PlayersMutator, Session};
//! use uuid::Uuid;
//!
//! let players = PlayersMutator::new(vec![
//!     PlayerContainer::new(Uuid::new_v4())
//!         .with_registered(1_000)
//!         .with_sessions(vec![Session::new(1_000, 5_000)]),
//!     PlayerContainer::new(Uuid::new_v4()).with_registered(90_000),
//! ]);
//!
//! let new_players = players.filter_registered_between(0, 10_000);
//! assert_eq!(new_players.filter_played_between(0, 2_000).count(), 1);
//! assert_eq!(players.count(), 2);
//! ```

pub mod config;
pub mod core;
pub mod data;
pub mod report;

// Re-export key types at crate root for convenience
pub use config::{AnalysisConfig, ConfigError};
pub use crate::core::{
    ActivityDataMap, ActivityGroup, ActivityIndex, ActivitySettings, DayBucketer, PlayerFilter,
    PlayersMutator, RetentionData, RetentionError, SessionsMutator,
};
pub use crate::data::{
    AnalysisWarning, DataContainer, Diagnosed, GeoInfo, OnlineResolver, OnlineSample,
    PlayerContainer, PlayersOnlineResolver, ServerSnapshot, Session, SnapshotError,
};
pub use report::{AnalysisReport, ReportBuilder, RetentionReport};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
