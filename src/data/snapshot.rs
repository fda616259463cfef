//! Boundary with the storage layer.
//!
//! A [`DataContainer`] hands the core its player list. Containers that do not
//! carry a player list produce a warning instead of an error so dashboards
//! stay partially functional.

use crate::data::online::OnlineSample;
use crate::data::types::PlayerContainer;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Source of a materialized player list.
pub trait DataContainer {
    /// Human readable name used in diagnostics.
    fn container_name(&self) -> &str;

    /// The player list, or `None` if this container does not support it.
    fn players(&self) -> Option<Vec<PlayerContainer>>;
}

/// Recoverable problems found while preparing an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisWarning {
    /// The container has no player list; an empty one was used.
    #[error("{container} does not support the players key")]
    MissingPlayers { container: String },
}

/// A value together with the warnings produced while computing it.
#[derive(Debug, Clone)]
pub struct Diagnosed<T> {
    pub value: T,
    pub warnings: Vec<AnalysisWarning>,
}

impl<T> Diagnosed<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(value: T, warning: AnalysisWarning) -> Self {
        Self {
            value,
            warnings: vec![warning],
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Errors while reading a snapshot file.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// JSON export of one server's player data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSnapshot {
    /// Server name
    #[serde(default)]
    pub server: String,
    /// Player list, absent when the exporter did not include it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub players: Option<Vec<PlayerContainer>>,
    /// Online player count samples
    #[serde(default)]
    pub online_samples: Vec<OnlineSample>,
}

impl ServerSnapshot {
    pub fn new(server: impl Into<String>, players: Vec<PlayerContainer>) -> Self {
        Self {
            server: server.into(),
            players: Some(players),
            online_samples: Vec::new(),
        }
    }

    /// Read a snapshot from a JSON file.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl DataContainer for ServerSnapshot {
    fn container_name(&self) -> &str {
        if self.server.is_empty() {
            "ServerSnapshot"
        } else {
            &self.server
        }
    }

    fn players(&self) -> Option<Vec<PlayerContainer>> {
        self.players.clone()
    }
}
