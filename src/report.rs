//! Serializable analysis payload for dashboards.
//!
//! A report bundles the aggregates a server overview page needs, computed
//! from one [`PlayersMutator`] at one reference date.

use crate::core::activity::ActivityGroup;
use crate::core::players::{ActivityDataMap, PlayersMutator};
use crate::data::online::OnlineResolver;
use crate::data::snapshot::AnalysisWarning;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// The name of this producer.
pub const PRODUCER_NAME: &str = "plan-analytics";

/// Producer metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    /// Unique instance identifier
    pub instance_id: Uuid,
}

/// Outcome of the retention prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RetentionReport {
    Predicted {
        candidates: usize,
        likely_retained: Vec<Uuid>,
    },
    InsufficientData {
        message: String,
    },
}

/// Complete analysis payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub producer: ReportProducer,
    /// When this payload was computed (RFC3339)
    pub computed_at: String,
    /// Reference date of the analysis (epoch ms)
    pub date: i64,
    pub player_count: usize,
    pub operator_count: usize,
    pub new_per_day: usize,
    /// Latest geolocation label -> player count
    pub geolocations: BTreeMap<String, usize>,
    /// Player count per activity group at `date`
    pub activity_groups: BTreeMap<ActivityGroup, usize>,
    /// Weekly activity group membership
    pub activity: ActivityDataMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention: Option<RetentionReport>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<AnalysisWarning>,
}

/// Builder for analysis reports.
pub struct ReportBuilder {
    instance_id: Uuid,
    warnings: Vec<AnalysisWarning>,
}

impl ReportBuilder {
    /// Create a new builder with a unique instance ID.
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4(),
            warnings: Vec::new(),
        }
    }

    /// Carry warnings produced while loading the data.
    pub fn with_warnings(mut self, warnings: Vec<AnalysisWarning>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Build a report over `players` at `date`.
    pub fn build(&self, players: &PlayersMutator, date: i64) -> AnalysisReport {
        let mut geolocations = BTreeMap::new();
        for geolocation in players.geolocations() {
            *geolocations.entry(geolocation).or_insert(0) += 1;
        }

        AnalysisReport {
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: crate::VERSION.to_string(),
                instance_id: self.instance_id,
            },
            computed_at: Utc::now().to_rfc3339(),
            date,
            player_count: players.count(),
            operator_count: players.operators().len(),
            new_per_day: players.new_per_day(),
            geolocations,
            activity_groups: players.activity_groups(date),
            activity: players.to_activity_data_map(date),
            retention: None,
            warnings: self.warnings.clone(),
        }
    }

    /// Build a report that also predicts retention of `candidates`.
    ///
    /// A degenerate training set is reported, not propagated.
    pub fn build_with_retention(
        &self,
        players: &PlayersMutator,
        candidates: &PlayersMutator,
        date: i64,
        date_limit: i64,
        online_resolver: &dyn OnlineResolver,
    ) -> AnalysisReport {
        let mut report = self.build(players, date);
        let retention = match players.compare_and_find_those_likely_to_be_retained(
            candidates,
            date_limit,
            online_resolver,
        ) {
            Ok(retained) => RetentionReport::Predicted {
                candidates: candidates.count(),
                likely_retained: retained.uuids(),
            },
            Err(e) => {
                tracing::warn!("Retention prediction skipped: {e}");
                RetentionReport::InsufficientData {
                    message: e.to_string(),
                }
            }
        };
        report.retention = Some(retention);
        report
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}
