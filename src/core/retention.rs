//! Retention feature vectors and the nearest-centroid classifier.
//!
//! Training players are split into "retained after a month" and "not
//! retained" cohorts. Each cohort is averaged into a centroid; a player is
//! predicted to be retained when their features lie closer to the retained
//! centroid.

use crate::core::activity::{ActivityIndex, ActivitySettings};
use crate::core::time::DAY_MS;
use crate::data::online::OnlineResolver;
use crate::data::types::PlayerContainer;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use thiserror::Error;

/// Errors from the retention classifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetentionError {
    #[error(
        "No players to compare to after rejecting with date limit \
         (retained: {retained}, not retained: {not_retained})"
    )]
    InsufficientCohorts { retained: usize, not_retained: usize },
}

/// Feature vector describing a player's first days on the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionData {
    features: Vec<f64>,
}

impl RetentionData {
    /// Extract features from a player.
    ///
    /// Features: activity index one day after registering, and the number of
    /// players online when they registered (`-1` when unknown). A player
    /// without a registration date gets all-zero features.
    pub fn for_player(
        player: &PlayerContainer,
        resolver: &dyn OnlineResolver,
        settings: &ActivitySettings,
    ) -> Self {
        let features = match player.registered() {
            Some(registered) => {
                let activity =
                    ActivityIndex::new(player, registered.saturating_add(DAY_MS), settings)
                        .value();
                let online_on_join = resolver.online_on(registered).map_or(-1.0, f64::from);
                vec![activity, online_on_join]
            }
            None => vec![0.0, 0.0],
        };
        Self { features }
    }

    pub fn from_features(features: Vec<f64>) -> Self {
        Self { features }
    }

    pub fn features(&self) -> &[f64] {
        &self.features
    }

    /// Euclidean distance. Missing trailing features count as zero.
    pub fn distance(&self, other: &RetentionData) -> f64 {
        let len = self.features.len().max(other.features.len());
        let at = |v: &[f64], i: usize| v.get(i).copied().unwrap_or(0.0);
        (0..len)
            .map(|i| (at(&self.features, i) - at(&other.features, i)).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// Feature-wise mean, `None` for an empty cohort.
    pub fn average(data: &[RetentionData]) -> Option<RetentionData> {
        let dimensions = data.iter().map(|d| d.features.len()).max()?;
        let features = (0..dimensions)
            .map(|i| {
                data.iter()
                    .map(|d| d.features.get(i).copied().unwrap_or(0.0))
                    .mean()
            })
            .collect();
        Some(Self { features })
    }
}

/// Two-class nearest-centroid classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestCentroid {
    pub retained: RetentionData,
    pub not_retained: RetentionData,
}

impl NearestCentroid {
    /// Build centroids from the two training cohorts.
    pub fn train(
        retained: &[RetentionData],
        not_retained: &[RetentionData],
    ) -> Result<Self, RetentionError> {
        match (
            RetentionData::average(retained),
            RetentionData::average(not_retained),
        ) {
            (Some(retained), Some(not_retained)) => Ok(Self {
                retained,
                not_retained,
            }),
            _ => Err(RetentionError::InsufficientCohorts {
                retained: retained.len(),
                not_retained: not_retained.len(),
            }),
        }
    }

    /// Ties go to "not retained".
    pub fn is_closer_to_retained(&self, data: &RetentionData) -> bool {
        data.distance(&self.retained) < data.distance(&self.not_retained)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::online::{OnlineSample, PlayersOnlineResolver};
    use crate::data::types::Session;
    use uuid::Uuid;

    fn data(features: &[f64]) -> RetentionData {
        RetentionData::from_features(features.to_vec())
    }

    #[test]
    fn test_distance_is_euclidean() {
        assert_eq!(data(&[0.0, 0.0]).distance(&data(&[3.0, 4.0])), 5.0);
        assert_eq!(data(&[1.0]).distance(&data(&[1.0, 2.0])), 2.0);
    }

    #[test]
    fn test_average() {
        let avg = RetentionData::average(&[data(&[10.0, 10.0]), data(&[10.0, 11.0])]).unwrap();
        assert_eq!(avg.features(), &[10.0, 10.5]);
        assert!(RetentionData::average(&[]).is_none());
    }

    #[test]
    fn test_nearest_centroid_scenario() {
        let classifier = NearestCentroid::train(
            &[data(&[10.0, 10.0]), data(&[10.0, 11.0])],
            &[data(&[0.0, 0.0]), data(&[0.0, 1.0])],
        )
        .unwrap();

        assert!(classifier.is_closer_to_retained(&data(&[9.0, 9.0])));
        assert!(!classifier.is_closer_to_retained(&data(&[1.0, 1.0])));
        // Equidistant
        assert!(!classifier.is_closer_to_retained(&data(&[5.0, 5.5])));
    }

    #[test]
    fn test_empty_cohort_fails() {
        let err = NearestCentroid::train(&[data(&[1.0])], &[]).unwrap_err();
        assert_eq!(
            err,
            RetentionError::InsufficientCohorts {
                retained: 1,
                not_retained: 0
            }
        );
    }

    #[test]
    fn test_features_for_player() {
        let resolver = PlayersOnlineResolver::new([OnlineSample::new(1_000, 12)]);
        let settings = ActivitySettings::default();

        let player = PlayerContainer::new(Uuid::new_v4()).with_registered(5_000);
        let features = RetentionData::for_player(&player, &resolver, &settings);
        assert_eq!(features.features(), &[0.0, 12.0]);

        let early = PlayerContainer::new(Uuid::new_v4()).with_registered(500);
        let features = RetentionData::for_player(&early, &resolver, &settings);
        assert_eq!(features.features(), &[0.0, -1.0]);

        let unknown = PlayerContainer::new(Uuid::new_v4());
        let features = RetentionData::for_player(&unknown, &resolver, &settings);
        assert_eq!(features.features(), &[0.0, 0.0]);
    }

    #[test]
    fn test_features_for_late_registration() {
        let resolver = PlayersOnlineResolver::new([OnlineSample::new(1_000, 12)]);
        let registered = i64::MAX - 10;
        let player = PlayerContainer::new(Uuid::new_v4())
            .with_registered(registered)
            .with_sessions(vec![Session::new(registered, registered + 9)]);

        let features = RetentionData::for_player(&player, &resolver, &ActivitySettings::default());
        assert!(features.features()[0] > 0.0);
        assert_eq!(features.features()[1], 12.0);
    }
}
