//! Filter and aggregate pipeline over a collection of players.
//!
//! Every filter returns a new [`PlayersMutator`] and leaves the original
//! untouched, so one mutator can feed several independent branches. Players
//! are shared behind `Arc`, so branching never copies player data and never
//! exposes it mutably.

use crate::core::activity::{ActivityGroup, ActivitySettings};
use crate::core::parallel::{default_workers, par_map};
use crate::core::retention::{NearestCentroid, RetentionData, RetentionError};
use crate::core::sessions::SessionsMutator;
use crate::core::time::{DayBucketer, MONTH_MS};
use crate::data::online::OnlineResolver;
use crate::data::snapshot::{AnalysisWarning, DataContainer, Diagnosed};
use crate::data::types::{PlayerContainer, Session};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use uuid::Uuid;

/// `bucket timestamp -> activity group -> players`.
pub type ActivityDataMap = BTreeMap<i64, BTreeMap<ActivityGroup, BTreeSet<Uuid>>>;

/// Decides whether a player stays in the pipeline.
pub trait PlayerFilter {
    fn keep(&self, player: &PlayerContainer) -> bool;
}

impl<F> PlayerFilter for F
where
    F: Fn(&PlayerContainer) -> bool,
{
    fn keep(&self, player: &PlayerContainer) -> bool {
        self(player)
    }
}

/// Immutable, chainable view over a set of players.
#[derive(Debug, Clone)]
pub struct PlayersMutator {
    players: Vec<Arc<PlayerContainer>>,
    settings: ActivitySettings,
    days: DayBucketer,
    workers: usize,
}

impl PlayersMutator {
    pub fn new(players: Vec<PlayerContainer>) -> Self {
        Self::from_shared(players.into_iter().map(Arc::new).collect())
    }

    pub fn from_shared(players: Vec<Arc<PlayerContainer>>) -> Self {
        Self {
            players,
            settings: ActivitySettings::default(),
            days: DayBucketer::default(),
            workers: default_workers(),
        }
    }

    /// Mutator over the player list of a storage container.
    ///
    /// A container without a player list yields an empty mutator and a
    /// warning rather than an error.
    pub fn for_container(container: &dyn DataContainer) -> Diagnosed<Self> {
        match container.players() {
            Some(players) => Diagnosed::clean(Self::new(players)),
            None => {
                let warning = AnalysisWarning::MissingPlayers {
                    container: container.container_name().to_string(),
                };
                tracing::warn!("{warning}");
                Diagnosed::with_warning(Self::new(Vec::new()), warning)
            }
        }
    }

    /// Independent copy with its own backing sequence.
    pub fn copy_of(&self) -> Self {
        self.clone()
    }

    pub fn with_settings(mut self, settings: ActivitySettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_day_bucketer(mut self, days: DayBucketer) -> Self {
        self.days = days;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn settings(&self) -> &ActivitySettings {
        &self.settings
    }

    /// Same configuration, different players.
    fn derive(&self, players: Vec<Arc<PlayerContainer>>) -> Self {
        Self {
            players,
            settings: self.settings,
            days: self.days,
            workers: self.workers,
        }
    }

    // ------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------

    /// Keep players accepted by `filter`, preserving order.
    pub fn filter_by<P: PlayerFilter>(&self, filter: P) -> Self {
        self.derive(
            self.players
                .iter()
                .filter(|player| filter.keep(player))
                .cloned()
                .collect(),
        )
    }

    /// Players with a session starting or ending inside `[after, before]`.
    pub fn filter_played_between(&self, after: i64, before: i64) -> Self {
        self.filter_by(move |player: &PlayerContainer| {
            player
                .sessions()
                .is_some_and(|sessions| SessionsMutator::new(sessions).played_between(after, before))
        })
    }

    /// Players registered inside `[after, before]`.
    pub fn filter_registered_between(&self, after: i64, before: i64) -> Self {
        self.filter_by(move |player: &PlayerContainer| {
            player
                .registered()
                .is_some_and(|date| after <= date && date <= before)
        })
    }

    /// Players who did not play in either half of `[max(after, registered), before]`.
    ///
    /// This selects players who went dormant in the window. It is not the
    /// "retained" of [`PlayersMutator::compare_and_find_those_likely_to_be_retained`],
    /// which means active in both halves of the month after registering.
    pub fn filter_retained(&self, after: i64, before: i64) -> Self {
        self.filter_by(move |player: &PlayerContainer| {
            let back_limit = after.max(player.registered().unwrap_or(0));
            let half = back_limit.saturating_add(before.saturating_sub(back_limit) / 2);
            let sessions = SessionsMutator::for_container(player);
            !sessions.played_between(back_limit, half) && !sessions.played_between(half, before)
        })
    }

    /// Players whose activity index at `date` is at least `threshold`.
    pub fn filter_active(&self, date: i64, threshold: f64) -> Self {
        let settings = self.settings;
        self.filter_by(move |player: &PlayerContainer| {
            player.activity_index(date, &settings).value() >= threshold
        })
    }

    /// Players whose ban flag equals `banned`; an absent flag means not banned.
    pub fn filter_banned(&self, banned: bool) -> Self {
        self.filter_by(move |player: &PlayerContainer| {
            player.is_banned().unwrap_or(false) == banned
        })
    }

    // ------------------------------------------------------------------
    // Aggregates
    // ------------------------------------------------------------------

    pub fn all(&self) -> &[Arc<PlayerContainer>] {
        &self.players
    }

    pub fn count(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Registration dates in player order, `-1` where unknown.
    pub fn register_dates(&self) -> Vec<i64> {
        self.players
            .iter()
            .map(|player| player.registered().unwrap_or(-1))
            .collect()
    }

    /// Latest geolocation of each player that has one.
    pub fn geolocations(&self) -> Vec<String> {
        self.players
            .iter()
            .filter_map(|player| player.most_recent_geo())
            .map(|geo| geo.geolocation.clone())
            .collect()
    }

    pub fn uuids(&self) -> Vec<Uuid> {
        self.players.iter().map(|player| player.uuid).collect()
    }

    pub fn operators(&self) -> Vec<&PlayerContainer> {
        self.players
            .iter()
            .filter(|player| player.is_operator().unwrap_or(false))
            .map(|player| player.as_ref())
            .collect()
    }

    /// All sessions, player by player.
    pub fn sessions(&self) -> Vec<&Session> {
        self.players
            .iter()
            .flat_map(|player| player.sessions().unwrap_or(&[]))
            .collect()
    }

    /// Average registrations per day that saw at least one registration.
    ///
    /// Days are bucketed by day of the year.
    pub fn new_per_day(&self) -> usize {
        let register_dates = self.register_dates();
        let days: HashSet<u32> = register_dates
            .iter()
            .map(|&date| self.days.day_of_year(date))
            .collect();

        if days.is_empty() {
            return 0;
        }
        register_dates.len() / days.len()
    }

    /// Activity group membership at weekly buckets from `date` back two months.
    ///
    /// With no players the map holds a single empty entry for `date`.
    pub fn to_activity_data_map(&self, date: i64) -> ActivityDataMap {
        let mut activity_data = ActivityDataMap::new();
        if self.players.is_empty() {
            activity_data.insert(date, BTreeMap::new());
            return activity_data;
        }

        let bucket_times = self.activity_bucket_times(date);
        let settings = self.settings;
        let groups_per_player = par_map(&self.players, self.workers, |player| {
            bucket_times
                .iter()
                .map(|&time| (time, player.activity_index(time, &settings).group()))
                .collect::<Vec<_>>()
        });

        for (player, groups) in self.players.iter().zip(groups_per_player) {
            for (time, group) in groups {
                activity_data
                    .entry(time)
                    .or_default()
                    .entry(group)
                    .or_default()
                    .insert(player.uuid);
            }
        }

        tracing::debug!(
            players = self.players.len(),
            buckets = bucket_times.len(),
            "Computed activity data map"
        );
        activity_data
    }

    /// Number of players in each activity group at `date`.
    pub fn activity_groups(&self, date: i64) -> BTreeMap<ActivityGroup, usize> {
        let settings = self.settings;
        let groups = par_map(&self.players, self.workers, |player| {
            player.activity_index(date, &settings).group()
        });

        let mut counts = BTreeMap::new();
        for group in groups {
            *counts.entry(group).or_insert(0) += 1;
        }
        counts
    }

    fn activity_bucket_times(&self, date: i64) -> Vec<i64> {
        let limit = date.saturating_sub(self.settings.lookback_ms);
        let step = self.settings.bucket_ms.max(1);
        std::iter::successors(Some(date), |t| t.checked_sub(step))
            .take_while(|&t| t >= limit)
            .collect()
    }

    // ------------------------------------------------------------------
    // Retention
    // ------------------------------------------------------------------

    /// Predict which players of `compare_to` will be retained.
    ///
    /// Players of this mutator registered at or before `date_limit` form the
    /// training set: those who played in both halves of the month after
    /// registering are "retained", the rest are not. Each player of
    /// `compare_to` is assigned to the closer cohort centroid.
    ///
    /// Fails if either training cohort is empty.
    pub fn compare_and_find_those_likely_to_be_retained(
        &self,
        compare_to: &PlayersMutator,
        date_limit: i64,
        online_resolver: &dyn OnlineResolver,
    ) -> Result<PlayersMutator, RetentionError> {
        let mut retained_after_month = Vec::new();
        let mut not_retained_after_month = Vec::new();

        for player in &self.players {
            // Discard uncertain data
            let Some(registered) = player.registered().filter(|&r| r <= date_limit) else {
                continue;
            };

            let half = registered.saturating_add(MONTH_MS / 2);
            let month_after_register = registered.saturating_add(MONTH_MS);
            if player.played_between(registered, half)
                && player.played_between(half, month_after_register)
            {
                retained_after_month.push(Arc::clone(player));
            } else {
                not_retained_after_month.push(Arc::clone(player));
            }
        }

        tracing::debug!(
            retained = retained_after_month.len(),
            not_retained = not_retained_after_month.len(),
            "Split retention training cohorts"
        );

        if retained_after_month.is_empty() || not_retained_after_month.is_empty() {
            return Err(RetentionError::InsufficientCohorts {
                retained: retained_after_month.len(),
                not_retained: not_retained_after_month.len(),
            });
        }

        let settings = self.settings;
        let extract = |player: &Arc<PlayerContainer>| {
            RetentionData::for_player(player, online_resolver, &settings)
        };
        let retained = par_map(&retained_after_month, self.workers, extract);
        let not_retained = par_map(&not_retained_after_month, self.workers, extract);
        let classifier = NearestCentroid::train(&retained, &not_retained)?;

        let candidates = par_map(&compare_to.players, self.workers, extract);
        let to_be_retained = compare_to
            .players
            .iter()
            .zip(candidates)
            .filter(|(_, data)| classifier.is_closer_to_retained(data))
            .map(|(player, _)| Arc::clone(player))
            .collect();

        Ok(self.derive(to_be_retained))
    }
}
