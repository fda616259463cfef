//! Activity index computation.
//!
//! The index walks backwards from a reference date in fixed-size buckets
//! over a lookback window. Each bucket contributes a value in `(0, 1]` that
//! shrinks as active play time in the bucket grows, so a player who plays
//! a lot in every bucket approaches a score of 5 and a player who never
//! plays scores 0.
//!
//! Only the supplied reference date is used as "now": the same history and
//! date always produce the same score. Play after the reference date is cut
//! off, for open and closed sessions alike.

use crate::core::sessions::{active_play_time_until, SessionsMutator};
use crate::core::time::{MINUTE_MS, MONTH_MS, WEEK_MS};
use crate::data::types::{PlayerContainer, Session};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::f64::consts::FRAC_PI_2;

/// Maximum activity score.
pub const MAX_SCORE: f64 = 5.0;

/// Tunables of the activity index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivitySettings {
    /// Weekly active play time considered "active" (ms)
    pub active_play_threshold_ms: i64,
    /// Total lookback window (ms)
    pub lookback_ms: i64,
    /// Bucket width (ms)
    pub bucket_ms: i64,
}

impl Default for ActivitySettings {
    fn default() -> Self {
        Self {
            active_play_threshold_ms: 30 * MINUTE_MS,
            lookback_ms: 2 * MONTH_MS,
            bucket_ms: WEEK_MS,
        }
    }
}

/// Categorical activity level, most active first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityGroup {
    VeryActive,
    Active,
    Regular,
    Irregular,
    Inactive,
}

impl ActivityGroup {
    /// Lower score bounds, checked from the highest down.
    const THRESHOLDS: [(f64, ActivityGroup); 4] = [
        (3.75, ActivityGroup::VeryActive),
        (3.0, ActivityGroup::Active),
        (2.0, ActivityGroup::Regular),
        (1.0, ActivityGroup::Irregular),
    ];

    pub const ALL: [ActivityGroup; 5] = [
        ActivityGroup::VeryActive,
        ActivityGroup::Active,
        ActivityGroup::Regular,
        ActivityGroup::Irregular,
        ActivityGroup::Inactive,
    ];

    /// Map a score to its group.
    pub fn from_score(score: f64) -> Self {
        Self::THRESHOLDS
            .iter()
            .find(|(limit, _)| score >= *limit)
            .map(|&(_, group)| group)
            .unwrap_or(ActivityGroup::Inactive)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActivityGroup::VeryActive => "VERY_ACTIVE",
            ActivityGroup::Active => "ACTIVE",
            ActivityGroup::Regular => "REGULAR",
            ActivityGroup::Irregular => "IRREGULAR",
            ActivityGroup::Inactive => "INACTIVE",
        }
    }
}

impl std::fmt::Display for ActivityGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Engagement score of one player at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityIndex {
    value: f64,
    date: i64,
}

impl ActivityIndex {
    pub fn new(player: &PlayerContainer, date: i64, settings: &ActivitySettings) -> Self {
        Self::from_sessions(player.sessions().unwrap_or(&[]), date, settings)
    }

    pub fn from_sessions(sessions: &[Session], date: i64, settings: &ActivitySettings) -> Self {
        Self {
            value: compute_score(sessions, date, settings),
            date,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn date(&self) -> i64 {
        self.date
    }

    pub fn group(&self) -> ActivityGroup {
        ActivityGroup::from_score(self.value)
    }
}

/// Bucket end timestamps from `date` back to (exclusive) `date - lookback`.
fn bucket_ends(date: i64, settings: &ActivitySettings) -> impl Iterator<Item = i64> {
    let window_start = date.saturating_sub(settings.lookback_ms);
    let step = settings.bucket_ms.max(1);
    std::iter::successors(Some(date), move |t| t.checked_sub(step))
        .take_while(move |&t| t > window_start)
}

fn compute_score(sessions: &[Session], date: i64, settings: &ActivitySettings) -> f64 {
    if sessions.is_empty() {
        return 0.0;
    }

    let mutator = SessionsMutator::new(sessions);
    let threshold = settings.active_play_threshold_ms.max(1) as f64;
    let window_start = date.saturating_sub(settings.lookback_ms);
    let step = settings.bucket_ms.max(1);

    let indices: Vec<f64> = bucket_ends(date, settings)
        .map(|end| {
            let start = end.saturating_sub(step).max(window_start);
            let playtime =
                active_play_time_until(mutator.filter_sessions_between(start, end), date);
            1.0 / (FRAC_PI_2 * (playtime as f64 / threshold) + 1.0)
        })
        .collect();

    if indices.is_empty() {
        return 0.0;
    }
    MAX_SCORE - MAX_SCORE * indices.iter().mean()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::{DAY_MS, HOUR_MS};

    const NOW: i64 = 1_700_000_000_000;

    /// One session of `hours` every day for `days` days before NOW.
    fn daily_sessions(days: i64, hours: i64) -> Vec<Session> {
        (1..=days)
            .rev()
            .map(|d| {
                let start = NOW - d * DAY_MS;
                Session::new(start, start + hours * HOUR_MS)
            })
            .collect()
    }

    #[test]
    fn test_group_thresholds() {
        assert_eq!(ActivityGroup::from_score(5.0), ActivityGroup::VeryActive);
        assert_eq!(ActivityGroup::from_score(3.75), ActivityGroup::VeryActive);
        assert_eq!(ActivityGroup::from_score(3.7), ActivityGroup::Active);
        assert_eq!(ActivityGroup::from_score(2.0), ActivityGroup::Regular);
        assert_eq!(ActivityGroup::from_score(1.5), ActivityGroup::Irregular);
        assert_eq!(ActivityGroup::from_score(0.99), ActivityGroup::Inactive);
        assert_eq!(ActivityGroup::from_score(-1.0), ActivityGroup::Inactive);
    }

    #[test]
    fn test_no_sessions_is_inactive() {
        let index = ActivityIndex::from_sessions(&[], NOW, &ActivitySettings::default());
        assert_eq!(index.value(), 0.0);
        assert_eq!(index.group(), ActivityGroup::Inactive);
    }

    #[test]
    fn test_bucket_count_covers_two_months() {
        let settings = ActivitySettings::default();
        // 60 days back in 7 day steps: 0, 7, ..., 56
        assert_eq!(bucket_ends(NOW, &settings).count(), 9);
    }

    #[test]
    fn test_daily_player_is_very_active() {
        let sessions = daily_sessions(60, 2);
        let index = ActivityIndex::from_sessions(&sessions, NOW, &ActivitySettings::default());

        assert!(index.value() > 3.75, "score was {}", index.value());
        assert!(index.value() < MAX_SCORE);
        assert_eq!(index.group(), ActivityGroup::VeryActive);
    }

    #[test]
    fn test_old_sessions_do_not_count() {
        let start = NOW - 4 * MONTH_MS;
        let sessions = vec![Session::new(start, start + 10 * HOUR_MS)];
        let index = ActivityIndex::from_sessions(&sessions, NOW, &ActivitySettings::default());
        assert_eq!(index.value(), 0.0);
    }

    #[test]
    fn test_more_play_scores_higher() {
        let settings = ActivitySettings::default();
        let light = ActivityIndex::from_sessions(&daily_sessions(14, 1), NOW, &settings);
        let heavy = ActivityIndex::from_sessions(&daily_sessions(14, 4), NOW, &settings);
        assert!(heavy.value() > light.value());
    }

    #[test]
    fn test_open_session_is_measured_to_reference_date() {
        let settings = ActivitySettings::default();
        let sessions = vec![Session::ongoing(NOW - 2 * HOUR_MS)];
        let open = ActivityIndex::from_sessions(&sessions, NOW, &settings);
        let closed =
            ActivityIndex::from_sessions(&[Session::new(NOW - 2 * HOUR_MS, NOW)], NOW, &settings);
        assert_eq!(open.value(), closed.value());
    }

    #[test]
    fn test_play_after_reference_date_is_ignored() {
        let settings = ActivitySettings::default();
        let until_now = [Session::new(NOW - HOUR_MS, NOW)];
        let past_now = [Session::new(NOW - HOUR_MS, NOW + 40 * HOUR_MS)];
        let open = [Session::ongoing(NOW - HOUR_MS)];

        let expected = ActivityIndex::from_sessions(&until_now, NOW, &settings).value();
        assert!(expected > 0.0);
        assert_eq!(
            ActivityIndex::from_sessions(&past_now, NOW, &settings).value(),
            expected
        );
        assert_eq!(
            ActivityIndex::from_sessions(&open, NOW, &settings).value(),
            expected
        );
    }

    #[test]
    fn test_deterministic() {
        let settings = ActivitySettings::default();
        let sessions = daily_sessions(30, 1);
        let a = ActivityIndex::from_sessions(&sessions, NOW, &settings);
        let b = ActivityIndex::from_sessions(&sessions, NOW, &settings);
        assert_eq!(a.value().to_bits(), b.value().to_bits());
        assert_eq!(a.group(), b.group());
    }

    #[test]
    fn test_zero_lookback() {
        let settings = ActivitySettings {
            lookback_ms: 0,
            ..ActivitySettings::default()
        };
        let index = ActivityIndex::from_sessions(&daily_sessions(3, 1), NOW, &settings);
        assert_eq!(index.value(), 0.0);
    }
}
