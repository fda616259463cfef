//! Online player count context used by retention feature extraction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Answers "how many players were online at this moment?".
pub trait OnlineResolver: Sync {
    fn online_on(&self, timestamp: i64) -> Option<u32>;
}

/// One server performance sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineSample {
    pub timestamp: i64,
    pub players_online: u32,
}

impl OnlineSample {
    pub fn new(timestamp: i64, players_online: u32) -> Self {
        Self {
            timestamp,
            players_online,
        }
    }
}

/// Resolves online counts from periodic samples.
#[derive(Debug, Clone, Default)]
pub struct PlayersOnlineResolver {
    samples: BTreeMap<i64, u32>,
}

impl PlayersOnlineResolver {
    pub fn new(samples: impl IntoIterator<Item = OnlineSample>) -> Self {
        Self {
            samples: samples
                .into_iter()
                .map(|s| (s.timestamp, s.players_online))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Highest sampled online count within `[after, before]`.
    pub fn peak_between(&self, after: i64, before: i64) -> Option<u32> {
        if after > before {
            return None;
        }
        self.samples.range(after..=before).map(|(_, &n)| n).max()
    }
}

impl OnlineResolver for PlayersOnlineResolver {
    /// Latest sample taken at or before `timestamp`.
    fn online_on(&self, timestamp: i64) -> Option<u32> {
        self.samples
            .range(..=timestamp)
            .next_back()
            .map(|(_, &n)| n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> PlayersOnlineResolver {
        PlayersOnlineResolver::new([
            OnlineSample::new(100, 3),
            OnlineSample::new(200, 7),
            OnlineSample::new(300, 5),
        ])
    }

    #[test]
    fn test_online_on_floor_lookup() {
        let resolver = resolver();
        assert_eq!(resolver.online_on(99), None);
        assert_eq!(resolver.online_on(100), Some(3));
        assert_eq!(resolver.online_on(250), Some(7));
        assert_eq!(resolver.online_on(10_000), Some(5));
    }

    #[test]
    fn test_peak_between() {
        let resolver = resolver();
        assert_eq!(resolver.peak_between(100, 300), Some(7));
        assert_eq!(resolver.peak_between(250, 300), Some(5));
        assert_eq!(resolver.peak_between(301, 400), None);
        assert_eq!(resolver.peak_between(300, 100), None);
    }
}
