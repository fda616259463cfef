//! Queries over one player's sessions.

use crate::data::types::{PlayerContainer, Session};

/// Read-only view over a sequence of sessions.
#[derive(Debug, Clone, Copy)]
pub struct SessionsMutator<'a> {
    sessions: &'a [Session],
}

impl<'a> SessionsMutator<'a> {
    pub fn new(sessions: &'a [Session]) -> Self {
        Self { sessions }
    }

    /// Sessions of a player, empty if the player has no session data.
    pub fn for_container(player: &'a PlayerContainer) -> Self {
        Self::new(player.sessions().unwrap_or(&[]))
    }

    pub fn all(&self) -> &'a [Session] {
        self.sessions
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    /// True if any session starts or ends inside `[after, before]`.
    ///
    /// An open session only has its start to go by.
    pub fn played_between(&self, after: i64, before: i64) -> bool {
        self.sessions
            .iter()
            .any(|session| overlaps(session, after, before))
    }

    /// Sessions that start or end inside `[after, before]`.
    pub fn filter_sessions_between(&self, after: i64, before: i64) -> Vec<&'a Session> {
        self.sessions
            .iter()
            .filter(|session| overlaps(session, after, before))
            .collect()
    }

    /// Total play time, open sessions measured up to `now`.
    pub fn play_time(&self, now: i64) -> i64 {
        self.sessions
            .iter()
            .map(|s| s.length(now))
            .fold(0, i64::saturating_add)
    }

    /// Total play time without AFK time, open sessions measured up to `now`.
    pub fn active_play_time(&self, now: i64) -> i64 {
        self.sessions
            .iter()
            .map(|s| s.active_length(now))
            .fold(0, i64::saturating_add)
    }

    pub fn longest_session_length(&self, now: i64) -> i64 {
        self.sessions
            .iter()
            .map(|s| s.length(now))
            .max()
            .unwrap_or(0)
    }
}

/// Sum of active play before `cutoff`; later play is not counted.
pub fn active_play_time_until<'s>(
    sessions: impl IntoIterator<Item = &'s Session>,
    cutoff: i64,
) -> i64 {
    sessions
        .into_iter()
        .map(|s| s.active_length_until(cutoff))
        .fold(0, i64::saturating_add)
}

fn overlaps(session: &Session, after: i64, before: i64) -> bool {
    let in_range = |t: i64| after <= t && t <= before;
    in_range(session.start) || session.end.is_some_and(in_range)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_played_between_start_inside() {
        let sessions = [Session::new(100, 200)];
        let mutator = SessionsMutator::new(&sessions);

        assert!(mutator.played_between(50, 150));
        // end = 200 falls inside
        assert!(mutator.played_between(150, 300));
    }

    #[test]
    fn test_played_between_boundaries() {
        let sessions = [Session::new(100, 200)];
        let mutator = SessionsMutator::new(&sessions);

        assert!(mutator.played_between(100, 100));
        assert!(mutator.played_between(200, 250));
        // Session spans the whole range but neither bound falls inside it
        assert!(!mutator.played_between(120, 180));
        assert!(!mutator.played_between(201, 300));
    }

    #[test]
    fn test_open_session_uses_start_only() {
        let sessions = [Session::ongoing(100)];
        let mutator = SessionsMutator::new(&sessions);

        assert!(mutator.played_between(0, 100));
        assert!(!mutator.played_between(101, i64::MAX));
    }

    #[test]
    fn test_no_sessions() {
        let mutator = SessionsMutator::new(&[]);
        assert!(!mutator.played_between(i64::MIN, i64::MAX));
        assert_eq!(mutator.longest_session_length(0), 0);
    }

    #[test]
    fn test_play_time() {
        let sessions = [
            Session::new(0, 1_000).with_afk_time(200),
            Session::new(2_000, 5_000),
            Session::ongoing(9_000),
        ];
        let mutator = SessionsMutator::new(&sessions);

        assert_eq!(mutator.play_time(10_000), 1_000 + 3_000 + 1_000);
        assert_eq!(mutator.active_play_time(10_000), 800 + 3_000 + 1_000);
        assert_eq!(mutator.longest_session_length(10_000), 3_000);
        assert_eq!(mutator.filter_sessions_between(1_500, 4_000).len(), 1);
    }
}
