//! Immutable player history records.
//!
//! All timestamps are epoch milliseconds. A missing attribute is always
//! representable and never an error: callers decide what absence means.

use crate::core::activity::{ActivityIndex, ActivitySettings};
use crate::core::sessions::SessionsMutator;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A single play session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// When the player joined
    pub start: i64,
    /// When the player left, `None` while the session is still ongoing
    #[serde(default)]
    pub end: Option<i64>,
    /// Time spent AFK during the session
    #[serde(default)]
    pub afk_time: i64,
    /// World the session started in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world: Option<String>,
}

impl Session {
    /// Create a closed session.
    pub fn new(start: i64, end: i64) -> Self {
        Self {
            start,
            end: Some(end),
            afk_time: 0,
            world: None,
        }
    }

    /// Create a session that has not ended yet.
    pub fn ongoing(start: i64) -> Self {
        Self {
            start,
            end: None,
            afk_time: 0,
            world: None,
        }
    }

    /// Set the AFK time of this session.
    pub fn with_afk_time(mut self, afk_time: i64) -> Self {
        self.afk_time = afk_time;
        self
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Session length in milliseconds. Open sessions are measured up to `now`.
    pub fn length(&self, now: i64) -> i64 {
        self.end.unwrap_or(now).saturating_sub(self.start).max(0)
    }

    /// Session length without AFK time.
    pub fn active_length(&self, now: i64) -> i64 {
        self.length(now).saturating_sub(self.afk_time).max(0)
    }

    /// Active length of the part of the session played before `cutoff`.
    pub fn active_length_until(&self, cutoff: i64) -> i64 {
        let end = self.end.unwrap_or(cutoff).min(cutoff);
        end.saturating_sub(self.start)
            .max(0)
            .saturating_sub(self.afk_time)
            .max(0)
    }
}

/// A geolocation observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoInfo {
    /// Country or region label
    pub geolocation: String,
    /// When the player was last seen from this location
    pub timestamp: i64,
}

impl GeoInfo {
    pub fn new(geolocation: impl Into<String>, timestamp: i64) -> Self {
        Self {
            geolocation: geolocation.into(),
            timestamp,
        }
    }
}

/// Read-only snapshot of everything known about one player.
///
/// Every attribute except the UUID is optional. Unknown keys in
/// [`PlayerContainer::attribute`] resolve to `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerContainer {
    pub uuid: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered: Option<i64>,
    /// Sessions in chronological order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sessions: Option<Vec<Session>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_infos: Option<Vec<GeoInfo>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banned: Option<bool>,
    /// Open-ended attributes supplied by the storage layer
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl PlayerContainer {
    /// Create a container that knows nothing but the player's UUID.
    pub fn new(uuid: Uuid) -> Self {
        Self {
            uuid,
            name: None,
            registered: None,
            sessions: None,
            geo_infos: None,
            operator: None,
            banned: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_registered(mut self, registered: i64) -> Self {
        self.registered = Some(registered);
        self
    }

    pub fn with_sessions(mut self, sessions: Vec<Session>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    pub fn with_geo_infos(mut self, geo_infos: Vec<GeoInfo>) -> Self {
        self.geo_infos = Some(geo_infos);
        self
    }

    pub fn with_operator(mut self, operator: bool) -> Self {
        self.operator = Some(operator);
        self
    }

    pub fn with_banned(mut self, banned: bool) -> Self {
        self.banned = Some(banned);
        self
    }

    /// Attach an open-ended attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn registered(&self) -> Option<i64> {
        self.registered
    }

    pub fn sessions(&self) -> Option<&[Session]> {
        self.sessions.as_deref()
    }

    pub fn geo_infos(&self) -> Option<&[GeoInfo]> {
        self.geo_infos.as_deref()
    }

    pub fn is_operator(&self) -> Option<bool> {
        self.operator
    }

    pub fn is_banned(&self) -> Option<bool> {
        self.banned
    }

    /// Look up an open-ended attribute.
    ///
    /// Returns `None` when the key is unknown or the stored value does not
    /// deserialize into `T`.
    pub fn attribute<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// The most recently observed geolocation, if any.
    pub fn most_recent_geo(&self) -> Option<&GeoInfo> {
        // max_by_key keeps the last of equal elements
        self.geo_infos()?.iter().max_by_key(|geo| geo.timestamp)
    }

    /// Whether any session overlaps `[after, before]`.
    pub fn played_between(&self, after: i64, before: i64) -> bool {
        SessionsMutator::for_container(self).played_between(after, before)
    }

    /// Compute the activity index at `date`.
    pub fn activity_index(&self, date: i64, settings: &ActivitySettings) -> ActivityIndex {
        ActivityIndex::new(self, date, settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_lengths() {
        let session = Session::new(1_000, 5_000).with_afk_time(1_500);
        assert_eq!(session.length(0), 4_000);
        assert_eq!(session.active_length(0), 2_500);

        let open = Session::ongoing(1_000);
        assert!(open.is_open());
        assert_eq!(open.length(3_000), 2_000);
        assert_eq!(open.length(500), 0);
    }

    #[test]
    fn test_active_length_until_cutoff() {
        let session = Session::new(1_000, 5_000).with_afk_time(500);
        assert_eq!(session.active_length_until(3_000), 1_500);
        assert_eq!(session.active_length_until(9_000), 3_500);
        assert_eq!(session.active_length_until(0), 0);
        assert_eq!(Session::ongoing(1_000).active_length_until(4_000), 3_000);
    }

    #[test]
    fn test_extreme_timestamps_saturate() {
        let session = Session::new(i64::MIN, i64::MAX).with_afk_time(-1);
        assert_eq!(session.length(0), i64::MAX);
        assert_eq!(session.active_length(0), i64::MAX);
        assert_eq!(Session::ongoing(i64::MIN).active_length_until(i64::MAX), i64::MAX);
    }

    #[test]
    fn test_afk_time_never_makes_length_negative() {
        let session = Session::new(0, 100).with_afk_time(500);
        assert_eq!(session.active_length(0), 0);
    }

    #[test]
    fn test_unknown_attribute_is_absent() {
        let player = PlayerContainer::new(Uuid::new_v4()).with_attribute("kills", json!(12));

        assert_eq!(player.attribute::<u32>("kills"), Some(12));
        assert_eq!(player.attribute::<u32>("deaths"), None);
        assert_eq!(player.attribute::<String>("kills"), None);
    }

    #[test]
    fn test_most_recent_geo() {
        let player = PlayerContainer::new(Uuid::new_v4()).with_geo_infos(vec![
            GeoInfo::new("Finland", 300),
            GeoInfo::new("Sweden", 900),
            GeoInfo::new("Norway", 100),
        ]);
        assert_eq!(player.most_recent_geo().unwrap().geolocation, "Sweden");

        let nowhere = PlayerContainer::new(Uuid::new_v4());
        assert!(nowhere.most_recent_geo().is_none());
    }

    #[test]
    fn test_container_json_defaults() {
        let uuid = Uuid::new_v4();
        let player: PlayerContainer =
            serde_json::from_value(json!({ "uuid": uuid, "registered": 42 })).unwrap();

        assert_eq!(player.uuid, uuid);
        assert_eq!(player.registered(), Some(42));
        assert!(player.sessions().is_none());
        assert!(player.is_operator().is_none());
    }
}
