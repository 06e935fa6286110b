//! Shapes exchanged with the backend event API.
//!
//! The backend owns persistence; these types exist only at the HTTP boundary.
//! Field names are camelCase on the wire.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Backend-assigned event identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Page path of the event's detail view, used for navigation after submit.
    pub fn detail_path(&self) -> String {
        format!("/event/{}", self.0)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// An event as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedEvent {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub public: bool,
    /// Zero or absent means no limit.
    #[serde(default)]
    pub participant_limit: Option<u32>,
    #[serde(default)]
    pub signup_deadline: Option<DateTime<Utc>>,
}

impl PersistedEvent {
    pub fn has_participant_limit(&self) -> bool {
        self.participant_limit.is_some_and(|n| n > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(default)]
    pub user_id: Option<String>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl Participant {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Response of `GET /event/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventWithParticipants {
    pub event: PersistedEvent,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Body of create and update requests. Instants are absolute (UTC).
///
/// Optional fields serialize as `null` so an update can clear them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub title: String,
    pub description: String,
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub public: bool,
    pub participant_limit: Option<u32>,
    pub signup_deadline: Option<DateTime<Utc>>,
}

/// Which events a listing should return.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    pub only_future: bool,
    pub only_past: bool,
    pub only_public: bool,
    pub only_joined: bool,
    pub only_mine: bool,
    pub categories: Vec<i64>,
}

impl EventQuery {
    /// The front page listing: upcoming public events.
    pub fn upcoming_public() -> Self {
        Self {
            only_future: true,
            only_public: true,
            ..Default::default()
        }
    }

    /// Query-string pairs; unset flags are omitted.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let flags = [
            ("onlyFuture", self.only_future),
            ("onlyPast", self.only_past),
            ("onlyPublic", self.only_public),
            ("onlyJoined", self.only_joined),
            ("onlyMine", self.only_mine),
        ];
        let mut pairs: Vec<(&'static str, String)> = flags
            .into_iter()
            .filter(|(_, set)| *set)
            .map(|(name, _)| (name, "true".to_string()))
            .collect();
        if !self.categories.is_empty() {
            let joined = self
                .categories
                .iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("categories", joined));
        }
        pairs
    }
}

/// The logged-in user, as reported by the authentication service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub email: String,
    pub name: String,
}
