// Festival and Event records, their input/patch types, and derived status.
//
// The API surface is camelCase JSON; columns and fields are snake_case.
// Patches are explicit structs with an explicit merge step so validation
// always runs against a fully-resolved candidate record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

/// A stored festival row. `id` is assigned by the store and immutable.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Festival {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub location: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFestival {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub location: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Partial festival update. Absent fields keep their stored value;
/// `description` is the only nullable field, so only it accepts an
/// explicit `null` (meaning: clear it).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FestivalPatch {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub is_active: Option<bool>,
}

impl FestivalPatch {
    pub fn apply_to(&self, existing: &Festival) -> Festival {
        Festival {
            id: existing.id,
            name: self.name.clone().unwrap_or_else(|| existing.name.clone()),
            kind: self.kind.clone().unwrap_or_else(|| existing.kind.clone()),
            description: match &self.description {
                Some(value) => value.clone(),
                None => existing.description.clone(),
            },
            start_date: self.start_date.unwrap_or(existing.start_date),
            end_date: self.end_date.unwrap_or(existing.end_date),
            location: self
                .location
                .clone()
                .unwrap_or_else(|| existing.location.clone()),
            is_active: self.is_active.unwrap_or(existing.is_active),
        }
    }
}

/// A stored event row, owned by exactly one festival.
/// `capacity == 0` means unlimited (display convention, not enforced).
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: String,
    pub capacity: i64,
    pub festival_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub name: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub capacity: i64,
    pub festival_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub capacity: Option<i64>,
    pub festival_id: Option<i64>,
}

impl EventPatch {
    pub fn apply_to(&self, existing: &Event) -> Event {
        Event {
            id: existing.id,
            name: self.name.clone().unwrap_or_else(|| existing.name.clone()),
            description: match &self.description {
                Some(value) => value.clone(),
                None => existing.description.clone(),
            },
            start_time: self.start_time.unwrap_or(existing.start_time),
            end_time: self.end_time.unwrap_or(existing.end_time),
            location: self
                .location
                .clone()
                .unwrap_or_else(|| existing.location.clone()),
            capacity: self.capacity.unwrap_or(existing.capacity),
            festival_id: self.festival_id.unwrap_or(existing.festival_id),
        }
    }

    /// Whether this patch touches the fields the festival-window rule
    /// depends on. Only then is the rule re-evaluated, matching create-time
    /// semantics.
    pub fn touches_window(&self) -> bool {
        self.festival_id.is_some() || self.start_time.is_some() || self.end_time.is_some()
    }
}

/// Festival fields attached to event listings (read-side join, not stored).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FestivalSummary {
    pub id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl From<&Festival> for FestivalSummary {
    fn from(festival: &Festival) -> Self {
        Self {
            id: festival.id,
            name: festival.name.clone(),
            start_date: festival.start_date,
            end_date: festival.end_date,
        }
    }
}

/// Event fields attached to festival listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub id: i64,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: String,
}

impl From<&Event> for EventSummary {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id,
            name: event.name.clone(),
            start_time: event.start_time,
            end_time: event.end_time,
            location: event.location.clone(),
        }
    }
}

/// Derived, non-persisted classification relative to current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Upcoming,
    Ongoing,
    Completed,
}

/// Classifies `now` against an inclusive `[start, end]` window. Both
/// boundaries count as Ongoing. Callers must read "now" once per request so
/// a listing is internally consistent.
pub fn derive_status<T: PartialOrd>(now: T, start: T, end: T) -> Status {
    if now < start {
        Status::Upcoming
    } else if now > end {
        Status::Completed
    } else {
        Status::Ongoing
    }
}

fn default_true() -> bool {
    true
}

// Distinguishes an absent field from an explicit `null`: serde only calls
// this when the field is present, so present-null becomes Some(None).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
