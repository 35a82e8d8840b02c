//! Records served by the backend and the drafts sent to it.
//!
//! Only the fields the client shows or edits are typed. Anything else the
//! backend returns is kept in `extra` and sent back unchanged.

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DeskError, DeskResult};

/// Backend primary key, kept in whatever form the backend used.
///
/// Ids compare by their rendered form, so `Text("1")` from a backend that
/// sends string keys equals the `Number(1)` parsed from command-line input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl PartialEq for RecordId {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RecordId::Number(a), RecordId::Number(b)) => a == b,
            (RecordId::Text(a), RecordId::Text(b)) => a == b,
            (RecordId::Number(n), RecordId::Text(s)) | (RecordId::Text(s), RecordId::Number(n)) => {
                n.to_string() == *s
            }
        }
    }
}

impl Eq for RecordId {}

impl Hash for RecordId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            RecordId::Number(n) => n.to_string().hash(state),
            RecordId::Text(s) => s.hash(state),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => fmt::Display::fmt(n, f),
            RecordId::Text(s) => f.pad(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId::Number(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        // Numeric strings become numbers so they compare equal to backend ids
        id.parse::<i64>()
            .map(RecordId::Number)
            .unwrap_or_else(|_| RecordId::Text(id.to_string()))
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        RecordId::from(id.as_str())
    }
}

/// Something list views can filter by the search term
pub trait Searchable {
    /// Field the search term is matched against
    fn search_text(&self) -> &str;
}

/// Task state; the only values the backend accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn toggled(self) -> Self {
        match self {
            TaskStatus::Pending => TaskStatus::Completed,
            TaskStatus::Completed => TaskStatus::Pending,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => f.pad("Pending"),
            TaskStatus::Completed => f.pad("Completed"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "completed" => Ok(TaskStatus::Completed),
            _ => Err(DeskError::validation(format!("Unknown task status '{}'", s))),
        }
    }
}

/// Task as nested inside an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: RecordId,
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub tasks: Vec<TaskSummary>,
    #[serde(default)]
    pub attendees_count: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Ids of the events this attendee is linked to
    #[serde(default)]
    pub events: Vec<RecordId>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: RecordId,
    pub name: String,
    /// Id of the owning event
    #[serde(default)]
    pub event: Option<RecordId>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Searchable for Event {
    fn search_text(&self) -> &str {
        &self.name
    }
}

impl Searchable for Attendee {
    fn search_text(&self) -> &str {
        &self.name
    }
}

impl Searchable for Task {
    fn search_text(&self) -> &str {
        &self.name
    }
}

/// Calendar projection of an event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEntry {
    pub id: RecordId,
    pub title: String,
    pub start: String,
}

impl From<&Event> for CalendarEntry {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id.clone(),
            title: event.name.clone(),
            start: event.date.clone(),
        }
    }
}

fn require_name(name: &str, noun: &str) -> DeskResult<()> {
    if name.trim().is_empty() {
        return Err(DeskError::validation(format!("The {} name is required", noun)));
    }
    Ok(())
}

/// Fields a client can write on an event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub name: String,
    pub description: String,
    pub date: String,
    pub location: String,
}

impl EventDraft {
    pub fn validate(&self) -> DeskResult<()> {
        require_name(&self.name, "event")
    }
}

impl From<&Event> for EventDraft {
    fn from(event: &Event) -> Self {
        Self {
            name: event.name.clone(),
            description: event.description.clone(),
            date: event.date.clone(),
            location: event.location.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendeeDraft {
    pub name: String,
    pub email: String,
    pub events: Vec<RecordId>,
}

impl AttendeeDraft {
    pub fn validate(&self) -> DeskResult<()> {
        require_name(&self.name, "attendee")
    }

    /// Link another event, ignoring duplicates
    pub fn add_event(&mut self, event: RecordId) {
        if !self.events.contains(&event) {
            self.events.push(event);
        }
    }
}

impl From<&Attendee> for AttendeeDraft {
    fn from(attendee: &Attendee) -> Self {
        Self {
            name: attendee.name.clone(),
            email: attendee.email.clone(),
            events: attendee.events.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub name: String,
    pub event: Option<RecordId>,
    pub status: TaskStatus,
}

impl TaskDraft {
    pub fn validate(&self) -> DeskResult<()> {
        require_name(&self.name, "task")
    }
}

impl From<&Task> for TaskDraft {
    fn from(task: &Task) -> Self {
        Self {
            name: task.name.clone(),
            event: task.event.clone(),
            status: task.status,
        }
    }
}
