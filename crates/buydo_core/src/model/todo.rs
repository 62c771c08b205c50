//! Task records and reminder fields.
//!
//! # Invariants
//! - `remind == true` implies `due_date` is set and `reminder_time` parses as
//!   24h `HH:MM`. Enforced by `ReactiveStore` before state changes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Task urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Sort rank, lower sorts first.
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }
}

/// A to-do entry with optional due-date reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoTask {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: Priority,
    /// Calendar due date. Only the date component is meaningful for reminders.
    #[serde(
        default,
        with = "due_date_format",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub remind: bool,
    /// 24h `HH:MM`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<String>,
    /// Handle returned by the notification primitive, kept for cancellation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<String>,
    /// Resolved trigger instant of the scheduled notification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_at: Option<DateTime<Utc>>,
}

/// Input for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoDraft {
    pub title: String,
    pub priority: Priority,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub remind: bool,
    pub reminder_time: Option<String>,
}

impl TodoDraft {
    /// Draft with medium priority and no optional fields.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            priority: Priority::Medium,
            description: None,
            due_date: None,
            remind: false,
            reminder_time: None,
        }
    }
}

/// Partial update for a task. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub title: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    /// `Some(None)` clears the due date.
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub is_completed: Option<bool>,
    pub remind: Option<bool>,
    /// `Some(None)` clears the reminder time.
    pub reminder_time: Option<Option<String>>,
}

impl TodoPatch {
    /// Applies every set field of this patch to `task`.
    pub fn apply_to(&self, task: &mut TodoTask) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(is_completed) = self.is_completed {
            task.is_completed = is_completed;
        }
        if let Some(remind) = self.remind {
            task.remind = remind;
        }
        if let Some(reminder_time) = &self.reminder_time {
            task.reminder_time = reminder_time.clone();
        }
    }
}

impl TodoTask {
    /// Whether the fields that drive reminder scheduling differ from `other`.
    pub fn reminder_fields_differ(&self, other: &TodoTask) -> bool {
        self.due_date != other.due_date
            || self.remind != other.remind
            || self.reminder_time != other.reminder_time
    }
}

/// Parses a due date given either as RFC 3339 or as a bare `YYYY-MM-DD`
/// (taken as midnight UTC).
pub fn parse_due_date(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

mod due_date_format {
    use super::parse_due_date;
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(instant) => {
                serializer.serialize_str(&instant.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => parse_due_date(value)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid due date `{value}`"))),
        }
    }
}
