//! Due-date reminder computation and scheduling.
//!
//! # Responsibility
//! - Parse `HH:MM` reminder times and combine them with a task's due date.
//! - Drive the notification primitive to schedule and cancel reminders.
//!
//! # Invariants
//! - The due date is read as a calendar date in local time, never shifted by
//!   the UTC offset of its stored instant.
//! - A resolved trigger is never at or before "now"; it is clamped to
//!   `now + min_lead`.
//! - Permission denial creates no notification.

use crate::config::{
    CoreConfig, Platform, DEFAULT_REMINDER_MIN_LEAD_SECS, MAX_REMINDER_MIN_LEAD_SECS,
};
use crate::model::todo::TodoTask;
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static TIME_OF_DAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").expect("valid time-of-day regex"));

pub const REMINDER_TITLE: &str = "Reminder";

/// Notification channel used on platforms that require one.
pub const TODO_REMINDER_CHANNEL: NotificationChannel = NotificationChannel {
    id: "todo-reminders",
    name: "Todo Reminders",
};

/// 24h wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
}

impl TimeOfDay {
    pub const NINE_AM: TimeOfDay = TimeOfDay { hour: 9, minute: 0 };

    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        (hour <= 23 && minute <= 59).then_some(Self { hour, minute })
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Parses `H:MM` or `HH:MM` (hour 0-23, minute 0-59) after trimming.
pub fn parse_time_of_day(value: &str) -> Option<TimeOfDay> {
    let caps = TIME_OF_DAY_RE.captures(value.trim())?;
    let hour = caps.get(1)?.as_str().parse().ok()?;
    let minute = caps.get(2)?.as_str().parse().ok()?;
    TimeOfDay::new(hour, minute)
}

/// Calendar date of a stored due instant, as written in its ISO form.
pub fn due_date_component(due: &DateTime<Utc>) -> NaiveDate {
    due.date_naive()
}

/// `date` at `time` in the local timezone.
pub fn compute_trigger(date: NaiveDate, time: TimeOfDay) -> DateTime<Local> {
    compute_trigger_in(&Local, date, time)
}

/// `date` at `time` in `tz`.
///
/// Ambiguous local times resolve to the earlier instant; times inside a DST
/// gap move forward by one hour.
pub fn compute_trigger_in<Tz: TimeZone>(tz: &Tz, date: NaiveDate, time: TimeOfDay) -> DateTime<Tz> {
    let naive = date
        .and_hms_opt(time.hour.min(23), time.minute.min(59), 0)
        .unwrap_or_else(|| date.and_time(NaiveTime::default()));
    resolve_local(tz, naive)
}

fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    if let Some(instant) = tz.from_local_datetime(&naive).earliest() {
        return instant;
    }
    let shifted = naive + Duration::hours(1);
    tz.from_local_datetime(&shifted)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}

/// Error reported by the notification primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationError {
    pub message: String,
}

impl NotificationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for NotificationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "notification backend error: {}", self.message)
    }
}

impl Error for NotificationError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationChannel {
    pub id: &'static str,
    pub name: &'static str,
}

/// One absolute-time notification to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    /// Task the notification refers to (`data.todoId`).
    pub todo_id: String,
    pub trigger: DateTime<Utc>,
    pub channel_id: Option<String>,
    pub sound: bool,
}

/// Platform notification primitive.
pub trait NotificationCenter {
    /// Whether permission was already granted.
    fn permission_granted(&self) -> Result<bool, NotificationError>;
    /// Prompts for permission; returns whether it was granted.
    fn request_permission(&self) -> Result<bool, NotificationError>;
    fn ensure_channel(&self, channel: &NotificationChannel) -> Result<(), NotificationError>;
    /// Schedules `request` and returns the backend's notification id.
    fn schedule(&self, request: &NotificationRequest) -> Result<String, NotificationError>;
    fn cancel(&self, notification_id: &str) -> Result<(), NotificationError>;
}

impl<T: NotificationCenter + ?Sized> NotificationCenter for Box<T> {
    fn permission_granted(&self) -> Result<bool, NotificationError> {
        (**self).permission_granted()
    }

    fn request_permission(&self) -> Result<bool, NotificationError> {
        (**self).request_permission()
    }

    fn ensure_channel(&self, channel: &NotificationChannel) -> Result<(), NotificationError> {
        (**self).ensure_channel(channel)
    }

    fn schedule(&self, request: &NotificationRequest) -> Result<String, NotificationError> {
        (**self).schedule(request)
    }

    fn cancel(&self, notification_id: &str) -> Result<(), NotificationError> {
        (**self).cancel(notification_id)
    }
}

impl<T: NotificationCenter + ?Sized> NotificationCenter for std::sync::Arc<T> {
    fn permission_granted(&self) -> Result<bool, NotificationError> {
        (**self).permission_granted()
    }

    fn request_permission(&self) -> Result<bool, NotificationError> {
        (**self).request_permission()
    }

    fn ensure_channel(&self, channel: &NotificationChannel) -> Result<(), NotificationError> {
        (**self).ensure_channel(channel)
    }

    fn schedule(&self, request: &NotificationRequest) -> Result<String, NotificationError> {
        (**self).schedule(request)
    }

    fn cancel(&self, notification_id: &str) -> Result<(), NotificationError> {
        (**self).cancel(notification_id)
    }
}

/// Notification center for hosts without notifications; never grants permission.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledNotifications;

impl NotificationCenter for DisabledNotifications {
    fn permission_granted(&self) -> Result<bool, NotificationError> {
        Ok(false)
    }

    fn request_permission(&self) -> Result<bool, NotificationError> {
        Ok(false)
    }

    fn ensure_channel(&self, _channel: &NotificationChannel) -> Result<(), NotificationError> {
        Ok(())
    }

    fn schedule(&self, _request: &NotificationRequest) -> Result<String, NotificationError> {
        Err(NotificationError::new("notifications are disabled"))
    }

    fn cancel(&self, _notification_id: &str) -> Result<(), NotificationError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderError {
    /// The user declined notification permission.
    PermissionDenied,
    Notification(NotificationError),
}

impl Display for ReminderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "notification permission denied"),
            Self::Notification(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ReminderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::PermissionDenied => None,
            Self::Notification(err) => Some(err),
        }
    }
}

impl From<NotificationError> for ReminderError {
    fn from(value: NotificationError) -> Self {
        Self::Notification(value)
    }
}

/// A reminder accepted by the notification primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledReminder {
    pub notification_id: String,
    pub reminder_at: DateTime<Utc>,
}

/// Turns task reminder settings into scheduled notifications.
pub struct ReminderScheduler<N: NotificationCenter> {
    center: N,
    platform: Platform,
    default_time: TimeOfDay,
    min_lead: Duration,
}

impl<N: NotificationCenter> ReminderScheduler<N> {
    pub fn new(center: N, config: &CoreConfig) -> Self {
        Self {
            center,
            platform: config.platform,
            default_time: config.default_time_of_day(),
            min_lead: min_lead(config.reminder_min_lead_secs),
        }
    }

    pub fn is_supported(&self) -> bool {
        self.platform.supports_reminders()
    }

    /// Returns whether permission is held, prompting when it is not yet granted.
    pub fn ensure_permission(&self) -> Result<bool, ReminderError> {
        if !self.is_supported() {
            return Ok(false);
        }
        if self.center.permission_granted()? {
            return Ok(true);
        }
        Ok(self.center.request_permission()?)
    }

    /// Trigger instant for a due date and optional `HH:MM`, clamped after `now`.
    ///
    /// A missing or unparsable time uses the configured default.
    pub fn resolve_trigger(
        &self,
        due: &DateTime<Utc>,
        reminder_time: Option<&str>,
        now: DateTime<Utc>,
    ) -> DateTime<Utc> {
        self.resolve_trigger_in(&Local, due, reminder_time, now)
    }

    pub fn resolve_trigger_in<Tz: TimeZone>(
        &self,
        tz: &Tz,
        due: &DateTime<Utc>,
        reminder_time: Option<&str>,
        now: DateTime<Utc>,
    ) -> DateTime<Utc> {
        let time = reminder_time
            .and_then(parse_time_of_day)
            .unwrap_or(self.default_time);
        let trigger = compute_trigger_in(tz, due_date_component(due), time).with_timezone(&Utc);
        if trigger <= now {
            now.checked_add_signed(self.min_lead).unwrap_or(DateTime::<Utc>::MAX_UTC)
        } else {
            trigger
        }
    }

    /// Schedules the reminder for `task`.
    ///
    /// Returns `Ok(None)` when reminders are unsupported, the task has no due
    /// date, `remind` is off or the task is completed. The caller stores the
    /// returned id on the task for later cancellation.
    pub fn schedule(
        &self,
        task: &TodoTask,
        now: DateTime<Utc>,
    ) -> Result<Option<ScheduledReminder>, ReminderError> {
        if !self.is_supported() || !task.remind || task.is_completed {
            return Ok(None);
        }
        let Some(due) = task.due_date.as_ref() else {
            return Ok(None);
        };

        if !self.ensure_permission()? {
            info!(
                "event=reminder_schedule module=reminder status=skip reason=permission_denied todo_id={}",
                task.id
            );
            return Err(ReminderError::PermissionDenied);
        }

        let channel_id = if self.platform.needs_notification_channel() {
            self.center.ensure_channel(&TODO_REMINDER_CHANNEL)?;
            Some(TODO_REMINDER_CHANNEL.id.to_string())
        } else {
            None
        };

        let trigger = self.resolve_trigger(due, task.reminder_time.as_deref(), now);
        let request = NotificationRequest {
            title: REMINDER_TITLE.to_string(),
            body: task.title.clone(),
            todo_id: task.id.clone(),
            trigger,
            channel_id,
            sound: true,
        };
        let notification_id = self.center.schedule(&request)?;
        info!(
            "event=reminder_schedule module=reminder status=ok todo_id={} notification_id={} trigger={}",
            task.id,
            notification_id,
            trigger.to_rfc3339()
        );

        Ok(Some(ScheduledReminder {
            notification_id,
            reminder_at: trigger,
        }))
    }

    /// Best-effort cancellation; unknown or already cancelled ids are ignored.
    pub fn cancel(&self, notification_id: &str) {
        if !self.is_supported() || notification_id.is_empty() {
            return;
        }
        if let Err(err) = self.center.cancel(notification_id) {
            warn!(
                "event=reminder_cancel module=reminder status=error notification_id={notification_id} error={err}"
            );
        }
    }
}

/// Lead applied to past triggers; out-of-range settings use the default.
fn min_lead(secs: i64) -> Duration {
    let secs = if (1..=MAX_REMINDER_MIN_LEAD_SECS).contains(&secs) {
        secs
    } else {
        DEFAULT_REMINDER_MIN_LEAD_SECS
    };
    Duration::try_seconds(secs).unwrap_or_else(|| Duration::minutes(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, FixedOffset, Timelike};

    fn scheduler(platform: Platform) -> ReminderScheduler<DisabledNotifications> {
        let config = CoreConfig {
            platform,
            ..CoreConfig::default()
        };
        ReminderScheduler::new(DisabledNotifications, &config)
    }

    #[test]
    fn parse_time_of_day_accepts_one_or_two_digit_hours() {
        assert_eq!(parse_time_of_day("09:00"), Some(TimeOfDay { hour: 9, minute: 0 }));
        assert_eq!(parse_time_of_day("9:00"), Some(TimeOfDay { hour: 9, minute: 0 }));
        assert_eq!(parse_time_of_day(" 18:30 "), Some(TimeOfDay { hour: 18, minute: 30 }));
        assert_eq!(parse_time_of_day("0:05"), Some(TimeOfDay { hour: 0, minute: 5 }));
    }

    #[test]
    fn parse_time_of_day_rejects_invalid_values() {
        for value in ["24:00", "9:60", "", "0900", "9:0", "ab:cd", "09:00:00", "-1:00", "123:00"] {
            assert_eq!(parse_time_of_day(value), None, "{value} should be rejected");
        }
    }

    #[test]
    fn time_of_day_displays_zero_padded() {
        assert_eq!(TimeOfDay::NINE_AM.to_string(), "09:00");
    }

    #[test]
    fn trigger_uses_calendar_date_of_due_instant() {
        let tz = FixedOffset::west_opt(8 * 3600).unwrap();
        let due = Utc.with_ymd_and_hms(2030, 5, 20, 0, 0, 0).unwrap();
        let trigger = compute_trigger_in(
            &tz,
            due_date_component(&due),
            TimeOfDay { hour: 18, minute: 30 },
        );
        assert_eq!((trigger.year(), trigger.month(), trigger.day()), (2030, 5, 20));
        assert_eq!((trigger.hour(), trigger.minute()), (18, 30));
    }

    #[test]
    fn past_trigger_is_clamped_to_one_minute_ahead() {
        let scheduler = scheduler(Platform::Ios);
        let now = Utc.with_ymd_and_hms(2030, 5, 20, 12, 0, 0).unwrap();
        let due = Utc.with_ymd_and_hms(2030, 5, 20, 0, 0, 0).unwrap();

        let trigger = scheduler.resolve_trigger_in(&Utc, &due, Some("08:00"), now);
        assert_eq!(trigger, now + Duration::seconds(60));

        let same_instant = scheduler.resolve_trigger_in(&Utc, &due, Some("12:00"), now);
        assert_eq!(same_instant, now + Duration::seconds(60));
    }

    #[test]
    fn future_trigger_is_kept_and_bad_time_falls_back_to_default() {
        let scheduler = scheduler(Platform::Ios);
        let now = Utc.with_ymd_and_hms(2030, 5, 19, 12, 0, 0).unwrap();
        let due = Utc.with_ymd_and_hms(2030, 5, 20, 0, 0, 0).unwrap();

        let trigger = scheduler.resolve_trigger_in(&Utc, &due, Some("nope"), now);
        assert_eq!(trigger, Utc.with_ymd_and_hms(2030, 5, 20, 9, 0, 0).unwrap());
    }

    #[test]
    fn oversized_lead_setting_falls_back_to_default() {
        let config = CoreConfig {
            reminder_min_lead_secs: i64::MAX,
            ..CoreConfig::default()
        };
        let scheduler = ReminderScheduler::new(DisabledNotifications, &config);
        let now = Utc.with_ymd_and_hms(2030, 5, 20, 12, 0, 0).unwrap();
        let due = Utc.with_ymd_and_hms(2030, 5, 20, 0, 0, 0).unwrap();

        let trigger = scheduler.resolve_trigger_in(&Utc, &due, Some("08:00"), now);
        assert_eq!(trigger, now + Duration::seconds(60));
    }

    #[test]
    fn web_platform_never_schedules() {
        let scheduler = scheduler(Platform::Web);
        assert!(!scheduler.is_supported());
        assert!(!scheduler.ensure_permission().unwrap());
    }
}
