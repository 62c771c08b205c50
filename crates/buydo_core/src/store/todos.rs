//! Task mutations and reminder side effects.
//!
//! Reminder handling follows the observed behavior: a changed reminder is
//! scheduled anew and the id of any earlier notification is overwritten
//! without cancelling it. `cancel_todo_reminder` is the explicit way out.

use super::{
    not_found, optional_text, required_text, ReactiveStore, StoreResult, ValidationError,
};
use crate::kv::KvStore;
use crate::model::ids::new_entity_id;
use crate::model::todo::{TodoDraft, TodoPatch, TodoTask};
use crate::repo::CollectionKey;
use crate::service::reminder_service::{parse_time_of_day, ReminderError, ScheduledReminder};
use log::warn;

/// What happened to a task's reminder during a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderStatus {
    /// Reminder settings did not change; nothing was scheduled.
    Untouched,
    /// Scheduling did not apply (reminders off, completed, or no support).
    Skipped,
    Scheduled(ScheduledReminder),
    /// Scheduling failed after the task was saved; the task has no new id.
    Failed(ReminderError),
}

/// A saved task plus its reminder result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoOutcome {
    pub task: TodoTask,
    pub reminder: ReminderStatus,
}

impl<K: KvStore> ReactiveStore<K> {
    pub fn todo(&self, id: &str) -> Option<&TodoTask> {
        self.todos.iter().find(|task| task.id == id)
    }

    /// Active tasks by priority (stable), then completed tasks.
    pub fn sorted_todos(&self) -> Vec<&TodoTask> {
        let mut active: Vec<&TodoTask> = self.todos.iter().filter(|t| !t.is_completed).collect();
        active.sort_by_key(|task| task.priority.rank());
        active.extend(self.todos.iter().filter(|t| t.is_completed));
        active
    }

    /// `(active, completed)` task counts.
    pub fn todo_counts(&self) -> (usize, usize) {
        let completed = self.todos.iter().filter(|t| t.is_completed).count();
        (self.todos.len() - completed, completed)
    }

    pub fn add_todo(&mut self, draft: TodoDraft) -> StoreResult<TodoOutcome> {
        let mut task = TodoTask {
            id: new_entity_id(),
            title: draft.title,
            description: draft.description,
            priority: draft.priority,
            due_date: draft.due_date,
            is_completed: false,
            created_at: self.now(),
            remind: draft.remind,
            reminder_time: draft.reminder_time,
            notification_id: None,
            reminder_at: None,
        };
        self.prepare_todo(&mut task)?;

        self.todos.push(task);
        self.persist(CollectionKey::Todos);
        let index = self.todos.len() - 1;
        let reminder = if self.todos[index].remind {
            self.schedule_at(index)
        } else {
            ReminderStatus::Untouched
        };
        Ok(TodoOutcome {
            task: self.todos[index].clone(),
            reminder,
        })
    }

    /// Applies `patch`. Validation runs on the patched copy, so a rejected
    /// update leaves the stored task unchanged.
    pub fn update_todo(&mut self, id: &str, patch: &TodoPatch) -> StoreResult<TodoOutcome> {
        let index = self
            .todos
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| not_found(CollectionKey::Todos, id))?;
        let mut next = self.todos[index].clone();
        patch.apply_to(&mut next);
        self.prepare_todo(&mut next)?;

        let reschedule = next.remind && next.reminder_fields_differ(&self.todos[index]);
        self.todos[index] = next;
        self.persist(CollectionKey::Todos);

        let reminder = if reschedule {
            self.schedule_at(index)
        } else {
            ReminderStatus::Untouched
        };
        Ok(TodoOutcome {
            task: self.todos[index].clone(),
            reminder,
        })
    }

    /// Flips `is_completed`; returns the new value.
    pub fn toggle_todo_completed(&mut self, id: &str) -> StoreResult<bool> {
        let task = self
            .todos
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| not_found(CollectionKey::Todos, id))?;
        task.is_completed = !task.is_completed;
        let completed = task.is_completed;
        self.persist(CollectionKey::Todos);
        Ok(completed)
    }

    pub fn delete_todo(&mut self, id: &str) -> Option<TodoTask> {
        let index = self.todos.iter().position(|task| task.id == id)?;
        let removed = self.todos.remove(index);
        self.persist(CollectionKey::Todos);
        Some(removed)
    }

    /// Cancels the task's scheduled notification, if any, and clears its handle.
    ///
    /// Returns whether a handle was cleared.
    pub fn cancel_todo_reminder(&mut self, id: &str) -> StoreResult<bool> {
        let index = self
            .todos
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| not_found(CollectionKey::Todos, id))?;
        let Some(notification_id) = self.todos[index].notification_id.take() else {
            return Ok(false);
        };
        self.todos[index].reminder_at = None;
        self.persist(CollectionKey::Todos);
        self.reminders.cancel(&notification_id);
        Ok(true)
    }

    /// Trims text fields, defaults the reminder time, then validates.
    fn prepare_todo(&self, task: &mut TodoTask) -> Result<(), ValidationError> {
        task.title = required_text(&task.title, "task title")?;
        task.description = optional_text(task.description.take());
        task.reminder_time = optional_text(task.reminder_time.take());
        if !task.remind {
            return Ok(());
        }

        if !self.reminders.is_supported() {
            return Err(ValidationError::RemindersUnsupported);
        }
        if task.due_date.is_none() {
            return Err(ValidationError::RemindWithoutDueDate);
        }
        let time = task
            .reminder_time
            .get_or_insert_with(|| self.config.default_reminder_time.clone());
        if parse_time_of_day(time).is_none() {
            return Err(ValidationError::InvalidReminderTime(time.clone()));
        }
        Ok(())
    }

    fn schedule_at(&mut self, index: usize) -> ReminderStatus {
        let now = self.now();
        match self.reminders.schedule(&self.todos[index], now) {
            Ok(Some(scheduled)) => {
                let task = &mut self.todos[index];
                task.notification_id = Some(scheduled.notification_id.clone());
                task.reminder_at = Some(scheduled.reminder_at);
                self.persist(CollectionKey::Todos);
                ReminderStatus::Scheduled(scheduled)
            }
            Ok(None) => ReminderStatus::Skipped,
            Err(err) => {
                warn!(
                    "event=todo_reminder module=store status=error todo_id={} error={err}",
                    self.todos[index].id
                );
                ReminderStatus::Failed(err)
            }
        }
    }
}
