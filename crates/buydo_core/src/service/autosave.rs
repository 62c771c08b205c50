//! Quiet-period autosave policy for editors.
//!
//! An edit is committed once no further edit arrived for the quiet period,
//! and only when it differs structurally from the last committed value.

use crate::model::note::{Note, NoteBlock};
use chrono::{DateTime, Duration, Utc};

/// Editable part of a note, compared structurally.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteDraft {
    pub title: String,
    pub blocks: Vec<NoteBlock>,
}

impl NoteDraft {
    pub fn from_note(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            blocks: note.blocks.clone(),
        }
    }
}

/// Debounces edits of one value.
#[derive(Debug, Clone)]
pub struct AutosaveDebouncer<T> {
    quiet: Duration,
    committed: T,
    pending: Option<(T, DateTime<Utc>)>,
}

impl<T: Clone + PartialEq> AutosaveDebouncer<T> {
    pub fn new(committed: T, quiet_ms: u64) -> Self {
        Self {
            quiet: Duration::milliseconds(i64::try_from(quiet_ms).unwrap_or(i64::MAX)),
            committed,
            pending: None,
        }
    }

    /// Records the latest edited value; restarts the quiet period.
    pub fn record_edit(&mut self, value: T, at: DateTime<Utc>) {
        self.pending = Some((value, at));
    }

    /// Returns the value to commit once the quiet period elapsed.
    ///
    /// Unchanged values are dropped without a commit. The baseline is left
    /// alone; call [`Self::mark_committed`] once the save succeeded.
    pub fn poll(&mut self, at: DateTime<Utc>) -> Option<T> {
        let (_, edited_at) = self.pending.as_ref()?;
        if at - *edited_at < self.quiet {
            return None;
        }
        let (value, _) = self.pending.take()?;
        if value == self.committed {
            return None;
        }
        Some(value)
    }

    /// Replaces the baseline, e.g. after an external commit.
    pub fn mark_committed(&mut self, value: T) {
        self.committed = value;
    }

    pub fn has_pending_edit(&self) -> bool {
        self.pending.is_some()
    }

    pub fn committed(&self) -> &T {
        &self.committed
    }
}

#[cfg(test)]
mod tests {
    use super::AutosaveDebouncer;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn commits_only_after_quiet_period() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut debouncer = AutosaveDebouncer::new("a".to_string(), 500);

        debouncer.record_edit("ab".to_string(), start);
        assert_eq!(debouncer.poll(start + Duration::milliseconds(200)), None);

        debouncer.record_edit("abc".to_string(), start + Duration::milliseconds(300));
        assert_eq!(debouncer.poll(start + Duration::milliseconds(600)), None);
        assert_eq!(
            debouncer.poll(start + Duration::milliseconds(800)),
            Some("abc".to_string())
        );
        assert!(!debouncer.has_pending_edit());
    }

    #[test]
    fn baseline_moves_only_when_marked() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut debouncer = AutosaveDebouncer::new("a".to_string(), 500);

        debouncer.record_edit("b".to_string(), start);
        let due = debouncer.poll(start + Duration::seconds(1));
        assert_eq!(due.as_deref(), Some("b"));
        assert_eq!(debouncer.committed(), "a");

        // Save failed: the same edit is due again.
        debouncer.record_edit("b".to_string(), start + Duration::seconds(2));
        let due = debouncer.poll(start + Duration::seconds(3)).unwrap();
        debouncer.mark_committed(due);
        assert_eq!(debouncer.committed(), "b");

        debouncer.record_edit("b".to_string(), start + Duration::seconds(4));
        assert_eq!(debouncer.poll(start + Duration::seconds(5)), None);
    }

    #[test]
    fn structurally_equal_edit_is_skipped() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut debouncer = AutosaveDebouncer::new(vec![1, 2], 500);

        debouncer.record_edit(vec![1, 2], start);
        assert_eq!(debouncer.poll(start + Duration::seconds(1)), None);
        assert!(!debouncer.has_pending_edit());
    }
}
