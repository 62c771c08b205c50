use super::{not_found, ReactiveStore, StoreResult};
use crate::kv::KvStore;
use crate::model::ids::{base36_millis, new_entity_id, random_base36};
use crate::model::note::{Note, NoteBlock};
use crate::repo::CollectionKey;
use crate::service::attachment_service::ImageSource;
use crate::service::autosave::{AutosaveDebouncer, NoteDraft};
use crate::service::note_blocks::{
    aspect_ratio, clamp_image_widths, derive_plain_text, image_block, initial_text_block,
};
use log::{info, warn};

/// Title given to notes created with a blank title.
pub const UNTITLED_NOTE: &str = "Untitled Note";

/// Result of `delete_note`.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteDeletion {
    pub note: Note,
    /// Whether an attachment directory was found and removed.
    pub attachments_removed: bool,
}

impl<K: KvStore> ReactiveStore<K> {
    pub fn note(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    /// Notes ordered by `updated_at`, newest first.
    pub fn notes_by_recency(&self) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self.notes.iter().collect();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        notes
    }

    /// Creates a note. Without blocks it starts with one empty text block.
    pub fn add_note(&mut self, title: &str, blocks: Option<Vec<NoteBlock>>) -> Note {
        let id = new_entity_id();
        let now = self.now();
        let mut blocks = blocks.unwrap_or_default();
        if blocks.is_empty() {
            blocks.push(initial_text_block(&id, ""));
        }
        clamp_image_widths(&mut blocks);

        let note = Note {
            content: derive_plain_text(&blocks),
            title: note_title(title),
            id,
            blocks,
            created_at: now,
            updated_at: now,
        };
        self.notes.push(note.clone());
        self.persist(CollectionKey::Notes);
        note
    }

    /// Replaces title and blocks, recomputing `content` and bumping `updated_at`.
    pub fn update_note(
        &mut self,
        id: &str,
        title: &str,
        mut blocks: Vec<NoteBlock>,
    ) -> StoreResult<Note> {
        let now = self.now();
        let note = self
            .notes
            .iter_mut()
            .find(|note| note.id == id)
            .ok_or_else(|| not_found(CollectionKey::Notes, id))?;

        if blocks.is_empty() {
            blocks.push(initial_text_block(id, ""));
        }
        clamp_image_widths(&mut blocks);
        note.title = note_title(title);
        note.content = derive_plain_text(&blocks);
        note.blocks = blocks;
        note.updated_at = now;
        let updated = note.clone();

        self.persist(CollectionKey::Notes);
        Ok(updated)
    }

    /// Editor autosave state for `id`, using the configured quiet period.
    pub fn note_autosave(&self, id: &str) -> Option<AutosaveDebouncer<NoteDraft>> {
        let note = self.note(id)?;
        Some(AutosaveDebouncer::new(
            NoteDraft::from_note(note),
            self.config.autosave_quiet_ms,
        ))
    }

    /// Commits the debounced draft for `id` when its quiet period has elapsed.
    ///
    /// Returns the updated note, or `Ok(None)` when nothing was due.
    pub fn autosave_note(
        &mut self,
        id: &str,
        autosave: &mut AutosaveDebouncer<NoteDraft>,
    ) -> StoreResult<Option<Note>> {
        let Some(draft) = autosave.poll(self.now()) else {
            return Ok(None);
        };
        let note = self.update_note(id, &draft.title, draft.blocks)?;
        autosave.mark_committed(NoteDraft::from_note(&note));
        Ok(Some(note))
    }

    /// Removes the note, then its attachment directory.
    ///
    /// Attachment cleanup failures are logged; the note stays deleted.
    pub fn delete_note(&mut self, id: &str) -> Option<NoteDeletion> {
        let index = self.notes.iter().position(|note| note.id == id)?;
        let note = self.notes.remove(index);
        self.persist(CollectionKey::Notes);

        let attachments_removed = match self.attachments.delete_note_attachments(id) {
            Ok(removed) => removed,
            Err(err) => {
                warn!("event=note_delete module=store status=error note_id={id} error={err}");
                false
            }
        };
        Some(NoteDeletion {
            note,
            attachments_removed,
        })
    }

    /// Copies `source` into the note's attachment directory and appends an
    /// image block pointing at the copy.
    ///
    /// On failure the note is left unchanged.
    pub fn add_note_image(&mut self, note_id: &str, source: &ImageSource) -> StoreResult<NoteBlock> {
        if self.note(note_id).is_none() {
            return Err(not_found(CollectionKey::Notes, note_id));
        }
        let now = self.now();
        let uri = self.attachments.add_image(note_id, source, now)?;

        let Some(note) = self.notes.iter_mut().find(|note| note.id == note_id) else {
            return Err(not_found(CollectionKey::Notes, note_id));
        };
        let mut suffix = format!("img-{}", base36_millis(now));
        if note.blocks.iter().any(|block| block.id() == format!("{note_id}-{suffix}")) {
            suffix = format!("{suffix}-{}", random_base36(4));
        }
        let block = image_block(
            note_id,
            &suffix,
            uri,
            aspect_ratio(source.width, source.height),
            None,
        );
        note.blocks.push(block.clone());
        note.updated_at = now;

        self.persist(CollectionKey::Notes);
        info!("event=note_image_add module=store status=ok note_id={note_id}");
        Ok(block)
    }
}

fn note_title(title: &str) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        UNTITLED_NOTE.to_string()
    } else {
        trimmed.to_string()
    }
}
