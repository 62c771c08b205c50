//! Note block assembly.
//!
//! # Responsibility
//! - Normalize notes into a non-empty ordered block list.
//! - Derive the legacy flat `content` from text blocks.
//! - Provide the block edits the note editor performs.
//!
//! # Invariants
//! - `normalize` is idempotent.
//! - Image blocks never contribute to derived text.
//! - Widths produced here are always within `[0.25, 1]`.

use crate::model::ids::base36_millis;
use crate::model::note::{
    ImageBlock, Note, NoteBlock, TextBlock, MAX_IMAGE_WIDTH_PCT, MIN_IMAGE_WIDTH_PCT,
};
use chrono::{DateTime, Utc};

/// Step used by the editor's width -/+ controls.
pub const IMAGE_WIDTH_STEP: f64 = 0.1;

/// Ensures `note` has at least one block.
///
/// A note with blocks is returned unchanged. Otherwise its legacy `content`
/// becomes a single text block `<noteId>-text-0` and `content` is kept as
/// that same text.
pub fn normalize(note: Note) -> Note {
    if !note.blocks.is_empty() {
        return note;
    }

    let legacy_text = note.content.clone();
    Note {
        blocks: vec![initial_text_block(&note.id, legacy_text.clone())],
        content: legacy_text,
        ..note
    }
}

/// Text blocks joined by newlines, trimmed.
pub fn derive_plain_text(blocks: &[NoteBlock]) -> String {
    let texts: Vec<&str> = blocks
        .iter()
        .filter_map(|block| match block {
            NoteBlock::Text(text) => Some(text.text.as_str()),
            NoteBlock::Image(_) => None,
        })
        .collect();
    texts.join("\n").trim().to_string()
}

/// Clamps an image width into `[0.25, 1]`; non-finite input becomes full width.
pub fn clamp_width(width_pct: f64) -> f64 {
    if !width_pct.is_finite() {
        return MAX_IMAGE_WIDTH_PCT;
    }
    width_pct.clamp(MIN_IMAGE_WIDTH_PCT, MAX_IMAGE_WIDTH_PCT)
}

pub fn clamp_image_widths(blocks: &mut [NoteBlock]) {
    for block in blocks {
        if let NoteBlock::Image(image) = block {
            image.width_pct = clamp_width(image.width_pct);
        }
    }
}

/// The block synthesized for new or legacy notes.
pub fn initial_text_block(note_id: &str, text: impl Into<String>) -> NoteBlock {
    text_block(note_id, "text-0", text)
}

/// Text block with id `<noteId>-<suffix>`.
pub fn text_block(note_id: &str, suffix: &str, text: impl Into<String>) -> NoteBlock {
    NoteBlock::Text(TextBlock {
        id: format!("{note_id}-{suffix}"),
        text: text.into(),
    })
}

/// Image block with id `<noteId>-<suffix>`; width defaults to full.
pub fn image_block(
    note_id: &str,
    suffix: &str,
    uri: impl Into<String>,
    aspect_ratio: Option<f64>,
    width_pct: Option<f64>,
) -> NoteBlock {
    NoteBlock::Image(ImageBlock {
        id: format!("{note_id}-{suffix}"),
        uri: uri.into(),
        aspect_ratio,
        width_pct: clamp_width(width_pct.unwrap_or(MAX_IMAGE_WIDTH_PCT)),
    })
}

/// Width/height ratio when both dimensions are known and positive.
pub fn aspect_ratio(width: Option<u32>, height: Option<u32>) -> Option<f64> {
    match (width, height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Some(f64::from(w) / f64::from(h)),
        _ => None,
    }
}

/// Appends an empty text block stamped with `at`; returns its id.
pub fn append_text_block(note_id: &str, blocks: &mut Vec<NoteBlock>, at: DateTime<Utc>) -> String {
    let block = text_block(note_id, &format!("text-{}", base36_millis(at)), "");
    let id = block.id().to_string();
    blocks.push(block);
    id
}

/// Replaces the text of the text block `block_id`. Returns whether it matched.
pub fn update_text(blocks: &mut [NoteBlock], block_id: &str, text: impl Into<String>) -> bool {
    for block in blocks {
        if let NoteBlock::Text(existing) = block {
            if existing.id == block_id {
                existing.text = text.into();
                return true;
            }
        }
    }
    false
}

/// Sets the clamped width of image block `block_id`; returns the applied width.
pub fn set_image_width(blocks: &mut [NoteBlock], block_id: &str, width_pct: f64) -> Option<f64> {
    blocks.iter_mut().find_map(|block| match block {
        NoteBlock::Image(image) if image.id == block_id => {
            image.width_pct = clamp_width(width_pct);
            Some(image.width_pct)
        }
        _ => None,
    })
}

/// Moves the width of image block `block_id` by `delta`, clamped.
pub fn nudge_image_width(blocks: &mut [NoteBlock], block_id: &str, delta: f64) -> Option<f64> {
    let current = blocks.iter().find_map(|block| match block {
        NoteBlock::Image(image) if image.id == block_id => Some(image.width_pct),
        _ => None,
    })?;
    set_image_width(blocks, block_id, current + delta)
}

pub fn remove_block(blocks: &mut Vec<NoteBlock>, block_id: &str) -> bool {
    let before = blocks.len();
    blocks.retain(|block| block.id() != block_id);
    blocks.len() != before
}
