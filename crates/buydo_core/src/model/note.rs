//! Note records and content blocks.
//!
//! # Invariants
//! - After normalization `blocks` is never empty.
//! - `content` mirrors the text blocks and is never edited directly once
//!   blocks exist.
//! - Image `width_pct` stays within `[MIN_IMAGE_WIDTH_PCT, MAX_IMAGE_WIDTH_PCT]`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_IMAGE_WIDTH_PCT: f64 = 0.25;
pub const MAX_IMAGE_WIDTH_PCT: f64 = 1.0;

/// Free-form note made of ordered blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    /// Legacy flattened text, kept for list previews and older records.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub blocks: Vec<NoteBlock>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One unit of note content, discriminated by `type` in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NoteBlock {
    Text(TextBlock),
    Image(ImageBlock),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageBlock {
    pub id: String,
    pub uri: String,
    /// Width divided by height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<f64>,
    /// Fraction of the content container width; 1.0 is full width.
    #[serde(default = "full_width")]
    pub width_pct: f64,
}

fn full_width() -> f64 {
    MAX_IMAGE_WIDTH_PCT
}

impl NoteBlock {
    pub fn id(&self) -> &str {
        match self {
            Self::Text(block) => &block.id,
            Self::Image(block) => &block.id,
        }
    }
}
