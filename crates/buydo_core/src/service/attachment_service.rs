//! Per-note image attachment files.
//!
//! # Responsibility
//! - Copy picked images into `<data_dir>/notes/<noteId>/`.
//! - Remove a note's attachment directory when the note is deleted.
//!
//! # Invariants
//! - Each note directory is owned exclusively by that note's lifecycle.
//! - A failed add leaves no reference behind; the caller appends a block only
//!   after `add_image` returns `Ok`.
//! - Note ids never escape the attachments root.

use crate::config::{CoreConfig, Platform};
use crate::model::ids::{base36_millis, random_base36};
use chrono::{DateTime, Utc};
use log::{error, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};

static NON_ALPHANUMERIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9]").expect("valid extension regex"));

const NOTES_DIR_NAME: &str = "notes";
const DEFAULT_EXTENSION: &str = "jpg";
const RANDOM_SUFFIX_LEN: usize = 11;
const FILE_URI_SCHEME: &str = "file://";

/// Photo library access gate.
pub trait MediaPermission {
    /// Prompts if needed; returns whether access is granted.
    fn request_access(&self) -> bool;
}

/// Gate for hosts that need no photo permission.
#[derive(Debug, Default, Clone, Copy)]
pub struct GrantedMediaAccess;

impl MediaPermission for GrantedMediaAccess {
    fn request_access(&self) -> bool {
        true
    }
}

/// A picked image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageSource {
    /// Local path or `file://` URI of the picked file.
    pub uri: String,
    /// Original file name, used for the extension.
    pub file_name: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ImageSource {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self {
            uri: path.display().to_string(),
            file_name: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            width: None,
            height: None,
        }
    }

    fn local_path(&self) -> PathBuf {
        PathBuf::from(self.uri.strip_prefix(FILE_URI_SCHEME).unwrap_or(&self.uri))
    }
}

#[derive(Debug)]
pub enum AttachmentError {
    PermissionDenied,
    InvalidNoteId(String),
    Io {
        op: &'static str,
        path: PathBuf,
        source: io::Error,
    },
}

impl Display for AttachmentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "photo library permission denied"),
            Self::InvalidNoteId(id) => write!(f, "invalid note id for attachments: `{id}`"),
            Self::Io { op, path, source } => {
                write!(f, "attachment {op} failed for `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for AttachmentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Owns the per-note attachment directories.
pub struct AttachmentManager {
    root: PathBuf,
    platform: Platform,
    permission: Box<dyn MediaPermission>,
}

impl AttachmentManager {
    pub fn new(config: &CoreConfig, permission: Box<dyn MediaPermission>) -> Self {
        Self {
            root: config.data_dir.join(NOTES_DIR_NAME),
            platform: config.platform,
            permission,
        }
    }

    /// `<data_dir>/notes/<noteId>`.
    pub fn note_dir(&self, note_id: &str) -> Result<PathBuf, AttachmentError> {
        validate_note_id(note_id)?;
        Ok(self.root.join(note_id))
    }

    /// Copies `source` into the note directory and returns the new file URI.
    ///
    /// On platforms without local files the source URI is returned as is.
    pub fn add_image(
        &self,
        note_id: &str,
        source: &ImageSource,
        now: DateTime<Utc>,
    ) -> Result<String, AttachmentError> {
        let dir = self.note_dir(note_id)?;
        if !self.permission.request_access() {
            info!("event=attachment_add module=attachment status=skip reason=permission_denied");
            return Err(AttachmentError::PermissionDenied);
        }
        if !self.platform.supports_local_files() {
            return Ok(source.uri.clone());
        }

        std::fs::create_dir_all(&dir).map_err(|err| AttachmentError::Io {
            op: "create_dir",
            path: dir.clone(),
            source: err,
        })?;

        let target = dir.join(attachment_file_name(source.file_name.as_deref(), now));
        let from = source.local_path();
        if let Err(err) = std::fs::copy(&from, &target) {
            error!(
                "event=attachment_add module=attachment status=error note_id={note_id} error={err}"
            );
            return Err(AttachmentError::Io {
                op: "copy",
                path: from,
                source: err,
            });
        }

        info!(
            "event=attachment_add module=attachment status=ok note_id={note_id} file={}",
            target.display()
        );
        Ok(format!("{FILE_URI_SCHEME}{}", target.display()))
    }

    /// Removes the note's directory. Returns `Ok(false)` when none existed.
    pub fn delete_note_attachments(&self, note_id: &str) -> Result<bool, AttachmentError> {
        if !self.platform.supports_local_files() {
            return Ok(false);
        }
        let dir = self.note_dir(note_id)?;
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => {
                info!("event=attachment_purge module=attachment status=ok note_id={note_id}");
                Ok(true)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(AttachmentError::Io {
                op: "remove_dir",
                path: dir,
                source: err,
            }),
        }
    }
}

/// `img-<base36 ms>-<random>.<ext>` with the extension sanitized to ASCII
/// alphanumerics and defaulting to `jpg`.
pub fn attachment_file_name(original_name: Option<&str>, now: DateTime<Utc>) -> String {
    format!(
        "img-{}-{}.{}",
        base36_millis(now),
        random_base36(RANDOM_SUFFIX_LEN),
        sanitized_extension(original_name)
    )
}

fn sanitized_extension(original_name: Option<&str>) -> String {
    let raw = original_name
        .and_then(|name| name.rsplit_once('.').map(|(_, ext)| ext))
        .unwrap_or(DEFAULT_EXTENSION);
    let cleaned = NON_ALPHANUMERIC_RE.replace_all(raw, "");
    if cleaned.is_empty() {
        DEFAULT_EXTENSION.to_string()
    } else {
        cleaned.into_owned()
    }
}

fn validate_note_id(note_id: &str) -> Result<(), AttachmentError> {
    let trimmed = note_id.trim();
    let escapes = trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains(['/', '\\'])
        || trimmed != note_id;
    if escapes {
        return Err(AttachmentError::InvalidNoteId(note_id.to_string()));
    }
    Ok(())
}
