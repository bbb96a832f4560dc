use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::SourceType;

/// Errors surfaced by the editor core. None of them abort a whole save or
/// parse; they are collected and reported next to the partial result.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("bytes {offset}..{} of {} no longer hold a {kind:?} invocation", .offset + .length, .path.display())]
    StaleSpan {
        path: PathBuf,
        offset: usize,
        length: usize,
        kind: SourceType,
    },

    #[error("{kind:?} call at byte {offset} of {} has no argument for its {field}; that change was not saved", .path.display())]
    NotWritable {
        path: PathBuf,
        offset: usize,
        kind: SourceType,
        field: &'static str,
    },

    #[error("new {kind:?} object '{model}' has no target file")]
    NoTargetFile { kind: SourceType, model: String },

    #[error("new {kind:?} object still has the placeholder '{value}'")]
    Placeholder { kind: SourceType, value: String },

    #[error("no place to insert a {kind:?} object in {}", .path.display())]
    NoInsertionPoint { path: PathBuf, kind: SourceType },

    #[error("object index {index} out of range ({len} objects)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid config {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl EditorError {
    /// The file the error is about, when there is one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            EditorError::NotFound(path) => Some(path),
            EditorError::Read { path, .. }
            | EditorError::Write { path, .. }
            | EditorError::StaleSpan { path, .. }
            | EditorError::NotWritable { path, .. }
            | EditorError::NoInsertionPoint { path, .. }
            | EditorError::Config { path, .. } => Some(path),
            EditorError::NoTargetFile { .. } | EditorError::Placeholder { .. } | EditorError::IndexOutOfRange { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, EditorError>;
