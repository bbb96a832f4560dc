//! The functional core: C text in, level objects and lookup tables out.
//!
//! Scanning is best effort everywhere. A missing file reads as empty and a
//! malformed fragment is skipped, so callers always get whatever could be
//! recovered.
pub mod catalog;
pub mod lexer;
pub mod macro_parser;
pub mod model_ids;
pub mod presets;
pub mod scanner;
pub mod script_parser;
pub mod special_parser;

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// How the bytes of a source file map to the text the scanner works on.
///
/// Files that are not valid UTF-8 are read as Latin-1, one char per byte,
/// so a stray byte in a comment neither hides the file nor gets mangled
/// when it is written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Latin1,
}

impl Encoding {
    pub fn decode(bytes: Vec<u8>) -> (String, Encoding) {
        match String::from_utf8(bytes) {
            Ok(text) => (text, Encoding::Utf8),
            Err(e) => (e.into_bytes().into_iter().map(char::from).collect(), Encoding::Latin1),
        }
    }

    /// `None` when `text` holds a char the encoding cannot store.
    pub fn encode(self, text: &str) -> Option<Vec<u8>> {
        match self {
            Encoding::Utf8 => Some(text.as_bytes().to_vec()),
            Encoding::Latin1 => text.chars().map(|c| u8::try_from(c).ok()).collect(),
        }
    }
}

/// Reads a source file, treating a missing or unreadable file as absent.
pub(crate) fn read_source(path: &Path) -> Option<String> {
    match fs::read(path) {
        Ok(bytes) => {
            let (text, encoding) = Encoding::decode(bytes);
            if encoding != Encoding::Utf8 {
                tracing::debug!(path = %path.display(), "not UTF-8, read as Latin-1");
            }
            Some(text)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "file not found");
            None
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read file");
            None
        }
    }
}
