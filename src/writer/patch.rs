//! Round-trip save.
//!
//! Every edit is a splice of the original file text: changed calls are
//! rewritten in place, deleted calls lose exactly their span, new calls are
//! inserted in front of the token that closes their list. Bytes outside
//! those spans are never touched.
//!
//! Existing objects are patched from the end of the file backwards. Each
//! splice also moves the recorded offsets of the file's other objects that
//! sit after it, so every span stays valid for the next save.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::render::{render_new, rerender, unwritable_changes};
use crate::config::EditorConfig;
use crate::error::{EditorError, Result};
use crate::model::{LevelObject, SourceLocation, SourceType};
use crate::processor::Encoding;
use crate::processor::lexer::parse_int;
use crate::processor::scanner::{Invocation, Scanner, grammar, match_at, scan_all};
use crate::processor::script_parser::find_area;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveFailure {
    pub file: Option<PathBuf>,
    pub message: String,
}

impl From<&EditorError> for SaveFailure {
    fn from(err: &EditorError) -> Self {
        Self {
            file: err.path().map(Path::to_path_buf),
            message: err.to_string(),
        }
    }
}

/// Outcome of a save: files written and everything that could not be done.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SaveReport {
    pub saved: Vec<PathBuf>,
    pub failed: Vec<SaveFailure>,
}

impl SaveReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    fn fail(&mut self, err: EditorError) {
        tracing::warn!(error = %err, "not saved");
        self.failed.push(SaveFailure::from(&err));
    }
}

/// Writes every pending change of `objects` back to its file.
///
/// On return persisted objects carry spans valid for the new file contents,
/// inserted objects are no longer `is_new` and deleted objects have a
/// zero-length span. A failing file or object is reported and skipped.
pub fn save(objects: &mut [LevelObject], config: &EditorConfig) -> SaveReport {
    let mut report = SaveReport::default();

    let mut by_file: BTreeMap<PathBuf, Vec<usize>> = BTreeMap::new();
    for (i, obj) in objects.iter().enumerate() {
        if obj.is_new && obj.is_deleted {
            continue;
        }
        match obj.file() {
            Some(file) if obj.is_new || obj.is_persisted() => {
                by_file.entry(file.to_path_buf()).or_default().push(i);
            }
            None if obj.is_new => report.fail(EditorError::NoTargetFile {
                kind: obj.source_type,
                model: obj.model_name.clone(),
            }),
            _ => {}
        }
    }

    for (path, members) in by_file {
        match save_file(&path, &members, objects, config, &mut report) {
            Ok(true) => {
                tracing::info!(path = %path.display(), "saved");
                report.saved.push(path);
            }
            Ok(false) => tracing::debug!(path = %path.display(), "unchanged"),
            Err(e) => report.fail(e),
        }
    }

    report
}

/// Patches one file. `Ok(false)` means there was nothing to write.
fn save_file(
    path: &Path,
    members: &[usize],
    objects: &mut [LevelObject],
    config: &EditorConfig,
    report: &mut SaveReport,
) -> Result<bool> {
    let bytes = fs::read(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => EditorError::NotFound(path.to_path_buf()),
        _ => EditorError::Read {
            path: path.to_path_buf(),
            source,
        },
    })?;
    let (text, encoding) = Encoding::decode(bytes);

    let before: Vec<(Option<SourceLocation>, bool)> = members
        .iter()
        .map(|&i| (objects[i].source.clone(), objects[i].is_new))
        .collect();

    let mut buf = FileBuffer {
        path,
        text,
        members,
        changed: false,
        specials_moved: false,
    };

    let mut existing: Vec<usize> = members
        .iter()
        .copied()
        .filter(|&i| objects[i].is_persisted())
        .collect();
    existing.sort_by_key(|&i| Reverse(objects[i].source.as_ref().map_or(0, |s| s.offset)));
    for i in existing {
        if let Err(e) = buf.patch(objects, i, report) {
            report.fail(e);
        }
    }

    for &i in members {
        if objects[i].is_new && !objects[i].is_deleted {
            if let Err(e) = buf.insert(objects, i) {
                report.fail(e);
            }
        }
    }

    if buf.specials_moved && config.is_collision_file(path) {
        buf.update_special_count(objects);
    }

    if !buf.changed {
        return Ok(false);
    }
    let written = encoding
        .encode(&buf.text)
        .ok_or_else(|| io::Error::new(ErrorKind::InvalidData, "edited text does not fit the file's Latin-1 encoding"))
        .and_then(|bytes| fs::write(path, bytes));
    if let Err(source) = written {
        // Nothing reached the disk, so the old spans are still the right ones.
        for (&i, (loc, is_new)) in members.iter().zip(before) {
            objects[i].source = loc;
            objects[i].is_new = is_new;
        }
        return Err(EditorError::Write {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(true)
}

/// Text of one file being patched, plus the objects whose spans point into it.
struct FileBuffer<'a> {
    path: &'a Path,
    text: String,
    members: &'a [usize],
    changed: bool,
    /// A special object was inserted or removed.
    specials_moved: bool,
}

impl FileBuffer<'_> {
    /// Replaces `remove` bytes at `at` with `insert` and moves the spans of
    /// persisted objects lying after the removed bytes.
    fn splice(&mut self, objects: &mut [LevelObject], at: usize, remove: usize, insert: &str) {
        self.text.replace_range(at..at + remove, insert);
        self.changed = true;

        let after = at + remove;
        for &i in self.members {
            if !objects[i].is_persisted() {
                continue;
            }
            if let Some(loc) = objects[i].source.as_mut() {
                if loc.offset >= after {
                    loc.offset = loc.offset - remove + insert.len();
                }
            }
        }
    }

    /// The call `objects[i]` was parsed from, if it is still there.
    fn current(&self, obj: &LevelObject) -> Result<Invocation> {
        let (offset, length) = obj.source.as_ref().map_or((0, 0), |s| (s.offset, s.length));
        match_at(&self.text, offset, &obj.source_type.grammar())
            .filter(|inv| inv.len == length)
            .ok_or_else(|| EditorError::StaleSpan {
                path: self.path.to_path_buf(),
                offset,
                length,
                kind: obj.source_type,
            })
    }

    fn patch(&mut self, objects: &mut [LevelObject], i: usize, report: &mut SaveReport) -> Result<()> {
        let inv = self.current(&objects[i])?;

        if objects[i].is_deleted {
            self.splice(objects, inv.offset, inv.len, "");
            if let Some(loc) = objects[i].source.as_mut() {
                loc.length = 0;
            }
            self.specials_moved |= objects[i].source_type == SourceType::Special;
            tracing::debug!(at = inv.offset, name = inv.name, "removed");
            return Ok(());
        }

        for field in unwritable_changes(&objects[i], &inv) {
            report.fail(EditorError::NotWritable {
                path: self.path.to_path_buf(),
                offset: inv.offset,
                kind: objects[i].source_type,
                field,
            });
        }

        let Some(call) = rerender(&objects[i], &inv) else {
            return Ok(());
        };
        self.splice(objects, inv.offset, inv.call_len, &call);
        if let Some(loc) = objects[i].source.as_mut() {
            loc.length = call.len() + (inv.len - inv.call_len);
        }
        tracing::debug!(at = inv.offset, name = inv.name, "rewritten");
        Ok(())
    }

    fn insert(&mut self, objects: &mut [LevelObject], i: usize) -> Result<()> {
        let kind = objects[i].source_type;
        let call = render_new(&objects[i])?;
        let at = self
            .insertion_point(&objects[i])
            .ok_or_else(|| EditorError::NoInsertionPoint {
                path: self.path.to_path_buf(),
                kind,
            })?;

        let text = format!("{call},\n{}", line_indent(&self.text, at));
        self.splice(objects, at, 0, &text);

        let inv = match_at(&self.text, at, &kind.grammar()).ok_or_else(|| EditorError::StaleSpan {
            path: self.path.to_path_buf(),
            offset: at,
            length: text.len(),
            kind,
        })?;
        let obj = &mut objects[i];
        obj.source = Some(SourceLocation::new(self.path, at, inv.len));
        obj.is_new = false;
        self.specials_moved |= kind == SourceType::Special;
        tracing::debug!(at, name = inv.name, "inserted");
        Ok(())
    }

    /// Where a new object of this kind goes: in front of the token closing
    /// its list, or right after the last special object.
    fn insertion_point(&self, obj: &LevelObject) -> Option<usize> {
        let text = self.text.as_str();
        let closing_brace = || text.rfind("};");
        match obj.source_type {
            SourceType::Normal => find_area(text, obj.area_index)
                .and_then(|range| Scanner::within(text, range, grammar::END_AREA).next())
                .or_else(|| Scanner::new(text, grammar::END_AREA).last())
                .map(|inv| inv.offset)
                .or_else(closing_brace),
            SourceType::Macro => Scanner::new(text, grammar::MACRO_OBJECT_END)
                .last()
                .map(|inv| inv.offset)
                .or_else(closing_brace),
            SourceType::Special => scan_all(text, &[grammar::SPECIAL_OBJECT])
                .pop()
                .or_else(|| Scanner::new(text, grammar::COL_SPECIAL_INIT).next())
                .filter(|inv| inv.len > inv.call_len)
                .map(|inv| inv.end())
                .or_else(|| Scanner::new(text, grammar::COL_END).last().map(|inv| inv.offset))
                .or_else(closing_brace),
            SourceType::Mario => None,
        }
    }

    /// Sets a literal `COL_SPECIAL_INIT(n)` to the number of special objects.
    /// A symbolic count is left to whoever defines it.
    fn update_special_count(&mut self, objects: &mut [LevelObject]) {
        let count = scan_all(&self.text, &[grammar::SPECIAL_OBJECT]).len();
        let Some(init) = Scanner::new(&self.text, grammar::COL_SPECIAL_INIT).next() else {
            return;
        };
        match parse_int(init.arg(0)) {
            Some(n) if n == count as i64 => return,
            Some(_) => {}
            None => {
                tracing::debug!(value = init.arg(0), "special object count is not a literal, left as is");
                return;
            }
        }
        let call = format!("COL_SPECIAL_INIT({count})");
        self.splice(objects, init.offset, init.call_len, &call);
        tracing::debug!(count, "special object count updated");
    }
}

/// Leading whitespace of the line containing `at`.
fn line_indent(text: &str, at: usize) -> &str {
    let start = text[..at].rfind('\n').map_or(0, |p| p + 1);
    let line = &text[start..at];
    &line[..line.len() - line.trim_start().len()]
}
