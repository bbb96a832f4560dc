//! Parser that turns a level script into `LevelObject`s.
//!
//! A level script places actors with `OBJECT(...)` inside
//! `AREA(n, ...)` ... `END_AREA()` and may share object lists between
//! areas through `JUMP_LINK(name)` into another
//! `const LevelScript name[] = { ... };` block of the same file. Spawn
//! points are `MARIO_POS(area, yaw, x, y, z)` and may sit anywhere.

use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::lexer::{int_or_zero, parse_int, u32_or_zero};
use super::read_source;
use super::scanner::{Invocation, Scanner, grammar};
use crate::model::{LevelObject, MARIO_BEHAVIOR, MARIO_MODEL, SourceLocation, SourceType, Vec3};

static SCRIPT_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"const\s+LevelScript\s+([A-Za-z0-9_]+)\s*\[\s*\]\s*=\s*\{").unwrap()
});

/// Byte range of one `AREA(n, ...)` ... `END_AREA()` scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaScope {
    pub index: i32,
    pub range: Range<usize>,
}

/// Every area of a script, in file order. An `AREA` without a following
/// `END_AREA()` is ignored.
pub fn find_areas(text: &str) -> Vec<AreaScope> {
    Scanner::new(text, grammar::AREA)
        .filter_map(|area| {
            let index = parse_int(area.arg(0))? as i32;
            let end = Scanner::within(text, area.offset..text.len(), grammar::END_AREA).next()?;
            Some(AreaScope {
                index,
                range: area.offset..end.end(),
            })
        })
        .collect()
}

pub fn find_area(text: &str, index: i32) -> Option<Range<usize>> {
    find_areas(text)
        .into_iter()
        .find(|a| a.index == index)
        .map(|a| a.range)
}

/// Bodies of `const LevelScript name[] = { ... };` blocks, by name.
fn script_blocks(text: &str) -> HashMap<String, Range<usize>> {
    SCRIPT_BLOCK_RE
        .captures_iter(text)
        .filter_map(|c| {
            let whole = c.get(0)?;
            let start = whole.end();
            let end = text[start..].find("};").map_or(text.len(), |e| start + e);
            Some((c[1].to_string(), start..end))
        })
        .collect()
}

/// Name of the macro object list an area uses (`MACRO_OBJECTS(list)`).
pub fn macro_list_name(text: &str, area: Option<i32>) -> Option<String> {
    let range = match area {
        Some(index) => find_area(text, index)?,
        None => 0..text.len(),
    };
    Scanner::within(text, range, grammar::MACRO_OBJECTS)
        .next()
        .map(|inv| inv.arg(0).to_string())
}

pub fn normal_object(inv: &Invocation, file: &Path) -> LevelObject {
    LevelObject {
        position: Vec3::new(int_or_zero(inv.arg(1)), int_or_zero(inv.arg(2)), int_or_zero(inv.arg(3))),
        rotation: Vec3::new(int_or_zero(inv.arg(4)), int_or_zero(inv.arg(5)), int_or_zero(inv.arg(6))),
        params: u32_or_zero(inv.arg(7)),
        source: Some(SourceLocation::new(file, inv.offset, inv.len)),
        ..LevelObject::new(SourceType::Normal, inv.arg(0), inv.arg(8))
    }
}

pub fn mario_object(inv: &Invocation, file: &Path) -> LevelObject {
    LevelObject {
        position: Vec3::new(int_or_zero(inv.arg(2)), int_or_zero(inv.arg(3)), int_or_zero(inv.arg(4))),
        rotation: Vec3::new(0, int_or_zero(inv.arg(1)), 0),
        source: Some(SourceLocation::new(file, inv.offset, inv.len)),
        area_index: parse_int(inv.arg(0)).map_or(-1, |a| a as i32),
        ..LevelObject::new(SourceType::Mario, MARIO_MODEL, MARIO_BEHAVIOR)
    }
}

/// Objects of `file`, restricted to one area when `area` is given.
pub fn parse_script_file(file: &Path, area: Option<i32>) -> Vec<LevelObject> {
    match read_source(file) {
        Some(text) => parse_script_text(&text, file, area),
        None => Vec::new(),
    }
}

pub fn parse_script_text(text: &str, file: &Path, area: Option<i32>) -> Vec<LevelObject> {
    let areas = find_areas(text);
    let scope = match area {
        Some(index) => match areas.iter().find(|a| a.index == index) {
            Some(a) => a.range.clone(),
            None => {
                tracing::warn!(area = index, file = %file.display(), "area not found");
                return Vec::new();
            }
        },
        None => 0..text.len(),
    };

    let mut walker = Walker {
        text,
        file,
        blocks: script_blocks(text),
        visited: HashSet::new(),
        seen: HashSet::new(),
        objects: Vec::new(),
    };
    match area {
        Some(index) => walker.walk(scope, Some(index)),
        None => {
            // Areas first so blocks they jump to inherit their index; the
            // final pass picks up whatever lives outside every area.
            for a in &areas {
                walker.visited.clear();
                walker.walk(a.range.clone(), Some(a.index));
            }
            walker.visited.clear();
            walker.walk(scope, None);
        }
    }

    let mut objects = walker.objects;
    objects.extend(
        Scanner::new(text, grammar::MARIO_POS)
            .map(|inv| mario_object(&inv, file))
            .filter(|mario| area.is_none_or(|index| mario.area_index == index)),
    );

    tracing::debug!(count = objects.len(), file = %file.display(), "parsed script objects");
    objects
}

struct Walker<'a> {
    text: &'a str,
    file: &'a Path,
    blocks: HashMap<String, Range<usize>>,
    visited: HashSet<String>,
    /// Span offsets already turned into objects.
    seen: HashSet<usize>,
    objects: Vec<LevelObject>,
}

impl Walker<'_> {
    /// Objects of `range` first, then those of every block it jumps to.
    fn walk(&mut self, range: Range<usize>, area: Option<i32>) {
        for inv in Scanner::within(self.text, range.clone(), grammar::OBJECT) {
            if !self.seen.insert(inv.offset) {
                continue;
            }
            let mut obj = normal_object(&inv, self.file);
            obj.area_index = area.unwrap_or(-1);
            self.objects.push(obj);
        }

        for jump in Scanner::within(self.text, range, grammar::JUMP_LINK) {
            let name = jump.arg(0).to_string();
            if self.visited.contains(&name) {
                continue;
            }
            let Some(body) = self.blocks.get(&name).cloned() else {
                tracing::debug!(target_block = %name, "jump target not defined in this file");
                continue;
            };
            self.visited.insert(name);
            self.walk(body, area);
        }
    }
}
