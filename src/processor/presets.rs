//! Macro and special preset tables.
//!
//! Macro objects and special objects do not spell out their behavior and
//! model; they name a preset row instead:
//!
//! ```c
//! /* macro_goomba_triplet_formation */ { bhvGoombaTripletSpawner, MODEL_GOOMBA, 0 },
//! { special_bubble_tree, SPTYPE_NO_YROT_OR_PARAMS, 0x00, MODEL_BUBBLY_TREE, ... },
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::lexer::parse_int;
use super::read_source;

static MACRO_PRESET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/\*\s*([A-Za-z0-9_]+)\s*\*/\s*\{\s*([^,{}]+?)\s*,\s*([^,{}]+?)\s*,\s*([^{}]+?)\s*\}")
        .unwrap()
});

static SPECIAL_PRESET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\s*([A-Za-z0-9_]+)\s*,\s*[A-Za-z0-9_]+\s*,\s*(?:0[xX][0-9A-Fa-f]+|\d+)\s*,\s*([A-Za-z0-9_]+)")
        .unwrap()
});

static ALIAS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*([A-Za-z0-9_]+)\s*=\s*([A-Za-z0-9_]+)").unwrap());

/// One row of the macro preset table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroPreset {
    pub behavior: String,
    pub model: String,
    /// The parameter exactly as written, e.g. `0` or `BPARAM2(3) | 0x10`.
    pub param: String,
}

impl MacroPreset {
    /// Numeric parameter when the text is a literal, or an OR of literals.
    pub fn param_value(&self) -> Option<u32> {
        self.param
            .split('|')
            .map(|term| parse_int(term).map(|v| v as u32))
            .try_fold(0u32, |acc, term| term.map(|t| acc | t))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MacroPresets {
    entries: HashMap<String, MacroPreset>,
}

impl MacroPresets {
    pub fn parse(text: &str) -> Self {
        let entries = MACRO_PRESET_RE
            .captures_iter(text)
            .map(|c| {
                let preset = MacroPreset {
                    behavior: c[2].trim().to_string(),
                    model: c[3].trim().to_string(),
                    param: c[4].trim().to_string(),
                };
                (c[1].to_string(), preset)
            })
            .collect();
        Self { entries }
    }

    /// Missing file reads as an empty table.
    pub fn load(path: &Path) -> Self {
        let presets = read_source(path).map(|t| Self::parse(&t)).unwrap_or_default();
        tracing::info!(count = presets.len(), path = %path.display(), "macro presets");
        presets
    }

    pub fn get(&self, name: &str) -> Option<&MacroPreset> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Special preset name -> model reference (a model name or numeric id).
#[derive(Debug, Clone, Default)]
pub struct SpecialPresets {
    models: HashMap<String, String>,
}

impl SpecialPresets {
    pub fn parse(text: &str) -> Self {
        let mut models = HashMap::new();
        for c in SPECIAL_PRESET_RE.captures_iter(text) {
            models.entry(c[1].to_string()).or_insert_with(|| c[2].to_string());
        }
        Self { models }
    }

    /// Adds `alias = target` lines whose target is already known. Single
    /// pass: an alias of an alias defined later in the file is not chased.
    pub fn merge_aliases(&mut self, header: &str) {
        for c in ALIAS_RE.captures_iter(header) {
            let (alias, target) = (&c[1], &c[2]);
            if self.models.contains_key(alias) {
                continue;
            }
            if let Some(model) = self.models.get(target).cloned() {
                self.models.insert(alias.to_string(), model);
            }
        }
    }

    /// Loads the table and, if present, its companion header of aliases.
    pub fn load(path: &Path) -> Self {
        let mut presets = read_source(path).map(|t| Self::parse(&t)).unwrap_or_default();
        if let Some(header) = companion_header(path).as_deref().and_then(read_source) {
            presets.merge_aliases(&header);
        }
        tracing::info!(count = presets.len(), path = %path.display(), "special presets");
        presets
    }

    pub fn model(&self, preset: &str) -> Option<&str> {
        self.models.get(preset).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.keys().cloned().collect();
        names.sort();
        names
    }
}

/// `special_presets.inc.c` -> `special_presets.h`.
fn companion_header(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    let candidate = match name.strip_suffix(".inc.c") {
        Some(stem) => path.with_file_name(format!("{stem}.h")),
        None => path.with_extension("h"),
    };
    candidate.is_file().then_some(candidate)
}
