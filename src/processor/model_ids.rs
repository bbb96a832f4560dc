//! Model identifiers.
//!
//! `model_ids.h` maps names to numbers, sometimes through other names:
//!
//! ```c
//! #define MODEL_BOB_BUBBLY_TREE      0x17
//! #define MODEL_BUBBLY_TREE          MODEL_BOB_BUBBLY_TREE
//! ```
//!
//! A level script then binds numbers to geo layouts with
//! `LOAD_MODEL_FROM_GEO(MODEL_BOB_BUBBLY_TREE, bubbly_tree_geo)`. Special
//! presets may refer to a model by either spelling, so resolution goes
//! name or number -> id -> the model name the level actually loads.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::lexer::parse_int;
use super::read_source;
use super::scanner::{Scanner, grammar};

static DEFINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*#[ \t]*define[ \t]+([A-Za-z0-9_]+)[ \t]+(0[xX][0-9A-Fa-f]+|\d+|[A-Za-z_][A-Za-z0-9_]*)")
        .unwrap()
});

/// Fully resolved `#define NAME VALUE` table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelIds {
    ids: HashMap<String, i64>,
}

impl ModelIds {
    pub fn parse(text: &str) -> Self {
        let defines: Vec<(&str, &str)> = DEFINE_RE
            .captures_iter(text)
            .filter_map(|c| Some((c.get(1)?.as_str(), c.get(2)?.as_str())))
            .collect();

        let mut ids: HashMap<String, i64> = HashMap::new();
        for (name, value) in &defines {
            if let Some(v) = parse_int(value) {
                ids.entry(name.to_string()).or_insert(v);
            }
        }

        // Alias chains settle after at most one pass per link; a pass that
        // resolves nothing means the rest never reaches a literal.
        loop {
            let mut changed = false;
            for (name, value) in &defines {
                if ids.contains_key(*name) {
                    continue;
                }
                if let Some(&v) = ids.get(*value) {
                    ids.insert(name.to_string(), v);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        Self { ids }
    }

    pub fn load(path: &Path) -> Self {
        let ids = read_source(path).map(|t| Self::parse(&t)).unwrap_or_default();
        tracing::info!(count = ids.len(), path = %path.display(), "model ids");
        ids
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.ids.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// `LOAD_MODEL_FROM_GEO(model, geo)` entries of a level script.
pub fn parse_loaded_models(script: &str) -> BTreeMap<String, String> {
    Scanner::new(script, grammar::LOAD_MODEL_FROM_GEO)
        .map(|inv| (inv.arg(0).to_string(), inv.arg(1).to_string()))
        .collect()
}

/// Model ids combined with the models a level loads.
#[derive(Debug, Clone, Default)]
pub struct ModelTable {
    ids: ModelIds,
    loaded: BTreeMap<String, String>,
}

impl ModelTable {
    pub fn new(ids: ModelIds, loaded: BTreeMap<String, String>) -> Self {
        Self { ids, loaded }
    }

    fn id_of(&self, reference: &str) -> Option<i64> {
        parse_int(reference).or_else(|| self.ids.get(reference))
    }

    /// Loaded model name a reference stands for, or the reference itself.
    pub fn resolve(&self, reference: &str) -> String {
        if self.loaded.contains_key(reference) {
            return reference.to_string();
        }
        let Some(id) = self.id_of(reference) else {
            return reference.to_string();
        };
        self.loaded
            .keys()
            .find(|model| self.ids.get(model) == Some(id))
            .cloned()
            .unwrap_or_else(|| reference.to_string())
    }

    /// Geo layout that renders a model name or numeric id.
    pub fn geo_layout(&self, reference: &str) -> Option<&str> {
        self.loaded
            .get(reference)
            .or_else(|| self.loaded.get(&self.resolve(reference)))
            .map(String::as_str)
    }
}
