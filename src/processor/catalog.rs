//! Name lists offered to the user when picking a behavior or a model.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use walkdir::WalkDir;

use super::model_ids::parse_loaded_models;
use super::read_source;
use crate::config::EditorConfig;
use crate::model::MARIO_MODEL;

static BEHAVIOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(bhv\w+)\b").unwrap());

static MODEL_DEFINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#[ \t]*define[ \t]+(MODEL_[A-Z0-9_]+)").unwrap());

static GEO_LAYOUT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b([A-Za-z0-9_]+)_geo\b").unwrap());

/// `#include "goomba/model.inc.c"` in a bin source names the actor folder `goomba`.
static ACTOR_INCLUDE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"#\s*include\s+"([^/"]+)/"#).unwrap());

/// The part of a level's `level.yaml` that says which actor bins it loads.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LevelManifest {
    pub actor_bins: Vec<String>,
    pub common_bin: Vec<String>,
}

impl LevelManifest {
    pub fn parse(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    fn bins(&self) -> impl Iterator<Item = &str> {
        self.actor_bins.iter().chain(&self.common_bin).map(String::as_str)
    }
}

/// Offered when no `model_ids.h` can be found.
const FALLBACK_MODELS: [&str; 4] = ["MODEL_BOBOMB", "MODEL_GOOMBA", "MODEL_MARIO", "MODEL_NONE"];

/// Every `bhv*` identifier mentioned in the project's headers, sorted.
pub fn resolve_behaviors(project_root: &Path, config: &EditorConfig) -> Vec<String> {
    let Some(include) = config.include_dir(project_root) else {
        tracing::warn!(root = %project_root.display(), "no include directory found");
        return Vec::new();
    };

    let mut behaviors = BTreeSet::new();
    let headers = WalkDir::new(&include)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.file_name()
                .to_str()
                .is_some_and(|n| n.ends_with(".h") || n.ends_with(".inc.c"))
        });
    for entry in headers {
        if let Some(text) = read_source(entry.path()) {
            behaviors.extend(
                BEHAVIOR_RE
                    .captures_iter(&text)
                    .map(|c| c[1].to_string())
                    .filter(|b| b.len() > 3),
            );
        }
    }

    tracing::info!(count = behaviors.len(), include = %include.display(), "scanned behaviors");
    behaviors.into_iter().collect()
}

/// Every `MODEL_*` define of the project's `model_ids.h` files, sorted.
pub fn resolve_models(project_root: &Path, config: &EditorConfig) -> Vec<String> {
    let mut models = BTreeSet::new();
    for sub in &config.include_dirs {
        let path = project_root.join(sub).join(&config.model_ids_file);
        if !path.is_file() {
            continue;
        }
        if let Some(text) = read_source(&path) {
            models.extend(MODEL_DEFINE_RE.captures_iter(&text).map(|c| c[1].to_string()));
        }
    }

    if models.is_empty() {
        tracing::warn!(root = %project_root.display(), "no model ids found, using defaults");
        models.extend(FALLBACK_MODELS.iter().map(|m| m.to_string()));
    }
    models.into_iter().collect()
}

/// Models a level can place: the ones its script loads, the actors of the
/// bins its `level.yaml` lists, and Mario. Sorted.
pub fn resolve_level_models(level_dir: &Path, project_root: &Path, config: &EditorConfig) -> Vec<String> {
    let mut models: BTreeSet<String> = read_source(&level_dir.join(&config.script_file))
        .map(|script| parse_loaded_models(&script).into_keys().collect())
        .unwrap_or_default();
    models.insert(MARIO_MODEL.to_string());

    let Some(actors) = config.actors_dir(project_root) else {
        tracing::warn!(root = %project_root.display(), "no actors directory found");
        return models.into_iter().collect();
    };

    let manifest_path = level_dir.join(&config.level_yaml_file);
    let manifest = match read_source(&manifest_path).map(|yaml| LevelManifest::parse(&yaml)) {
        Some(Ok(manifest)) => manifest,
        Some(Err(e)) => {
            tracing::warn!(path = %manifest_path.display(), error = %e, "invalid level manifest");
            LevelManifest::default()
        }
        None => LevelManifest::default(),
    };

    for bin in manifest.bins() {
        if let Some(header) = read_source(&actors.join(format!("{bin}.h"))) {
            models.extend(geo_models(&header));
        }

        let folders = read_source(&actors.join(format!("{bin}.c")))
            .map(|source| {
                ACTOR_INCLUDE_RE
                    .captures_iter(&source)
                    .map(|c| c[1].to_string())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        for folder in folders.iter().map(String::as_str).chain([bin]) {
            let dir = actors.join(folder);
            if dir.is_dir() {
                models.insert(format!("MODEL_{}", folder.to_uppercase()));
                models.extend(actor_headers(&dir).flat_map(|text| geo_models(&text)));
            }
        }
    }

    tracing::info!(count = models.len(), level = %level_dir.display(), "resolved level models");
    models.into_iter().collect()
}

/// `bobomb_geo` -> `MODEL_BOBOMB` for every geo layout a header names.
fn geo_models(header: &str) -> Vec<String> {
    GEO_LAYOUT_RE
        .captures_iter(header)
        .map(|c| format!("MODEL_{}", c[1].to_uppercase()))
        .collect()
}

/// Texts of the `.h` files directly inside an actor folder.
fn actor_headers(dir: &Path) -> impl Iterator<Item = String> {
    WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.path().extension().is_some_and(|x| x == "h"))
        .filter_map(|e| read_source(e.path()))
}
