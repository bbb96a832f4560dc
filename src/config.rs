//! Project layout settings.
//!
//! Defaults follow the usual decomp tree (`levels/<name>/script.c`,
//! `levels/<name>/areas/<n>/{macro,collision}.inc.c`, `include/*.h`) and
//! can be overridden from a JSON file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{EditorError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Directories, relative to a level or the project root, searched for headers.
    pub include_dirs: Vec<String>,
    pub script_file: String,
    pub macro_file: String,
    pub collision_file: String,
    pub macro_presets_file: String,
    pub special_presets_file: String,
    pub model_ids_file: String,
    /// Directories, relative to the project root, holding the actor bins.
    pub actor_dirs: Vec<String>,
    pub level_yaml_file: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            include_dirs: vec![
                "include".into(),
                "howtomake/include".into(),
                "leveleditor/include".into(),
                "levels/include".into(),
            ],
            script_file: "script.c".into(),
            macro_file: "macro.inc.c".into(),
            collision_file: "collision.inc.c".into(),
            macro_presets_file: "macro_presets.inc.c".into(),
            special_presets_file: "special_presets.inc.c".into(),
            model_ids_file: "model_ids.h".into(),
            actor_dirs: vec!["actors".into(), "leveleditor/actors".into()],
            level_yaml_file: "level.yaml".into(),
        }
    }
}

impl EditorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| EditorError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| EditorError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Collision files carry the `COL_SPECIAL_INIT(n)` counter.
    pub fn is_collision_file(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n == self.collision_file)
    }

    /// `levels/<name>/areas/<n>/<file>`.
    pub fn area_file(&self, level_dir: &Path, area: i32, file: &str) -> PathBuf {
        level_dir.join("areas").join(area.to_string()).join(file)
    }

    /// Finds a header by walking up from `start`, then under `project_root`.
    pub fn find_include(&self, start: &Path, project_root: Option<&Path>, file_name: &str) -> Option<PathBuf> {
        let upward = start.ancestors().flat_map(|dir| self.include_candidates(dir, file_name));
        let from_root = project_root
            .into_iter()
            .flat_map(|root| self.include_candidates(root, file_name));
        upward.chain(from_root).find(|p| p.is_file())
    }

    fn include_candidates<'a>(&'a self, dir: &'a Path, file_name: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
        self.include_dirs
            .iter()
            .map(move |sub| join_relative(dir, sub).join(file_name))
    }

    /// The project's include directory, falling back to the first directory
    /// named `include` anywhere below the root.
    pub fn include_dir(&self, project_root: &Path) -> Option<PathBuf> {
        self.include_dirs
            .iter()
            .map(|sub| join_relative(project_root, sub))
            .find(|p| p.is_dir())
            .or_else(|| {
                WalkDir::new(project_root)
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .find(|e| e.file_type().is_dir() && e.file_name() == "include")
                    .map(|e| e.into_path())
            })
    }

    /// First existing actors directory under `project_root`.
    pub fn actors_dir(&self, project_root: &Path) -> Option<PathBuf> {
        self.actor_dirs
            .iter()
            .map(|sub| join_relative(project_root, sub))
            .find(|p| p.is_dir())
    }

    /// The level script belonging to an area file: same directory, one up, or
    /// two up (`levels/bob/areas/1/macro.inc.c` -> `levels/bob/script.c`).
    pub fn script_for(&self, file: &Path) -> Option<PathBuf> {
        let dir = file.parent()?;
        dir.ancestors()
            .take(3)
            .map(|d| d.join(&self.script_file))
            .find(|p| p.is_file())
    }
}

fn join_relative(base: &Path, sub: &str) -> PathBuf {
    let mut path = base.to_path_buf();
    for part in sub.split(['/', '\\']) {
        if !part.is_empty() {
            path.push(part);
        }
    }
    path
}
