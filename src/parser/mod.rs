//! Loading: a level directory in, the objects of one area (or all areas) out.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::config::EditorConfig;
use crate::model::{Level, LevelObject};
use crate::processor::macro_parser::parse_macro_file;
use crate::processor::model_ids::{ModelIds, ModelTable, parse_loaded_models};
use crate::processor::presets::{MacroPresets, SpecialPresets};
use crate::processor::read_source;
use crate::processor::script_parser::{find_areas, macro_list_name, parse_script_text};
use crate::processor::special_parser::parse_special_file;

/// Objects previously dumped as JSON, e.g. edited by another tool.
pub fn load_from_json(json: &str) -> Result<Vec<LevelObject>> {
    let objects: Vec<LevelObject> = serde_json::from_str(json).context("expected a JSON array of level objects")?;
    tracing::debug!(count = objects.len(), "objects parsed from JSON");
    Ok(objects)
}

/// Everything placed in `level_dir`: the script's objects plus the macro
/// and special objects of each requested area.
///
/// Headers (presets, model ids) are looked up upwards from the level, then
/// under `project_root`. Missing files just contribute nothing.
pub fn load_level(level_dir: &Path, area: Option<i32>, project_root: Option<&Path>, config: &EditorConfig) -> Level {
    let script_path = level_dir.join(&config.script_file);
    let script = read_source(&script_path).unwrap_or_default();

    let mut objects = parse_script_text(&script, &script_path, area);
    let loaded_models = parse_loaded_models(&script);

    let header = |name: &str| config.find_include(level_dir, project_root, name);
    let macro_presets = header(&config.macro_presets_file)
        .map(|p| MacroPresets::load(&p))
        .unwrap_or_default();
    let special_presets = header(&config.special_presets_file)
        .map(|p| SpecialPresets::load(&p))
        .unwrap_or_default();
    let model_ids = header(&config.model_ids_file)
        .map(|p| ModelIds::load(&p))
        .unwrap_or_default();
    let models = ModelTable::new(model_ids, loaded_models.clone());

    let areas: Vec<i32> = match area {
        Some(index) => vec![index],
        None => find_areas(&script).into_iter().map(|a| a.index).collect(),
    };
    for index in areas {
        let list = macro_list_name(&script, Some(index));
        let macro_path = list
            .as_deref()
            .and_then(|name| find_macro_file(level_dir, &config.macro_file, name))
            .unwrap_or_else(|| config.area_file(level_dir, index, &config.macro_file));
        let collision_path = config.area_file(level_dir, index, &config.collision_file);

        let extras = parse_macro_file(&macro_path, &macro_presets)
            .into_iter()
            .chain(parse_special_file(&collision_path, &special_presets, &models));
        objects.extend(extras.map(|obj| LevelObject {
            area_index: index,
            ..obj
        }));
    }

    tracing::info!(
        level = %level_dir.display(),
        area = ?area,
        objects = objects.len(),
        "level loaded"
    );

    Level {
        objects,
        area,
        macro_list: macro_list_name(&script, area),
        loaded_models,
    }
}

/// The macro file under `level_dir` that defines the list `name`.
fn find_macro_file(level_dir: &Path, file_name: &str, name: &str) -> Option<PathBuf> {
    WalkDir::new(level_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name().to_str() == Some(file_name))
        .find(|e| read_source(e.path()).is_some_and(|text| defines_list(&text, name)))
        .map(|e| e.into_path())
}

fn defines_list(text: &str, name: &str) -> bool {
    text.match_indices(name).any(|(at, _)| {
        let before = text[..at].chars().next_back();
        let after = text[at + name.len()..].trim_start();
        !before.is_some_and(|c| c.is_alphanumeric() || c == '_') && after.starts_with('[')
    })
}
