//! Parser for `macro.inc.c` object lists.
//!
//! ```c
//! const MacroObject bob_seg7_macro_objs[] = {
//!     MACRO_OBJECT(macro_goomba_triplet_formation, 45, 500, 0, -300),
//!     MACRO_OBJECT_WITH_BHV_PARAM(macro_box_one_up, 0, 1200, 900, 40, 3),
//!     MACRO_OBJECT_END(),
//! };
//! ```

use std::path::Path;

use super::lexer::{int_or_zero, u32_or_zero};
use super::presets::MacroPresets;
use super::read_source;
use super::scanner::{Invocation, grammar, scan_all};
use crate::model::{LevelObject, SourceLocation, SourceType, UNRESOLVED_PRESET, Vec3};

pub fn parse_macro_file(file: &Path, presets: &MacroPresets) -> Vec<LevelObject> {
    match read_source(file) {
        Some(text) => parse_macro_text(&text, file, presets),
        None => Vec::new(),
    }
}

pub fn parse_macro_text(text: &str, file: &Path, presets: &MacroPresets) -> Vec<LevelObject> {
    let objects: Vec<LevelObject> = scan_all(text, &[grammar::MACRO_OBJECT])
        .iter()
        .map(|inv| macro_object(inv, file, presets))
        .collect();
    tracing::debug!(count = objects.len(), file = %file.display(), "parsed macro objects");
    objects
}

/// `MACRO_OBJECT[_WITH_BHV_PARAM](preset, yaw, x, y, z[, param])`.
pub fn macro_object(inv: &Invocation, file: &Path, presets: &MacroPresets) -> LevelObject {
    let preset_name = inv.arg(0);
    let bhv_param = if inv.args.len() > 5 { u32_or_zero(inv.arg(5)) } else { 0 };

    let (model, behavior, preset_param) = match presets.get(preset_name) {
        Some(preset) => (
            preset.model.as_str(),
            preset.behavior.as_str(),
            preset.param_value().unwrap_or(0),
        ),
        None => {
            tracing::debug!(preset = preset_name, "macro preset not found");
            (preset_name, UNRESOLVED_PRESET, 0)
        }
    };

    LevelObject {
        position: Vec3::new(int_or_zero(inv.arg(2)), int_or_zero(inv.arg(3)), int_or_zero(inv.arg(4))),
        rotation: Vec3::new(0, int_or_zero(inv.arg(1)), 0),
        params: bhv_param | preset_param,
        preset_params: preset_param,
        preset_name: Some(preset_name.to_string()),
        source: Some(SourceLocation::new(file, inv.offset, inv.len)),
        ..LevelObject::new(SourceType::Macro, model, behavior)
    }
}
