//! Parser for the special objects of `collision.inc.c`.
//!
//! Special objects sit between `COL_SPECIAL_INIT(n)` and `COL_END()` and
//! store their yaw as a byte (`0..=255` for a full turn).

use std::path::Path;

use super::lexer::{int_or_zero, u32_or_zero};
use super::model_ids::ModelTable;
use super::presets::SpecialPresets;
use super::read_source;
use super::scanner::{Invocation, grammar, scan_all};
use crate::model::{LevelObject, SPECIAL_BEHAVIOR, SourceLocation, SourceType, Vec3};

/// Byte yaw to degrees, truncating: `64 -> 90`, `1 -> 1`.
///
/// The yaw field is a `u8`, so out-of-range values wrap first the way the
/// compiler stores them.
pub fn byte_yaw_to_degrees(byte: i32) -> i32 {
    byte.rem_euclid(256) * 360 / 256
}

/// Degrees to the nearest byte yaw, wrapping a full turn to zero.
pub fn degrees_to_byte_yaw(degrees: i32) -> i32 {
    let norm = degrees.rem_euclid(360);
    (f64::from(norm) * 256.0 / 360.0).round() as i32 % 256
}

pub fn parse_special_file(file: &Path, presets: &SpecialPresets, models: &ModelTable) -> Vec<LevelObject> {
    match read_source(file) {
        Some(text) => parse_special_text(&text, file, presets, models),
        None => Vec::new(),
    }
}

pub fn parse_special_text(text: &str, file: &Path, presets: &SpecialPresets, models: &ModelTable) -> Vec<LevelObject> {
    let objects: Vec<LevelObject> = scan_all(text, &[grammar::SPECIAL_OBJECT])
        .iter()
        .map(|inv| special_object(inv, file, presets, models))
        .collect();
    tracing::debug!(count = objects.len(), file = %file.display(), "parsed special objects");
    objects
}

/// `SPECIAL_OBJECT[_WITH_YAW[_AND_PARAM]](preset, x, y, z[, yaw][, param])`.
pub fn special_object(inv: &Invocation, file: &Path, presets: &SpecialPresets, models: &ModelTable) -> LevelObject {
    let preset_name = inv.arg(0);
    let model = match presets.model(preset_name) {
        Some(reference) => models.resolve(reference),
        None => {
            tracing::debug!(preset = preset_name, "special preset not found");
            preset_name.to_string()
        }
    };
    let yaw = if inv.args.len() > 4 { byte_yaw_to_degrees(int_or_zero(inv.arg(4))) } else { 0 };
    let params = if inv.args.len() > 5 { u32_or_zero(inv.arg(5)) } else { 0 };

    LevelObject {
        position: Vec3::new(int_or_zero(inv.arg(1)), int_or_zero(inv.arg(2)), int_or_zero(inv.arg(3))),
        rotation: Vec3::new(0, yaw, 0),
        params,
        preset_name: Some(preset_name.to_string()),
        source: Some(SourceLocation::new(file, inv.offset, inv.len)),
        ..LevelObject::new(SourceType::Special, model, SPECIAL_BEHAVIOR)
    }
}
