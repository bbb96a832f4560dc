use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::processor::scanner::{Grammar, grammar};

/// Behavior shown for objects coming from the special preset table.
pub const SPECIAL_BEHAVIOR: &str = "(Special Object)";
/// Behavior shown for macro objects whose preset is not in the table.
pub const UNRESOLVED_PRESET: &str = "(Unresolved Preset)";
pub const MARIO_BEHAVIOR: &str = "bhvMario";
pub const MARIO_MODEL: &str = "MODEL_MARIO";

/// True for placeholder values that must never be written into C.
pub fn is_sentinel(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || v.starts_with('(') || v.contains("ERROR")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Vec3 {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// Which macro family an object lives in; decides grammar and insertion rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    Normal,
    Macro,
    Special,
    Mario,
}

impl SourceType {
    pub fn grammar(self) -> Grammar {
        match self {
            SourceType::Normal => grammar::OBJECT,
            SourceType::Macro => grammar::MACRO_OBJECT,
            SourceType::Special => grammar::SPECIAL_OBJECT,
            SourceType::Mario => grammar::MARIO_POS,
        }
    }
}

/// Where an object's text lives: `length` bytes at `offset` in `file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub offset: usize,
    pub length: usize,
}

impl SourceLocation {
    pub fn new(file: impl Into<PathBuf>, offset: usize, length: usize) -> Self {
        Self {
            file: file.into(),
            offset,
            length,
        }
    }

    /// Target file for an object that has not been written yet.
    pub fn unsaved(file: impl Into<PathBuf>) -> Self {
        Self::new(file, 0, 0)
    }
}

/// One placed entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelObject {
    pub model_name: String,
    pub position: Vec3,
    /// Degrees; `rotation.y` is the yaw.
    pub rotation: Vec3,
    pub params: u32,
    /// Bits of `params` that come from a macro preset rather than the file.
    #[serde(default)]
    pub preset_params: u32,
    pub behavior: String,
    #[serde(default)]
    pub preset_name: Option<String>,
    pub source_type: SourceType,
    #[serde(default)]
    pub source: Option<SourceLocation>,
    #[serde(default = "no_area")]
    pub area_index: i32,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub is_new: bool,
}

fn no_area() -> i32 {
    -1
}

impl LevelObject {
    pub fn new(source_type: SourceType, model_name: impl Into<String>, behavior: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            position: Vec3::default(),
            rotation: Vec3::default(),
            params: 0,
            preset_params: 0,
            behavior: behavior.into(),
            preset_name: None,
            source_type,
            source: None,
            area_index: -1,
            is_deleted: false,
            is_new: false,
        }
    }

    /// A not-yet-persisted object that will be inserted into `file` on save.
    pub fn new_unsaved(source_type: SourceType, model_name: impl Into<String>, behavior: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            source: Some(SourceLocation::unsaved(file)),
            is_new: true,
            ..Self::new(source_type, model_name, behavior)
        }
    }

    pub fn file(&self) -> Option<&Path> {
        self.source.as_ref().map(|s| s.file.as_path())
    }

    /// Name written as the first argument of macro / special calls.
    pub fn preset_or_model(&self) -> &str {
        self.preset_name.as_deref().unwrap_or(&self.model_name)
    }

    pub fn is_persisted(&self) -> bool {
        !self.is_new && self.source.as_ref().is_some_and(|s| s.length > 0)
    }
}

/// Everything loaded for one level area.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Level {
    pub objects: Vec<LevelObject>,
    pub area: Option<i32>,
    /// Macro list referenced by the area's `MACRO_OBJECTS(...)`.
    pub macro_list: Option<String>,
    /// `LOAD_MODEL_FROM_GEO` entries of the level script: model -> geo layout.
    pub loaded_models: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_are_recognised() {
        for s in ["", "  ", SPECIAL_BEHAVIOR, UNRESOLVED_PRESET, "MODEL_ERROR_UNKNOWN"] {
            assert!(is_sentinel(s), "{s:?}");
        }
        for s in ["bhvGoomba", MARIO_BEHAVIOR, "MODEL_GOOMBA", "0x1D"] {
            assert!(!is_sentinel(s), "{s:?}");
        }
    }

    #[test]
    fn json_defaults_for_transient_fields() {
        let json = r#"{
            "model_name": "MODEL_GOOMBA",
            "position": {"x": 1, "y": 2, "z": 3},
            "rotation": {"x": 0, "y": 90, "z": 0},
            "params": 0,
            "behavior": "bhvGoomba",
            "source_type": "Normal"
        }"#;
        let obj: LevelObject = serde_json::from_str(json).unwrap();
        assert_eq!(obj.area_index, -1);
        assert!(!obj.is_new && !obj.is_deleted);
        assert!(obj.source.is_none());
        assert!(!obj.is_persisted());
    }
}
