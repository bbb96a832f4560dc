//! Turns a `LevelObject` back into macro-invocation text.
//!
//! Existing calls are rewritten argument by argument: an argument whose
//! value did not change keeps its original text, comments and all, and a
//! call with no changed argument is not rewritten at all.

use crate::error::{EditorError, Result};
use crate::model::{LevelObject, SourceType, is_sentinel};
use crate::processor::lexer::{int_or_zero, u32_or_zero};
use crate::processor::scanner::Invocation;
use crate::processor::special_parser::{byte_yaw_to_degrees, degrees_to_byte_yaw};

/// Argument list of an existing call, rebuilt in place.
struct Args<'a> {
    inv: &'a Invocation,
    out: Vec<String>,
    changed: bool,
}

impl<'a> Args<'a> {
    fn new(inv: &'a Invocation) -> Self {
        Self {
            inv,
            out: Vec::with_capacity(inv.args.len()),
            changed: false,
        }
    }

    fn raw(&self, i: usize) -> String {
        self.inv.raw_args.get(i).cloned().unwrap_or_default()
    }

    fn set(&mut self, i: usize, replacement: Option<String>) {
        match replacement {
            Some(text) => {
                self.changed = true;
                self.out.push(text);
            }
            None => {
                let raw = self.raw(i);
                self.out.push(raw);
            }
        }
    }

    /// Keeps argument `i` if present.
    fn keep(&mut self, i: usize) {
        if i < self.inv.args.len() {
            self.set(i, None);
        }
    }

    fn int(&mut self, i: usize, value: i32) {
        let changed = int_or_zero(self.inv.arg(i)) != value;
        self.set(i, changed.then(|| value.to_string()));
    }

    /// Identifiers; placeholders never replace real text.
    fn name(&mut self, i: usize, value: &str) {
        let changed = value != self.inv.arg(i) && !is_sentinel(value);
        self.set(i, changed.then(|| value.to_string()));
    }

    fn finish(self) -> Option<String> {
        self.changed
            .then(|| format!("{}({})", self.inv.name, self.out.join(", ")))
    }
}

/// New text for `inv` (name through closing parenthesis), or `None` when
/// `obj` still matches what `inv` says.
pub fn rerender(obj: &LevelObject, inv: &Invocation) -> Option<String> {
    let mut args = Args::new(inv);
    let (p, r) = (obj.position, obj.rotation);
    match obj.source_type {
        SourceType::Normal => {
            args.name(0, &obj.model_name);
            args.int(1, p.x);
            args.int(2, p.y);
            args.int(3, p.z);
            args.int(4, r.x);
            args.int(5, r.y);
            args.int(6, r.z);
            let params_changed = u32_or_zero(inv.arg(7)) != obj.params;
            args.set(7, params_changed.then(|| format_params(obj.params)));
            args.name(8, &obj.behavior);
            args.keep(9);
        }
        SourceType::Mario => {
            args.keep(0);
            args.int(1, r.y);
            args.int(2, p.x);
            args.int(3, p.y);
            args.int(4, p.z);
        }
        SourceType::Macro => {
            args.name(0, obj.preset_or_model());
            args.int(1, r.y);
            args.int(2, p.x);
            args.int(3, p.y);
            args.int(4, p.z);
            args.keep(5);
        }
        SourceType::Special => {
            args.name(0, obj.preset_or_model());
            args.int(1, p.x);
            args.int(2, p.y);
            args.int(3, p.z);
            if inv.args.len() > 4 {
                let yaw_changed = byte_yaw_to_degrees(int_or_zero(inv.arg(4))) != r.y;
                args.set(4, yaw_changed.then(|| degrees_to_byte_yaw(r.y).to_string()));
            }
            args.keep(5);
        }
    }
    args.finish()
}

/// Fields of `obj` that differ from `inv` but have no argument to go into,
/// so `rerender` cannot carry them to the file.
pub fn unwritable_changes(obj: &LevelObject, inv: &Invocation) -> Vec<&'static str> {
    let mut fields = Vec::new();
    let r = obj.rotation;
    if obj.source_type != SourceType::Normal && (r.x != 0 || r.z != 0) {
        fields.push("rotation");
    }
    let optional = |i: usize| if inv.args.len() > i { u32_or_zero(inv.arg(i)) } else { 0 };
    match obj.source_type {
        SourceType::Macro => {
            if obj.params != optional(5) | obj.preset_params {
                fields.push("params");
            }
        }
        SourceType::Special => {
            if inv.args.len() <= 4 && degrees_to_byte_yaw(r.y) != 0 {
                fields.push("yaw");
            }
            if obj.params != optional(5) {
                fields.push("params");
            }
        }
        SourceType::Normal | SourceType::Mario => {}
    }
    fields
}

/// Text for an object that has no call in the file yet.
pub fn render_new(obj: &LevelObject) -> Result<String> {
    let (p, r) = (obj.position, obj.rotation);
    let text = match obj.source_type {
        SourceType::Normal => {
            let model = real_name(obj, &obj.model_name)?;
            let behavior = real_name(obj, &obj.behavior)?;
            format!(
                "OBJECT({model}, {}, {}, {}, {}, {}, {}, {}, {behavior})",
                p.x,
                p.y,
                p.z,
                r.x,
                r.y,
                r.z,
                format_params(obj.params)
            )
        }
        SourceType::Macro => {
            let preset = real_name(obj, obj.preset_or_model())?;
            format!("MACRO_OBJECT({preset}, {}, {}, {}, {})", r.y, p.x, p.y, p.z)
        }
        SourceType::Special => {
            let preset = real_name(obj, obj.preset_or_model())?;
            match degrees_to_byte_yaw(r.y) {
                0 => format!("SPECIAL_OBJECT({preset}, {}, {}, {})", p.x, p.y, p.z),
                yaw => format!("SPECIAL_OBJECT_WITH_YAW({preset}, {}, {}, {}, {yaw})", p.x, p.y, p.z),
            }
        }
        SourceType::Mario => {
            let area = obj.area_index.max(1);
            format!("MARIO_POS({area}, {}, {}, {}, {})", r.y, p.x, p.y, p.z)
        }
    };
    Ok(text)
}

fn real_name<'a>(obj: &LevelObject, value: &'a str) -> Result<&'a str> {
    if is_sentinel(value) {
        return Err(EditorError::Placeholder {
            kind: obj.source_type,
            value: value.to_string(),
        });
    }
    Ok(value)
}

fn format_params(params: u32) -> String {
    format!("0x{params:08X}")
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::model::SPECIAL_BEHAVIOR;
    use crate::processor::scanner::{Scanner, grammar};

    fn scan(src: &str, kind: SourceType) -> Invocation {
        Scanner::new(src, kind.grammar()).next().unwrap()
    }

    #[test]
    fn unchanged_object_is_not_rendered() {
        let src = "OBJECT(/*model*/ MODEL_GOOMBA, 100, 0, 200, 0, 90, 0, BPARAM1(2), bhvGoomba),";
        let inv = scan(src, SourceType::Normal);
        let obj = crate::processor::script_parser::normal_object(&inv, Path::new("script.c"));
        assert_eq!(rerender(&obj, &inv), None);
    }

    #[test]
    fn only_changed_arguments_are_respelled() {
        let src = "OBJECT_WITH_ACTS(/*model*/ MODEL_STAR, 1, 2, 3, 0, 0, 0, BPARAM1(2), bhvStar, ACT_1 | ACT_2),";
        let inv = scan(src, SourceType::Normal);
        let mut obj = crate::processor::script_parser::normal_object(&inv, Path::new("script.c"));
        obj.position.x = -40;
        obj.rotation.y = 180;
        assert_eq!(
            rerender(&obj, &inv).unwrap(),
            "OBJECT_WITH_ACTS(/*model*/ MODEL_STAR, -40, 2, 3, 0, 180, 0, BPARAM1(2), bhvStar, ACT_1 | ACT_2)"
        );

        obj.params = 0x10;
        obj.behavior = "bhvRedCoin".into();
        assert_eq!(
            rerender(&obj, &inv).unwrap(),
            "OBJECT_WITH_ACTS(/*model*/ MODEL_STAR, -40, 2, 3, 0, 180, 0, 0x00000010, bhvRedCoin, ACT_1 | ACT_2)"
        );
    }

    #[test]
    fn placeholders_keep_the_original_text() {
        let inv = scan("SPECIAL_OBJECT(special_null_start, 1, 2, 3),", SourceType::Special);
        let mut obj = LevelObject::new(SourceType::Special, "special_null_start", SPECIAL_BEHAVIOR);
        obj.position = crate::model::Vec3::new(1, 2, 3);
        obj.preset_name = Some("(Unresolved Preset)".into());
        assert_eq!(rerender(&obj, &inv), None);
    }

    #[test]
    fn mario_keeps_its_area_argument() {
        let inv = scan("MARIO_POS(/*area*/ 0x02, 135, -6558, 1000, 6464),", SourceType::Mario);
        let mut obj = crate::processor::script_parser::mario_object(&inv, Path::new("script.c"));
        obj.position.y = 1200;
        assert_eq!(rerender(&obj, &inv).unwrap(), "MARIO_POS(/*area*/ 0x02, 135, -6558, 1200, 6464)");
    }

    #[test]
    fn special_yaw_goes_back_to_a_byte() {
        let inv = scan("SPECIAL_OBJECT_WITH_YAW_AND_PARAM(special_null_start, 1, 2, 3, 64, 0x05),", SourceType::Special);
        let mut obj = LevelObject::new(SourceType::Special, "MODEL_NONE", SPECIAL_BEHAVIOR);
        obj.preset_name = Some("special_null_start".into());
        obj.position = crate::model::Vec3::new(1, 2, 3);
        obj.rotation.y = 90;
        assert_eq!(rerender(&obj, &inv), None);

        obj.rotation.y = 180;
        assert_eq!(
            rerender(&obj, &inv).unwrap(),
            "SPECIAL_OBJECT_WITH_YAW_AND_PARAM(special_null_start, 1, 2, 3, 128, 0x05)"
        );
    }

    #[test]
    fn changes_without_an_argument_are_listed() {
        let inv = scan("SPECIAL_OBJECT(special_bubble_tree, 1, 2, 3),", SourceType::Special);
        let mut tree = LevelObject::new(SourceType::Special, "MODEL_BUBBLY_TREE", SPECIAL_BEHAVIOR);
        tree.preset_name = Some("special_bubble_tree".into());
        tree.position = crate::model::Vec3::new(1, 2, 3);
        assert!(unwritable_changes(&tree, &inv).is_empty());

        tree.rotation.y = 90;
        tree.params = 4;
        assert_eq!(unwritable_changes(&tree, &inv), vec!["yaw", "params"]);
        assert_eq!(rerender(&tree, &inv), None);

        let inv = scan("MACRO_OBJECT_WITH_BHV_PARAM(macro_box_one_up, 0, 1, 2, 3, 3),", SourceType::Macro);
        let mut coin = LevelObject::new(SourceType::Macro, "MODEL_EXCLAMATION_BOX", "bhvExclamationBox");
        coin.preset_name = Some("macro_box_one_up".into());
        coin.position = crate::model::Vec3::new(1, 2, 3);
        coin.params = 0x0B;
        coin.preset_params = 0x08;
        assert!(unwritable_changes(&coin, &inv).is_empty());

        coin.params = 0x0C;
        coin.rotation.x = 10;
        assert_eq!(unwritable_changes(&coin, &inv), vec!["rotation", "params"]);
    }

    #[test]
    fn new_objects() {
        let mut goomba = LevelObject::new(SourceType::Normal, "MODEL_GOOMBA", "bhvGoomba");
        goomba.position = crate::model::Vec3::new(100, 0, 200);
        goomba.rotation.y = 90;
        goomba.params = 1;
        assert_eq!(
            render_new(&goomba).unwrap(),
            "OBJECT(MODEL_GOOMBA, 100, 0, 200, 0, 90, 0, 0x00000001, bhvGoomba)"
        );

        let mut coin = LevelObject::new(SourceType::Macro, "MODEL_YELLOW_COIN", "bhvOneCoin");
        coin.preset_name = Some("macro_yellow_coin".into());
        coin.rotation.y = 45;
        assert_eq!(render_new(&coin).unwrap(), "MACRO_OBJECT(macro_yellow_coin, 45, 0, 0, 0)");

        let mut tree = LevelObject::new(SourceType::Special, "MODEL_BUBBLY_TREE", SPECIAL_BEHAVIOR);
        tree.preset_name = Some("special_bubble_tree".into());
        assert_eq!(render_new(&tree).unwrap(), "SPECIAL_OBJECT(special_bubble_tree, 0, 0, 0)");
        tree.rotation.y = 90;
        assert_eq!(render_new(&tree).unwrap(), "SPECIAL_OBJECT_WITH_YAW(special_bubble_tree, 0, 0, 0, 64)");

        let broken = LevelObject::new(SourceType::Normal, "MODEL_GOOMBA", SPECIAL_BEHAVIOR);
        assert!(matches!(render_new(&broken), Err(EditorError::Placeholder { .. })));
    }
}
