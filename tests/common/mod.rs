#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub const BUDDY: &str = "OBJECT(/*model*/ MODEL_BOBOMB_BUDDY, /*pos*/ -5723, 140, 6017, /*angle*/ 0, 0, 0, /*behParam*/ 0x00000000, /*beh*/ bhvBobombBuddy),";

pub const SCRIPT: &str = r#"#include <ultra64.h>
#include "levels/bob/header.h"

static const LevelScript script_func_local_1[] = {
    OBJECT(/*model*/ MODEL_BOBOMB_BUDDY, /*pos*/ -5723, 140, 6017, /*angle*/ 0, 0, 0, /*behParam*/ 0x00000000, /*beh*/ bhvBobombBuddy),
    OBJECT(MODEL_NONE, 1000, 2000, 3000, 0, 0, 0, BPARAM1(2), bhvCoinFormation),
    RETURN(),
};

const LevelScript level_bob_entry[] = {
    INIT_LEVEL(),
    LOAD_MODEL_FROM_GEO(MODEL_BOB_BUBBLY_TREE, bubbly_tree_geo),
    AREA(/*index*/ 1, bob_geo_000488),
        OBJECT(MODEL_GOOMBA, 100, 0, 200, 0, 90, 0, 0x00000001, bhvGoomba),
        // OBJECT(MODEL_GOOMBA, 0, 0, 0, 0, 0, 0, 0x00000000, bhvGoomba),
        JUMP_LINK(script_func_local_1),
        MACRO_OBJECTS(/*objList*/ bob_seg7_macro_objs),
    END_AREA(),
    FREE_LEVEL_POOL(),
    MARIO_POS(/*area*/ 1, /*yaw*/ 135, /*pos*/ -6558, 1000, 6464),
    EXIT(),
};
"#;

pub const MACROS: &str = "\
// 0x0E000000
const MacroObject bob_seg7_macro_objs[] = {
    MACRO_OBJECT(/*preset*/ macro_goomba_triplet_formation, /*yaw*/ 45, /*pos*/ 500, 0, -300),
    MACRO_OBJECT_WITH_BHV_PARAM(macro_box_one_up, 0, 1200, 900, 40, 3),
    MACRO_OBJECT_END(),
};
";

pub const COLLISION: &str = "\
const Collision bob_seg7_collision_level[] = {
    COL_INIT(),
    COL_VERTEX_INIT(0x3),
    COL_VERTEX(0, 0, 0),
    COL_TRI_STOP(),
    COL_SPECIAL_INIT(2),
    SPECIAL_OBJECT_WITH_YAW(/*preset*/ special_booming_volcano_owner, /*pos*/ -1000, 800, 200, /*yaw*/ 64),
    SPECIAL_OBJECT(special_bubble_tree, 10, 20, 30),
    COL_END(),
};
";

const MACRO_PRESETS: &str = "\
struct MacroPreset MacroObjectPresets[] = {
    /* macro_goomba_triplet_formation */ { bhvGoombaTripletSpawner, MODEL_GOOMBA, 0 },
    /* macro_box_one_up */ { bhvExclamationBox, MODEL_EXCLAMATION_BOX, 0x08 },
};
";

const SPECIAL_PRESETS: &str = "\
static struct SpecialPreset SpecialObjectPresets[] = {
    { special_bubble_tree, SPTYPE_NO_YROT_OR_PARAMS, 0x00, MODEL_BUBBLY_TREE, bhvTree },
    { special_null_start, SPTYPE_YROT_NO_PARAMS, 0x00, 0, NULL },
};
";

const MODEL_IDS: &str = "\
#define MODEL_NONE            0x00
#define MODEL_GOOMBA          0xC0
#define MODEL_BOB_BUBBLY_TREE 0x17
#define MODEL_BUBBLY_TREE     MODEL_BOB_BUBBLY_TREE
";

const BEHAVIORS: &str = "\
extern const BehaviorScript bhvGoomba[];
extern const BehaviorScript bhvBobombBuddy[];
extern const BehaviorScript bhvTree[];
";

/// A minimal decomp tree with one level, `bob`, that has a single area.
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let project = Self { dir };
        project.write("include/macro_presets.inc.c", MACRO_PRESETS);
        project.write("include/special_presets.inc.c", SPECIAL_PRESETS);
        project.write("include/model_ids.h", MODEL_IDS);
        project.write("include/behavior_data.h", BEHAVIORS);
        project.write("levels/bob/script.c", SCRIPT);
        project.write("levels/bob/areas/1/macro.inc.c", MACROS);
        project.write("levels/bob/areas/1/collision.inc.c", COLLISION);
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn level_dir(&self) -> PathBuf {
        self.root().join("levels/bob")
    }

    pub fn script(&self) -> PathBuf {
        self.level_dir().join("script.c")
    }

    pub fn macros(&self) -> PathBuf {
        self.level_dir().join("areas/1/macro.inc.c")
    }

    pub fn collision(&self) -> PathBuf {
        self.level_dir().join("areas/1/collision.inc.c")
    }

    pub fn write(&self, rel: &str, text: &str) {
        let path = self.root().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    pub fn read(&self, path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }
}
