mod common;

use std::fs;

use common::{BUDDY, COLLISION, MACROS, Project, SCRIPT};
use levelscript_editor::config::EditorConfig;
use levelscript_editor::model::{LevelObject, SPECIAL_BEHAVIOR, SourceType, Vec3};
use levelscript_editor::parser::load_level;
use levelscript_editor::session::EditSession;
use levelscript_editor::writer::patch::save;

fn open(project: &Project) -> EditSession {
    let config = EditorConfig::default();
    let level = load_level(&project.level_dir(), Some(1), Some(project.root()), &config);
    EditSession::from_level(level, &project.level_dir(), config)
}

fn index_of(session: &EditSession, model: &str) -> usize {
    session
        .objects()
        .iter()
        .position(|o| o.model_name == model && !o.is_deleted)
        .unwrap()
}

#[test]
fn saving_without_edits_changes_nothing() {
    let project = Project::new();
    let mut session = open(&project);

    let report = session.save();
    assert!(report.is_complete());
    assert!(report.saved.is_empty());
    assert_eq!(project.read(&project.script()), SCRIPT);
    assert_eq!(project.read(&project.macros()), MACROS);
    assert_eq!(project.read(&project.collision()), COLLISION);
}

#[test]
fn an_edit_only_touches_its_own_call() {
    let project = Project::new();
    let mut session = open(&project);

    let goomba = index_of(&session, "MODEL_GOOMBA");
    session.move_to(goomba, Vec3::new(150, 0, 200)).unwrap();
    let report = session.save();
    assert!(report.is_complete());
    assert_eq!(report.saved, vec![project.script()]);

    let expected = SCRIPT.replacen("OBJECT(MODEL_GOOMBA, 100, 0, 200,", "OBJECT(MODEL_GOOMBA, 150, 0, 200,", 1);
    assert_eq!(project.read(&project.script()), expected);

    let reloaded = open(&project);
    let goomba = &reloaded.objects()[index_of(&reloaded, "MODEL_GOOMBA")];
    assert_eq!(goomba.position, Vec3::new(150, 0, 200));
    assert_eq!(goomba.rotation.y, 90);
    assert_eq!(goomba.params, 1);
}

#[test]
fn unchanged_arguments_keep_their_spelling() {
    let project = Project::new();
    let mut session = open(&project);

    let coin = index_of(&session, "MODEL_NONE");
    session.rotate(coin, Vec3::new(0, 45, 0)).unwrap();
    let mario = session
        .objects()
        .iter()
        .position(|o| o.source_type == SourceType::Mario)
        .unwrap();
    session.move_to(mario, Vec3::new(-6000, 1000, 6464)).unwrap();
    assert!(session.save().is_complete());

    let text = project.read(&project.script());
    assert!(text.contains("OBJECT(MODEL_NONE, 1000, 2000, 3000, 0, 45, 0, BPARAM1(2), bhvCoinFormation),"));
    assert!(text.contains("MARIO_POS(/*area*/ 1, /*yaw*/ 135, -6000, 1000, 6464),"));
    assert!(text.contains(BUDDY));
}

#[test]
fn deleting_removes_exactly_one_span() {
    let project = Project::new();
    let mut session = open(&project);
    let before = session.len();

    let buddy = index_of(&session, "MODEL_BOBOMB_BUDDY");
    session.delete(buddy).unwrap();
    assert!(session.save().is_complete());
    assert_eq!(session.len(), before - 1);

    let expected = SCRIPT.replacen(&format!("{BUDDY}\n    "), "", 1);
    assert_eq!(project.read(&project.script()), expected);
    assert_eq!(open(&project).len(), before - 1);
}

#[test]
fn spans_stay_valid_across_saves() {
    let project = Project::new();
    let mut session = open(&project);

    let buddy = index_of(&session, "MODEL_BOBOMB_BUDDY");
    session.delete(buddy).unwrap();
    let goomba = index_of(&session, "MODEL_GOOMBA");
    session.set_model(goomba, "MODEL_BOBOMB").unwrap();
    assert!(session.save().is_complete());

    // Both the deletion above and this rename shift everything after them.
    let coin = index_of(&session, "MODEL_NONE");
    session.set_model(coin, "MODEL_YELLOW_COIN").unwrap();
    let bobomb = index_of(&session, "MODEL_BOBOMB");
    session.move_to(bobomb, Vec3::new(1, 2, 3)).unwrap();
    let report = session.save();
    assert!(report.is_complete(), "{:?}", report.failed);

    let text = project.read(&project.script());
    assert!(text.contains("OBJECT(MODEL_YELLOW_COIN, 1000, 2000, 3000, 0, 0, 0, BPARAM1(2), bhvCoinFormation),"));
    assert!(text.contains("OBJECT(MODEL_BOBOMB, 1, 2, 3, 0, 90, 0, 0x00000001, bhvGoomba),"));
    assert!(!text.contains("MODEL_BOBOMB_BUDDY"));

    for obj in session.objects() {
        let loc = obj.source.as_ref().unwrap();
        let file = fs::read_to_string(&loc.file).unwrap();
        let call = &file[loc.offset..loc.offset + loc.length];
        assert!(call.starts_with(match obj.source_type {
            SourceType::Normal => "OBJECT",
            SourceType::Macro => "MACRO_OBJECT",
            SourceType::Special => "SPECIAL_OBJECT",
            SourceType::Mario => "MARIO_POS",
        }));
    }
}

#[test]
fn new_objects_land_in_their_lists() {
    let project = Project::new();
    let mut session = open(&project);
    let before = session.len();

    session
        .create(LevelObject {
            position: Vec3::new(1, 2, 3),
            area_index: 1,
            ..LevelObject::new(SourceType::Normal, "MODEL_GOOMBA", "bhvGoomba")
        })
        .unwrap();
    session
        .create(LevelObject {
            position: Vec3::new(7, 8, 9),
            rotation: Vec3::new(0, 90, 0),
            area_index: 1,
            preset_name: Some("macro_goomba_triplet_formation".into()),
            ..LevelObject::new(SourceType::Macro, "MODEL_GOOMBA", "bhvGoombaTripletSpawner")
        })
        .unwrap();
    session
        .create(LevelObject {
            position: Vec3::new(11, 12, 13),
            area_index: 1,
            preset_name: Some("special_bubble_tree".into()),
            ..LevelObject::new(SourceType::Special, "MODEL_BOB_BUBBLY_TREE", SPECIAL_BEHAVIOR)
        })
        .unwrap();

    let report = session.save();
    assert!(report.is_complete(), "{:?}", report.failed);
    assert_eq!(report.saved.len(), 3);
    assert!(session.objects().iter().all(|o| !o.is_new));

    let script = project.read(&project.script());
    assert!(script.contains(
        "        MACRO_OBJECTS(/*objList*/ bob_seg7_macro_objs),\n    OBJECT(MODEL_GOOMBA, 1, 2, 3, 0, 0, 0, 0x00000000, bhvGoomba),\n    END_AREA(),"
    ));
    let macros = project.read(&project.macros());
    assert!(macros.contains("    MACRO_OBJECT(macro_goomba_triplet_formation, 90, 7, 8, 9),\n    MACRO_OBJECT_END(),"));
    let collision = project.read(&project.collision());
    assert!(collision.contains(
        "    SPECIAL_OBJECT(special_bubble_tree, 10, 20, 30),\n    SPECIAL_OBJECT(special_bubble_tree, 11, 12, 13),\n    COL_END(),"
    ));
    assert!(collision.contains("COL_SPECIAL_INIT(3),"));

    let reloaded = open(&project);
    assert_eq!(reloaded.len(), before + 3);
    assert!(reloaded.objects().iter().any(|o| o.source_type == SourceType::Macro && o.position == Vec3::new(7, 8, 9)));

    // The inserted spans are real spans: saving again is a no-op.
    let report = session.save();
    assert!(report.is_complete());
    assert!(report.saved.is_empty());
}

#[test]
fn special_counter_follows_deletions() {
    let project = Project::new();
    let mut session = open(&project);

    let owner = session
        .objects()
        .iter()
        .position(|o| o.preset_name.as_deref() == Some("special_booming_volcano_owner"))
        .unwrap();
    session.delete(owner).unwrap();
    assert!(session.save().is_complete());

    let collision = project.read(&project.collision());
    assert!(collision.contains("COL_SPECIAL_INIT(1),"));
    assert!(!collision.contains("special_booming_volcano_owner"));
    assert!(collision.contains("    SPECIAL_OBJECT(special_bubble_tree, 10, 20, 30),\n    COL_END(),"));
}

#[test]
fn behavior_change_moves_a_special_object_into_the_script() {
    let project = Project::new();
    let mut session = open(&project);

    let tree = session
        .objects()
        .iter()
        .position(|o| o.preset_name.as_deref() == Some("special_bubble_tree"))
        .unwrap();
    let converted = session.set_behavior(tree, "bhvTree").unwrap();
    assert_eq!(session.get(converted).unwrap().file(), Some(project.script().as_path()));

    let report = session.save();
    assert!(report.is_complete(), "{:?}", report.failed);

    let collision = project.read(&project.collision());
    assert!(!collision.contains("special_bubble_tree"));
    assert!(collision.contains("COL_SPECIAL_INIT(1),"));
    let script = project.read(&project.script());
    assert!(script.contains("OBJECT(MODEL_BOB_BUBBLY_TREE, 10, 20, 30, 0, 0, 0, 0x00000000, bhvTree),"));
}

#[test]
fn stale_spans_are_reported_and_left_alone() {
    let project = Project::new();
    let config = EditorConfig::default();
    let mut objects = load_level(&project.level_dir(), Some(1), Some(project.root()), &config).objects;

    let edited_elsewhere = format!("// touched by another tool\n{SCRIPT}");
    fs::write(project.script(), &edited_elsewhere).unwrap();

    let goomba = objects.iter().position(|o| o.model_name == "MODEL_GOOMBA").unwrap();
    objects[goomba].position.x = 999;
    let macro_obj = objects.iter().position(|o| o.source_type == SourceType::Macro).unwrap();
    objects[macro_obj].position.x = 501;

    let report = save(&mut objects, &config);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].file.as_deref(), Some(project.script().as_path()));
    assert_eq!(report.saved, vec![project.macros()]);
    assert_eq!(project.read(&project.script()), edited_elsewhere);
    assert!(project.read(&project.macros()).contains("/*yaw*/ 45, 501, 0, -300"));
}

#[test]
fn missing_files_do_not_stop_the_save() {
    let project = Project::new();
    let mut session = open(&project);

    fs::remove_file(project.collision()).unwrap();
    let goomba = index_of(&session, "MODEL_GOOMBA");
    session.move_to(goomba, Vec3::new(0, 0, 0)).unwrap();
    let tree = session
        .objects()
        .iter()
        .position(|o| o.preset_name.as_deref() == Some("special_bubble_tree"))
        .unwrap();
    session.move_to(tree, Vec3::new(0, 0, 0)).unwrap();

    let report = session.save();
    assert!(!report.is_complete());
    assert_eq!(report.saved, vec![project.script()]);
    assert_eq!(report.failed[0].file.as_deref(), Some(project.collision().as_path()));
}

#[test]
fn placeholders_are_never_written() {
    let project = Project::new();
    let config = EditorConfig::default();
    let mut objects = load_level(&project.level_dir(), Some(1), Some(project.root()), &config).objects;

    let goomba = objects.iter().position(|o| o.model_name == "MODEL_GOOMBA").unwrap();
    objects[goomba].behavior = SPECIAL_BEHAVIOR.to_string();
    objects[goomba].model_name = "MODEL_ERROR_MISSING".to_string();
    objects[goomba].position.y = 10;

    assert!(save(&mut objects, &config).is_complete());
    let text = project.read(&project.script());
    assert!(text.contains("OBJECT(MODEL_GOOMBA, 100, 10, 200, 0, 90, 0, 0x00000001, bhvGoomba),"));
}

#[test]
fn a_stale_special_count_is_left_alone_without_edits() {
    let project = Project::new();
    let stale = COLLISION.replace("COL_SPECIAL_INIT(2)", "COL_SPECIAL_INIT(5)");
    project.write("levels/bob/areas/1/collision.inc.c", &stale);
    let mut session = open(&project);

    let tree = session
        .objects()
        .iter()
        .position(|o| o.preset_name.as_deref() == Some("special_bubble_tree"))
        .unwrap();
    session.move_to(tree, Vec3::new(10, 20, 30)).unwrap();
    let report = session.save();
    assert!(report.is_complete());
    assert!(report.saved.is_empty());
    assert_eq!(project.read(&project.collision()), stale);

    // Moving an object without adding or removing one keeps the count too.
    session.move_to(tree, Vec3::new(15, 20, 30)).unwrap();
    assert_eq!(session.save().saved, vec![project.collision()]);
    let collision = project.read(&project.collision());
    assert!(collision.contains("COL_SPECIAL_INIT(5),"));
    assert!(collision.contains("SPECIAL_OBJECT(special_bubble_tree, 15, 20, 30),"));
}

#[test]
fn a_symbolic_special_count_is_kept() {
    let project = Project::new();
    let symbolic = COLLISION.replace("COL_SPECIAL_INIT(2)", "COL_SPECIAL_INIT(NUM_BOB_SPECIALS)");
    project.write("levels/bob/areas/1/collision.inc.c", &symbolic);
    let mut session = open(&project);

    let owner = session
        .objects()
        .iter()
        .position(|o| o.preset_name.as_deref() == Some("special_booming_volcano_owner"))
        .unwrap();
    session.delete(owner).unwrap();
    assert!(session.save().is_complete());

    let collision = project.read(&project.collision());
    assert!(collision.contains("COL_SPECIAL_INIT(NUM_BOB_SPECIALS),"));
    assert!(!collision.contains("special_booming_volcano_owner"));
}

#[test]
fn edits_without_an_argument_are_reported() {
    let project = Project::new();
    let mut session = open(&project);

    let tree = session
        .objects()
        .iter()
        .position(|o| o.preset_name.as_deref() == Some("special_bubble_tree"))
        .unwrap();
    session.rotate(tree, Vec3::new(0, 90, 0)).unwrap();
    let coin_box = session
        .objects()
        .iter()
        .position(|o| o.preset_name.as_deref() == Some("macro_box_one_up"))
        .unwrap();
    let params = session.get(coin_box).unwrap().params;
    assert_eq!(params, 0x0B);
    let mut edited = session.get(coin_box).unwrap().clone();
    edited.params = 0x04;
    session.replace(coin_box, edited).unwrap();

    let report = session.save();
    assert!(!report.is_complete());
    assert_eq!(report.failed.len(), 2);
    let files: Vec<_> = report.failed.iter().map(|f| f.file.clone().unwrap()).collect();
    assert!(files.contains(&project.collision()));
    assert!(files.contains(&project.macros()));
    assert!(report.failed.iter().any(|f| f.message.contains("yaw")));
    assert!(report.failed.iter().any(|f| f.message.contains("params")));
    assert_eq!(project.read(&project.collision()), COLLISION);
    assert_eq!(project.read(&project.macros()), MACROS);
}

fn latin1(script: &str) -> Vec<u8> {
    let mut bytes = b"// Bob-omb Battlefield, caf\xe9 edition\n".to_vec();
    bytes.extend_from_slice(script.as_bytes());
    bytes
}

#[test]
fn non_utf8_files_load_and_save() {
    let project = Project::new();
    fs::write(project.script(), latin1(SCRIPT)).unwrap();
    let mut session = open(&project);
    assert_eq!(session.len(), 8);

    let goomba = index_of(&session, "MODEL_GOOMBA");
    session.move_to(goomba, Vec3::new(1500, 0, 200)).unwrap();
    assert!(session.save().is_complete());

    let expected = SCRIPT.replacen("OBJECT(MODEL_GOOMBA, 100, 0, 200,", "OBJECT(MODEL_GOOMBA, 1500, 0, 200,", 1);
    assert_eq!(fs::read(project.script()).unwrap(), latin1(&expected));
}

#[test]
fn a_failed_write_keeps_the_old_spans() {
    let project = Project::new();
    let original = latin1(SCRIPT);
    fs::write(project.script(), &original).unwrap();
    let mut session = open(&project);
    let spans: Vec<_> = session.objects().iter().map(|o| o.source.clone()).collect();

    let goomba = index_of(&session, "MODEL_GOOMBA");
    session.move_to(goomba, Vec3::new(1500, 0, 200)).unwrap();
    // Earlier in the file than the goomba, so its splice moves the goomba's span.
    let buddy = index_of(&session, "MODEL_BOBOMB_BUDDY");
    session.set_model(buddy, "MODEL_\u{3a9}").unwrap();

    let report = session.save();
    assert!(report.saved.is_empty());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].file.as_deref(), Some(project.script().as_path()));
    assert_eq!(fs::read(project.script()).unwrap(), original);

    let after: Vec<_> = session.objects().iter().map(|o| o.source.clone()).collect();
    assert_eq!(after, spans);
}
