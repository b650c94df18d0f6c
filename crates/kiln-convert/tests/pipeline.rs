//! End-to-end conversion scenarios over a temporary project

use kiln_asset::{AssetIndex, ConverterSettings};
use kiln_convert::converters::SCHEME_FIELD;
use kiln_convert::{ConversionOrchestrator, ConversionReason, ConverterRegistry, Outcome};
use kiln_core::{AssetId, Resource, Value};
use std::fs;
use std::path::{Path, PathBuf};

struct Project {
    root: PathBuf,
}

impl Project {
    fn new() -> Self {
        let root = std::env::temp_dir().join(format!("kiln_pipeline_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(root.join("content")).unwrap();
        Self { root }
    }

    fn content(&self, name: &str) -> PathBuf {
        self.root.join("content").join(name)
    }

    fn write(&self, name: &str, data: &[u8]) -> PathBuf {
        let path = self.content(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, data).unwrap();
        path
    }

    fn orchestrator(&self) -> ConversionOrchestrator {
        ConversionOrchestrator::new(
            ConverterRegistry::with_defaults(),
            self.root.join("content"),
            self.root.join("import"),
        )
        .unwrap()
    }

    fn settings(&self, source: &Path) -> ConverterSettings {
        ConverterSettings::load(source, self.root.join("import"))
            .unwrap()
            .unwrap()
    }
}

impl Drop for Project {
    fn drop(&mut self) {
        fs::remove_dir_all(&self.root).ok();
    }
}

#[test]
fn scene_source_decodes_to_same_tree() {
    let project = Project::new();
    let source = project.write("Hero.fab", br#"{"Name":"Hero"}"#);

    let orchestrator = project.orchestrator();
    let report = orchestrator.convert(&source);
    assert_eq!(report.outcome, Outcome::Converted);

    let id = report.identity.unwrap();
    let resource = orchestrator.load_resource(id).unwrap();
    assert_eq!(resource.type_tag, "Prefab");
    assert_eq!(resource.identity, id);

    let mut expected = Value::map();
    expected.insert("Name", Value::from("Hero"));
    assert_eq!(resource.value, expected);
}

#[test]
fn translator_source_becomes_pair_table() {
    let project = Project::new();
    let source = project.write("fr.csv", b"hello;bonjour\nbye;au revoir\n");

    let orchestrator = project.orchestrator();
    let report = orchestrator.convert(&source);
    assert_eq!(report.outcome, Outcome::Converted);

    let resource = orchestrator.load_resource(report.identity.unwrap()).unwrap();
    let table = resource.value.as_map().unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table["hello"], Value::from("bonjour"));
    assert_eq!(table["bye"], Value::from("au revoir"));
}

#[test]
fn identity_is_stable_across_reconversions() {
    let project = Project::new();
    let source = project.write("town.map", br#"{"Tiles":[1,2,3]}"#);

    let first = project.orchestrator().convert(&source);
    let second = project.orchestrator().with_force(true).convert(&source);
    let third = project.orchestrator().convert(&source);

    assert_eq!(second.reason, Some(ConversionReason::Forced));
    assert_eq!(third.outcome, Outcome::UpToDate);
    assert!(first.identity.is_some());
    assert_eq!(first.identity, second.identity);
    assert_eq!(second.identity, third.identity);
    assert_eq!(project.settings(&source).identity(), first.identity);
}

#[test]
fn stale_version_is_reconverted() {
    let project = Project::new();
    let source = project.write("hero.fab", br#"{"Name":"Hero"}"#);
    project.orchestrator().convert(&source);

    let mut settings = project.settings(&source);
    assert_eq!(settings.version, 2);
    settings.version = 1;
    settings.save().unwrap();

    let report = project.orchestrator().convert(&source);
    assert_eq!(report.reason, Some(ConversionReason::StaleVersion));
    assert_eq!(report.outcome, Outcome::Converted);
    assert_eq!(project.settings(&source).version, 2);
}

#[test]
fn missing_destination_is_reconverted() {
    let project = Project::new();
    let source = project.write("notes.txt", b"notes");
    project.orchestrator().convert(&source);

    fs::remove_file(project.settings(&source).absolute_destination()).unwrap();
    let report = project.orchestrator().convert(&source);
    assert_eq!(report.reason, Some(ConversionReason::DestinationMissing));
    assert!(project.settings(&source).absolute_destination().exists());
}

#[test]
fn unreadable_source_leaves_previous_output() {
    let project = Project::new();
    let source = project.write("notes.txt", b"first draft");
    project.orchestrator().convert(&source);

    let settings = project.settings(&source);
    let before = fs::read(settings.absolute_destination()).unwrap();

    fs::remove_file(&source).unwrap();
    let report = project.orchestrator().with_force(true).convert(&source);
    assert!(report.is_failure());

    assert_eq!(fs::read(settings.absolute_destination()).unwrap(), before);
    assert_eq!(project.settings(&source), settings);
}

#[test]
fn parse_error_fails_only_that_asset() {
    let project = Project::new();
    let broken = project.write("broken.map", b"{ not json");
    let fine = project.write("fine.map", br#"{"ok":true}"#);

    let reports = project.orchestrator().convert_batch(&[broken.clone(), fine.clone()]);
    assert_eq!(reports[0].source, broken);
    assert!(reports[0].is_failure());
    assert_eq!(reports[1].source, fine);
    assert_eq!(reports[1].outcome, Outcome::Converted);
}

#[test]
fn batch_reports_follow_input_order() {
    let project = Project::new();
    let sources: Vec<PathBuf> = (0..24)
        .map(|i| project.write(&format!("dir{}/file{}.txt", i % 3, i), format!("{}", i).as_bytes()))
        .collect();

    let orchestrator = project.orchestrator().with_jobs(4);
    let reports = orchestrator.convert_batch(&sources);

    assert_eq!(reports.len(), sources.len());
    let mut ids = std::collections::HashSet::new();
    for (report, source) in reports.iter().zip(&sources) {
        assert_eq!(&report.source, source);
        assert_eq!(report.outcome, Outcome::Converted);
        assert!(ids.insert(report.identity.unwrap()));
    }
}

#[test]
fn font_identity_change_rebinds_old_references() {
    let project = Project::new();
    let source = project.write("Sans.ttf", b"\x00\x01\x00\x00fake font");

    let orchestrator = project.orchestrator();
    let old = orchestrator.convert(&source).identity.unwrap();
    orchestrator.save_index().unwrap();

    // The sidecar is replaced with one carrying another identity
    let new = AssetId::from_raw(old.raw().wrapping_add(1).max(1));
    let mut settings = project.settings(&source);
    settings.set_identity(new);
    settings.save().unwrap();

    let orchestrator = project.orchestrator().with_force(true);
    assert_eq!(orchestrator.convert(&source).identity, Some(new));
    orchestrator.save_index().unwrap();

    let index = AssetIndex::load(project.root.join("import")).unwrap();
    assert_eq!(index.resolve(old), Some(new));

    let font = orchestrator.load_resource(old).unwrap();
    assert_eq!(font.identity, new);
    assert_eq!(font.type_tag, "Font");
    assert_eq!(
        font.value.get("data").and_then(Value::as_bytes),
        Some(&b"\x00\x01\x00\x00fake font"[..])
    );
}

#[test]
fn control_scheme_merges_into_existing_resource() {
    let project = Project::new();
    let source = project.write("player.controls", br#"{"Jump":"Space"}"#);
    project.orchestrator().convert(&source);

    // Another tool adds its own field to the compiled resource
    let settings = project.settings(&source);
    let mut resource = Resource::read_from(settings.absolute_destination()).unwrap();
    resource.value.insert("Owner", Value::from("player"));
    resource.write_to(settings.absolute_destination()).unwrap();

    fs::write(&source, br#"{"Jump":"W"}"#).unwrap();
    let report = project.orchestrator().with_force(true).convert(&source);
    assert_eq!(report.outcome, Outcome::Converted);

    let resource = Resource::read_from(settings.absolute_destination()).unwrap();
    assert_eq!(resource.value.get("Owner"), Some(&Value::from("player")));
    assert_eq!(
        resource.value.get(SCHEME_FIELD).and_then(|s| s.get("Jump")),
        Some(&Value::from("W"))
    );
}

#[test]
fn convert_all_persists_index() {
    let project = Project::new();
    project.write("a.fab", br#"{"a":1}"#);
    project.write("nested/b.csv", b"k;v\n");
    project.write("ignored.bin", b"??");

    let reports = project.orchestrator().convert_all().unwrap();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.outcome == Outcome::Converted));

    let reloaded = project.orchestrator();
    for report in &reports {
        let resource = reloaded.load_resource(report.identity.unwrap()).unwrap();
        assert_eq!(Some(resource.identity), report.identity);
    }
}

#[test]
fn new_source_from_template() {
    let project = Project::new();
    let templates = project.root.join("templates");
    fs::create_dir_all(&templates).unwrap();
    fs::write(templates.join("Prefab.fab"), r#"{"Name":"${templateName}"}"#).unwrap();

    let orchestrator = project.orchestrator().with_templates(&templates);
    let created = orchestrator
        .create_from_template("fab", &project.content("Goblin"))
        .unwrap();
    assert_eq!(created, project.content("Goblin.fab"));

    let report = orchestrator.convert(&created);
    let resource = orchestrator.load_resource(report.identity.unwrap()).unwrap();
    assert_eq!(resource.value.get("Name"), Some(&Value::from("Goblin")));
}

#[test]
fn read_only_settings_still_convert() {
    let project = Project::new();
    let source = project.write("notes.txt", b"locked");

    let mut settings = ConverterSettings::new(&source, project.root.join("import"));
    settings.read_only = true;
    settings.save().unwrap();

    let orchestrator = project.orchestrator();
    let report = orchestrator.convert(&source);
    assert_eq!(report.outcome, Outcome::Converted);

    let mut saved = project.settings(&source);
    assert!(saved.read_only);
    assert_eq!(saved.identity(), report.identity);
    assert_eq!(saved.version, 1);
    assert!(saved.set_property("raw", toml::Value::Boolean(true)).is_err());

    let resource = orchestrator.load_resource(report.identity.unwrap()).unwrap();
    assert_eq!(resource.value, Value::Bytes(b"locked".to_vec()));
}

#[test]
fn same_path_twice_in_one_batch_converts_once() {
    let project = Project::new();
    let hero = project.write("Hero.fab", br#"{"Name":"Hero"}"#);
    let notes = project.write("notes.txt", b"hello");

    let orchestrator = project.orchestrator();
    let reports = orchestrator.convert_batch(&[hero.clone(), hero.clone(), notes.clone()]);
    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].source, hero);
    assert_eq!(reports[1].source, hero);
    assert_eq!(reports[2].source, notes);

    let hero_outcomes: Vec<&Outcome> = reports[..2].iter().map(|r| &r.outcome).collect();
    assert!(hero_outcomes.contains(&&Outcome::Converted));
    assert!(hero_outcomes.contains(&&Outcome::UpToDate));
    assert_eq!(reports[0].identity, reports[1].identity);
    assert_eq!(project.settings(&hero).identity(), reports[0].identity);
    assert_eq!(orchestrator.index().len(), 2);
}

#[test]
fn map_tilesets_become_stable_sub_resources() {
    let project = Project::new();
    let source = project.write(
        "world.map",
        br#"{"Name":"World","Tilesets":{"forest":{"Tiles":4}}}"#,
    );

    let orchestrator = project.orchestrator();
    let report = orchestrator.convert(&source);
    assert_eq!(report.outcome, Outcome::Converted);

    let settings = project.settings(&source);
    let forest = settings.sub_item("forest").unwrap().clone();
    assert_eq!(forest.type_identifier, "TileSet");
    assert_ne!(Some(forest.identity), report.identity);

    let map = orchestrator.load_resource(report.identity.unwrap()).unwrap();
    let tilesets = map.value.get("Tilesets").unwrap();
    assert_eq!(tilesets.get("forest"), Some(&Value::Int(i64::from(forest.identity.raw()))));

    let tileset = orchestrator.load_resource(forest.identity).unwrap();
    assert_eq!(tileset.type_tag, "TileSet");
    assert_eq!(tileset.value.get("Tiles"), Some(&Value::Int(4)));
    assert_eq!(orchestrator.index().by_type("TileSet"), vec![forest.identity]);

    // A forced pass from a fresh orchestrator keeps the sub-item identity
    let forced = project.orchestrator().with_force(true);
    assert_eq!(forced.convert(&source).outcome, Outcome::Converted);
    assert_eq!(project.settings(&source).sub_item("forest"), Some(&forest));
}
