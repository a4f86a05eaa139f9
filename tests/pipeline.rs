use std::{fs, path::PathBuf};

use warband::{
    composition::BOSS_SCALE,
    formation::{is_well_separated, SurroundLayout},
    setup::{BattleMode, TeamSetup},
    GeneratorBuilder, SetupLoader,
};

fn setup_loader() -> SetupLoader {
    SetupLoader::new(env!("CARGO_MANIFEST_DIR"))
}

fn setup_path() -> PathBuf {
    PathBuf::from("setups/border_skirmish.yaml")
}

#[test]
fn loader_reads_fixture() {
    let setup = setup_loader().load(setup_path()).expect("setup parses");
    assert_eq!(setup.name, "Border Skirmish");
    assert_eq!(setup.teams.len(), 2);
    assert_eq!(setup.catalog.classes.len(), 9);
    assert!((setup.tuning.boss_escalation_chance - 0.4).abs() < 1e-6);
    // Untouched tuning keeps its defaults.
    assert!((setup.tuning.strong_enemy_chance - 0.2).abs() < 1e-6);
}

#[test]
fn fixture_generates_a_valid_battle() {
    let setup = setup_loader().load(setup_path()).unwrap();
    let min_distance = setup.min_distance;
    let bounds = setup.map.area();
    let roster = GeneratorBuilder::from_setup(setup).build().generate().unwrap();

    let players = roster.team(0).unwrap();
    let enemies = roster.team(1).unwrap();
    assert_eq!(players.total_units(), 14);
    assert!(enemies.total_power() >= 14.0 * 1.2);
    assert_eq!(
        roster.units.len(),
        players.total_units() + enemies.total_units()
    );

    let points: Vec<_> = roster.units.iter().map(|u| u.position).collect();
    assert!(points.iter().all(|p| bounds.contains(*p)));
    assert!(is_well_separated(&points, min_distance));

    // Player units stay on the west half, enemies on the east.
    assert!(players.units().all(|u| u.position.x < 0.0));
    assert!(enemies.units().all(|u| u.position.x > 0.0));
    for team in &roster.teams {
        for entry in &team.class_counts {
            assert_eq!(entry.count, entry.unit_data.len());
        }
    }
}

#[test]
fn generation_is_deterministic() {
    let run = |seed: u64| {
        let setup = setup_loader().load(setup_path()).unwrap();
        GeneratorBuilder::from_setup(setup)
            .with_seed(seed)
            .build()
            .generate()
            .unwrap()
    };
    let a = run(5);
    let b = run(5);
    assert_eq!(a.units, b.units);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
    assert_ne!(a.units, run(6).units);
}

#[test]
fn setup_round_trips_through_disk() {
    let mut setup = setup_loader().load(setup_path()).unwrap();
    setup.mode = BattleMode::Survive {
        layout: Some(SurroundLayout::ConcentricRings),
        survivor: Some(0),
    };
    setup.teams.push(TeamSetup::enemy(2, 0.5));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("last_stand.yaml");
    fs::write(&path, serde_yaml::to_string(&setup).unwrap()).unwrap();

    let loaded = SetupLoader::new(dir.path()).load("last_stand.yaml").unwrap();
    assert_eq!(loaded.mode, setup.mode);
    assert_eq!(loaded.teams, setup.teams);

    let roster = GeneratorBuilder::from_setup(loaded).build().generate().unwrap();
    assert_eq!(roster.mode, "survive");
    assert_eq!(roster.teams.len(), 3);
    assert_eq!(roster.team(0).unwrap().total_units(), 14);
}

#[test]
fn seize_boss_holds_the_point() {
    let mut setup = setup_loader().load(setup_path()).unwrap();
    setup.teams.reverse();
    setup.mode = BattleMode::Seize {
        capture_point: Some([-18.0, 4.0]),
        holder: Some(1),
    };
    setup.validate().unwrap();

    let roster = GeneratorBuilder::from_setup(setup).build().generate().unwrap();
    let holder = roster.team(1).unwrap();
    let point = glam::Vec2::new(-18.0, 4.0);
    assert!(holder
        .units()
        .any(|u| u.position == point && u.scale >= BOSS_SCALE));
}

#[test]
fn invalid_setup_is_reported_with_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    fs::write(
        &path,
        "name: Broken\nmap: { x_bound: 10.0, y_bound: 10.0 }\nteams:\n  - id: 0\n",
    )
    .unwrap();
    let err = SetupLoader::new(dir.path()).load("broken.yaml").unwrap_err();
    assert!(format!("{err:#}").contains("broken.yaml"));
}
