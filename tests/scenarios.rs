use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use warband::{
    catalog::InMemoryCatalog,
    composition::{generate_enemy, generate_roster, GenerationContext, Theme, BOSS_SCALE},
    config::GenerationConfig,
    error::GenerationError,
    formation::{is_well_separated, Facing, FormationArea, FormationShape},
    naming::AlliterativeNamer,
    teams::plan_team_battle,
};

fn catalog(yaml: &str) -> InMemoryCatalog {
    serde_yaml::from_str(yaml).expect("catalog parses")
}

const KNIGHTS_ONLY: &str = r#"
classes:
  - name: Knight
    preferred_weapon: Lance
    base_stats: { str: 6, def: 9 }
characters:
  - name: Militia
    default_class: Knight
"#;

const MIXED: &str = r#"
classes:
  - name: Knight
    preferred_weapon: Lance
    base_stats: { str: 6, def: 9 }
  - name: Archer
    preferred_weapon: Bow
    ranged: true
    base_stats: { dex: 8, str: 4 }
  - name: Cavalier
    flags: [Mounted]
    preferred_weapon: Sword
    base_stats: { str: 7, spd: 8 }
characters:
  - name: Aldric
    unique: true
    default_class: Cavalier
  - name: Brenna
    unique: true
    default_class: Archer
  - name: Militia
    default_class: Knight
"#;

#[test]
fn same_class_roster_with_one_class() {
    let catalog = catalog(KNIGHTS_ONLY);
    let namer = AlliterativeNamer::default();
    let config = GenerationConfig::default();
    let ctx = GenerationContext::new(&catalog, &namer, &config);

    for seed in 0..10 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let team = generate_roster(0, 10, &Theme::SameClass, &ctx, &mut rng);
        assert_eq!(team.class_counts.len(), 1);
        assert_eq!(team.class_counts[0].class_name, "Knight");
        assert_eq!(team.class_counts[0].count, 10);
        assert_eq!(team.class_counts[0].unit_data.len(), 10);
    }
}

#[test]
fn four_units_in_ten_by_ten() {
    let area = FormationArea::new(-5.0, 5.0, -5.0, 5.0).unwrap();
    for shape in FormationShape::LIBRARY {
        for seed in 0..5 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let points = shape
                .generate(4, &area, 1.26, Facing::East, &mut rng)
                .unwrap();
            assert_eq!(points.len(), 4);
            assert!(is_well_separated(&points, 1.26), "{shape:?}");
            assert!(points
                .iter()
                .all(|p| (-5.0..=5.0).contains(&p.x) && (-5.0..=5.0).contains(&p.y)));
        }
    }
}

#[test]
fn enemy_meets_power_target_with_a_boss() {
    let catalog = catalog(MIXED);
    let namer = AlliterativeNamer::default();
    let config = GenerationConfig::default();
    let ctx = GenerationContext::new(&catalog, &namer, &config);

    for seed in 0..25 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let team = generate_enemy(1, 10, 1.0, &Theme::Random, &ctx, &mut rng);
        assert!(team.total_power() >= 10.0);
        assert!(team.units().any(|u| u.scale >= BOSS_SCALE));
    }
}

#[test]
fn seven_players_two_winners_is_rejected() {
    assert_eq!(
        plan_team_battle(7, 2),
        Err(GenerationError::NoValidTeamConfiguration {
            total_players: 7,
            winners: 2
        })
    );
}

#[test]
fn empty_formation_is_rejected() {
    let area = FormationArea::new(-5.0, 5.0, -5.0, 5.0).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    assert_eq!(
        FormationShape::Wedge.generate(0, &area, 1.0, Facing::North, &mut rng),
        Err(GenerationError::EmptyFormation(0))
    );
}
