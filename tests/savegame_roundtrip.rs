//! Save and load through the simulation driver.

use actorcore::components::worldobject::WorldObject;
use actorcore::events::message::{MessageKind, ProjectileHit};
use actorcore::events::projectile::ProjectileKind;
use actorcore::fixed::{Angle, Fixed, FixedVec3};
use actorcore::resources::aiconfig::AiConfig;
use actorcore::resources::collision::OpenArena;
use actorcore::savegame::{self, SaveError};
use actorcore::simulation::Simulation;

fn placed(x: i32, z: i32) -> WorldObject {
    WorldObject::new(FixedVec3::from_ints(x, 0, z), Angle::ZERO, 0)
}

fn battle() -> Simulation {
    let mut sim = Simulation::new(AiConfig::new(), OpenArena::new(400));
    sim.player_mut().pos = FixedVec3::from_ints(0, 0, 70);
    let trooper = sim.setup("trooper", placed(-20, 0)).unwrap();
    sim.setup("officer", placed(20, 0)).unwrap();
    sim.setup("probe_droid", placed(0, -20)).unwrap();
    sim.setup("phase3", placed(0, -60)).unwrap();
    sim.setup("welder", placed(60, 0)).unwrap();
    sim.step(120);
    sim.send(
        trooper.entity,
        MessageKind::Damage(ProjectileHit::new(Fixed::from_int(9), ProjectileKind::Thermal)),
    );
    sim.step(30);
    sim.drain_projectiles();
    sim
}

fn fresh() -> Simulation {
    Simulation::new(AiConfig::new(), OpenArena::new(400))
}

#[test]
fn save_load_save_is_identical() {
    let mut sim = battle();
    let mut first = Vec::new();
    sim.save(&mut first).unwrap();

    let mut other = fresh();
    other.load(first.as_slice()).unwrap();
    let mut second = Vec::new();
    other.save(&mut second).unwrap();

    let a: serde_json::Value = serde_json::from_slice(&first).unwrap();
    let b: serde_json::Value = serde_json::from_slice(&second).unwrap();
    assert_eq!(a, b);
    assert!(!a["remains"].as_array().unwrap().is_empty());
}

#[test]
fn loaded_run_continues_like_the_original() {
    let mut original = battle();
    let mut buffer = Vec::new();
    original.save(&mut buffer).unwrap();
    let mut resumed = fresh();
    resumed.load(buffer.as_slice()).unwrap();
    assert_eq!(resumed.tick(), original.tick());

    let mut shots_a = Vec::new();
    let mut shots_b = Vec::new();
    for _ in 0..300 {
        original.step(1);
        resumed.step(1);
        shots_a.extend(original.drain_projectiles().into_iter().map(|p| (p.kind, p.pos, p.yaw, p.pitch)));
        shots_b.extend(resumed.drain_projectiles().into_iter().map(|p| (p.kind, p.pos, p.yaw, p.pitch)));
    }
    assert_eq!(shots_a, shots_b);

    let end_a = savegame::capture(original.world_mut()).unwrap();
    let end_b = savegame::capture(resumed.world_mut()).unwrap();
    assert_eq!(end_a.actors, end_b.actors);
    assert_eq!(end_a.bosses, end_b.bosses);
}

#[test]
fn truncated_document_is_a_json_error() {
    let mut sim = battle();
    let mut buffer = Vec::new();
    sim.save(&mut buffer).unwrap();
    buffer.truncate(buffer.len() / 2);
    assert!(matches!(fresh().load(buffer.as_slice()), Err(SaveError::Json(_))));
}

#[test]
fn every_boss_kind_reloads_to_the_same_document() {
    for keyword in ["boba_fett", "kell", "phase1", "phase2", "phase3", "turret", "welder", "mousebot"] {
        let mut sim = fresh();
        sim.player_mut().pos = FixedVec3::from_ints(0, 0, 60);
        sim.setup(keyword, placed(0, 0)).unwrap();
        sim.step(200);
        sim.drain_projectiles();

        let mut first = Vec::new();
        sim.save(&mut first).unwrap();
        let mut other = fresh();
        other.load(first.as_slice()).unwrap();
        let mut second = Vec::new();
        other.save(&mut second).unwrap();

        let a: serde_json::Value = serde_json::from_slice(&first).unwrap();
        let b: serde_json::Value = serde_json::from_slice(&second).unwrap();
        assert_eq!(a, b, "{keyword}");
        assert_eq!(a["bosses"].as_array().map(Vec::len), Some(1), "{keyword}");
    }
}
