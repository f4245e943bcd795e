//! Boss integration tests through the full simulation schedule.

use bevy_ecs::prelude::*;

use actorcore::components::physicsactor::PhysicsActor;
use actorcore::components::remains::{Corpse, Effect, EffectKind};
use actorcore::components::worldobject::WorldObject;
use actorcore::events::message::{MessageKind, ProjectileHit};
use actorcore::events::projectile::ProjectileKind;
use actorcore::fixed::{Angle, Fixed, FixedVec3};
use actorcore::resources::aiconfig::AiConfig;
use actorcore::resources::collision::OpenArena;
use actorcore::resources::species::SpeciesStore;
use actorcore::simulation::Simulation;

fn sim() -> Simulation {
    let mut sim = Simulation::new(AiConfig::new(), OpenArena::new(400));
    sim.player_mut().pos = FixedVec3::from_ints(0, 0, -300);
    sim
}

fn at_origin() -> WorldObject {
    WorldObject::new(FixedVec3::ZERO, Angle::ZERO, 0)
}

fn hit(damage: i32) -> MessageKind {
    MessageKind::Damage(ProjectileHit::new(Fixed::from_int(damage), ProjectileKind::RifleBolt))
}

fn count<T: Component>(sim: &mut Simulation) -> usize {
    let world = sim.world_mut();
    world.query::<&T>().iter(world).count()
}

#[test]
fn killed_boss_lands_and_leaves_one_corpse() {
    let mut sim = sim();
    let kell = sim.setup("kell", at_origin()).unwrap();
    sim.step(1);
    sim.send(kell.entity, hit(100));

    let mut ticks = 0;
    while sim.world().get_entity(kell.entity).is_ok() && ticks < 400 {
        sim.step(1);
        ticks += 1;
    }
    assert!(sim.world().get_entity(kell.entity).is_err());
    assert_eq!(count::<Corpse>(&mut sim), 1);

    sim.step(50);
    assert_eq!(count::<Corpse>(&mut sim), 1);
}

#[test]
fn crushed_turret_explodes_without_a_corpse() {
    let mut sim = sim();
    let turret = sim.setup("turret", at_origin()).unwrap();
    sim.send(turret.entity, MessageKind::Crush);
    for _ in 0..200 {
        sim.step(1);
        if sim.world().get_entity(turret.entity).is_err() {
            break;
        }
    }
    assert!(sim.world().get_entity(turret.entity).is_err());
    assert_eq!(count::<Corpse>(&mut sim), 0);
    let world = sim.world_mut();
    let effects: Vec<EffectKind> = world.query::<&Effect>().iter(world).map(|e| e.kind).collect();
    assert_eq!(effects, vec![EffectKind::SmallExplosion]);
}

#[test]
fn shielded_phase_three_returns_fire() {
    let mut species = SpeciesStore::new();
    species
        .apply_overrides_str(r#"{"phase3": {"reflect_chance": 100}}"#)
        .unwrap();
    let mut sim = sim().with_species(species);
    let boss = sim.setup("phase3", at_origin()).unwrap();
    sim.step(1);

    sim.send(boss.entity, hit(15));
    sim.step(1);

    let shots = sim.drain_projectiles();
    assert_eq!(shots.len(), 1);
    assert_eq!(shots[0].kind, ProjectileKind::RifleBolt);
    assert_eq!(shots[0].owner, boss.entity);
    assert_eq!(
        sim.world().get::<PhysicsActor>(boss.entity).unwrap().hp,
        Fixed::from_int(110)
    );
}

#[test]
fn free_removes_a_boss_without_remains() {
    let mut sim = sim();
    let boss = sim.setup("boba_fett", at_origin()).unwrap();
    sim.send(boss.entity, MessageKind::Free);
    sim.step(1);
    assert!(sim.world().get_entity(boss.entity).is_err());
    assert_eq!(count::<Corpse>(&mut sim), 0);
    assert_eq!(count::<Effect>(&mut sim), 0);
}

#[test]
fn woken_boss_engages_the_player() {
    let mut sim = sim();
    sim.player_mut().pos = FixedVec3::from_ints(0, 0, 80);
    let boss = sim.setup("boba_fett", at_origin()).unwrap();
    let mut shots = 0;
    for _ in 0..800 {
        sim.step(1);
        shots += sim.drain_projectiles().len();
    }
    assert!(sim.world().get::<PhysicsActor>(boss.entity).unwrap().state >= 2);
    assert!(shots > 0);
}
