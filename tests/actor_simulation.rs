//! Generic actor integration tests driven through the full tick schedule.

use bevy_ecs::prelude::*;

use actorcore::components::animation::RenderFrame;
use actorcore::components::damage::DamageModule;
use actorcore::components::dispatch::{ActorDispatch, ActorState, Faction};
use actorcore::components::inbox::Inbox;
use actorcore::components::module::ActorModule;
use actorcore::components::remains::{Corpse, Pickup};
use actorcore::components::worldobject::{ObjectId, WorldObject};
use actorcore::events::audio::SoundCue;
use actorcore::events::message::{ActorMessage, MessageKind, ProjectileHit};
use actorcore::events::player::PlayerHit;
use actorcore::events::projectile::{ProjectileKind, ProjectileSpawn};
use actorcore::fixed::{Angle, Fixed, FixedVec3};
use actorcore::logic::setup_actor;
use actorcore::resources::aiconfig::AiConfig;
use actorcore::resources::collision::{Collision, OpenArena};
use actorcore::resources::objectids::ObjectIds;
use actorcore::resources::player::PlayerState;
use actorcore::resources::rng::SimRng;
use actorcore::resources::simclock::SimClock;
use actorcore::resources::species::SpeciesStore;
use actorcore::resources::sound::setup_sound;
use actorcore::simulation::Simulation;
use actorcore::systems::dispatch::actor_dispatch_system;
use actorcore::systems::messages::route_actor_messages;
use actorcore::systems::time::advance_sim_clock;

fn placed(x: i32, z: i32, yaw: i32) -> WorldObject {
    WorldObject::new(FixedVec3::from_ints(x, 0, z), Angle::new(yaw), 0)
}

fn rifle(damage: i32) -> MessageKind {
    MessageKind::Damage(ProjectileHit::new(Fixed::from_int(damage), ProjectileKind::RifleBolt))
}

/// World with just the generic actor pass, for tests that do not need bosses.
fn make_world(player: FixedVec3) -> World {
    let mut world = World::new();
    world.insert_resource(SimClock::default());
    world.insert_resource(PlayerState::at(player));
    world.insert_resource(SimRng::with_seed(3));
    world.insert_resource(Collision::new(OpenArena::new(500)));
    world.insert_resource(AiConfig::new());
    world.init_resource::<Messages<ActorMessage>>();
    world.init_resource::<Messages<ProjectileSpawn>>();
    world.init_resource::<Messages<PlayerHit>>();
    let _ = setup_sound(&mut world);
    world
}

fn tick(world: &mut World) {
    let mut schedule = Schedule::default();
    schedule.add_systems((advance_sim_clock, route_actor_messages, actor_dispatch_system).chain());
    schedule.run(world);
}

fn count<T: Component>(world: &mut World) -> usize {
    world.query::<&T>().iter(world).count()
}

#[test]
fn lethal_hit_leaves_exactly_one_corpse() {
    let mut world = make_world(FixedVec3::from_ints(0, 0, -400));
    let trooper = setup_actor(&mut world, "trooper", placed(0, 0, 0)).unwrap();
    tick(&mut world);

    world
        .resource_mut::<Messages<ActorMessage>>()
        .write(ActorMessage::new(trooper.entity, rifle(5)));
    tick(&mut world);
    tick(&mut world);

    assert!(world.get_entity(trooper.entity).is_err());
    assert_eq!(world.resource::<ObjectIds>().entity(trooper.id), None);
    assert_eq!(count::<Corpse>(&mut world), 1);
    assert_eq!(count::<Pickup>(&mut world), 1);

    // Late messages for the dead actor are dropped.
    world
        .resource_mut::<Messages<ActorMessage>>()
        .write(ActorMessage::new(trooper.entity, rifle(5)));
    for _ in 0..5 {
        tick(&mut world);
    }
    assert_eq!(count::<Corpse>(&mut world), 1);

    let mut corpses = world.query::<(&Corpse, &ObjectId)>();
    let found: Vec<(&Corpse, &ObjectId)> = corpses.iter(&world).collect();
    let (corpse, id) = found[0];
    assert_eq!(corpse.species, "trooper");
    assert_ne!(*id, trooper.id);
}

#[test]
fn friendly_fire_is_halved() {
    let mut world = make_world(FixedVec3::from_ints(0, 0, -400));
    let victim = setup_actor(&mut world, "gamorrean", placed(0, 0, 0)).unwrap();
    let ally = setup_actor(&mut world, "gamorrean", placed(10, 0, 0)).unwrap();
    let rival = setup_actor(&mut world, "officer", placed(-10, 0, 0)).unwrap();

    let from = |source: Entity, faction: Faction| {
        MessageKind::Damage(
            ProjectileHit::new(Fixed::from_int(10), ProjectileKind::RifleBolt).from_source(source, faction),
        )
    };
    let mut messages = world.resource_mut::<Messages<ActorMessage>>();
    messages.write(ActorMessage::new(victim.entity, from(ally.entity, Faction::Alien)));
    tick(&mut world);
    assert_eq!(
        world.get::<ActorDispatch>(victim.entity).unwrap().hp(),
        Some(Fixed::from_int(15))
    );

    world
        .resource_mut::<Messages<ActorMessage>>()
        .write(ActorMessage::new(victim.entity, from(rival.entity, Faction::Imperial)));
    tick(&mut world);
    let dispatch = world.get::<ActorDispatch>(victim.entity).unwrap();
    assert_eq!(dispatch.hp(), Some(Fixed::from_int(5)));
    assert_eq!(dispatch.state.last_attacker, Some(rival.entity));
}

#[test]
fn waking_actor_alerts_its_group_only() {
    let mut world = make_world(FixedVec3::from_ints(0, 0, 100));
    let spotter = setup_actor(&mut world, "trooper", placed(0, 0, 0)).unwrap();
    let squadmate = setup_actor(&mut world, "officer", placed(40, 0, 0)).unwrap();
    let outsider = setup_actor(&mut world, "gamorrean", placed(-40, 0, 0)).unwrap();
    for handle in [squadmate, outsider] {
        world.get_mut::<WorldObject>(handle.entity).unwrap().yaw = Angle::new(Angle::HALF);
    }

    tick(&mut world);

    let idle = |world: &World, entity: Entity| world.get::<ActorDispatch>(entity).unwrap().state.is_idle();
    assert!(!idle(&world, spotter.entity));
    assert!(!idle(&world, squadmate.entity));
    assert!(idle(&world, outsider.entity));

    let cues: Vec<SoundCue> = world.resource_mut::<Messages<SoundCue>>().drain().collect();
    assert!(cues.contains(&SoundCue::CombatMusic));
}

#[test]
fn scripted_actor_waits_for_a_wakeup() {
    let mut world = make_world(FixedVec3::from_ints(0, 0, 100));
    let mut species = SpeciesStore::new();
    species
        .apply_overrides_str(r#"{ "officer": { "scripted": true } }"#)
        .unwrap();
    world.insert_resource(species);
    let spotter = setup_actor(&mut world, "trooper", placed(0, 0, 0)).unwrap();
    let guard = setup_actor(&mut world, "officer", placed(40, 0, 0)).unwrap();

    for _ in 0..200 {
        tick(&mut world);
    }
    let idle = |world: &World, entity: Entity| world.get::<ActorDispatch>(entity).unwrap().state.is_idle();
    assert!(!idle(&world, spotter.entity));
    assert!(idle(&world, guard.entity));

    world
        .resource_mut::<Messages<ActorMessage>>()
        .write(ActorMessage::new(guard.entity, MessageKind::Wakeup));
    tick(&mut world);
    assert!(!idle(&world, guard.entity));
}

#[test]
fn modules_after_a_kill_do_not_run() {
    let mut world = make_world(FixedVec3::from_ints(0, 0, -400));
    world.init_resource::<ObjectIds>();
    let mut dispatch = ActorDispatch::new(ActorState::new("trooper"));
    for _ in 0..2 {
        dispatch
            .add_module(ActorModule::Damage(DamageModule::new(Fixed::from_int(4))))
            .unwrap();
    }
    let entity = world
        .spawn((placed(0, 0, 0), dispatch, Inbox::default(), RenderFrame::default()))
        .id();
    let id = world.resource_mut::<ObjectIds>().allocate(entity);
    world.entity_mut(entity).insert(id);

    world
        .resource_mut::<Messages<ActorMessage>>()
        .write(ActorMessage::new(entity, MessageKind::Crush));
    tick(&mut world);

    assert!(world.get_entity(entity).is_err());
    assert_eq!(count::<Corpse>(&mut world), 1);
}

#[test]
fn crush_kills_on_the_spot() {
    let mut world = make_world(FixedVec3::from_ints(0, 0, -400));
    let officer = setup_actor(&mut world, "officer", placed(0, 0, 0)).unwrap();
    world
        .resource_mut::<Messages<ActorMessage>>()
        .write(ActorMessage::new(officer.entity, MessageKind::Crush));
    tick(&mut world);
    assert!(world.get_entity(officer.entity).is_err());
    assert_eq!(count::<Corpse>(&mut world), 1);
}

fn squad_run(seed: u64, ticks: u32) -> (Vec<(ProjectileKind, FixedVec3, Angle)>, Vec<WorldObject>) {
    let config = AiConfig {
        seed,
        ..AiConfig::new()
    };
    let mut sim = Simulation::new(config, OpenArena::new(400));
    sim.player_mut().pos = FixedVec3::from_ints(0, 0, 60);
    for (keyword, x) in [("trooper", -30), ("officer", 0), ("commando", 30), ("probe_droid", 60)] {
        sim.setup(keyword, placed(x, 0, 0)).unwrap();
    }
    let mut shots = Vec::new();
    for _ in 0..ticks {
        sim.step(1);
        shots.extend(sim.drain_projectiles().into_iter().map(|p| (p.kind, p.pos, p.yaw)));
    }
    let world = sim.world_mut();
    let mut objects: Vec<(ObjectId, WorldObject)> = world
        .query::<(&ObjectId, &WorldObject)>()
        .iter(world)
        .map(|(id, o)| (*id, o.clone()))
        .collect();
    objects.sort_by_key(|(id, _)| *id);
    (shots, objects.into_iter().map(|(_, o)| o).collect())
}

#[test]
fn same_seed_same_fight() {
    let (shots_a, objects_a) = squad_run(11, 400);
    let (shots_b, objects_b) = squad_run(11, 400);
    assert!(!shots_a.is_empty());
    assert_eq!(shots_a, shots_b);
    assert_eq!(objects_a, objects_b);
}

#[test]
fn awake_squad_shoots_at_the_player() {
    let mut sim = Simulation::new(AiConfig::new(), OpenArena::new(400));
    sim.player_mut().pos = FixedVec3::from_ints(0, 0, 80);
    sim.setup("trooper", placed(0, 0, 0)).unwrap();
    let mut fired = Vec::new();
    for _ in 0..600 {
        sim.step(1);
        fired.extend(sim.drain_projectiles());
    }
    assert!(!fired.is_empty());
    assert!(fired.iter().all(|p| p.kind == ProjectileKind::RifleBolt));
    assert!(sim.sound_cues().iter().any(|cue| matches!(cue, SoundCue::Play { sound, .. } if sound == "ranstp02")));
}
