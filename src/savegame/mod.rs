//! Save games.
//!
//! A save game is a JSON document holding the clock, the RNG seed, the
//! player and every actor, boss and remains object keyed by [`ObjectId`].
//! Modules are stored under their stable tags and re-attached on load; boss
//! handler tables are static per [`BossKind`](crate::components::physicsactor::BossKind)
//! so only the state index and locals are stored.
//!
//! Messages still in flight are not saved. Inboxes are empty between ticks.
//!
//! Loading replaces every object carrying an [`ObjectId`] in the world:
//! 1. parse and check the version;
//! 2. decode every module and check every reference (nothing is touched on
//!    failure);
//! 3. despawn the old objects and restore the clock, RNG and player;
//! 4. spawn the saved objects under their original ids;
//! 5. resolve references and recompute derived fields ([`fixup`]).

pub mod fixup;
pub mod schema;

use std::io::{Read, Write};

use bevy_ecs::prelude::*;
use log::{info, warn};
use thiserror::Error;

use crate::components::animation::RenderFrame;
use crate::components::dispatch::ActorDispatch;
use crate::components::inbox::Inbox;
use crate::components::physicsactor::PhysicsActor;
use crate::components::remains::{Corpse, Effect, Pickup, Remains};
use crate::components::worldobject::{ObjectId, WorldObject};
use crate::resources::objectids::ObjectIds;
use crate::resources::player::PlayerState;
use crate::resources::rng::SimRng;
use crate::resources::simclock::SimClock;

pub use schema::{SAVE_VERSION, SaveGame, SavedActor, SavedBoss, SavedModule, SavedRemains};

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save game i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed save game: {0}")]
    Json(#[from] serde_json::Error),
    #[error("save game version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("unknown module tag '{0}'")]
    UnknownModuleTag(String),
    #[error("object {referrer:?} refers to missing object {missing:?}")]
    DanglingReference { referrer: ObjectId, missing: ObjectId },
    #[error("object {id:?} has more than {capacity} modules")]
    TooManyModules { id: ObjectId, capacity: usize },
}

/// How many objects a load brought back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub actors: usize,
    pub bosses: usize,
    pub remains: usize,
}

/// Snapshot the simulation state held in `world`.
pub fn capture(world: &mut World) -> Result<SaveGame, SaveError> {
    let tick = world.get_resource::<SimClock>().map(|c| c.tick).unwrap_or_default();
    let rng_seed = world
        .get_resource::<SimRng>()
        .map(SimRng::seed)
        .unwrap_or_else(|| SimRng::default().seed());
    let player = world.get_resource::<PlayerState>().cloned().unwrap_or_default();
    let id_of = |world: &World, entity: Option<Entity>| entity.and_then(|e| world.get::<ObjectId>(e).copied());

    let mut actors = Vec::new();
    let mut query = world.query::<(&ObjectId, &WorldObject, &ActorDispatch)>();
    for (id, object, dispatch) in query.iter(world) {
        let last_attacker = id_of(world, dispatch.state.last_attacker);
        actors.push(SavedActor::capture(*id, object, dispatch, last_attacker)?);
    }
    actors.sort_by_key(|a| a.id);

    let mut bosses = Vec::new();
    let mut query = world.query::<(&ObjectId, &WorldObject, &PhysicsActor)>();
    for (id, object, boss) in query.iter(world) {
        let mut saved = boss.clone();
        saved.last_attacker = None;
        bosses.push(SavedBoss {
            id: *id,
            object: object.clone(),
            boss: saved,
            last_attacker: id_of(world, boss.last_attacker),
        });
    }
    bosses.sort_by_key(|b| b.id);

    let mut remains = Vec::new();
    let mut query = world.query::<(&ObjectId, &WorldObject, Option<&Corpse>, Option<&Pickup>, Option<&Effect>)>();
    for (id, object, corpse, pickup, effect) in query.iter(world) {
        let kind = match (corpse, pickup, effect) {
            (Some(corpse), _, _) => Remains::Corpse(corpse.clone()),
            (_, Some(pickup), _) => Remains::Pickup(*pickup),
            (_, _, Some(effect)) => Remains::Effect(*effect),
            _ => continue,
        };
        remains.push(SavedRemains {
            id: *id,
            object: object.clone(),
            remains: kind,
        });
    }
    remains.sort_by_key(|r| r.id);

    Ok(SaveGame {
        version: SAVE_VERSION,
        tick,
        rng_seed,
        player,
        actors,
        bosses,
        remains,
    })
}

/// Replace the simulation state in `world` with `save`.
pub fn restore(world: &mut World, save: SaveGame) -> Result<LoadSummary, SaveError> {
    if save.version > SAVE_VERSION {
        return Err(SaveError::UnsupportedVersion {
            found: save.version,
            supported: SAVE_VERSION,
        });
    }
    fixup::check_references(&save)?;

    let SaveGame {
        tick,
        rng_seed,
        player,
        actors,
        bosses,
        remains,
        ..
    } = save;

    let mut decoded = Vec::with_capacity(actors.len());
    for actor in actors {
        let last_attacker = actor.last_attacker;
        let (id, object, dispatch) = actor.into_dispatch()?;
        decoded.push((id, object, dispatch, last_attacker));
    }

    let old: Vec<Entity> = world.query_filtered::<Entity, With<ObjectId>>().iter(world).collect();
    for entity in old {
        world.despawn(entity);
    }
    world.init_resource::<ObjectIds>();
    world.resource_mut::<ObjectIds>().clear();

    let time_scale = world.get_resource::<SimClock>().map(|c| c.time_scale).unwrap_or(1);
    world.insert_resource(SimClock {
        tick,
        delta_ticks: 0,
        time_scale,
    });
    world.insert_resource(SimRng::with_seed(rng_seed));
    world.insert_resource(player);

    let summary = LoadSummary {
        actors: decoded.len(),
        bosses: bosses.len(),
        remains: remains.len(),
    };

    let mut pending = Vec::new();
    for (id, object, dispatch, last_attacker) in decoded {
        let entity = world
            .spawn((object, dispatch, Inbox::default(), RenderFrame::default(), id))
            .id();
        world.resource_mut::<ObjectIds>().restore(id, entity);
        if let Some(attacker) = last_attacker {
            pending.push((entity, attacker));
        }
    }
    for saved in bosses {
        let entity = world
            .spawn((saved.object, saved.boss, Inbox::default(), RenderFrame::default(), saved.id))
            .id();
        world.resource_mut::<ObjectIds>().restore(saved.id, entity);
        if let Some(attacker) = saved.last_attacker {
            pending.push((entity, attacker));
        }
    }
    for saved in remains {
        let mut entity = world.spawn((saved.object, saved.id));
        match saved.remains {
            Remains::Corpse(corpse) => entity.insert(corpse),
            Remains::Pickup(pickup) => entity.insert(pickup),
            Remains::Effect(effect) => entity.insert(effect),
        };
        let entity = entity.id();
        world.resource_mut::<ObjectIds>().restore(saved.id, entity);
    }

    fixup::resolve_references(world, &pending);
    fixup::recompute(world);

    info!(
        "Loaded save at tick {}: {} actors, {} bosses, {} remains",
        tick, summary.actors, summary.bosses, summary.remains
    );
    Ok(summary)
}

/// Write `save` as pretty-printed JSON.
pub fn write_save(writer: impl Write, save: &SaveGame) -> Result<(), SaveError> {
    serde_json::to_writer_pretty(writer, save)?;
    Ok(())
}

/// Parse a save game, rejecting versions newer than [`SAVE_VERSION`].
pub fn read_save(reader: impl Read) -> Result<SaveGame, SaveError> {
    let value: serde_json::Value = serde_json::from_reader(reader)?;
    let found = value
        .get("version")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(0) as u32;
    if found > SAVE_VERSION {
        return Err(SaveError::UnsupportedVersion {
            found,
            supported: SAVE_VERSION,
        });
    }
    if found < SAVE_VERSION {
        warn!("Upgrading save game from version {} to {}", found, SAVE_VERSION);
    }
    let mut save: SaveGame = serde_json::from_value(value)?;
    save.version = SAVE_VERSION;
    Ok(save)
}
