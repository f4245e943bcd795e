//! Post-load fixups.
//!
//! Object references are stored as [`ObjectId`]s. They are checked before
//! anything is spawned and resolved to entities once every object exists.
//! Cached module attributes and published frames are rebuilt last.

use bevy_ecs::prelude::*;
use rustc_hash::FxHashSet;

use crate::components::animation::RenderFrame;
use crate::components::dispatch::ActorDispatch;
use crate::components::physicsactor::PhysicsActor;
use crate::components::worldobject::ObjectId;
use crate::resources::objectids::ObjectIds;
use crate::systems::animation::commit;

use super::SaveError;
use super::schema::SaveGame;

/// Every stored reference must name an object in the same save.
pub fn check_references(save: &SaveGame) -> Result<(), SaveError> {
    let known: FxHashSet<ObjectId> = save
        .actors
        .iter()
        .map(|a| a.id)
        .chain(save.bosses.iter().map(|b| b.id))
        .chain(save.remains.iter().map(|r| r.id))
        .collect();

    let references = save
        .actors
        .iter()
        .map(|a| (a.id, a.last_attacker))
        .chain(save.bosses.iter().map(|b| (b.id, b.last_attacker)));
    for (referrer, reference) in references {
        if let Some(missing) = reference
            && !known.contains(&missing)
        {
            return Err(SaveError::DanglingReference { referrer, missing });
        }
    }
    Ok(())
}

/// Point `last_attacker` fields back at live entities.
pub fn resolve_references(world: &mut World, pending: &[(Entity, ObjectId)]) {
    for &(entity, attacker_id) in pending {
        let attacker = world.resource::<ObjectIds>().entity(attacker_id);
        let Ok(mut actor) = world.get_entity_mut(entity) else {
            continue;
        };
        if let Some(mut dispatch) = actor.get_mut::<ActorDispatch>() {
            dispatch.state.last_attacker = attacker;
        } else if let Some(mut boss) = actor.get_mut::<PhysicsActor>() {
            boss.last_attacker = attacker;
        }
    }
}

/// Rebuild what was not saved: cached module attributes and render frames.
pub fn recompute(world: &mut World) {
    let mut actors = world.query::<(&mut ActorDispatch, &mut RenderFrame)>();
    for (mut dispatch, mut frame) in actors.iter_mut(world) {
        dispatch.compute_attributes();
        commit(&dispatch.state.anim, &mut frame);
    }
    let mut bosses = world.query::<(&PhysicsActor, &mut RenderFrame)>();
    for (boss, mut frame) in bosses.iter_mut(world) {
        commit(&boss.anim, &mut frame);
    }
}
