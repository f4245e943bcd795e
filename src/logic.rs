//! Logic registration: turning a setup keyword into a live actor.
//!
//! A level places objects and names the logic they run ("trooper",
//! "phase3", ...). [`attach_logic`] looks the keyword up in the
//! [`SpeciesStore`] and attaches either an [`ActorDispatch`] with its
//! modules or a [`PhysicsActor`] boss, plus the [`Inbox`], [`RenderFrame`]
//! and [`ObjectId`] every actor carries.
//!
//! Generic actors get their modules in this order: thinker (or flyer),
//! attack, damage. The dispatcher runs them in reverse, so damage always
//! decides first whether the actor is still alive this tick.

use bevy_ecs::prelude::*;
use log::{debug, info};
use thiserror::Error;

use crate::components::animation::{AnimAction, LogicAnimation, RenderFrame};
use crate::components::attack::AttackModule;
use crate::components::damage::DamageModule;
use crate::components::dispatch::{ActorDispatch, ActorState, DispatchFlags};
use crate::components::inbox::Inbox;
use crate::components::module::{ActorModule, MAX_MODULES};
use crate::components::movement::MovementModule;
use crate::components::physicsactor::{BossKind, BossLocals, PhysicsActor, WelderLocals};
use crate::components::thinker::{FlyerModule, ThinkerModule};
use crate::components::worldobject::{ObjectId, WorldObject};
use crate::fixed::Angle;
use crate::resources::aiconfig::AiConfig;
use crate::resources::objectids::ObjectIds;
use crate::resources::species::{SpeciesDef, SpeciesStore};
use crate::systems::boss::is_anchored;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    #[error("unknown logic keyword '{0}'")]
    UnknownKeyword(String),
    #[error("species '{keyword}' needs more than {capacity} modules")]
    ModuleCapacity { keyword: String, capacity: usize },
    #[error("entity {0:?} has no world object to attach logic to")]
    MissingWorldObject(Entity),
}

/// What the host holds on to for a placed actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LogicHandle {
    pub entity: Entity,
    pub id: ObjectId,
}

/// Build the dispatch record for a generic species.
pub fn build_dispatch(def: &SpeciesDef, config: &AiConfig) -> Result<ActorDispatch, SetupError> {
    let mut state = ActorState::new(def.keyword.clone());
    state.fov = match def.fov_degrees {
        Some(degrees) => Angle::from_degrees(degrees as i32).units().max(1),
        None => config.fov(),
    };
    state.aware_range = config.aware_range();
    state.delay = def.delay.unwrap_or(config.idle_delay).max(1);
    state.faction = def.faction;
    state.alert_group = def.alert_group;
    state.alert_sound = def.alert_sound.clone();
    state.anim_table = def.anims.clone();
    state.anim = LogicAnimation::start(&def.anims.get(AnimAction::Idle));
    if def.flying {
        state.flags.insert(DispatchFlags::FLYING);
    }
    if def.scripted {
        state.flags.remove(DispatchFlags::NPC);
    }

    let mut dispatch = ActorDispatch::new(state).with_movement(MovementModule::new(def.movement));

    let mut modules = Vec::with_capacity(3);
    match (&def.thinker, &def.hover) {
        (Some(thinker), Some(hover)) => {
            modules.push(ActorModule::Flyer(FlyerModule::new(thinker.clone(), hover.clone())));
        }
        (Some(thinker), None) => modules.push(ActorModule::Thinker(ThinkerModule::new(thinker.clone()))),
        (None, _) => {}
    }
    if let Some(attack) = &def.attack {
        modules.push(ActorModule::Attack(AttackModule::new(attack.clone())));
    }
    modules.push(ActorModule::Damage(DamageModule::with_params(def.hp, def.damage.clone())));

    for module in modules {
        dispatch
            .add_module(module)
            .map_err(|_| SetupError::ModuleCapacity {
                keyword: def.keyword.clone(),
                capacity: MAX_MODULES,
            })?;
    }
    dispatch.compute_attributes();
    Ok(dispatch)
}

/// Build the boss record for a boss species.
pub fn build_boss(def: &SpeciesDef, kind: BossKind, object: &WorldObject) -> PhysicsActor {
    let mut profile = def.profile.clone().unwrap_or_default();
    if profile.alert_sound.is_none() {
        profile.alert_sound = def.alert_sound.clone();
    }
    let mut boss = PhysicsActor::new(kind, def.hp, profile, def.anims.clone());
    boss.faction = def.faction;
    boss.flying = def.flying || is_anchored(kind);
    boss.movement = MovementModule::new(def.movement);
    boss.last_player_pos = object.pos;
    boss.anim = LogicAnimation::start(&def.anims.get(AnimAction::Idle));
    if kind == BossKind::Welder {
        boss.locals = BossLocals::Welder(WelderLocals {
            base_yaw: object.yaw,
            sweep_dir: 1,
        });
    }
    boss
}

/// Attach the logic named by `keyword` to an existing world object.
pub fn attach_logic(world: &mut World, entity: Entity, keyword: &str) -> Result<LogicHandle, SetupError> {
    world.init_resource::<SpeciesStore>();
    world.init_resource::<AiConfig>();
    world.init_resource::<ObjectIds>();

    let def = world
        .resource::<SpeciesStore>()
        .get(keyword)
        .cloned()
        .ok_or_else(|| SetupError::UnknownKeyword(keyword.to_string()))?;
    let Some(mut object) = world.get::<WorldObject>(entity).cloned() else {
        return Err(SetupError::MissingWorldObject(entity));
    };
    object.radius = def.radius;
    object.height = def.height;

    let mut frame = RenderFrame::default();
    match def.boss {
        Some(kind) => {
            let boss = build_boss(&def, kind, &object);
            crate::systems::animation::commit(&boss.anim, &mut frame);
            world.entity_mut(entity).insert(boss);
        }
        None => {
            let dispatch = build_dispatch(&def, world.resource::<AiConfig>())?;
            crate::systems::animation::commit(&dispatch.state.anim, &mut frame);
            world.entity_mut(entity).insert(dispatch);
        }
    }
    let id = world.resource_mut::<ObjectIds>().allocate(entity);
    world
        .entity_mut(entity)
        .insert((object, Inbox::default(), frame, id));

    debug!("{:?}: attached '{}' as {:?}", entity, keyword, id);
    Ok(LogicHandle { entity, id })
}

/// Spawn a world object and attach the logic named by `keyword`.
///
/// The object is despawned again if the keyword cannot be set up.
pub fn setup_actor(world: &mut World, keyword: &str, object: WorldObject) -> Result<LogicHandle, SetupError> {
    let pos = object.pos;
    let entity = world.spawn(object).id();
    match attach_logic(world, entity, keyword) {
        Ok(handle) => {
            info!("Set up '{}' at {:?} as {:?}", keyword, pos, handle.id);
            Ok(handle)
        }
        Err(err) => {
            world.despawn(entity);
            Err(err)
        }
    }
}

/// Remove an actor immediately, freeing its modules first.
///
/// Returns `false` if the entity no longer exists.
pub fn cleanup_logic(world: &mut World, entity: Entity) -> bool {
    let Ok(mut actor) = world.get_entity_mut(entity) else {
        return false;
    };
    if let Some(mut dispatch) = actor.get_mut::<ActorDispatch>() {
        dispatch.free_modules();
        dispatch.state.flags.insert(DispatchFlags::DEAD);
    }
    let id = actor.get::<ObjectId>().copied();
    actor.despawn();
    if let Some(id) = id {
        world.resource_mut::<ObjectIds>().release(id);
    }
    debug!("{:?}: logic cleaned up", entity);
    true
}
