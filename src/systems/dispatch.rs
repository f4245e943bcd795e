//! Per-tick driver for generic actors.
//!
//! [`actor_dispatch_system`] walks every [`ActorDispatch`] in allocation
//! order ([`ObjectId`] ascending) and, for each one:
//!
//! 1. delivers the messages parked in its [`Inbox`] (hostile messages and
//!    `Wakeup` wake it first; `Free` tears it down);
//! 2. if idle, polls for the player every `delay` ticks and wakes up on
//!    sight, alerting its group;
//! 3. otherwise refreshes player visibility and runs every due module in
//!    reverse insertion order, stopping as soon as one kills the actor;
//! 4. integrates physics, steps the movement module and settles the
//!    animation, publishing the frame to [`RenderFrame`].
//!
//! Side effects are buffered in one [`ActorEffects`] for the whole pass and
//! flushed at the end through [`EffectSink`]: messages are written, remains
//! spawned, and alerts wake same-group idle actors in range.
//!
//! # Related
//!
//! - [`crate::systems::boss::physics_actor_system`] – the boss pass that runs
//!   after this one
//! - [`crate::components::module::ActorContext`] – what modules get to see

use bevy_ecs::prelude::*;
use bevy_ecs::system::SystemParam;
use log::debug;

use crate::components::animation::RenderFrame;
use crate::components::dispatch::{ActorDispatch, ActorState, DispatchFlags};
use crate::components::inbox::Inbox;
use crate::components::module::{ActorContext, ActorParts};
use crate::components::remains::Remains;
use crate::components::worldobject::{ObjectId, WorldObject};
use crate::events::audio::SoundCue;
use crate::events::effects::{ActorEffects, Alert, SpawnRequest};
use crate::events::message::MessageKind;
use crate::events::player::PlayerHit;
use crate::events::projectile::ProjectileSpawn;
use crate::fixed::dist_approx;
use crate::resources::aiconfig::AiConfig;
use crate::resources::collision::{Collision, CollisionService};
use crate::resources::objectids::ObjectIds;
use crate::resources::player::PlayerState;
use crate::resources::rng::SimRng;
use crate::resources::simclock::SimClock;
use crate::systems::animation::{advance, apply_request, commit};
use crate::systems::movement::{integrate_physics, update_movement};

/// Shared world state every actor reads during a pass.
#[derive(SystemParam)]
pub struct ActorWorld<'w> {
    pub clock: Res<'w, SimClock>,
    pub player: Res<'w, PlayerState>,
    pub collision: Res<'w, Collision>,
    pub config: Res<'w, AiConfig>,
    pub rng: ResMut<'w, SimRng>,
}

/// Where buffered [`ActorEffects`] end up.
#[derive(SystemParam)]
pub struct EffectSink<'w, 's> {
    pub commands: Commands<'w, 's>,
    pub ids: ResMut<'w, ObjectIds>,
    pub projectiles: MessageWriter<'w, ProjectileSpawn>,
    pub player_hits: MessageWriter<'w, PlayerHit>,
    pub sounds: MessageWriter<'w, SoundCue>,
}

impl EffectSink<'_, '_> {
    /// Write out everything but the alerts, which are handed back.
    pub fn flush(&mut self, effects: ActorEffects) -> Vec<Alert> {
        let ActorEffects {
            projectiles,
            player_hits,
            sounds,
            spawns,
            alerts,
        } = effects;
        self.projectiles.write_batch(projectiles);
        self.player_hits.write_batch(player_hits);
        self.sounds.write_batch(sounds);
        for request in spawns {
            self.spawn_remains(request);
        }
        alerts
    }

    /// Create a corpse, pickup or effect object.
    pub fn spawn_remains(&mut self, request: SpawnRequest) -> Entity {
        let object = WorldObject::new(request.pos, request.yaw, request.sector);
        let mut entity = self.commands.spawn(object);
        match request.remains {
            Remains::Corpse(corpse) => entity.insert(corpse),
            Remains::Pickup(pickup) => entity.insert(pickup),
            Remains::Effect(effect) => entity.insert(effect),
        };
        let id = self.ids.allocate(entity.id());
        entity.insert(id);
        debug!("spawned remains {:?} as {:?}", id, entity.id());
        entity.id()
    }

    /// Despawn an actor and forget its object id.
    pub fn despawn(&mut self, entity: Entity, id: ObjectId) {
        self.ids.release(id);
        self.commands.entity(entity).despawn();
    }
}

/// Tear down a generic actor: free its modules (last inserted first), then
/// despawn it.
///
/// Returns `false` if the actor had already been cleaned up.
pub fn cleanup_actor(dispatch: &mut ActorDispatch, entity: Entity, id: ObjectId, sink: &mut EffectSink) -> bool {
    let first = dispatch.free_modules() || !dispatch.state.is_dead();
    if !first {
        return false;
    }
    dispatch.state.flags.insert(DispatchFlags::DEAD);
    sink.despawn(entity, id);
    debug!("{:?}: cleaned up", entity);
    true
}

/// Would an idle actor at `object` notice the player right now?
///
/// Inside the aware range the player is always noticed. Beyond it the player
/// must be visible, within sight range, inside the field of view and in
/// line of sight.
pub fn notices_player(
    object: &WorldObject,
    state: &ActorState,
    player: &PlayerState,
    collision: &dyn CollisionService,
    config: &AiConfig,
) -> bool {
    if !player.alive {
        return false;
    }
    let dist = dist_approx(player.pos.x - object.pos.x, player.pos.z - object.pos.z);
    if dist <= state.aware_range {
        return true;
    }
    if player.invisible || dist > config.sight_range() {
        return false;
    }
    if !state.in_fov(object.yaw, object.pos.angle_to(&player.pos)) {
        return false;
    }
    collision.line_of_sight(&object.eye(), &player.eye())
}

/// Can an awake actor see the player? Field of view no longer matters.
pub fn sees_player(object: &WorldObject, player: &PlayerState, collision: &dyn CollisionService, config: &AiConfig) -> bool {
    player.alive
        && !player.invisible
        && object.pos.dist_xz(&player.pos) <= config.sight_range()
        && collision.line_of_sight(&object.eye(), &player.eye())
}

/// Wake `state` and queue the alert, its sound and the combat music cue.
fn wake(state: &mut ActorState, object: &WorldObject, ctx: &mut ActorContext<'_>) {
    if !state.wake() {
        return;
    }
    debug!("{:?}: awake", ctx.entity);
    state.last_player_pos = ctx.player.pos;
    ctx.effects.alerts.push(Alert {
        source: ctx.entity,
        pos: object.pos,
        group: state.alert_group,
        faction: state.faction,
    });
    ctx.effects.sound(state.alert_sound.as_deref(), object.pos);
    ctx.effects.sounds.push(SoundCue::CombatMusic);
}

/// Drive every generic actor through one tick.
///
/// Contract
/// - Reads [`SimClock`]; does nothing while `delta_ticks` is zero.
/// - Visits actors in [`ObjectId`] order, skipping ones already dead.
/// - Mutates [`WorldObject`], [`ActorDispatch`], [`Inbox`] and
///   [`RenderFrame`] of the visited actor only; other actors are touched
///   after the pass, by alerts.
/// - Writes [`ProjectileSpawn`], [`PlayerHit`] and [`SoundCue`] messages;
///   spawns remains and despawns dead or freed actors through commands.
pub fn actor_dispatch_system(
    mut actors: Query<(
        Entity,
        &ObjectId,
        &mut WorldObject,
        &mut ActorDispatch,
        &mut Inbox,
        &mut RenderFrame,
    )>,
    mut sim: ActorWorld,
    mut sink: EffectSink,
) {
    let now = sim.clock.tick;
    let dt = sim.clock.delta_ticks;
    if dt == 0 {
        return;
    }

    let mut order: Vec<(ObjectId, Entity)> = actors.iter().map(|(entity, id, ..)| (*id, entity)).collect();
    order.sort_unstable();

    let mut effects = ActorEffects::default();
    let collision = sim.collision.service();
    let player = &*sim.player;
    let config = &*sim.config;
    let rng = &mut *sim.rng;

    for (id, entity) in order {
        let Ok((_, _, mut object, mut dispatch, mut inbox, mut frame)) = actors.get_mut(entity) else {
            continue;
        };
        if dispatch.state.is_dead() {
            continue;
        }

        let mut ctx = ActorContext::new(entity, now, dt, player, collision, config, &mut *rng, &mut effects);
        let mut freed = false;
        {
            let ActorDispatch {
                state,
                modules,
                movement,
            } = &mut *dispatch;
            for message in inbox.take() {
                match message {
                    MessageKind::Free => {
                        freed = true;
                        break;
                    }
                    MessageKind::Wakeup => wake(state, &object, &mut ctx),
                    ref hostile if hostile.is_hostile() => wake(state, &object, &mut ctx),
                    _ => {}
                }
                let mut parts = ActorParts {
                    object: &mut object,
                    state: &mut *state,
                    movement: movement.as_mut(),
                };
                for module in modules.iter_mut().rev() {
                    module.handle_message(&message, &mut parts, &mut ctx);
                }
            }
        }
        if freed {
            cleanup_actor(&mut dispatch, entity, id, &mut sink);
            continue;
        }

        let ActorDispatch {
            state,
            modules,
            movement,
        } = &mut *dispatch;

        // Crushed or falling actors die even if nothing woke them.
        if state.is_idle() && !state.is_dying() {
            if state.flags.contains(DispatchFlags::NPC) && now >= state.next_tick {
                state.next_tick = ctx.after(state.delay);
                if notices_player(&object, state, player, collision, config) {
                    wake(state, &object, &mut ctx);
                }
            }
            apply_request(&mut state.anim, &mut state.anim_priority, ctx.take_anim_request());
            commit(&state.anim, &mut frame);
            continue;
        }

        let visible = sees_player(&object, player, collision, config);
        state.flags.set(DispatchFlags::PLAYER_VISIBLE, visible);
        if visible {
            state.last_player_pos = player.pos;
        }

        for module in modules.iter_mut().rev() {
            if module.next_tick() <= now {
                let mut parts = ActorParts {
                    object: &mut object,
                    state: &mut *state,
                    movement: movement.as_mut(),
                };
                let next = module.update(&mut parts, &mut ctx);
                module.set_next_tick(next);
            }
            if ctx.is_killed() {
                break;
            }
        }
        if ctx.is_killed() {
            cleanup_actor(&mut dispatch, entity, id, &mut sink);
            continue;
        }

        let flying = state.is_flying();
        integrate_physics(&mut object, &mut state.kin, flying, config.gravity(), collision, dt);
        if let Some(movement) = movement.as_mut() {
            update_movement(movement, &mut object, collision, flying, dt);
        }
        apply_request(&mut state.anim, &mut state.anim_priority, ctx.take_anim_request());
        let moving = state.flags.contains(DispatchFlags::MOVING);
        advance(&mut state.anim, &mut state.anim_priority, &state.anim_table, moving, flying, dt);
        commit(&state.anim, &mut frame);
    }

    let alerts = sink.flush(effects);
    let radius = config.alert_radius();
    for alert in alerts {
        for (entity, _, object, mut dispatch, ..) in actors.iter_mut() {
            let state = &mut dispatch.state;
            if entity == alert.source
                || !state.flags.contains(DispatchFlags::NPC)
                || state.alert_group != alert.group
                || state.faction != alert.faction
                || object.pos.dist_xz(&alert.pos) > radius
            {
                continue;
            }
            if state.wake() {
                state.last_player_pos = player.pos;
                debug!("{:?}: alerted by {:?}", entity, alert.source);
            }
        }
    }
}
