//! Boss scheduler.
//!
//! Every boss is a [`PhysicsActor`] whose behaviour is a table of per-state
//! handlers ([`BossBehavior`]). [`run_boss_tick`] is the single scheduler
//! they all share:
//!
//! 1. drain the inbox through the boss's message hook (`Free` ends it);
//! 2. if the current [`Wait`] is satisfied, call the handler for `state` and
//!    apply the [`BossStep`] it returns;
//! 3. integrate physics, step the movement module and advance the
//!    animation.
//!
//! State indices [`IDLE`] and [`DYING`] are common to every boss and handled
//! by [`idle`] and [`dying`]; boss-specific states start at [`AWAKE`].
//! Handler locals live in [`BossLocals`](crate::components::physicsactor::BossLocals)
//! so a boss can be saved between any two ticks.

pub mod bobafett;
pub mod kelldragon;
pub mod mousebot;
pub mod phaseone;
pub mod phasethree;
pub mod phasetwo;
pub mod turret;
pub mod welder;

use bevy_ecs::prelude::*;
use log::{debug, error};

use crate::components::animation::{AnimAction, RenderFrame};
use crate::components::inbox::Inbox;
use crate::components::module::ActorContext;
use crate::components::physicsactor::{BossKind, PhysicsActor, Wait};
use crate::components::remains::{Corpse, Effect, EffectKind, Pickup, Remains};
use crate::components::target::{ActorTarget, update_target};
use crate::components::worldobject::{ObjectId, WorldObject};
use crate::events::audio::SoundCue;
use crate::events::message::MessageKind;
use crate::events::player::PlayerHit;
use crate::events::projectile::{ProjectileKind, ProjectileSpawn, aim_arcing, aim_at_target};
use crate::fixed::{Fixed, FixedVec3, dist_approx};
use crate::systems::animation::commit;
use crate::systems::attack::muzzle_position;
use crate::systems::damage::{knockback, mitigate};
use crate::systems::dispatch::{ActorWorld, EffectSink, sees_player};
use crate::systems::movement::{integrate_physics, update_movement};

/// Dormant, waiting to notice the player.
pub const IDLE: u32 = 0;
/// Death sequence.
pub const DYING: u32 = 1;
/// First boss-specific state, entered on waking.
pub const AWAKE: u32 = 2;

/// Ticks between idle sight checks.
const IDLE_POLL: u32 = 72;
/// Aim jitter for boss fire, angle units.
const BOSS_SPREAD: i32 = 128;

/// The actor and the boss record a handler works on.
pub struct BossParts<'a> {
    pub object: &'a mut WorldObject,
    pub boss: &'a mut PhysicsActor,
}

/// What a handler wants to happen next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossStep {
    /// Stay in the current state until the wait is over.
    Stay(Wait),
    /// Enter another state once the wait is over.
    Goto(u32, Wait),
    /// The boss is gone.
    Finish,
}

pub type BossHandler = fn(&mut BossParts<'_>, &mut ActorContext<'_>) -> BossStep;
pub type MessageHook = fn(&MessageKind, &mut BossParts<'_>, &mut ActorContext<'_>);

/// Static behaviour of one boss kind.
pub struct BossBehavior {
    pub name: &'static str,
    /// Indexed by `PhysicsActor::state`.
    pub handlers: &'static [BossHandler],
    pub on_message: MessageHook,
}

pub fn behavior(kind: BossKind) -> &'static BossBehavior {
    match kind {
        BossKind::BobaFett => &bobafett::BEHAVIOR,
        BossKind::KellDragon => &kelldragon::BEHAVIOR,
        BossKind::PhaseOne => &phaseone::BEHAVIOR,
        BossKind::PhaseTwo => &phasetwo::BEHAVIOR,
        BossKind::PhaseThree => &phasethree::BEHAVIOR,
        BossKind::Turret => &turret::BEHAVIOR,
        BossKind::Welder => &welder::BEHAVIOR,
        BossKind::MouseBot => &mousebot::BEHAVIOR,
    }
}

/// Mounted bosses never fall and die where they hang.
pub fn is_anchored(kind: BossKind) -> bool {
    matches!(kind, BossKind::Turret | BossKind::Welder)
}

/// How a boss tick ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossOutcome {
    Alive,
    /// Died and left its remains.
    Finished,
    /// Removed by a `Free` message.
    Freed,
}

fn wait_satisfied(wait: Wait, boss: &PhysicsActor, ctx: &ActorContext<'_>) -> bool {
    match wait {
        Wait::Ready => true,
        Wait::Until(tick) => ctx.tick >= tick,
        Wait::Animation => boss.anim.is_ready(),
        Wait::Landed => boss.kin.on_floor,
    }
}

/// Run one tick of a boss.
pub fn run_boss_tick(
    parts: &mut BossParts<'_>,
    messages: impl IntoIterator<Item = MessageKind>,
    ctx: &mut ActorContext<'_>,
) -> BossOutcome {
    let behavior = behavior(parts.boss.kind);
    for message in messages {
        if message == MessageKind::Free {
            return BossOutcome::Freed;
        }
        (behavior.on_message)(&message, parts, ctx);
    }
    if !parts.boss.alive {
        return BossOutcome::Finished;
    }

    if wait_satisfied(parts.boss.wait, parts.boss, ctx) {
        let state = parts.boss.state;
        let step = match behavior.handlers.get(state as usize) {
            Some(handler) => handler(parts, ctx),
            None => {
                error!("{}: no handler for state {}, resetting", behavior.name, state);
                BossStep::Goto(IDLE, Wait::Ready)
            }
        };
        match step {
            BossStep::Stay(wait) => parts.boss.wait = wait,
            BossStep::Goto(next, wait) => {
                debug!("{} {:?}: state {} -> {}", behavior.name, ctx.entity, parts.boss.state, next);
                parts.boss.state = next;
                parts.boss.state_tick = ctx.tick;
                parts.boss.wait = wait;
            }
            BossStep::Finish => {
                parts.boss.alive = false;
                return BossOutcome::Finished;
            }
        }
    }

    let boss = &mut *parts.boss;
    let dt = ctx.delta_ticks;
    if !is_anchored(boss.kind) {
        integrate_physics(parts.object, &mut boss.kin, boss.flying, ctx.config.gravity(), ctx.collision, dt);
    }
    update_movement(&mut boss.movement, parts.object, ctx.collision, boss.flying, dt);
    boss.anim.advance(dt);
    BossOutcome::Alive
}

// Helpers shared by the handler tables.

pub fn dist_to_player(parts: &BossParts<'_>, ctx: &ActorContext<'_>) -> Fixed {
    dist_approx(
        ctx.player.pos.x - parts.object.pos.x,
        ctx.player.pos.z - parts.object.pos.z,
    )
}

/// Line of sight to the player; remembers where the player was seen.
pub fn see_player(parts: &mut BossParts<'_>, ctx: &ActorContext<'_>) -> bool {
    let seen = sees_player(parts.object, ctx.player, ctx.collision, ctx.config);
    if seen {
        parts.boss.last_player_pos = ctx.player.pos;
    }
    seen
}

pub fn set_target(parts: &mut BossParts<'_>, target: &ActorTarget) {
    update_target(&mut parts.boss.movement.target, target);
}

pub fn face_player(parts: &mut BossParts<'_>, ctx: &ActorContext<'_>) {
    let yaw = parts.object.pos.angle_to(&ctx.player.pos);
    let target = ActorTarget::facing(yaw, parts.boss.profile.speed_rot);
    set_target(parts, &target);
}

/// Walk (or fly, keeping height) towards `point` at `speed`.
pub fn move_to(parts: &mut BossParts<'_>, point: FixedVec3, speed: Fixed) {
    let yaw = parts.object.pos.angle_to(&point);
    let target = ActorTarget::position(point, speed).with_facing(yaw, parts.boss.profile.speed_rot);
    set_target(parts, &target);
}

pub fn hover_at(parts: &mut BossParts<'_>, height: Fixed) {
    let target = ActorTarget::default().with_height(height, parts.boss.profile.speed_vert);
    set_target(parts, &target);
}

pub fn hold_position(parts: &mut BossParts<'_>) {
    set_target(parts, &ActorTarget::default().frozen());
}

/// Launch `kind` at the player from the profile's muzzle offset.
pub fn fire(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>, kind: ProjectileKind) {
    let muzzle = muzzle_position(&parts.object.pos, parts.object.yaw, &parts.boss.profile.fire_offset);
    let aim_point = ctx.player.chest();
    let speed = kind.speed();
    let (yaw, mut pitch) = aim_at_target(&muzzle, &aim_point);
    if kind.is_arcing() {
        pitch = aim_arcing(&muzzle, &aim_point, speed, ctx.config.gravity());
    }
    ctx.effects.projectiles.push(ProjectileSpawn {
        kind,
        sector: parts.object.sector,
        pos: muzzle,
        yaw: yaw.offset(ctx.rng.spread(BOSS_SPREAD)),
        pitch,
        speed,
        owner: ctx.entity,
        owner_faction: parts.boss.faction,
    });
    ctx.effects.sound(parts.boss.profile.attack_sound.as_deref(), muzzle);
}

/// Strike the player if in reach. Returns whether it landed.
pub fn melee(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> bool {
    if !ctx.player.alive || dist_to_player(parts, ctx) > parts.boss.profile.melee_range {
        return false;
    }
    ctx.effects.player_hits.push(PlayerHit {
        damage: parts.boss.profile.melee_damage,
        kind: ProjectileKind::Punch,
        source: ctx.entity,
    });
    ctx.effects.sound(parts.boss.profile.attack_sound.as_deref(), parts.object.pos);
    true
}

/// Leave `IDLE` for the boss's first active state.
pub fn wake_up(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) {
    if parts.boss.state != IDLE {
        return;
    }
    parts.boss.state = AWAKE;
    parts.boss.state_tick = ctx.tick;
    parts.boss.wait = Wait::Ready;
    parts.boss.last_player_pos = ctx.player.pos;
    ctx.effects.sound(parts.boss.profile.alert_sound.as_deref(), parts.object.pos);
    ctx.effects.sounds.push(SoundCue::CombatMusic);
    debug!("{:?}: boss awake", ctx.entity);
}

/// Switch to the death sequence. Safe to call more than once.
pub fn enter_dying(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) {
    if parts.boss.state == DYING {
        return;
    }
    parts.boss.hp = parts.boss.hp.min(Fixed::ZERO);
    parts.boss.state = DYING;
    parts.boss.state_tick = ctx.tick;
    parts.boss.wait = Wait::Animation;
    hold_position(parts);
    parts.boss.play(AnimAction::Die1);
    ctx.effects.sound(parts.boss.profile.die_sound.as_deref(), parts.object.pos);
    debug!("{:?}: boss dying", ctx.entity);
}

/// Apply a damage or explosion message. Returns the hit points taken.
pub fn take_damage(message: &MessageKind, parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> Option<Fixed> {
    if !parts.boss.alive || parts.boss.is_dying() {
        return None;
    }
    let (raw, faction) = message.damage()?;
    let taken = mitigate(raw, faction, parts.boss.faction, ctx.config);
    parts.boss.hp -= taken;
    parts.boss.last_attacker = message.source().or(parts.boss.last_attacker);

    if !is_anchored(parts.boss.kind) {
        let impulse = match message {
            MessageKind::Damage(hit) => knockback(hit.velocity.x, hit.velocity.z, hit.force, 100),
            MessageKind::Explosion(blast) => knockback(
                parts.object.pos.x - blast.origin.x,
                parts.object.pos.z - blast.origin.z,
                blast.force,
                100,
            ),
            _ => FixedVec3::ZERO,
        };
        parts.boss.kin.push(impulse);
    }

    if parts.boss.hp <= Fixed::ZERO {
        enter_dying(parts, ctx);
    } else {
        ctx.effects.sound(parts.boss.profile.hurt_sound.as_deref(), parts.object.pos);
        wake_up(parts, ctx);
    }
    Some(taken)
}

/// Message hook used by bosses without special pain handling.
pub fn on_message(message: &MessageKind, parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) {
    match message {
        MessageKind::Wakeup => wake_up(parts, ctx),
        MessageKind::Damage(_) | MessageKind::Explosion(_) => {
            take_damage(message, parts, ctx);
        }
        MessageKind::TerminalVelocity | MessageKind::Crush => {
            if parts.boss.alive {
                parts.boss.hp = Fixed::ZERO;
                enter_dying(parts, ctx);
            }
        }
        MessageKind::Free => {}
    }
}

/// Shared `IDLE` handler: poll for the player in front or close by.
pub fn idle(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> BossStep {
    parts.boss.loop_anim(AnimAction::Idle);
    let close = dist_to_player(parts, ctx) <= ctx.config.aware_range();
    let yaw_to = parts.object.pos.angle_to(&ctx.player.pos);
    let in_front = parts.object.yaw.delta_to(yaw_to).abs() <= ctx.config.fov() / 2;
    if ctx.player.alive && (close || (in_front && see_player(parts, ctx))) {
        wake_up(parts, ctx);
        return BossStep::Goto(AWAKE, Wait::Ready);
    }
    BossStep::Stay(Wait::Until(ctx.after(IDLE_POLL)))
}

/// Shared `DYING` handler: once the death animation has played and the body
/// rests on the floor, leave remains and finish.
pub fn dying(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> BossStep {
    let anchored = is_anchored(parts.boss.kind);
    if !anchored && !parts.boss.kin.on_floor {
        parts.boss.flying = false;
        return BossStep::Stay(Wait::Landed);
    }

    let object = &*parts.object;
    let (pos, yaw, sector) = (object.pos, object.yaw, object.sector);
    let profile = &parts.boss.profile;
    let sunk = !anchored && parts.boss.kin.floor_is_liquid;
    let effect = if sunk { Some(EffectKind::Splash) } else { profile.death_effect };
    if let Some(kind) = effect {
        ctx.effects.spawn(Remains::Effect(Effect { kind }), pos, yaw, sector);
    }
    if let Some(item) = profile.drop {
        ctx.effects.spawn(Remains::Pickup(Pickup { item }), pos, yaw, sector);
    }
    if profile.corpse && !sunk {
        let def = parts.boss.anim_table.get(AnimAction::Die1);
        let corpse = Corpse {
            species: behavior(parts.boss.kind).name.to_string(),
            anim_id: def.anim_id,
            frame: def.frame_count.saturating_sub(1),
        };
        ctx.effects.spawn(Remains::Corpse(corpse), pos, yaw, sector);
    }
    debug!("{:?}: boss dead", ctx.entity);
    BossStep::Finish
}

/// Drive every boss through one tick, after the generic actors.
///
/// Contract
/// - Reads [`SimClock`](crate::resources::simclock::SimClock); does nothing
///   while `delta_ticks` is zero.
/// - Visits bosses in [`ObjectId`] order.
/// - Despawns bosses that finished dying or were freed; writes the same
///   outbound messages as the generic pass.
pub fn physics_actor_system(
    mut bosses: Query<(
        Entity,
        &ObjectId,
        &mut WorldObject,
        &mut PhysicsActor,
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

    let mut order: Vec<(ObjectId, Entity)> = bosses.iter().map(|(entity, id, ..)| (*id, entity)).collect();
    order.sort_unstable();

    let mut effects = crate::events::effects::ActorEffects::default();
    let collision = sim.collision.service();
    let player = &*sim.player;
    let config = &*sim.config;
    let rng = &mut *sim.rng;

    for (id, entity) in order {
        let Ok((_, _, mut object, mut boss, mut inbox, mut frame)) = bosses.get_mut(entity) else {
            continue;
        };
        let mut ctx = ActorContext::new(entity, now, dt, player, collision, config, &mut *rng, &mut effects);
        let mut parts = BossParts {
            object: &mut object,
            boss: &mut boss,
        };
        match run_boss_tick(&mut parts, inbox.take(), &mut ctx) {
            BossOutcome::Alive => commit(&boss.anim, &mut frame),
            BossOutcome::Finished | BossOutcome::Freed => sink.despawn(entity, id),
        }
    }

    // Bosses do not call for help; only their messages and remains matter.
    let _ = sink.flush(effects);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::components::animation::AnimTable;
    use crate::components::physicsactor::BossProfile;
    use crate::events::effects::ActorEffects;
    use crate::fixed::{Angle, Tick};
    use crate::resources::aiconfig::AiConfig;
    use crate::resources::collision::OpenArena;
    use crate::resources::player::PlayerState;
    use crate::resources::rng::SimRng;

    /// Everything a boss tick needs, outside the ECS.
    pub struct BossFixture {
        pub player: PlayerState,
        pub arena: OpenArena,
        pub config: AiConfig,
        pub rng: SimRng,
        pub effects: ActorEffects,
        pub object: WorldObject,
        pub boss: PhysicsActor,
    }

    impl BossFixture {
        pub fn new(kind: BossKind, hp: i32, player: FixedVec3) -> Self {
            let mut boss = PhysicsActor::new(kind, Fixed::from_int(hp), BossProfile::default(), AnimTable::default());
            boss.kin.on_floor = true;
            Self {
                player: PlayerState::at(player),
                arena: OpenArena::new(500),
                config: AiConfig::new(),
                rng: SimRng::with_seed(7),
                effects: ActorEffects::default(),
                object: WorldObject::new(FixedVec3::ZERO, Angle::ZERO, 0),
                boss,
            }
        }

        pub fn tick(&mut self, tick: Tick, messages: Vec<MessageKind>) -> BossOutcome {
            let mut ctx = ActorContext::new(
                Entity::PLACEHOLDER,
                tick,
                1,
                &self.player,
                &self.arena,
                &self.config,
                &mut self.rng,
                &mut self.effects,
            );
            let mut parts = BossParts {
                object: &mut self.object,
                boss: &mut self.boss,
            };
            run_boss_tick(&mut parts, messages, &mut ctx)
        }

        /// Run only the message hook.
        pub fn deliver(&mut self, tick: Tick, message: MessageKind) {
            let mut ctx = ActorContext::new(
                Entity::PLACEHOLDER,
                tick,
                1,
                &self.player,
                &self.arena,
                &self.config,
                &mut self.rng,
                &mut self.effects,
            );
            let mut parts = BossParts {
                object: &mut self.object,
                boss: &mut self.boss,
            };
            (behavior(parts.boss.kind).on_message)(&message, &mut parts, &mut ctx);
        }

        /// Tick until `done` holds or `limit` ticks pass; returns the last tick run.
        pub fn run_until(&mut self, from: Tick, limit: u32, done: impl Fn(&Self) -> bool) -> Tick {
            let mut tick = from;
            while tick < from + limit {
                if done(self) {
                    return tick;
                }
                self.tick(tick, Vec::new());
                tick += 1;
            }
            tick
        }
    }

    #[test]
    fn every_kind_has_idle_and_dying() {
        let kinds = [
            BossKind::BobaFett,
            BossKind::KellDragon,
            BossKind::PhaseOne,
            BossKind::PhaseTwo,
            BossKind::PhaseThree,
            BossKind::Turret,
            BossKind::Welder,
            BossKind::MouseBot,
        ];
        for kind in kinds {
            let table = behavior(kind);
            assert!(table.handlers.len() > AWAKE as usize, "{}", table.name);
            assert_eq!(table.handlers[DYING as usize] as usize, dying as BossHandler as usize, "{}", table.name);
        }
    }

    #[test]
    fn close_player_wakes_boss() {
        let mut fx = BossFixture::new(BossKind::PhaseOne, 60, FixedVec3::from_ints(0, 0, 10));
        assert_eq!(fx.tick(0, Vec::new()), BossOutcome::Alive);
        assert!(fx.boss.state >= AWAKE);
        assert!(fx.effects.sounds.contains(&SoundCue::CombatMusic));
    }

    #[test]
    fn unknown_state_resets_to_idle() {
        let mut fx = BossFixture::new(BossKind::Turret, 20, FixedVec3::from_ints(0, 0, 400));
        fx.boss.state = 99;
        fx.tick(0, Vec::new());
        assert_eq!(fx.boss.state, IDLE);
    }

    #[test]
    fn lethal_damage_leaves_one_corpse() {
        let mut fx = BossFixture::new(BossKind::PhaseOne, 10, FixedVec3::from_ints(0, 0, 300));
        let hit = MessageKind::Damage(crate::events::message::ProjectileHit::new(
            Fixed::from_int(20),
            ProjectileKind::RifleBolt,
        ));
        fx.tick(0, vec![hit.clone()]);
        assert_eq!(fx.boss.state, DYING);
        let mut outcome = BossOutcome::Alive;
        for tick in 1..10 {
            outcome = fx.tick(tick, vec![hit.clone()]);
            if outcome != BossOutcome::Alive {
                break;
            }
        }
        assert_eq!(outcome, BossOutcome::Finished);
        assert!(!fx.boss.alive);
        let corpses = fx
            .effects
            .spawns
            .iter()
            .filter(|s| matches!(s.remains, Remains::Corpse(_)))
            .count();
        assert_eq!(corpses, 1);
        assert_eq!(fx.tick(20, vec![hit]), BossOutcome::Finished);
    }

    #[test]
    fn free_message_removes_boss() {
        let mut fx = BossFixture::new(BossKind::Welder, 25, FixedVec3::from_ints(0, 0, 300));
        assert_eq!(fx.tick(0, vec![MessageKind::Free]), BossOutcome::Freed);
    }
}
