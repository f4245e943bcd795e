//! Attack module behaviour.
//!
//! The module cycles through
//! `Delay → Decide → {Attack1 | Attack2} → {Animate1 | Animate2} → Delay`:
//!
//! - `Delay` lets the actor walk again and waits a randomized cool-down.
//! - `Decide` checks sight, distance and pitch to the player and picks melee
//!   (preferred inside melee range) or ranged fire, or gives up.
//! - `Attack1`/`Attack2` deliver the strike or launch the projectile once the
//!   wind-up animation has played.
//! - `Animate1`/`Animate2` wait out the follow-through animation.
//!
//! While attacking, the dispatch `MOVING` flag is cleared and the movement
//! target is frozen facing the player. A stunned actor's cycle is paused
//! until the stun wears off.

use log::debug;

use crate::components::animation::{AnimAction, AnimPriority};
use crate::components::attack::{AttackFlags, AttackModule, AttackState};
use crate::components::dispatch::{ActorState, DispatchFlags};
use crate::components::module::{ActorContext, ActorParts, ModuleBehavior, ModuleHeader, ModuleKind};
use crate::components::target::ActorTarget;
use crate::events::message::MessageKind;
use crate::events::player::PlayerHit;
use crate::events::projectile::{ProjectileKind, ProjectileSpawn, aim_arcing, aim_at_target, lead_target};
use crate::fixed::{Angle, FixedVec3, TICK_NEVER, Tick, angle_dir, dist_approx, vec2_to_angle};

/// World position of `offset` (right, up, forward) relative to a body at
/// `origin` facing `yaw`.
pub fn muzzle_position(origin: &FixedVec3, yaw: Angle, offset: &FixedVec3) -> FixedVec3 {
    let (sin, cos) = angle_dir(yaw);
    FixedVec3::new(
        origin.x + offset.x * cos + offset.z * sin,
        origin.y + offset.y,
        origin.z - offset.x * sin + offset.z * cos,
    )
}

impl AttackModule {
    fn decay_spread(&mut self, tick: Tick) {
        let elapsed = tick.saturating_sub(self.last_tick);
        self.last_tick = tick;
        if !self.in_combat || elapsed == 0 {
            return;
        }
        let decayed = self.fire_spread - self.params.spread_decay.per_ticks(elapsed);
        self.fire_spread = decayed.max(self.params.spread_floor);
    }

    fn abort(&mut self, ctx: &ActorContext<'_>) -> Tick {
        self.state = AttackState::Delay;
        ctx.tick
    }

    fn decide(&mut self, parts: &mut ActorParts<'_>, ctx: &mut ActorContext<'_>) -> Tick {
        if !ctx.player.alive {
            return self.abort(ctx);
        }
        let eye = parts.object.eye();
        if !ctx.collision.line_of_sight(&eye, &ctx.player.eye()) {
            return self.abort(ctx);
        }
        let dist = dist_approx(ctx.player.pos.x - parts.object.pos.x, ctx.player.pos.z - parts.object.pos.z);
        if !self.flying {
            let rise = (ctx.player.chest().y - eye.y).abs();
            if vec2_to_angle(rise, dist).units() > self.params.max_pitch {
                return self.abort(ctx);
            }
        }

        self.in_combat = true;
        let params = &self.params;
        let (next, action) = if params.flags.contains(AttackFlags::MELEE) && dist <= params.melee_range {
            (AttackState::Attack1, AnimAction::Attack1)
        } else if params.flags.contains(AttackFlags::RANGED) && dist > params.min_dist && dist <= params.max_dist {
            (AttackState::Attack2, AnimAction::Attack2)
        } else {
            return self.abort(ctx);
        };
        debug!("{:?}: {:?} -> {:?} at distance {}", ctx.entity, self.state, next, dist);
        self.state = next;

        parts.state.flags.remove(DispatchFlags::MOVING);
        let yaw = parts.object.pos.angle_to(&ctx.player.pos);
        parts.update_target(&ActorTarget::facing(yaw, self.params.speed_rot).frozen());

        let def = parts.state.anim_for(action);
        ctx.request_animation(AnimPriority::Attack, &def);
        ctx.after(def.duration_ticks().max(1))
    }

    fn follow_through(&mut self, parts: &ActorParts<'_>, ctx: &mut ActorContext<'_>, action: AnimAction) -> Tick {
        self.state = match self.state {
            AttackState::Attack1 => AttackState::Animate1,
            _ => AttackState::Animate2,
        };
        let def = parts.state.anim_for(action);
        ctx.request_animation(AnimPriority::Attack, &def);
        ctx.after(def.duration_ticks().max(1))
    }

    fn strike(&mut self, parts: &mut ActorParts<'_>, ctx: &mut ActorContext<'_>) -> Tick {
        let dist = parts.object.pos.dist_xz(&ctx.player.pos);
        if ctx.player.alive && dist <= self.params.melee_range {
            ctx.effects.player_hits.push(PlayerHit {
                damage: self.params.melee_damage,
                kind: ProjectileKind::Punch,
                source: ctx.entity,
            });
            ctx.effects.sound(self.params.melee_sound.as_deref(), parts.object.pos);
        }
        self.follow_through(parts, ctx, AnimAction::Attack1End)
    }

    fn fire(&mut self, parts: &mut ActorParts<'_>, ctx: &mut ActorContext<'_>) -> Tick {
        let params = &self.params;
        let kind = params.projectile;
        let speed = kind.speed();
        let muzzle = muzzle_position(&parts.object.pos, parts.object.yaw, &params.fire_offset);

        let mut aim_point = ctx.player.chest();
        if params.flags.contains(AttackFlags::LEAD) {
            aim_point = lead_target(&muzzle, &aim_point, &ctx.player.velocity, speed);
        }
        let (mut yaw, mut pitch) = aim_at_target(&muzzle, &aim_point);
        if params.flags.contains(AttackFlags::ARCING) || kind.is_arcing() {
            pitch = aim_arcing(&muzzle, &aim_point, speed, ctx.config.gravity());
        }

        let jitter = self.fire_spread.floor();
        yaw = yaw.offset(ctx.rng.spread(jitter));
        pitch = pitch.offset(ctx.rng.spread(jitter / 2));

        ctx.effects.projectiles.push(ProjectileSpawn {
            kind,
            sector: parts.object.sector,
            pos: muzzle,
            yaw,
            pitch,
            speed,
            owner: ctx.entity,
            owner_faction: parts.state.faction,
        });
        ctx.effects.sound(params.fire_sound.as_deref(), muzzle);
        self.follow_through(parts, ctx, AnimAction::Attack2End)
    }
}

impl ModuleBehavior for AttackModule {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Attack
    }

    fn header(&self) -> &ModuleHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut ModuleHeader {
        &mut self.header
    }

    fn update(&mut self, parts: &mut ActorParts<'_>, ctx: &mut ActorContext<'_>) -> Tick {
        if parts.state.is_dying() {
            return TICK_NEVER;
        }
        if parts.state.is_stunned() {
            return ctx.after(1);
        }
        self.decay_spread(ctx.tick);
        match self.state {
            AttackState::Delay => {
                parts.state.flags.insert(DispatchFlags::MOVING);
                parts.update_target(&ActorTarget::default());
                self.state = AttackState::Decide;
                let wait = self.params.delay + ctx.rng.upto(self.params.delay_variation);
                ctx.after(wait)
            }
            AttackState::Decide => self.decide(parts, ctx),
            AttackState::Attack1 => self.strike(parts, ctx),
            AttackState::Attack2 => self.fire(parts, ctx),
            AttackState::Animate1 | AttackState::Animate2 => {
                self.state = AttackState::Delay;
                ctx.tick
            }
        }
    }

    fn handle_message(&mut self, message: &MessageKind, _parts: &mut ActorParts<'_>, _ctx: &mut ActorContext<'_>) {
        if message.is_hostile() {
            self.in_combat = true;
        }
    }

    fn compute_attributes(&mut self, state: &ActorState) {
        self.flying = state.is_flying();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::attack::AttackParams;
    use crate::components::target::TargetFlags;
    use crate::fixed::{Fixed, TICKS_PER_SECOND};
    use crate::systems::fixture::Fixture;

    /// Run the module at its own due ticks until it reaches `state`.
    fn run_until(module: &mut AttackModule, fx: &mut Fixture, state: AttackState, mut tick: Tick) -> Tick {
        for _ in 0..10 {
            if module.state == state {
                return tick;
            }
            let (mut parts, mut ctx) = fx.split(tick);
            tick = module.update(&mut parts, &mut ctx).max(tick + 1);
        }
        panic!("never reached {state:?}");
    }

    #[test]
    fn ranged_attack_fires_one_projectile() {
        let mut fx = Fixture::new(FixedVec3::from_ints(0, 0, 50));
        let mut module = AttackModule::new(AttackParams::ranged(ProjectileKind::RifleBolt));
        let tick = run_until(&mut module, &mut fx, AttackState::Attack2, 0);
        assert!(!fx.state.flags.contains(DispatchFlags::MOVING));
        assert!(fx.movement.target.flags.contains(TargetFlags::FREEZE));

        run_until(&mut module, &mut fx, AttackState::Animate2, tick);
        assert_eq!(fx.effects.projectiles.len(), 1);
        let shot = &fx.effects.projectiles[0];
        assert_eq!(shot.kind, ProjectileKind::RifleBolt);
        assert!(shot.yaw.delta_to(Angle::ZERO).abs() <= 512);
    }

    #[test]
    fn melee_is_preferred_in_range() {
        let mut fx = Fixture::new(FixedVec3::from_ints(0, 0, 5));
        let params = AttackParams::ranged(ProjectileKind::Thermal).with_melee(Fixed::from_int(10), Fixed::from_int(8));
        let mut module = AttackModule::new(params);
        let tick = run_until(&mut module, &mut fx, AttackState::Attack1, 0);
        run_until(&mut module, &mut fx, AttackState::Animate1, tick);
        assert_eq!(fx.effects.player_hits.len(), 1);
        assert_eq!(fx.effects.player_hits[0].damage, Fixed::from_int(10));
        assert!(fx.effects.projectiles.is_empty());
    }

    #[test]
    fn out_of_range_aborts_to_delay() {
        let mut fx = Fixture::new(FixedVec3::from_ints(0, 0, 400));
        let mut module = AttackModule::new(AttackParams::ranged(ProjectileKind::RifleBolt));
        let (mut parts, mut ctx) = fx.split(0);
        let due = module.update(&mut parts, &mut ctx);
        assert_eq!(module.state, AttackState::Decide);
        let (mut parts, mut ctx) = fx.split(due);
        module.update(&mut parts, &mut ctx);
        assert_eq!(module.state, AttackState::Delay);
        assert!(fx.effects.projectiles.is_empty());
    }

    #[test]
    fn delay_resumes_movement() {
        let mut fx = Fixture::new(FixedVec3::from_ints(0, 0, 50));
        fx.state.flags.remove(DispatchFlags::MOVING);
        fx.movement.target.flags |= TargetFlags::FREEZE;
        let mut module = AttackModule::new(AttackParams::default());
        let (mut parts, mut ctx) = fx.split(0);
        module.update(&mut parts, &mut ctx);
        assert!(fx.state.flags.contains(DispatchFlags::MOVING));
        assert!(!fx.movement.target.is_frozen());
    }

    #[test]
    fn spread_decays_to_floor() {
        let mut module = AttackModule::new(AttackParams::default());
        module.in_combat = true;
        module.last_tick = 0;
        module.decay_spread(TICKS_PER_SECOND);
        assert_eq!(module.fire_spread, Fixed::from_int(512 - 96));
        module.decay_spread(TICKS_PER_SECOND * 10);
        assert_eq!(module.fire_spread, Fixed::from_int(64));
    }

    #[test]
    fn muzzle_offset_follows_heading() {
        let offset = FixedVec3::from_ints(0, 4, 2);
        let east = muzzle_position(&FixedVec3::ZERO, Angle::new(Angle::QUARTER), &offset);
        assert_eq!(east.y, Fixed::from_int(4));
        assert!((east.x - Fixed::from_int(2)).abs() <= Fixed(2));
        assert!(east.z.abs() <= Fixed(2));
    }
}
