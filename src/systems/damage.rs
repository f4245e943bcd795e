//! Damage module behaviour.
//!
//! The module has no explicit state. Messages subtract hit points and start
//! the pain or death reaction; the periodic update finishes a death once the
//! body rests on the floor (or immediately when crushed) and releases the
//! stun freeze.
//!
//! Death is final: once `DEAD` is set every later message is ignored and
//! the update returns [`TICK_NEVER`], so an actor leaves exactly one set of
//! remains.

use log::debug;

use crate::components::animation::{AnimAction, AnimPriority};
use crate::components::damage::{DamageFlags, DamageModule};
use crate::components::dispatch::{ActorState, DispatchFlags, Faction};
use crate::components::module::{ActorContext, ActorParts, ModuleBehavior, ModuleHeader, ModuleKind};
use crate::components::remains::{Corpse, Effect, Pickup, Remains};
use crate::components::target::{ActorTarget, TargetFlags};
use crate::events::message::MessageKind;
use crate::fixed::{Fixed, FixedVec3, TICK_NEVER, Tick, dist_approx};
use crate::resources::aiconfig::AiConfig;

/// Knockback impulse of `force` along `(dx, dz)`, scaled by `percent`.
pub fn knockback(dx: Fixed, dz: Fixed, force: Fixed, percent: u32) -> FixedVec3 {
    let len = dist_approx(dx, dz);
    if !len.is_positive() || !force.is_positive() || percent == 0 {
        return FixedVec3::ZERO;
    }
    let strength = force.scale(Fixed::from_int(percent as i32), Fixed::from_int(100));
    FixedVec3::new(dx.scale(strength, len), Fixed::ZERO, dz.scale(strength, len))
}

/// Damage actually taken from `raw`, after difficulty scaling and
/// friendly-fire halving.
pub fn mitigate(raw: Fixed, source: Option<Faction>, victim: Faction, config: &AiConfig) -> Fixed {
    let scaled = config.scale_damage(raw);
    if source == Some(victim) {
        scaled.half()
    } else {
        scaled
    }
}

impl DamageModule {
    fn start_dying(&mut self, parts: &mut ActorParts<'_>, ctx: &mut ActorContext<'_>) {
        if self.is_dying() {
            return;
        }
        self.flags.insert(DamageFlags::DYING);
        self.flags.remove(DamageFlags::STUNNED);
        parts.state.flags.insert(DispatchFlags::DYING);
        parts.state.flags.remove(DispatchFlags::MOVING | DispatchFlags::FLYING | DispatchFlags::STUNNED);
        parts.update_target(&ActorTarget::default().frozen());
        let def = parts.state.anim_for(AnimAction::Die1);
        ctx.request_animation(AnimPriority::Death, &def);
        ctx.effects.sound(self.params.die_sound.as_deref(), parts.object.pos);
        debug!("{:?}: dying", ctx.entity);
    }

    fn hurt(&mut self, parts: &mut ActorParts<'_>, ctx: &mut ActorContext<'_>, impulse: FixedVec3) {
        if !impulse.is_zero() {
            parts.state.kin.push(impulse);
        }
        let freeze = ActorTarget {
            flags: TargetFlags::FREEZE,
            ..Default::default()
        };
        parts.update_target(&freeze);
        self.flags.insert(DamageFlags::STUNNED);
        parts.state.flags.insert(DispatchFlags::STUNNED);
        self.stun_until = ctx.after(self.stun_ticks);

        let def = parts.state.anim_for(AnimAction::Hurt);
        ctx.request_animation(AnimPriority::Hurt, &def);
        ctx.effects.sound(self.params.hurt_sound.as_deref(), parts.object.pos);
    }

    fn die(&mut self, parts: &mut ActorParts<'_>, ctx: &mut ActorContext<'_>) -> Tick {
        let object = &*parts.object;
        let (pos, yaw, sector) = (object.pos, object.yaw, object.sector);
        if let Some(kind) = self.params.death_effect {
            ctx.effects.spawn(Remains::Effect(Effect { kind }), pos, yaw, sector);
        }
        if let Some(item) = self.params.drop {
            ctx.effects.spawn(Remains::Pickup(Pickup { item }), pos, yaw, sector);
        }
        if self.params.corpse {
            let def = parts.state.anim_for(AnimAction::Die1);
            let corpse = Corpse {
                species: parts.state.species.clone(),
                anim_id: def.anim_id,
                frame: def.frame_count.saturating_sub(1),
            };
            ctx.effects.spawn(Remains::Corpse(corpse), pos, yaw, sector);
        }
        self.flags.insert(DamageFlags::DEAD);
        parts.state.flags.insert(DispatchFlags::DEAD);
        ctx.kill();
        debug!("{:?}: dead at {:?}", ctx.entity, pos);
        TICK_NEVER
    }
}

impl ModuleBehavior for DamageModule {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Damage
    }

    fn header(&self) -> &ModuleHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut ModuleHeader {
        &mut self.header
    }

    fn update(&mut self, parts: &mut ActorParts<'_>, ctx: &mut ActorContext<'_>) -> Tick {
        if self.is_dead() {
            return TICK_NEVER;
        }
        if self.hp <= Fixed::ZERO {
            self.start_dying(parts, ctx);
            if parts.state.kin.on_floor || self.flags.contains(DamageFlags::CRUSHED) {
                return self.die(parts, ctx);
            }
            return ctx.after(1);
        }
        if self.flags.contains(DamageFlags::STUNNED) {
            if ctx.tick < self.stun_until {
                return self.stun_until;
            }
            self.flags.remove(DamageFlags::STUNNED);
            parts.state.flags.remove(DispatchFlags::STUNNED);
            if parts.state.flags.contains(DispatchFlags::MOVING) {
                parts.update_target(&ActorTarget::default());
            }
        }
        TICK_NEVER
    }

    fn handle_message(&mut self, message: &MessageKind, parts: &mut ActorParts<'_>, ctx: &mut ActorContext<'_>) {
        if self.is_dead() || self.hp <= Fixed::ZERO {
            return;
        }
        match message {
            MessageKind::Damage(_) | MessageKind::Explosion(_) => {
                let Some((raw, faction)) = message.damage() else {
                    return;
                };
                let taken = mitigate(raw, faction, parts.state.faction, ctx.config);
                self.hp -= taken;
                parts.state.last_attacker = message.source().or(parts.state.last_attacker);

                let impulse = match message {
                    MessageKind::Damage(hit) => {
                        knockback(hit.velocity.x, hit.velocity.z, hit.force, self.params.knockback)
                    }
                    MessageKind::Explosion(blast) => knockback(
                        parts.object.pos.x - blast.origin.x,
                        parts.object.pos.z - blast.origin.z,
                        blast.force,
                        self.params.knockback,
                    ),
                    _ => FixedVec3::ZERO,
                };
                debug!("{:?}: took {} (hp {})", ctx.entity, taken, self.hp);
                if self.hp <= Fixed::ZERO {
                    parts.state.kin.push(impulse);
                    self.start_dying(parts, ctx);
                } else {
                    self.hurt(parts, ctx, impulse);
                }
            }
            MessageKind::TerminalVelocity => {
                self.hp = Fixed::ZERO;
                self.start_dying(parts, ctx);
            }
            MessageKind::Crush => {
                self.hp = Fixed::ZERO;
                self.flags.insert(DamageFlags::CRUSHED);
                self.start_dying(parts, ctx);
            }
            MessageKind::Wakeup | MessageKind::Free => return,
        }
        self.header.next_tick = ctx.tick;
    }

    fn compute_attributes(&mut self, state: &ActorState) {
        self.stun_ticks = state.anim_for(AnimAction::Hurt).duration_ticks();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::remains::EffectKind;
    use crate::events::message::{ExplosionHit, ProjectileHit};
    use crate::events::projectile::ProjectileKind;
    use crate::systems::fixture::Fixture;

    fn hit(damage: i32) -> MessageKind {
        MessageKind::Damage(ProjectileHit::new(Fixed::from_int(damage), ProjectileKind::RifleBolt))
    }

    fn grounded_fixture() -> Fixture {
        let mut fx = Fixture::new(FixedVec3::from_ints(0, 0, 50));
        fx.state.kin.on_floor = true;
        fx
    }

    #[test]
    fn lethal_hit_leaves_one_corpse() {
        let mut fx = grounded_fixture();
        let mut module = DamageModule::new(Fixed::from_int(4));
        {
            let (mut parts, mut ctx) = fx.split(10);
            module.handle_message(&hit(5), &mut parts, &mut ctx);
            assert_eq!(ctx.take_anim_request().map(|r| r.priority), Some(AnimPriority::Death));
        }
        assert!(module.hp <= Fixed::ZERO);
        assert_eq!(module.header.next_tick, 10);

        {
            let (mut parts, mut ctx) = fx.split(10);
            assert_eq!(module.update(&mut parts, &mut ctx), TICK_NEVER);
            assert!(ctx.is_killed());
        }
        {
            let (mut parts, mut ctx) = fx.split(11);
            module.handle_message(&hit(5), &mut parts, &mut ctx);
            assert_eq!(module.update(&mut parts, &mut ctx), TICK_NEVER);
            assert!(!ctx.is_killed());
        }
        let corpses = fx
            .effects
            .spawns
            .iter()
            .filter(|s| matches!(s.remains, Remains::Corpse(_)))
            .count();
        assert_eq!(corpses, 1);
        assert!(fx.state.is_dead());
    }

    #[test]
    fn dying_waits_for_the_floor() {
        let mut fx = Fixture::new(FixedVec3::from_ints(0, 0, 50));
        let mut module = DamageModule::new(Fixed::from_int(4));
        let (mut parts, mut ctx) = fx.split(3);
        module.handle_message(&hit(5), &mut parts, &mut ctx);
        assert_eq!(module.update(&mut parts, &mut ctx), 4);
        assert!(!ctx.is_killed());
        assert!(fx.effects.spawns.is_empty());
        assert!(fx.state.flags.contains(DispatchFlags::DYING));
    }

    #[test]
    fn crush_kills_mid_air() {
        let mut fx = Fixture::new(FixedVec3::from_ints(0, 0, 50));
        let mut module = DamageModule::new(Fixed::from_int(40));
        let (mut parts, mut ctx) = fx.split(0);
        module.handle_message(&MessageKind::Crush, &mut parts, &mut ctx);
        module.update(&mut parts, &mut ctx);
        assert!(ctx.is_killed());
    }

    #[test]
    fn friendly_fire_is_halved() {
        let mut fx = grounded_fixture();
        fx.state.faction = Faction::Imperial;
        let mut module = DamageModule::new(Fixed::from_int(20));
        let friendly = MessageKind::Damage(
            ProjectileHit::new(Fixed::from_int(10), ProjectileKind::RifleBolt)
                .from_source(bevy_ecs::prelude::Entity::PLACEHOLDER, Faction::Imperial),
        );
        let (mut parts, mut ctx) = fx.split(0);
        module.handle_message(&friendly, &mut parts, &mut ctx);
        assert_eq!(module.hp, Fixed::from_int(15));
    }

    #[test]
    fn drops_and_effects_are_spawned() {
        let mut fx = grounded_fixture();
        let mut module = DamageModule::new(Fixed::ONE);
        module.params.drop = Some(crate::components::remains::ItemKind::PowerCell);
        module.params.death_effect = Some(EffectKind::SmallExplosion);
        module.params.corpse = false;
        let (mut parts, mut ctx) = fx.split(0);
        module.handle_message(&hit(2), &mut parts, &mut ctx);
        module.update(&mut parts, &mut ctx);
        let kinds: Vec<_> = fx.effects.spawns.iter().map(|s| s.remains.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                Remains::Effect(Effect { kind: EffectKind::SmallExplosion }),
                Remains::Pickup(Pickup {
                    item: crate::components::remains::ItemKind::PowerCell
                }),
            ]
        );
    }

    #[test]
    fn stun_freezes_then_releases() {
        let mut fx = grounded_fixture();
        let mut module = DamageModule::new(Fixed::from_int(20));
        module.stun_ticks = 30;
        {
            let (mut parts, mut ctx) = fx.split(100);
            module.handle_message(&hit(1), &mut parts, &mut ctx);
            assert_eq!(module.update(&mut parts, &mut ctx), 130);
        }
        assert!(fx.movement.target.is_frozen());
        let (mut parts, mut ctx) = fx.split(130);
        assert_eq!(module.update(&mut parts, &mut ctx), TICK_NEVER);
        assert!(!fx.movement.target.is_frozen());
    }

    #[test]
    fn stunned_actor_stays_frozen_through_its_other_modules() {
        use crate::components::attack::{AttackModule, AttackParams, AttackState};
        use crate::components::thinker::{ThinkerModule, ThinkerState};

        let mut fx = grounded_fixture();
        fx.state.flags.insert(DispatchFlags::PLAYER_VISIBLE);
        let mut module = DamageModule::new(Fixed::from_int(20));
        module.stun_ticks = 30;
        let mut attack = AttackModule::new(AttackParams::default());
        let mut thinker = ThinkerModule::default();
        {
            let (mut parts, mut ctx) = fx.split(100);
            module.handle_message(&hit(1), &mut parts, &mut ctx);
            module.update(&mut parts, &mut ctx);
            assert_eq!(attack.update(&mut parts, &mut ctx), 101);
            assert_eq!(thinker.update(&mut parts, &mut ctx), 101);
        }
        assert!(fx.state.is_stunned());
        assert!(fx.movement.target.is_frozen());
        assert!(!fx.movement.target.flags.contains(TargetFlags::MOVE_XZ));
        assert_eq!(attack.state, AttackState::Delay);
        assert_eq!(thinker.state, ThinkerState::Turn);

        let (mut parts, mut ctx) = fx.split(130);
        module.update(&mut parts, &mut ctx);
        thinker.update(&mut parts, &mut ctx);
        assert!(!fx.state.is_stunned());
        assert!(!fx.movement.target.is_frozen());
        assert!(fx.movement.target.flags.contains(TargetFlags::MOVE_XZ));
        assert_eq!(thinker.state, ThinkerState::Move);
    }

    #[test]
    fn explosions_push_away_from_origin() {
        let mut fx = grounded_fixture();
        let mut module = DamageModule::new(Fixed::from_int(20));
        let blast = MessageKind::Explosion(ExplosionHit::new(
            Fixed::from_int(3),
            Fixed::from_int(10),
            FixedVec3::from_ints(-5, 0, 0),
        ));
        let (mut parts, mut ctx) = fx.split(0);
        module.handle_message(&blast, &mut parts, &mut ctx);
        assert_eq!(fx.state.kin.velocity.x, Fixed::from_int(10));
        assert_eq!(module.hp, Fixed::from_int(17));
    }
}
