//! Phase Three dark trooper: Phase Two's rockets and flight, plus a shield
//! that bounces shots back at the player.
//!
//! While the shield is up (`reflect_until` in the future) hits cost no hit
//! points. Outside it each projectile still has `reflect_chance` percent to
//! glance off.

use crate::components::animation::AnimAction;
use crate::components::module::ActorContext;
use crate::components::physicsactor::{BossLocals, PhaseThreeLocals, PhysicsActor, Wait};
use crate::events::message::MessageKind;

use super::phasetwo::{airborne, approach, lift_off, volley};
use super::{AWAKE, BossBehavior, BossParts, BossStep, dying, face_player, fire, hold_position, idle, on_message};

const ADVANCE: u32 = AWAKE;
const ROCKETS: u32 = 3;
const TAKEOFF: u32 = 4;
const FLY: u32 = 5;
const REFLECT: u32 = 6;

const SHIELD_TICKS: u32 = 145;
const SHIELD_CHANCE: u32 = 15;

pub static BEHAVIOR: BossBehavior = BossBehavior {
    name: "phasethree",
    handlers: &[idle, dying, advance, rockets, takeoff, fly, reflect],
    on_message: message,
};

fn locals(boss: &PhysicsActor) -> PhaseThreeLocals {
    match boss.locals {
        BossLocals::PhaseThree(locals) => locals,
        _ => PhaseThreeLocals::default(),
    }
}

fn advance(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> BossStep {
    if let Some(next) = approach(parts, ctx) {
        if next == ROCKETS && ctx.rng.chance(SHIELD_CHANCE) {
            let mut l = locals(parts.boss);
            l.reflect_until = ctx.after(SHIELD_TICKS);
            parts.boss.locals = BossLocals::PhaseThree(l);
            return BossStep::Goto(REFLECT, Wait::Ready);
        }
        return BossStep::Goto(next, Wait::Ready);
    }
    BossStep::Stay(Wait::Until(ctx.after(20)))
}

fn rockets(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> BossStep {
    let mut l = locals(parts.boss);
    let spent = volley(parts, ctx, &mut l.rockets_left);
    parts.boss.locals = BossLocals::PhaseThree(l);
    if spent {
        BossStep::Goto(ADVANCE, Wait::Until(ctx.after(100)))
    } else {
        BossStep::Stay(Wait::Until(ctx.after(36)))
    }
}

fn takeoff(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> BossStep {
    let mut l = locals(parts.boss);
    lift_off(parts, ctx, &mut l.flight_until);
    parts.boss.locals = BossLocals::PhaseThree(l);
    BossStep::Goto(FLY, Wait::Until(ctx.after(30)))
}

fn fly(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> BossStep {
    if airborne(parts, ctx, locals(parts.boss).flight_until) {
        BossStep::Goto(ADVANCE, Wait::Landed)
    } else {
        BossStep::Stay(Wait::Until(ctx.after(45)))
    }
}

fn reflect(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> BossStep {
    let until = locals(parts.boss).reflect_until;
    if ctx.tick >= until {
        return BossStep::Goto(ADVANCE, Wait::Ready);
    }
    hold_position(parts);
    face_player(parts, ctx);
    parts.boss.loop_anim(AnimAction::Attack1);
    BossStep::Stay(Wait::Until(until))
}

fn message(message: &MessageKind, parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) {
    if let MessageKind::Damage(hit) = message {
        if parts.boss.alive && !parts.boss.is_dying() {
            let shielded = ctx.tick < locals(parts.boss).reflect_until;
            if shielded || ctx.rng.chance(parts.boss.profile.reflect_chance) {
                face_player(parts, ctx);
                fire(parts, ctx, hit.kind);
                return;
            }
        }
    }
    on_message(message, parts, ctx);
}
