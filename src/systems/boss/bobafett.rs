//! Jetpack bounty hunter: hovers, fires bursts and strafes when hit.

use crate::components::animation::AnimAction;
use crate::components::module::ActorContext;
use crate::components::physicsactor::{BobaLocals, BossLocals, PhysicsActor, Wait};
use crate::events::message::MessageKind;
use crate::fixed::{Angle, Fixed, angle_dir};

use super::{
    AWAKE, BossBehavior, BossParts, BossStep, dist_to_player, dying, face_player, fire, hover_at, idle, move_to,
    on_message, see_player,
};

const HUNT: u32 = AWAKE;
const ATTACK: u32 = 3;
const STRAFE: u32 = 4;

const DODGE_COOLDOWN: u32 = 290;
const STRAFE_DISTANCE: i32 = 30;

pub static BEHAVIOR: BossBehavior = BossBehavior {
    name: "bobafett",
    handlers: &[idle, dying, hunt, attack, strafe],
    on_message: message,
};

fn locals(boss: &PhysicsActor) -> BobaLocals {
    match boss.locals {
        BossLocals::BobaFett(locals) => locals,
        _ => BobaLocals {
            strafe: 1,
            hover_height: Fixed::from_int(20),
            ..Default::default()
        },
    }
}

fn hunt(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> BossStep {
    parts.boss.flying = true;
    parts.boss.loop_anim(AnimAction::Fly);
    let l = locals(parts.boss);
    let height = ctx.player.pos.y + l.hover_height;
    hover_at(parts, height);

    if see_player(parts, ctx) && dist_to_player(parts, ctx) <= parts.boss.profile.attack_range {
        return BossStep::Goto(ATTACK, Wait::Ready);
    }
    let goal = parts.boss.last_player_pos;
    let speed = parts.boss.profile.speed;
    move_to(parts, goal, speed);
    BossStep::Stay(Wait::Until(ctx.after(29)))
}

fn attack(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> BossStep {
    let mut l = locals(parts.boss);
    if l.shots_left == 0 {
        l.shots_left = 3 + ctx.rng.upto(2);
    }
    face_player(parts, ctx);
    parts.boss.play(AnimAction::Attack2);
    let kind = match parts.boss.profile.secondary {
        Some(rocket) if ctx.rng.chance(25) => rocket,
        _ => parts.boss.profile.projectile,
    };
    fire(parts, ctx, kind);
    l.shots_left -= 1;
    let done = l.shots_left == 0;
    parts.boss.locals = BossLocals::BobaFett(l);
    if done {
        BossStep::Goto(STRAFE, Wait::Until(ctx.after(36)))
    } else {
        BossStep::Stay(Wait::Until(ctx.after(22)))
    }
}

fn strafe(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> BossStep {
    let mut l = locals(parts.boss);
    l.strafe = ctx.rng.sign();
    l.hover_height = ctx.rng.range_fixed(Fixed::from_int(10), Fixed::from_int(30));
    parts.boss.locals = BossLocals::BobaFett(l);

    let to_player = parts.object.pos.angle_to(&ctx.player.pos);
    let side = to_player.offset(Angle::QUARTER * l.strafe);
    let (dx, dz) = angle_dir(side);
    let mut point = parts.object.pos;
    point.x += dx.mul_int(STRAFE_DISTANCE);
    point.z += dz.mul_int(STRAFE_DISTANCE);
    let speed = parts.boss.profile.speed.mul_int(2);
    move_to(parts, point, speed);
    hover_at(parts, ctx.player.pos.y + l.hover_height);
    BossStep::Goto(HUNT, Wait::Until(ctx.after(145)))
}

/// Hits make him break off and strafe, at most once per cooldown.
fn message(message: &MessageKind, parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) {
    on_message(message, parts, ctx);
    if !message.is_hostile() || !parts.boss.alive || parts.boss.is_dying() || parts.boss.state < AWAKE {
        return;
    }
    let mut l = locals(parts.boss);
    if ctx.tick >= l.next_dodge {
        l.next_dodge = ctx.after(DODGE_COOLDOWN);
        parts.boss.locals = BossLocals::BobaFett(l);
        parts.boss.state = STRAFE;
        parts.boss.state_tick = ctx.tick;
        parts.boss.wait = Wait::Ready;
    }
}
