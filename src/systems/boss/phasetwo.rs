//! Phase Two dark trooper: walks in firing rocket volleys and takes to the
//! air with its jetpack for a while, strafing the player from above.

use crate::components::animation::AnimAction;
use crate::components::module::ActorContext;
use crate::components::physicsactor::{BossLocals, PhaseTwoLocals, PhysicsActor, Wait};
use crate::fixed::{Angle, Fixed, Tick, angle_dir};

use super::{
    AWAKE, BossBehavior, BossParts, BossStep, dist_to_player, dying, face_player, fire, hover_at, idle, move_to,
    on_message, see_player,
};

const ADVANCE: u32 = AWAKE;
const ROCKETS: u32 = 3;
const TAKEOFF: u32 = 4;
const FLY: u32 = 5;

const FLIGHT_TICKS: u32 = 435;
const CRUISE_HEIGHT: i32 = 20;
const ORBIT_RADIUS: i32 = 50;

pub static BEHAVIOR: BossBehavior = BossBehavior {
    name: "phasetwo",
    handlers: &[idle, dying, advance, rockets, takeoff, fly],
    on_message,
};

fn locals(boss: &PhysicsActor) -> PhaseTwoLocals {
    match boss.locals {
        BossLocals::PhaseTwo(locals) => locals,
        _ => PhaseTwoLocals::default(),
    }
}

/// Ground approach shared with Phase Three. Returns the state to switch
/// to, if any.
pub(super) fn approach(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> Option<u32> {
    parts.boss.flying = false;
    if see_player(parts, ctx) {
        if dist_to_player(parts, ctx) <= parts.boss.profile.attack_range {
            return Some(ROCKETS);
        }
        if ctx.rng.chance(25) {
            return Some(TAKEOFF);
        }
    }
    parts.boss.loop_anim(AnimAction::Walk);
    let goal = parts.boss.last_player_pos;
    let speed = parts.boss.profile.speed;
    move_to(parts, goal, speed);
    None
}

/// Fire one rocket of a volley. Returns true once the volley is spent.
pub(super) fn volley(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>, rockets_left: &mut u32) -> bool {
    if *rockets_left == 0 {
        *rockets_left = 2 + ctx.rng.upto(2);
    }
    face_player(parts, ctx);
    parts.boss.play(AnimAction::Attack2);
    let kind = parts.boss.profile.secondary.unwrap_or(parts.boss.profile.projectile);
    fire(parts, ctx, kind);
    *rockets_left -= 1;
    *rockets_left == 0
}

pub(super) fn lift_off(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>, flight_until: &mut Tick) {
    *flight_until = ctx.after(FLIGHT_TICKS);
    parts.boss.flying = true;
    parts.boss.play(AnimAction::Fly);
    let floor = ctx.collision.floor_at(&parts.object.pos, parts.object.sector);
    hover_at(parts, floor.height + Fixed::from_int(CRUISE_HEIGHT));
}

/// One airborne step: circle the player and shoot when in sight. Returns
/// true when the flight is over and the boss is coming down.
pub(super) fn airborne(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>, flight_until: Tick) -> bool {
    if ctx.tick >= flight_until {
        parts.boss.flying = false;
        let floor = ctx.collision.floor_at(&parts.object.pos, parts.object.sector);
        hover_at(parts, floor.height);
        return true;
    }
    parts.boss.loop_anim(AnimAction::Fly);
    let around = ctx.player.pos.angle_to(&parts.object.pos).offset(Angle::QUARTER / 2);
    let (dx, dz) = angle_dir(around);
    let mut point = ctx.player.pos;
    point.x += dx.mul_int(ORBIT_RADIUS);
    point.z += dz.mul_int(ORBIT_RADIUS);
    let speed = parts.boss.profile.speed;
    move_to(parts, point, speed);
    if see_player(parts, ctx) {
        face_player(parts, ctx);
        let kind = parts.boss.profile.projectile;
        fire(parts, ctx, kind);
    }
    false
}

fn advance(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> BossStep {
    match approach(parts, ctx) {
        Some(next) => BossStep::Goto(next, Wait::Ready),
        None => BossStep::Stay(Wait::Until(ctx.after(20))),
    }
}

fn rockets(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> BossStep {
    let mut l = locals(parts.boss);
    let spent = volley(parts, ctx, &mut l.rockets_left);
    parts.boss.locals = BossLocals::PhaseTwo(l);
    if spent {
        BossStep::Goto(ADVANCE, Wait::Until(ctx.after(100)))
    } else {
        BossStep::Stay(Wait::Until(ctx.after(36)))
    }
}

fn takeoff(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> BossStep {
    let mut l = locals(parts.boss);
    lift_off(parts, ctx, &mut l.flight_until);
    parts.boss.locals = BossLocals::PhaseTwo(l);
    BossStep::Goto(FLY, Wait::Until(ctx.after(30)))
}

fn fly(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> BossStep {
    if airborne(parts, ctx, locals(parts.boss).flight_until) {
        BossStep::Goto(ADVANCE, Wait::Landed)
    } else {
        BossStep::Stay(Wait::Until(ctx.after(45)))
    }
}
