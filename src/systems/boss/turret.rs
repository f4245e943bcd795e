//! Ceiling turret: swivels towards the player and fires short bursts.

use crate::components::animation::AnimAction;
use crate::components::module::ActorContext;
use crate::components::physicsactor::{BossLocals, PhysicsActor, TurretLocals, Wait};

use super::{AWAKE, BossBehavior, BossParts, BossStep, dying, face_player, fire, idle, on_message, see_player};

const TRACK: u32 = AWAKE;
const FIRE: u32 = 3;

const BURST: u32 = 3;
/// Heading error under which the turret opens fire, angle units.
const ON_TARGET: i32 = 512;

pub static BEHAVIOR: BossBehavior = BossBehavior {
    name: "turret",
    handlers: &[idle, dying, track, burst],
    on_message,
};

fn locals(boss: &PhysicsActor) -> TurretLocals {
    match boss.locals {
        BossLocals::Turret(locals) => locals,
        _ => TurretLocals::default(),
    }
}

fn track(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> BossStep {
    if !ctx.player.alive || !see_player(parts, ctx) {
        return BossStep::Stay(Wait::Until(ctx.after(36)));
    }
    face_player(parts, ctx);
    let yaw_to = parts.object.pos.angle_to(&ctx.player.pos);
    if parts.object.yaw.delta_to(yaw_to).abs() <= ON_TARGET {
        return BossStep::Goto(FIRE, Wait::Ready);
    }
    BossStep::Stay(Wait::Until(ctx.after(5)))
}

fn burst(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> BossStep {
    let mut l = locals(parts.boss);
    if l.burst_left == 0 {
        l.burst_left = BURST;
    }
    face_player(parts, ctx);
    parts.boss.play(AnimAction::Attack1);
    let kind = parts.boss.profile.projectile;
    fire(parts, ctx, kind);
    l.burst_left -= 1;
    parts.boss.locals = BossLocals::Turret(l);
    if l.burst_left == 0 {
        BossStep::Goto(TRACK, Wait::Until(ctx.after(145)))
    } else {
        BossStep::Stay(Wait::Until(ctx.after(15)))
    }
}
