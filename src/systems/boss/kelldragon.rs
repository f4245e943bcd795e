//! Kell dragon: stalks on foot, bites up close and leaps at the player from
//! mid range.

use crate::components::animation::AnimAction;
use crate::components::module::ActorContext;
use crate::components::physicsactor::{BossLocals, KellLocals, PhysicsActor, Wait};
use crate::fixed::{Fixed, FixedVec3, angle_dir};

use super::{
    AWAKE, BossBehavior, BossParts, BossStep, dist_to_player, dying, face_player, idle, melee, move_to, on_message,
    see_player,
};

const STALK: u32 = AWAKE;
const BITE: u32 = 3;
const BITE_END: u32 = 4;
const LEAP: u32 = 5;
const LANDING: u32 = 6;

const LEAP_RANGE: i32 = 60;
const LEAP_COOLDOWN: u32 = 435;
const LEAP_LIFT: i32 = 30;

pub static BEHAVIOR: BossBehavior = BossBehavior {
    name: "kelldragon",
    handlers: &[idle, dying, stalk, bite, bite_end, leap, landing],
    on_message,
};

fn locals(boss: &PhysicsActor) -> KellLocals {
    match boss.locals {
        BossLocals::KellDragon(locals) => locals,
        _ => KellLocals::default(),
    }
}

fn stalk(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> BossStep {
    if see_player(parts, ctx) {
        let dist = dist_to_player(parts, ctx);
        if dist <= parts.boss.profile.melee_range {
            return BossStep::Goto(BITE, Wait::Ready);
        }
        if dist <= Fixed::from_int(LEAP_RANGE) && ctx.tick >= locals(parts.boss).leap_ready {
            return BossStep::Goto(LEAP, Wait::Ready);
        }
    }
    parts.boss.loop_anim(AnimAction::Walk);
    let goal = parts.boss.last_player_pos;
    let speed = parts.boss.profile.speed;
    move_to(parts, goal, speed);
    BossStep::Stay(Wait::Until(ctx.after(15)))
}

fn bite(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> BossStep {
    face_player(parts, ctx);
    parts.boss.play(AnimAction::Attack1);
    BossStep::Goto(BITE_END, Wait::Animation)
}

fn bite_end(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> BossStep {
    if melee(parts, ctx) {
        let mut l = locals(parts.boss);
        l.strikes += 1;
        parts.boss.locals = BossLocals::KellDragon(l);
    }
    BossStep::Goto(STALK, Wait::Until(ctx.after(30)))
}

fn leap(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> BossStep {
    let mut l = locals(parts.boss);
    l.leap_ready = ctx.after(LEAP_COOLDOWN);
    parts.boss.locals = BossLocals::KellDragon(l);

    face_player(parts, ctx);
    parts.boss.play(AnimAction::Attack2);
    let (dx, dz) = angle_dir(parts.object.pos.angle_to(&ctx.player.pos));
    let speed = parts.boss.profile.speed.mul_int(2);
    parts
        .boss
        .kin
        .push(FixedVec3::new(dx * speed, Fixed::from_int(LEAP_LIFT), dz * speed));
    BossStep::Goto(LANDING, Wait::Until(ctx.after(15)))
}

fn landing(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> BossStep {
    if !parts.boss.kin.on_floor {
        return BossStep::Stay(Wait::Landed);
    }
    bite_end(parts, ctx)
}
