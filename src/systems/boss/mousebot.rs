//! Mouse droid: wanders the floor beeping and bolts away when shot. It has
//! no attack and never wakes up in the usual sense.

use crate::components::animation::AnimAction;
use crate::components::module::ActorContext;
use crate::components::physicsactor::{BossLocals, MouseBotLocals, PhysicsActor, Wait};
use crate::events::message::MessageKind;
use crate::fixed::{Angle, angle_dir};

use super::{AWAKE, BossBehavior, BossParts, BossStep, IDLE, dying, move_to, on_message};

const WANDER: u32 = AWAKE;

const WANDER_DISTANCE: i32 = 40;
const FLEE_TICKS: u32 = 290;
const BEEP_SOUND: &str = "mousebot_beep";

pub static BEHAVIOR: BossBehavior = BossBehavior {
    name: "mousebot",
    handlers: &[start, dying, wander],
    on_message: message,
};

fn locals(boss: &PhysicsActor) -> MouseBotLocals {
    match boss.locals {
        BossLocals::MouseBot(locals) => locals,
        _ => MouseBotLocals::default(),
    }
}

fn start(_parts: &mut BossParts<'_>, _ctx: &mut ActorContext<'_>) -> BossStep {
    BossStep::Goto(WANDER, Wait::Ready)
}

fn wander(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> BossStep {
    let mut l = locals(parts.boss);
    let fleeing = ctx.tick < l.flee_until;
    let bumped = parts.boss.movement.last_collision.is_some();

    if fleeing || bumped || ctx.tick >= l.turn_at {
        let heading = if fleeing {
            ctx.player.pos.angle_to(&parts.object.pos).offset(ctx.rng.spread(1024))
        } else {
            Angle::new(ctx.rng.upto(Angle::MASK as u32) as i32)
        };
        let (dx, dz) = angle_dir(heading);
        let mut point = parts.object.pos;
        point.x += dx.mul_int(WANDER_DISTANCE);
        point.z += dz.mul_int(WANDER_DISTANCE);
        let speed = if fleeing {
            parts.boss.profile.speed.mul_int(2)
        } else {
            parts.boss.profile.speed
        };
        move_to(parts, point, speed);
        let linger = 145 + ctx.rng.upto(290);
        l.turn_at = ctx.after(linger);
    }
    if ctx.tick >= l.beep_at {
        ctx.effects.sound(Some(BEEP_SOUND), parts.object.pos);
        let quiet = 290 + ctx.rng.upto(435);
        l.beep_at = ctx.after(quiet);
    }
    parts.boss.locals = BossLocals::MouseBot(l);
    parts.boss.loop_anim(AnimAction::Walk);
    BossStep::Stay(Wait::Until(ctx.after(10)))
}

fn message(message: &MessageKind, parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) {
    if *message == MessageKind::Wakeup {
        return;
    }
    if parts.boss.state == IDLE {
        parts.boss.state = WANDER;
    }
    on_message(message, parts, ctx);
    if message.is_hostile() && parts.boss.alive && !parts.boss.is_dying() {
        let mut l = locals(parts.boss);
        l.flee_until = ctx.after(FLEE_TICKS);
        parts.boss.locals = BossLocals::MouseBot(l);
    }
}
