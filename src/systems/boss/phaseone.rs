//! Phase One dark trooper: closes in and swings its blade in combos of
//! three, flinching when hurt unless the pain cooldown is still running.

use crate::components::animation::AnimAction;
use crate::components::module::ActorContext;
use crate::components::physicsactor::{BossLocals, PhaseOneLocals, PhysicsActor, Wait};
use crate::events::message::MessageKind;

use super::{
    AWAKE, BossBehavior, BossParts, BossStep, dist_to_player, dying, face_player, idle, melee, move_to, on_message,
    see_player,
};

const CHASE: u32 = AWAKE;
const SWING: u32 = 3;
const SWING_HIT: u32 = 4;
const PAIN: u32 = 5;

const COMBO: u32 = 3;
const PAIN_COOLDOWN: u32 = 290;

pub static BEHAVIOR: BossBehavior = BossBehavior {
    name: "phaseone",
    handlers: &[idle, dying, chase, swing, swing_hit, pain],
    on_message: message,
};

fn locals(boss: &PhysicsActor) -> PhaseOneLocals {
    match boss.locals {
        BossLocals::PhaseOne(locals) => locals,
        _ => PhaseOneLocals::default(),
    }
}

fn chase(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> BossStep {
    if see_player(parts, ctx) && dist_to_player(parts, ctx) <= parts.boss.profile.melee_range {
        return BossStep::Goto(SWING, Wait::Ready);
    }
    parts.boss.loop_anim(AnimAction::Walk);
    let goal = parts.boss.last_player_pos;
    let speed = parts.boss.profile.speed;
    move_to(parts, goal, speed);
    BossStep::Stay(Wait::Until(ctx.after(15)))
}

fn swing(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> BossStep {
    face_player(parts, ctx);
    parts.boss.play(AnimAction::Attack1);
    let mut l = locals(parts.boss);
    l.swings += 1;
    parts.boss.locals = BossLocals::PhaseOne(l);
    BossStep::Goto(SWING_HIT, Wait::Animation)
}

fn swing_hit(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> BossStep {
    melee(parts, ctx);
    let mut l = locals(parts.boss);
    if l.swings >= COMBO {
        l.swings = 0;
        parts.boss.locals = BossLocals::PhaseOne(l);
        return BossStep::Goto(CHASE, Wait::Until(ctx.after(72)));
    }
    BossStep::Goto(SWING, Wait::Ready)
}

fn pain(_parts: &mut BossParts<'_>, _ctx: &mut ActorContext<'_>) -> BossStep {
    BossStep::Goto(CHASE, Wait::Ready)
}

fn message(message: &MessageKind, parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) {
    let awake = parts.boss.state >= AWAKE;
    on_message(message, parts, ctx);
    if !awake || !message.is_hostile() || !parts.boss.alive || parts.boss.is_dying() {
        return;
    }
    let mut l = locals(parts.boss);
    if ctx.tick < l.pain_ready {
        return;
    }
    l.pain_ready = ctx.after(PAIN_COOLDOWN);
    l.swings = 0;
    parts.boss.locals = BossLocals::PhaseOne(l);
    parts.boss.play(AnimAction::Hurt);
    parts.boss.state = PAIN;
    parts.boss.state_tick = ctx.tick;
    parts.boss.wait = Wait::Animation;
}
