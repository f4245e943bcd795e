//! Wall-mounted welding arm: sweeps across its arc and torches the player
//! when they come within reach.

use crate::components::animation::AnimAction;
use crate::components::module::ActorContext;
use crate::components::physicsactor::{BossLocals, Wait, WelderLocals};
use crate::components::target::ActorTarget;
use crate::events::projectile::ProjectileKind;
use crate::fixed::Angle;

use super::{AWAKE, BossBehavior, BossParts, BossStep, dist_to_player, dying, fire, idle, on_message, see_player, set_target};

const SWEEP: u32 = AWAKE;
const WELD: u32 = 3;

/// Half-width of the arc the arm covers, angle units.
const REACH_ARC: i32 = 2048;
/// Arc tolerance for a finished sweep.
const SWEEP_SLACK: i32 = 64;

pub static BEHAVIOR: BossBehavior = BossBehavior {
    name: "welder",
    handlers: &[idle, dying, sweep, weld],
    on_message,
};

fn locals(parts: &BossParts<'_>) -> WelderLocals {
    match parts.boss.locals {
        BossLocals::Welder(locals) => locals,
        _ => WelderLocals {
            base_yaw: parts.object.yaw,
            sweep_dir: 1,
        },
    }
}

fn turn_to(parts: &mut BossParts<'_>, yaw: Angle) {
    let target = ActorTarget::facing(yaw, parts.boss.profile.speed_rot);
    set_target(parts, &target);
}

fn sweep(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> BossStep {
    let mut l = locals(parts);
    let yaw_to = parts.object.pos.angle_to(&ctx.player.pos);
    let in_arc = l.base_yaw.delta_to(yaw_to).abs() <= REACH_ARC;
    if in_arc && see_player(parts, ctx) && dist_to_player(parts, ctx) <= parts.boss.profile.attack_range {
        parts.boss.locals = BossLocals::Welder(l);
        return BossStep::Goto(WELD, Wait::Ready);
    }

    let end = l.base_yaw.offset(REACH_ARC * l.sweep_dir);
    if parts.object.yaw.delta_to(end).abs() <= SWEEP_SLACK {
        l.sweep_dir = -l.sweep_dir;
    }
    parts.boss.locals = BossLocals::Welder(l);
    let next = l.base_yaw.offset(REACH_ARC * l.sweep_dir);
    turn_to(parts, next);
    parts.boss.loop_anim(AnimAction::Idle);
    BossStep::Stay(Wait::Until(ctx.after(10)))
}

fn weld(parts: &mut BossParts<'_>, ctx: &mut ActorContext<'_>) -> BossStep {
    let l = locals(parts);
    let yaw_to = parts.object.pos.angle_to(&ctx.player.pos);
    let offset = l.base_yaw.delta_to(yaw_to).clamp(-REACH_ARC, REACH_ARC);
    turn_to(parts, l.base_yaw.offset(offset));
    parts.boss.play(AnimAction::Attack1);
    fire(parts, ctx, ProjectileKind::Spark);
    BossStep::Goto(SWEEP, Wait::Until(ctx.after(58)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::physicsactor::BossKind;
    use crate::fixed::FixedVec3;
    use crate::systems::boss::tests::BossFixture;

    #[test]
    fn sweep_reverses_at_the_end_of_the_arc() {
        let mut fx = BossFixture::new(BossKind::Welder, 40, FixedVec3::from_ints(0, 0, -400));
        fx.boss.state = SWEEP;
        fx.tick(0, Vec::new());
        let first = locals(&BossParts { object: &mut fx.object, boss: &mut fx.boss });
        assert_eq!(first.sweep_dir, 1);
        assert_eq!(first.base_yaw, Angle::ZERO);
        fx.run_until(1, 400, |fx| matches!(fx.boss.locals, BossLocals::Welder(l) if l.sweep_dir == -1));
        assert!(matches!(fx.boss.locals, BossLocals::Welder(l) if l.sweep_dir == -1));
        assert!(fx.effects.projectiles.is_empty());
    }

    #[test]
    fn welds_a_player_inside_its_arc() {
        let mut fx = BossFixture::new(BossKind::Welder, 40, FixedVec3::from_ints(0, 0, 30));
        fx.boss.state = SWEEP;
        fx.tick(0, Vec::new());
        assert_eq!(fx.boss.state, WELD);
        fx.tick(1, Vec::new());
        assert_eq!(fx.effects.projectiles.len(), 1);
        assert_eq!(fx.effects.projectiles[0].kind, ProjectileKind::Spark);
    }
}
