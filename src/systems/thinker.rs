//! Thinker and flyer behaviour.
//!
//! Both modules share one decision routine, [`think`]. The flyer only adds a
//! vertical target inside its hover band.
//!
//! Contract
//! - Acts only while the dispatch is `MOVING` and not dying; otherwise it
//!   resets to `Turn` and polls again next tick.
//! - Leaves the movement target alone while the actor is stunned.
//! - `Turn` picks a point short of the player (or of the last position the
//!   player was seen at) and hands it to the movement module.
//! - `Move` checks the previous movement step: a wall or ledge hit sends the
//!   actor off in a random direction and grows the retry backoff, arrival
//!   resets the backoff, a timeout just turns again.

use log::trace;

use crate::components::animation::{AnimAction, AnimPriority};
use crate::components::dispatch::{ActorState, DispatchFlags};
use crate::components::module::{ActorContext, ActorParts, ModuleBehavior, ModuleHeader, ModuleKind};
use crate::components::target::ActorTarget;
use crate::components::thinker::{FlyerModule, HoverParams, ThinkerModule, ThinkerState};
use crate::fixed::{Angle, Fixed, FixedVec3, Tick, angle_dir, dist_approx};

/// Close enough to the walk target to call it reached.
const ARRIVAL_DISTANCE: Fixed = Fixed::ONE;

/// Point `offset` units short of `target` along heading `angle`.
pub fn offset_target(target: FixedVec3, angle: Angle, offset: Fixed) -> FixedVec3 {
    let (dx, dz) = angle_dir(angle);
    FixedVec3::new(target.x - dx * offset, target.y, target.z - dz * offset)
}

/// Extra stand-off used when the player is out of sight.
///
/// The historical formula is `min(|dx|, |dx|) / 4`; `corrected` selects
/// `min(|dx|, |dz|) / 4`.
pub fn unseen_offset(dx: Fixed, dz: Fixed, corrected: bool) -> Fixed {
    let other = if corrected { dz.abs() } else { dx.abs() };
    dx.abs().min(other).div_int(4)
}

fn walk_action(flying: bool) -> AnimAction {
    if flying { AnimAction::Fly } else { AnimAction::Walk }
}

fn turn(
    core: &mut ThinkerModule,
    hover: Option<&HoverParams>,
    parts: &mut ActorParts<'_>,
    ctx: &mut ActorContext<'_>,
) -> Tick {
    let params = &core.params;
    let from = parts.object.pos;
    let goal = if parts.state.player_visible() {
        ctx.player.pos
    } else {
        parts.state.last_player_pos
    };

    let mut offset = params.target_offset + ctx.rng.spread_fixed(params.target_variation);
    if !parts.state.player_visible() {
        offset += unseen_offset(goal.x - from.x, goal.z - from.z, ctx.config.corrected_thinker_offset);
    }
    let offset = offset.max(Fixed::ZERO);
    let heading = from.angle_to(&goal).offset(ctx.rng.spread(params.approach_variation));
    let mut point = offset_target(goal, heading, offset);

    let mut target = ActorTarget::position(point, params.speed).with_facing(from.angle_to(&point), params.speed_rot);
    if let Some(hover) = hover {
        point.y = ctx.player.pos.y + ctx.rng.range_fixed(hover.min_height, hover.max_height);
        target = target.with_height(point.y, hover.speed_vert);
    }
    parts.update_target(&target);

    core.target = point;
    core.state = ThinkerState::Move;
    core.walk_until = ctx.after(params.max_walk_time);
    trace!("{:?}: walking to {:?}", ctx.entity, point);

    let def = core
        .walk_anim
        .unwrap_or_else(|| parts.state.anim_for(walk_action(hover.is_some())));
    if parts.state.anim.anim_id != def.anim_id {
        ctx.request_animation(AnimPriority::Move, &def);
    }
    ctx.after(1)
}

fn bump(core: &mut ThinkerModule, hover: Option<&HoverParams>, parts: &mut ActorParts<'_>, ctx: &mut ActorContext<'_>) -> Tick {
    let backoff = core.grow_backoff();
    let from = parts.object.pos;
    let heading = Angle::new(ctx.rng.upto(Angle::MASK as u32) as i32);
    let point = offset_target(from, heading, -core.params.target_offset);

    let mut target = ActorTarget::position(point, core.params.speed).with_facing(heading, core.params.speed_rot);
    if let Some(hover) = hover {
        target = target.with_height(from.y, hover.speed_vert);
    }
    parts.update_target(&target);
    core.target = point;
    core.walk_until = ctx.after(core.params.max_walk_time);
    trace!("{:?}: bumped, backing off {} ticks", ctx.entity, backoff);
    ctx.after(backoff)
}

/// One decision step shared by thinkers and flyers.
pub fn think(
    core: &mut ThinkerModule,
    hover: Option<&HoverParams>,
    parts: &mut ActorParts<'_>,
    ctx: &mut ActorContext<'_>,
) -> Tick {
    if !parts.state.flags.contains(DispatchFlags::MOVING) || parts.state.is_dying() {
        core.state = ThinkerState::Turn;
        return ctx.after(1);
    }
    if parts.state.is_stunned() {
        return ctx.after(1);
    }
    match core.state {
        ThinkerState::Turn => turn(core, hover, parts, ctx),
        ThinkerState::Move => {
            if parts.collided() {
                return bump(core, hover, parts, ctx);
            }
            let pos = parts.object.pos;
            if dist_approx(core.target.x - pos.x, core.target.z - pos.z) <= ARRIVAL_DISTANCE {
                core.backoff = 0;
                core.state = ThinkerState::Turn;
                return ctx.tick;
            }
            if ctx.tick >= core.walk_until {
                core.state = ThinkerState::Turn;
                return ctx.tick;
            }
            ctx.after(1)
        }
    }
}

impl ModuleBehavior for ThinkerModule {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Thinker
    }

    fn header(&self) -> &ModuleHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut ModuleHeader {
        &mut self.header
    }

    fn update(&mut self, parts: &mut ActorParts<'_>, ctx: &mut ActorContext<'_>) -> Tick {
        think(self, None, parts, ctx)
    }

    fn compute_attributes(&mut self, state: &ActorState) {
        self.walk_anim = Some(state.anim_for(AnimAction::Walk));
    }
}

impl ModuleBehavior for FlyerModule {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Flyer
    }

    fn header(&self) -> &ModuleHeader {
        &self.thinker.header
    }

    fn header_mut(&mut self) -> &mut ModuleHeader {
        &mut self.thinker.header
    }

    fn update(&mut self, parts: &mut ActorParts<'_>, ctx: &mut ActorContext<'_>) -> Tick {
        let FlyerModule { thinker, hover } = self;
        think(thinker, Some(hover), parts, ctx)
    }

    fn compute_attributes(&mut self, state: &ActorState) {
        self.thinker.walk_anim = Some(state.anim_for(AnimAction::Fly));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::movement::MoveCollision;
    use crate::components::target::TargetFlags;
    use crate::components::thinker::ThinkerParams;
    use crate::systems::fixture::Fixture;

    fn still_params() -> ThinkerParams {
        ThinkerParams {
            target_offset: Fixed::from_int(3),
            target_variation: Fixed::ZERO,
            approach_variation: 0,
            ..Default::default()
        }
    }

    #[test]
    fn offset_target_is_deterministic() {
        let origin = FixedVec3::ZERO;
        for units in [0, 1000, 4096, 9000, 16383] {
            let angle = Angle::new(units);
            let a = offset_target(origin, angle, Fixed::from_int(3));
            let b = offset_target(origin, angle, Fixed::from_int(3));
            assert_eq!(a, b);
        }
        assert_eq!(
            offset_target(origin, Angle::ZERO, Fixed::from_int(3)),
            FixedVec3::from_ints(0, 0, -3)
        );
    }

    #[test]
    fn unseen_offset_keeps_historical_formula() {
        let dx = Fixed::from_int(40);
        let dz = Fixed::from_int(8);
        assert_eq!(unseen_offset(dx, dz, false), Fixed::from_int(10));
        assert_eq!(unseen_offset(dx, dz, true), Fixed::from_int(2));
    }

    #[test]
    fn turn_targets_short_of_visible_player() {
        let mut fx = Fixture::new(FixedVec3::from_ints(0, 0, 50));
        fx.state.flags.insert(DispatchFlags::PLAYER_VISIBLE);
        let mut module = ThinkerModule::new(still_params());
        let (mut parts, mut ctx) = fx.split(0);
        module.update(&mut parts, &mut ctx);
        assert_eq!(module.state, ThinkerState::Move);
        assert_eq!(module.target, FixedVec3::from_ints(0, 0, 47));
        assert!(fx.movement.target.flags.contains(TargetFlags::MOVE_XZ));
        assert_eq!(fx.movement.target.pos, FixedVec3::from_ints(0, 0, 47));
    }

    #[test]
    fn same_seed_same_walk() {
        let run = || {
            let mut fx = Fixture::new(FixedVec3::from_ints(30, 0, 50));
            let mut module = ThinkerModule::default();
            let (mut parts, mut ctx) = fx.split(0);
            module.update(&mut parts, &mut ctx);
            module.target
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn idle_thinker_does_nothing() {
        let mut fx = Fixture::new(FixedVec3::from_ints(0, 0, 50));
        fx.state.flags.remove(DispatchFlags::MOVING);
        let mut module = ThinkerModule::default();
        let (mut parts, mut ctx) = fx.split(0);
        assert_eq!(module.update(&mut parts, &mut ctx), 1);
        assert_eq!(module.state, ThinkerState::Turn);
        assert!(!fx.movement.target.flags.contains(TargetFlags::MOVE_XZ));
    }

    #[test]
    fn collision_grows_backoff_and_arrival_resets_it() {
        let mut fx = Fixture::new(FixedVec3::from_ints(0, 0, 50));
        let mut module = ThinkerModule::new(still_params());
        module.state = ThinkerState::Move;
        module.target = FixedVec3::from_ints(0, 0, 20);
        module.walk_until = 1000;

        fx.movement.last_collision = Some(MoveCollision::Wall);
        let (mut parts, mut ctx) = fx.split(10);
        assert_eq!(module.update(&mut parts, &mut ctx), 10 + module.params.backoff_base);
        assert_eq!(module.backoff, module.params.backoff_base);
        let (mut parts, mut ctx) = fx.split(50);
        module.update(&mut parts, &mut ctx);
        assert_eq!(module.backoff, module.params.backoff_base * 2);

        fx.movement.last_collision = None;
        fx.object.pos = module.target;
        let (mut parts, mut ctx) = fx.split(200);
        assert_eq!(module.update(&mut parts, &mut ctx), 200);
        assert_eq!(module.backoff, 0);
        assert_eq!(module.state, ThinkerState::Turn);
    }

    #[test]
    fn flyer_targets_hover_band() {
        let mut fx = Fixture::new(FixedVec3::from_ints(0, 0, 50));
        fx.state.flags.insert(DispatchFlags::PLAYER_VISIBLE);
        let mut module = FlyerModule::new(still_params(), HoverParams::default());
        let (mut parts, mut ctx) = fx.split(0);
        module.update(&mut parts, &mut ctx);
        let y = fx.movement.target.pos.y;
        assert!(fx.movement.target.flags.contains(TargetFlags::MOVE_Y));
        assert!(y >= Fixed::from_int(4) && y <= Fixed::from_int(16));
    }
}
