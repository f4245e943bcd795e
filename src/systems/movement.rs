//! Movement and free-body physics.
//!
//! - [`update_movement`] eases an object towards its movement target through
//!   the collision service.
//! - [`integrate_physics`] applies gravity and knockback and tracks floor
//!   contact.
//!
//! Both are plain functions called by the actor and boss drivers, once per
//! actor per tick, physics first.

use crate::components::movement::{Kinematics, MoveCollision, MovementFlags, MovementModule};
use crate::components::target::TargetFlags;
use crate::components::worldobject::WorldObject;
use crate::fixed::{Fixed, FixedVec3, TICKS_PER_SECOND, dist_approx};
use crate::resources::collision::{CollisionFlags, CollisionHit, CollisionInfo, CollisionService};

/// Knockback lost per second, as a fraction of the current velocity.
const FRICTION: i32 = 4;
/// Knockback below this is dropped.
const REST_SPEED: Fixed = Fixed::from_ratio(1, 4);

/// Largest angle step for `speed_rot` over `ticks`; zero speed snaps.
fn rotation_step(speed_rot: i32, ticks: u32) -> i32 {
    if speed_rot <= 0 {
        return i32::MAX;
    }
    let step = i64::from(speed_rot) * i64::from(ticks) / i64::from(TICKS_PER_SECOND);
    step.clamp(1, i64::from(i32::MAX)) as i32
}

fn collision_flags(movement: &MovementModule, flying: bool) -> CollisionFlags {
    let mut flags = CollisionFlags::empty();
    if movement.flags.contains(MovementFlags::AVOID_LEDGES) {
        flags |= CollisionFlags::AVOID_LEDGES;
    }
    if flying {
        flags |= CollisionFlags::FLYING;
    }
    flags
}

fn resolve_step(
    object: &WorldObject,
    delta: FixedVec3,
    flags: CollisionFlags,
    collision: &dyn CollisionService,
) -> CollisionInfo {
    let mut info = CollisionInfo::new(object.pos, object.radius, object.height, object.sector, delta)
        .with_flags(flags);
    collision.resolve(&mut info);
    info
}

/// Step `object` towards `movement.target`.
///
/// Rotation always eases; translation is skipped while the target is frozen.
/// The horizontal step is bounded by `speed` and never overshoots, the
/// vertical one by `speed_vert`.
pub fn update_movement(
    movement: &mut MovementModule,
    object: &mut WorldObject,
    collision: &dyn CollisionService,
    flying: bool,
    ticks: u32,
) {
    let target = movement.target;
    movement.last_collision = None;

    if target.flags.contains(TargetFlags::MOVE_ROT) {
        let step = rotation_step(target.speed_rot, ticks);
        object.yaw = object.yaw.step_toward(target.yaw, step);
        object.pitch = object.pitch.step_toward(target.pitch, step);
        object.roll = object.roll.step_toward(target.roll, step);
    }
    if target.is_frozen() {
        return;
    }

    let mut delta = FixedVec3::ZERO;
    if target.flags.contains(TargetFlags::MOVE_XZ) {
        let dx = target.pos.x - object.pos.x;
        let dz = target.pos.z - object.pos.z;
        let dist = dist_approx(dx, dz);
        let max = target.speed.per_ticks(ticks);
        if dist <= max {
            delta.x = dx;
            delta.z = dz;
        } else {
            delta.x = dx.scale(max, dist);
            delta.z = dz.scale(max, dist);
        }
    }
    if target.flags.contains(TargetFlags::MOVE_Y) {
        let dy = target.pos.y - object.pos.y;
        delta.y = dy.clamp_abs(target.speed_vert.per_ticks(ticks));
    }
    if delta.is_zero() {
        return;
    }

    let flags = collision_flags(movement, flying);
    let info = resolve_step(object, delta, flags, collision);
    object.pos += info.actual;

    let Some(hit) = info.hit else {
        return;
    };

    if let CollisionHit::Wall { gap: Some(gap) } = hit
        && movement.flags.contains(MovementFlags::USE_GAPS)
        && gap.height() >= object.height
    {
        movement.target.pos.y = gap.bottom;
        movement.target.flags |= TargetFlags::MOVE_Y;
        if !movement.target.speed_vert.is_positive() {
            movement.target.speed_vert = movement.target.speed;
        }
        return;
    }

    if movement.flags.contains(MovementFlags::RESPONSE_SLIDE) && matches!(hit, CollisionHit::Wall { .. }) {
        let remaining = delta - info.actual;
        let (dir_x, dir_z) = info.response_dir;
        let along = remaining.x * dir_x + remaining.z * dir_z;
        let slide = FixedVec3::new(dir_x * along, Fixed::ZERO, dir_z * along);
        if !slide.is_zero() {
            let slid = resolve_step(object, slide, flags, collision);
            object.pos += slid.actual;
        }
    }

    movement.last_collision = Some(match hit {
        CollisionHit::Wall { .. } => MoveCollision::Wall,
        CollisionHit::Ledge => MoveCollision::Ledge,
        CollisionHit::Object(_) => MoveCollision::Object,
    });
}

/// Apply gravity (unless `flying`) and knockback to `object`, then update
/// floor contact.
pub fn integrate_physics(
    object: &mut WorldObject,
    kin: &mut Kinematics,
    flying: bool,
    gravity: Fixed,
    collision: &dyn CollisionService,
    ticks: u32,
) {
    if ticks == 0 {
        return;
    }
    let floor = collision.floor_at(&object.pos, object.sector);

    if !flying && (object.pos.y > floor.height || kin.velocity.y.is_positive()) {
        kin.velocity.y -= gravity.per_ticks(ticks);
    }
    if kin.velocity.y != Fixed::ZERO {
        object.pos.y += kin.velocity.y.per_ticks(ticks);
    }
    if object.pos.y <= floor.height {
        object.pos.y = floor.height;
        if kin.velocity.y.is_negative() {
            kin.velocity.y = Fixed::ZERO;
        }
        kin.on_floor = true;
        kin.floor_is_liquid = floor.liquid;
    } else {
        kin.on_floor = false;
        kin.floor_is_liquid = false;
    }

    if kin.velocity.x != Fixed::ZERO || kin.velocity.z != Fixed::ZERO {
        let push = FixedVec3::new(
            kin.velocity.x.per_ticks(ticks),
            Fixed::ZERO,
            kin.velocity.z.per_ticks(ticks),
        );
        let flags = if flying { CollisionFlags::FLYING } else { CollisionFlags::empty() };
        let info = resolve_step(object, push, flags, collision);
        object.pos += info.actual;
        if info.blocked() {
            kin.velocity.x = Fixed::ZERO;
            kin.velocity.z = Fixed::ZERO;
        } else {
            let decay = Fixed::from_ratio(FRICTION * ticks as i32, TICKS_PER_SECOND as i32).min(Fixed::ONE);
            kin.velocity.x -= kin.velocity.x * decay;
            kin.velocity.z -= kin.velocity.z * decay;
            if dist_approx(kin.velocity.x, kin.velocity.z) < REST_SPEED {
                kin.velocity.x = Fixed::ZERO;
                kin.velocity.z = Fixed::ZERO;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::target::ActorTarget;
    use crate::fixed::Angle;
    use crate::resources::collision::{OpenArena, Rect, WallGap};

    fn walker() -> (MovementModule, WorldObject) {
        (
            MovementModule::default(),
            WorldObject::new(FixedVec3::ZERO, Angle::ZERO, 0),
        )
    }

    #[test]
    fn step_is_bounded_by_speed() {
        let arena = OpenArena::new(500);
        let (mut movement, mut object) = walker();
        movement.target = ActorTarget::position(FixedVec3::from_ints(0, 0, 100), Fixed::from_int(145));
        update_movement(&mut movement, &mut object, &arena, false, 1);
        assert_eq!(object.pos.z, Fixed::ONE);
    }

    #[test]
    fn step_never_overshoots() {
        let arena = OpenArena::new(500);
        let (mut movement, mut object) = walker();
        movement.target = ActorTarget::position(FixedVec3::from_ints(3, 0, 0), Fixed::from_int(1000));
        update_movement(&mut movement, &mut object, &arena, false, 10);
        assert_eq!(object.pos.x, Fixed::from_int(3));
    }

    #[test]
    fn frozen_target_only_rotates() {
        let arena = OpenArena::new(500);
        let (mut movement, mut object) = walker();
        movement.target = ActorTarget::position(FixedVec3::from_ints(50, 0, 0), Fixed::from_int(20))
            .with_facing(Angle::new(Angle::QUARTER), 0)
            .frozen();
        update_movement(&mut movement, &mut object, &arena, false, 5);
        assert_eq!(object.pos, FixedVec3::ZERO);
        assert_eq!(object.yaw.units(), Angle::QUARTER);
    }

    #[test]
    fn rotation_eases_at_speed() {
        let arena = OpenArena::new(500);
        let (mut movement, mut object) = walker();
        movement.target = ActorTarget::facing(Angle::new(Angle::QUARTER), 145);
        update_movement(&mut movement, &mut object, &arena, false, 10);
        assert_eq!(object.yaw.units(), 10);
    }

    #[test]
    fn wall_hit_is_recorded() {
        let arena = OpenArena::new(10);
        let (mut movement, mut object) = walker();
        movement.target = ActorTarget::position(FixedVec3::from_ints(50, 0, 0), Fixed::from_int(1450));
        update_movement(&mut movement, &mut object, &arena, false, 1);
        assert_eq!(movement.last_collision, Some(MoveCollision::Wall));
        assert_eq!(object.pos.x, Fixed::from_int(8));
    }

    #[test]
    fn slide_moves_along_the_wall() {
        let arena = OpenArena::new(10);
        let (mut movement, mut object) = walker();
        object.pos = FixedVec3::from_ints(8, 0, 0);
        movement.target = ActorTarget::position(FixedVec3::from_ints(20, 0, 6), Fixed::from_int(1450));
        update_movement(&mut movement, &mut object, &arena, false, 1);
        assert_eq!(object.pos.x, Fixed::from_int(8));
        assert!(object.pos.z.is_positive());
    }

    #[test]
    fn fitting_gap_becomes_vertical_target() {
        let gap = WallGap {
            bottom: Fixed::from_int(10),
            top: Fixed::from_int(20),
        };
        let arena = OpenArena::new(500).with_block(Rect::new(5, -5, 7, 5), Some(gap));
        let mut movement = MovementModule::new(MovementFlags::USE_GAPS);
        let mut object = WorldObject::new(FixedVec3::ZERO, Angle::ZERO, 0);
        movement.target = ActorTarget::position(FixedVec3::from_ints(20, 0, 0), Fixed::from_int(145 * 4));
        update_movement(&mut movement, &mut object, &arena, true, 1);
        assert_eq!(movement.last_collision, None);
        assert!(movement.target.flags.contains(TargetFlags::MOVE_Y));
        assert_eq!(movement.target.pos.y, gap.bottom);
    }

    #[test]
    fn gravity_pulls_down_and_lands() {
        let arena = OpenArena::new(500);
        let mut object = WorldObject::new(FixedVec3::from_ints(0, 10, 0), Angle::ZERO, 0);
        let mut kin = Kinematics::default();
        for _ in 0..(TICKS_PER_SECOND * 3) {
            integrate_physics(&mut object, &mut kin, false, Fixed::from_int(60), &arena, 1);
        }
        assert_eq!(object.pos.y, Fixed::ZERO);
        assert!(kin.on_floor);
        assert_eq!(kin.velocity.y, Fixed::ZERO);
    }

    #[test]
    fn flyers_hover() {
        let arena = OpenArena::new(500);
        let mut object = WorldObject::new(FixedVec3::from_ints(0, 10, 0), Angle::ZERO, 0);
        let mut kin = Kinematics::default();
        integrate_physics(&mut object, &mut kin, true, Fixed::from_int(60), &arena, 10);
        assert_eq!(object.pos.y, Fixed::from_int(10));
        assert!(!kin.on_floor);
    }

    #[test]
    fn knockback_decays_to_rest() {
        let arena = OpenArena::new(500);
        let mut object = WorldObject::new(FixedVec3::ZERO, Angle::ZERO, 0);
        let mut kin = Kinematics {
            velocity: FixedVec3::from_ints(20, 0, 0),
            on_floor: true,
            floor_is_liquid: false,
        };
        for _ in 0..TICKS_PER_SECOND * 4 {
            integrate_physics(&mut object, &mut kin, false, Fixed::from_int(60), &arena, 1);
        }
        assert!(object.pos.x.is_positive());
        assert_eq!(kin.velocity.x, Fixed::ZERO);
    }
}
