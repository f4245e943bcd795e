//! Desired pose an actor steers towards.
//!
//! An [`ActorTarget`] is written by decision logic (thinkers, attacks,
//! bosses) and consumed by the movement module. Only the axes flagged in
//! [`TargetFlags`] are live; the rest must be left untouched when targets
//! are merged with [`update_target`].

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::fixed::{Angle, Fixed, FixedVec3};

bitflags! {
    /// Which parts of an [`ActorTarget`] are live.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct TargetFlags: u32 {
        /// Horizontal position (`pos.x`, `pos.z`) and `speed`.
        const MOVE_XZ  = 1 << 0;
        /// Vertical position (`pos.y`) and `speed_vert`.
        const MOVE_Y   = 1 << 1;
        /// Orientation (`yaw`, `pitch`, `roll`) and `speed_rot`.
        const MOVE_ROT = 1 << 2;
        /// Hold position; rotation still eases.
        const FREEZE   = 1 << 3;
        const ALL_MOVE = Self::MOVE_XZ.bits() | Self::MOVE_Y.bits() | Self::MOVE_ROT.bits();
    }
}

/// Desired pose and speeds for the movement module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActorTarget {
    pub pos: FixedVec3,
    pub yaw: Angle,
    pub pitch: Angle,
    pub roll: Angle,
    /// Horizontal speed, units per second.
    pub speed: Fixed,
    /// Vertical speed, units per second.
    pub speed_vert: Fixed,
    /// Angular speed, angle units per second. Zero snaps.
    pub speed_rot: i32,
    pub flags: TargetFlags,
}

impl ActorTarget {
    /// Target that only sets a position.
    pub fn position(pos: FixedVec3, speed: Fixed) -> Self {
        Self {
            pos,
            speed,
            flags: TargetFlags::MOVE_XZ,
            ..Default::default()
        }
    }

    /// Target that only sets a heading.
    pub fn facing(yaw: Angle, speed_rot: i32) -> Self {
        Self {
            yaw,
            speed_rot,
            flags: TargetFlags::MOVE_ROT,
            ..Default::default()
        }
    }

    pub fn with_height(mut self, y: Fixed, speed_vert: Fixed) -> Self {
        self.pos.y = y;
        self.speed_vert = speed_vert;
        self.flags |= TargetFlags::MOVE_Y;
        self
    }

    pub fn with_facing(mut self, yaw: Angle, speed_rot: i32) -> Self {
        self.yaw = yaw;
        self.speed_rot = speed_rot;
        self.flags |= TargetFlags::MOVE_ROT;
        self
    }

    pub fn frozen(mut self) -> Self {
        self.flags |= TargetFlags::FREEZE;
        self
    }

    pub fn is_frozen(&self) -> bool {
        self.flags.contains(TargetFlags::FREEZE)
    }
}

/// Merge the live axes of `incoming` into `existing`.
///
/// Axes not flagged in `incoming` keep their previous value bit for bit.
/// The freeze flag is always taken from `incoming`.
pub fn update_target(existing: &mut ActorTarget, incoming: &ActorTarget) {
    if incoming.flags.contains(TargetFlags::MOVE_XZ) {
        existing.pos.x = incoming.pos.x;
        existing.pos.z = incoming.pos.z;
        existing.speed = incoming.speed;
        existing.flags |= TargetFlags::MOVE_XZ;
    }
    if incoming.flags.contains(TargetFlags::MOVE_Y) {
        existing.pos.y = incoming.pos.y;
        existing.speed_vert = incoming.speed_vert;
        existing.flags |= TargetFlags::MOVE_Y;
    }
    if incoming.flags.contains(TargetFlags::MOVE_ROT) {
        existing.yaw = incoming.yaw;
        existing.pitch = incoming.pitch;
        existing.roll = incoming.roll;
        existing.speed_rot = incoming.speed_rot;
        existing.flags |= TargetFlags::MOVE_ROT;
    }
    existing
        .flags
        .set(TargetFlags::FREEZE, incoming.flags.contains(TargetFlags::FREEZE));
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_target() -> impl Strategy<Value = ActorTarget> {
        (
            any::<[i32; 3]>(),
            any::<[i32; 3]>(),
            any::<[i32; 3]>(),
            any::<i32>(),
            0u32..16,
        )
            .prop_map(|(pos, angles, speeds, rot, flags)| ActorTarget {
                pos: FixedVec3::new(Fixed(pos[0]), Fixed(pos[1]), Fixed(pos[2])),
                yaw: Angle::new(angles[0]),
                pitch: Angle::new(angles[1]),
                roll: Angle::new(angles[2]),
                speed: Fixed(speeds[0]),
                speed_vert: Fixed(speeds[1]),
                speed_rot: rot,
                flags: TargetFlags::from_bits_truncate(flags),
            })
    }

    proptest! {
        #[test]
        fn unflagged_axes_are_untouched(existing in arb_target(), incoming in arb_target()) {
            let mut merged = existing;
            update_target(&mut merged, &incoming);

            if !incoming.flags.contains(TargetFlags::MOVE_XZ) {
                prop_assert_eq!(merged.pos.x, existing.pos.x);
                prop_assert_eq!(merged.pos.z, existing.pos.z);
                prop_assert_eq!(merged.speed, existing.speed);
            }
            if !incoming.flags.contains(TargetFlags::MOVE_Y) {
                prop_assert_eq!(merged.pos.y, existing.pos.y);
                prop_assert_eq!(merged.speed_vert, existing.speed_vert);
            }
            if !incoming.flags.contains(TargetFlags::MOVE_ROT) {
                prop_assert_eq!(merged.yaw, existing.yaw);
                prop_assert_eq!(merged.pitch, existing.pitch);
                prop_assert_eq!(merged.roll, existing.roll);
                prop_assert_eq!(merged.speed_rot, existing.speed_rot);
            }
            prop_assert_eq!(
                merged.flags.contains(TargetFlags::FREEZE),
                incoming.flags.contains(TargetFlags::FREEZE)
            );
        }
    }

    #[test]
    fn live_axes_are_copied() {
        let mut existing = ActorTarget::default();
        let incoming = ActorTarget::position(FixedVec3::from_ints(4, 9, -2), Fixed::from_int(8));
        update_target(&mut existing, &incoming);
        assert_eq!(existing.pos.x, Fixed::from_int(4));
        assert_eq!(existing.pos.z, Fixed::from_int(-2));
        assert_eq!(existing.pos.y, Fixed::ZERO);
        assert!(existing.flags.contains(TargetFlags::MOVE_XZ));
    }

    #[test]
    fn freeze_is_propagated_both_ways() {
        let mut existing = ActorTarget::default().frozen();
        update_target(&mut existing, &ActorTarget::facing(Angle::new(10), 0));
        assert!(!existing.is_frozen());
        update_target(&mut existing, &ActorTarget::default().frozen());
        assert!(existing.is_frozen());
    }
}
