//! The world-space object an actor drives.
//!
//! Every simulated entity (generic actor, boss, corpse, pickup) carries a
//! [`WorldObject`]: its pose, the sector it stands in and the cylinder used
//! for collision. Actor logic only ever moves objects through the collision
//! adapter, never by writing `pos` from outside the movement code.

use bevy_ecs::prelude::Component;
use serde::{Deserialize, Serialize};

use crate::fixed::{Angle, Fixed, FixedVec3, angle_dir};

/// Level sector index, owned by the external level system.
pub type SectorId = u32;

/// Pose and collision cylinder of an object.
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldObject {
    pub pos: FixedVec3,
    pub yaw: Angle,
    pub pitch: Angle,
    pub roll: Angle,
    pub sector: SectorId,
    /// Collision radius.
    pub radius: Fixed,
    /// Height above `pos.y`.
    pub height: Fixed,
}

impl WorldObject {
    pub fn new(pos: FixedVec3, yaw: Angle, sector: SectorId) -> Self {
        Self {
            pos,
            yaw,
            pitch: Angle::ZERO,
            roll: Angle::ZERO,
            sector,
            radius: Fixed::from_int(2),
            height: Fixed::from_int(6),
        }
    }

    pub fn with_geometry(mut self, radius: Fixed, height: Fixed) -> Self {
        self.radius = radius;
        self.height = height;
        self
    }

    /// Point roughly at head height, used for sight lines and projectile spawns.
    pub fn eye(&self) -> FixedVec3 {
        let mut eye = self.pos;
        eye.y += self.height - self.height.div_int(4);
        eye
    }

    /// Unit heading vector `(x, z)`.
    pub fn forward(&self) -> (Fixed, Fixed) {
        angle_dir(self.yaw)
    }
}

/// Stable identity that survives save/load.
///
/// Entity ids are not persisted; any reference between objects is stored as
/// an [`ObjectId`] and re-resolved after a load.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u32);
