//! What actors know about the player.

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::components::worldobject::SectorId;
use crate::fixed::{Angle, Fixed, FixedVec3};

/// Player pose and status, written by the host every frame.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub pos: FixedVec3,
    pub yaw: Angle,
    /// Units per second.
    pub velocity: FixedVec3,
    pub sector: SectorId,
    pub eye_height: Fixed,
    pub alive: bool,
    /// Cloaked players are only noticed within the aware range.
    #[serde(default)]
    pub invisible: bool,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            pos: FixedVec3::ZERO,
            yaw: Angle::ZERO,
            velocity: FixedVec3::ZERO,
            sector: 0,
            eye_height: Fixed::from_ratio(58, 10),
            alive: true,
            invisible: false,
        }
    }
}

impl PlayerState {
    pub fn at(pos: FixedVec3) -> Self {
        Self {
            pos,
            ..Default::default()
        }
    }

    pub fn eye(&self) -> FixedVec3 {
        let mut eye = self.pos;
        eye.y += self.eye_height;
        eye
    }

    /// Point a shot should aim for.
    pub fn chest(&self) -> FixedVec3 {
        let mut chest = self.pos;
        chest.y += self.eye_height.scale(Fixed::from_int(3), Fixed::from_int(4));
        chest
    }
}
