//! Movement module and the kinematic state shared with physics.
//!
//! The movement module eases an object towards its [`ActorTarget`] through the
//! collision service; [`Kinematics`] carries the free-body part (knockback,
//! gravity, floor contact) that is integrated separately.
//!
//! The per-tick logic lives in [`crate::systems::movement`].

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::components::target::ActorTarget;
use crate::fixed::FixedVec3;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct MovementFlags: u32 {
        /// Retry a blocked step once along the wall.
        const RESPONSE_SLIDE = 1 << 0;
        /// Never walk off a ledge.
        const AVOID_LEDGES   = 1 << 1;
        /// Duck into wall openings instead of stopping.
        const USE_GAPS       = 1 << 2;
    }
}

/// What stopped the last movement step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveCollision {
    Wall,
    Ledge,
    Object,
}

/// Collision-integrated easing towards a target pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementModule {
    pub target: ActorTarget,
    pub flags: MovementFlags,
    #[serde(default)]
    pub last_collision: Option<MoveCollision>,
}

impl Default for MovementModule {
    fn default() -> Self {
        Self {
            target: ActorTarget::default(),
            flags: MovementFlags::RESPONSE_SLIDE | MovementFlags::AVOID_LEDGES,
            last_collision: None,
        }
    }
}

impl MovementModule {
    pub fn new(flags: MovementFlags) -> Self {
        Self {
            flags,
            ..Default::default()
        }
    }
}

/// Free-body state: velocity from knockback and gravity, plus floor contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Kinematics {
    pub velocity: FixedVec3,
    pub on_floor: bool,
    pub floor_is_liquid: bool,
}

impl Kinematics {
    /// Resting on solid ground.
    pub fn grounded(&self) -> bool {
        self.on_floor && !self.floor_is_liquid
    }

    pub fn push(&mut self, impulse: FixedVec3) {
        self.velocity += impulse;
    }
}
