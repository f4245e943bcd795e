//! Thinker and flyer module data.
//!
//! A thinker alternates between two states. `Turn` picks a new point to walk
//! to, biased towards the player; `Move` walks there until it arrives, times
//! out or bumps into something. Bumping randomizes the heading and grows a
//! retry backoff so actors do not grind against the same wall. The flyer is
//! the same machine with a live vertical axis.
//!
//! Behaviour lives in [`crate::systems::thinker`].

use serde::{Deserialize, Serialize};

use crate::components::animation::AnimDef;
use crate::components::module::ModuleHeader;
use crate::fixed::{Fixed, FixedVec3, Tick};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ThinkerState {
    Move,
    #[default]
    Turn,
}

/// Per-species walking tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThinkerParams {
    /// Walking speed, units per second.
    pub speed: Fixed,
    /// Turning speed, angle units per second.
    pub speed_rot: i32,
    /// Distance to keep from the point being approached.
    pub target_offset: Fixed,
    /// Random spread added to `target_offset`.
    pub target_variation: Fixed,
    /// Random spread of the approach heading, angle units.
    pub approach_variation: i32,
    /// Give up on a walk after this many ticks.
    pub max_walk_time: u32,
    /// First backoff after a bump, ticks.
    pub backoff_base: u32,
    pub backoff_cap: u32,
}

impl Default for ThinkerParams {
    fn default() -> Self {
        Self {
            speed: Fixed::from_int(14),
            speed_rot: 8192,
            target_offset: Fixed::from_int(30),
            target_variation: Fixed::from_int(20),
            approach_variation: 4096,
            max_walk_time: 580,
            backoff_base: 36,
            backoff_cap: 580,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinkerModule {
    pub header: ModuleHeader,
    pub state: ThinkerState,
    pub params: ThinkerParams,
    /// Point currently walked to.
    pub target: FixedVec3,
    /// Deadline of the current walk.
    pub walk_until: Tick,
    /// Current retry backoff, zero after a clean arrival.
    #[serde(default)]
    pub backoff: u32,
    /// Walk animation from the species table.
    #[serde(skip)]
    pub walk_anim: Option<AnimDef>,
}

impl Default for ThinkerModule {
    fn default() -> Self {
        Self::new(ThinkerParams::default())
    }
}

impl ThinkerModule {
    pub fn new(params: ThinkerParams) -> Self {
        Self {
            header: ModuleHeader::default(),
            state: ThinkerState::Turn,
            params,
            target: FixedVec3::ZERO,
            walk_until: 0,
            backoff: 0,
            walk_anim: None,
        }
    }

    /// Double the backoff (starting from the base) up to the cap.
    pub fn grow_backoff(&mut self) -> u32 {
        self.backoff = if self.backoff == 0 {
            self.params.backoff_base
        } else {
            self.backoff.saturating_mul(2)
        }
        .min(self.params.backoff_cap);
        self.backoff
    }
}

/// Height band a flyer hovers in, relative to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoverParams {
    pub min_height: Fixed,
    pub max_height: Fixed,
    /// Vertical speed, units per second.
    pub speed_vert: Fixed,
}

impl Default for HoverParams {
    fn default() -> Self {
        Self {
            min_height: Fixed::from_int(4),
            max_height: Fixed::from_int(16),
            speed_vert: Fixed::from_int(10),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlyerModule {
    pub thinker: ThinkerModule,
    pub hover: HoverParams,
}

impl FlyerModule {
    pub fn new(params: ThinkerParams, hover: HoverParams) -> Self {
        Self {
            thinker: ThinkerModule::new(params),
            hover,
        }
    }
}
