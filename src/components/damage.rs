//! Damage module data: the hit-point pool and what dying leaves behind.
//!
//! Behaviour lives in [`crate::systems::damage`].

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::components::module::ModuleHeader;
use crate::components::remains::{EffectKind, ItemKind};
use crate::fixed::{Fixed, Tick};

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct DamageFlags: u32 {
        /// Out of hit points, waiting to touch the floor.
        const DYING   = 1 << 0;
        /// Remains spawned; nothing else may happen.
        const DEAD    = 1 << 1;
        /// Dies where it stands, even mid-air.
        const CRUSHED = 1 << 2;
        /// Recoiling from a hit with the movement target frozen.
        const STUNNED = 1 << 3;
    }
}

/// Per-species death and pain tuning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageParams {
    #[serde(default)]
    pub hurt_sound: Option<String>,
    #[serde(default)]
    pub die_sound: Option<String>,
    /// Leave a corpse showing the last death frame.
    #[serde(default = "default_corpse")]
    pub corpse: bool,
    #[serde(default)]
    pub drop: Option<ItemKind>,
    #[serde(default)]
    pub death_effect: Option<EffectKind>,
    /// Percent of a hit's force turned into knockback.
    #[serde(default = "default_knockback")]
    pub knockback: u32,
}

fn default_corpse() -> bool {
    true
}

fn default_knockback() -> u32 {
    100
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageModule {
    pub header: ModuleHeader,
    pub hp: Fixed,
    pub params: DamageParams,
    pub flags: DamageFlags,
    /// End of the current stun.
    #[serde(default)]
    pub stun_until: Tick,
    /// Length of the hurt animation, re-derived on setup and load.
    #[serde(skip)]
    pub stun_ticks: u32,
}

impl DamageModule {
    pub fn new(hp: Fixed) -> Self {
        Self::with_params(
            hp,
            DamageParams {
                corpse: true,
                knockback: default_knockback(),
                ..Default::default()
            },
        )
    }

    pub fn with_params(hp: Fixed, params: DamageParams) -> Self {
        Self {
            header: ModuleHeader::default(),
            hp,
            params,
            flags: DamageFlags::empty(),
            stun_until: 0,
            stun_ticks: 0,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.flags.contains(DamageFlags::DEAD)
    }

    pub fn is_dying(&self) -> bool {
        self.flags.contains(DamageFlags::DYING)
    }
}
