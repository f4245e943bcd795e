//! Attack module data.
//!
//! The attack module is a six state machine:
//!
//! ```text
//! Delay -> Decide -> Attack1 -> Animate1 -> Delay   (melee)
//!                 \-> Attack2 -> Animate2 -> Delay  (ranged)
//!                 \-> Delay                         (nothing to do)
//! ```
//!
//! `Decide` re-checks sight, distance and vertical angle every time it runs.
//! Melee wins when the player is close enough; otherwise a ranged attack is
//! made when permitted and the player is beyond the stand-off distance.
//! Behaviour lives in [`crate::systems::attack`].

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::components::module::ModuleHeader;
use crate::events::projectile::ProjectileKind;
use crate::fixed::{Fixed, FixedVec3, Tick};

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct AttackFlags: u32 {
        const MELEE  = 1 << 0;
        const RANGED = 1 << 1;
        /// Aim where a moving player will be.
        const LEAD   = 1 << 2;
        /// Lob projectiles on a ballistic arc.
        const ARCING = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AttackState {
    #[default]
    Delay,
    Decide,
    /// Melee wind-up.
    Attack1,
    /// Ranged wind-up.
    Attack2,
    /// Melee recovery.
    Animate1,
    /// Ranged recovery.
    Animate2,
}

/// Per-species attack tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackParams {
    pub flags: AttackFlags,
    pub projectile: ProjectileKind,
    pub melee_damage: Fixed,
    pub melee_range: Fixed,
    /// Ranged attacks are only made beyond this distance.
    pub min_dist: Fixed,
    pub max_dist: Fixed,
    /// Launch point relative to the actor: `x` right, `y` up, `z` forward.
    pub fire_offset: FixedVec3,
    /// Ticks between decisions.
    pub delay: u32,
    /// Random extra ticks added to `delay`.
    pub delay_variation: u32,
    /// Aim jitter in angle units when combat starts.
    pub spread_start: Fixed,
    pub spread_floor: Fixed,
    /// Spread lost per second of combat.
    pub spread_decay: Fixed,
    /// Largest vertical aim angle, in angle units.
    pub max_pitch: i32,
    /// Turn rate while aiming, angle units per second.
    pub speed_rot: i32,
    #[serde(default)]
    pub melee_sound: Option<String>,
    #[serde(default)]
    pub fire_sound: Option<String>,
}

impl Default for AttackParams {
    fn default() -> Self {
        Self {
            flags: AttackFlags::RANGED,
            projectile: ProjectileKind::RifleBolt,
            melee_damage: Fixed::ZERO,
            melee_range: Fixed::ZERO,
            min_dist: Fixed::ZERO,
            max_dist: Fixed::from_int(160),
            fire_offset: FixedVec3::new(Fixed::ZERO, Fixed::from_int(4), Fixed::ONE),
            delay: 145,
            delay_variation: 72,
            spread_start: Fixed::from_int(512),
            spread_floor: Fixed::from_int(64),
            spread_decay: Fixed::from_int(96),
            max_pitch: 2275,
            speed_rot: 8192,
            melee_sound: None,
            fire_sound: None,
        }
    }
}

impl AttackParams {
    pub fn ranged(projectile: ProjectileKind) -> Self {
        Self {
            projectile,
            ..Default::default()
        }
    }

    pub fn melee(damage: Fixed, range: Fixed) -> Self {
        Self {
            flags: AttackFlags::MELEE,
            projectile: ProjectileKind::Punch,
            melee_damage: damage,
            melee_range: range,
            ..Default::default()
        }
    }

    pub fn with_melee(mut self, damage: Fixed, range: Fixed) -> Self {
        self.flags |= AttackFlags::MELEE;
        self.melee_damage = damage;
        self.melee_range = range;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackModule {
    pub header: ModuleHeader,
    pub state: AttackState,
    pub params: AttackParams,
    /// Current aim jitter in angle units.
    pub fire_spread: Fixed,
    /// Set once the player has been engaged; starts the spread decay.
    #[serde(default)]
    pub in_combat: bool,
    /// Tick of the last update, for spread decay.
    #[serde(default)]
    pub last_tick: Tick,
    /// Copied from the dispatch flags; flyers ignore the pitch limit.
    #[serde(skip)]
    pub flying: bool,
}

impl AttackModule {
    pub fn new(params: AttackParams) -> Self {
        Self {
            header: ModuleHeader::default(),
            state: AttackState::Delay,
            fire_spread: params.spread_start,
            params,
            in_combat: false,
            last_tick: 0,
            flying: false,
        }
    }

    pub fn is_attacking(&self) -> bool {
        !matches!(self.state, AttackState::Delay | AttackState::Decide)
    }
}
