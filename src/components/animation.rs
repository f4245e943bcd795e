//! Logic-side animation state.
//!
//! Actors do not render, but their decisions are synchronised with
//! animation: an attack fires when the attack animation starts, a corpse
//! appears when the death animation ends. [`LogicAnimation`] is the frame
//! counter driven by the simulation; [`RenderFrame`] is the one animation per
//! actor that is published to the renderer each tick.
//!
//! # Priority
//!
//! Several modules may ask for an animation during the same tick. Requests
//! carry an [`AnimPriority`] and the highest one wins (see
//! [`crate::systems::animation::apply_request`]).

use bevy_ecs::prelude::Component;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::fixed::{Fixed, TICKS_PER_SECOND};

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct AnimFlags: u32 {
        /// Nothing pending: the animation finished (or was never started).
        const READY     = 1 << 0;
        /// Clamp on the last frame instead of looping.
        const PLAY_ONCE = 1 << 1;
    }
}

/// What an actor is doing, used to look up an animation in an [`AnimTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimAction {
    Idle,
    Walk,
    Attack1,
    Attack1End,
    Attack2,
    Attack2End,
    Hurt,
    Die1,
    Die2,
    Fly,
}

impl AnimAction {
    pub const COUNT: usize = 10;

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Who asked for an animation. Higher wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum AnimPriority {
    #[default]
    Idle,
    Move,
    Attack,
    Hurt,
    Death,
}

/// Static description of one animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimDef {
    /// Renderer animation index; negative means "no animation".
    pub anim_id: i32,
    pub frame_count: u32,
    /// Frames per second.
    pub frame_rate: u32,
    #[serde(default)]
    pub play_once: bool,
}

impl AnimDef {
    pub const NONE: AnimDef = AnimDef {
        anim_id: -1,
        frame_count: 1,
        frame_rate: 0,
        play_once: true,
    };

    pub const fn looping(anim_id: i32, frame_count: u32, frame_rate: u32) -> Self {
        Self {
            anim_id,
            frame_count,
            frame_rate,
            play_once: false,
        }
    }

    pub const fn once(anim_id: i32, frame_count: u32, frame_rate: u32) -> Self {
        Self {
            anim_id,
            frame_count,
            frame_rate,
            play_once: true,
        }
    }

    pub const fn is_none(&self) -> bool {
        self.anim_id < 0
    }

    /// Ticks a play-once run of this animation lasts.
    pub fn duration_ticks(&self) -> u32 {
        if self.frame_rate == 0 {
            return 0;
        }
        (self.frame_count * TICKS_PER_SECOND).div_ceil(self.frame_rate)
    }
}

/// Per-species lookup from [`AnimAction`] to [`AnimDef`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimTable {
    entries: Vec<Option<AnimDef>>,
}

impl Default for AnimTable {
    fn default() -> Self {
        Self {
            entries: vec![None; AnimAction::COUNT],
        }
    }
}

impl AnimTable {
    pub fn with(mut self, action: AnimAction, def: AnimDef) -> Self {
        self.set(action, def);
        self
    }

    pub fn set(&mut self, action: AnimAction, def: AnimDef) {
        if self.entries.len() < AnimAction::COUNT {
            self.entries.resize(AnimAction::COUNT, None);
        }
        self.entries[action.index()] = Some(def);
    }

    /// Look up an animation; a missing entry yields [`AnimDef::NONE`].
    pub fn get(&self, action: AnimAction) -> AnimDef {
        self.entries
            .get(action.index())
            .copied()
            .flatten()
            .unwrap_or(AnimDef::NONE)
    }

    /// Look up by raw index, clamping out-of-range values onto the table.
    pub fn by_index(&self, index: i32) -> AnimDef {
        if self.entries.is_empty() {
            return AnimDef::NONE;
        }
        let last = self.entries.len() as i32 - 1;
        let index = index.clamp(0, last) as usize;
        self.entries[index].unwrap_or(AnimDef::NONE)
    }
}

/// Running animation: a fixed-point frame counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicAnimation {
    pub anim_id: i32,
    pub frame: Fixed,
    pub frame_rate: u32,
    pub start_frame: u32,
    pub frame_count: u32,
    pub flags: AnimFlags,
}

impl Default for LogicAnimation {
    fn default() -> Self {
        Self {
            anim_id: -1,
            frame: Fixed::ZERO,
            frame_rate: 0,
            start_frame: 0,
            frame_count: 1,
            flags: AnimFlags::READY | AnimFlags::PLAY_ONCE,
        }
    }
}

impl LogicAnimation {
    /// Activate `def`; the frame snaps to its start.
    pub fn start(def: &AnimDef) -> Self {
        let mut flags = AnimFlags::empty();
        if def.play_once {
            flags |= AnimFlags::PLAY_ONCE;
        }
        if def.is_none() {
            flags |= AnimFlags::READY;
        }
        Self {
            anim_id: def.anim_id,
            frame: Fixed::ZERO,
            frame_rate: def.frame_rate,
            start_frame: 0,
            frame_count: def.frame_count.max(1),
            flags,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.flags.contains(AnimFlags::READY)
    }

    pub fn is_play_once(&self) -> bool {
        self.flags.contains(AnimFlags::PLAY_ONCE)
    }

    pub fn is_none(&self) -> bool {
        self.anim_id < 0
    }

    /// Whole frame index shown to the renderer.
    pub fn frame_index(&self) -> u32 {
        self.frame.floor().max(0) as u32
    }

    /// Advance by `elapsed_ticks`. Returns `true` once a play-once animation
    /// has reached its last frame (and on every later call).
    pub fn advance(&mut self, elapsed_ticks: u32) -> bool {
        if self.is_ready() {
            return true;
        }
        let step = Fixed::from_int(self.frame_rate as i32).per_ticks(elapsed_ticks);
        self.frame += step;

        let start = Fixed::from_int(self.start_frame as i32);
        let end = Fixed::from_int((self.start_frame + self.frame_count) as i32);
        if self.frame < end {
            return false;
        }
        if self.is_play_once() {
            self.frame = end - Fixed::ONE;
            self.flags |= AnimFlags::READY;
            true
        } else {
            let span = end - start;
            self.frame = start + Fixed((self.frame - start).0 % span.0);
            false
        }
    }
}

/// Animation frame published for the renderer.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderFrame {
    pub anim_id: i32,
    pub frame: u32,
}
