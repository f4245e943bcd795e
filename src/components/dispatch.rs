//! Generic AI actor container.
//!
//! [`ActorDispatch`] is the per-actor record driven by
//! [`actor_dispatch_system`](crate::systems::dispatch::actor_dispatch_system).
//! It owns the composed [`ActorModule`]s, the optional [`MovementModule`] and
//! the shared [`ActorState`] that every module reads and writes.

use bevy_ecs::prelude::{Component, Entity};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::components::animation::{AnimAction, AnimDef, AnimPriority, AnimTable, LogicAnimation};
use crate::components::damage::DamageModule;
use crate::components::module::{ActorModule, ModuleSlots};
use crate::components::movement::{Kinematics, MovementModule};
use crate::fixed::{Angle, Fixed, FixedVec3, Tick};

/// Default field of view, about 210 degrees.
pub const DEFAULT_FOV: i32 = 9557;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct DispatchFlags: u32 {
        /// Dormant, only polling for the player.
        const IDLE           = 1 << 0;
        /// Free to walk; cleared while attacking.
        const MOVING         = 1 << 1;
        const PLAYER_VISIBLE = 1 << 2;
        /// Wakes on sight (as opposed to scripted-only wakeups).
        const NPC            = 1 << 3;
        /// Not subject to gravity.
        const FLYING         = 1 << 4;
        /// Killed; waiting for cleanup.
        const DEAD           = 1 << 5;
        /// Out of hit points; only the damage module still runs.
        const DYING          = 1 << 6;
        /// Reeling from a hit; decision modules leave the target alone.
        const STUNNED        = 1 << 7;
    }
}

/// Allegiance used for friendly-fire mitigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Faction {
    #[default]
    Imperial,
    Alien,
    Droid,
    Creature,
}

/// State shared by every module of a dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorState {
    /// Setup keyword this actor was created from.
    pub species: String,
    pub flags: DispatchFlags,
    /// Field of view in angle units.
    pub fov: i32,
    /// The player is always noticed inside this radius.
    pub aware_range: Fixed,
    /// Ticks between idle sight checks.
    pub delay: u32,
    /// Next idle sight check.
    pub next_tick: Tick,
    #[serde(default)]
    pub kin: Kinematics,
    pub last_player_pos: FixedVec3,
    pub faction: Faction,
    /// Actors sharing a group wake each other up.
    pub alert_group: u32,
    #[serde(default)]
    pub alert_sound: Option<String>,
    pub anim_table: AnimTable,
    pub anim: LogicAnimation,
    pub anim_priority: AnimPriority,
    /// Resolved from an object id after a load.
    #[serde(skip)]
    pub last_attacker: Option<Entity>,
}

impl ActorState {
    pub fn new(species: impl Into<String>) -> Self {
        Self {
            species: species.into(),
            flags: DispatchFlags::IDLE | DispatchFlags::NPC,
            fov: DEFAULT_FOV,
            aware_range: Fixed::from_int(20),
            delay: 72,
            next_tick: 0,
            kin: Kinematics::default(),
            last_player_pos: FixedVec3::ZERO,
            faction: Faction::default(),
            alert_group: 0,
            alert_sound: None,
            anim_table: AnimTable::default(),
            anim: LogicAnimation::default(),
            anim_priority: AnimPriority::Idle,
            last_attacker: None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.flags.contains(DispatchFlags::IDLE)
    }

    pub fn is_dead(&self) -> bool {
        self.flags.contains(DispatchFlags::DEAD)
    }

    pub fn is_dying(&self) -> bool {
        self.flags.intersects(DispatchFlags::DYING | DispatchFlags::DEAD)
    }

    pub fn is_stunned(&self) -> bool {
        self.flags.contains(DispatchFlags::STUNNED)
    }

    pub fn is_flying(&self) -> bool {
        self.flags.contains(DispatchFlags::FLYING)
    }

    pub fn player_visible(&self) -> bool {
        self.flags.contains(DispatchFlags::PLAYER_VISIBLE)
    }

    /// Leave the idle state and start moving.
    pub fn wake(&mut self) -> bool {
        if !self.is_idle() || self.is_dead() {
            return false;
        }
        self.flags.remove(DispatchFlags::IDLE);
        self.flags.insert(DispatchFlags::MOVING);
        true
    }

    /// Is `yaw_to_target` inside the field of view around `facing`?
    pub fn in_fov(&self, facing: Angle, yaw_to_target: Angle) -> bool {
        facing.delta_to(yaw_to_target).abs() <= self.fov / 2
    }

    pub fn anim_for(&self, action: AnimAction) -> AnimDef {
        self.anim_table.get(action)
    }
}

/// A generic AI actor.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct ActorDispatch {
    pub state: ActorState,
    pub modules: ModuleSlots,
    pub movement: Option<MovementModule>,
}

impl ActorDispatch {
    pub fn new(state: ActorState) -> Self {
        Self {
            state,
            modules: ModuleSlots::default(),
            movement: None,
        }
    }

    pub fn with_movement(mut self, movement: MovementModule) -> Self {
        self.movement = Some(movement);
        self
    }

    /// Append a module. A full slot table hands the module back.
    pub fn add_module(&mut self, module: ActorModule) -> Result<(), ActorModule> {
        self.modules.try_add(module)
    }

    pub fn damage(&self) -> Option<&DamageModule> {
        self.modules.iter().find_map(ActorModule::as_damage)
    }

    pub fn hp(&self) -> Option<Fixed> {
        self.damage().map(|damage| damage.hp)
    }

    /// Re-derive cached module attributes from the shared state.
    pub fn compute_attributes(&mut self) {
        let ActorDispatch { state, modules, .. } = self;
        for module in modules.iter_mut() {
            module.compute_attributes(state);
        }
    }

    /// Run every module's free hook, last inserted first, and drop them.
    ///
    /// Returns `false` when there was nothing left to free.
    pub fn free_modules(&mut self) -> bool {
        let had_modules = !self.modules.is_empty() || self.movement.is_some();
        for mut module in self.modules.drain_reversed() {
            module.free();
        }
        self.movement = None;
        had_modules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_idle_npc_with_default_fov() {
        let state = ActorState::new("trooper");
        assert!(state.is_idle());
        assert!(state.flags.contains(DispatchFlags::NPC));
        assert_eq!(state.fov, DEFAULT_FOV);
    }

    #[test]
    fn wake_is_one_shot() {
        let mut state = ActorState::new("trooper");
        assert!(state.wake());
        assert!(!state.wake());
        assert!(state.flags.contains(DispatchFlags::MOVING));
    }

    #[test]
    fn dead_actors_do_not_wake() {
        let mut state = ActorState::new("trooper");
        state.flags.insert(DispatchFlags::DEAD);
        assert!(!state.wake());
    }

    #[test]
    fn fov_is_centered_on_facing() {
        let state = ActorState::new("trooper");
        let facing = Angle::ZERO;
        assert!(state.in_fov(facing, Angle::new(4000)));
        assert!(state.in_fov(facing, Angle::new(-4000)));
        assert!(!state.in_fov(facing, Angle::new(Angle::HALF)));
    }

    #[test]
    fn free_modules_runs_once() {
        let mut dispatch = ActorDispatch::new(ActorState::new("trooper"));
        dispatch
            .add_module(ActorModule::Damage(DamageModule::new(Fixed::from_int(4))))
            .unwrap();
        assert!(dispatch.free_modules());
        assert!(!dispatch.free_modules());
        assert!(dispatch.hp().is_none());
    }
}
