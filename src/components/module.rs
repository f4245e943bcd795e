//! Pluggable behaviour modules and the context they run in.
//!
//! A generic actor is an [`ActorDispatch`](super::dispatch::ActorDispatch)
//! that owns a handful of modules. Each module implements the capability set
//! of [`ModuleBehavior`]: a periodic `update`, a `handle_message` hook, a
//! `compute_attributes` hook re-deriving cached values after setup or load,
//! and a `free` hook run during cleanup.
//!
//! Modules never reach for global state. Everything they may read or write
//! for the current tick is handed to them explicitly: the actor's own parts
//! through [`ActorParts`] and the world through [`ActorContext`].

use arrayvec::ArrayVec;
use bevy_ecs::prelude::Entity;
use serde::{Deserialize, Serialize};

use crate::components::animation::{AnimDef, AnimPriority, LogicAnimation};
use crate::components::attack::AttackModule;
use crate::components::damage::DamageModule;
use crate::components::dispatch::ActorState;
use crate::components::movement::MovementModule;
use crate::components::target::{ActorTarget, update_target};
use crate::components::thinker::{FlyerModule, ThinkerModule};
use crate::components::worldobject::WorldObject;
use crate::events::effects::ActorEffects;
use crate::events::message::MessageKind;
use crate::fixed::{Fixed, Tick};
use crate::resources::aiconfig::AiConfig;
use crate::resources::collision::CollisionService;
use crate::resources::player::PlayerState;
use crate::resources::rng::SimRng;

/// Hard cap on modules per dispatch (the movement module is not counted).
pub const MAX_MODULES: usize = 6;

/// Stable module type tag, used by save games instead of code addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    Attack,
    Damage,
    Thinker,
    Flyer,
}

impl ModuleKind {
    pub const ALL: [ModuleKind; 4] = [
        ModuleKind::Attack,
        ModuleKind::Damage,
        ModuleKind::Thinker,
        ModuleKind::Flyer,
    ];

    pub const fn tag(self) -> &'static str {
        match self {
            ModuleKind::Attack => "attack",
            ModuleKind::Damage => "damage",
            ModuleKind::Thinker => "thinker",
            ModuleKind::Flyer => "flyer",
        }
    }

    pub fn from_tag(tag: &str) -> Option<ModuleKind> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

/// Fields shared by every module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModuleHeader {
    /// First tick at which `update` may run again.
    pub next_tick: Tick,
}

/// Capability set implemented by every module type.
pub trait ModuleBehavior {
    fn kind(&self) -> ModuleKind;

    fn header(&self) -> &ModuleHeader;

    fn header_mut(&mut self) -> &mut ModuleHeader;

    /// Run one decision step; returns the next due tick
    /// ([`TICK_NEVER`](crate::fixed::TICK_NEVER) disables the module).
    fn update(&mut self, parts: &mut ActorParts<'_>, ctx: &mut ActorContext<'_>) -> Tick;

    fn handle_message(
        &mut self,
        _message: &MessageKind,
        _parts: &mut ActorParts<'_>,
        _ctx: &mut ActorContext<'_>,
    ) {
    }

    fn compute_attributes(&mut self, _state: &ActorState) {}

    fn free(&mut self) {}
}

/// Closed set of composable modules.
#[derive(Debug, Clone, PartialEq)]
pub enum ActorModule {
    Attack(AttackModule),
    Damage(DamageModule),
    Thinker(ThinkerModule),
    Flyer(FlyerModule),
}

impl ActorModule {
    fn behavior(&self) -> &dyn ModuleBehavior {
        match self {
            ActorModule::Attack(m) => m,
            ActorModule::Damage(m) => m,
            ActorModule::Thinker(m) => m,
            ActorModule::Flyer(m) => m,
        }
    }

    fn behavior_mut(&mut self) -> &mut dyn ModuleBehavior {
        match self {
            ActorModule::Attack(m) => m,
            ActorModule::Damage(m) => m,
            ActorModule::Thinker(m) => m,
            ActorModule::Flyer(m) => m,
        }
    }

    pub fn kind(&self) -> ModuleKind {
        self.behavior().kind()
    }

    pub fn next_tick(&self) -> Tick {
        self.behavior().header().next_tick
    }

    pub fn set_next_tick(&mut self, tick: Tick) {
        self.behavior_mut().header_mut().next_tick = tick;
    }

    pub fn update(&mut self, parts: &mut ActorParts<'_>, ctx: &mut ActorContext<'_>) -> Tick {
        self.behavior_mut().update(parts, ctx)
    }

    pub fn handle_message(
        &mut self,
        message: &MessageKind,
        parts: &mut ActorParts<'_>,
        ctx: &mut ActorContext<'_>,
    ) {
        self.behavior_mut().handle_message(message, parts, ctx);
    }

    pub fn compute_attributes(&mut self, state: &ActorState) {
        self.behavior_mut().compute_attributes(state);
    }

    pub fn free(&mut self) {
        self.behavior_mut().free();
    }

    pub fn as_damage(&self) -> Option<&DamageModule> {
        match self {
            ActorModule::Damage(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_attack(&self) -> Option<&AttackModule> {
        match self {
            ActorModule::Attack(m) => Some(m),
            _ => None,
        }
    }
}

/// Ordered, capacity-checked module storage.
///
/// Insertion order is kept; the dispatcher invokes modules in reverse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleSlots(ArrayVec<ActorModule, MAX_MODULES>);

impl ModuleSlots {
    /// Append into the next free slot. A full table hands the module back.
    pub fn try_add(&mut self, module: ActorModule) -> Result<(), ActorModule> {
        self.0.try_push(module).map_err(|err| err.element())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ActorModule> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut ActorModule> {
        self.0.iter_mut()
    }

    pub fn kinds(&self) -> Vec<ModuleKind> {
        self.0.iter().map(ActorModule::kind).collect()
    }

    /// Remove every module, last inserted first.
    pub fn drain_reversed(&mut self) -> Vec<ActorModule> {
        let mut drained: Vec<ActorModule> = self.0.drain(..).collect();
        drained.reverse();
        drained
    }
}

/// Mutable view of the actor a module belongs to.
pub struct ActorParts<'a> {
    pub object: &'a mut WorldObject,
    pub state: &'a mut ActorState,
    pub movement: Option<&'a mut MovementModule>,
}

impl ActorParts<'_> {
    /// Merge `target` into the movement module's target, if there is one.
    pub fn update_target(&mut self, target: &ActorTarget) {
        if let Some(movement) = self.movement.as_deref_mut() {
            update_target(&mut movement.target, target);
        }
    }

    /// Did the movement module hit something on its last step?
    pub fn collided(&self) -> bool {
        self.movement
            .as_deref()
            .is_some_and(|movement| movement.last_collision.is_some())
    }
}

/// An animation someone asked for this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimRequest {
    pub priority: AnimPriority,
    pub anim: LogicAnimation,
}

/// Everything outside the actor that a module may use during one tick.
///
/// Built fresh by the driver for every actor; replaces any notion of a
/// "current actor" global.
pub struct ActorContext<'a> {
    pub entity: Entity,
    pub tick: Tick,
    pub delta_ticks: u32,
    pub player: &'a PlayerState,
    pub collision: &'a dyn CollisionService,
    pub config: &'a AiConfig,
    pub rng: &'a mut SimRng,
    pub effects: &'a mut ActorEffects,
    anim_request: Option<AnimRequest>,
    killed: bool,
}

impl<'a> ActorContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        entity: Entity,
        tick: Tick,
        delta_ticks: u32,
        player: &'a PlayerState,
        collision: &'a dyn CollisionService,
        config: &'a AiConfig,
        rng: &'a mut SimRng,
        effects: &'a mut ActorEffects,
    ) -> Self {
        Self {
            entity,
            tick,
            delta_ticks,
            player,
            collision,
            config,
            rng,
            effects,
            anim_request: None,
            killed: false,
        }
    }

    /// Seconds covered by this tick.
    pub fn dt(&self) -> Fixed {
        Fixed::from_ticks(self.delta_ticks)
    }

    /// `ticks` from now, saturating below [`TICK_NEVER`](crate::fixed::TICK_NEVER).
    pub fn after(&self, ticks: u32) -> Tick {
        self.tick.saturating_add(ticks).min(crate::fixed::TICK_NEVER - 1)
    }

    /// Ask for `def` to become the actor's animation. The highest priority
    /// request of the tick wins; ties go to the earlier request.
    pub fn request_animation(&mut self, priority: AnimPriority, def: &AnimDef) {
        let replace = match &self.anim_request {
            Some(current) => priority > current.priority,
            None => true,
        };
        if replace {
            self.anim_request = Some(AnimRequest {
                priority,
                anim: LogicAnimation::start(def),
            });
        }
    }

    pub fn take_anim_request(&mut self) -> Option<AnimRequest> {
        self.anim_request.take()
    }

    /// Mark the actor dead; no further module runs this tick.
    pub fn kill(&mut self) {
        self.killed = true;
    }

    pub fn is_killed(&self) -> bool {
        self.killed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for kind in ModuleKind::ALL {
            assert_eq!(ModuleKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(ModuleKind::from_tag("teleporter"), None);
    }

    #[test]
    fn slots_reject_overflow() {
        let mut slots = ModuleSlots::default();
        for _ in 0..MAX_MODULES {
            assert!(slots.try_add(ActorModule::Damage(DamageModule::new(Fixed::ONE))).is_ok());
        }
        let rejected = slots.try_add(ActorModule::Thinker(ThinkerModule::default()));
        assert!(matches!(rejected, Err(ActorModule::Thinker(_))));
        assert_eq!(slots.len(), MAX_MODULES);
    }

    #[test]
    fn drain_reversed_returns_last_first() {
        let mut slots = ModuleSlots::default();
        slots.try_add(ActorModule::Damage(DamageModule::new(Fixed::ONE))).unwrap();
        slots.try_add(ActorModule::Thinker(ThinkerModule::default())).unwrap();
        let kinds: Vec<ModuleKind> = slots.drain_reversed().iter().map(ActorModule::kind).collect();
        assert_eq!(kinds, vec![ModuleKind::Thinker, ModuleKind::Damage]);
        assert!(slots.is_empty());
    }
}
