//! Messages delivered to actors.
//!
//! The host engine (projectiles, triggers, crushers, level scripts) talks to
//! actors through [`ActorMessage`]s. They are queued in
//! `Messages<ActorMessage>`, routed into each target's
//! [`Inbox`](crate::components::inbox::Inbox) at the start of a tick and
//! handled by the actor's driver before any module update runs.

use bevy_ecs::message::Message;
use bevy_ecs::prelude::Entity;

use crate::components::dispatch::Faction;
use crate::events::projectile::ProjectileKind;
use crate::fixed::{Fixed, FixedVec3};

/// A projectile struck the actor.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileHit {
    pub damage: Fixed,
    pub kind: ProjectileKind,
    /// Whoever fired the projectile, if it is still around.
    pub source: Option<Entity>,
    pub source_faction: Option<Faction>,
    pub origin: FixedVec3,
    /// Projectile velocity at impact, units per second.
    pub velocity: FixedVec3,
    /// Knockback strength.
    pub force: Fixed,
}

impl ProjectileHit {
    pub fn new(damage: Fixed, kind: ProjectileKind) -> Self {
        Self {
            damage,
            kind,
            source: None,
            source_faction: None,
            origin: FixedVec3::ZERO,
            velocity: FixedVec3::ZERO,
            force: Fixed::ZERO,
        }
    }

    pub fn from_source(mut self, source: Entity, faction: Faction) -> Self {
        self.source = Some(source);
        self.source_faction = Some(faction);
        self
    }

    pub fn with_motion(mut self, origin: FixedVec3, velocity: FixedVec3, force: Fixed) -> Self {
        self.origin = origin;
        self.velocity = velocity;
        self.force = force;
        self
    }
}

/// Splash damage from a blast centred on `origin`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplosionHit {
    pub damage: Fixed,
    pub force: Fixed,
    pub origin: FixedVec3,
    pub source: Option<Entity>,
    pub source_faction: Option<Faction>,
}

impl ExplosionHit {
    pub fn new(damage: Fixed, force: Fixed, origin: FixedVec3) -> Self {
        Self {
            damage,
            force,
            origin,
            source: None,
            source_faction: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessageKind {
    Wakeup,
    Damage(ProjectileHit),
    Explosion(ExplosionHit),
    /// Fell too far; dies on landing.
    TerminalVelocity,
    /// Squashed by geometry; dies on the spot.
    Crush,
    /// Remove the actor without a death sequence.
    Free,
}

impl MessageKind {
    pub fn is_hostile(&self) -> bool {
        matches!(self, MessageKind::Damage(_) | MessageKind::Explosion(_))
    }

    /// Raw damage carried by the message, before any mitigation.
    pub fn damage(&self) -> Option<(Fixed, Option<Faction>)> {
        match self {
            MessageKind::Damage(hit) => Some((hit.damage, hit.source_faction)),
            MessageKind::Explosion(hit) => Some((hit.damage, hit.source_faction)),
            _ => None,
        }
    }

    pub fn source(&self) -> Option<Entity> {
        match self {
            MessageKind::Damage(hit) => hit.source,
            MessageKind::Explosion(hit) => hit.source,
            _ => None,
        }
    }
}

/// A message addressed to one actor.
#[derive(Message, Debug, Clone, PartialEq)]
pub struct ActorMessage {
    pub target: Entity,
    pub kind: MessageKind,
}

impl ActorMessage {
    pub fn new(target: Entity, kind: MessageKind) -> Self {
        Self { target, kind }
    }
}
