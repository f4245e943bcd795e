//! Direct hits on the player.

use bevy_ecs::message::Message;
use bevy_ecs::prelude::Entity;

use crate::events::projectile::ProjectileKind;
use crate::fixed::Fixed;

/// A melee strike or hitscan attack that landed on the player.
#[derive(Message, Debug, Clone, PartialEq)]
pub struct PlayerHit {
    pub damage: Fixed,
    pub kind: ProjectileKind,
    pub source: Entity,
}
