//! Delivery of [`ActorMessage`]s to per-actor inboxes.
//!
//! Messages written during a tick (by the host, by other actors through the
//! effects buffer) are drained here and parked in the target's [`Inbox`].
//! The dispatch driver empties the inbox at the start of that actor's next
//! update, so a message is handled exactly once and in arrival order.
//!
//! Outgoing [`ProjectileSpawn`] and [`PlayerHit`] messages are left for the
//! host and aged by [`update_actor_outputs`] at the end of every tick; a
//! host that does not drain them loses anything older than one tick.

use bevy_ecs::prelude::*;
use log::warn;

use crate::components::inbox::Inbox;
use crate::events::message::ActorMessage;
use crate::events::player::PlayerHit;
use crate::events::projectile::ProjectileSpawn;

/// Move every pending [`ActorMessage`] into its target's [`Inbox`].
///
/// Contract
/// - Drains `Messages<ActorMessage>` completely; nothing is seen twice.
/// - Messages for entities without an inbox (despawned, never set up) are
///   dropped with a warning.
pub fn route_actor_messages(mut messages: ResMut<Messages<ActorMessage>>, mut inboxes: Query<&mut Inbox>) {
    for message in messages.drain() {
        match inboxes.get_mut(message.target) {
            Ok(mut inbox) => inbox.push(message.kind),
            Err(_) => warn!("dropping {:?} for missing actor {:?}", message.kind, message.target),
        }
    }
}

/// Advance the ECS message queues the host reads from.
pub fn update_actor_outputs(
    mut projectiles: ResMut<Messages<ProjectileSpawn>>,
    mut hits: ResMut<Messages<PlayerHit>>,
) {
    projectiles.update();
    hits.update();
}
