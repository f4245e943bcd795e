//! Per-actor queue of undelivered messages.

use bevy_ecs::prelude::Component;
use smallvec::SmallVec;

use crate::events::message::MessageKind;

/// Messages routed to this actor, in arrival order.
///
/// Filled by [`route_actor_messages`](crate::systems::messages::route_actor_messages)
/// and emptied by the actor's driver on its next update.
#[derive(Component, Debug, Clone, Default)]
pub struct Inbox(pub SmallVec<[MessageKind; 4]>);

impl Inbox {
    pub fn push(&mut self, message: MessageKind) {
        self.0.push(message);
    }

    pub fn take(&mut self) -> SmallVec<[MessageKind; 4]> {
        std::mem::take(&mut self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}
