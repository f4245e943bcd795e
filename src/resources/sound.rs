//! Bridge to the host's sound mixer.

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::events::audio::SoundCue;

/// Sender end of the sound cue channel.
///
/// Created by [`setup_sound`]; the host keeps the receiver and drains it on
/// its mixer thread.
#[derive(Resource)]
pub struct SoundBridge {
    pub tx_cue: Sender<SoundCue>,
}

/// Register the bridge and the `Messages<SoundCue>` queue, returning the
/// receiver for the host.
pub fn setup_sound(world: &mut World) -> Receiver<SoundCue> {
    let (tx_cue, rx_cue) = unbounded::<SoundCue>();
    world.insert_resource(SoundBridge { tx_cue });
    world.init_resource::<Messages<SoundCue>>();
    rx_cue
}
