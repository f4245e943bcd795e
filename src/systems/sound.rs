//! Sound cue forwarding.
//!
//! Actors write [`SoundCue`] messages (through the effects buffer); the host
//! mixer owns the receiving end of the [`SoundBridge`] channel.
//! - [`forward_sound_cues`] pushes this tick's cues onto the channel.
//! - [`update_sound_cues`] advances the message queue afterwards.
//!
//! See also [`crate::resources::sound::setup_sound`].

use bevy_ecs::prelude::*;

use crate::events::audio::SoundCue;
use crate::resources::sound::SoundBridge;

/// Forward ECS sound cues to the host via the bridge sender.
pub fn forward_sound_cues(bridge: Res<SoundBridge>, mut reader: MessageReader<SoundCue>) {
    for cue in reader.read() {
        // The host may have dropped its receiver on shutdown.
        let _ = bridge.tx_cue.send(cue.clone());
    }
}

/// Advance the ECS message queue for [`SoundCue`].
pub fn update_sound_cues(mut cues: ResMut<Messages<SoundCue>>) {
    cues.update();
}
