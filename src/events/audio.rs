//! Sound cues emitted by actors.
//!
//! Actors never play audio themselves; they describe what should be heard
//! and [`forward_sound_cues`](crate::systems::sound::forward_sound_cues)
//! hands the cues to the host's mixer thread.

use bevy_ecs::message::Message;

use crate::fixed::FixedVec3;

#[derive(Message, Debug, Clone, PartialEq)]
pub enum SoundCue {
    /// Positional sound effect.
    Play { sound: String, pos: FixedVec3 },
    /// Switch the level music into its combat track.
    CombatMusic,
}

impl SoundCue {
    pub fn play(sound: impl Into<String>, pos: FixedVec3) -> Self {
        SoundCue::Play {
            sound: sound.into(),
            pos,
        }
    }
}
