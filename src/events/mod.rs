//! Messages exchanged between the actor core and its host.
//!
//! Submodules:
//! - [`audio`] – sound cues for the host mixer
//! - [`effects`] – side effects buffered while actors run
//! - [`message`] – messages addressed to actors (damage, wakeups, kills)
//! - [`player`] – direct hits on the player
//! - [`projectile`] – projectile spawn requests and aiming helpers
pub mod audio;
pub mod effects;
pub mod message;
pub mod player;
pub mod projectile;
