//! ECS resources made available to systems.
//!
//! Long-lived data injected into the world and shared by every actor during
//! a tick.
//!
//! Overview
//! - `aiconfig` – global AI tuning loaded from an INI file
//! - `collision` – the collision service actors move through, plus a flat test arena
//! - `objectids` – stable object ids and their live entities
//! - `player` – player pose and status as seen by actors
//! - `rng` – seeded random source
//! - `simclock` – simulation tick counter
//! - `sound` – channel to the host's sound mixer
//! - `species` – keyword to species definitions, with JSON overrides
pub mod aiconfig;
pub mod collision;
pub mod objectids;
pub mod player;
pub mod rng;
pub mod simclock;
pub mod sound;
pub mod species;
