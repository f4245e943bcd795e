//! Actor simulation core.
//!
//! This crate exposes the ECS components, resources, systems and messages
//! that drive enemy actors, plus a headless [`simulation::Simulation`]
//! driver, for use by host engines and integration tests.

pub mod components;
pub mod events;
pub mod fixed;
pub mod logic;
pub mod resources;
pub mod savegame;
pub mod simulation;
pub mod systems;
