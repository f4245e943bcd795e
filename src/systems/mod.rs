//! Simulation systems.
//!
//! This module groups the ECS systems and per-actor routines that advance
//! the actor simulation one tick at a time.
//!
//! Submodules overview
//! - [`animation`] – settle animation requests, advance frames, publish them
//! - [`attack`] – attack module state machine
//! - [`boss`] – shared boss scheduler and the per-boss handler tables
//! - [`damage`] – hit points, pain and death of generic actors
//! - [`dispatch`] – per-tick driver for generic actors
//! - [`messages`] – route actor messages into inboxes
//! - [`movement`] – movement module steps and free-body physics
//! - [`sound`] – forward sound cues to the host mixer
//! - [`thinker`] – walking and hovering decision logic
//! - [`time`] – advance the simulation clock

pub mod animation;
pub mod attack;
pub mod boss;
pub mod damage;
pub mod dispatch;
pub mod messages;
pub mod movement;
pub mod sound;
pub mod thinker;
pub mod time;
