//! ECS components for simulated objects.
//!
//! This module groups the component types attached to actors and the
//! objects they leave behind, plus the plain data types (modules, targets,
//! animation state) stored inside them.
//!
//! Submodules overview:
//! - [`animation`] – logic-side animation counter, animation tables and the published render frame
//! - [`attack`] – attack module data (six state combat machine)
//! - [`damage`] – damage module data (hit points, death remains)
//! - [`dispatch`] – the generic actor container and its shared state
//! - [`inbox`] – per-actor queue of undelivered messages
//! - [`module`] – module enum, capability trait and the per-tick context
//! - [`movement`] – movement module and free-body kinematics
//! - [`physicsactor`] – boss state machines and their locals
//! - [`remains`] – corpses, pickups and effects
//! - [`target`] – desired pose and the live-axis merge
//! - [`thinker`] – thinker and flyer module data
//! - [`worldobject`] – pose and collision cylinder, plus stable object ids

pub mod animation;
pub mod attack;
pub mod damage;
pub mod dispatch;
pub mod inbox;
pub mod module;
pub mod movement;
pub mod physicsactor;
pub mod remains;
pub mod target;
pub mod thinker;
pub mod worldobject;
