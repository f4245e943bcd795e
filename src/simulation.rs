//! Headless driver for the actor core.
//!
//! [`Simulation`] owns a [`World`] with every resource the actor systems
//! read and a [`Schedule`] running one tick per call:
//!
//! 1. [`advance_sim_clock`]
//! 2. [`route_actor_messages`]
//! 3. [`actor_dispatch_system`] (generic actors)
//! 4. [`physics_actor_system`] (bosses)
//! 5. [`forward_sound_cues`] and [`update_sound_cues`]
//!
//! Projectile and player-hit requests accumulate until the host drains them.

use std::io::{Read, Write};

use bevy_ecs::prelude::*;
use crossbeam_channel::Receiver;
use log::debug;

use crate::components::worldobject::WorldObject;
use crate::events::audio::SoundCue;
use crate::events::message::{ActorMessage, MessageKind};
use crate::events::player::PlayerHit;
use crate::events::projectile::ProjectileSpawn;
use crate::fixed::Tick;
use crate::logic::{LogicHandle, SetupError, cleanup_logic, setup_actor};
use crate::resources::aiconfig::AiConfig;
use crate::resources::collision::{Collision, CollisionService};
use crate::resources::objectids::ObjectIds;
use crate::resources::player::PlayerState;
use crate::resources::rng::SimRng;
use crate::resources::simclock::SimClock;
use crate::resources::sound::setup_sound;
use crate::resources::species::SpeciesStore;
use crate::savegame::{self, LoadSummary, SaveError};
use crate::systems::boss::physics_actor_system;
use crate::systems::dispatch::actor_dispatch_system;
use crate::systems::messages::{route_actor_messages, update_actor_outputs};
use crate::systems::sound::{forward_sound_cues, update_sound_cues};
use crate::systems::time::advance_sim_clock;

pub struct Simulation {
    world: World,
    schedule: Schedule,
    sound_rx: Receiver<SoundCue>,
}

impl Simulation {
    pub fn new(config: AiConfig, collision: impl CollisionService + 'static) -> Self {
        let mut world = World::new();
        world.insert_resource(SimClock::default());
        world.insert_resource(PlayerState::default());
        world.insert_resource(SimRng::with_seed(config.seed));
        world.insert_resource(Collision::new(collision));
        world.insert_resource(config);
        world.insert_resource(SpeciesStore::new());
        world.insert_resource(ObjectIds::default());
        world.init_resource::<Messages<ActorMessage>>();
        world.init_resource::<Messages<ProjectileSpawn>>();
        world.init_resource::<Messages<PlayerHit>>();
        let sound_rx = setup_sound(&mut world);

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                advance_sim_clock,
                route_actor_messages,
                actor_dispatch_system,
                physics_actor_system,
                forward_sound_cues,
                update_sound_cues,
                update_actor_outputs,
            )
                .chain(),
        );

        Self {
            world,
            schedule,
            sound_rx,
        }
    }

    /// Replace the built-in species table.
    pub fn with_species(mut self, species: SpeciesStore) -> Self {
        self.world.insert_resource(species);
        self
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn tick(&self) -> Tick {
        self.world.resource::<SimClock>().tick
    }

    pub fn player_mut(&mut self) -> Mut<'_, PlayerState> {
        self.world.resource_mut::<PlayerState>()
    }

    /// Pause (`0`) or speed up the clock.
    pub fn set_time_scale(&mut self, time_scale: u32) {
        self.world.resource_mut::<SimClock>().time_scale = time_scale;
    }

    pub fn setup(&mut self, keyword: &str, object: WorldObject) -> Result<LogicHandle, SetupError> {
        setup_actor(&mut self.world, keyword, object)
    }

    pub fn cleanup(&mut self, handle: LogicHandle) -> bool {
        cleanup_logic(&mut self.world, handle.entity)
    }

    /// Queue a message; it is delivered on the next step.
    pub fn send(&mut self, target: Entity, kind: MessageKind) {
        self.world
            .resource_mut::<Messages<ActorMessage>>()
            .write(ActorMessage::new(target, kind));
    }

    /// Run `ticks` schedule passes.
    pub fn step(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.schedule.run(&mut self.world);
        }
        debug!("stepped {} ticks, now at {}", ticks, self.tick());
    }

    /// Projectiles launched on the last step.
    ///
    /// Call after every [`step`](Self::step) of one tick; older launches are
    /// dropped when the queue ages.
    pub fn drain_projectiles(&mut self) -> Vec<ProjectileSpawn> {
        self.world.resource_mut::<Messages<ProjectileSpawn>>().drain().collect()
    }

    pub fn drain_player_hits(&mut self) -> Vec<PlayerHit> {
        self.world.resource_mut::<Messages<PlayerHit>>().drain().collect()
    }

    /// Sound cues forwarded since the last call.
    pub fn sound_cues(&self) -> Vec<SoundCue> {
        self.sound_rx.try_iter().collect()
    }

    pub fn save(&mut self, writer: impl Write) -> Result<(), SaveError> {
        let save = savegame::capture(&mut self.world)?;
        savegame::write_save(writer, &save)
    }

    pub fn load(&mut self, reader: impl Read) -> Result<LoadSummary, SaveError> {
        let save = savegame::read_save(reader)?;
        savegame::restore(&mut self.world, save)
    }
}
