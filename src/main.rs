//! Headless actor simulation runner.
//!
//! Builds a small arena, places a squad of actors (and optionally a boss),
//! walks the player towards them and runs the simulation for a fixed number
//! of ticks. The host side is played by this binary: every `--hit-every`
//! ticks it lands a rifle bolt on the lowest-id actor still standing.
//!
//! # Running
//!
//! ```sh
//! RUST_LOG=debug cargo run -- --ticks 2000 --boss phase3 --save run.json
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use actorcore::components::dispatch::ActorDispatch;
use actorcore::components::physicsactor::PhysicsActor;
use actorcore::components::remains::{Corpse, Effect, Pickup};
use actorcore::components::worldobject::{ObjectId, WorldObject};
use actorcore::events::audio::SoundCue;
use actorcore::events::message::{MessageKind, ProjectileHit};
use actorcore::events::projectile::ProjectileKind;
use actorcore::fixed::{Angle, Fixed, FixedVec3};
use actorcore::resources::aiconfig::AiConfig;
use actorcore::resources::collision::{OpenArena, Rect, WallGap};
use actorcore::resources::player::PlayerState;
use actorcore::resources::species::SpeciesStore;
use actorcore::simulation::Simulation;
use bevy_ecs::prelude::*;
use clap::Parser;
use log::{error, info, warn};

/// Headless actor simulation
#[derive(Parser)]
#[command(version, about = "Runs the actor core against a scripted host.")]
struct Cli {
    /// AI configuration INI file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// JSON species overrides.
    #[arg(long, value_name = "PATH")]
    species: Option<PathBuf>,

    /// Ticks to simulate.
    #[arg(long, default_value_t = 1000)]
    ticks: u32,

    /// Override the RNG seed from the config.
    #[arg(long)]
    seed: Option<u64>,

    /// Boss keyword to place behind the squad.
    #[arg(long, value_name = "KEYWORD")]
    boss: Option<String>,

    /// Ticks between host hits on the squad; zero disables them.
    #[arg(long, default_value_t = 90)]
    hit_every: u32,

    /// Resume from a save game instead of placing actors.
    #[arg(long, value_name = "PATH")]
    load: Option<PathBuf>,

    /// Write a save game when done.
    #[arg(long, value_name = "PATH")]
    save: Option<PathBuf>,
}

fn arena() -> OpenArena {
    OpenArena::new(400)
        .with_block(
            Rect::new(-40, 100, 40, 110),
            Some(WallGap {
                bottom: Fixed::ZERO,
                top: Fixed::from_int(8),
            }),
        )
        .with_pit(Rect::new(120, 120, 160, 160), Fixed::from_int(30))
        .with_liquid(Rect::new(-200, -200, -150, -150))
}

fn place_squad(sim: &mut Simulation, boss: Option<&str>) {
    let squad = [
        ("officer", (-20, 180)),
        ("trooper", (0, 200)),
        ("trooper", (20, 200)),
        ("commando", (0, 230)),
        ("probe_droid", (-60, 220)),
    ];
    for (keyword, (x, z)) in squad {
        let object = WorldObject::new(FixedVec3::from_ints(x, 0, z), Angle::new(8192), 0);
        if let Err(e) = sim.setup(keyword, object) {
            warn!("Skipping '{}': {}", keyword, e);
        }
    }
    if let Some(keyword) = boss {
        let object = WorldObject::new(FixedVec3::from_ints(0, 0, 300), Angle::new(8192), 0);
        if let Err(e) = sim.setup(keyword, object) {
            error!("Boss '{}' could not be placed: {}", keyword, e);
        }
    }
}

/// Lowest-id actor or boss that is still alive.
fn first_standing(world: &mut World) -> Option<Entity> {
    let mut actors = world.query::<(Entity, &ObjectId, Option<&ActorDispatch>, Option<&PhysicsActor>)>();
    actors
        .iter(world)
        .filter(|(_, _, dispatch, boss)| match (dispatch, boss) {
            (Some(d), _) => !d.state.is_dead() && !d.state.is_dying(),
            (_, Some(b)) => b.alive && !b.is_dying(),
            _ => false,
        })
        .min_by_key(|(_, id, ..)| **id)
        .map(|(entity, ..)| entity)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AiConfig::with_path(path),
        None => AiConfig::new(),
    };
    if cli.config.is_some()
        && let Err(e) = config.load_from_file()
    {
        warn!("{}; using defaults", e);
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    let mut species = SpeciesStore::new();
    if let Some(path) = &cli.species
        && let Err(e) = species.load_overrides(path)
    {
        error!("{}", e);
        std::process::exit(1);
    }

    let mut sim = Simulation::new(config, arena()).with_species(species);

    match &cli.load {
        Some(path) => {
            let loaded = File::open(path)
                .map_err(Into::into)
                .and_then(|file| sim.load(BufReader::new(file)));
            match loaded {
                Ok(summary) => info!("Resumed {:?} from {}", summary, path.display()),
                Err(e) => {
                    error!("Failed to load {}: {}", path.display(), e);
                    std::process::exit(1);
                }
            }
        }
        None => {
            sim.player_mut().pos = FixedVec3::from_ints(0, 0, -300);
            place_squad(&mut sim, cli.boss.as_deref());
        }
    }

    let mut projectiles = 0usize;
    let mut player_hits = 0usize;
    let mut sounds = 0usize;
    let mut damage_taken = Fixed::ZERO;

    for _ in 0..cli.ticks {
        {
            let mut player = sim.player_mut();
            if player.pos.z < Fixed::from_int(60) {
                player.pos.z += Fixed::ONE;
            }
        }
        sim.step(1);

        if cli.hit_every > 0 && sim.tick() % cli.hit_every == 0 {
            let target = first_standing(sim.world_mut());
            if let Some(target) = target {
                let player_pos = sim.world().resource::<PlayerState>().eye();
                let hit = ProjectileHit::new(Fixed::from_int(5), ProjectileKind::RifleBolt).with_motion(
                    player_pos,
                    FixedVec3::from_ints(0, 0, 250),
                    Fixed::from_int(2),
                );
                sim.send(target, MessageKind::Damage(hit));
            }
        }

        projectiles += sim.drain_projectiles().len();
        for hit in sim.drain_player_hits() {
            player_hits += 1;
            damage_taken += hit.damage;
        }
        for cue in sim.sound_cues() {
            sounds += 1;
            if cue == SoundCue::CombatMusic {
                info!("Combat music at tick {}", sim.tick());
            }
        }
    }

    let world = sim.world_mut();
    let standing = world.query::<&ActorDispatch>().iter(world).count()
        + world.query::<&PhysicsActor>().iter(world).count();
    let corpses = world.query::<&Corpse>().iter(world).count();
    let pickups = world.query::<&Pickup>().iter(world).count();
    let effects = world.query::<&Effect>().iter(world).count();
    info!(
        "Ran to tick {}: {} actors left, {} corpses, {} pickups, {} effects",
        sim.tick(),
        standing,
        corpses,
        pickups,
        effects
    );
    info!(
        "Host saw {} projectile requests, {} player hits ({:?} damage), {} sound cues",
        projectiles, player_hits, damage_taken, sounds
    );

    if let Some(path) = &cli.save {
        let saved = File::create(path)
            .map_err(Into::into)
            .and_then(|file| sim.save(BufWriter::new(file)));
        match saved {
            Ok(()) => info!("Saved to {}", path.display()),
            Err(e) => {
                error!("Failed to save {}: {}", path.display(), e);
                std::process::exit(1);
            }
        }
    }
}
