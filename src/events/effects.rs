//! Side effects collected while actors run.
//!
//! Modules and boss handlers cannot touch the ECS directly while a query is
//! borrowed, so everything they want to happen outside their own actor is
//! pushed into an [`ActorEffects`] buffer. The driver flushes it once the pass
//! is over: messages are written, remains are spawned and alerts are
//! propagated.

use bevy_ecs::prelude::Entity;

use crate::components::dispatch::Faction;
use crate::components::remains::Remains;
use crate::components::worldobject::SectorId;
use crate::events::audio::SoundCue;
use crate::events::player::PlayerHit;
use crate::events::projectile::ProjectileSpawn;
use crate::fixed::{Angle, FixedVec3};

/// A world object to create once the pass is over.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRequest {
    pub remains: Remains,
    pub pos: FixedVec3,
    pub yaw: Angle,
    pub sector: SectorId,
}

/// A woken actor calling its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alert {
    pub source: Entity,
    pub pos: FixedVec3,
    pub group: u32,
    pub faction: Faction,
}

#[derive(Debug, Default)]
pub struct ActorEffects {
    pub projectiles: Vec<ProjectileSpawn>,
    pub player_hits: Vec<PlayerHit>,
    pub sounds: Vec<SoundCue>,
    pub spawns: Vec<SpawnRequest>,
    pub alerts: Vec<Alert>,
}

impl ActorEffects {
    pub fn sound(&mut self, sound: Option<&str>, pos: FixedVec3) {
        if let Some(sound) = sound {
            self.sounds.push(SoundCue::play(sound, pos));
        }
    }

    pub fn spawn(&mut self, remains: Remains, pos: FixedVec3, yaw: Angle, sector: SectorId) {
        self.spawns.push(SpawnRequest {
            remains,
            pos,
            yaw,
            sector,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
            && self.player_hits.is_empty()
            && self.sounds.is_empty()
            && self.spawns.is_empty()
            && self.alerts.is_empty()
    }
}
