//! On-disk layout of a save game.
//!
//! Version history:
//! - 1: clock, RNG, player and generic actors.
//! - 2: bosses, remains, `last_attacker` references and the module fields
//!   marked `#[serde(default)]` (`in_combat`, `backoff`, `stun_until`, ...).
//!   Documents written by version 1 load with those defaults.

use serde::{Deserialize, Serialize};

use crate::components::dispatch::{ActorDispatch, ActorState};
use crate::components::module::{ActorModule, MAX_MODULES, ModuleKind};
use crate::components::movement::MovementModule;
use crate::components::physicsactor::PhysicsActor;
use crate::components::remains::Remains;
use crate::components::worldobject::{ObjectId, WorldObject};
use crate::fixed::Tick;
use crate::resources::player::PlayerState;

use super::SaveError;

pub const SAVE_VERSION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveGame {
    pub version: u32,
    pub tick: Tick,
    pub rng_seed: u64,
    pub player: PlayerState,
    pub actors: Vec<SavedActor>,
    #[serde(default)]
    pub bosses: Vec<SavedBoss>,
    #[serde(default)]
    pub remains: Vec<SavedRemains>,
}

/// A module stored under its stable tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedModule {
    pub kind: String,
    pub data: serde_json::Value,
}

impl SavedModule {
    pub fn encode(module: &ActorModule) -> Result<Self, serde_json::Error> {
        let data = match module {
            ActorModule::Attack(attack) => serde_json::to_value(attack)?,
            ActorModule::Damage(damage) => serde_json::to_value(damage)?,
            ActorModule::Thinker(thinker) => serde_json::to_value(thinker)?,
            ActorModule::Flyer(flyer) => serde_json::to_value(flyer)?,
        };
        Ok(Self {
            kind: module.kind().tag().to_string(),
            data,
        })
    }

    pub fn decode(self) -> Result<ActorModule, SaveError> {
        let Some(kind) = ModuleKind::from_tag(&self.kind) else {
            log::error!("save game holds a module with unknown tag '{}'", self.kind);
            return Err(SaveError::UnknownModuleTag(self.kind));
        };
        Ok(match kind {
            ModuleKind::Attack => ActorModule::Attack(serde_json::from_value(self.data)?),
            ModuleKind::Damage => ActorModule::Damage(serde_json::from_value(self.data)?),
            ModuleKind::Thinker => ActorModule::Thinker(serde_json::from_value(self.data)?),
            ModuleKind::Flyer => ActorModule::Flyer(serde_json::from_value(self.data)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedActor {
    pub id: ObjectId,
    pub object: WorldObject,
    pub state: ActorState,
    pub movement: Option<MovementModule>,
    /// In insertion order.
    pub modules: Vec<SavedModule>,
    #[serde(default)]
    pub last_attacker: Option<ObjectId>,
}

impl SavedActor {
    pub fn capture(
        id: ObjectId,
        object: &WorldObject,
        dispatch: &ActorDispatch,
        last_attacker: Option<ObjectId>,
    ) -> Result<Self, serde_json::Error> {
        let modules = dispatch
            .modules
            .iter()
            .map(SavedModule::encode)
            .collect::<Result<Vec<_>, _>>()?;
        let mut state = dispatch.state.clone();
        state.last_attacker = None;
        Ok(Self {
            id,
            object: object.clone(),
            state,
            movement: dispatch.movement.clone(),
            modules,
            last_attacker,
        })
    }

    /// Rebuild the dispatch record, re-attaching modules from their tags.
    pub fn into_dispatch(self) -> Result<(ObjectId, WorldObject, ActorDispatch), SaveError> {
        let mut dispatch = ActorDispatch::new(self.state);
        dispatch.movement = self.movement;
        for saved in self.modules {
            let module = saved.decode()?;
            dispatch.add_module(module).map_err(|_| SaveError::TooManyModules {
                id: self.id,
                capacity: MAX_MODULES,
            })?;
        }
        Ok((self.id, self.object, dispatch))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedBoss {
    pub id: ObjectId,
    pub object: WorldObject,
    pub boss: PhysicsActor,
    #[serde(default)]
    pub last_attacker: Option<ObjectId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedRemains {
    pub id: ObjectId,
    pub object: WorldObject,
    pub remains: Remains,
}
