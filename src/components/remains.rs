//! Objects left behind when an actor dies.
//!
//! Corpses, item drops and death effects are ordinary world objects from the
//! moment they are spawned; the actor core only creates them.

use bevy_ecs::prelude::Component;
use serde::{Deserialize, Serialize};

/// Items an actor can drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Energy,
    PowerCell,
    Plasma,
    Detonator,
    Mines,
    Missiles,
    Shell,
    Medkit,
    Battery,
    RedKey,
}

/// One-shot visual effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    SmallExplosion,
    LargeExplosion,
    Sparks,
    Splash,
}

#[derive(Component, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corpse {
    /// Species keyword of the actor that died.
    pub species: String,
    /// Last frame of the death animation, shown forever.
    pub anim_id: i32,
    pub frame: u32,
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pickup {
    pub item: ItemKind,
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    pub kind: EffectKind,
}

/// Any of the above, as carried by spawn requests and save games.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Remains {
    Corpse(Corpse),
    Pickup(Pickup),
    Effect(Effect),
}
