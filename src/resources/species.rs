//! Species table: everything a setup keyword expands into.
//!
//! Built-in definitions cover every keyword the core understands. A JSON
//! file may override selected values per keyword:
//!
//! ```json
//! {
//!     "trooper": { "hp": 6, "speed": 16, "drop": "power_cell" },
//!     "phase3": { "reflect_chance": 50 }
//! }
//! ```
//!
//! Unknown keywords in the override file are skipped with a warning.

use std::path::Path;

use bevy_ecs::prelude::Resource;
use log::{info, warn};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::components::animation::{AnimAction, AnimDef, AnimTable};
use crate::components::attack::{AttackFlags, AttackParams};
use crate::components::damage::DamageParams;
use crate::components::dispatch::Faction;
use crate::components::movement::MovementFlags;
use crate::components::physicsactor::{BossKind, BossProfile};
use crate::components::remains::{EffectKind, ItemKind};
use crate::components::thinker::{HoverParams, ThinkerParams};
use crate::events::projectile::ProjectileKind;
use crate::fixed::{Fixed, FixedVec3};
use crate::resources::aiconfig::ConfigError;

/// Full description of one keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesDef {
    pub keyword: String,
    /// Driven by a boss state machine instead of modules.
    pub boss: Option<BossKind>,
    pub hp: Fixed,
    pub faction: Faction,
    pub alert_group: u32,
    pub alert_sound: Option<String>,
    pub flying: bool,
    pub radius: Fixed,
    pub height: Fixed,
    /// Overrides the configured field of view.
    pub fov_degrees: Option<u32>,
    /// Overrides the configured ticks between idle sight checks.
    #[serde(default)]
    pub delay: Option<u32>,
    /// Ignores sight and group alerts; only a wakeup message starts it.
    #[serde(default)]
    pub scripted: bool,
    pub anims: AnimTable,
    pub movement: MovementFlags,
    pub thinker: Option<ThinkerParams>,
    pub hover: Option<HoverParams>,
    pub attack: Option<AttackParams>,
    pub damage: DamageParams,
    pub profile: Option<BossProfile>,
}

impl SpeciesDef {
    fn generic(keyword: &str, hp: i32, faction: Faction) -> Self {
        Self {
            keyword: keyword.to_string(),
            boss: None,
            hp: Fixed::from_int(hp),
            faction,
            alert_group: 0,
            alert_sound: None,
            flying: false,
            radius: Fixed::from_int(2),
            height: Fixed::from_int(6),
            fov_degrees: None,
            delay: None,
            scripted: false,
            anims: standard_anims(),
            movement: MovementFlags::RESPONSE_SLIDE | MovementFlags::AVOID_LEDGES,
            thinker: Some(ThinkerParams::default()),
            hover: None,
            attack: None,
            damage: DamageParams {
                corpse: true,
                knockback: 100,
                ..Default::default()
            },
            profile: None,
        }
    }

    fn boss(keyword: &str, kind: BossKind, hp: i32, profile: BossProfile) -> Self {
        Self {
            boss: Some(kind),
            thinker: None,
            profile: Some(profile),
            ..Self::generic(keyword, hp, Faction::Imperial)
        }
    }

    fn sounds(mut self, alert: &str, hurt: &str, die: &str) -> Self {
        self.alert_sound = Some(alert.to_string());
        self.damage.hurt_sound = Some(hurt.to_string());
        self.damage.die_sound = Some(die.to_string());
        self
    }

    fn drops(mut self, item: ItemKind) -> Self {
        self.damage.drop = Some(item);
        self
    }

    fn flying(mut self, hover: HoverParams) -> Self {
        self.flying = true;
        self.hover = Some(hover);
        self.movement = MovementFlags::RESPONSE_SLIDE | MovementFlags::USE_GAPS;
        self
    }

    fn with_attack(mut self, attack: AttackParams) -> Self {
        self.attack = Some(attack);
        self
    }

    fn group(mut self, group: u32) -> Self {
        self.alert_group = group;
        self
    }

    fn allegiance(mut self, faction: Faction) -> Self {
        self.faction = faction;
        self
    }
}

/// Animation ids laid out in [`AnimAction`] order.
fn standard_anims() -> AnimTable {
    AnimTable::default()
        .with(AnimAction::Idle, AnimDef::looping(0, 1, 1))
        .with(AnimAction::Walk, AnimDef::looping(1, 4, 8))
        .with(AnimAction::Attack1, AnimDef::once(2, 2, 10))
        .with(AnimAction::Attack1End, AnimDef::once(3, 1, 10))
        .with(AnimAction::Attack2, AnimDef::once(4, 2, 10))
        .with(AnimAction::Attack2End, AnimDef::once(5, 1, 10))
        .with(AnimAction::Hurt, AnimDef::once(6, 1, 8))
        .with(AnimAction::Die1, AnimDef::once(7, 4, 10))
        .with(AnimAction::Die2, AnimDef::once(8, 4, 10))
}

fn flyer_anims() -> AnimTable {
    standard_anims().with(AnimAction::Fly, AnimDef::looping(9, 2, 6))
}

/// Selected per-keyword overrides, in whole units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpeciesOverride {
    pub hp: Option<i32>,
    pub speed: Option<i32>,
    pub speed_rot: Option<i32>,
    pub target_offset: Option<i32>,
    pub fov_degrees: Option<u32>,
    pub delay: Option<u32>,
    pub scripted: Option<bool>,
    pub faction: Option<Faction>,
    pub alert_group: Option<u32>,
    pub attack_delay: Option<u32>,
    pub melee_damage: Option<i32>,
    pub max_dist: Option<i32>,
    pub projectile: Option<ProjectileKind>,
    pub drop: Option<ItemKind>,
    pub reflect_chance: Option<u32>,
}

impl SpeciesOverride {
    fn apply(&self, def: &mut SpeciesDef) {
        if let Some(hp) = self.hp {
            def.hp = Fixed::from_int(hp);
        }
        if let Some(fov) = self.fov_degrees {
            def.fov_degrees = Some(fov.min(360));
        }
        if let Some(delay) = self.delay {
            def.delay = Some(delay.max(1));
        }
        if let Some(scripted) = self.scripted {
            def.scripted = scripted;
        }
        if let Some(faction) = self.faction {
            def.faction = faction;
        }
        if let Some(group) = self.alert_group {
            def.alert_group = group;
        }
        if let Some(item) = self.drop {
            def.damage.drop = Some(item);
        }
        if let Some(thinker) = def.thinker.as_mut() {
            if let Some(speed) = self.speed {
                thinker.speed = Fixed::from_int(speed);
            }
            if let Some(rot) = self.speed_rot {
                thinker.speed_rot = rot;
            }
            if let Some(offset) = self.target_offset {
                thinker.target_offset = Fixed::from_int(offset);
            }
        }
        if let Some(attack) = def.attack.as_mut() {
            if let Some(delay) = self.attack_delay {
                attack.delay = delay;
            }
            if let Some(damage) = self.melee_damage {
                attack.melee_damage = Fixed::from_int(damage);
            }
            if let Some(dist) = self.max_dist {
                attack.max_dist = Fixed::from_int(dist);
            }
            if let Some(projectile) = self.projectile {
                attack.projectile = projectile;
            }
        }
        if let Some(profile) = def.profile.as_mut() {
            if let Some(speed) = self.speed {
                profile.speed = Fixed::from_int(speed);
            }
            if let Some(rot) = self.speed_rot {
                profile.speed_rot = rot;
            }
            if let Some(damage) = self.melee_damage {
                profile.melee_damage = Fixed::from_int(damage);
            }
            if let Some(projectile) = self.projectile {
                profile.projectile = projectile;
            }
            if let Some(item) = self.drop {
                profile.drop = Some(item);
            }
            if let Some(chance) = self.reflect_chance {
                profile.reflect_chance = chance.min(100);
            }
        }
    }
}

/// Keyword to species lookup.
#[derive(Resource, Debug, Clone)]
pub struct SpeciesStore {
    defs: FxHashMap<String, SpeciesDef>,
}

impl Default for SpeciesStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeciesStore {
    /// Store holding every built-in keyword.
    pub fn new() -> Self {
        let mut defs = FxHashMap::default();
        for def in builtin() {
            defs.insert(def.keyword.clone(), def);
        }
        Self { defs }
    }

    pub fn get(&self, keyword: &str) -> Option<&SpeciesDef> {
        self.defs.get(keyword)
    }

    pub fn get_mut(&mut self, keyword: &str) -> Option<&mut SpeciesDef> {
        self.defs.get_mut(keyword)
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.defs.keys().map(String::as_str)
    }

    /// Apply overrides from a JSON document; returns how many keywords changed.
    pub fn apply_overrides_str(&mut self, json: &str) -> Result<usize, serde_json::Error> {
        let raw: FxHashMap<String, serde_json::Value> = serde_json::from_str(json)?;
        let mut entries: Vec<(String, serde_json::Value)> = raw.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut applied = 0;
        for (keyword, value) in entries {
            let Some(def) = self.defs.get_mut(keyword.as_str()) else {
                warn!("Species override for unknown keyword '{}' ignored", keyword);
                continue;
            };
            let over: SpeciesOverride = serde_json::from_value(value)?;
            over.apply(def);
            applied += 1;
        }
        Ok(applied)
    }

    /// Load overrides from a JSON file.
    pub fn load_overrides(&mut self, path: impl AsRef<Path>) -> Result<usize, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let applied = self.apply_overrides_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Applied {} species overrides from {:?}", applied, path);
        Ok(applied)
    }
}

fn builtin() -> Vec<SpeciesDef> {
    let rifle = AttackParams::ranged(ProjectileKind::RifleBolt);
    vec![
        SpeciesDef::generic("officer", 3, Faction::Imperial)
            .group(1)
            .sounds("ranofc02", "ofchurt", "ofcdie")
            .drops(ItemKind::Energy)
            .with_attack(AttackParams {
                max_dist: Fixed::from_int(100),
                ..rifle.clone()
            }),
        SpeciesDef::generic("trooper", 4, Faction::Imperial)
            .group(1)
            .sounds("ranstp02", "st-hrt-1", "st-die-1")
            .drops(ItemKind::Energy)
            .with_attack(rifle.clone()),
        SpeciesDef::generic("commando", 5, Faction::Imperial)
            .group(1)
            .sounds("ranstp02", "st-hrt-1", "st-die-1")
            .drops(ItemKind::PowerCell)
            .with_attack(AttackParams {
                delay: 110,
                spread_start: Fixed::from_int(384),
                ..rifle.clone()
            }),
        {
            let mut def = SpeciesDef::generic("gamorrean", 20, Faction::Alien)
                .group(2)
                .sounds("gamor01", "gamor03", "gamor04")
                .with_attack(AttackParams {
                    melee_sound: Some("swing".to_string()),
                    ..AttackParams::melee(Fixed::from_int(10), Fixed::from_int(9))
                });
            def.height = Fixed::from_int(7);
            def.damage.corpse = true;
            def
        },
        SpeciesDef::generic("bossk", 45, Faction::Alien)
            .group(3)
            .sounds("bossk1", "bossk3", "bossk4")
            .drops(ItemKind::PowerCell)
            .with_attack(AttackParams {
                flags: AttackFlags::RANGED | AttackFlags::LEAD,
                fire_sound: Some("concuss5".to_string()),
                ..AttackParams::ranged(ProjectileKind::Concussion)
            }),
        SpeciesDef::generic("reeyees", 20, Faction::Alien)
            .group(3)
            .sounds("reeyee1", "reeyee2", "reeyee3")
            .drops(ItemKind::Detonator)
            .with_attack(
                AttackParams {
                    flags: AttackFlags::RANGED | AttackFlags::ARCING,
                    min_dist: Fixed::from_int(20),
                    max_dist: Fixed::from_int(90),
                    ..AttackParams::ranged(ProjectileKind::Thermal)
                }
                .with_melee(Fixed::from_int(10), Fixed::from_int(9)),
            ),
        {
            let mut def = SpeciesDef::generic("probe_droid", 15, Faction::Droid)
                .group(4)
                .sounds("probalm", "probhrt", "probdie")
                .flying(HoverParams::default())
                .drops(ItemKind::Battery)
                .with_attack(AttackParams::ranged(ProjectileKind::ProbeBolt));
            def.anims = flyer_anims();
            def.delay = Some(36);
            def.damage.corpse = false;
            def.damage.death_effect = Some(EffectKind::SmallExplosion);
            def
        },
        {
            let mut def = SpeciesDef::generic("int_droid", 10, Faction::Droid)
                .group(4)
                .sounds("intalert", "inthurt", "intdie")
                .flying(HoverParams {
                    min_height: Fixed::from_int(2),
                    max_height: Fixed::from_int(6),
                    speed_vert: Fixed::from_int(8),
                })
                .with_attack(AttackParams::melee(Fixed::from_int(5), Fixed::from_int(6)));
            def.anims = flyer_anims();
            def.delay = Some(36);
            def.damage.corpse = false;
            def.damage.death_effect = Some(EffectKind::SmallExplosion);
            def
        },
        SpeciesDef::boss(
            "boba_fett",
            BossKind::BobaFett,
            90,
            BossProfile {
                speed: Fixed::from_int(30),
                projectile: ProjectileKind::RifleBolt,
                secondary: Some(ProjectileKind::Rocket),
                alert_sound: Some("boba-1".to_string()),
                hurt_sound: Some("boba-3".to_string()),
                die_sound: Some("boba-4".to_string()),
                drop: Some(ItemKind::Missiles),
                ..Default::default()
            },
        ),
        SpeciesDef::boss(
            "kell",
            BossKind::KellDragon,
            60,
            BossProfile {
                speed: Fixed::from_int(26),
                melee_damage: Fixed::from_int(25),
                melee_range: Fixed::from_int(10),
                attack_range: Fixed::from_int(40),
                alert_sound: Some("kell-1".to_string()),
                attack_sound: Some("kell-5".to_string()),
                hurt_sound: Some("kell-3".to_string()),
                die_sound: Some("kell-7".to_string()),
                ..Default::default()
            },
        )
        .allegiance(Faction::Creature),
        SpeciesDef::boss(
            "phase1",
            BossKind::PhaseOne,
            60,
            BossProfile {
                speed: Fixed::from_int(18),
                melee_damage: Fixed::from_int(20),
                melee_range: Fixed::from_int(9),
                alert_sound: Some("phase1a".to_string()),
                attack_sound: Some("swing".to_string()),
                die_sound: Some("phase1c".to_string()),
                death_effect: Some(EffectKind::Sparks),
                ..Default::default()
            },
        ),
        SpeciesDef::boss(
            "phase2",
            BossKind::PhaseTwo,
            90,
            BossProfile {
                speed: Fixed::from_int(22),
                projectile: ProjectileKind::Rocket,
                alert_sound: Some("phase2a".to_string()),
                attack_sound: Some("rocket-1".to_string()),
                die_sound: Some("phase2c".to_string()),
                drop: Some(ItemKind::Missiles),
                death_effect: Some(EffectKind::LargeExplosion),
                ..Default::default()
            },
        ),
        SpeciesDef::boss(
            "phase3",
            BossKind::PhaseThree,
            110,
            BossProfile {
                speed: Fixed::from_int(24),
                projectile: ProjectileKind::Rocket,
                secondary: Some(ProjectileKind::Repeater),
                reflect_chance: 35,
                alert_sound: Some("phase3a".to_string()),
                attack_sound: Some("rocket-1".to_string()),
                die_sound: Some("phase3c".to_string()),
                death_effect: Some(EffectKind::LargeExplosion),
                ..Default::default()
            },
        ),
        SpeciesDef::boss(
            "turret",
            BossKind::Turret,
            20,
            BossProfile {
                speed: Fixed::ZERO,
                speed_rot: 4096,
                projectile: ProjectileKind::TurretBolt,
                fire_offset: FixedVec3::new(Fixed::ZERO, Fixed::from_int(-1), Fixed::ONE),
                attack_sound: Some("turret".to_string()),
                corpse: false,
                death_effect: Some(EffectKind::SmallExplosion),
                ..Default::default()
            },
        ),
        SpeciesDef::boss(
            "welder",
            BossKind::Welder,
            25,
            BossProfile {
                speed: Fixed::ZERO,
                speed_rot: 2048,
                projectile: ProjectileKind::Spark,
                melee_damage: Fixed::from_int(8),
                melee_range: Fixed::from_int(14),
                attack_sound: Some("welding".to_string()),
                corpse: false,
                death_effect: Some(EffectKind::Sparks),
                ..Default::default()
            },
        ),
        SpeciesDef::boss(
            "mousebot",
            BossKind::MouseBot,
            5,
            BossProfile {
                speed: Fixed::from_int(20),
                alert_sound: Some("eeek-1".to_string()),
                die_sound: Some("eeek-3".to_string()),
                corpse: false,
                drop: Some(ItemKind::Battery),
                death_effect: Some(EffectKind::SmallExplosion),
                ..Default::default()
            },
        )
        .allegiance(Faction::Droid),
    ]
}
