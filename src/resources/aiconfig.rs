//! AI tuning resource.
//!
//! Global knobs shared by every actor, loaded from an INI file. Values that
//! are missing from the file keep their defaults.
//!
//! # Configuration File Format
//!
//! ```ini
//! [simulation]
//! seed = 7
//!
//! [ai]
//! fov_degrees = 210
//! aware_range = 20
//! sight_range = 200
//! alert_radius = 150
//! idle_delay = 72
//! gravity = 60
//! corrected_thinker_offset = false
//!
//! [difficulty]
//! damage_scale = 100
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;
use thiserror::Error;

use crate::fixed::{Angle, Fixed};

const DEFAULT_SEED: u64 = 7;
const DEFAULT_FOV_DEGREES: u32 = 210;
const DEFAULT_AWARE_RANGE: u32 = 20;
const DEFAULT_SIGHT_RANGE: u32 = 200;
const DEFAULT_ALERT_RADIUS: u32 = 150;
const DEFAULT_IDLE_DELAY: u32 = 72;
const DEFAULT_GRAVITY: u32 = 60;
const DEFAULT_DAMAGE_SCALE: u32 = 100;
const DEFAULT_CONFIG_PATH: &str = "./actorcore.ini";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config file {path:?}: {reason}")]
    Load { path: PathBuf, reason: String },
    #[error("failed to save config file {path:?}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// AI configuration resource.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct AiConfig {
    /// Seed for [`SimRng`](crate::resources::rng::SimRng).
    pub seed: u64,
    /// Default field of view for new actors, degrees.
    pub fov_degrees: u32,
    /// Default radius inside which the player is always noticed.
    pub aware_range: u32,
    /// Maximum sighting distance.
    pub sight_range: u32,
    /// Radius within which a waking actor alerts its group.
    pub alert_radius: u32,
    /// Default ticks between idle sight checks.
    pub idle_delay: u32,
    /// Downward acceleration, units per second squared.
    pub gravity: u32,
    /// Percent applied to damage taken by actors.
    pub damage_scale: u32,
    /// Use `min(|dx|, |dz|)` for the unseen-player thinker offset instead of
    /// the historical `min(|dx|, |dx|)`.
    pub corrected_thinker_offset: bool,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AiConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self {
            seed: DEFAULT_SEED,
            fov_degrees: DEFAULT_FOV_DEGREES,
            aware_range: DEFAULT_AWARE_RANGE,
            sight_range: DEFAULT_SIGHT_RANGE,
            alert_radius: DEFAULT_ALERT_RADIUS,
            idle_delay: DEFAULT_IDLE_DELAY,
            gravity: DEFAULT_GRAVITY,
            damage_scale: DEFAULT_DAMAGE_SCALE,
            corrected_thinker_offset: false,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current values.
    pub fn load_from_file(&mut self) -> Result<(), ConfigError> {
        let mut config = Ini::new();
        config.load(&self.config_path).map_err(|reason| ConfigError::Load {
            path: self.config_path.clone(),
            reason,
        })?;

        // [simulation] section
        if let Some(seed) = config.getuint("simulation", "seed").ok().flatten() {
            self.seed = seed;
        }

        // [ai] section
        let read_u32 = |key: &str| config.getuint("ai", key).ok().flatten().map(|v| v as u32);
        if let Some(v) = read_u32("fov_degrees") {
            self.fov_degrees = v.min(360);
        }
        if let Some(v) = read_u32("aware_range") {
            self.aware_range = v;
        }
        if let Some(v) = read_u32("sight_range") {
            self.sight_range = v;
        }
        if let Some(v) = read_u32("alert_radius") {
            self.alert_radius = v;
        }
        if let Some(v) = read_u32("idle_delay") {
            self.idle_delay = v;
        }
        if let Some(v) = read_u32("gravity") {
            self.gravity = v;
        }
        if let Some(v) = config.getbool("ai", "corrected_thinker_offset").ok().flatten() {
            self.corrected_thinker_offset = v;
        }

        // [difficulty] section
        if let Some(v) = config.getuint("difficulty", "damage_scale").ok().flatten() {
            self.damage_scale = v as u32;
        }

        info!(
            "Loaded AI config: seed={}, fov={}deg, sight={}, alert={}, damage_scale={}%, corrected_offset={}",
            self.seed,
            self.fov_degrees,
            self.sight_range,
            self.alert_radius,
            self.damage_scale,
            self.corrected_thinker_offset
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    pub fn save_to_file(&self) -> Result<(), ConfigError> {
        let mut config = Ini::new();

        config.set("simulation", "seed", Some(self.seed.to_string()));

        config.set("ai", "fov_degrees", Some(self.fov_degrees.to_string()));
        config.set("ai", "aware_range", Some(self.aware_range.to_string()));
        config.set("ai", "sight_range", Some(self.sight_range.to_string()));
        config.set("ai", "alert_radius", Some(self.alert_radius.to_string()));
        config.set("ai", "idle_delay", Some(self.idle_delay.to_string()));
        config.set("ai", "gravity", Some(self.gravity.to_string()));
        config.set(
            "ai",
            "corrected_thinker_offset",
            Some(self.corrected_thinker_offset.to_string()),
        );

        config.set("difficulty", "damage_scale", Some(self.damage_scale.to_string()));

        config.write(&self.config_path).map_err(|source| ConfigError::Save {
            path: self.config_path.clone(),
            source,
        })?;

        info!("Saved AI config to {:?}", self.config_path);

        Ok(())
    }

    pub fn fov(&self) -> i32 {
        Angle::from_degrees(self.fov_degrees as i32).units().max(1)
    }

    pub fn sight_range(&self) -> Fixed {
        Fixed::from_int(self.sight_range as i32)
    }

    pub fn aware_range(&self) -> Fixed {
        Fixed::from_int(self.aware_range as i32)
    }

    pub fn alert_radius(&self) -> Fixed {
        Fixed::from_int(self.alert_radius as i32)
    }

    pub fn gravity(&self) -> Fixed {
        Fixed::from_int(self.gravity as i32)
    }

    /// Apply the difficulty scale to incoming damage.
    pub fn scale_damage(&self, damage: Fixed) -> Fixed {
        damage.scale(Fixed::from_int(self.damage_scale as i32), Fixed::from_int(100))
    }
}
