use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::fixed::Tick;

/// Simulation clock in whole ticks.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimClock {
    pub tick: Tick,
    /// Ticks covered by the current update.
    pub delta_ticks: u32,
    /// Ticks advanced per update; zero pauses the simulation.
    pub time_scale: u32,
}

impl Default for SimClock {
    fn default() -> Self {
        SimClock {
            tick: 0,
            delta_ticks: 0,
            time_scale: 1,
        }
    }
}

impl SimClock {
    pub fn at(tick: Tick) -> Self {
        SimClock {
            tick,
            ..Default::default()
        }
    }

    pub fn is_paused(&self) -> bool {
        self.time_scale == 0
    }
}
