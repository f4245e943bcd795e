//! Simulation clock system.
//!
//! Advances the shared [`SimClock`](crate::resources::simclock::SimClock)
//! once per schedule run. Everything downstream reads `tick` and
//! `delta_ticks` from it; nothing else writes it.
use bevy_ecs::prelude::*;

use crate::resources::simclock::SimClock;

/// Advance the clock by `time_scale` ticks.
///
/// A paused clock (`time_scale == 0`) leaves `tick` untouched and reports a
/// zero delta, so drivers that see `delta_ticks == 0` do nothing.
pub fn advance_sim_clock(mut clock: ResMut<SimClock>) {
    let delta = clock.time_scale;
    clock.delta_ticks = delta;
    clock.tick = clock.tick.saturating_add(delta);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_by_time_scale() {
        let mut world = World::new();
        world.insert_resource(SimClock {
            tick: 10,
            delta_ticks: 0,
            time_scale: 3,
        });
        let mut schedule = Schedule::default();
        schedule.add_systems(advance_sim_clock);
        schedule.run(&mut world);

        let clock = world.resource::<SimClock>();
        assert_eq!(clock.tick, 13);
        assert_eq!(clock.delta_ticks, 3);
    }

    #[test]
    fn paused_clock_stays_put() {
        let mut world = World::new();
        world.insert_resource(SimClock {
            tick: 10,
            delta_ticks: 1,
            time_scale: 0,
        });
        let mut schedule = Schedule::default();
        schedule.add_systems(advance_sim_clock);
        schedule.run(&mut world);

        let clock = world.resource::<SimClock>();
        assert_eq!(clock.tick, 10);
        assert_eq!(clock.delta_ticks, 0);
    }
}
