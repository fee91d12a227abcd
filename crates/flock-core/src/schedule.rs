//! Tick-count scheduling around a [`World`].
//!
//! The world only changes state on explicit calls. `Director` adds the two
//! timed policies a session usually wants: staggered release of agents once
//! the session starts, and an optional auto-advance through the world states.

use crate::agent::AgentOutput;
use crate::world::{Tap, TapReport, World, WorldState};
use glam::Vec3;
use tracing::{debug, info};

pub struct Director {
    world: World,
    /// Ticks until the next release; `None` once everyone is out.
    release_countdown: Option<u32>,
    ticks_in_state: u32,
}

impl Director {
    pub fn new(world: World) -> Self {
        Self {
            world,
            release_countdown: None,
            ticks_in_state: 0,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn into_world(self) -> World {
        self.world
    }

    pub fn is_releasing(&self) -> bool {
        self.release_countdown.is_some()
    }

    /// Forward a long-press. Leaving `Spawn` releases the first agent and arms
    /// the staggered release of the rest.
    pub fn long_press(&mut self) -> WorldState {
        let from = self.world.state();
        let to = self.world.handle_long_press();
        self.ticks_in_state = 0;
        if from == WorldState::Spawn {
            self.release_next();
        }
        to
    }

    pub fn tap(&mut self, tap: Tap) -> TapReport {
        self.world.handle_tap(tap)
    }

    /// Apply due scheduled events, then tick the world.
    pub fn tick(&mut self, focal_target: Vec3) -> &[AgentOutput] {
        if let Some(countdown) = self.release_countdown {
            if countdown <= 1 {
                self.release_next();
            } else {
                self.release_countdown = Some(countdown - 1);
            }
        }

        let auto_advance = self.world.config().schedule.auto_advance_after_ticks;
        if auto_advance > 0 && self.world.state() != WorldState::Spawn {
            self.ticks_in_state += 1;
            if self.ticks_in_state >= auto_advance {
                let to = self.world.advance_world_state();
                info!(state = ?to, "auto-advanced");
                self.ticks_in_state = 0;
            }
        }

        self.world.tick(focal_target)
    }

    fn release_next(&mut self) {
        let origin = self.world.config().spawn_origin;
        self.release_countdown = match self.world.spawn_next(origin) {
            Some(index) => {
                debug!(agent = index, "released");
                Some(self.world.config().schedule.release_interval_ticks)
            }
            None => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ScheduleConfig, WorldConfig};

    fn make_director(agent_count: usize, schedule: ScheduleConfig) -> Director {
        let config = WorldConfig {
            agent_count,
            schedule,
            ..WorldConfig::default()
        };
        Director::new(World::new(config).unwrap())
    }

    #[test]
    fn nothing_spawns_before_the_first_long_press() {
        let mut director = make_director(3, ScheduleConfig::default());
        for _ in 0..200 {
            director.tick(Vec3::ZERO);
        }
        assert_eq!(director.world().awake_count(), 0);
        assert!(!director.is_releasing());
    }

    #[test]
    fn releases_one_agent_per_interval() {
        let schedule = ScheduleConfig {
            release_interval_ticks: 5,
            auto_advance_after_ticks: 0,
        };
        let mut director = make_director(3, schedule);
        assert_eq!(director.long_press(), WorldState::FlockExternal);
        assert_eq!(director.world().awake_count(), 1);

        for _ in 0..4 {
            director.tick(Vec3::ZERO);
        }
        assert_eq!(director.world().awake_count(), 1);
        director.tick(Vec3::ZERO);
        assert_eq!(director.world().awake_count(), 2);

        for _ in 0..5 {
            director.tick(Vec3::ZERO);
        }
        assert_eq!(director.world().awake_count(), 3);

        for _ in 0..5 {
            director.tick(Vec3::ZERO);
        }
        assert!(!director.is_releasing());
    }

    #[test]
    fn later_long_presses_do_not_release() {
        let mut director = make_director(4, ScheduleConfig::default());
        director.long_press();
        director.long_press();
        assert_eq!(director.world().awake_count(), 1);
        assert_eq!(director.world().state(), WorldState::FlockHome);
    }

    #[test]
    fn auto_advance_steps_through_states() {
        let schedule = ScheduleConfig {
            release_interval_ticks: 66,
            auto_advance_after_ticks: 10,
        };
        let mut director = make_director(2, schedule);
        for _ in 0..30 {
            director.tick(Vec3::ZERO);
        }
        assert_eq!(director.world().state(), WorldState::Spawn);

        director.long_press();
        for _ in 0..9 {
            director.tick(Vec3::ZERO);
        }
        assert_eq!(director.world().state(), WorldState::FlockExternal);
        director.tick(Vec3::ZERO);
        assert_eq!(director.world().state(), WorldState::FlockHome);
        for _ in 0..10 {
            director.tick(Vec3::ZERO);
        }
        assert_eq!(director.world().state(), WorldState::PatternHome);
    }

    #[test]
    fn taps_pass_through_to_the_world() {
        let mut director = make_director(1, ScheduleConfig::default());
        director.long_press();
        director.tick(Vec3::ZERO);
        let report = director.tap(Tap::Agent(0));
        assert_eq!(report.hits, vec![0]);
        assert_eq!(director.world().summary().taps, 1);
    }
}
