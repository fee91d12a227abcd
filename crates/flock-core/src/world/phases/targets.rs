use super::super::{World, WorldState};
use crate::agent::AgentPhase;
use crate::math::{azimuth, degrees_to_radians, inclination, random_decimal};
use glam::Vec3;
use rand::Rng;
use std::f32::consts::FRAC_PI_2;

/// Offset of length `radius` whose direction is the target's own
/// azimuth/inclination jittered by up to `max_angle` radians.
fn wander_offset<R: Rng + ?Sized>(rng: &mut R, target: Vec3, radius: f32, max_angle: f32) -> Vec3 {
    let az = azimuth(target) + random_decimal(rng, -max_angle, max_angle);
    let inc = inclination(target).unwrap_or(FRAC_PI_2) + random_decimal(rng, -max_angle, max_angle);
    let (sin_inc, cos_inc) = inc.sin_cos();
    let (sin_az, cos_az) = az.sin_cos();
    Vec3::new(sin_inc * cos_az, sin_inc * sin_az, cos_inc) * radius
}

impl World {
    /// Resolve target, phase and speed preset for every active agent from the
    /// shared world state. Dead agents keep their ground target.
    pub(in crate::world) fn step_target_phase(&mut self) {
        let state = self.state;
        if state == WorldState::PatternHome {
            for rose in &mut self.roses {
                rose.advance();
            }
        }

        let cruise = self.config.steering.cruise_limits();
        let pattern_speed = self.config.pattern_speed;
        let wander_radius = self.config.focal_wander.radius;
        let wander_angle = degrees_to_radians(self.config.focal_wander.max_angle_degrees);
        let focal = self.focal_target;
        let home_flock = self.home_flock.current();
        let rng = &mut self.rng;

        for (i, agent) in self.agents.iter_mut().enumerate() {
            if !agent.is_active() {
                continue;
            }
            let (phase, target, limits) = match state {
                WorldState::Spawn | WorldState::FlockExternal => {
                    if agent.has_reached_initial_target() {
                        let target = if wander_radius > 0.0 {
                            focal + wander_offset(rng, focal, wander_radius, wander_angle)
                        } else {
                            focal
                        };
                        (AgentPhase::Flocking, target, cruise)
                    } else {
                        (AgentPhase::SeekingInitialTarget, agent.initial_target(), cruise)
                    }
                }
                WorldState::FlockHome => (AgentPhase::Flocking, home_flock, cruise),
                WorldState::PatternHome => {
                    (AgentPhase::PatternFollowing, self.roses[i].current(), pattern_speed)
                }
                WorldState::RestHome => (AgentPhase::Resting, self.rest_targets[i], cruise),
            };
            agent.enter_phase(phase);
            agent.set_target(target);
            agent.set_agent_speed(limits);
        }
    }
}
