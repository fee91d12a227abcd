use crate::config::{LifecycleConfig, SpeedLimits, SteeringConfig};
use crate::math::{clamp_magnitude, heading_orientation, map_range, normalize_or_zero, random_int};
use glam::{EulerRot, Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AgentPhase {
    Dormant,
    Spawning,
    SeekingInitialTarget,
    Flocking,
    PatternFollowing,
    Resting,
    Dead,
}

/// Animation clip the presentation layer should play.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnimationState {
    Curl,
    SwimSlow,
    SwimFast,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RotationSpeed {
    None,
    Fast,
    Slow,
    VerySlow,
}

impl RotationSpeed {
    /// Numeric value understood by the animation rig.
    pub fn patch_value(self) -> u8 {
        match self {
            RotationSpeed::None => 0,
            RotationSpeed::Fast => 1,
            RotationSpeed::Slow => 3,
            RotationSpeed::VerySlow => 5,
        }
    }
}

/// Read-only view of another agent used by the flocking forces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    pub position: Vec3,
    pub velocity: Vec3,
}

/// Clamped steering contributions of one update, before weighting.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SteeringForces {
    pub seek: Vec3,
    pub separation: Vec3,
    pub cohesion: Vec3,
    pub alignment: Vec3,
}

/// Everything the presentation layer needs for one agent after a tick.
#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
pub struct AgentOutput {
    pub index: usize,
    pub awake: bool,
    pub phase: AgentPhase,
    pub position: Vec3,
    pub orientation: Quat,
    pub animation: AnimationState,
    pub rotation_speed: RotationSpeed,
}

impl AgentOutput {
    /// Orientation as intrinsic Z-Y-X Euler angles `(z, y, x)` in radians.
    pub fn euler_zyx(&self) -> (f32, f32, f32) {
        self.orientation.to_euler(EulerRot::ZYX)
    }
}

/// Result of [`Agent::apply_excitation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Excitation {
    /// Dormant, dead or still cooling down from the previous excitation.
    Ignored,
    Excited { remaining: u32 },
    Died,
}

#[derive(Clone, Debug)]
pub struct Agent {
    index: usize,
    phase: AgentPhase,
    pub(crate) position: Vec3,
    pub(crate) velocity: Vec3,
    pub(crate) acceleration: Vec3,
    target: Vec3,
    initial_target: Vec3,
    orientation: Quat,
    steering: SteeringConfig,
    limits: SpeedLimits,
    reached_initial_target: bool,
    death_counter: u32,
    excitation_cooldown: u32,
    cooldown_ticks: u32,
    death_offset: Vec3,
    death_limits: SpeedLimits,
    animation: AnimationState,
    rotation_speed: RotationSpeed,
    forces: SteeringForces,
}

impl Agent {
    /// Create a dormant agent. The death counter is drawn from `rng`.
    pub fn new<R: Rng + ?Sized>(
        index: usize,
        steering: SteeringConfig,
        lifecycle: &LifecycleConfig,
        initial_target: Vec3,
        rng: &mut R,
    ) -> Self {
        let death_counter =
            random_int(rng, lifecycle.death_counter_min, lifecycle.death_counter_max).max(1);
        Self {
            index,
            phase: AgentPhase::Dormant,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            target: initial_target,
            initial_target,
            orientation: Quat::IDENTITY,
            steering,
            limits: steering.cruise_limits(),
            reached_initial_target: false,
            death_counter,
            excitation_cooldown: 0,
            cooldown_ticks: lifecycle.excitation_cooldown_ticks.max(1),
            death_offset: lifecycle.death_offset,
            death_limits: lifecycle.death_speed,
            animation: AnimationState::SwimSlow,
            rotation_speed: RotationSpeed::Slow,
            forces: SteeringForces::default(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn phase(&self) -> AgentPhase {
        self.phase
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn acceleration(&self) -> Vec3 {
        self.acceleration
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn initial_target(&self) -> Vec3 {
        self.initial_target
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    pub fn limits(&self) -> SpeedLimits {
        self.limits
    }

    pub fn animation(&self) -> AnimationState {
        self.animation
    }

    pub fn rotation_speed(&self) -> RotationSpeed {
        self.rotation_speed
    }

    pub fn death_counter(&self) -> u32 {
        self.death_counter
    }

    pub fn has_reached_initial_target(&self) -> bool {
        self.reached_initial_target
    }

    /// Visible and simulated.
    pub fn is_awake(&self) -> bool {
        self.phase != AgentPhase::Dormant
    }

    pub fn is_dead(&self) -> bool {
        self.phase == AgentPhase::Dead
    }

    /// Awake and not dead: takes part in flocking and tap queries.
    pub fn is_active(&self) -> bool {
        self.is_awake() && !self.is_dead()
    }

    pub fn is_excited(&self) -> bool {
        self.excitation_cooldown > 0
    }

    pub fn last_forces(&self) -> SteeringForces {
        self.forces
    }

    pub fn as_neighbor(&self) -> Neighbor {
        Neighbor {
            position: self.position,
            velocity: self.velocity,
        }
    }

    pub fn output(&self) -> AgentOutput {
        AgentOutput {
            index: self.index,
            awake: self.is_awake(),
            phase: self.phase,
            position: self.position,
            orientation: self.orientation,
            animation: self.animation,
            rotation_speed: self.rotation_speed,
        }
    }

    /// Wake the agent at `origin` with zero motion, heading back to its
    /// initial target. The arrival latch survives a respawn. Dead agents stay
    /// dead and `false` is returned.
    pub fn spawn(&mut self, origin: Vec3) -> bool {
        if self.is_dead() {
            return false;
        }
        self.position = origin;
        self.velocity = Vec3::ZERO;
        self.acceleration = Vec3::ZERO;
        self.target = self.initial_target;
        self.limits = self.steering.cruise_limits();
        self.phase = AgentPhase::Spawning;
        self.animation = AnimationState::SwimSlow;
        self.rotation_speed = RotationSpeed::Slow;
        true
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn set_agent_speed(&mut self, limits: SpeedLimits) {
        self.limits = limits;
    }

    /// Move an awake, living agent into a behavior phase chosen by the world.
    ///
    /// `Dormant`, `Spawning` and `Dead` are only reachable through
    /// [`Agent::spawn`] and excitation, so requests for them are ignored.
    pub fn enter_phase(&mut self, phase: AgentPhase) {
        if !self.is_active()
            || matches!(
                phase,
                AgentPhase::Dormant | AgentPhase::Spawning | AgentPhase::Dead
            )
            || phase == self.phase
        {
            return;
        }
        if self.phase == AgentPhase::Resting && !self.is_excited() {
            self.animation = AnimationState::SwimSlow;
            self.rotation_speed = RotationSpeed::Slow;
        }
        self.phase = phase;
    }

    /// Count one excitation against the death counter.
    pub fn apply_excitation(&mut self) -> Excitation {
        if !self.is_active() || self.is_excited() {
            return Excitation::Ignored;
        }
        self.death_counter = self.death_counter.saturating_sub(1);
        if self.death_counter == 0 {
            self.die();
            return Excitation::Died;
        }
        self.excitation_cooldown = self.cooldown_ticks;
        self.animation = AnimationState::SwimFast;
        self.rotation_speed = RotationSpeed::Fast;
        Excitation::Excited {
            remaining: self.death_counter,
        }
    }

    fn die(&mut self) {
        self.phase = AgentPhase::Dead;
        self.excitation_cooldown = 0;
        self.animation = AnimationState::Curl;
        self.rotation_speed = RotationSpeed::None;
        self.limits = self.death_limits;
        self.target = Vec3::new(
            self.position.x + self.death_offset.x,
            self.death_offset.y,
            self.position.z + self.death_offset.z,
        );
    }

    /// Advance one tick: seek, flock, integrate, then refresh the outputs.
    pub fn update(&mut self, neighbors: &[Neighbor]) {
        if !self.is_awake() {
            return;
        }
        if self.excitation_cooldown > 0 {
            self.excitation_cooldown -= 1;
            if self.excitation_cooldown == 0 && !self.is_dead() {
                self.animation = AnimationState::SwimSlow;
                self.rotation_speed = RotationSpeed::Slow;
            }
        }
        if self.phase == AgentPhase::Spawning {
            self.phase = if self.reached_initial_target {
                AgentPhase::Flocking
            } else {
                AgentPhase::SeekingInitialTarget
            };
        }

        self.forces = SteeringForces::default();
        let seek = self.seek(self.target);
        self.forces.seek = seek;
        self.acceleration += seek;

        if self.reached_initial_target && !self.is_dead() && !neighbors.is_empty() {
            self.flock(neighbors);
        }

        self.integrate();

        let distance_sq = self.position.distance_squared(self.target);
        if self.phase == AgentPhase::SeekingInitialTarget
            && distance_sq < self.steering.arrive_tolerance
        {
            self.reached_initial_target = true;
            self.phase = AgentPhase::Flocking;
        }
        if self.phase == AgentPhase::Resting
            && !self.is_excited()
            && distance_sq < self.steering.arrive_tolerance
        {
            self.animation = AnimationState::Curl;
            self.rotation_speed = RotationSpeed::VerySlow;
        }

        if let Some(orientation) = heading_orientation(self.velocity) {
            self.orientation = orientation;
        }
    }

    /// Clamped steering force toward `target`, slowing down inside the
    /// slow-down radius.
    pub fn seek(&self, target: Vec3) -> Vec3 {
        let offset = target - self.position;
        let d = offset.length_squared();
        let arrive = self.steering.arrive_tolerance;
        let slow_down = self.steering.slow_down_tolerance;
        let speed = if d > arrive && d < slow_down {
            map_range(
                d,
                slow_down,
                arrive,
                self.limits.max_speed,
                self.limits.max_slow_down_speed,
            )
        } else {
            self.limits.max_speed
        };
        let mut steer = normalize_or_zero(offset) * speed - self.velocity;
        clamp_magnitude(&mut steer, self.limits.max_force);
        steer
    }

    fn flock(&mut self, neighbors: &[Neighbor]) {
        let separation = self.separation(neighbors);
        let cohesion = self.cohesion(neighbors);
        let alignment = self.alignment(neighbors);
        self.forces.separation = separation;
        self.forces.cohesion = cohesion;
        self.forces.alignment = alignment;
        self.acceleration += separation * self.steering.separation_weight
            + cohesion * self.steering.cohesion_weight
            + alignment * self.steering.alignment_weight;
    }

    /// Steer away from neighbors inside the separation radius, weighting
    /// closer ones more. Coincident neighbors carry no direction and are
    /// skipped.
    pub fn separation(&self, neighbors: &[Neighbor]) -> Vec3 {
        let radius_sq = self.steering.separation_radius * self.steering.separation_radius;
        let mut sum = Vec3::ZERO;
        let mut count = 0usize;
        for n in neighbors {
            let diff = self.position - n.position;
            let d_sq = diff.length_squared();
            if d_sq > 0.0 && d_sq <= radius_sq {
                sum += diff / d_sq;
                count += 1;
            }
        }
        if count == 0 {
            return Vec3::ZERO;
        }
        let mut desired = normalize_or_zero(sum / count as f32);
        clamp_magnitude(&mut desired, self.limits.max_speed);
        let mut steer = desired - self.velocity;
        clamp_magnitude(&mut steer, self.limits.max_force);
        steer
    }

    /// Seek the centroid of neighbors inside the cohesion radius.
    pub fn cohesion(&mut self, neighbors: &[Neighbor]) -> Vec3 {
        let radius_sq = self.steering.cohesion_radius * self.steering.cohesion_radius;
        let mut sum = Vec3::ZERO;
        let mut count = 0usize;
        for n in neighbors {
            if self.position.distance_squared(n.position) <= radius_sq {
                sum += n.position;
                count += 1;
            }
        }
        if count == 0 {
            return Vec3::ZERO;
        }
        let centroid = sum / count as f32;
        if self.steering.cohesion_overrides_target {
            self.target = centroid;
        }
        self.seek(centroid)
    }

    /// Match the mean heading of neighbors inside the alignment radius.
    pub fn alignment(&self, neighbors: &[Neighbor]) -> Vec3 {
        let radius_sq = self.steering.alignment_radius * self.steering.alignment_radius;
        let mut sum = Vec3::ZERO;
        let mut count = 0usize;
        for n in neighbors {
            if self.position.distance_squared(n.position) <= radius_sq {
                sum += n.velocity;
                count += 1;
            }
        }
        if count == 0 {
            return Vec3::ZERO;
        }
        let desired = normalize_or_zero(sum / count as f32) * self.limits.max_speed;
        let mut steer = desired - self.velocity;
        clamp_magnitude(&mut steer, self.limits.max_force);
        steer
    }

    fn integrate(&mut self) {
        let smoothed = self
            .velocity
            .lerp(self.velocity + self.acceleration, self.steering.smoothing_factor);
        self.velocity = smoothed;
        clamp_magnitude(&mut self.velocity, self.limits.max_speed);
        self.position += self.velocity;
        self.acceleration = Vec3::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::create_rng;
    use proptest::prelude::*;

    const EPS: f32 = 1e-6;

    fn arrival_steering() -> SteeringConfig {
        SteeringConfig {
            max_speed: 0.01,
            max_force: 0.01,
            max_slow_down_speed: 0.001,
            arrive_tolerance: 0.0001,
            slow_down_tolerance: 0.04,
            smoothing_factor: 1.0,
            ..SteeringConfig::default()
        }
    }

    fn lifecycle(min: u32, max: u32) -> LifecycleConfig {
        LifecycleConfig {
            death_counter_min: min,
            death_counter_max: max,
            excitation_cooldown_ticks: 3,
            ..LifecycleConfig::default()
        }
    }

    fn spawned(steering: SteeringConfig, at: Vec3, target: Vec3) -> Agent {
        let mut rng = create_rng(1);
        let mut agent = Agent::new(0, steering, &lifecycle(3, 3), target, &mut rng);
        assert!(agent.spawn(at));
        agent
    }

    /// Spawned agent that has already latched, so flocking forces apply.
    fn flocking(steering: SteeringConfig, at: Vec3) -> Agent {
        let mut agent = spawned(steering, at, at);
        agent.reached_initial_target = true;
        agent.phase = AgentPhase::Flocking;
        agent
    }

    #[test]
    fn new_agent_is_dormant_until_spawned() {
        let mut rng = create_rng(5);
        let mut agent = Agent::new(
            4,
            SteeringConfig::default(),
            &lifecycle(2, 5),
            Vec3::Y,
            &mut rng,
        );
        assert_eq!(agent.phase(), AgentPhase::Dormant);
        assert!(!agent.is_awake());
        assert!((2..=5).contains(&agent.death_counter()));

        agent.update(&[]);
        assert_eq!(agent.position(), Vec3::ZERO);

        agent.spawn(Vec3::new(0.0, -0.1, 0.0));
        assert_eq!(agent.phase(), AgentPhase::Spawning);
        assert_eq!(agent.position(), Vec3::new(0.0, -0.1, 0.0));
        agent.update(&[]);
        assert_eq!(agent.phase(), AgentPhase::SeekingInitialTarget);
    }

    #[test]
    fn arrives_within_tolerance_and_latches_on_first_crossing() {
        let target = Vec3::new(0.0, 0.0, 1.0);
        let mut agent = spawned(arrival_steering(), Vec3::ZERO, target);
        let mut latched_at = None;
        for tick in 0..500 {
            agent.update(&[]);
            let d = agent.position().distance_squared(target);
            if latched_at.is_none() {
                if d < 0.0001 {
                    assert!(agent.has_reached_initial_target());
                    latched_at = Some(tick);
                    break;
                }
                assert!(!agent.has_reached_initial_target(), "latched early at tick {tick}");
            }
        }
        assert!(latched_at.is_some(), "agent never arrived");
        assert_eq!(agent.phase(), AgentPhase::Flocking);
    }

    #[test]
    fn distance_to_target_decreases_until_arrival() {
        let target = Vec3::new(0.0, 0.0, 1.0);
        let mut agent = spawned(arrival_steering(), Vec3::ZERO, target);
        let mut previous = agent.position().distance(target);
        while !agent.has_reached_initial_target() {
            agent.update(&[]);
            let now = agent.position().distance(target);
            assert!(now < previous, "distance grew from {previous} to {now}");
            previous = now;
        }
        assert!(previous < 0.01);
    }

    #[test]
    fn latch_never_reverts() {
        let target = Vec3::new(0.0, 0.0, 0.05);
        let mut agent = spawned(arrival_steering(), Vec3::ZERO, target);
        for _ in 0..200 {
            agent.update(&[]);
        }
        assert!(agent.has_reached_initial_target());
        agent.set_target(Vec3::new(5.0, 5.0, 5.0));
        agent.spawn(Vec3::new(-1.0, 0.0, 0.0));
        for _ in 0..10 {
            agent.update(&[]);
            assert!(agent.has_reached_initial_target());
        }
        assert_eq!(agent.phase(), AgentPhase::Flocking);
    }

    #[test]
    fn slow_down_law_is_inverted_inside_radius() {
        let steering = SteeringConfig {
            max_force: 10.0,
            ..arrival_steering()
        };
        let far = spawned(steering, Vec3::ZERO, Vec3::Z);
        assert!((far.seek(Vec3::Z).length() - 0.01).abs() < EPS);

        // d = 0.0201, midway through the remap.
        let near = spawned(steering, Vec3::ZERO, Vec3::Z);
        let target = Vec3::new(0.0, 0.0, 0.0201f32.sqrt());
        let expected = map_range(0.0201, 0.04, 0.0001, 0.01, 0.001);
        assert!((near.seek(target).length() - expected).abs() < 1e-5);
        assert!(expected < 0.01 && expected > 0.001);
    }

    #[test]
    fn empty_neighbor_list_adds_no_flocking_force() {
        let mut agent = flocking(SteeringConfig::default(), Vec3::ZERO);
        assert_eq!(agent.separation(&[]), Vec3::ZERO);
        assert_eq!(agent.cohesion(&[]), Vec3::ZERO);
        assert_eq!(agent.alignment(&[]), Vec3::ZERO);
        agent.update(&[]);
        let forces = agent.last_forces();
        assert_eq!(forces.separation, Vec3::ZERO);
        assert_eq!(forces.cohesion, Vec3::ZERO);
        assert_eq!(forces.alignment, Vec3::ZERO);
    }

    #[test]
    fn flocking_waits_for_the_latch() {
        let mut agent = spawned(SteeringConfig::default(), Vec3::ZERO, Vec3::Y);
        let neighbor = Neighbor {
            position: Vec3::new(0.01, 0.0, 0.0),
            velocity: Vec3::X * 0.001,
        };
        agent.update(&[neighbor]);
        assert_eq!(agent.last_forces().separation, Vec3::ZERO);
    }

    #[test]
    fn three_close_agents_push_apart() {
        let steering = SteeringConfig {
            separation_radius: 0.04,
            ..SteeringConfig::default()
        };
        let h = 0.02 * 3f32.sqrt() / 2.0;
        let positions = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.02, 0.0, 0.0),
            Vec3::new(0.01, h, 0.0),
        ];
        let mut agents: Vec<Agent> = positions.iter().map(|p| flocking(steering, *p)).collect();
        let snapshot: Vec<Neighbor> = agents.iter().map(Agent::as_neighbor).collect();
        for (i, agent) in agents.iter_mut().enumerate() {
            let others: Vec<Neighbor> = snapshot
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, n)| *n)
                .collect();
            agent.set_target(agent.position());
            agent.update(&others);
            let sep = agent.last_forces().separation;
            assert!(sep.length() > 0.0, "agent {i} felt no separation");
            let centroid_of_others = (others[0].position + others[1].position) / 2.0;
            let away = positions[i] - centroid_of_others;
            assert!(sep.dot(away) > 0.0, "agent {i} separation points inward");
        }
    }

    #[test]
    fn coincident_neighbors_are_skipped_by_separation() {
        let agent = flocking(SteeringConfig::default(), Vec3::ZERO);
        let twin = Neighbor {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
        };
        let sep = agent.separation(&[twin]);
        assert_eq!(sep, Vec3::ZERO);
        assert!(sep.is_finite());
    }

    #[test]
    fn cohesion_uses_temporary_target_unless_configured() {
        let neighbors = [
            Neighbor {
                position: Vec3::new(0.02, 0.0, 0.0),
                velocity: Vec3::ZERO,
            },
            Neighbor {
                position: Vec3::new(0.0, 0.02, 0.0),
                velocity: Vec3::ZERO,
            },
        ];
        let mut keeps = flocking(SteeringConfig::default(), Vec3::ZERO);
        keeps.set_target(Vec3::Z);
        let force = keeps.cohesion(&neighbors);
        assert!(force.x > 0.0 && force.y > 0.0);
        assert_eq!(keeps.target(), Vec3::Z);

        let mut overrides = flocking(
            SteeringConfig {
                cohesion_overrides_target: true,
                ..SteeringConfig::default()
            },
            Vec3::ZERO,
        );
        overrides.set_target(Vec3::Z);
        overrides.cohesion(&neighbors);
        assert!((overrides.target() - Vec3::new(0.01, 0.01, 0.0)).length() < EPS);
    }

    #[test]
    fn alignment_matches_mean_heading() {
        let agent = flocking(SteeringConfig::default(), Vec3::ZERO);
        let neighbors = [
            Neighbor {
                position: Vec3::new(0.01, 0.0, 0.0),
                velocity: Vec3::new(0.001, 0.0, 0.0),
            },
            Neighbor {
                position: Vec3::new(-0.01, 0.0, 0.0),
                velocity: Vec3::new(0.003, 0.0, 0.0),
            },
        ];
        let force = agent.alignment(&neighbors);
        assert!(force.x > 0.0);
        assert!(force.y.abs() < EPS && force.z.abs() < EPS);
        assert!(force.length() <= agent.limits().max_force + EPS);
    }

    #[test]
    fn neighbors_outside_perception_radii_are_ignored() {
        let agent = flocking(SteeringConfig::default(), Vec3::ZERO);
        let far = Neighbor {
            position: Vec3::new(1.0, 0.0, 0.0),
            velocity: Vec3::Y,
        };
        assert_eq!(agent.separation(&[far]), Vec3::ZERO);
        assert_eq!(agent.alignment(&[far]), Vec3::ZERO);
    }

    #[test]
    fn zero_velocity_keeps_previous_orientation() {
        let mut agent = spawned(arrival_steering(), Vec3::ZERO, Vec3::X);
        agent.update(&[]);
        let heading = agent.orientation();
        assert!((heading * Vec3::Y - Vec3::X).length() < 1e-3);

        // Target exactly on the agent with zero velocity: no steering at all.
        agent.velocity = Vec3::ZERO;
        agent.set_target(agent.position());
        agent.update(&[]);
        assert_eq!(agent.velocity(), Vec3::ZERO);
        assert_eq!(agent.orientation(), heading);
        assert!(agent.orientation().is_finite());
    }

    #[test]
    fn excitation_is_guarded_by_cooldown() {
        let mut agent = spawned(SteeringConfig::default(), Vec3::ZERO, Vec3::Y);
        assert_eq!(agent.apply_excitation(), Excitation::Excited { remaining: 2 });
        assert_eq!(agent.animation(), AnimationState::SwimFast);
        assert_eq!(agent.rotation_speed(), RotationSpeed::Fast);
        assert_eq!(agent.apply_excitation(), Excitation::Ignored);
        assert_eq!(agent.death_counter(), 2);

        for _ in 0..3 {
            agent.update(&[]);
        }
        assert!(!agent.is_excited());
        assert_eq!(agent.animation(), AnimationState::SwimSlow);
        assert_eq!(agent.apply_excitation(), Excitation::Excited { remaining: 1 });
    }

    #[test]
    fn zero_cooldown_still_guards_until_next_update() {
        let mut rng = create_rng(3);
        let lifecycle = LifecycleConfig {
            excitation_cooldown_ticks: 0,
            ..lifecycle(4, 4)
        };
        let mut agent = Agent::new(0, SteeringConfig::default(), &lifecycle, Vec3::Y, &mut rng);
        agent.spawn(Vec3::ZERO);
        assert_eq!(agent.apply_excitation(), Excitation::Excited { remaining: 3 });
        assert_eq!(agent.apply_excitation(), Excitation::Ignored);
        assert_eq!(agent.death_counter(), 3);

        agent.update(&[]);
        assert_eq!(agent.apply_excitation(), Excitation::Excited { remaining: 2 });
    }

    #[test]
    fn dormant_agents_ignore_excitation() {
        let mut rng = create_rng(2);
        let mut agent = Agent::new(0, SteeringConfig::default(), &lifecycle(1, 1), Vec3::Y, &mut rng);
        assert_eq!(agent.apply_excitation(), Excitation::Ignored);
        assert_eq!(agent.death_counter(), 1);
    }

    #[test]
    fn death_retargets_to_ground_and_is_terminal() {
        let mut rng = create_rng(2);
        let mut agent = Agent::new(0, SteeringConfig::default(), &lifecycle(1, 1), Vec3::Y, &mut rng);
        agent.spawn(Vec3::new(0.03, 0.05, -0.02));
        assert_eq!(agent.apply_excitation(), Excitation::Died);
        assert!(agent.is_dead());
        assert_eq!(agent.animation(), AnimationState::Curl);
        assert_eq!(agent.limits(), SpeedLimits::DEATH);
        let off = LifecycleConfig::default().death_offset;
        assert!((agent.target() - Vec3::new(0.03 + off.x, off.y, -0.02 + off.z)).length() < EPS);

        assert_eq!(agent.apply_excitation(), Excitation::Ignored);
        assert!(!agent.spawn(Vec3::ZERO));
        agent.enter_phase(AgentPhase::Flocking);
        assert_eq!(agent.phase(), AgentPhase::Dead);

        let start = agent.position().distance(agent.target());
        for _ in 0..20 {
            agent.update(&[]);
            assert!(agent.velocity().length() <= SpeedLimits::DEATH.max_speed + EPS);
        }
        assert!(agent.position().distance(agent.target()) < start);
    }

    #[test]
    fn resting_agents_curl_on_arrival_and_uncurl_on_leaving() {
        let mut agent = spawned(arrival_steering(), Vec3::ZERO, Vec3::ZERO);
        agent.update(&[]);
        agent.enter_phase(AgentPhase::Resting);
        agent.set_target(Vec3::new(0.0, 0.0, 0.02));
        let mut curled = false;
        for _ in 0..100 {
            agent.update(&[]);
            if agent.animation() == AnimationState::Curl {
                curled = true;
                break;
            }
        }
        assert!(curled);
        assert_eq!(agent.rotation_speed(), RotationSpeed::VerySlow);

        agent.enter_phase(AgentPhase::Flocking);
        assert_eq!(agent.animation(), AnimationState::SwimSlow);
        assert_eq!(agent.rotation_speed(), RotationSpeed::Slow);
    }

    #[test]
    fn output_reports_presentation_state() {
        let mut agent = spawned(arrival_steering(), Vec3::ZERO, Vec3::X);
        agent.update(&[]);
        let out = agent.output();
        assert_eq!(out.index, 0);
        assert!(out.awake);
        assert_eq!(out.position, agent.position());
        assert_eq!(RotationSpeed::VerySlow.patch_value(), 5);
        let (z, _, _) = out.euler_zyx();
        // Heading +X is a -90 degree yaw from the model's +Y.
        assert!((z + std::f32::consts::FRAC_PI_2).abs() < 1e-3);
    }

    fn neighbor_strategy() -> impl Strategy<Value = Neighbor> {
        (
            -0.05f32..0.05,
            -0.05f32..0.05,
            -0.05f32..0.05,
            -0.01f32..0.01,
            -0.01f32..0.01,
        )
            .prop_map(|(x, y, z, vx, vz)| Neighbor {
                position: Vec3::new(x, y, z),
                velocity: Vec3::new(vx, 0.0, vz),
            })
    }

    proptest! {
        #[test]
        fn proptest_speed_and_force_bounds_hold(
            neighbors in proptest::collection::vec(neighbor_strategy(), 0..6),
            tx in -1.0f32..1.0,
            ty in -1.0f32..1.0,
            smoothing in 0.01f32..=1.0,
            ticks in 1usize..40,
        ) {
            let steering = SteeringConfig {
                smoothing_factor: smoothing,
                ..SteeringConfig::default()
            };
            let mut agent = flocking(steering, Vec3::ZERO);
            agent.set_target(Vec3::new(tx, ty, 0.0));
            let limits = agent.limits();
            for _ in 0..ticks {
                agent.update(&neighbors);
                prop_assert!(agent.velocity().length() <= limits.max_speed + EPS);
                let f = agent.last_forces();
                for force in [f.seek, f.separation, f.cohesion, f.alignment] {
                    prop_assert!(force.length() <= limits.max_force + EPS);
                }
                prop_assert!(agent.position().is_finite());
            }
        }
    }
}
