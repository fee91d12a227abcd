use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Speed preset applied to an agent: cruising, pattern following or dying.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeedLimits {
    pub max_speed: f32,
    pub max_force: f32,
    /// Speed approached as the agent closes in on its target.
    pub max_slow_down_speed: f32,
}

impl SpeedLimits {
    pub const LOW: SpeedLimits = SpeedLimits {
        max_speed: 0.002,
        max_force: 0.002,
        max_slow_down_speed: 0.0001,
    };
    pub const MEDIUM: SpeedLimits = SpeedLimits {
        max_speed: 0.004,
        max_force: 0.004,
        max_slow_down_speed: 0.0001,
    };
    pub const DEATH: SpeedLimits = SpeedLimits {
        max_speed: 0.001,
        max_force: 0.001,
        max_slow_down_speed: 0.0,
    };

    fn is_valid(&self) -> bool {
        self.max_speed.is_finite()
            && self.max_speed > 0.0
            && self.max_force.is_finite()
            && self.max_force > 0.0
            && self.max_slow_down_speed.is_finite()
            && self.max_slow_down_speed >= 0.0
    }
}

impl Default for SpeedLimits {
    fn default() -> Self {
        Self::LOW
    }
}

/// Per-agent steering parameters.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SteeringConfig {
    /// Cruise speed cap applied after every integration step.
    pub max_speed: f32,
    /// Cap on each individual steering contribution.
    pub max_force: f32,
    /// Speed the arrive law tapers toward near the target.
    pub max_slow_down_speed: f32,
    /// Squared distance under which the agent counts as arrived.
    pub arrive_tolerance: f32,
    /// Squared distance under which the arrive law starts slowing down.
    pub slow_down_tolerance: f32,
    /// Exponential smoothing factor for velocity, in `(0, 1]`.
    pub smoothing_factor: f32,
    pub separation_weight: f32,
    pub cohesion_weight: f32,
    pub alignment_weight: f32,
    pub separation_radius: f32,
    pub cohesion_radius: f32,
    pub alignment_radius: f32,
    /// When set, cohesion writes the neighbor centroid into the agent's real
    /// target instead of seeking it through a temporary.
    pub cohesion_overrides_target: bool,
}

impl SteeringConfig {
    pub fn cruise_limits(&self) -> SpeedLimits {
        SpeedLimits {
            max_speed: self.max_speed,
            max_force: self.max_force,
            max_slow_down_speed: self.max_slow_down_speed,
        }
    }
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            max_speed: SpeedLimits::LOW.max_speed,
            max_force: SpeedLimits::LOW.max_force,
            max_slow_down_speed: SpeedLimits::LOW.max_slow_down_speed,
            arrive_tolerance: 0.01 * 0.01,
            slow_down_tolerance: 0.2 * 0.2,
            smoothing_factor: 0.01,
            separation_weight: 3.0,
            cohesion_weight: 1.0,
            alignment_weight: 2.0,
            separation_radius: 0.04,
            cohesion_radius: 0.15,
            alignment_radius: 0.15,
            cohesion_overrides_target: false,
        }
    }
}

/// Excitation, death and resting parameters.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Inclusive lower bound of the initial death counter.
    pub death_counter_min: u32,
    /// Inclusive upper bound of the initial death counter.
    pub death_counter_max: u32,
    /// Ticks during which an excited agent ignores further excitation.
    /// Must be at least 1 so repeated taps within one tick count once.
    pub excitation_cooldown_ticks: u32,
    /// Offset of the ground point a dying agent sinks to; y is absolute.
    pub death_offset: Vec3,
    pub death_speed: SpeedLimits,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            death_counter_min: 2,
            death_counter_max: 5,
            excitation_cooldown_ticks: 30,
            death_offset: Vec3::new(0.005, 0.0008, 0.0),
            death_speed: SpeedLimits::DEATH,
        }
    }
}

/// Shapes of the home-area motion.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PatternConfig {
    pub flock_radius_x: f32,
    pub flock_radius_z: f32,
    pub flock_amplitude: f32,
    pub flock_step_degrees: f32,
    pub flock_clockwise: bool,
    pub rose_radius: f32,
    pub rose_petals: f32,
    pub rose_amplitude: f32,
    pub rose_step_degrees: f32,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            flock_radius_x: 0.06,
            flock_radius_z: 0.04,
            flock_amplitude: 0.04,
            flock_step_degrees: 0.32,
            flock_clockwise: true,
            rose_radius: 0.07,
            rose_petals: 5.0,
            rose_amplitude: 0.04,
            rose_step_degrees: 0.15,
        }
    }
}

/// Tick-count policies used by [`crate::schedule::Director`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Ticks between successive agent releases after the session starts.
    pub release_interval_ticks: u32,
    /// Advance the world state after this many ticks in one state (0 = never).
    pub auto_advance_after_ticks: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            release_interval_ticks: 66,
            auto_advance_after_ticks: 0,
        }
    }
}

/// Random jitter around the external target for latched agents.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WanderConfig {
    /// Offset length in world units (0 = off).
    pub radius: f32,
    pub max_angle_degrees: f32,
}

impl Default for WanderConfig {
    fn default() -> Self {
        Self {
            radius: 0.0,
            max_angle_degrees: 10.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// Deterministic seed for per-agent randomness.
    pub seed: u64,
    /// Number of agent slots, all dormant at start.
    pub agent_count: usize,
    /// Half edge length of the cube indexed around the focal or home target.
    pub spatial_half_extent: f32,
    /// Points a node may hold before it subdivides.
    pub max_points_per_node: usize,
    /// Radius of the per-agent neighbor query.
    pub neighbor_radius: f32,
    /// Radius around a tap location in which agents get excited.
    pub tap_radius: f32,
    /// Center of the home area.
    pub home: Vec3,
    /// Default spawn origin, used by the scheduler.
    pub spawn_origin: Vec3,
    /// Speed preset while following the rose pattern.
    pub pattern_speed: SpeedLimits,
    /// Explicit initial targets, one per agent. Empty generates a ring above
    /// `spawn_origin`.
    pub initial_targets: Vec<Vec3>,
    /// Explicit rest targets, one per agent. Empty generates a ring around `home`.
    pub rest_targets: Vec<Vec3>,
    pub steering: SteeringConfig,
    pub lifecycle: LifecycleConfig,
    pub patterns: PatternConfig,
    pub schedule: ScheduleConfig,
    pub focal_wander: WanderConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            agent_count: 5,
            spatial_half_extent: 0.1,
            max_points_per_node: 2,
            neighbor_radius: 0.05,
            tap_radius: 0.1,
            home: Vec3::ZERO,
            spawn_origin: Vec3::new(0.0, -0.05, 0.0),
            pattern_speed: SpeedLimits::MEDIUM,
            initial_targets: Vec::new(),
            rest_targets: Vec::new(),
            steering: SteeringConfig::default(),
            lifecycle: LifecycleConfig::default(),
            patterns: PatternConfig::default(),
            schedule: ScheduleConfig::default(),
            focal_wander: WanderConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    #[error("agent_count must be at least 1")]
    InvalidAgentCount,
    #[error("spatial_half_extent must be positive and finite")]
    InvalidSpatialHalfExtent,
    #[error("max_points_per_node must be at least 1")]
    InvalidMaxPointsPerNode,
    #[error("neighbor_radius must be non-negative and finite")]
    InvalidNeighborRadius,
    #[error("tap_radius must be positive and finite")]
    InvalidTapRadius,
    #[error("home and spawn_origin must be finite")]
    NonFiniteAnchor,
    #[error("steering speed limits must be positive and finite")]
    InvalidSteeringLimits,
    #[error("pattern_speed limits must be positive and finite")]
    InvalidPatternSpeed,
    #[error("death_speed limits must be positive and finite")]
    InvalidDeathSpeed,
    #[error("tolerances must satisfy 0 < arrive_tolerance ({arrive}) < slow_down_tolerance ({slow_down})")]
    InvalidTolerances { arrive: f32, slow_down: f32 },
    #[error("smoothing_factor must be in (0, 1], got {0}")]
    InvalidSmoothingFactor(f32),
    #[error("flocking weights must be non-negative and finite")]
    InvalidFlockingWeights,
    #[error("perception radii must be non-negative and finite")]
    InvalidPerceptionRadii,
    #[error("death counter range must satisfy 1 <= min ({min}) <= max ({max})")]
    InvalidDeathCounterRange { min: u32, max: u32 },
    #[error("death_offset must be finite")]
    InvalidDeathOffset,
    #[error("excitation_cooldown_ticks must be at least 1")]
    InvalidExcitationCooldown,
    #[error("pattern radii, amplitudes and steps must be positive and finite")]
    InvalidPatternShape,
    #[error("rose_petals must be positive and finite")]
    InvalidRosePetals,
    #[error("release_interval_ticks must be at least 1")]
    InvalidReleaseInterval,
    #[error("focal wander radius and angle must be non-negative and finite")]
    InvalidWander,
    #[error("{field} has {actual} entries but agent_count is {expected}")]
    TargetCountMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{field} contains a non-finite point")]
    NonFiniteTarget { field: &'static str },
}

fn non_negative(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

impl WorldConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_world()?;
        self.validate_steering()?;
        self.validate_lifecycle()?;
        self.validate_patterns()?;
        self.validate_targets()?;
        Ok(())
    }

    fn validate_world(&self) -> Result<(), ConfigError> {
        if self.agent_count == 0 {
            return Err(ConfigError::InvalidAgentCount);
        }
        if !positive(self.spatial_half_extent) {
            return Err(ConfigError::InvalidSpatialHalfExtent);
        }
        if self.max_points_per_node == 0 {
            return Err(ConfigError::InvalidMaxPointsPerNode);
        }
        if !non_negative(self.neighbor_radius) {
            return Err(ConfigError::InvalidNeighborRadius);
        }
        if !positive(self.tap_radius) {
            return Err(ConfigError::InvalidTapRadius);
        }
        if !self.home.is_finite() || !self.spawn_origin.is_finite() {
            return Err(ConfigError::NonFiniteAnchor);
        }
        if self.schedule.release_interval_ticks == 0 {
            return Err(ConfigError::InvalidReleaseInterval);
        }
        if !non_negative(self.focal_wander.radius)
            || !non_negative(self.focal_wander.max_angle_degrees)
        {
            return Err(ConfigError::InvalidWander);
        }
        Ok(())
    }

    fn validate_steering(&self) -> Result<(), ConfigError> {
        let s = &self.steering;
        if !s.cruise_limits().is_valid() {
            return Err(ConfigError::InvalidSteeringLimits);
        }
        if !self.pattern_speed.is_valid() {
            return Err(ConfigError::InvalidPatternSpeed);
        }
        // Also guarantees a non-degenerate input range for the arrive law.
        if !positive(s.arrive_tolerance)
            || !positive(s.slow_down_tolerance)
            || s.arrive_tolerance >= s.slow_down_tolerance
        {
            return Err(ConfigError::InvalidTolerances {
                arrive: s.arrive_tolerance,
                slow_down: s.slow_down_tolerance,
            });
        }
        if !positive(s.smoothing_factor) || s.smoothing_factor > 1.0 {
            return Err(ConfigError::InvalidSmoothingFactor(s.smoothing_factor));
        }
        if ![s.separation_weight, s.cohesion_weight, s.alignment_weight]
            .into_iter()
            .all(non_negative)
        {
            return Err(ConfigError::InvalidFlockingWeights);
        }
        if ![s.separation_radius, s.cohesion_radius, s.alignment_radius]
            .into_iter()
            .all(non_negative)
        {
            return Err(ConfigError::InvalidPerceptionRadii);
        }
        Ok(())
    }

    fn validate_lifecycle(&self) -> Result<(), ConfigError> {
        let l = &self.lifecycle;
        if l.death_counter_min == 0 || l.death_counter_min > l.death_counter_max {
            return Err(ConfigError::InvalidDeathCounterRange {
                min: l.death_counter_min,
                max: l.death_counter_max,
            });
        }
        if l.excitation_cooldown_ticks == 0 {
            return Err(ConfigError::InvalidExcitationCooldown);
        }
        if !l.death_offset.is_finite() {
            return Err(ConfigError::InvalidDeathOffset);
        }
        if !l.death_speed.is_valid() {
            return Err(ConfigError::InvalidDeathSpeed);
        }
        Ok(())
    }

    fn validate_patterns(&self) -> Result<(), ConfigError> {
        let p = &self.patterns;
        let shape = [
            p.flock_radius_x,
            p.flock_radius_z,
            p.flock_amplitude,
            p.flock_step_degrees,
            p.rose_radius,
            p.rose_amplitude,
            p.rose_step_degrees,
        ];
        if !shape.into_iter().all(positive) {
            return Err(ConfigError::InvalidPatternShape);
        }
        if !positive(p.rose_petals) {
            return Err(ConfigError::InvalidRosePetals);
        }
        Ok(())
    }

    fn validate_targets(&self) -> Result<(), ConfigError> {
        for (field, targets) in [
            ("initial_targets", &self.initial_targets),
            ("rest_targets", &self.rest_targets),
        ] {
            if targets.is_empty() {
                continue;
            }
            if targets.len() != self.agent_count {
                return Err(ConfigError::TargetCountMismatch {
                    field,
                    expected: self.agent_count,
                    actual: targets.len(),
                });
            }
            if !targets.iter().all(|t| t.is_finite()) {
                return Err(ConfigError::NonFiniteTarget { field });
            }
        }
        Ok(())
    }
}
