pub mod agent;
pub mod config;
pub mod constants;
pub mod math;
pub mod metrics;
pub mod pattern;
pub mod rng;
pub mod schedule;
pub mod spatial;
pub mod world;

pub use agent::{
    Agent, AgentOutput, AgentPhase, AnimationState, Excitation, Neighbor, RotationSpeed,
    SteeringForces,
};
pub use config::{
    ConfigError, LifecycleConfig, PatternConfig, ScheduleConfig, SpeedLimits, SteeringConfig,
    WanderConfig, WorldConfig,
};
pub use metrics::{PhaseCounts, SessionSummary, TickTimings};
pub use pattern::{PatternPath, PatternShape};
pub use schedule::Director;
pub use spatial::{Octree, SpatialError};
pub use world::{Tap, TapReport, World, WorldState};
