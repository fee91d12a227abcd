use crate::agent::{AgentOutput, AgentPhase};
use crate::world::WorldState;
use serde::{Deserialize, Serialize};

/// Wall-clock cost of one tick, in microseconds.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TickTimings {
    pub index_build_us: u64,
    pub target_resolve_us: u64,
    pub agent_update_us: u64,
    pub total_us: u64,
}

/// Per-phase head count.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PhaseCounts {
    pub dormant: usize,
    pub spawning: usize,
    pub seeking_initial_target: usize,
    pub flocking: usize,
    pub pattern_following: usize,
    pub resting: usize,
    pub dead: usize,
}

impl PhaseCounts {
    pub fn record(&mut self, phase: AgentPhase) {
        let slot = match phase {
            AgentPhase::Dormant => &mut self.dormant,
            AgentPhase::Spawning => &mut self.spawning,
            AgentPhase::SeekingInitialTarget => &mut self.seeking_initial_target,
            AgentPhase::Flocking => &mut self.flocking,
            AgentPhase::PatternFollowing => &mut self.pattern_following,
            AgentPhase::Resting => &mut self.resting,
            AgentPhase::Dead => &mut self.dead,
        };
        *slot += 1;
    }
}

/// End-of-session report for headless runs.
#[derive(Clone, Debug, Serialize)]
pub struct SessionSummary {
    pub ticks: u64,
    pub world_state: WorldState,
    pub state_transitions: u64,
    pub spawned: usize,
    pub taps: u64,
    pub excitations: u64,
    pub deaths: u64,
    pub phases: PhaseCounts,
    /// Mean speed over awake agents at the last tick.
    pub mean_speed: f32,
    /// Mean pairwise distance between active agents at the last tick.
    pub mean_spacing: f32,
    pub agents: Vec<AgentOutput>,
}
