use crate::agent::{Agent, AgentOutput, Excitation, Neighbor};
use crate::config::{ConfigError, WorldConfig};
use crate::metrics::{PhaseCounts, SessionSummary, TickTimings};
use crate::pattern::PatternPath;
use crate::rng::{create_rng, derive_agent_rng};
use crate::spatial::{Octree, SpatialError};
use glam::Vec3;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use std::time::Instant;
use tracing::{debug, info, trace};

/// Shared behavior mode of the whole flock.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WorldState {
    /// Waiting for the first long-press.
    #[default]
    Spawn,
    /// Following the externally driven focal target.
    FlockExternal,
    /// Circling the home ellipse together.
    FlockHome,
    /// Tracing individual roses around home.
    PatternHome,
    /// Settling onto rest targets.
    RestHome,
}

impl WorldState {
    pub fn next(self) -> Self {
        match self {
            WorldState::Spawn => WorldState::FlockExternal,
            WorldState::FlockExternal => WorldState::FlockHome,
            WorldState::FlockHome => WorldState::PatternHome,
            WorldState::PatternHome => WorldState::RestHome,
            WorldState::RestHome => WorldState::FlockExternal,
        }
    }
}

/// Where an interaction event lands.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Tap {
    /// Around the current focal target.
    Focal,
    At(Vec3),
    Agent(usize),
}

/// Agents touched by one tap, by index in ascending order.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct TapReport {
    pub hits: Vec<usize>,
    pub excited: Vec<usize>,
    pub died: Vec<usize>,
}

#[derive(Clone, Copy, Debug, Default)]
struct SessionCounters {
    transitions: u64,
    spawned: usize,
    taps: u64,
    excitations: u64,
    deaths: u64,
}

pub struct World {
    agents: Vec<Agent>,
    // Keep config private to preserve constructor invariants.
    config: WorldConfig,
    state: WorldState,
    focal_target: Vec3,
    home_flock: PatternPath,
    roses: Vec<PatternPath>,
    rest_targets: Vec<Vec3>,
    focal_index: Option<Octree<usize>>,
    home_index: Option<Octree<usize>>,
    snapshot_buffer: Vec<Neighbor>,
    neighbor_buffers: Vec<Vec<Neighbor>>,
    outputs: Vec<AgentOutput>,
    rng: ChaCha12Rng,
    tick_index: u64,
    last_timings: TickTimings,
    counters: SessionCounters,
}

/// Evenly spaced points on a horizontal circle.
fn ring(center: Vec3, radius: f32, count: usize) -> Vec<Vec3> {
    (0..count)
        .map(|i| {
            let angle = TAU * i as f32 / count as f32;
            center + Vec3::new(radius * angle.cos(), 0.0, radius * angle.sin())
        })
        .collect()
}

const INITIAL_RING_RADIUS: f32 = 0.05;
const INITIAL_RING_RISE: f32 = 0.1;
const REST_RING_RADIUS: f32 = 0.06;

impl World {
    /// Validate `config` and create its agents, all dormant.
    pub fn new(config: WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let n = config.agent_count;
        let initial_targets = if config.initial_targets.is_empty() {
            ring(
                config.spawn_origin + Vec3::Y * INITIAL_RING_RISE,
                INITIAL_RING_RADIUS,
                n,
            )
        } else {
            config.initial_targets.clone()
        };
        let rest_targets = if config.rest_targets.is_empty() {
            ring(config.home, REST_RING_RADIUS, n)
        } else {
            config.rest_targets.clone()
        };
        let agents: Vec<Agent> = initial_targets
            .iter()
            .enumerate()
            .map(|(i, target)| {
                let mut rng = derive_agent_rng(config.seed, i);
                Agent::new(i, config.steering, &config.lifecycle, *target, &mut rng)
            })
            .collect();
        let roses = (0..n)
            .map(|i| PatternPath::agent_rose(i, config.home, &config.patterns))
            .collect();
        let outputs = agents.iter().map(Agent::output).collect();

        Ok(Self {
            home_flock: PatternPath::home_flock(config.home, &config.patterns),
            focal_target: config.home,
            rng: create_rng(config.seed),
            agents,
            roses,
            rest_targets,
            focal_index: None,
            home_index: None,
            snapshot_buffer: Vec::with_capacity(n),
            neighbor_buffers: vec![Vec::new(); n],
            outputs,
            state: WorldState::Spawn,
            tick_index: 0,
            last_timings: TickTimings::default(),
            counters: SessionCounters::default(),
            config,
        })
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, index: usize) -> Option<&Agent> {
        self.agents.get(index)
    }

    pub fn state(&self) -> WorldState {
        self.state
    }

    pub fn focal_target(&self) -> Vec3 {
        self.focal_target
    }

    /// Current point on the shared home ellipse.
    pub fn home_flock_target(&self) -> Vec3 {
        self.home_flock.current()
    }

    pub fn rest_target(&self, index: usize) -> Option<Vec3> {
        self.rest_targets.get(index).copied()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_index
    }

    pub fn last_timings(&self) -> TickTimings {
        self.last_timings
    }

    /// Outputs of the most recent tick (initial pose before the first one).
    pub fn outputs(&self) -> &[AgentOutput] {
        &self.outputs
    }

    pub fn awake_count(&self) -> usize {
        self.agents.iter().filter(|a| a.is_awake()).count()
    }

    /// Agents stored in the focal index built by the last tick.
    pub fn focal_index_len(&self) -> usize {
        self.focal_index.as_ref().map_or(0, Octree::len)
    }

    /// Agents stored in the home index built by the last tick; zero outside
    /// `FlockHome`.
    pub fn home_index_len(&self) -> usize {
        self.home_index.as_ref().map_or(0, Octree::len)
    }

    /// Admit the next dormant agent at `origin`.
    pub fn spawn_next(&mut self, origin: Vec3) -> Option<usize> {
        let agent = self.agents.iter_mut().find(|a| !a.is_awake())?;
        agent.spawn(origin);
        let index = agent.index();
        self.counters.spawned += 1;
        info!(agent = index, ?origin, "agent spawned");
        Some(index)
    }

    pub fn advance_world_state(&mut self) -> WorldState {
        let from = self.state;
        self.state = from.next();
        self.counters.transitions += 1;
        info!(?from, to = ?self.state, tick = self.tick_index, "world state advanced");
        self.state
    }

    pub fn handle_long_press(&mut self) -> WorldState {
        self.advance_world_state()
    }

    /// Excite every active agent hit by `tap`.
    pub fn handle_tap(&mut self, tap: Tap) -> TapReport {
        let mut hits = match tap {
            Tap::Focal => self.agents_near(self.focal_target, self.config.tap_radius),
            Tap::At(location) => self.agents_near(location, self.config.tap_radius),
            Tap::Agent(index) => match self.agents.get(index) {
                Some(agent) if agent.is_active() => vec![index],
                _ => Vec::new(),
            },
        };
        hits.sort_unstable();

        let mut report = TapReport {
            hits,
            ..TapReport::default()
        };
        for &index in &report.hits {
            match self.agents[index].apply_excitation() {
                Excitation::Ignored => {}
                Excitation::Excited { remaining } => {
                    trace!(agent = index, remaining, "agent excited");
                    report.excited.push(index);
                }
                Excitation::Died => {
                    debug!(agent = index, "agent died");
                    report.died.push(index);
                }
            }
        }
        self.counters.taps += 1;
        self.counters.excitations += (report.excited.len() + report.died.len()) as u64;
        self.counters.deaths += report.died.len() as u64;
        debug!(?tap, hits = report.hits.len(), excited = report.excited.len(), died = report.died.len(), "tap handled");
        report
    }

    /// Active agents within `radius` of `center`, found through a fresh index
    /// bounded by the tap area.
    fn agents_near(&self, center: Vec3, radius: f32) -> Vec<usize> {
        let mut index = match Octree::build(center, radius, self.config.max_points_per_node) {
            Ok(index) => index,
            Err(err) => {
                debug!(%err, "tap index rejected");
                return Vec::new();
            }
        };
        insert_active(&mut index, &self.agents);
        index.query(center, radius).into_iter().map(|(_, i)| *i).collect()
    }

    /// Run one simulation tick with the latest external target.
    ///
    /// A non-finite target is dropped and the previous one is kept.
    pub fn tick(&mut self, focal_target: Vec3) -> &[AgentOutput] {
        let total_start = Instant::now();
        self.tick_index += 1;
        if focal_target.is_finite() {
            self.focal_target = focal_target;
        } else {
            debug!(?focal_target, tick = self.tick_index, "non-finite focal target ignored");
        }

        let t0 = Instant::now();
        self.step_index_phase();
        let index_build_us = t0.elapsed().as_micros() as u64;

        let t1 = Instant::now();
        self.step_target_phase();
        let target_resolve_us = t1.elapsed().as_micros() as u64;

        let t2 = Instant::now();
        self.step_steering_phase();
        let agent_update_us = t2.elapsed().as_micros() as u64;

        self.outputs.clear();
        self.outputs.extend(self.agents.iter().map(Agent::output));

        self.last_timings = TickTimings {
            index_build_us,
            target_resolve_us,
            agent_update_us,
            total_us: total_start.elapsed().as_micros() as u64,
        };
        &self.outputs
    }

    pub fn summary(&self) -> SessionSummary {
        let mut phases = PhaseCounts::default();
        for agent in &self.agents {
            phases.record(agent.phase());
        }
        let awake: Vec<&Agent> = self.agents.iter().filter(|a| a.is_awake()).collect();
        let mean_speed = if awake.is_empty() {
            0.0
        } else {
            awake.iter().map(|a| a.velocity().length()).sum::<f32>() / awake.len() as f32
        };
        let active: Vec<Vec3> = self
            .agents
            .iter()
            .filter(|a| a.is_active())
            .map(Agent::position)
            .collect();
        let mut spacing_sum = 0.0;
        let mut pairs = 0usize;
        for (i, a) in active.iter().enumerate() {
            for b in &active[i + 1..] {
                spacing_sum += a.distance(*b);
                pairs += 1;
            }
        }
        SessionSummary {
            ticks: self.tick_index,
            world_state: self.state,
            state_transitions: self.counters.transitions,
            spawned: self.counters.spawned,
            taps: self.counters.taps,
            excitations: self.counters.excitations,
            deaths: self.counters.deaths,
            phases,
            mean_speed,
            mean_spacing: if pairs == 0 {
                0.0
            } else {
                spacing_sum / pairs as f32
            },
            agents: self.agents.iter().map(Agent::output).collect(),
        }
    }
}

/// Insert every active agent; agents outside the index bounds are skipped.
fn insert_active(index: &mut Octree<usize>, agents: &[Agent]) {
    for agent in agents.iter().filter(|a| a.is_active()) {
        if let Err(SpatialError::OutOfBounds { point }) = index.insert(agent.position(), agent.index()) {
            trace!(agent = agent.index(), ?point, "agent outside index bounds");
        }
    }
}

mod phases;
