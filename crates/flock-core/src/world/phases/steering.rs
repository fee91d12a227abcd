use super::super::{World, WorldState};
use crate::agent::Agent;

impl World {
    /// Gather each agent's neighbors from a pre-move snapshot, then update
    /// every agent. No agent observes another's position from this tick.
    pub(in crate::world) fn step_steering_phase(&mut self) {
        let snapshot = &mut self.snapshot_buffer;
        snapshot.clear();
        snapshot.extend(self.agents.iter().map(Agent::as_neighbor));

        let index = match self.state {
            WorldState::FlockExternal => self.focal_index.as_ref(),
            WorldState::FlockHome => self.home_index.as_ref(),
            _ => None,
        };
        let radius = self.config.neighbor_radius;

        for (i, (agent, neighbors)) in self
            .agents
            .iter_mut()
            .zip(self.neighbor_buffers.iter_mut())
            .enumerate()
        {
            neighbors.clear();
            if !agent.is_awake() {
                continue;
            }
            if let (Some(index), true) = (index, agent.is_active()) {
                index.for_each_within(snapshot[i].position, radius, |_, &j| {
                    if j != i {
                        neighbors.push(snapshot[j]);
                    }
                });
            }
            agent.update(neighbors);
        }
    }
}
