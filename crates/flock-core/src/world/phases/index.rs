use super::super::{insert_active, World, WorldState};
use crate::spatial::Octree;
use tracing::debug;

impl World {
    /// Rebuild the focal index around the external target, and the home index
    /// around the advancing flock ellipse while flocking at home.
    pub(in crate::world) fn step_index_phase(&mut self) {
        let half_extent = self.config.spatial_half_extent;
        let capacity = self.config.max_points_per_node;

        self.focal_index = match Octree::build(self.focal_target, half_extent, capacity) {
            Ok(mut index) => {
                insert_active(&mut index, &self.agents);
                Some(index)
            }
            Err(err) => {
                debug!(%err, "focal index rejected");
                None
            }
        };

        self.home_index = if self.state == WorldState::FlockHome {
            self.home_flock.advance();
            match Octree::build(self.home_flock.current(), half_extent, capacity) {
                Ok(mut index) => {
                    insert_active(&mut index, &self.agents);
                    Some(index)
                }
                Err(err) => {
                    debug!(%err, "home index rejected");
                    None
                }
            }
        } else {
            None
        };
    }
}
