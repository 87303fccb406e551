use std::collections::HashMap;

use crate::{Point, Trajectory};

/// Groups points by entity id. Entities keep their first-appearance order,
/// which is also the iteration order downstream.
#[derive(Debug, Default)]
pub struct TrajectoryStore {
    slots: HashMap<String, usize>,
    trajectories: Vec<Trajectory>,
}

impl TrajectoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Amortized O(1). The first point for an id creates its trajectory, so
    /// every stored trajectory has at least one point.
    pub fn append(&mut self, id: String, point: Point) {
        match self.slots.get(&id) {
            Some(idx) => self.trajectories[*idx].points.push(point),
            None => {
                self.slots.insert(id.clone(), self.trajectories.len());
                self.trajectories.push(Trajectory::new(id, point));
            }
        }
    }

    /// Orders every trajectory's points chronologically. Segmentation assumes
    /// this has run over the whole store.
    pub fn sort_all(&mut self) {
        for traj in &mut self.trajectories {
            traj.sort_by_time();
        }
    }

    /// Number of distinct entity ids seen.
    pub fn len(&self) -> usize {
        self.trajectories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }

    /// Trajectories in first-appearance order.
    pub fn trajectories(&self) -> &[Trajectory] {
        &self.trajectories
    }
}
