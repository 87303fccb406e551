use serde::{Deserialize, Serialize};

/// One GPS observation. Coordinates are planar, in whatever units the input
/// uses. The timestamp is an opaque numeric value; callers only rely on it
/// being comparable.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub timestamp: f64,
}

impl Point {
    /// Planar Euclidean distance, in the coordinates' native units.
    pub fn dist_to(self, other: Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

/// All observed points for one entity, in input order until sorted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Trajectory {
    pub id: String,
    pub points: Vec<Point>,
}

impl Trajectory {
    pub fn new(id: String, first: Point) -> Self {
        Self {
            id,
            points: vec![first],
        }
    }

    /// Orders points by time, ascending. The sort is stable, so points with
    /// equal timestamps keep their relative input order.
    pub fn sort_by_time(&mut self) {
        self.points
            .sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64, t: f64) -> Point {
        Point { x, y, timestamp: t }
    }

    #[test]
    fn sort_orders_by_timestamp() {
        let mut traj = Trajectory::new("a".to_string(), pt(2.0, 0.0, 20.0));
        traj.points.push(pt(0.0, 0.0, 5.0));
        traj.points.push(pt(1.0, 0.0, 10.0));
        traj.sort_by_time();
        let times: Vec<f64> = traj.points.iter().map(|p| p.timestamp).collect();
        assert_eq!(times, vec![5.0, 10.0, 20.0]);
    }

    #[test]
    fn sort_is_idempotent_and_stable_on_ties() {
        let mut traj = Trajectory::new("a".to_string(), pt(1.0, 0.0, 5.0));
        traj.points.push(pt(2.0, 0.0, 5.0));
        traj.points.push(pt(3.0, 0.0, 7.0));
        let before = traj.points.clone();
        traj.sort_by_time();
        assert_eq!(traj.points, before);
        traj.sort_by_time();
        assert_eq!(traj.points, before);
    }

    #[test]
    fn distance_is_planar_euclidean() {
        assert_eq!(pt(0.0, 0.0, 0.0).dist_to(pt(3.0, 4.0, 99.0)), 5.0);
    }
}
