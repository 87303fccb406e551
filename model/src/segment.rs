use crate::Trajectory;

/// Splits a chronologically sorted trajectory into trips: maximal runs of
/// consecutive points where every adjacent pair stays within both the time
/// gap and the distance gap. Returns inclusive `(start, end)` index ranges
/// into `traj.points`; runs of a single point are dropped.
pub fn segment(traj: &Trajectory, time_gap: f64, dist_gap: f64) -> Vec<(usize, usize)> {
    let points = &traj.points;
    let n = points.len();
    let mut trips = Vec::new();
    let mut start = 0;
    for i in 0..n.saturating_sub(1) {
        let time_diff = points[i + 1].timestamp - points[i].timestamp;
        let distance = points[i].dist_to(points[i + 1]);
        if time_diff > time_gap || distance > dist_gap {
            // A dangling single point isn't a trip, but it still closes the
            // current window
            if i > start {
                trips.push((start, i));
            }
            start = i + 1;
        }
    }
    if n > 0 && n - 1 > start {
        trips.push((start, n - 1));
    }
    trips
}
