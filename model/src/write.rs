use std::io::Write;

use anyhow::Result;
use csv::{QuoteStyle, WriterBuilder};
use log::info;

use crate::segment::segment;
use crate::{Point, Trajectory, TrajectoryStore};

/// Optional trailing columns in the trip output.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OutputFields {
    /// Start timestamp of each trip.
    pub ts: bool,
    /// End timestamp of each trip.
    pub tend: bool,
    /// Comma-joined timestamp per point, aligned with the geometry.
    pub timestamp: bool,
}

impl OutputFields {
    /// Parses a comma-separated field list like `ts,tend`. Unrecognized names
    /// are ignored.
    pub fn parse(list: &str) -> Self {
        let mut fields = Self::default();
        for name in list.split(',') {
            match name {
                "ts" => fields.ts = true,
                "tend" => fields.tend = true,
                "timestamp" => fields.timestamp = true,
                _ => {}
            }
        }
        fields
    }
}

/// Totals reported at the end of a run. `points` only counts points that
/// landed in an emitted trip; dropped singletons don't contribute.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunStats {
    pub distinct_ids: usize,
    pub trips: u64,
    pub points: u64,
}

/// Segments every trajectory in the store and writes one `;`-delimited record
/// per trip. Trip indices are 1-based and globally increasing across the
/// whole store, in first-appearance order of the entities.
pub fn write_trips<W: Write>(
    writer: W,
    store: &TrajectoryStore,
    time_gap: f64,
    dist_gap: f64,
    fields: OutputFields,
) -> Result<RunStats> {
    let mut out = WriterBuilder::new()
        .delimiter(b';')
        .quote_style(QuoteStyle::Never)
        .from_writer(writer);

    let mut header = vec!["index", "id", "geom"];
    if fields.ts {
        header.push("ts");
    }
    if fields.tend {
        header.push("tend");
    }
    if fields.timestamp {
        header.push("timestamp");
    }
    out.write_record(&header)?;

    let total = store.len();
    info!("Total distinct ids to write: {}", total);
    let step = (total / 10).max(1);

    let mut stats = RunStats {
        distinct_ids: total,
        trips: 0,
        points: 0,
    };
    for (idx, traj) in store.trajectories().iter().enumerate() {
        if idx % step == 0 {
            info!("Progress {} / {}", idx, total);
        }
        for (start, end) in segment(traj, time_gap, dist_gap) {
            stats.trips += 1;
            stats.points += (end - start + 1) as u64;
            write_trip(&mut out, stats.trips, traj, start, end, fields)?;
        }
    }
    out.flush()?;
    Ok(stats)
}

fn write_trip<W: Write>(
    out: &mut csv::Writer<W>,
    index: u64,
    traj: &Trajectory,
    start: usize,
    end: usize,
    fields: OutputFields,
) -> Result<()> {
    let pts = &traj.points[start..=end];
    let mut record = vec![index.to_string(), traj.id.clone(), linestring(pts)];
    if fields.ts {
        record.push(pts[0].timestamp.to_string());
    }
    if fields.tend {
        record.push(pts[pts.len() - 1].timestamp.to_string());
    }
    if fields.timestamp {
        record.push(
            pts.iter()
                .map(|p| p.timestamp.to_string())
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    out.write_record(&record)?;
    Ok(())
}

fn linestring(pts: &[Point]) -> String {
    let coords = pts
        .iter()
        .map(|p| format!("{} {}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(",");
    format!("LineString({})", coords)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(rows: Vec<(&str, f64, f64, f64)>) -> TrajectoryStore {
        let mut store = TrajectoryStore::new();
        for (id, x, y, t) in rows {
            store.append(id.to_string(), Point { x, y, timestamp: t });
        }
        store.sort_all();
        store
    }

    fn write_to_string(store: &TrajectoryStore, time_gap: f64, fields: OutputFields) -> (String, RunStats) {
        let mut buf = Vec::new();
        let stats = write_trips(&mut buf, store, time_gap, f64::INFINITY, fields).unwrap();
        (String::from_utf8(buf).unwrap(), stats)
    }

    #[test]
    fn one_trip_per_entity_by_default() {
        let store = store(vec![("A", 0.0, 0.0, 0.0), ("A", 1.0, 2.0, 10.0)]);
        let (output, stats) = write_to_string(&store, f64::INFINITY, OutputFields::default());
        assert_eq!(output, "index;id;geom\n1;A;LineString(0 0,1 2)\n");
        assert_eq!(
            stats,
            RunStats {
                distinct_ids: 1,
                trips: 1,
                points: 2
            }
        );
    }

    #[test]
    fn global_trip_index_spans_entities_in_first_seen_order() {
        let store = store(vec![
            ("A", 0.0, 0.0, 0.0),
            ("B", 5.0, 5.0, 0.0),
            ("A", 1.0, 0.0, 1.0),
            ("B", 6.0, 5.0, 1.0),
        ]);
        let (output, stats) = write_to_string(&store, f64::INFINITY, OutputFields::default());
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[1], "1;A;LineString(0 0,1 0)");
        assert_eq!(lines[2], "2;B;LineString(5 5,6 5)");
        assert_eq!(stats.trips, 2);
        assert_eq!(stats.points, 4);
    }

    #[test]
    fn optional_fields_extend_header_and_rows_in_order() {
        let store = store(vec![("A", 0.0, 0.0, 1.5), ("A", 1.0, 0.0, 2.5)]);
        let fields = OutputFields::parse("ts,tend,timestamp");
        let (output, _) = write_to_string(&store, f64::INFINITY, fields);
        assert_eq!(
            output,
            "index;id;geom;ts;tend;timestamp\n1;A;LineString(0 0,1 0);1.5;2.5;1.5,2.5\n"
        );
    }

    #[test]
    fn ofields_selection_is_independent() {
        let fields = OutputFields::parse("tend");
        assert!(!fields.ts);
        assert!(fields.tend);
        assert!(!fields.timestamp);
        // Unknown names are ignored
        assert_eq!(OutputFields::parse("bogus,"), OutputFields::default());
    }

    #[test]
    fn split_trips_and_dropped_singletons_in_stats() {
        // Scenario from the time-gap split: the third point is a dropped
        // singleton, not a trip
        let store = store(vec![
            ("1", 0.0, 0.0, 0.0),
            ("1", 1.0, 0.0, 10.0),
            ("1", 10.0, 0.0, 100.0),
        ]);
        let (output, stats) = write_to_string(&store, 50.0, OutputFields::default());
        assert_eq!(output, "index;id;geom\n1;1;LineString(0 0,1 0)\n");
        assert_eq!(stats.trips, 1);
        assert_eq!(stats.points, 2);
    }

    #[test]
    fn single_point_entity_writes_nothing_but_counts_as_id() {
        let store = store(vec![("A", 0.0, 0.0, 0.0)]);
        let (output, stats) = write_to_string(&store, f64::INFINITY, OutputFields::default());
        assert_eq!(output, "index;id;geom\n");
        assert_eq!(stats.distinct_ids, 1);
        assert_eq!(stats.trips, 0);
        assert_eq!(stats.points, 0);
    }

    #[test]
    fn coordinates_round_trip_through_display() {
        let store = store(vec![
            ("A", 17.123456789012345, -3.000000000001, 0.25),
            ("A", 18.5, 4.0, 1.25),
        ]);
        let (output, _) = write_to_string(&store, f64::INFINITY, OutputFields::default());
        let geom = output.lines().nth(1).unwrap().split(';').nth(2).unwrap();
        let pts = crate::parse_linestring(geom).unwrap();
        assert_eq!(pts[0], (17.123456789012345, -3.000000000001));
        assert_eq!(pts[1], (18.5, 4.0));
    }
}
