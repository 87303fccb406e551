#[macro_use]
extern crate anyhow;

mod flatten;
mod gps;
mod segment;
mod store;
mod time;
mod trajectory;
mod write;

pub use self::flatten::{flatten_trajectories, parse_linestring, FlattenConfig};
pub use self::gps::{read_points, InputColumns, InputConfig};
pub use self::segment::segment;
pub use self::store::TrajectoryStore;
pub use self::time::{decode_timestamp, TimeFormat};
pub use self::trajectory::{Point, Trajectory};
pub use self::write::{write_trips, OutputFields, RunStats};
