use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use model::{
    flatten_trajectories, read_points, write_trips, FlattenConfig, InputConfig, OutputFields,
    TimeFormat,
};

/// Convert between GPS point logs and trajectory logs.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Group a point log by entity id, sort each entity's points
    /// chronologically, and split them into trips on time or distance gaps
    ToTrips(ToTrips),
    /// Flatten a trajectory log's geometries back into one row per point
    ToPoints(ToPoints),
}

#[derive(clap::Args)]
struct ToTrips {
    /// Input GPS point log
    #[arg(short, long)]
    input: PathBuf,
    /// Output trajectory file
    #[arg(short, long)]
    output: PathBuf,
    /// Field delimiter of the input
    #[arg(short, long, default_value_t = ',')]
    delim: char,
    /// Id column name, or index with --no-header
    #[arg(long, default_value = "id")]
    id: String,
    /// X column name, or index with --no-header
    #[arg(short, long, default_value = "x")]
    x: String,
    /// Y column name, or index with --no-header
    #[arg(short, long, default_value = "y")]
    y: String,
    /// Timestamp column name, or index with --no-header
    #[arg(short, long, default_value = "timestamp")]
    time: String,
    /// Time format: 0 for a plain number, 1 for a calendar string like
    /// 2020-01-01T00:00:27
    #[arg(short = 'f', long = "tf", default_value_t = 0)]
    time_format: u8,
    /// Split a trajectory when adjacent points are further apart in time
    #[arg(long, default_value_t = f64::INFINITY)]
    time_gap: f64,
    /// Split a trajectory when adjacent points are further apart in space
    #[arg(long, default_value_t = f64::INFINITY)]
    dist_gap: f64,
    /// The input has no header row; column names are numeric indices
    #[arg(long)]
    no_header: bool,
    /// Extra output fields (ts, tend, timestamp), comma-separated
    #[arg(long, default_value = "")]
    ofields: String,
}

#[derive(clap::Args)]
struct ToPoints {
    /// Input trajectory file
    #[arg(short, long)]
    input: PathBuf,
    /// Output point file
    #[arg(short, long)]
    output: PathBuf,
    /// Field delimiter of the input
    #[arg(short, long, default_value_t = ';')]
    delim: char,
    /// Id column name, or index with --no-header
    #[arg(long, default_value = "id")]
    id: String,
    /// Geometry column name, or index with --no-header
    #[arg(short, long, default_value = "geom")]
    geom: String,
    /// The input has no header row; column names are numeric indices
    #[arg(long)]
    no_header: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    match args.command {
        Command::ToTrips(cmd) => to_trips(cmd),
        Command::ToPoints(cmd) => to_points(cmd),
    }
}

fn to_trips(cmd: ToTrips) -> Result<()> {
    let config = InputConfig {
        id: cmd.id,
        x: cmd.x,
        y: cmd.y,
        timestamp: cmd.time,
        delimiter: delim_byte(cmd.delim)?,
        header: !cmd.no_header,
        time_format: TimeFormat::from_tag(cmd.time_format)?,
    };
    let fields = OutputFields::parse(&cmd.ofields);
    info!(
        "Converting {} -> {}: columns id={}, x={}, y={}, time={}, delim={:?}, header={}, \
         time_gap={}, dist_gap={}, ofields={:?}",
        cmd.input.display(),
        cmd.output.display(),
        config.id,
        config.x,
        config.y,
        config.timestamp,
        cmd.delim,
        config.header,
        cmd.time_gap,
        cmd.dist_gap,
        cmd.ofields
    );

    info!("Reading GPS data");
    let mut store = read_points(open_input(&cmd.input)?, &config)?;

    info!("Sorting points by time");
    store.sort_all();

    info!("Writing trajectory data");
    let out = BufWriter::new(create_output(&cmd.output)?);
    let stats = write_trips(out, &store, cmd.time_gap, cmd.dist_gap, fields)?;

    println!("Distinct ids: {}", stats.distinct_ids);
    println!("Number of trips: {}", stats.trips);
    println!("Number of points: {}", stats.points);
    Ok(())
}

fn to_points(cmd: ToPoints) -> Result<()> {
    let config = FlattenConfig {
        id: cmd.id,
        geom: cmd.geom,
        delimiter: delim_byte(cmd.delim)?,
        header: !cmd.no_header,
    };
    info!(
        "Flattening {} -> {}: columns id={}, geom={}, delim={:?}, header={}",
        cmd.input.display(),
        cmd.output.display(),
        config.id,
        config.geom,
        cmd.delim,
        config.header
    );

    // Validate the input before touching the output, so a bad input path
    // can't truncate an existing file
    let input = open_input(&cmd.input)?;
    let out = BufWriter::new(create_output(&cmd.output)?);
    flatten_trajectories(input, out, &config)?;
    Ok(())
}

fn open_input(path: &Path) -> Result<File> {
    if !path.exists() {
        bail!("input file not found: {}", path.display());
    }
    File::open(path).with_context(|| format!("couldn't open {}", path.display()))
}

fn create_output(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("couldn't create {}", path.display()))
}

fn delim_byte(delim: char) -> Result<u8> {
    if delim.is_ascii() {
        Ok(delim as u8)
    } else {
        bail!("delimiter must be a single ASCII character: {:?}", delim)
    }
}
