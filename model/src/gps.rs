use std::io::Read;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use log::info;

use crate::time::{decode_timestamp, TimeFormat};
use crate::{Point, TrajectoryStore};

/// Where to find each logical field in the input. In header mode the four
/// names are matched exactly against the header row; without a header they
/// must themselves be numeric column indices.
#[derive(Clone, Debug)]
pub struct InputConfig {
    pub id: String,
    pub x: String,
    pub y: String,
    pub timestamp: String,
    pub delimiter: u8,
    pub header: bool,
    pub time_format: TimeFormat,
}

/// Column positions after resolution, fixed for the whole run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputColumns {
    pub id: usize,
    pub x: usize,
    pub y: usize,
    pub timestamp: usize,
}

impl InputColumns {
    /// Headerless mode: each configured name is parsed as a column index.
    pub fn from_indices(config: &InputConfig) -> Result<Self> {
        Ok(Self {
            id: parse_index("id", &config.id)?,
            x: parse_index("x", &config.x)?,
            y: parse_index("y", &config.y)?,
            timestamp: parse_index("timestamp", &config.timestamp)?,
        })
    }

    /// Header mode: scan the header row for an exact match of each name.
    pub fn from_header(config: &InputConfig, header: &StringRecord) -> Result<Self> {
        Ok(Self {
            id: find_column("id", &config.id, header)?,
            x: find_column("x", &config.x, header)?,
            y: find_column("y", &config.y, header)?,
            timestamp: find_column("timestamp", &config.timestamp, header)?,
        })
    }
}

fn parse_index(field: &str, name: &str) -> Result<usize> {
    name.parse::<usize>().map_err(|_| {
        anyhow!(
            "{} column {:?} isn't a numeric index, but the input has no header",
            field,
            name
        )
    })
}

fn find_column(field: &str, name: &str, header: &StringRecord) -> Result<usize> {
    header
        .iter()
        .position(|col| col == name)
        .ok_or_else(|| anyhow!("{} column {:?} not found in header", field, name))
}

/// Streams a point log into a store, grouping rows by entity id. The first
/// malformed row fails the whole run; nothing is skipped.
pub fn read_points<R: Read>(reader: R, config: &InputConfig) -> Result<TrajectoryStore> {
    let mut reader = ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(config.header)
        // The format has no quoting or escaping; a delimiter inside a value
        // is indistinguishable from a separator
        .quoting(false)
        // Short rows must reach our own bounds check so the error names the row
        .flexible(true)
        .from_reader(reader);

    let columns = if config.header {
        InputColumns::from_header(config, reader.headers()?)?
    } else {
        InputColumns::from_indices(config)?
    };
    info!(
        "Resolved columns: id {}, x {}, y {}, timestamp {}",
        columns.id, columns.x, columns.y, columns.timestamp
    );

    let mut store = TrajectoryStore::new();
    let mut rows = 0usize;
    for (row_idx, rec) in reader.records().enumerate() {
        if row_idx % 1_000_000 == 0 {
            info!("Lines read {}", row_idx);
        }
        let rec = rec.with_context(|| format!("error reading row {}", row_idx))?;
        let (id, point) = parse_row(row_idx, &rec, columns, config.time_format)?;
        store.append(id, point);
        rows = row_idx + 1;
    }
    info!("Read {} rows over {} distinct ids", rows, store.len());
    Ok(store)
}

fn parse_row(
    row_idx: usize,
    rec: &StringRecord,
    columns: InputColumns,
    format: TimeFormat,
) -> Result<(String, Point)> {
    match try_parse_row(rec, columns, format) {
        Some(parsed) => Ok(parsed),
        None => bail!("error parsing row {}: {:?}", row_idx, rec),
    }
}

fn try_parse_row(
    rec: &StringRecord,
    columns: InputColumns,
    format: TimeFormat,
) -> Option<(String, Point)> {
    let id = rec.get(columns.id)?.to_string();
    let x = rec.get(columns.x)?.parse::<f64>().ok()?;
    let y = rec.get(columns.y)?.parse::<f64>().ok()?;
    let timestamp = decode_timestamp(rec.get(columns.timestamp)?, format).ok()?;
    Some((id, Point { x, y, timestamp }))
}
