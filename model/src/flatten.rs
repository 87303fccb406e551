use std::io::{Read, Write};

use anyhow::{Context, Result};
use csv::{QuoteStyle, ReaderBuilder, StringRecord, WriterBuilder};
use log::info;

/// Column configuration for the reverse direction: a trajectory log with an
/// id column and a `LineString(...)` geometry column. Same name-or-index
/// resolution rules as the point-log reader.
#[derive(Clone, Debug)]
pub struct FlattenConfig {
    pub id: String,
    pub geom: String,
    pub delimiter: u8,
    pub header: bool,
}

/// Flattens each trajectory record into one output row per point:
/// `id;point_idx;x;y`, with `point_idx` zero-based in geometry order.
pub fn flatten_trajectories<R: Read, W: Write>(
    reader: R,
    writer: W,
    config: &FlattenConfig,
) -> Result<()> {
    let mut reader = ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(config.header)
        .quoting(false)
        .flexible(true)
        .from_reader(reader);

    let (id_idx, geom_idx) = if config.header {
        resolve_header(config, reader.headers()?)?
    } else {
        resolve_indices(config)?
    };
    info!("Resolved columns: id {}, geom {}", id_idx, geom_idx);

    let mut out = WriterBuilder::new()
        .delimiter(b';')
        .quote_style(QuoteStyle::Never)
        .from_writer(writer);
    out.write_record(["id", "point_idx", "x", "y"])?;

    for (row_idx, rec) in reader.records().enumerate() {
        if row_idx % 1_000_000 == 0 {
            info!("Lines read {}", row_idx);
        }
        let rec = rec.with_context(|| format!("error reading row {}", row_idx))?;
        let (id, geom) = match (rec.get(id_idx), rec.get(geom_idx)) {
            (Some(id), Some(geom)) => (id, geom),
            _ => bail!("error parsing row {}: {:?}", row_idx, rec),
        };
        let points = parse_linestring(geom)?;
        for (point_idx, (x, y)) in points.into_iter().enumerate() {
            out.write_record([
                id,
                point_idx.to_string().as_str(),
                x.to_string().as_str(),
                y.to_string().as_str(),
            ])?;
        }
    }
    out.flush()?;
    Ok(())
}

fn resolve_indices(config: &FlattenConfig) -> Result<(usize, usize)> {
    let parse = |field: &str, name: &str| {
        name.parse::<usize>().map_err(|_| {
            anyhow!(
                "{} column {:?} isn't a numeric index, but the input has no header",
                field,
                name
            )
        })
    };
    Ok((parse("id", &config.id)?, parse("geom", &config.geom)?))
}

fn resolve_header(config: &FlattenConfig, header: &StringRecord) -> Result<(usize, usize)> {
    let find = |field: &str, name: &str| {
        header
            .iter()
            .position(|col| col == name)
            .ok_or_else(|| anyhow!("{} column {:?} not found in header", field, name))
    };
    Ok((find("id", &config.id)?, find("geom", &config.geom)?))
}

/// Parses a `LineString(x1 y1,x2 y2,...)` literal into coordinate pairs. The
/// keyword is matched case-insensitively; coordinate tokens must pair up.
pub fn parse_linestring(text: &str) -> Result<Vec<(f64, f64)>> {
    let mut tokens = text
        .split(&['(', ')', ' ', ','][..])
        .filter(|t| !t.is_empty());
    match tokens.next() {
        Some(keyword) if keyword.eq_ignore_ascii_case("linestring") => {}
        _ => bail!("geom field should start with LineString: {:?}", text),
    }
    let parse = |token: &str| {
        token
            .parse::<f64>()
            .map_err(|_| anyhow!("bad coordinate {:?} in geom {:?}", token, text))
    };
    let mut points = Vec::new();
    while let Some(x) = tokens.next() {
        let y = match tokens.next() {
            Some(y) => y,
            None => bail!("geom field has an odd number of coordinates: {:?}", text),
        };
        points.push((parse(x)?, parse(y)?));
    }
    Ok(points)
}
