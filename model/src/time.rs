use anyhow::Result;
use chrono::NaiveDateTime;

/// How the timestamp column is encoded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimeFormat {
    /// A plain decimal number, used as-is.
    Numeric,
    /// A calendar string like `2020-01-01T00:00:27`, decoded as a UTC epoch.
    Calendar,
}

impl TimeFormat {
    /// The numeric selector exposed on the command line: 0 is numeric, 1 is
    /// calendar.
    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(TimeFormat::Numeric),
            1 => Ok(TimeFormat::Calendar),
            x => bail!("unknown time format {}; use 0 (number) or 1 (calendar)", x),
        }
    }
}

pub fn decode_timestamp(text: &str, format: TimeFormat) -> Result<f64> {
    match format {
        TimeFormat::Numeric => text
            .parse::<f64>()
            .map_err(|_| anyhow!("invalid numeric timestamp {:?}", text)),
        TimeFormat::Calendar => {
            let dt = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
                .map_err(|_| anyhow!("invalid calendar timestamp {:?}", text))?;
            Ok(dt.and_utc().timestamp() as f64)
        }
    }
}
