//! Delimited text in and out of the engine
//!
//! Neither direction does any calibration. Reading expects an already aligned `time,raw,flag`
//! file, writing serialises [`CalibratedObservation`]s.

use std::fmt::Display;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use log::debug;
use num_traits::Float;
use serde::{de::DeserializeOwned, Deserialize};

use crate::calibration::CalibratedObservation;
use crate::error::Error;
use crate::observation::Series;
use crate::Result;

const COLUMNS: [&str; 7] = ["time", "cal", "raw", "m", "b", "n", "r_sq"];

#[derive(Deserialize)]
struct Row<E> {
    time: E,
    #[serde(deserialize_with = "csv::invalid_option")]
    raw: Option<E>,
    flag: E,
}

/// Read a headed `time,raw,flag` file into a [`Series`]
///
/// Empty or unparseable `raw` fields are read as missing readings.
///
/// # Errors
/// Returns an error if the file cannot be read, if a `time` or `flag` field cannot be parsed, or
/// if the resulting vectors break the [`Series`] contract.
pub fn read_series<E: Float + DeserializeOwned>(path: &Path) -> Result<Series<E>> {
    let file = fs::read(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(&file[..]);

    let mut time = vec![];
    let mut raw = vec![];
    let mut flag = vec![];

    for result in rdr.deserialize() {
        let record: Row<E> = result?;
        time.push(record.time);
        raw.push(record.raw);
        flag.push(record.flag);
    }
    debug!("read {} rows from {path:?}", time.len());

    Series::new(time, raw, flag)
}

/// Formatting of the delimited output
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteOptions {
    /// Field separator, a single byte
    pub separator: String,
    /// Whether to write a header line
    pub header: bool,
    /// Written in place of undefined values
    pub missing: String,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            separator: ",".to_owned(),
            header: true,
            missing: String::new(),
        }
    }
}

/// Write `rows` to the file at `destination`, or to standard output if `destination` is empty
///
/// # Errors
/// Returns an error if the separator is not a single byte, or if writing fails.
pub fn write_calibrated<E: Float + Display>(
    rows: &[CalibratedObservation<E>],
    destination: &str,
    options: &WriteOptions,
) -> Result<()> {
    if destination.is_empty() {
        write_calibrated_to(rows, std::io::stdout().lock(), options)
    } else {
        debug!("writing {} rows to {destination}", rows.len());
        write_calibrated_to(rows, File::create(destination)?, options)
    }
}

/// Write `rows` to any sink
///
/// # Errors
/// Returns an error if the separator is not a single byte, or if writing fails.
pub fn write_calibrated_to<E: Float + Display, W: Write>(
    rows: &[CalibratedObservation<E>],
    sink: W,
    options: &WriteOptions,
) -> Result<()> {
    let delimiter = match options.separator.as_bytes() {
        [byte] => *byte,
        _ => return Err(Error::InvalidSeparator(options.separator.clone())),
    };

    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(sink);

    if options.header {
        wtr.write_record(COLUMNS)?;
    }

    let field = |value: Option<E>| {
        value.map_or_else(|| options.missing.clone(), |value| value.to_string())
    };
    for row in rows {
        wtr.write_record([
            row.time.to_string(),
            field(row.cal),
            field(row.raw),
            field(row.m),
            field(row.b),
            row.n.to_string(),
            field(row.r_sq),
        ])?;
    }
    wtr.flush()?;

    Ok(())
}
