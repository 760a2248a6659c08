use thiserror::Error;

/// Failures which stop a calibration run before any row is computed
///
/// Per-row conditions (no bracketing standard, a degenerate regression, a tolerance violation)
/// are never reported here. They surface as omitted rows or undefined fields in the output.
#[derive(Error, Debug)]
pub enum Error {
    #[error("no reference observations present, nothing can be calibrated")]
    NoReferenceData,

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("separator must be a single byte, got {0:?}")]
    InvalidSeparator(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("failed to parse configuration: {0}")]
    Config(#[from] toml::de::Error),
}
