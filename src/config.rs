use std::fs;
use std::path::Path;

use num_traits::Float;
use serde::{de::DeserializeOwned, Deserialize};

use crate::Result;

/// Convert an `f64` literal into the working float type
///
/// # Panics
///
/// Panics if `value` cannot be represented in `E`. Every literal passed here is a small integer,
/// so this cannot happen for `f32` or `f64`.
pub(crate) fn literal<E: Float>(value: f64) -> E {
    E::from(value).expect("literal must fit in the float type")
}

/// Options for a calibration run
///
/// Both tolerances are unbounded when absent. The sentinels identify which flag values mark
/// atmospheric samples and flush periods, every other flag value is the known concentration of a
/// standard.
///
/// ```toml
/// er_tol = 2.5
/// dt_tol = 7200.0
/// atmosphere = -10.0
/// flush = -99.0
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[serde(bound(deserialize = "E: Float + Deserialize<'de>"))]
pub struct Config<E> {
    /// Largest allowed deviation, in percent, of a standard corrected by the row's own fit from
    /// its known value
    pub er_tol: Option<E>,
    /// Largest allowed elapsed time since the most recent real reference measurement
    pub dt_tol: Option<E>,
    /// Flag marking atmospheric samples
    pub atmosphere: E,
    /// Flag marking flush periods
    pub flush: E,
}

impl<E: Float> Default for Config<E> {
    fn default() -> Self {
        Self {
            er_tol: None,
            dt_tol: None,
            atmosphere: literal(-10.),
            flush: literal(-99.),
        }
    }
}

impl<E: Float> Config<E> {
    #[must_use]
    pub fn with_er_tol(mut self, er_tol: E) -> Self {
        self.er_tol = Some(er_tol);
        self
    }

    #[must_use]
    pub fn with_dt_tol(mut self, dt_tol: E) -> Self {
        self.dt_tol = Some(dt_tol);
        self
    }
}

impl<E: Float + DeserializeOwned> Config<E> {
    /// Read a configuration from a TOML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, or if it contains unknown keys or values of
    /// the wrong type.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse a configuration from TOML text
    ///
    /// # Errors
    /// Returns an error if `contents` is not valid TOML for a [`Config`].
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}
