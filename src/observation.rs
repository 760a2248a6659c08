use num_traits::Float;

use crate::config::Config;
use crate::error::Error;
use crate::Result;

/// A single reading from the instrument
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Observation<E> {
    pub time: E,
    /// The measured value, `None` where the instrument reported nothing usable
    pub raw: Option<E>,
    /// What was being sampled, see [`Source`]
    pub flag: E,
}

/// What the instrument was sampling, decoded from a flag
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Source<E> {
    /// An atmospheric sample of unknown concentration
    Atmosphere,
    /// A purge period, excluded from everything
    Flush,
    /// A reference gas with the given known concentration
    Standard(E),
}

impl<E: Float> Source<E> {
    pub fn classify(flag: E, config: &Config<E>) -> Self {
        if flag == config.atmosphere {
            Self::Atmosphere
        } else if flag == config.flush {
            Self::Flush
        } else {
            Self::Standard(flag)
        }
    }

    pub const fn is_atmosphere(&self) -> bool {
        matches!(self, Self::Atmosphere)
    }
}

/// Three aligned vectors of equal length with non-decreasing time
///
/// A `Series` can only be built through [`Series::new`], so the engine never sees input which
/// breaks the contract.
#[derive(Clone, Debug)]
pub struct Series<E> {
    time: Vec<E>,
    raw: Vec<Option<E>>,
    flag: Vec<E>,
}

impl<E: Float> Series<E> {
    /// Validate and wrap the input vectors
    ///
    /// # Errors
    /// Returns [`Error::MalformedInput`] if the vectors differ in length, if any time or flag is
    /// NaN, or if time ever decreases.
    pub fn new(time: Vec<E>, raw: Vec<Option<E>>, flag: Vec<E>) -> Result<Self> {
        if time.len() != raw.len() || time.len() != flag.len() {
            return Err(Error::MalformedInput(format!(
                "vectors differ in length: time {}, raw {}, flag {}",
                time.len(),
                raw.len(),
                flag.len()
            )));
        }
        if let Some(idx) = time.iter().position(|t| t.is_nan()) {
            return Err(Error::MalformedInput(format!("time at row {idx} is NaN")));
        }
        if let Some(idx) = flag.iter().position(|f| f.is_nan()) {
            return Err(Error::MalformedInput(format!("flag at row {idx} is NaN")));
        }
        if let Some(idx) = time.windows(2).position(|pair| pair[1] < pair[0]) {
            return Err(Error::MalformedInput(format!(
                "time decreases between rows {idx} and {}",
                idx + 1
            )));
        }

        Ok(Self { time, raw, flag })
    }

    /// Build a series from a sequence of observations
    ///
    /// # Errors
    /// Returns [`Error::MalformedInput`] under the same conditions as [`Series::new`].
    pub fn from_observations(observations: &[Observation<E>]) -> Result<Self> {
        Self::new(
            observations.iter().map(|o| o.time).collect(),
            observations.iter().map(|o| o.raw).collect(),
            observations.iter().map(|o| o.flag).collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn time(&self) -> &[E] {
        &self.time
    }

    pub fn raw(&self) -> &[Option<E>] {
        &self.raw
    }

    pub fn flag(&self) -> &[E] {
        &self.flag
    }

    pub fn get(&self, idx: usize) -> Option<Observation<E>> {
        Some(Observation {
            time: *self.time.get(idx)?,
            raw: *self.raw.get(idx)?,
            flag: *self.flag.get(idx)?,
        })
    }

    pub fn sources(&self, config: &Config<E>) -> Vec<Source<E>> {
        self.flag
            .iter()
            .map(|&flag| Source::classify(flag, config))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Observation, Series, Source};
    use crate::{Config, Error};

    #[test]
    fn flags_are_classified_against_the_configured_sentinels() {
        let config = Config::default();
        assert_eq!(Source::classify(-10., &config), Source::Atmosphere);
        assert_eq!(Source::classify(-99., &config), Source::Flush);
        assert_eq!(Source::classify(410.5, &config), Source::Standard(410.5));

        let config = Config {
            atmosphere: 0.,
            ..Config::default()
        };
        assert_eq!(Source::classify(-10., &config), Source::Standard(-10.));
        assert_eq!(Source::classify(0., &config), Source::Atmosphere);
    }

    #[test]
    fn vectors_of_unequal_length_are_rejected() {
        let series = Series::new(vec![0., 1.], vec![Some(1.)], vec![-10., -10.]);
        assert!(matches!(series, Err(Error::MalformedInput(_))));
    }

    #[test]
    fn decreasing_time_is_rejected() {
        let series = Series::new(
            vec![0., 2., 1.],
            vec![Some(1.); 3],
            vec![-10., -10., -10.],
        );
        assert!(matches!(series, Err(Error::MalformedInput(_))));
    }

    #[test]
    fn nan_time_and_flag_are_rejected() {
        let series = Series::new(vec![0., f64::NAN], vec![None; 2], vec![-10., -10.]);
        assert!(matches!(series, Err(Error::MalformedInput(_))));

        let series = Series::new(vec![0., 1.], vec![None; 2], vec![-10., f64::NAN]);
        assert!(matches!(series, Err(Error::MalformedInput(_))));
    }

    #[test]
    fn repeated_timestamps_are_accepted() -> crate::Result<()> {
        let observations = [
            Observation {
                time: 0.,
                raw: Some(1.),
                flag: -10.,
            },
            Observation {
                time: 0.,
                raw: None,
                flag: 400.,
            },
        ];
        let series = Series::from_observations(&observations)?;
        assert_eq!(series.len(), 2);
        assert_eq!(series.get(1), Some(observations[1]));
        assert_eq!(series.get(2), None);
        Ok(())
    }
}
