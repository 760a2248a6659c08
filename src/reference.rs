use log::debug;
use ndarray::{Array2, ArrayView1, Zip};
use num_traits::Float;

use crate::config::Config;
use crate::error::Error;
use crate::observation::{Series, Source};
use crate::Result;

/// A reference gas seen in the input, identified by its known concentration
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Standard<E> {
    /// Column of this standard in the [`ReferenceMatrices`]
    pub column: usize,
    pub known: E,
}

impl<E: Float> Standard<E> {
    /// Collect the distinct standards in `series`, in order of first appearance
    pub fn collect(series: &Series<E>, config: &Config<E>) -> Vec<Self> {
        let mut standards: Vec<Self> = vec![];
        for source in series.sources(config) {
            if let Source::Standard(known) = source {
                if standards.iter().all(|standard| standard.known != known) {
                    standards.push(Self {
                        column: standards.len(),
                        known,
                    });
                }
            }
        }
        standards
    }
}

/// Reference values laid out as `[observation, standard]`
///
/// A cell is `None` wherever that standard was not being sampled at that row. After
/// [`ReferenceMatrices::interpolate`] atmospheric rows bracketed by real measurements of a
/// standard also carry a value for it.
#[derive(Clone, Debug)]
pub struct ReferenceMatrices<E> {
    standards: Vec<Standard<E>>,
    /// Segment averaged measured value of the standard, or its interpolation
    measured: Array2<Option<E>>,
    /// Known value of the standard, defined exactly where `measured` is
    known: Array2<Option<E>>,
    /// Time of the most recent real measurement preceding an interpolated cell
    anchor_time: Array2<Option<E>>,
}

impl<E: Float> ReferenceMatrices<E> {
    /// Place each segment mean into the column of the standard sampled at that row
    ///
    /// # Errors
    /// Returns [`Error::NoReferenceData`] if `standards` is empty, and
    /// [`Error::MalformedInput`] if `means` does not have one entry per row of `series`.
    pub fn build(
        series: &Series<E>,
        means: &[Option<E>],
        standards: Vec<Standard<E>>,
    ) -> Result<Self> {
        if standards.is_empty() {
            return Err(Error::NoReferenceData);
        }
        if means.len() != series.len() {
            return Err(Error::MalformedInput(format!(
                "{} segment means for {} rows",
                means.len(),
                series.len()
            )));
        }

        let shape = (series.len(), standards.len());
        let mut measured = Array2::from_elem(shape, None);
        let mut known = Array2::from_elem(shape, None);

        for (ii, (&flag, &mean)) in series.flag().iter().zip(means).enumerate() {
            if let Some(standard) = standards.iter().find(|standard| standard.known == flag) {
                measured[[ii, standard.column]] = mean;
                known[[ii, standard.column]] = Some(standard.known);
            }
        }

        Ok(Self {
            standards,
            measured,
            known,
            anchor_time: Array2::from_elem(shape, None),
        })
    }

    /// Fill atmospheric rows of every column by linear interpolation in time
    ///
    /// The anchors of a column are the rows holding a real measurement of that standard. Rows
    /// whose time lies outside the first and last anchor's time are left undefined; rows outside
    /// the anchors by index but sharing an end anchor's time take that anchor's value. Once every
    /// column is filled the known matrix is aligned with the measured one.
    ///
    /// # Errors
    /// Returns [`Error::MalformedInput`] if `time` or `sources` do not have one entry per row.
    pub fn interpolate(&mut self, time: &[E], sources: &[Source<E>]) -> Result<()> {
        let rows = self.measured.nrows();
        if time.len() != rows || sources.len() != rows {
            return Err(Error::MalformedInput(format!(
                "{} times and {} sources for {rows} reference rows",
                time.len(),
                sources.len()
            )));
        }

        let mut filled = 0usize;
        for column in 0..self.standards.len() {
            let anchors = self
                .measured
                .column(column)
                .indexed_iter()
                .filter_map(|(ii, value)| value.map(|value| (ii, value)))
                .collect::<Vec<_>>();
            let (Some(&(first, v_first)), Some(&(last, v_last))) =
                (anchors.first(), anchors.last())
            else {
                continue;
            };

            // (row, value, anchor time)
            let mut cells = vec![];
            for pair in anchors.windows(2) {
                let (before, v0) = pair[0];
                let (after, v1) = pair[1];
                let (t0, t1) = (time[before], time[after]);

                for ii in (before + 1)..after {
                    let value = if t1 == t0 {
                        v0
                    } else {
                        v0 + (v1 - v0) * (time[ii] - t0) / (t1 - t0)
                    };
                    cells.push((ii, value, t0));
                }
            }
            // Rows tied in time with an end anchor are inside the anchored span
            cells.extend(
                (0..first)
                    .filter(|&ii| time[ii] == time[first])
                    .map(|ii| (ii, v_first, time[first])),
            );
            cells.extend(
                ((last + 1)..rows)
                    .filter(|&ii| time[ii] == time[last])
                    .map(|ii| (ii, v_last, time[last])),
            );

            for (ii, value, anchor) in cells {
                if !sources[ii].is_atmosphere() {
                    continue;
                }
                self.measured[[ii, column]] = Some(value);
                self.anchor_time[[ii, column]] = Some(anchor);
                filled += 1;
            }
        }
        debug!(
            "interpolated {filled} reference cells across {} standards",
            self.standards.len()
        );

        for standard in &self.standards {
            Zip::from(self.known.column_mut(standard.column))
                .and(self.measured.column(standard.column))
                .for_each(|known, measured| *known = measured.map(|_| standard.known));
        }
        Ok(())
    }

    pub fn standards(&self) -> &[Standard<E>] {
        &self.standards
    }

    pub const fn measured(&self) -> &Array2<Option<E>> {
        &self.measured
    }

    pub const fn known(&self) -> &Array2<Option<E>> {
        &self.known
    }

    pub const fn anchor_time(&self) -> &Array2<Option<E>> {
        &self.anchor_time
    }

    /// The `(known, measured)` pairs defined for row `idx`
    pub fn pairs(&self, idx: usize) -> Vec<(E, E)> {
        defined_pairs(self.known.row(idx), self.measured.row(idx))
    }
}

fn defined_pairs<E: Copy>(
    known: ArrayView1<Option<E>>,
    measured: ArrayView1<Option<E>>,
) -> Vec<(E, E)> {
    known
        .iter()
        .zip(measured.iter())
        .filter_map(|(&x, &y)| x.zip(y))
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::{ReferenceMatrices, Standard};
    use crate::config::Config;
    use crate::observation::Series;
    use crate::segment::{segment_ids, segment_means};
    use crate::{Error, Result};

    fn matrices(time: Vec<f64>, raw: Vec<f64>, flag: Vec<f64>) -> Result<ReferenceMatrices<f64>> {
        let config = Config::default();
        let series = Series::new(time, raw.into_iter().map(Some).collect(), flag)?;
        let means = segment_means(&segment_ids(series.flag()), series.raw())?;
        let standards = Standard::collect(&series, &config);
        let mut matrices = ReferenceMatrices::build(&series, &means, standards)?;
        matrices.interpolate(series.time(), &series.sources(&config))?;
        Ok(matrices)
    }

    #[test]
    fn standards_are_columns_in_order_of_first_appearance() -> Result<()> {
        let series = Series::new(
            vec![0., 1., 2., 3., 4.],
            vec![None; 5],
            vec![600., -10., 400., -99., 600.],
        )?;
        let standards = Standard::collect(&series, &Config::default());
        assert_eq!(
            standards,
            vec![
                Standard {
                    column: 0,
                    known: 600.
                },
                Standard {
                    column: 1,
                    known: 400.
                }
            ]
        );
        Ok(())
    }

    #[test]
    fn no_standards_means_no_reference_data() -> Result<()> {
        let series = Series::new(vec![0., 1.], vec![Some(1.); 2], vec![-10., -99.])?;
        let standards = Standard::collect(&series, &Config::default());
        let matrices = ReferenceMatrices::build(&series, &[Some(1.); 2], standards);
        assert!(matches!(matrices, Err(Error::NoReferenceData)));
        Ok(())
    }

    #[test]
    fn cells_are_only_populated_where_a_standard_is_sampled() -> Result<()> {
        let series = Series::new(
            vec![0., 1., 2., 3.],
            vec![Some(1.), Some(2.), Some(3.), Some(4.)],
            vec![-10., 400., 600., -99.],
        )?;
        let config = Config::default();
        let means = segment_means(&segment_ids(series.flag()), series.raw())?;
        let matrices =
            ReferenceMatrices::build(&series, &means, Standard::collect(&series, &config))?;

        assert_eq!(matrices.measured().row(0).to_vec(), vec![None, None]);
        assert_eq!(matrices.measured().row(1).to_vec(), vec![Some(2.), None]);
        assert_eq!(matrices.known().row(2).to_vec(), vec![None, Some(600.)]);
        assert_eq!(matrices.known().row(3).to_vec(), vec![None, None]);
        Ok(())
    }

    #[test]
    fn atmospheric_rows_are_interpolated_between_anchors() -> Result<()> {
        let matrices = matrices(
            vec![0., 1., 2., 3., 4., 5.],
            vec![100., 101., 1., 2., 3., 104.],
            vec![400., 400., -10., -10., -10., 400.],
        )?;

        // Anchor segment means are 100.5 (rows 0-1, last at t = 1) and 104 (t = 5)
        for (ii, t) in [(2, 2.), (3, 3.), (4, 4.)] {
            let expected = 100.5 + (104. - 100.5) * (t - 1.) / 4.;
            assert_relative_eq!(matrices.measured()[[ii, 0]].unwrap(), expected);
            assert_eq!(matrices.known()[[ii, 0]], Some(400.));
            assert_eq!(matrices.anchor_time()[[ii, 0]], Some(1.));
        }
        assert_eq!(matrices.anchor_time()[[0, 0]], None);
        Ok(())
    }

    #[test]
    fn values_are_not_extrapolated_beyond_the_anchors() -> Result<()> {
        let matrices = matrices(
            vec![0., 1., 2., 3., 4., 5., 6.],
            vec![1., 400., 2., 3., 402., 4., 5.],
            vec![-10., 400., -10., -99., 400., -10., -10.],
        )?;

        for ii in [0, 5, 6] {
            assert_eq!(matrices.measured()[[ii, 0]], None);
            assert_eq!(matrices.known()[[ii, 0]], None);
        }
        assert_relative_eq!(matrices.measured()[[2, 0]].unwrap(), 400. + 2. / 3.);
        // Flush rows are never filled
        assert_eq!(matrices.measured()[[3, 0]], None);
        Ok(())
    }

    #[test]
    fn rows_of_other_standards_are_not_filled() -> Result<()> {
        let matrices = matrices(
            vec![0., 1., 2., 3.],
            vec![400., 600., 1., 400.],
            vec![400., 600., -10., 400.],
        )?;
        assert_eq!(matrices.measured()[[1, 0]], None);
        assert_eq!(matrices.pairs(2), vec![(400., 400.)]);
        assert!(matrices.pairs(1).contains(&(600., 600.)));
        Ok(())
    }

    #[test]
    fn segments_without_readings_are_not_anchors() -> Result<()> {
        let config = Config::default();
        let series = Series::new(
            vec![0., 1., 2., 3., 4.],
            vec![Some(400.), Some(1.), None, Some(2.), Some(402.)],
            vec![400., -10., 400., -10., 400.],
        )?;
        let means = segment_means(&segment_ids(series.flag()), series.raw())?;
        let mut matrices =
            ReferenceMatrices::build(&series, &means, Standard::collect(&series, &config))?;
        matrices.interpolate(series.time(), &series.sources(&config))?;

        assert_eq!(matrices.known()[[2, 0]], None);
        assert_relative_eq!(matrices.measured()[[1, 0]].unwrap(), 400.5);
        assert_relative_eq!(matrices.measured()[[3, 0]].unwrap(), 401.5);
        Ok(())
    }

    #[test]
    fn rows_sharing_an_end_anchor_time_are_filled() -> Result<()> {
        let matrices = matrices(
            vec![0., 1., 2., 2.],
            vec![400., 1., 402., 3.],
            vec![400., -10., 400., -10.],
        )?;

        assert_relative_eq!(matrices.measured()[[1, 0]].unwrap(), 401.);
        assert_eq!(matrices.measured()[[3, 0]], Some(402.));
        assert_eq!(matrices.known()[[3, 0]], Some(400.));
        assert_eq!(matrices.anchor_time()[[3, 0]], Some(2.));
        Ok(())
    }

    #[test]
    fn mismatched_lengths_are_malformed() -> Result<()> {
        let config = Config::default();
        let series = Series::new(vec![0., 1., 2.], vec![Some(400.); 3], vec![400., -10., 400.])?;
        let means = segment_means(&segment_ids(series.flag()), series.raw())?;
        let mut matrices =
            ReferenceMatrices::build(&series, &means, Standard::collect(&series, &config))?;

        let sources = series.sources(&config);
        let short = matrices.interpolate(&series.time()[..2], &sources);
        assert!(matches!(short, Err(Error::MalformedInput(_))));
        let short = matrices.interpolate(series.time(), &sources[..1]);
        assert!(matches!(short, Err(Error::MalformedInput(_))));
        Ok(())
    }
}
