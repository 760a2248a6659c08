//! Run-length segmentation of the flag stream and per-segment averaging

use itertools::Itertools;
use num_traits::Float;

use crate::error::Error;
use crate::Result;

/// A maximal stretch of consecutive rows sharing one flag
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Run<F> {
    pub flag: F,
    pub start: usize,
    pub len: usize,
}

impl<F> Run<F> {
    pub const fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Partition `flags` into maximal runs of equal values
pub fn runs<F: Copy + PartialEq>(flags: &[F]) -> Vec<Run<F>> {
    let mut start = 0;
    flags
        .iter()
        .dedup_with_count()
        .map(|(len, &flag)| {
            let run = Run { flag, start, len };
            start += len;
            run
        })
        .collect()
}

/// Assign each row the index of the run it belongs to
///
/// Ids start at zero and increase by one at every change of flag.
///
/// # Examples
///
/// ```
/// use drift_calibration::segment::segment_ids;
///
/// let ids = segment_ids(&[-10., -10., -99., 400., 400., -10.]);
/// assert_eq!(ids, vec![0, 0, 1, 2, 2, 3]);
/// ```
pub fn segment_ids<F: Copy + PartialEq>(flags: &[F]) -> Vec<usize> {
    runs(flags)
        .into_iter()
        .enumerate()
        .flat_map(|(id, run)| std::iter::repeat(id).take(run.len))
        .collect()
}

/// Broadcast the mean of each segment's defined raw values back onto its rows
///
/// Missing readings are ignored. A segment with no defined readings has no mean.
///
/// # Errors
/// Returns [`Error::MalformedInput`] if `ids` and `raw` differ in length.
pub fn segment_means<E: Float>(ids: &[usize], raw: &[Option<E>]) -> Result<Vec<Option<E>>> {
    if ids.len() != raw.len() {
        return Err(Error::MalformedInput(format!(
            "{} segment ids for {} readings",
            ids.len(),
            raw.len()
        )));
    }

    let mut means = Vec::with_capacity(raw.len());
    for run in runs(ids) {
        let (sum, count) = raw[run.start..run.end()]
            .iter()
            .flatten()
            .fold((E::zero(), 0usize), |(sum, count), &value| {
                (sum + value, count + 1)
            });
        let mean = E::from(count)
            .filter(|_| count > 0)
            .map(|count| sum / count);
        means.extend(std::iter::repeat(mean).take(run.len));
    }

    Ok(means)
}
