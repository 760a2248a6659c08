use log::debug;
use num_traits::Float;

use crate::math::{ordinary_least_squares, single_point, Line};
use crate::observation::Source;
use crate::reference::ReferenceMatrices;

/// The drift model for one atmospheric row, `measured = m * known + b`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fit<E> {
    /// Slope, `None` if the row's references could not determine it
    pub m: Option<E>,
    /// Intercept, `None` if the row's references could not determine it
    pub b: Option<E>,
    /// Number of standards used
    pub n: usize,
    pub r_sq: Option<E>,
}

impl<E: Float> Fit<E> {
    /// Fit the `(known, measured)` pairs available at one row
    ///
    /// Returns `None` when there are no pairs. A single pair gives a line through the origin,
    /// two or more are fitted by least squares.
    pub fn from_pairs(pairs: &[(E, E)]) -> Option<Self> {
        let line: Line<E> = match pairs {
            [] => return None,
            [(x, y)] => single_point(*x, *y),
            pairs => ordinary_least_squares(pairs),
        };
        Some(Self {
            m: line.slope,
            b: line.intercept,
            n: pairs.len(),
            r_sq: line.r_squared,
        })
    }

    pub const fn is_degenerate(&self) -> bool {
        self.m.is_none() || self.b.is_none()
    }

    /// Invert the drift model, `(raw - b) / m`
    pub fn correct(&self, raw: E) -> Option<E> {
        let (m, b) = self.m.zip(self.b)?;
        (m != E::zero()).then(|| (raw - b) / m)
    }
}

/// Fit every atmospheric row of `references`
///
/// The result has one entry per row. Rows which are not atmospheric, or which have no bracketing
/// standard, are `None`.
pub fn fit_rows<E: Float>(
    references: &ReferenceMatrices<E>,
    sources: &[Source<E>],
) -> Vec<Option<Fit<E>>> {
    let fits = sources
        .iter()
        .enumerate()
        .map(|(ii, source)| {
            if source.is_atmosphere() {
                Fit::from_pairs(&references.pairs(ii))
            } else {
                None
            }
        })
        .collect::<Vec<_>>();

    debug!(
        "fitted {} of {} atmospheric rows, {} degenerate",
        fits.iter().flatten().count(),
        sources.iter().filter(|source| source.is_atmosphere()).count(),
        fits.iter().flatten().filter(|fit| fit.is_degenerate()).count(),
    );

    fits
}
