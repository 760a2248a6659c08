use log::{debug, info, warn};
use num_traits::Float;

use crate::config::{literal, Config};
use crate::observation::Series;
use crate::reference::{ReferenceMatrices, Standard};
use crate::regression::{fit_rows, Fit};
use crate::segment::{segment_ids, segment_means};
use crate::Result;

/// An atmospheric observation corrected for drift, with the fit used to correct it
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CalibratedObservation<E> {
    pub time: E,
    /// The corrected value, `None` if the reading or the fit is undefined
    pub cal: Option<E>,
    pub raw: Option<E>,
    pub m: Option<E>,
    pub b: Option<E>,
    /// Number of standards the fit was made from
    pub n: usize,
    pub r_sq: Option<E>,
}

/// Row counts for a single calibration run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub rows: usize,
    pub atmospheric: usize,
    pub standards: usize,
    /// Atmospheric rows with no standard measured on both sides
    pub unbracketed: usize,
    /// Emitted rows whose fit is undefined
    pub degenerate: usize,
    pub rejected_er: usize,
    pub rejected_dt: usize,
    pub emitted: usize,
}

/// Why a fitted row was removed from the output
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Rejection {
    Deviation,
    Staleness,
}

/// Correct `series` for drift against the standards interleaved with it
///
/// # Errors
/// Returns [`crate::Error::NoReferenceData`] if `series` contains no standard.
pub fn calibrate<E: Float>(
    series: &Series<E>,
    config: &Config<E>,
) -> Result<Vec<CalibratedObservation<E>>> {
    calibrate_with_summary(series, config).map(|(calibrated, _)| calibrated)
}

/// As [`calibrate`], also reporting how many rows were dropped at each stage
///
/// A row removed by both tolerances is counted once, against `er_tol`.
///
/// # Errors
/// Returns [`crate::Error::NoReferenceData`] if `series` contains no standard.
pub fn calibrate_with_summary<E: Float>(
    series: &Series<E>,
    config: &Config<E>,
) -> Result<(Vec<CalibratedObservation<E>>, Summary)> {
    let sources = series.sources(config);
    let ids = segment_ids(series.flag());
    debug!(
        "{} rows in {} segments",
        series.len(),
        ids.last().map_or(0, |last| last + 1)
    );

    let means = segment_means(&ids, series.raw())?;
    let standards = Standard::collect(series, config);
    debug!("found {} standards", standards.len());

    let mut summary = Summary {
        rows: series.len(),
        atmospheric: sources.iter().filter(|source| source.is_atmosphere()).count(),
        standards: standards.len(),
        ..Summary::default()
    };

    let mut references = ReferenceMatrices::build(series, &means, standards)?;
    references.interpolate(series.time(), &sources)?;
    let fits = fit_rows(&references, &sources);

    let mut calibrated = vec![];
    for (ii, (fit, source)) in fits.into_iter().zip(&sources).enumerate() {
        if !source.is_atmosphere() {
            continue;
        }
        let Some(fit) = fit else {
            summary.unbracketed += 1;
            continue;
        };

        match check_tolerances(&references, &fit, series.time(), ii, config) {
            Some(Rejection::Deviation) => {
                summary.rejected_er += 1;
                continue;
            }
            Some(Rejection::Staleness) => {
                summary.rejected_dt += 1;
                continue;
            }
            None => {}
        }

        if fit.is_degenerate() {
            summary.degenerate += 1;
        }
        let raw = series.raw()[ii];
        calibrated.push(CalibratedObservation {
            time: series.time()[ii],
            cal: raw.and_then(|raw| fit.correct(raw)),
            raw,
            m: fit.m,
            b: fit.b,
            n: fit.n,
            r_sq: fit.r_sq,
        });
    }
    summary.emitted = calibrated.len();

    if summary.emitted == 0 && summary.atmospheric > 0 {
        warn!(
            "none of {} atmospheric rows could be calibrated",
            summary.atmospheric
        );
    }
    info!(
        "calibrated {} of {} atmospheric rows ({} unbracketed, {} rejected by er_tol, {} rejected by dt_tol, {} degenerate)",
        summary.emitted,
        summary.atmospheric,
        summary.unbracketed,
        summary.rejected_er,
        summary.rejected_dt,
        summary.degenerate
    );

    Ok((calibrated, summary))
}

fn check_tolerances<E: Float>(
    references: &ReferenceMatrices<E>,
    fit: &Fit<E>,
    time: &[E],
    idx: usize,
    config: &Config<E>,
) -> Option<Rejection> {
    if let Some(er_tol) = config.er_tol {
        if deviation_percent(references, fit, idx).is_some_and(|deviation| deviation > er_tol) {
            return Some(Rejection::Deviation);
        }
    }
    if let Some(dt_tol) = config.dt_tol {
        if elapsed(references, time, idx).is_some_and(|elapsed| elapsed > dt_tol) {
            return Some(Rejection::Staleness);
        }
    }
    None
}

/// Largest percent deviation from their known values of the reference readings bracketing row
/// `idx`, once corrected by `fit`
///
/// Standards with a known value of zero are skipped. `None` if there is nothing to compare or
/// `fit` cannot correct.
pub(crate) fn deviation_percent<E: Float>(
    references: &ReferenceMatrices<E>,
    fit: &Fit<E>,
    idx: usize,
) -> Option<E> {
    let hundred = literal::<E>(100.);
    references
        .pairs(idx)
        .into_iter()
        .filter(|(known, _)| *known != E::zero())
        .map(|(known, measured)| {
            fit.correct(measured)
                .map(|corrected| (corrected - known).abs() / known.abs() * hundred)
        })
        .collect::<Option<Vec<_>>>()?
        .into_iter()
        .reduce(E::max)
}

/// Time since the most recent real reference measurement preceding row `idx`, over the
/// standards bracketing it
pub(crate) fn elapsed<E: Float>(
    references: &ReferenceMatrices<E>,
    time: &[E],
    idx: usize,
) -> Option<E> {
    references
        .anchor_time()
        .row(idx)
        .iter()
        .flatten()
        .map(|&anchor| time[idx] - anchor)
        .reduce(E::min)
}
