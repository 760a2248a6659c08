#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
// #![warn(clippy::cargo)]

pub mod calibration;
pub mod config;
pub mod error;
pub mod io;
pub mod math;
pub mod observation;
pub mod reference;
pub mod regression;
pub mod segment;

pub use calibration::{calibrate, calibrate_with_summary, CalibratedObservation, Summary};
pub use config::Config;
pub use error::Error;
pub use observation::{Observation, Series, Source};

pub type Result<T> = ::std::result::Result<T, Error>;
