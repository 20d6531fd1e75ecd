use thiserror::Error;

use crate::{bodies::Body, remote_file::FileError};

/// Crate-wide error type.
///
/// Every fallible operation of the engine returns this enum. Errors from the
/// random-access file layer are carried unchanged in [`EphemError::File`] so the
/// caller can still inspect the [`FileError`] kind.
#[derive(Error, Debug)]
pub enum EphemError {
    #[error("Invalid observer coordinates: latitude {latitude}°, longitude {longitude}°")]
    InvalidObserver { latitude: f64, longitude: f64 },

    #[error("Invalid ephemeris request: {0}")]
    InvalidRequest(String),

    #[error("Unknown body identifier: {0}")]
    UnknownBody(String),

    #[error("Body {0} cannot be observed from the geocentre")]
    UnobservableBody(Body),

    #[error("Invalid output format selector: {0} (expected -1, 0, 1, 2 or 3)")]
    InvalidOutputFormat(i32),

    #[error("Unsupported eccentricity {0}: only elliptic orbits (0 <= e < 1) are handled")]
    UnsupportedEccentricity(f64),

    #[error(
        "Kepler solver failed to converge (e = {eccentricity}, M = {mean_anomaly} rad, residual = {residual:e})"
    )]
    KeplerSolverFailure {
        eccentricity: f64,
        mean_anomaly: f64,
        residual: f64,
    },

    #[error("Random-access file error: {0}")]
    File(#[from] FileError),

    #[error("Invalid JPL ephemeris header: {0}")]
    InvalidEphemerisHeader(String),

    #[error("Invalid JPL ephemeris record {record}: {reason}")]
    InvalidEphemerisRecord { record: usize, reason: String },

    #[error("Julian Date {jd} outside the ephemeris range [{start}, {end}]")]
    DateOutOfRange { jd: f64, start: f64, end: f64 },

    #[error("Error during the nom parsing: {0}")]
    NomParsingError(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid date: {0}")]
    TimeError(#[from] hifitime::HifitimeError),

    #[error("Invalid configuration file: {0}")]
    ConfigError(#[from] toml::de::Error),

    #[error("Invalid deep-sky catalog: {0}")]
    CatalogError(#[from] csv::Error),

    #[error("Unable to build the worker pool: {0}")]
    ThreadPoolError(#[from] rayon::ThreadPoolBuildError),
}

impl PartialEq for EphemError {
    fn eq(&self, other: &Self) -> bool {
        use EphemError::*;
        match (self, other) {
            (
                InvalidObserver {
                    latitude: a,
                    longitude: b,
                },
                InvalidObserver {
                    latitude: c,
                    longitude: d,
                },
            ) => a == c && b == d,
            (InvalidRequest(a), InvalidRequest(b)) => a == b,
            (UnknownBody(a), UnknownBody(b)) => a == b,
            (UnobservableBody(a), UnobservableBody(b)) => a == b,
            (InvalidOutputFormat(a), InvalidOutputFormat(b)) => a == b,
            (UnsupportedEccentricity(a), UnsupportedEccentricity(b)) => a == b,
            (
                KeplerSolverFailure {
                    eccentricity: a, ..
                },
                KeplerSolverFailure {
                    eccentricity: b, ..
                },
            ) => a == b,
            (File(a), File(b)) => a == b,
            (InvalidEphemerisHeader(a), InvalidEphemerisHeader(b)) => a == b,
            (
                InvalidEphemerisRecord { record: a, .. },
                InvalidEphemerisRecord { record: b, .. },
            ) => a == b,
            (
                DateOutOfRange { jd: a, .. },
                DateOutOfRange { jd: b, .. },
            ) => a == b,
            (NomParsingError(a), NomParsingError(b)) => a == b,

            // Wrapped foreign errors are not comparable: same variant is enough
            (IoError(_), IoError(_)) => true,
            (TimeError(_), TimeError(_)) => true,
            (ConfigError(_), ConfigError(_)) => true,
            (CatalogError(_), CatalogError(_)) => true,
            (ThreadPoolError(_), ThreadPoolError(_)) => true,

            _ => false,
        }
    }
}

/// Shorthand used across the crate.
pub type Result<T> = std::result::Result<T, EphemError>;
