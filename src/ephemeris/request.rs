use std::{fmt, str::FromStr, time::Duration};

use camino::Utf8Path;
use hifitime::Epoch;
use itertools::Itertools;
use serde::Deserialize;

use crate::{
    bodies::{Body, BodyList},
    constants::{JulianDate, J2000},
    ephem_errors::{EphemError, Result},
    observer::Observer,
};

/// Where positions come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// Keplerian mean elements and the analytic Sun/Moon series
    #[default]
    Elements,
    /// A JPL DE binary file
    Store,
}

impl FromStr for Precision {
    type Err = EphemError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "elements" => Ok(Precision::Elements),
            "store" | "jpl" | "de" => Ok(Precision::Store),
            other => Err(EphemError::InvalidRequest(format!(
                "unknown precision mode '{other}' (expected 'elements' or 'store')"
            ))),
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precision::Elements => f.write_str("elements"),
            Precision::Store => f.write_str("store"),
        }
    }
}

/// Amount of detail written per body in equatorial output.
///
/// Each tier includes the fields of the previous ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DetailTier {
    /// x, y, z
    Position = 0,
    /// + RA, Dec
    RaDec = 1,
    /// + magnitude, phase, angular size
    Photometry = 2,
    /// + physical size, albedo, distances, angles and ecliptic coordinates
    Physical = 3,
}

/// Output layout, selected on the command line by an integer in `-1..=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// x, y, z rotated into the J2000 ecliptic
    Ecliptic,
    Equatorial(DetailTier),
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Equatorial(DetailTier::Position)
    }
}

impl OutputFormat {
    pub fn selector(self) -> i32 {
        match self {
            OutputFormat::Ecliptic => -1,
            OutputFormat::Equatorial(tier) => tier as i32,
        }
    }

    /// Number of f64 values written per body and per step
    pub fn field_count(self) -> usize {
        match self {
            OutputFormat::Ecliptic | OutputFormat::Equatorial(DetailTier::Position) => 3,
            OutputFormat::Equatorial(DetailTier::RaDec) => 5,
            OutputFormat::Equatorial(DetailTier::Photometry) => 8,
            OutputFormat::Equatorial(DetailTier::Physical) => 17,
        }
    }

    /// True when the equatorial tier reaches `tier`
    pub fn includes(self, tier: DetailTier) -> bool {
        matches!(self, OutputFormat::Equatorial(own) if own >= tier)
    }
}

impl TryFrom<i32> for OutputFormat {
    type Error = EphemError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            -1 => Ok(OutputFormat::Ecliptic),
            0 => Ok(OutputFormat::Equatorial(DetailTier::Position)),
            1 => Ok(OutputFormat::Equatorial(DetailTier::RaDec)),
            2 => Ok(OutputFormat::Equatorial(DetailTier::Photometry)),
            3 => Ok(OutputFormat::Equatorial(DetailTier::Physical)),
            other => Err(EphemError::InvalidOutputFormat(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parallelism {
    #[default]
    Sequential,
    /// Bodies of a step spread over a dedicated pool of `n` threads
    Threads(usize),
}

/// A validated ephemeris computation. Build it with [`EphemerisRequest::builder`].
#[derive(Debug, Clone, PartialEq)]
pub struct EphemerisRequest {
    jd_min: JulianDate,
    jd_max: JulianDate,
    jd_step: f64,
    bodies: BodyList,
    format: OutputFormat,
    binary: bool,
    topocentric: Option<Observer>,
    ra_dec_epoch: JulianDate,
    precision: Precision,
    ephemeris: Option<String>,
    timeout: Option<Duration>,
    parallelism: Parallelism,
}

impl EphemerisRequest {
    pub fn builder() -> EphemerisRequestBuilder {
        EphemerisRequestBuilder::default()
    }

    pub fn jd_min(&self) -> JulianDate {
        self.jd_min
    }

    pub fn jd_max(&self) -> JulianDate {
        self.jd_max
    }

    pub fn jd_step(&self) -> f64 {
        self.jd_step
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn binary(&self) -> bool {
        self.binary
    }

    pub fn topocentric(&self) -> Option<&Observer> {
        self.topocentric.as_ref()
    }

    pub fn ra_dec_epoch(&self) -> JulianDate {
        self.ra_dec_epoch
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Path or URL of the DE file, required by [`Precision::Store`]
    pub fn ephemeris(&self) -> Option<&str> {
        self.ephemeris.as_deref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn parallelism(&self) -> Parallelism {
        self.parallelism
    }

    /// Number of time steps: the count of `jd_at(k) < jd_max`, zero for an empty range.
    ///
    /// Starts from `ceil((jd_max − jd_min) / jd_step)` and corrects it against the dates
    /// actually produced, as the division may round to either side of a whole number.
    pub fn steps(&self) -> usize {
        let mut steps = ((self.jd_max - self.jd_min) / self.jd_step).ceil().max(0.0) as usize;
        while steps > 0 && self.jd_at(steps - 1) >= self.jd_max {
            steps -= 1;
        }
        while self.jd_at(steps) < self.jd_max {
            steps += 1;
        }
        steps
    }

    /// Julian Date of step `k`
    pub fn jd_at(&self, k: usize) -> JulianDate {
        self.jd_min + k as f64 * self.jd_step
    }
}

/// Collects and validates the fields of an [`EphemerisRequest`].
///
/// ```rust
/// use ephemera::{bodies::Body, ephemeris::request::{EphemerisRequest, OutputFormat}};
///
/// let request = EphemerisRequest::builder()
///     .time_range(2451545.0, 2451555.0, 1.0)
///     .bodies([Body::Mars, Body::Jupiter])
///     .format(OutputFormat::try_from(1).unwrap())
///     .build()
///     .unwrap();
/// assert_eq!(request.steps(), 10);
/// ```
#[derive(Debug, Clone)]
pub struct EphemerisRequestBuilder {
    jd_min: JulianDate,
    jd_max: JulianDate,
    jd_step: f64,
    bodies: BodyList,
    format: OutputFormat,
    binary: bool,
    topocentric: Option<(f64, f64)>,
    ra_dec_epoch: JulianDate,
    precision: Precision,
    ephemeris: Option<String>,
    timeout: Option<Duration>,
    parallelism: Parallelism,
}

impl Default for EphemerisRequestBuilder {
    fn default() -> Self {
        EphemerisRequestBuilder {
            jd_min: J2000,
            jd_max: J2000,
            jd_step: 1.0,
            bodies: BodyList::new(),
            format: OutputFormat::default(),
            binary: false,
            topocentric: None,
            ra_dec_epoch: J2000,
            precision: Precision::default(),
            ephemeris: None,
            timeout: None,
            parallelism: Parallelism::default(),
        }
    }
}

impl EphemerisRequestBuilder {
    pub fn time_range(mut self, jd_min: JulianDate, jd_max: JulianDate, jd_step: f64) -> Self {
        self.jd_min = jd_min;
        self.jd_max = jd_max;
        self.jd_step = jd_step;
        self
    }

    pub fn bodies(mut self, bodies: impl IntoIterator<Item = Body>) -> Self {
        self.bodies = bodies.into_iter().collect();
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn binary(mut self, binary: bool) -> Self {
        self.binary = binary;
        self
    }

    /// Observe from this geodetic position instead of the geocentre
    pub fn topocentric(mut self, latitude: f64, longitude: f64) -> Self {
        self.topocentric = Some((latitude, longitude));
        self
    }

    pub fn ra_dec_epoch(mut self, epoch: JulianDate) -> Self {
        self.ra_dec_epoch = epoch;
        self
    }

    pub fn precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    pub fn ephemeris(mut self, location: impl Into<String>) -> Self {
        self.ephemeris = Some(location.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn parallelism(mut self, parallelism: Parallelism) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Check every field and freeze the request.
    ///
    /// Return
    /// ------
    /// * [`EphemError::InvalidRequest`] for an inconsistent time range, an empty body list, a
    ///   store request without a file or a zero-thread pool
    /// * [`EphemError::UnobservableBody`] when the Earth is requested
    /// * [`EphemError::InvalidObserver`] for out-of-range topocentric coordinates
    pub fn build(self) -> Result<EphemerisRequest> {
        let invalid = |reason: String| Err(EphemError::InvalidRequest(reason));

        if !(self.jd_min.is_finite() && self.jd_max.is_finite()) {
            return invalid(format!("non-finite time range [{}, {}]", self.jd_min, self.jd_max));
        }
        if self.jd_max < self.jd_min {
            return invalid(format!(
                "jd_max {} is before jd_min {}",
                self.jd_max, self.jd_min
            ));
        }
        if !(self.jd_step.is_finite() && self.jd_step > 0.0) {
            return invalid(format!("time step {} must be positive", self.jd_step));
        }
        if !self.ra_dec_epoch.is_finite() {
            return invalid(format!("invalid RA/Dec epoch {}", self.ra_dec_epoch));
        }
        if self.bodies.is_empty() {
            return invalid("no body requested".into());
        }
        if self.bodies.contains(&Body::Earth) {
            return Err(EphemError::UnobservableBody(Body::Earth));
        }
        let duplicates = self.bodies.iter().duplicates().join(", ");
        if !duplicates.is_empty() {
            log::warn!("bodies requested more than once: {duplicates}");
        }
        if self.precision == Precision::Store && self.ephemeris.is_none() {
            return invalid("the store precision needs an ephemeris file".into());
        }
        if self.parallelism == Parallelism::Threads(0) {
            return invalid("a thread pool needs at least one thread".into());
        }

        let topocentric = match self.topocentric {
            Some((latitude, longitude)) => Some(Observer::try_new(
                latitude,
                longitude,
                None,
                Epoch::from_jde_utc(self.jd_min),
            )?),
            None => None,
        };

        Ok(EphemerisRequest {
            jd_min: self.jd_min,
            jd_max: self.jd_max,
            jd_step: self.jd_step,
            bodies: self.bodies,
            format: self.format,
            binary: self.binary,
            topocentric,
            ra_dec_epoch: self.ra_dec_epoch,
            precision: self.precision,
            ephemeris: self.ephemeris,
            timeout: self.timeout,
            parallelism: self.parallelism,
        })
    }
}

/// Run settings as read from a TOML file. Every field is optional.
///
/// ```toml
/// jd_min = 2451544.5
/// jd_max = 2451575.5
/// jd_step = 1.0
/// objects = "mars,jupiter"
/// format = 3
/// precision = "store"
/// ephemeris = "https://example.org/de440/linux_p1550p2650.440"
/// timeout_ms = 5000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub jd_min: Option<f64>,
    pub jd_max: Option<f64>,
    pub jd_step: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub topocentric: Option<bool>,
    pub ra_dec_epoch: Option<f64>,
    pub format: Option<i32>,
    pub precision: Option<Precision>,
    pub ephemeris: Option<String>,
    pub binary: Option<bool>,
    pub output: Option<String>,
    pub threads: Option<usize>,
    pub objects: Option<String>,
    pub timeout_ms: Option<u64>,
}

/// Time range used when neither the file nor the command line gives one
const DEFAULT_SPAN_DAYS: f64 = 30.0;

impl RunConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Utf8Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Fields set in `overrides` replace the ones of `self`.
    pub fn merge(self, overrides: RunConfig) -> RunConfig {
        RunConfig {
            jd_min: overrides.jd_min.or(self.jd_min),
            jd_max: overrides.jd_max.or(self.jd_max),
            jd_step: overrides.jd_step.or(self.jd_step),
            latitude: overrides.latitude.or(self.latitude),
            longitude: overrides.longitude.or(self.longitude),
            topocentric: overrides.topocentric.or(self.topocentric),
            ra_dec_epoch: overrides.ra_dec_epoch.or(self.ra_dec_epoch),
            format: overrides.format.or(self.format),
            precision: overrides.precision.or(self.precision),
            ephemeris: overrides.ephemeris.or(self.ephemeris),
            binary: overrides.binary.or(self.binary),
            output: overrides.output.or(self.output),
            threads: overrides.threads.or(self.threads),
            objects: overrides.objects.or(self.objects),
            timeout_ms: overrides.timeout_ms.or(self.timeout_ms),
        }
    }

    /// Fill the gaps with defaults and validate.
    ///
    /// Defaults: 30 daily steps from J2000, every observable body, format 0, geocentric,
    /// RA/Dec referred to J2000, analytic precision, sequential evaluation.
    pub fn to_request(&self) -> Result<EphemerisRequest> {
        let jd_min = self.jd_min.unwrap_or(J2000);
        let bodies = match &self.objects {
            Some(list) => Body::parse_list(list)?,
            None => Body::OBSERVABLE.iter().copied().collect(),
        };
        let parallelism = match self.threads {
            None | Some(1) => Parallelism::Sequential,
            Some(n) => Parallelism::Threads(n),
        };

        let mut builder = EphemerisRequest::builder()
            .time_range(
                jd_min,
                self.jd_max.unwrap_or(jd_min + DEFAULT_SPAN_DAYS),
                self.jd_step.unwrap_or(1.0),
            )
            .bodies(bodies)
            .format(OutputFormat::try_from(self.format.unwrap_or(0))?)
            .binary(self.binary.unwrap_or(false))
            .ra_dec_epoch(self.ra_dec_epoch.unwrap_or(J2000))
            .precision(self.precision.unwrap_or_default())
            .parallelism(parallelism);

        if self.topocentric.unwrap_or(false) {
            builder = builder.topocentric(
                self.latitude.unwrap_or(0.0),
                self.longitude.unwrap_or(0.0),
            );
        }
        if let Some(location) = &self.ephemeris {
            builder = builder.ephemeris(location.clone());
        }
        if let Some(ms) = self.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        builder.build()
    }
}
