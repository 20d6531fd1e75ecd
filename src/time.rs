use hifitime::Epoch;
use std::str::FromStr;

use crate::{
    constants::{Degree, JulianDate, DAYS_PER_CENTURY, J2000, SIDEREAL_RATE},
    ephem_errors::Result,
    sky_coords::normalize_angle,
};

/// Parse an ISO 8601 date (YYYY-MM-ddTHH:mm:ss, UTC unless a scale is given) into an [`Epoch`]
///
/// Argument
/// --------
/// * `date`: the date string, e.g. `"2000-01-01T00:00:00"` or `"2000-01-01T00:00:00 UTC"`
///
/// Return
/// ------
/// * the parsed epoch, or [`crate::ephem_errors::EphemError::TimeError`]
pub fn parse_epoch(date: &str) -> Result<Epoch> {
    Ok(Epoch::from_str(date.trim())?)
}

/// Julian centuries elapsed since J2000.0
///
/// Argument
/// --------
/// * `jd`: a Julian Date
///
/// Return
/// ------
/// * `(jd − 2451545.0) / 36525`
pub fn centuries_since_j2000(jd: JulianDate) -> f64 {
    (jd - J2000) / DAYS_PER_CENTURY
}

/// Julian Date at the preceding 0h UT of the given Julian Date.
///
/// Julian days start at noon, so midnight sits on the `.5` boundary.
pub fn jd_at_midnight(jd: JulianDate) -> JulianDate {
    (jd - 0.5).floor() + 0.5
}

/// Greenwich Mean Sidereal Time in degrees for a Julian Date in UT1 (UTC is accepted as an
/// approximation of UT1).
///
/// The GMST at 0h UT is given by the IAU polynomial in Julian centuries counted from J2000.0 at
/// that midnight; the time elapsed since midnight is added at the sidereal rate.
///
/// # Arguments
/// * `jd_ut` - Julian Date (UT1 time scale)
///
/// # Returns
/// * GMST angle in degrees, normalized to the interval [0, 360).
pub fn gmst_degrees(jd_ut: JulianDate) -> Degree {
    let jd0 = jd_at_midnight(jd_ut);
    let t = centuries_since_j2000(jd0);
    let ut_hours = (jd_ut - jd0) * 24.0;

    let gmst0 = 100.46061837 + 36000.770053608 * t + 0.000387933 * t * t
        - t * t * t / 38_710_000.0;

    normalize_angle(gmst0 + 15.0 * ut_hours * SIDEREAL_RATE, 0.0, 360.0)
}

/// Local Mean Sidereal Time, in degrees within [0, 360).
///
/// Arguments
/// ---------
/// * `epoch`: the instant of the observation
/// * `longitude`: observer longitude in degrees, positive east
///
/// Return
/// ------
/// * the local sidereal time in degrees
pub fn local_sidereal_time(epoch: &Epoch, longitude: Degree) -> Degree {
    local_sidereal_time_jd(epoch.to_jde_utc_days(), longitude)
}

/// Same as [`local_sidereal_time`] for a raw Julian Date (UT).
pub fn local_sidereal_time_jd(jd_ut: JulianDate, longitude: Degree) -> Degree {
    normalize_angle(gmst_degrees(jd_ut) + longitude, 0.0, 360.0)
}
