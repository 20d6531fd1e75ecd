//! # Spherical-astronomy transforms
//!
//! Conversions between the equatorial frame (right ascension / declination) and the observer's
//! horizontal frame (azimuth / altitude), atmospheric refraction, the low-order precession
//! correction back to J2000, angular separations and angle normalization.
//!
//! Conventions
//! -----------
//! * Azimuth is measured **from north, clockwise** (north 0°, east 90°, south 180°, west 270°)
//!   and always lies in `[0, 360)`.
//! * Altitude is measured from the horizon, positive toward the zenith.
//! * Right ascension is carried as a [`RightAscension`] so that the unit is never guessed from
//!   the magnitude of the value.
//! * Hour angles are in hours, positive west of the meridian.
//!
//! All transforms take the [`Observer`] by reference and read its latitude, longitude and epoch;
//! none of them keeps state between calls.
use serde::Serialize;

use crate::{
    constants::{ArcMin, Degree, Hour, RADEG},
    observer::Observer,
    time::{centuries_since_j2000, local_sidereal_time},
};

/// Right ascension with an explicit unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum RightAscension {
    Hours(Hour),
    Degrees(Degree),
}

impl RightAscension {
    pub fn hours(self) -> Hour {
        match self {
            RightAscension::Hours(h) => h,
            RightAscension::Degrees(d) => d / 15.0,
        }
    }

    pub fn degrees(self) -> Degree {
        match self {
            RightAscension::Hours(h) => h * 15.0,
            RightAscension::Degrees(d) => d,
        }
    }
}

/// Right ascension as `HHh MMm SSs`, seconds truncated.
pub fn format_hms(hours: Hour) -> String {
    let total = (normalize_angle(hours, 0.0, 24.0) * 3600.0).floor() as u32;
    format!("{:02}h {:02}m {:02}s", total / 3600, total / 60 % 60, total % 60)
}

/// Declination as `±DD° MM' SS"`, seconds truncated.
pub fn format_dms(degrees: Degree) -> String {
    let sign = if degrees < 0.0 { '-' } else { '+' };
    let total = (degrees.abs() * 3600.0).floor() as u32;
    format!("{sign}{:02}° {:02}' {:02}\"", total / 3600, total / 60 % 60, total % 60)
}

/// Position in the observer's horizontal frame, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Horizontal {
    pub azimuth: Degree,
    pub altitude: Degree,
}

/// Position in the equatorial frame, with the hour angle it was derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Equatorial {
    pub ra: RightAscension,
    pub dec: Degree,
    /// Local hour angle in hours, within `[-12, 12)`
    pub hour_angle: Hour,
}

/// Wrap an angle into the half-open interval `[min, max)`.
///
/// Works for any interval width (24 for hours, 360 for degrees, 2π for radians) and any real
/// input, including large negative values.
///
/// Arguments
/// ---------
/// * `angle`: the value to wrap
/// * `min`: lower bound (inclusive)
/// * `max`: upper bound (exclusive), must be greater than `min`
///
/// Return
/// ------
/// * the wrapped value
pub fn normalize_angle(angle: f64, min: f64, max: f64) -> f64 {
    debug_assert!(max > min, "normalize_angle: empty interval [{min}, {max})");
    let range = max - min;
    let wrapped = (angle - min).rem_euclid(range) + min;
    // rem_euclid may round a tiny negative remainder up to `range` itself
    if wrapped >= max {
        min
    } else {
        wrapped
    }
}

/// Convert equatorial coordinates to azimuth and altitude for the given observer.
///
/// The hour angle `H = LST/15 − α` is wrapped to `[0, 24)` hours, then
///
/// ```text
/// sin h = sin δ sin φ + cos δ cos φ cos H
/// A     = atan2(−cos δ sin H, sin δ cos φ − cos δ sin φ cos H)
/// ```
///
/// Arguments
/// ---------
/// * `ra`: right ascension
/// * `dec`: declination in degrees
/// * `observer`: location and instant of the observation
///
/// Return
/// ------
/// * azimuth (from north, clockwise, `[0, 360)`) and altitude in degrees
///
/// See also
/// --------
/// * [`horizontal_to_equatorial`] – the exact inverse
pub fn equatorial_to_horizontal(ra: RightAscension, dec: Degree, observer: &Observer) -> Horizontal {
    let lst_hours = local_sidereal_time(&observer.epoch(), observer.longitude()) / 15.0;
    let hour_angle = normalize_angle(lst_hours - ra.hours(), 0.0, 24.0) * 15.0 * RADEG;

    let dec = dec * RADEG;
    let lat = observer.latitude() * RADEG;

    let sin_alt = dec.sin() * lat.sin() + dec.cos() * lat.cos() * hour_angle.cos();
    let altitude = sin_alt.clamp(-1.0, 1.0).asin();

    let azimuth = (-dec.cos() * hour_angle.sin())
        .atan2(dec.sin() * lat.cos() - dec.cos() * lat.sin() * hour_angle.cos());

    Horizontal {
        azimuth: normalize_angle(azimuth / RADEG, 0.0, 360.0),
        altitude: altitude / RADEG,
    }
}

/// Convert azimuth and altitude back to equatorial coordinates of date.
///
/// The hour angle is recovered with `atan2`, which stays well conditioned near the poles:
///
/// ```text
/// sin δ = sin h sin φ + cos h cos φ cos A
/// H     = atan2(−sin A cos h, sin h cos φ − cos h sin φ cos A)
/// ```
///
/// No refraction or precession is applied, so this is the exact inverse of
/// [`equatorial_to_horizontal`].
///
/// Return
/// ------
/// * right ascension in hours (`[0, 24)`), declination in degrees, hour angle in hours
pub fn horizontal_to_equatorial(horizontal: Horizontal, observer: &Observer) -> Equatorial {
    let az = horizontal.azimuth * RADEG;
    let alt = horizontal.altitude * RADEG;
    let lat = observer.latitude() * RADEG;

    let sin_dec = alt.sin() * lat.sin() + alt.cos() * lat.cos() * az.cos();
    let dec = sin_dec.clamp(-1.0, 1.0).asin();

    let hour_angle =
        (-az.sin() * alt.cos()).atan2(alt.sin() * lat.cos() - alt.cos() * lat.sin() * az.cos());
    let hour_angle = normalize_angle(hour_angle / RADEG / 15.0, -12.0, 12.0);

    let lst_hours = local_sidereal_time(&observer.epoch(), observer.longitude()) / 15.0;
    let ra = normalize_angle(lst_hours - hour_angle, 0.0, 24.0);

    Equatorial {
        ra: RightAscension::Hours(ra),
        dec: dec / RADEG,
        hour_angle,
    }
}

/// Convert an apparent (observed) azimuth/altitude to approximate J2000 equatorial coordinates.
///
/// The apparent altitude is first corrected for refraction, the position is converted to
/// coordinates of the date of observation, then mapped back to J2000 with
/// [`approximate_precession_to_j2000`] evaluated at the observer's epoch.
pub fn horizontal_to_j2000(apparent: Horizontal, observer: &Observer) -> Equatorial {
    let true_horizontal = Horizontal {
        azimuth: apparent.azimuth,
        altitude: correct_for_refraction(apparent.altitude),
    };
    let of_date = horizontal_to_equatorial(true_horizontal, observer);

    let (ra, dec) = approximate_precession_to_j2000(
        of_date.ra.degrees(),
        of_date.dec,
        observer.epoch().to_jde_tt_days(),
    );

    Equatorial {
        ra: RightAscension::Hours(normalize_angle(ra / 15.0, 0.0, 24.0)),
        dec,
        hour_angle: of_date.hour_angle,
    }
}

/// Low-order precession correction from the mean equinox of `jd` back to J2000.
///
/// ```text
/// M  = 1.2812323 T + 0.0003879 T² + 0.0000101 T³
/// N  = 0.5567530 T − 0.0001185 T² + 0.0000116 T³
/// Δα = M + N sin α tan δ
/// Δδ = N cos α
/// ```
///
/// with `T` in Julian centuries since J2000 and `M`, `N` in degrees. Good to a few arcseconds
/// within a few decades of J2000; use [`crate::ref_system::precession_matrix`] for anything
/// better.
///
/// Arguments
/// ---------
/// * `ra`: right ascension of date, degrees
/// * `dec`: declination of date, degrees
/// * `jd`: epoch of the input coordinates
///
/// Return
/// ------
/// * `(ra, dec)` referred to J2000, degrees (right ascension not wrapped)
pub fn approximate_precession_to_j2000(ra: Degree, dec: Degree, jd: f64) -> (Degree, Degree) {
    let t = centuries_since_j2000(jd);
    let m = 1.2812323 * t + 0.0003879 * t * t + 0.0000101 * t * t * t;
    let n = 0.5567530 * t - 0.0001185 * t * t + 0.0000116 * t * t * t;

    let (ra_rad, dec_rad) = (ra * RADEG, dec * RADEG);
    let delta_ra = m + n * ra_rad.sin() * dec_rad.tan();
    let delta_dec = n * ra_rad.cos();

    (ra - delta_ra, dec - delta_dec)
}

/// Pressure (mbar) and temperature (°C) of the standard atmosphere used for refraction
const STANDARD_PRESSURE: f64 = 1010.0;
const STANDARD_TEMPERATURE: f64 = 10.0;

/// Refraction applied to anything observed below the horizon (arcminutes)
pub const BELOW_HORIZON_REFRACTION: ArcMin = 34.0;

/// Atmospheric refraction for an apparent altitude, in arcminutes.
///
/// * above 15°: `R = 1.02 / tan(h + 10.3 / (h + 5.11))`
/// * between 0° and 15°: the low-altitude polynomial of the Explanatory Supplement at standard
///   pressure and temperature (≈ 34′ at the horizon)
/// * below 0°: a fixed [`BELOW_HORIZON_REFRACTION`]
pub fn refraction(apparent_altitude: Degree) -> ArcMin {
    let h = apparent_altitude;
    if h > 15.0 {
        1.02 / ((h + 10.3 / (h + 5.11)) * RADEG).tan()
    } else if h >= 0.0 {
        let numerator = STANDARD_PRESSURE * (0.1594 + 0.0196 * h + 0.00002 * h * h);
        let denominator = (273.0 + STANDARD_TEMPERATURE) * (1.0 + 0.505 * h + 0.0845 * h * h);
        numerator / denominator * 60.0
    } else {
        BELOW_HORIZON_REFRACTION
    }
}

/// Remove atmospheric refraction from an apparent altitude.
///
/// Return
/// ------
/// * the true (geometric) altitude, `apparent − refraction/60`, in degrees
pub fn correct_for_refraction(apparent_altitude: Degree) -> Degree {
    apparent_altitude - refraction(apparent_altitude) / 60.0
}

/// Angular separation between two horizontal directions, in degrees.
///
/// Haversine form, `2·atan2(√a, √(1−a))`, which keeps full precision for both very small and
/// nearly antipodal separations. `a` is clamped to `[0, 1]` so rounding can never produce NaN.
pub fn angular_separation(az1: Degree, alt1: Degree, az2: Degree, alt2: Degree) -> Degree {
    let (az1, alt1, az2, alt2) = (az1 * RADEG, alt1 * RADEG, az2 * RADEG, alt2 * RADEG);
    let d_az = az2 - az1;
    let d_alt = alt2 - alt1;

    let a = (d_alt / 2.0).sin().powi(2) + alt1.cos() * alt2.cos() * (d_az / 2.0).sin().powi(2);
    let a = a.clamp(0.0, 1.0);

    2.0 * a.sqrt().atan2((1.0 - a).sqrt()) / RADEG
}

#[cfg(test)]
mod sky_coords_test {
    use super::*;
    use approx::assert_relative_eq;
    use hifitime::Epoch;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn test_sexagesimal_display() {
        assert_eq!(format_hms(22.0 + 36.72 / 3600.0), "22h 00m 36s");
        assert_eq!(format_hms(24.0 + 0.5), "00h 30m 00s");
        assert_eq!(format_hms(-1.0), "23h 00m 00s");
        assert_eq!(format_dms(-(13.0 + 19.0 / 60.0 + 13.4 / 3600.0)), "-13° 19' 13\"");
        assert_eq!(format_dms(0.5), "+00° 30' 00\"");
        assert_eq!(format_dms(-0.25), "-00° 15' 00\"");
    }

    fn observer(latitude: f64, longitude: f64) -> Observer {
        Observer::new(
            latitude,
            longitude,
            None,
            Epoch::from_gregorian_utc(2021, 6, 21, 22, 30, 0, 0),
        )
    }

    #[test]
    fn test_normalize_angle() {
        assert_eq!(normalize_angle(370.0, 0.0, 360.0), 10.0);
        assert_eq!(normalize_angle(-10.0, 0.0, 360.0), 350.0);
        assert_eq!(normalize_angle(360.0, 0.0, 360.0), 0.0);
        assert_eq!(normalize_angle(-24.0, 0.0, 24.0), 0.0);
        assert_eq!(normalize_angle(25.5, 0.0, 24.0), 1.5);
        assert_eq!(normalize_angle(190.0, -180.0, 180.0), -170.0);
        assert_eq!(normalize_angle(180.0, -180.0, 180.0), -180.0);
        assert_eq!(normalize_angle(-1e-20, 0.0, 360.0), 0.0);
        assert_eq!(normalize_angle(-7.0 * 360.0 - 45.0, 0.0, 360.0), 315.0);
    }

    #[test]
    fn test_normalize_angle_random_inputs() {
        let mut rng = StdRng::seed_from_u64(0x5EED_0001);
        let intervals = [(0.0, 360.0), (0.0, 24.0), (-180.0, 180.0), (-12.0, 12.0), (-1.5, 2.0)];
        for _ in 0..10_000 {
            let x: f64 = rng.random_range(-1e7..1e7);
            for (lo, hi) in intervals {
                let v = normalize_angle(x, lo, hi);
                assert!(v >= lo && v < hi, "{x} -> {v} not in [{lo}, {hi})");
            }
        }
    }

    #[test]
    fn test_azimuth_convention() {
        let obs = observer(45.0, 0.0);
        let lst_hours = local_sidereal_time(&obs.epoch(), obs.longitude()) / 15.0;

        // On the meridian, south of the zenith
        let south = equatorial_to_horizontal(RightAscension::Hours(lst_hours), 10.0, &obs);
        assert_relative_eq!(south.azimuth, 180.0, epsilon = 1e-9);
        assert_relative_eq!(south.altitude, 55.0, epsilon = 1e-9);

        // On the meridian, north of the zenith (upper culmination of a circumpolar star)
        let north = equatorial_to_horizontal(RightAscension::Hours(lst_hours), 80.0, &obs);
        assert!(north.azimuth < 1e-9 || north.azimuth > 360.0 - 1e-9);
        assert_relative_eq!(north.altitude, 55.0, epsilon = 1e-9);

        // Six hours before transit: rising, in the east
        let rising = equatorial_to_horizontal(RightAscension::Hours(lst_hours + 6.0), 0.0, &obs);
        assert_relative_eq!(rising.azimuth, 90.0, epsilon = 1e-9);
        assert_relative_eq!(rising.altitude, 0.0, epsilon = 1e-9);

        // Six hours after transit: setting, in the west
        let setting = equatorial_to_horizontal(RightAscension::Hours(lst_hours - 6.0), 0.0, &obs);
        assert_relative_eq!(setting.azimuth, 270.0, epsilon = 1e-9);
    }

    #[test]
    fn test_right_ascension_units() {
        let obs = observer(30.0, -70.0);
        let from_hours = equatorial_to_horizontal(RightAscension::Hours(5.5), 20.0, &obs);
        let from_degrees = equatorial_to_horizontal(RightAscension::Degrees(82.5), 20.0, &obs);
        assert_relative_eq!(from_hours.azimuth, from_degrees.azimuth, epsilon = 1e-12);
        assert_relative_eq!(from_hours.altitude, from_degrees.altitude, epsilon = 1e-12);
    }

    #[test]
    fn test_round_trip() {
        let mut rng = StdRng::seed_from_u64(0x5EED_0002);
        for latitude in [-55.0, -33.9, 0.0, 12.5, 45.0, 51.48, 60.0] {
            let obs = observer(latitude, 2.35);
            for _ in 0..500 {
                let ra = rng.random_range(0.0..24.0);
                let dec = rng.random_range(-80.0..80.0);

                let hz = equatorial_to_horizontal(RightAscension::Hours(ra), dec, &obs);
                let eq = horizontal_to_equatorial(hz, &obs);

                let d_ra = normalize_angle(eq.ra.hours() - ra, -12.0, 12.0);
                assert!(d_ra.abs() < 1e-6, "ra {ra} -> {:?}", eq.ra);
                assert_relative_eq!(eq.dec, dec, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_hour_angle_sign() {
        let obs = observer(40.0, 10.0);
        // West of the meridian: positive hour angle
        let eq = horizontal_to_equatorial(
            Horizontal {
                azimuth: 250.0,
                altitude: 30.0,
            },
            &obs,
        );
        assert!(eq.hour_angle > 0.0 && eq.hour_angle < 12.0);

        let eq = horizontal_to_equatorial(
            Horizontal {
                azimuth: 110.0,
                altitude: 30.0,
            },
            &obs,
        );
        assert!(eq.hour_angle < 0.0 && eq.hour_angle >= -12.0);
    }

    #[test]
    fn test_refraction() {
        assert_relative_eq!(correct_for_refraction(90.0), 90.0, epsilon = 1e-3);
        assert_eq!(correct_for_refraction(-5.0), -5.0 - 34.0 / 60.0);

        // Close to the classical 34' at the horizon and continuous with the fixed constant
        assert_relative_eq!(refraction(0.0), 34.0, epsilon = 0.3);
        // Bennett-like value at 45°: about one arcminute
        assert_relative_eq!(refraction(45.0), 0.99, epsilon = 0.03);
        // The two branches agree to a fraction of an arcminute at 15°
        assert!((refraction(15.0) - refraction(15.0001)).abs() < 0.2);

        // Refraction decreases monotonically with altitude above the horizon
        let mut previous = refraction(0.0);
        for step in 1..=900 {
            let r = refraction(step as f64 * 0.1);
            assert!(r < previous + 0.15);
            previous = r;
        }
    }

    #[test]
    fn test_horizontal_to_j2000() {
        let obs = observer(48.85, 2.35);
        let apparent = Horizontal {
            azimuth: 135.0,
            altitude: 40.0,
        };
        let of_date = horizontal_to_equatorial(
            Horizontal {
                azimuth: 135.0,
                altitude: correct_for_refraction(40.0),
            },
            &obs,
        );
        let j2000 = horizontal_to_j2000(apparent, &obs);

        // About 21.5 years of precession: a fraction of a degree, declination below 0.13°
        let d_ra = normalize_angle(of_date.ra.degrees() - j2000.ra.degrees(), -180.0, 180.0);
        assert!(d_ra > 0.05 && d_ra < 0.6, "{d_ra}");
        assert!((of_date.dec - j2000.dec).abs() < 0.13);
        assert_eq!(j2000.hour_angle, of_date.hour_angle);
    }

    #[test]
    fn test_approximate_precession() {
        // No correction at J2000
        let (ra, dec) = approximate_precession_to_j2000(41.0, 49.0, 2451545.0);
        assert_eq!((ra, dec), (41.0, 49.0));

        // Meeus example 21.a (θ Persei), J2000 -> 2028 Nov 13.19, run backward.
        let (ra, dec) = approximate_precession_to_j2000(41.547214, 49.348483, 2462088.69);
        assert_relative_eq!(ra, 41.054063, epsilon = 2e-3);
        assert_relative_eq!(dec, 49.227750, epsilon = 2e-3);
    }

    #[test]
    fn test_angular_separation() {
        let mut rng = StdRng::seed_from_u64(0x5EED_0003);
        for _ in 0..2000 {
            let (az1, alt1) = (rng.random_range(0.0..360.0), rng.random_range(-90.0..90.0));
            let (az2, alt2) = (rng.random_range(0.0..360.0), rng.random_range(-90.0..90.0));

            assert_eq!(angular_separation(az1, alt1, az1, alt1), 0.0);
            let d12 = angular_separation(az1, alt1, az2, alt2);
            let d21 = angular_separation(az2, alt2, az1, alt1);
            assert!(!d12.is_nan());
            assert_relative_eq!(d12, d21, epsilon = 1e-9);
            assert!((0.0..=180.0).contains(&d12));
        }

        // Antipodal and quasi-antipodal directions
        assert_relative_eq!(angular_separation(0.0, 0.0, 180.0, 0.0), 180.0, epsilon = 1e-12);
        assert_relative_eq!(angular_separation(10.0, 90.0, 10.0, -90.0), 180.0, epsilon = 1e-12);
        assert!(!angular_separation(0.0, 45.0, 180.0, -45.0).is_nan());

        assert_relative_eq!(angular_separation(0.0, 10.0, 0.0, 30.0), 20.0, epsilon = 1e-12);
        assert_relative_eq!(angular_separation(350.0, 0.0, 10.0, 0.0), 20.0, epsilon = 1e-12);
    }
}
