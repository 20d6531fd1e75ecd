//! Low-precision series for the Sun and the Moon.
//!
//! Both routines are truncated versions of the theories in Meeus, *Astronomical Algorithms*:
//!
//! * **Sun** (chapter 25, "low accuracy"): mean longitude and equation of the centre, about
//!   0.01° in longitude.
//! * **Moon** (chapter 47): the five fundamental arguments with the six largest longitude terms,
//!   four latitude terms and the main distance terms. Expect errors of a few tenths of a degree
//!   and a few hundred kilometres. This is not DE-grade; use the JPL store when it matters.
//!
//! Results are geocentric, referred to the mean equator and equinox of J2000, in AU. The
//! ecliptic longitude of date is brought back to J2000 with the general precession in longitude
//! (1.397° per century); the small change of latitude is neglected.
use nalgebra::Vector3;

use crate::{
    constants::{Degree, JulianDate, Kilometer, AU, OBLIQUITY_J2000_DEG, RADEG},
    ref_system::{rotmt, Axis},
    sky_coords::normalize_angle,
    time::centuries_since_j2000,
};

/// General precession in ecliptic longitude, degrees per Julian century
const PRECESSION_IN_LONGITUDE: Degree = 1.397;

/// Geocentric ecliptic coordinates referred to the equinox of date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EclipticOfDate {
    pub longitude: Degree,
    pub latitude: Degree,
    pub distance: f64,
}

/// Geometric ecliptic longitude (of date, degrees) and radius vector (AU) of the Sun.
pub fn sun_ecliptic_of_date(jd: JulianDate) -> EclipticOfDate {
    let t = centuries_since_j2000(jd);

    let mean_longitude = 280.46646 + 36000.76983 * t + 0.0003032 * t * t;
    let mean_anomaly = 357.52911 + 35999.05029 * t - 0.0001537 * t * t;
    let eccentricity = 0.016708634 - 0.000042037 * t - 0.0000001267 * t * t;

    let m = mean_anomaly * RADEG;
    let centre = (1.914602 - 0.004817 * t - 0.000014 * t * t) * m.sin()
        + (0.019993 - 0.000101 * t) * (2.0 * m).sin()
        + 0.000289 * (3.0 * m).sin();

    let true_anomaly = (mean_anomaly + centre) * RADEG;
    let radius = 1.000001018 * (1.0 - eccentricity * eccentricity)
        / (1.0 + eccentricity * true_anomaly.cos());

    EclipticOfDate {
        longitude: normalize_angle(mean_longitude + centre, 0.0, 360.0),
        latitude: 0.0,
        distance: radius,
    }
}

/// Geocentric ecliptic longitude, latitude (degrees, of date) and distance (km) of the Moon.
pub fn moon_ecliptic_of_date(jd: JulianDate) -> EclipticOfDate {
    let t = centuries_since_j2000(jd);
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;

    let mean_longitude =
        218.3164477 + 481267.88123421 * t - 0.0015786 * t2 + t3 / 538841.0 - t4 / 65194000.0;
    let elongation =
        297.8501921 + 445267.1114034 * t - 0.0018819 * t2 + t3 / 545868.0 - t4 / 113065000.0;
    let sun_anomaly = 357.5291092 + 35999.0502909 * t - 0.0001536 * t2 + t3 / 24490000.0;
    let moon_anomaly =
        134.9633964 + 477198.8675055 * t + 0.0087414 * t2 + t3 / 69699.0 - t4 / 14712000.0;
    let latitude_argument =
        93.2720950 + 483202.0175233 * t - 0.0036539 * t2 - t3 / 3526000.0 + t4 / 863310000.0;

    let d = elongation * RADEG;
    let m = sun_anomaly * RADEG;
    let mp = moon_anomaly * RADEG;
    let f = latitude_argument * RADEG;

    let longitude = mean_longitude
        + 6.288774 * mp.sin()
        + 1.274027 * (2.0 * d - mp).sin()
        + 0.658314 * (2.0 * d).sin()
        + 0.213618 * (2.0 * mp).sin()
        - 0.185116 * m.sin()
        - 0.114332 * (2.0 * f).sin();

    let latitude = 5.128122 * f.sin()
        + 0.280602 * (mp + f).sin()
        + 0.277693 * (mp - f).sin()
        + 0.173237 * (2.0 * d - f).sin();

    let distance: Kilometer = 385000.56
        - 20905.355 * mp.cos()
        - 3699.111 * (2.0 * d - mp).cos()
        - 2955.968 * (2.0 * d).cos()
        - 569.925 * (2.0 * mp).cos();

    EclipticOfDate {
        longitude: normalize_angle(longitude, 0.0, 360.0),
        latitude,
        distance,
    }
}

/// Ecliptic spherical coordinates of date → equatorial J2000 cartesian vector.
fn of_date_to_equatorial_j2000(coords: &EclipticOfDate, distance_au: f64, jd: JulianDate) -> Vector3<f64> {
    let longitude =
        (coords.longitude - PRECESSION_IN_LONGITUDE * centuries_since_j2000(jd)) * RADEG;
    let latitude = coords.latitude * RADEG;

    let ecliptic = Vector3::new(
        distance_au * latitude.cos() * longitude.cos(),
        distance_au * latitude.cos() * longitude.sin(),
        distance_au * latitude.sin(),
    );
    rotmt(OBLIQUITY_J2000_DEG * RADEG, Axis::X) * ecliptic
}

/// Geocentric position of the Sun, equatorial J2000, AU.
pub fn sun_geocentric(jd: JulianDate) -> Vector3<f64> {
    let sun = sun_ecliptic_of_date(jd);
    of_date_to_equatorial_j2000(&sun, sun.distance, jd)
}

/// Geocentric position of the Moon, equatorial J2000, AU.
pub fn moon_geocentric(jd: JulianDate) -> Vector3<f64> {
    let moon = moon_ecliptic_of_date(jd);
    of_date_to_equatorial_j2000(&moon, moon.distance / AU, jd)
}
