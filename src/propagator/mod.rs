//! # Analytic orbit propagation
//!
//! Heliocentric positions of the major planets from Keplerian elements, plus the low-precision
//! Sun and Moon series of [`sun_moon`]. The Earth is the reflection of the geocentric Sun, so
//! the solar series sets every geocentric direction of the analytic path.
//!
//! Pipeline for a planet at Julian Date `jd`:
//!
//! 1. `M = M₀ + n·(jd − epoch)` with `n = sqrt(k²/a³)` rad/day, wrapped into [0, 2π)
//! 2. eccentric anomaly from [`crate::kepler::solve_kepler`]
//! 3. orbital-plane position `(a(cos E − e), a·sqrt(1 − e²)·sin E)`
//! 4. rotation by ω, i and Ω into the J2000 ecliptic
//! 5. rotation by the J2000 obliquity (23.43929111°) into the J2000 equator
//!
//! Accuracy is that of the mean elements: a few arcminutes for the inner planets over a few
//! decades around J2000, worse for the outer ones.
pub mod sun_moon;

use nalgebra::Vector3;

use crate::{
    bodies::Body,
    constants::{JulianDate, OBLIQUITY_J2000_DEG, RADEG},
    ephem_errors::Result,
    kepler::{principal_angle, solve_kepler, true_anomaly},
    orbital_elements::OrbitalElements,
    ref_system::{rotmt, Axis},
};

/// Heliocentric position, equatorial J2000 frame, AU.
pub type HeliocentricPosition = Vector3<f64>;

/// Heliocentric position in the J2000 ecliptic frame (AU).
///
/// Arguments
/// ---------
/// * `elements`: the orbit
/// * `jd`: Julian Date (TT) of the requested position
///
/// Return
/// ------
/// * the ecliptic position, or the solver error for an unsupported eccentricity or a
///   non-converging Kepler solution
pub fn ecliptic_position(elements: &OrbitalElements, jd: JulianDate) -> Result<Vector3<f64>> {
    let dt = jd - elements.reference_epoch;
    let mean_anomaly = principal_angle(elements.mean_anomaly + elements.mean_motion() * dt);

    let e = elements.eccentricity;
    let ecc_anomaly = solve_kepler(mean_anomaly, e)?;

    let a = elements.semi_major_axis;
    let radius = a * (1.0 - e * ecc_anomaly.cos());
    let nu = true_anomaly(ecc_anomaly, e);

    let in_plane = Vector3::new(radius * nu.cos(), radius * nu.sin(), 0.0);

    let to_ecliptic = rotmt(elements.ascending_node_longitude, Axis::Z)
        * rotmt(elements.inclination, Axis::X)
        * rotmt(elements.periapsis_argument, Axis::Z);

    Ok(to_ecliptic * in_plane)
}

/// Heliocentric position in the J2000 equatorial frame (AU).
///
/// See [`ecliptic_position`] for the error cases.
pub fn heliocentric_position(
    elements: &OrbitalElements,
    jd: JulianDate,
) -> Result<HeliocentricPosition> {
    let ecliptic = ecliptic_position(elements, jd)?;
    Ok(rotmt(OBLIQUITY_J2000_DEG * RADEG, Axis::X) * ecliptic)
}

/// Heliocentric equatorial J2000 position of any body (AU).
///
/// * the Sun is the origin;
/// * the Earth is opposite the geocentric solar series;
/// * the Moon is the Earth position plus the geocentric lunar series.
pub fn body_heliocentric(body: Body, jd: JulianDate) -> Result<HeliocentricPosition> {
    match body {
        Body::Sun => Ok(Vector3::zeros()),
        Body::Earth => Ok(-sun_moon::sun_geocentric(jd)),
        Body::Moon => Ok(body_heliocentric(Body::Earth, jd)? + sun_moon::moon_geocentric(jd)),
        _ => match OrbitalElements::of(body) {
            Some(elements) => heliocentric_position(&elements, jd),
            None => Err(crate::ephem_errors::EphemError::UnknownBody(
                body.name().to_string(),
            )),
        },
    }
}
