//! # Keplerian elements of the major planets
//!
//! [`OrbitalElements`] holds the six classical elements of a heliocentric elliptic orbit, the
//! epoch they refer to, and the photometric and physical parameters the engine needs to derive
//! magnitudes and sizes.
//!
//! The built-in catalog uses the JPL "Keplerian Elements for Approximate Positions of the Major
//! Planets" J2000 mean elements (valid 1800 AD – 2050 AD). They are published as
//! `(a, e, I, L, ϖ, Ω)`: mean longitude `L` and longitude of perihelion `ϖ` instead of mean
//! anomaly and argument of perihelion. [`OrbitalElements::from_mean_longitudes`] converts them once
//! with `ω = ϖ − Ω` and `M = L − ϖ`.
//!
//! The Sun and the Moon have no entry: their positions come from the dedicated series of
//! [`crate::propagator::sun_moon`]. The Earth entry is the Earth–Moon barycentre orbit; the
//! propagated Earth position comes from the solar series instead.
use std::fmt;

use crate::{
    bodies::Body,
    constants::{Degree, JulianDate, Radian, J2000, RADEG},
    kepler::principal_angle,
    photometry::{photometry_of, physical_properties_of, Photometry, PhysicalProperties},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitalElements {
    pub reference_epoch: JulianDate,      // Reference epoch (JD, TT)
    pub semi_major_axis: f64,             // Semi-major axis (AU)
    pub eccentricity: f64,                // Eccentricity (0 <= e < 1)
    pub inclination: Radian,              // Inclination on the J2000 ecliptic (rad)
    pub ascending_node_longitude: Radian, // Longitude of ascending node (rad)
    pub periapsis_argument: Radian,       // Argument of perihelion (rad)
    pub mean_anomaly: Radian,             // Mean anomaly at the reference epoch (rad)
    pub photometry: Photometry,
    pub physical: PhysicalProperties,
}

impl OrbitalElements {
    /// Build elements from the published form `(a, e, I, L, ϖ, Ω)`, angles in degrees.
    ///
    /// Arguments
    /// ---------
    /// * `epoch`: reference epoch of the elements (JD)
    /// * `a`: semi-major axis (AU)
    /// * `e`: eccentricity
    /// * `i`: inclination (deg)
    /// * `mean_longitude`: `L` (deg)
    /// * `perihelion_longitude`: `ϖ` (deg)
    /// * `node`: `Ω` (deg)
    /// * `photometry`, `physical`: parameters attached to the body
    ///
    /// Return
    /// ------
    /// * elements with `ω = ϖ − Ω` and `M = L − ϖ`, both wrapped into [0, 2π)
    #[allow(clippy::too_many_arguments)]
    pub fn from_mean_longitudes(
        epoch: JulianDate,
        a: f64,
        e: f64,
        i: Degree,
        mean_longitude: Degree,
        perihelion_longitude: Degree,
        node: Degree,
        photometry: Photometry,
        physical: PhysicalProperties,
    ) -> Self {
        OrbitalElements {
            reference_epoch: epoch,
            semi_major_axis: a,
            eccentricity: e,
            inclination: i * RADEG,
            ascending_node_longitude: principal_angle(node * RADEG),
            periapsis_argument: principal_angle((perihelion_longitude - node) * RADEG),
            mean_anomaly: principal_angle((mean_longitude - perihelion_longitude) * RADEG),
            photometry,
            physical,
        }
    }

    /// Catalog elements of a body, `None` for the Sun and the Moon.
    ///
    /// [`Body::Earth`] resolves to the Earth–Moon barycentre.
    pub fn of(body: Body) -> Option<Self> {
        // a, e, I, L, long.peri., long.node
        let (a, e, i, l, varpi, node) = match body {
            Body::Mercury => (
                0.38709927,
                0.20563593,
                7.00497902,
                252.25032350,
                77.45779628,
                48.33076593,
            ),
            Body::Venus => (
                0.72333566,
                0.00677672,
                3.39467605,
                181.97909950,
                131.60246718,
                76.67984255,
            ),
            Body::Earth => (
                1.00000261,
                0.01671123,
                -0.00001531,
                100.46457166,
                102.93768193,
                0.0,
            ),
            Body::Mars => (
                1.52371034,
                0.09339410,
                1.84969142,
                -4.55343205,
                -23.94362959,
                49.55953891,
            ),
            Body::Jupiter => (
                5.20288700,
                0.04838624,
                1.30439695,
                34.39644051,
                14.72847983,
                100.47390909,
            ),
            Body::Saturn => (
                9.53667594,
                0.05386179,
                2.48599187,
                49.95424423,
                92.59887831,
                113.66242448,
            ),
            Body::Uranus => (
                19.18916464,
                0.04725744,
                0.77263783,
                313.23810451,
                170.95427630,
                74.01692503,
            ),
            Body::Neptune => (
                30.06992276,
                0.00859048,
                1.77004347,
                -55.12002969,
                44.96476227,
                131.78422574,
            ),
            Body::Pluto => (
                39.48211675,
                0.24882730,
                17.14001206,
                238.92903833,
                224.06891629,
                110.30393684,
            ),
            Body::Sun | Body::Moon => return None,
        };

        Some(OrbitalElements::from_mean_longitudes(
            J2000,
            a,
            e,
            i,
            l,
            varpi,
            node,
            photometry_of(body),
            physical_properties_of(body),
        ))
    }

    /// Orbital period in days for a heliocentric orbit.
    pub fn period(&self) -> f64 {
        crate::constants::DPI / self.mean_motion()
    }

    /// Mean motion `n = sqrt(k² / a³)` in radians per day.
    pub fn mean_motion(&self) -> f64 {
        (crate::constants::GAUSS_GRAV_SQUARED / self.semi_major_axis.powi(3)).sqrt()
    }
}

impl fmt::Display for OrbitalElements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Keplerian elements @ JD {:.1}", self.reference_epoch)?;
        writeln!(f, "  a    = {:.8} AU", self.semi_major_axis)?;
        writeln!(f, "  e    = {:.8}", self.eccentricity)?;
        writeln!(f, "  i    = {:.6}°", self.inclination / RADEG)?;
        writeln!(f, "  Ω    = {:.6}°", self.ascending_node_longitude / RADEG)?;
        writeln!(f, "  ω    = {:.6}°", self.periapsis_argument / RADEG)?;
        write!(f, "  M    = {:.6}°", self.mean_anomaly / RADEG)
    }
}
