//! Apparent magnitude, illuminated phase and angular size.
//!
//! The photometric model is deliberately simple: an absolute magnitude `H`, a linear
//! phase-darkening coefficient applied to the illuminated fraction, and a reference angular size
//! at 1 AU. It is consistent across the analytic and the JPL paths so that switching precision
//! mode only changes the positions.
use nalgebra::Vector3;
use serde::Serialize;

use crate::{
    bodies::Body,
    constants::{ArcSec, Kilometer},
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Photometry {
    /// Magnitude at 1 AU from both the Sun and the observer, full phase
    pub absolute_magnitude: f64,
    /// Multiplier of `−2.5·log10(phase)`
    pub phase_coefficient: f64,
    /// Apparent diameter at 1 AU (arcseconds)
    pub angular_size_at_1au: ArcSec,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhysicalProperties {
    /// Mean diameter (km)
    pub diameter: Kilometer,
    /// Geometric albedo
    pub albedo: f64,
}

/// Magnitude, phase and size of a body as seen by an observer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Appearance {
    pub magnitude: f64,
    pub phase: f64,
    pub angular_size: ArcSec,
}

pub fn photometry_of(body: Body) -> Photometry {
    let (absolute_magnitude, phase_coefficient, angular_size_at_1au) = match body {
        Body::Sun => (-26.74, 0.0, 1919.26),
        Body::Mercury => (-0.6, 3.8, 6.74),
        Body::Venus => (-4.6, 0.65, 16.92),
        Body::Earth => (-3.99, 1.0, 17.57),
        Body::Mars => (-1.52, 1.6, 9.36),
        Body::Jupiter => (-9.4, 0.0, 196.74),
        Body::Saturn => (-8.88, 0.0, 165.6),
        Body::Uranus => (-7.19, 0.0, 70.5),
        Body::Neptune => (-6.87, 0.0, 68.3),
        Body::Pluto => (-1.0, 0.0, 3.28),
        Body::Moon => (0.21, 1.0, 4.79),
    };
    Photometry {
        absolute_magnitude,
        phase_coefficient,
        angular_size_at_1au,
    }
}

pub fn physical_properties_of(body: Body) -> PhysicalProperties {
    let (diameter, albedo) = match body {
        Body::Sun => (1_392_700.0, 0.0),
        Body::Mercury => (4_879.4, 0.142),
        Body::Venus => (12_103.6, 0.689),
        Body::Earth => (12_742.0, 0.434),
        Body::Mars => (6_779.0, 0.170),
        Body::Jupiter => (139_820.0, 0.538),
        Body::Saturn => (116_460.0, 0.499),
        Body::Uranus => (50_724.0, 0.488),
        Body::Neptune => (49_244.0, 0.442),
        Body::Pluto => (2_376.6, 0.52),
        Body::Moon => (3_474.8, 0.12),
    };
    PhysicalProperties { diameter, albedo }
}

/// Illuminated fraction of the disc, `(1 + cos α) / 2`.
///
/// `α` is the Sun–object–observer angle computed from the three positions (any common origin);
/// its cosine is clamped to [−1, 1] before use.
pub fn phase_fraction(
    object: &Vector3<f64>,
    observer: &Vector3<f64>,
    sun: &Vector3<f64>,
) -> f64 {
    let to_observer = observer - object;
    let to_sun = sun - object;
    let norms = to_observer.norm() * to_sun.norm();
    if norms == 0.0 {
        return 1.0;
    }
    let cos_alpha = (to_observer.dot(&to_sun) / norms).clamp(-1.0, 1.0);
    (1.0 + cos_alpha) / 2.0
}

/// Apparent magnitude `H + 5·log10(r·Δ) − 2.5·log10(phase)·coefficient`.
///
/// A zero phase with a non-zero coefficient yields `+∞` (the body is unlit).
pub fn apparent_magnitude(
    photometry: &Photometry,
    sun_distance: f64,
    observer_distance: f64,
    phase: f64,
) -> f64 {
    let mut magnitude =
        photometry.absolute_magnitude + 5.0 * (sun_distance * observer_distance).log10();
    if photometry.phase_coefficient != 0.0 {
        magnitude -= 2.5 * phase.log10() * photometry.phase_coefficient;
    }
    magnitude
}

/// Apparent diameter in arcseconds at the given distance (AU).
pub fn angular_size(photometry: &Photometry, observer_distance: f64) -> ArcSec {
    photometry.angular_size_at_1au / observer_distance
}

/// Magnitude, phase and angular size of a body.
///
/// Arguments
/// ---------
/// * `body`: the observed body
/// * `object`, `observer`, `sun`: positions (AU) sharing one origin and frame
///
/// Return
/// ------
/// * The [`Appearance`] of the body. The Sun is always at full phase with
///   `mag = H + 5·log10(Δ)`.
pub fn appearance(
    body: Body,
    object: &Vector3<f64>,
    observer: &Vector3<f64>,
    sun: &Vector3<f64>,
) -> Appearance {
    let photometry = photometry_of(body);
    let observer_distance = (object - observer).norm();

    if body == Body::Sun {
        return Appearance {
            magnitude: photometry.absolute_magnitude + 5.0 * observer_distance.log10(),
            phase: 1.0,
            angular_size: angular_size(&photometry, observer_distance),
        };
    }

    let sun_distance = (object - sun).norm();
    let phase = phase_fraction(object, observer, sun);
    Appearance {
        magnitude: apparent_magnitude(&photometry, sun_distance, observer_distance, phase),
        phase,
        angular_size: angular_size(&photometry, observer_distance),
    }
}

#[cfg(test)]
mod photometry_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_phase_fraction() {
        let sun = Vector3::zeros();
        let object = Vector3::new(1.5, 0.0, 0.0);

        // Opposition: observer between the Sun and the object
        let earth = Vector3::new(1.0, 0.0, 0.0);
        assert_eq!(phase_fraction(&object, &earth, &sun), 1.0);

        // Conjunction behind the Sun: the object shows its lit face too
        let earth = Vector3::new(-1.0, 0.0, 0.0);
        assert_eq!(phase_fraction(&object, &earth, &sun), 1.0);

        // Inferior conjunction: the dark side faces the observer
        let inner = Vector3::new(0.7, 0.0, 0.0);
        let earth = Vector3::new(1.0, 0.0, 0.0);
        assert_eq!(phase_fraction(&inner, &earth, &sun), 0.0);

        // Quadrature seen from the object: half lit
        let earth = Vector3::new(1.5, 1.0, 0.0);
        assert_relative_eq!(phase_fraction(&object, &earth, &sun), 0.5, epsilon = 1e-15);
    }

    #[test]
    fn test_magnitude_formula() {
        let jupiter = photometry_of(Body::Jupiter);
        // Jupiter at opposition, r = 5.2, Δ = 4.2
        let mag = apparent_magnitude(&jupiter, 5.2, 4.2, 1.0);
        assert_relative_eq!(mag, -9.4 + 5.0 * (5.2f64 * 4.2).log10(), epsilon = 1e-12);
        assert!(mag < -2.0 && mag > -3.0);

        let mars = photometry_of(Body::Mars);
        let full = apparent_magnitude(&mars, 1.5, 0.6, 1.0);
        let gibbous = apparent_magnitude(&mars, 1.5, 0.6, 0.9);
        assert_relative_eq!(gibbous - full, -2.5 * 0.9f64.log10() * 1.6, epsilon = 1e-12);
        assert!(gibbous > full);
    }

    #[test]
    fn test_sun_appearance() {
        let sun = Vector3::zeros();
        let earth = Vector3::new(0.0, 1.0, 0.0);
        let a = appearance(Body::Sun, &sun, &earth, &sun);
        assert_eq!(a.phase, 1.0);
        assert_relative_eq!(a.magnitude, -26.74, epsilon = 1e-12);
        assert_relative_eq!(a.angular_size, 1919.26, epsilon = 1e-9);
    }

    #[test]
    fn test_full_moon() {
        let sun = Vector3::zeros();
        let earth = Vector3::new(1.0, 0.0, 0.0);
        let moon = Vector3::new(1.00257, 0.0, 0.0);
        let a = appearance(Body::Moon, &moon, &earth, &sun);
        assert_eq!(a.phase, 1.0);
        assert_relative_eq!(a.magnitude, -12.74, epsilon = 0.05);
        // About half a degree across
        assert_relative_eq!(a.angular_size, 1864.0, epsilon = 5.0);
    }
}
