use nalgebra::{Matrix3, Rotation3, Vector3};

use crate::constants::{JulianDate, Radian, DPI, OBLIQUITY_MEEUS_DEG, RADEG, RADSEC};
use crate::time::centuries_since_j2000;

/// Principal axis of a frame rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Mean obliquity of the ecliptic (IAU 1976 polynomial), in radians.
///
/// Arguments
/// ---------
/// * `jd`: Julian Date (TT)
///
/// Return
/// ------
/// * `ε = 23°26′21.448″ − 46.815″ T − 0.0006″ T² + 0.00181″ T³`
///
/// # See also
/// * [`equatorial_to_ecliptic`] – uses the J2000 value of this angle
pub fn obleq(jd: JulianDate) -> Radian {
    let ob0 = OBLIQUITY_MEEUS_DEG * RADEG;
    let ob1 = -46.815 * RADSEC;
    let ob2 = -0.0006 * RADSEC;
    let ob3 = 0.00181 * RADSEC;

    let t = centuries_since_j2000(jd);

    ((ob3 * t + ob2) * t + ob1) * t + ob0
}

/// Active rotation of a vector by `alpha` radians around one principal axis.
///
/// The rotation is counter-clockwise when looking from the tip of the axis toward the origin.
/// A change of basis by `alpha` is the rotation by `-alpha`.
pub fn rotmt(alpha: Radian, axis: Axis) -> Matrix3<f64> {
    let axis = match axis {
        Axis::X => Vector3::x_axis(),
        Axis::Y => Vector3::y_axis(),
        Axis::Z => Vector3::z_axis(),
    };

    Rotation3::from_axis_angle(&axis, alpha).into()
}

/// Precession matrix from the mean equator and equinox of J2000 to those of `jd` (IAU 1976).
///
/// ```text
/// ζ = (0.6406161 + 0.0000839 T + 0.0000050 T²) T   [deg]
/// z = (0.6406161 + 0.0003041 T + 0.0000051 T²) T   [deg]
/// θ = (0.5567530 − 0.0001185 T − 0.0000116 T²) T   [deg]
///
/// P = Rz(z) · Ry(−θ) · Rz(ζ)   (active rotations)
/// ```
///
/// `x_date = P · x_J2000`; the transpose maps back to J2000.
pub fn precession_matrix(jd: JulianDate) -> Matrix3<f64> {
    let zed = 0.6406161 * RADEG;
    let zd = 0.6406161 * RADEG;
    let thd = 0.5567530 * RADEG;

    let zedd = 0.0000839 * RADEG;
    let zdd = 0.0003041 * RADEG;
    let thdd = -0.0001185 * RADEG;

    let zeddd = 0.0000050 * RADEG;
    let zddd = 0.0000051 * RADEG;
    let thddd = -0.0000116 * RADEG;

    let t = centuries_since_j2000(jd);

    let zeta = ((zeddd * t + zedd) * t + zed) * t;
    let z = ((zddd * t + zdd) * t + zd) * t;
    let theta = ((thddd * t + thdd) * t + thd) * t;

    rotmt(z, Axis::Z) * rotmt(-theta, Axis::Y) * rotmt(zeta, Axis::Z)
}

/// Rotate an equatorial J2000 vector into the ecliptic J2000 frame.
///
/// ```text
/// y' =  cos ε · y + sin ε · z
/// z' = −sin ε · y + cos ε · z
/// ```
pub fn equatorial_to_ecliptic(equatorial: &Vector3<f64>) -> Vector3<f64> {
    rotmt(-obleq(crate::constants::J2000), Axis::X) * equatorial
}

/// Inverse of [`equatorial_to_ecliptic`].
pub fn ecliptic_to_equatorial(ecliptic: &Vector3<f64>) -> Vector3<f64> {
    rotmt(obleq(crate::constants::J2000), Axis::X) * ecliptic
}

/// Convert a cartesian vector to right ascension, declination and distance.
///
/// Return
/// ------
/// * `(α, δ, ρ)`: α in radians within `[0, 2π)`, δ in radians within `[−π/2, π/2]`, ρ in the
///   unit of the input. A zero vector gives `(0, 0, 0)`.
pub fn cartesian_to_radec(position: &Vector3<f64>) -> (Radian, Radian, f64) {
    let norm = position.norm();
    if norm == 0.0 {
        return (0.0, 0.0, 0.0);
    }

    let delta = (position.z / norm).clamp(-1.0, 1.0).asin();
    if position.x == 0.0 && position.y == 0.0 {
        return (0.0, delta, norm);
    }

    let alpha = position.y.atan2(position.x);
    let alpha = if alpha < 0.0 { alpha + DPI } else { alpha };
    (alpha, delta, norm)
}

/// Unit vector pointing toward `(ra, dec)`, both in radians.
pub fn radec_to_unit_vector(ra: Radian, dec: Radian) -> Vector3<f64> {
    Vector3::new(dec.cos() * ra.cos(), dec.cos() * ra.sin(), dec.sin())
}

/// Precess J2000 right ascension and declination (radians) to the mean equinox of `jd`.
pub fn precess_radec(ra: Radian, dec: Radian, jd: JulianDate) -> (Radian, Radian) {
    let of_date = precession_matrix(jd) * radec_to_unit_vector(ra, dec);
    let (ra, dec, _) = cartesian_to_radec(&of_date);
    (ra, dec)
}

/// Ecliptic longitude and latitude (radians) of an equatorial J2000 vector, referred to the mean
/// ecliptic and equinox of `jd`.
///
/// The longitude lies in `(−π, π]`.
pub fn ecliptic_lon_lat_of_date(equatorial_j2000: &Vector3<f64>, jd: JulianDate) -> (Radian, Radian) {
    let equatorial_of_date = precession_matrix(jd) * equatorial_j2000;
    let ecliptic_of_date = rotmt(-obleq(jd), Axis::X) * equatorial_of_date;

    let norm = ecliptic_of_date.norm();
    if norm == 0.0 {
        return (0.0, 0.0);
    }
    let longitude = ecliptic_of_date.y.atan2(ecliptic_of_date.x);
    let latitude = (ecliptic_of_date.z / norm).clamp(-1.0, 1.0).asin();

    (longitude, latitude)
}
