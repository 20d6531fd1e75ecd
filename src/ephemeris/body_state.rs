use std::f64::consts::PI;

use hifitime::Epoch;
use nalgebra::Vector3;
use smallvec::SmallVec;

use crate::{
    bodies::Body,
    constants::{ArcSec, JulianDate, Meter, Radian, DPI, J2000, RADEG, VLIGHT_AU},
    ephem_errors::{EphemError, Result},
    observer::Observer,
    photometry::{appearance, physical_properties_of},
    ref_system::{
        cartesian_to_radec, ecliptic_lon_lat_of_date, equatorial_to_ecliptic, precess_radec,
        precession_matrix,
    },
};

use super::{
    engine::PositionSource,
    request::{DetailTier, OutputFormat},
};

/// Light-time corrections applied to the observed position
const LIGHT_TIME_ITERATIONS: usize = 2;

/// Per-body output values, at most 17 per step
pub type FieldValues = SmallVec<[f64; 17]>;

/// Options of a derivation beyond the body and the date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivationContext {
    /// Equinox of the reported RA/Dec; J2000 leaves them unprecessed
    pub ra_dec_epoch: JulianDate,
    /// Observe from this place on the Earth surface instead of the geocentre
    pub topocentric: Option<Observer>,
}

impl Default for DerivationContext {
    fn default() -> Self {
        DerivationContext {
            ra_dec_epoch: J2000,
            topocentric: None,
        }
    }
}

impl DerivationContext {
    /// Move the topocentric observer, if any, to `jd`.
    pub fn at(mut self, jd: JulianDate) -> Self {
        if let Some(site) = &mut self.topocentric {
            *site = site.at(Epoch::from_jde_utc(jd));
        }
        self
    }
}

/// Everything the engine reports about one body at one date.
///
/// Positions are in AU in the equatorial J2000 frame, angles in radians unless stated otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyEphemeris {
    pub body: Body,
    pub jd: JulianDate,
    /// Geometric position at `jd`, relative to the origin of the position source
    pub position: Vector3<f64>,
    pub ra: Radian,
    pub dec: Radian,
    pub magnitude: f64,
    pub phase: f64,
    pub angular_size: ArcSec,
    pub physical_size: Meter,
    pub albedo: f64,
    /// Body to Sun (AU)
    pub sun_distance: f64,
    /// Body to observer (AU)
    pub earth_distance: f64,
    /// Angle between the body and the Sun seen by the observer
    pub sun_angular_distance: Radian,
    /// Angle at the Sun between the observer and the body
    pub theta_eso: Radian,
    /// Ecliptic longitude of date, in `(−π, π]`
    pub ecliptic_longitude: Radian,
    /// Ecliptic longitude minus the Sun's, in `(−π, π]`
    pub ecliptic_distance: Radian,
    pub ecliptic_latitude: Radian,
}

impl BodyEphemeris {
    /// Values written for this body in the given output format, in output order.
    pub fn fields(&self, format: OutputFormat) -> FieldValues {
        let mut fields = FieldValues::new();
        let position = match format {
            OutputFormat::Ecliptic => equatorial_to_ecliptic(&self.position),
            OutputFormat::Equatorial(_) => self.position,
        };
        fields.extend(position.iter().copied());

        if format.includes(DetailTier::RaDec) {
            fields.extend([self.ra, self.dec]);
        }
        if format.includes(DetailTier::Photometry) {
            fields.extend([self.magnitude, self.phase, self.angular_size]);
        }
        if format.includes(DetailTier::Physical) {
            fields.extend([
                self.physical_size,
                self.albedo,
                self.sun_distance,
                self.earth_distance,
                self.sun_angular_distance,
                self.theta_eso,
                self.ecliptic_longitude,
                self.ecliptic_distance,
                self.ecliptic_latitude,
            ]);
        }
        fields
    }

    /// Right ascension in degrees
    pub fn ra_degrees(&self) -> f64 {
        self.ra / RADEG
    }

    /// Declination in degrees
    pub fn dec_degrees(&self) -> f64 {
        self.dec / RADEG
    }
}

/// Wrap an angle into `(−π, π]`.
pub(crate) fn wrap_pi(angle: Radian) -> Radian {
    let wrapped = angle.rem_euclid(DPI);
    if wrapped > PI {
        wrapped - DPI
    } else {
        wrapped
    }
}

/// Angle between two vectors, zero when one of them vanishes.
fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>) -> Radian {
    let norms = a.norm() * b.norm();
    if norms == 0.0 {
        return 0.0;
    }
    (a.dot(b) / norms).clamp(-1.0, 1.0).acos()
}

/// Derive the full ephemeris of a body from a position source.
///
/// The observed position is corrected for light time with two iterations, positions of the Sun
/// and of the observer are taken at `jd`. A topocentric site is rotated with the Earth at its
/// own (UT) epoch. Photometry, distances and angles all use the light-time corrected position.
///
/// Arguments
/// ---------
/// * `source`: heliocentric or barycentric positions, equatorial J2000
/// * `body`: any body but the Earth
/// * `jd`: Julian Date of the observation
/// * `ctx`: RA/Dec equinox and optional topocentric observer
///
/// Return
/// ------
/// * The [`BodyEphemeris`], [`EphemError::UnobservableBody`] for the Earth, or the first error
///   of the position source.
pub fn evaluate_body<S: PositionSource + ?Sized>(
    source: &mut S,
    body: Body,
    jd: JulianDate,
    ctx: &DerivationContext,
) -> Result<BodyEphemeris> {
    if body == Body::Earth {
        return Err(EphemError::UnobservableBody(body));
    }

    let earth = source.position(Body::Earth, jd)?;
    let sun = source.position(Body::Sun, jd)?;
    let observer = match &ctx.topocentric {
        Some(site) => {
            let rotation_jd = site.epoch().to_jde_utc_days();
            earth + precession_matrix(jd).transpose() * site.geocentric_position(rotation_jd)
        }
        None => earth,
    };

    let geometric = source.position(body, jd)?;
    let mut object = geometric;
    for _ in 0..LIGHT_TIME_ITERATIONS {
        let light_time = (object - observer).norm() / VLIGHT_AU;
        object = source.position(body, jd - light_time)?;
    }

    let geocentric = object - observer;
    let (mut ra, mut dec, earth_distance) = cartesian_to_radec(&geocentric);
    if ctx.ra_dec_epoch != J2000 {
        (ra, dec) = precess_radec(ra, dec, ctx.ra_dec_epoch);
    }

    let look = appearance(body, &object, &observer, &sun);
    let physical = physical_properties_of(body);

    let sun_from_observer = sun - observer;
    let (sun_angular_distance, theta_eso) = if body == Body::Sun {
        (0.0, 0.0)
    } else {
        (
            angle_between(&geocentric, &sun_from_observer),
            angle_between(&(observer - sun), &(object - sun)),
        )
    };

    let (ecliptic_longitude, ecliptic_latitude) = ecliptic_lon_lat_of_date(&geocentric, jd);
    let (sun_longitude, _) = ecliptic_lon_lat_of_date(&sun_from_observer, jd);

    Ok(BodyEphemeris {
        body,
        jd,
        position: geometric,
        ra,
        dec,
        magnitude: look.magnitude,
        phase: look.phase,
        angular_size: look.angular_size,
        physical_size: physical.diameter * 1000.0,
        albedo: physical.albedo,
        sun_distance: (object - sun).norm(),
        earth_distance,
        sun_angular_distance,
        theta_eso,
        ecliptic_longitude: wrap_pi(ecliptic_longitude),
        ecliptic_distance: wrap_pi(ecliptic_longitude - sun_longitude),
        ecliptic_latitude,
    })
}
