//! # Geographic observer
//!
//! An [`Observer`] bundles the geodetic position of the person (or device) looking at the sky
//! with the instant of the observation. It is the single input of every horizontal-frame
//! transform in [`crate::sky_coords`] and of the topocentric correction applied by the
//! orchestrator.
//!
//! Validity
//! --------
//! Latitude must lie in `[-90, 90]` degrees and longitude in `[-180, 180]` degrees.
//! [`Observer::new`] never fails: out-of-range coordinates produce an observer flagged as invalid
//! (see [`Observer::is_valid`]) and a warning is logged. Use [`Observer::try_new`] to get a typed
//! error instead.
use hifitime::Epoch;
use nalgebra::Vector3;

use crate::{
    constants::{Degree, Meter, AU, EARTH_MAJOR_AXIS, EARTH_MINOR_AXIS, RADEG},
    ephem_errors::{EphemError, Result},
    time::local_sidereal_time_jd,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    latitude: Degree,
    longitude: Degree,
    altitude: Option<Meter>,
    epoch: Epoch,
    valid: bool,
}

fn coordinates_in_range(latitude: Degree, longitude: Degree) -> bool {
    (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude)
}

impl Observer {
    /// Create a new observer.
    ///
    /// Arguments
    /// ---------
    /// * `latitude`: geodetic latitude in degrees, positive north
    /// * `longitude`: longitude in degrees, positive east
    /// * `altitude`: optional height above the WGS84 ellipsoid in meters
    /// * `epoch`: instant of the observation (UTC)
    ///
    /// Return
    /// ------
    /// * An observer; check [`Observer::is_valid`] when the coordinates come from user input.
    pub fn new(latitude: Degree, longitude: Degree, altitude: Option<Meter>, epoch: Epoch) -> Self {
        let valid = coordinates_in_range(latitude, longitude);
        if !valid {
            log::warn!(
                "observer coordinates out of range: latitude {latitude}°, longitude {longitude}°"
            );
        }
        Observer {
            latitude,
            longitude,
            altitude,
            epoch,
            valid,
        }
    }

    /// Create a new observer, rejecting out-of-range coordinates with
    /// [`EphemError::InvalidObserver`].
    pub fn try_new(
        latitude: Degree,
        longitude: Degree,
        altitude: Option<Meter>,
        epoch: Epoch,
    ) -> Result<Self> {
        if !coordinates_in_range(latitude, longitude) {
            return Err(EphemError::InvalidObserver {
                latitude,
                longitude,
            });
        }
        Ok(Observer::new(latitude, longitude, altitude, epoch))
    }

    pub fn latitude(&self) -> Degree {
        self.latitude
    }

    pub fn longitude(&self) -> Degree {
        self.longitude
    }

    pub fn altitude(&self) -> Option<Meter> {
        self.altitude
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The same place at another instant.
    pub fn at(&self, epoch: Epoch) -> Self {
        Observer { epoch, ..*self }
    }

    /// Geocentric position of the observer in AU, in the equatorial frame of date.
    ///
    /// The observer is placed on the WGS84 ellipsoid and rotated by the local sidereal time
    /// computed from `jd_ut`.
    ///
    /// Arguments
    /// ---------
    /// * `jd_ut`: Julian Date (UT) at which the Earth rotation is evaluated
    ///
    /// Return
    /// ------
    /// * the geocentric equatorial position of the observer (AU)
    pub fn geocentric_position(&self, jd_ut: f64) -> Vector3<f64> {
        let lat = self.latitude * RADEG;
        let height = self.altitude.unwrap_or(0.0);

        let axis_ratio = EARTH_MINOR_AXIS / EARTH_MAJOR_AXIS;
        let u = (axis_ratio * lat.tan()).atan();
        let rho_sin = axis_ratio * u.sin() + height / EARTH_MAJOR_AXIS * lat.sin();
        let rho_cos = u.cos() + height / EARTH_MAJOR_AXIS * lat.cos();

        let lst = local_sidereal_time_jd(jd_ut, self.longitude) * RADEG;
        let radius_au = EARTH_MAJOR_AXIS / 1000.0 / AU;

        Vector3::new(
            radius_au * rho_cos * lst.cos(),
            radius_au * rho_cos * lst.sin(),
            radius_au * rho_sin,
        )
    }
}
