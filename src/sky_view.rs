//! # Sky view
//!
//! Given where an observer points (azimuth, altitude) and the width of the field of view, list
//! the solar-system bodies and the deep-sky objects that fall inside it, each with normalized
//! view coordinates for display.
//!
//! View coordinates
//! ----------------
//! `view_x = −ΔAz / (fov/2)` and `view_y = −ΔAlt / (fov/2)`, with `ΔAz` wrapped into
//! `[−180, 180)`, both clamped to `[−0.9, 0.9]`. An object is in view when its angular
//! separation from the pointing direction is at most half the field of view.
use camino::Utf8Path;
use serde::Deserialize;

use crate::{
    bodies::Body,
    constants::{ArcSec, Degree, Hour},
    ephem_errors::Result,
    ephemeris::{body_state::DerivationContext, engine::Engine},
    observer::Observer,
    sky_coords::{
        angular_separation, equatorial_to_horizontal, normalize_angle, Horizontal,
        RightAscension,
    },
};

/// Bound of the normalized view coordinates
const VIEW_LIMIT: f64 = 0.9;

/// Where an observer looks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyView {
    pub direction: Horizontal,
    pub field_of_view: Degree,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewProjection {
    /// Angle between the object and the view direction
    pub separation: Degree,
    pub in_view: bool,
    pub view_x: f64,
    pub view_y: f64,
}

impl SkyView {
    pub fn new(azimuth: Degree, altitude: Degree, field_of_view: Degree) -> Self {
        SkyView {
            direction: Horizontal { azimuth, altitude },
            field_of_view,
        }
    }

    pub fn project(&self, target: Horizontal) -> ViewProjection {
        let half = self.field_of_view / 2.0;
        let separation = angular_separation(
            self.direction.azimuth,
            self.direction.altitude,
            target.azimuth,
            target.altitude,
        );
        let d_az = normalize_angle(target.azimuth - self.direction.azimuth, -180.0, 180.0);
        let d_alt = target.altitude - self.direction.altitude;

        ViewProjection {
            separation,
            in_view: separation <= half,
            view_x: (-d_az / half).clamp(-VIEW_LIMIT, VIEW_LIMIT),
            view_y: (-d_alt / half).clamp(-VIEW_LIMIT, VIEW_LIMIT),
        }
    }
}

/// An object of the sky as seen by the observer.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyObject {
    pub name: String,
    pub ra: Hour,
    pub dec: Degree,
    pub horizontal: Horizontal,
    /// Distance from the observer in AU, for solar-system bodies
    pub distance: Option<f64>,
    pub magnitude: f64,
    /// Illuminated fraction, for solar-system bodies
    pub phase: Option<f64>,
    pub angular_size: ArcSec,
    pub projection: ViewProjection,
}

/// A fixed object of a user catalog, one CSV row.
///
/// ```text
/// name,ra_hours,dec_degrees,size_arcmin,magnitude
/// M31,0.712306,41.268750,190.0,3.4
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeepSkyObject {
    pub name: String,
    pub ra_hours: Hour,
    pub dec_degrees: Degree,
    pub size_arcmin: f64,
    pub magnitude: f64,
}

/// Read a deep-sky catalog with a header row.
pub fn load_deep_sky_catalog(path: &Utf8Path) -> Result<Vec<DeepSkyObject>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let catalog = reader
        .deserialize()
        .collect::<std::result::Result<Vec<DeepSkyObject>, csv::Error>>()?;
    log::info!("{} deep-sky objects loaded from {path}", catalog.len());
    Ok(catalog)
}

/// Bodies inside the field of view, evaluated at the observer's epoch.
///
/// RA/Dec are topocentric and referred to the equinox of date, as needed by the horizontal
/// transform. Positions are taken at the TT date of the epoch; the Earth rotation stays on UT.
pub fn visible_bodies(
    engine: &mut Engine,
    observer: &Observer,
    bodies: &[Body],
    view: &SkyView,
) -> Result<Vec<SkyObject>> {
    let jd = observer.epoch().to_jde_tt_days();
    let ctx = DerivationContext {
        ra_dec_epoch: jd,
        topocentric: Some(*observer),
    };

    let mut visible = Vec::new();
    for &body in bodies {
        let ephemeris = engine.evaluate(body, jd, &ctx)?;
        let ra = RightAscension::Degrees(ephemeris.ra_degrees());
        let horizontal = equatorial_to_horizontal(ra, ephemeris.dec_degrees(), observer);
        let projection = view.project(horizontal);
        if !projection.in_view {
            continue;
        }
        visible.push(SkyObject {
            name: body.name().to_string(),
            ra: ra.hours(),
            dec: ephemeris.dec_degrees(),
            horizontal,
            distance: Some(ephemeris.earth_distance),
            magnitude: ephemeris.magnitude,
            phase: Some(ephemeris.phase),
            angular_size: ephemeris.angular_size,
            projection,
        });
    }
    Ok(visible)
}

/// Catalog objects inside the field of view.
pub fn visible_deep_sky(
    catalog: &[DeepSkyObject],
    observer: &Observer,
    view: &SkyView,
) -> Vec<SkyObject> {
    catalog
        .iter()
        .filter_map(|object| {
            let horizontal = equatorial_to_horizontal(
                RightAscension::Hours(object.ra_hours),
                object.dec_degrees,
                observer,
            );
            let projection = view.project(horizontal);
            projection.in_view.then(|| SkyObject {
                name: object.name.clone(),
                ra: object.ra_hours,
                dec: object.dec_degrees,
                horizontal,
                distance: None,
                magnitude: object.magnitude,
                phase: None,
                angular_size: object.size_arcmin * 60.0,
                projection,
            })
        })
        .collect()
}
