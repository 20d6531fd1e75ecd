//! # Constants and type definitions for ephemera
//!
//! This module centralizes the **physical constants**, **conversion factors**, and **common type
//! aliases** used throughout the crate.
//!
//! ## Overview
//!
//! - Astronomical and geophysical constants
//! - Unit conversions (degrees ↔ radians, hours ↔ radians, AU ↔ km)
//! - Reference epochs expressed as Julian Dates
//! - Core type aliases used across the crate
//!
//! These definitions are shared by the propagator, the frame transforms, the JPL store and the
//! orchestrator.

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Number of seconds in a Julian day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Number of days in a Julian century
pub const DAYS_PER_CENTURY: f64 = 36_525.0;

/// Astronomical Unit in kilometers (IAU 2012)
pub const AU: f64 = 149_597_870.7;

/// Julian Date of the J2000.0 epoch (2000-01-01 12:00:00 TT)
pub const J2000: JulianDate = 2_451_545.0;

/// Conversion factor between Julian Date and Modified Julian Date
pub const JDTOMJD: f64 = 2400000.5;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Arcseconds → radians
pub const RADSEC: f64 = std::f64::consts::PI / 648000.0;

/// Hours → radians
pub const RADH: f64 = DPI / 24.0;

/// Earth equatorial radius in meters (GRS1980/WGS84)
pub const EARTH_MAJOR_AXIS: f64 = 6_378_137.0;

/// Earth polar radius in meters (GRS1980/WGS84)
pub const EARTH_MINOR_AXIS: f64 = 6_356_752.3;

/// Earth radius expressed in astronomical units
pub const ERAU: f64 = (EARTH_MAJOR_AXIS / 1000.) / AU;

/// Gaussian gravitational constant k (used in classical orbit dynamics)
pub const GAUSS_GRAV: f64 = 0.01720209895;

/// k², the heliocentric gravitational parameter in AU³/day²
pub const GAUSS_GRAV_SQUARED: f64 = GAUSS_GRAV * GAUSS_GRAV;

/// Speed of light in km/s
pub const VLIGHT: f64 = 2.99792458e5;

/// Speed of light in astronomical units per day
pub const VLIGHT_AU: f64 = VLIGHT / AU * SECONDS_PER_DAY;

/// Mean obliquity of the ecliptic at J2000.0 used by the analytic propagator (degrees)
pub const OBLIQUITY_J2000_DEG: Degree = 23.43929111;

/// Mean obliquity of the ecliptic at J2000.0 from Meeus (22.2), 23°26′21.448″ (degrees)
pub const OBLIQUITY_MEEUS_DEG: Degree = 23. + 26. / 60. + 21.448 / 3600.;

/// Ratio of the sidereal to the solar rotation rate of the Earth
pub const SIDEREAL_RATE: f64 = 1.0027379093;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in arcseconds
pub type ArcSec = f64;
/// Angle in arcminutes
pub type ArcMin = f64;
/// Angle in radians
pub type Radian = f64;
/// Angle or time in hours
pub type Hour = f64;
/// Distance in kilometers
pub type Kilometer = f64;
/// Distance in meters
pub type Meter = f64;
/// Julian Date (days)
pub type JulianDate = f64;
/// Modified Julian Date (days)
pub type MJD = f64;
