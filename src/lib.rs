//! # ephemera
//!
//! Solar-system ephemerides for the Sun, the Moon and the planets, from either a compact set of
//! Keplerian mean elements or a JPL DE binary file read over byte ranges (local disk or HTTP).
//!
//! - [`ephemeris`]: time-stepped runs, per-body derivation and output writers.
//! - [`jpl_ephem`]: the DE binary store.
//! - [`remote_file`]: random access to local and remote files with a bounded handle pool.
//! - [`propagator`], [`kepler`], [`orbital_elements`]: the analytic model.
//! - [`ref_system`], [`sky_coords`], [`time`], [`observer`]: frames and the horizontal sky.
//! - [`sky_view`]: what lies in a given field of view.
pub mod bodies;
pub mod constants;
pub mod ephem_errors;
pub mod ephemeris;
pub mod jpl_ephem;
pub mod kepler;
pub mod observer;
pub mod orbital_elements;
pub mod photometry;
pub mod propagator;
pub mod ref_system;
pub mod remote_file;
pub mod sky_coords;
pub mod sky_view;
pub mod time;
