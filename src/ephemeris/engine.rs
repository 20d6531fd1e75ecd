use std::time::Duration;

use nalgebra::Vector3;

use crate::{
    bodies::Body,
    constants::JulianDate,
    ephem_errors::Result,
    jpl_ephem::ephem_store::EphemerisStore,
    propagator::body_heliocentric,
    remote_file::VirtualFs,
};

use super::{
    body_state::{evaluate_body, BodyEphemeris, DerivationContext},
    request::{EphemerisRequest, Precision},
};

/// Positions of the bodies in a common inertial frame (equatorial J2000, AU).
///
/// The origin is up to the implementation: the Sun for the analytic model, the solar-system
/// barycentre for the DE files. Only differences of positions are used downstream.
pub trait PositionSource {
    fn position(&mut self, body: Body, jd: JulianDate) -> Result<Vector3<f64>>;
}

/// Keplerian elements plus the analytic lunar series, heliocentric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrbitalSource;

impl PositionSource for OrbitalSource {
    fn position(&mut self, body: Body, jd: JulianDate) -> Result<Vector3<f64>> {
        body_heliocentric(body, jd)
    }
}

impl PositionSource for EphemerisStore {
    fn position(&mut self, body: Body, jd: JulianDate) -> Result<Vector3<f64>> {
        Ok(self.state(body, jd)?.position)
    }
}

/// The position backend selected by a [`Precision`].
#[derive(Debug)]
pub enum Engine {
    Orbital(OrbitalSource),
    Store(EphemerisStore),
}

impl Engine {
    pub fn orbital() -> Self {
        Engine::Orbital(OrbitalSource)
    }

    /// Open a DE file from a local path or an `http(s)://` URL.
    pub fn open_store(location: &str, timeout: Option<Duration>) -> Result<Self> {
        let (fs, name) = VirtualFs::for_location(location, timeout);
        Ok(Engine::Store(EphemerisStore::open(&fs, &name)?))
    }

    /// Engine matching the precision of a request.
    pub fn for_request(request: &EphemerisRequest) -> Result<Self> {
        match (request.precision(), request.ephemeris()) {
            (Precision::Store, Some(location)) => Self::open_store(location, request.timeout()),
            _ => Ok(Self::orbital()),
        }
    }

    pub fn precision(&self) -> Precision {
        match self {
            Engine::Orbital(_) => Precision::Elements,
            Engine::Store(_) => Precision::Store,
        }
    }

    /// Copy for another worker. Store engines get their own file handle.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(match self {
            Engine::Orbital(source) => Engine::Orbital(*source),
            Engine::Store(store) => Engine::Store(store.try_clone()?),
        })
    }

    pub fn evaluate(
        &mut self,
        body: Body,
        jd: JulianDate,
        ctx: &DerivationContext,
    ) -> Result<BodyEphemeris> {
        evaluate_body(self, body, jd, ctx)
    }
}

impl PositionSource for Engine {
    fn position(&mut self, body: Body, jd: JulianDate) -> Result<Vector3<f64>> {
        match self {
            Engine::Orbital(source) => source.position(body, jd),
            Engine::Store(store) => store.position(body, jd),
        }
    }
}
