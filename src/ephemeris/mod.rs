//! # Ephemeris runs
//!
//! A run walks the time range of an [`request::EphemerisRequest`] and, at each step, derives the
//! [`body_state::BodyEphemeris`] of every requested body, then hands the step to an
//! [`writer::EphemerisWriter`].
//!
//! Positions come from an [`engine::Engine`]: the analytic elements or a JPL DE file. Both feed
//! the same derivation ([`body_state::evaluate_body`]), so switching precision only changes
//! the positions.
//!
//! Parallel runs
//! -------------
//! With [`request::Parallelism::Threads`], the bodies of a step are split between workers of a
//! dedicated rayon pool. Each worker owns a clone of the engine (its own file handle and record
//! cache) for the whole run and results are gathered in request order, so the output is
//! byte-identical to a sequential run.
//!
//! ```rust
//! use ephemera::{bodies::Body, ephemeris::{run, engine::Engine, request::EphemerisRequest}};
//!
//! let request = EphemerisRequest::builder()
//!     .time_range(2451545.0, 2451547.0, 1.0)
//!     .bodies([Body::Mars])
//!     .build()
//!     .unwrap();
//! let mut out = Vec::new();
//! let summary = run(&request, &mut Engine::orbital(), &mut out).unwrap();
//! assert_eq!(summary.steps, 2);
//! ```
pub mod body_state;
pub mod engine;
pub mod request;
pub mod writer;

use std::{io::Write, time::Instant};

use rayon::prelude::*;

use crate::{
    bodies::Body,
    constants::JulianDate,
    ephem_errors::Result,
};

use self::{
    body_state::{BodyEphemeris, DerivationContext},
    engine::Engine,
    request::{EphemerisRequest, Parallelism},
    writer::EphemerisWriter,
};

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub steps: usize,
    pub bodies: usize,
}

/// Evaluates the bodies of one step, sequentially or on a pool of per-worker engines.
enum Stepper<'a> {
    Sequential(&'a mut Engine),
    Pool {
        pool: rayon::ThreadPool,
        workers: Vec<Engine>,
    },
}

impl Stepper<'_> {
    fn evaluate(
        &mut self,
        bodies: &[Body],
        jd: JulianDate,
        ctx: &DerivationContext,
    ) -> Result<Vec<BodyEphemeris>> {
        match self {
            Stepper::Sequential(engine) => bodies
                .iter()
                .map(|&body| engine.evaluate(body, jd, ctx))
                .collect(),
            Stepper::Pool { pool, workers } => {
                let chunk = bodies.len().div_ceil(workers.len());
                let per_worker: Vec<Vec<Result<BodyEphemeris>>> = pool.install(|| {
                    workers
                        .par_iter_mut()
                        .zip(bodies.par_chunks(chunk))
                        .map(|(engine, chunk)| {
                            chunk
                                .iter()
                                .map(|&body| engine.evaluate(body, jd, ctx))
                                .collect()
                        })
                        .collect()
                });
                per_worker.into_iter().flatten().collect()
            }
        }
    }
}

/// Derivation options of a step.
fn step_context(request: &EphemerisRequest, jd: JulianDate) -> DerivationContext {
    DerivationContext {
        ra_dec_epoch: request.ra_dec_epoch(),
        topocentric: request.topocentric().copied(),
    }
    .at(jd)
}

/// Compute every step of a request and write it to `out`.
///
/// Arguments
/// ---------
/// * `request`: a validated request
/// * `engine`: the position backend, cloned once per worker for parallel runs
/// * `out`: text or binary sink, flushed before returning, error or not
///
/// Return
/// ------
/// * The number of steps and bodies written, or the first error: a failing body aborts the
///   run after the steps already written have been flushed.
pub fn run<W: Write>(
    request: &EphemerisRequest,
    engine: &mut Engine,
    out: W,
) -> Result<RunSummary> {
    let started = Instant::now();
    let mut writer = EphemerisWriter::new(out, request.format(), request.binary());
    let bodies = request.bodies();

    let mut stepper = match request.parallelism() {
        Parallelism::Sequential => Stepper::Sequential(engine),
        Parallelism::Threads(threads) => {
            let threads = threads.min(bodies.len()).max(1);
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()?;
            let workers = (0..threads)
                .map(|_| engine.try_clone())
                .collect::<Result<Vec<_>>>()?;
            log::debug!("running on {threads} worker threads");
            Stepper::Pool { pool, workers }
        }
    };

    let steps = request.steps();
    for k in 0..steps {
        let jd = request.jd_at(k);
        let records = match stepper.evaluate(bodies, jd, &step_context(request, jd)) {
            Ok(records) => records,
            Err(err) => {
                writer.flush()?;
                log::error!("step {k} (JD {jd}) failed after {} steps", writer.steps_written());
                return Err(err);
            }
        };
        writer.write_step(jd, &records)?;
    }
    writer.flush()?;

    log::info!(
        "{} steps of {} bodies ({} precision) in {:.3?}",
        steps,
        bodies.len(),
        engine_precision(&stepper),
        started.elapsed()
    );
    Ok(RunSummary {
        steps,
        bodies: bodies.len(),
    })
}

fn engine_precision(stepper: &Stepper<'_>) -> String {
    match stepper {
        Stepper::Sequential(engine) => engine.precision().to_string(),
        Stepper::Pool { workers, .. } => workers
            .first()
            .map(|engine| engine.precision().to_string())
            .unwrap_or_default(),
    }
}

/// One body at one date, geocentric, RA/Dec referred to J2000.
pub fn lookup(engine: &mut Engine, body: Body, jd: JulianDate) -> Result<BodyEphemeris> {
    engine.evaluate(body, jd, &DerivationContext::default())
}
