use crate::{
    constants::{Radian, DPI},
    ephem_errors::{EphemError, Result},
};

/// Iteration budget of each phase of the solver (fixed point, then Newton).
pub const KEPLER_MAX_ITERATIONS: usize = 10;

/// Residual under which the fixed-point iteration stops early.
const FIXED_POINT_TOLERANCE: f64 = 1e-12;

/// Residual under which a solution is accepted.
const ACCEPT_TOLERANCE: f64 = 1e-8;

/// Return the principal value of an angle in radians, in [0, 2π).
pub fn principal_angle(a: Radian) -> Radian {
    let wrapped = a.rem_euclid(DPI);
    if wrapped >= DPI {
        0.0
    } else {
        wrapped
    }
}

/// Residual of Kepler's equation `E − e·sin E − M`.
fn kepler_residual(ecc_anomaly: Radian, eccentricity: f64, mean_anomaly: Radian) -> f64 {
    ecc_anomaly - eccentricity * ecc_anomaly.sin() - mean_anomaly
}

/// Solve Kepler's equation `M = E − e·sin E` for the eccentric anomaly of an elliptic orbit.
///
/// The solver first runs the fixed-point iteration `E ← M + e·sin E` seeded at `E₀ = M` for at
/// most [`KEPLER_MAX_ITERATIONS`] steps, leaving early once the residual drops below 1e-12.
/// Fixed-point iteration contracts at rate `e`, so for high eccentricities the residual may still
/// be above 1e-8 when the budget is spent; Newton's method then refines the estimate for at most
/// [`KEPLER_MAX_ITERATIONS`] further steps.
///
/// Arguments
/// ---------
/// * `mean_anomaly`: mean anomaly M in radians (any real value, normalized internally)
/// * `eccentricity`: orbital eccentricity, `0 <= e < 1`
///
/// Return
/// ------
/// * the eccentric anomaly E in radians, consistent with the normalized mean anomaly
///
/// Errors
/// ------
/// * [`EphemError::UnsupportedEccentricity`] when `e` is negative, `>= 1` or NaN
/// * [`EphemError::KeplerSolverFailure`] when the residual is still above 1e-8 after both phases
pub fn solve_kepler(mean_anomaly: Radian, eccentricity: f64) -> Result<Radian> {
    if !(0.0..1.0).contains(&eccentricity) {
        return Err(EphemError::UnsupportedEccentricity(eccentricity));
    }

    let mean_anomaly = principal_angle(mean_anomaly);
    if eccentricity == 0.0 {
        return Ok(mean_anomaly);
    }

    let mut ecc_anomaly = mean_anomaly;
    let mut residual = kepler_residual(ecc_anomaly, eccentricity, mean_anomaly);

    for _ in 0..KEPLER_MAX_ITERATIONS {
        if residual.abs() < FIXED_POINT_TOLERANCE {
            break;
        }
        ecc_anomaly = mean_anomaly + eccentricity * ecc_anomaly.sin();
        residual = kepler_residual(ecc_anomaly, eccentricity, mean_anomaly);
    }

    if residual.abs() >= ACCEPT_TOLERANCE {
        for _ in 0..KEPLER_MAX_ITERATIONS {
            let derivative = 1.0 - eccentricity * ecc_anomaly.cos();
            ecc_anomaly -= residual / derivative;
            residual = kepler_residual(ecc_anomaly, eccentricity, mean_anomaly);
            if residual.abs() < FIXED_POINT_TOLERANCE {
                break;
            }
        }
    }

    if residual.abs() < ACCEPT_TOLERANCE {
        Ok(ecc_anomaly)
    } else {
        Err(EphemError::KeplerSolverFailure {
            eccentricity,
            mean_anomaly,
            residual,
        })
    }
}

/// True anomaly from the eccentric anomaly, in `(−π, π]`.
pub fn true_anomaly(ecc_anomaly: Radian, eccentricity: f64) -> Radian {
    let beta = (1.0 - eccentricity * eccentricity).sqrt();
    (beta * ecc_anomaly.sin()).atan2(ecc_anomaly.cos() - eccentricity)
}
