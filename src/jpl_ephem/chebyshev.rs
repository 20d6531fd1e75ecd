use nalgebra::Vector3;
use nom::{multi::count, number::complete::le_f64, IResult, Parser};

use crate::{
    constants::JulianDate,
    ephem_errors::{EphemError, Result},
};

use super::{de_header::IptEntry, state_vector::StateVector};

/// Tolerance on the record date span when checking that it covers the requested date
const SPAN_TOLERANCE: f64 = 1e-9;

/// Values of the Chebyshev polynomials `T_k(tc)` and their derivatives `T'_k(tc)`.
///
/// `T_0 = 1`, `T_1 = tc`, `T_k = 2·tc·T_{k−1} − T_{k−2}` and
/// `T'_k = 2·tc·T'_{k−1} + 2·T_{k−1} − T'_{k−2}`.
pub fn chebyshev_basis(tc: f64, n_coeffs: usize) -> (Vec<f64>, Vec<f64>) {
    let mut value = vec![0.0; n_coeffs];
    let mut derivative = vec![0.0; n_coeffs];
    if n_coeffs == 0 {
        return (value, derivative);
    }
    value[0] = 1.0;
    if n_coeffs > 1 {
        value[1] = tc;
        derivative[1] = 1.0;
    }
    let twot = 2.0 * tc;
    for k in 2..n_coeffs {
        value[k] = twot * value[k - 1] - value[k - 2];
        derivative[k] = twot * derivative[k - 1] + 2.0 * value[k - 1] - derivative[k - 2];
    }
    (value, derivative)
}

/// One data record of a DE file: its date span and every coefficient it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct DeRecord {
    pub index: usize,
    pub start_jd: JulianDate,
    pub end_jd: JulianDate,
    /// The whole record, date span included, so that the 1-based `IPT` offsets apply directly
    words: Vec<f64>,
}

fn parse_record(input: &[u8], n_words: usize) -> IResult<&[u8], Vec<f64>> {
    count(le_f64, n_words).parse(input)
}

impl DeRecord {
    /// Decode a raw record.
    ///
    /// Arguments
    /// ---------
    /// * `index`: data record index, 0 for the first record after the two header records
    /// * `bytes`: the `recsize` bytes of the record
    pub fn parse(index: usize, bytes: &[u8]) -> Result<Self> {
        let n_words = bytes.len() / 8;
        if n_words < 2 {
            return Err(EphemError::InvalidEphemerisRecord {
                record: index,
                reason: format!("{} bytes cannot hold a date span", bytes.len()),
            });
        }
        let (_, words) = parse_record(bytes, n_words)
            .map_err(|_| EphemError::NomParsingError(format!("DE data record {index}")))?;

        let (start_jd, end_jd) = (words[0], words[1]);
        if !(start_jd.is_finite() && end_jd.is_finite() && start_jd < end_jd) {
            return Err(EphemError::InvalidEphemerisRecord {
                record: index,
                reason: format!("invalid date span [{start_jd}, {end_jd}]"),
            });
        }

        Ok(DeRecord {
            index,
            start_jd,
            end_jd,
            words,
        })
    }

    pub fn covers(&self, jd: JulianDate) -> bool {
        jd >= self.start_jd - SPAN_TOLERANCE && jd <= self.end_jd + SPAN_TOLERANCE
    }

    /// Evaluate the first three components of a block at `jd`.
    ///
    /// Return
    /// ------
    /// * the position in the file units (km) and the velocity per day, or
    ///   [`EphemError::InvalidEphemerisRecord`] when the record does not cover `jd`
    pub fn interpolate(&self, entry: &IptEntry, jd: JulianDate) -> Result<StateVector> {
        if !self.covers(jd) {
            return Err(EphemError::InvalidEphemerisRecord {
                record: self.index,
                reason: format!(
                    "span [{}, {}] does not cover JD {jd}",
                    self.start_jd, self.end_jd
                ),
            });
        }

        let n_coeffs = entry.n_coeffs as usize;
        let n_subs = entry.n_subintervals as usize;
        let span = self.end_jd - self.start_jd;

        let t = ((jd - self.start_jd) / span).clamp(0.0, 1.0);
        let sub = ((t * n_subs as f64).floor() as usize).min(n_subs - 1);
        let tc = 2.0 * (t * n_subs as f64 - sub as f64) - 1.0;
        let velocity_factor = 2.0 * n_subs as f64 / span;

        let (basis, basis_derivative) = chebyshev_basis(tc, n_coeffs);
        let base = (entry.offset as usize - 1) + sub * n_coeffs * 3;

        let mut position = Vector3::zeros();
        let mut velocity = Vector3::zeros();
        for component in 0..3 {
            let start = base + component * n_coeffs;
            let coefficients = self.words.get(start..start + n_coeffs).ok_or_else(|| {
                EphemError::InvalidEphemerisRecord {
                    record: self.index,
                    reason: format!("coefficients at word {start} beyond the record"),
                }
            })?;

            position[component] = coefficients.iter().zip(&basis).map(|(c, t)| c * t).sum();
            velocity[component] = velocity_factor
                * coefficients
                    .iter()
                    .zip(&basis_derivative)
                    .map(|(c, t)| c * t)
                    .sum::<f64>();
        }

        Ok(StateVector { position, velocity })
    }
}
