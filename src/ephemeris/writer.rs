//! Serialization of one time step, as a text line or as packed little-endian doubles.
use std::{fmt::Write as _, io::Write};

use crate::constants::{JulianDate, RADEG};

use super::{
    body_state::BodyEphemeris,
    request::{DetailTier, OutputFormat},
};

/// `printf("%*.*e")`: mantissa, then a signed exponent of at least two digits.
pub fn c_exponential(value: f64, width: usize, precision: usize) -> String {
    let rust = format!("{value:.precision$e}");
    let formatted = match rust.split_once('e') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(exp) => format!(
                "{mantissa}e{}{:02}",
                if exp < 0 { '-' } else { '+' },
                exp.abs()
            ),
            Err(_) => rust.clone(),
        },
        None => rust.clone(),
    };
    format!("{formatted:>width$}")
}

/// Text line of one step: the Julian Date then the field groups of every body.
pub fn format_text_step(jd: JulianDate, records: &[BodyEphemeris], format: OutputFormat) -> String {
    let mut line = format!("{jd:.12}   ");

    for record in records {
        let fields = record.fields(format);
        let _ = write!(line, "{:12.9} {:12.9} {:12.9}   ", fields[0], fields[1], fields[2]);

        if format.includes(DetailTier::RaDec) {
            let _ = write!(
                line,
                "{:12.9} {:12.9}   ",
                record.ra / RADEG,
                record.dec / RADEG
            );
        }
        if format.includes(DetailTier::Photometry) {
            let _ = write!(
                line,
                "{:6.3} {:7.4} {:12.9}   ",
                record.magnitude, record.phase, record.angular_size
            );
        }
        if format.includes(DetailTier::Physical) {
            let _ = write!(
                line,
                "{} {:8.5}",
                c_exponential(record.physical_size, 12, 6),
                record.albedo
            );
            for value in &fields[10..] {
                let _ = write!(line, " {value:12.9}");
            }
            line.push_str("  ");
        }
    }
    line.push('\n');
    line
}

/// Writes time steps to any [`Write`] sink.
///
/// Text mode emits one line per step, binary mode the fields of every body as little-endian
/// f64 with neither the date nor separators.
#[derive(Debug)]
pub struct EphemerisWriter<W: Write> {
    out: W,
    format: OutputFormat,
    binary: bool,
    steps_written: usize,
}

impl<W: Write> EphemerisWriter<W> {
    pub fn new(out: W, format: OutputFormat, binary: bool) -> Self {
        EphemerisWriter {
            out,
            format,
            binary,
            steps_written: 0,
        }
    }

    pub fn write_step(&mut self, jd: JulianDate, records: &[BodyEphemeris]) -> std::io::Result<()> {
        if self.binary {
            let bytes: Vec<u8> = records
                .iter()
                .flat_map(|record| record.fields(self.format))
                .flat_map(f64::to_le_bytes)
                .collect();
            self.out.write_all(&bytes)?;
        } else {
            self.out
                .write_all(format_text_step(jd, records, self.format).as_bytes())?;
        }
        self.steps_written += 1;
        Ok(())
    }

    pub fn steps_written(&self) -> usize {
        self.steps_written
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
