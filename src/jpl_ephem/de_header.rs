use std::fmt;

use nom::{
    bytes::complete::take,
    multi::count,
    number::complete::{le_f64, le_i32, le_u32},
    IResult, Parser,
};

use crate::{
    constants::JulianDate,
    ephem_errors::{EphemError, Result},
    remote_file::VirtualFile,
};

use super::de_ids::DeBody;

/// Number of title lines at the start of the header record
const TITLE_LINES: usize = 3;
/// Width of a title line in bytes
const TITLE_WIDTH: usize = 84;
/// Constant names stored in the fixed part of the header
const OLD_MAX_CONSTANTS: usize = 400;
/// Width of a constant name in bytes
const CONSTANT_NAME_WIDTH: usize = 6;

/// Bytes covered by the fixed part of the header record, from the titles to `LPT`.
pub const HEADER_SPAN: usize = 2856;

/// Tolerance on the integrality of `(end − start) / step`
const RECORD_COUNT_TOLERANCE: f64 = 1e-6;

/// Header and constants records preceding the first data record
pub const HEADER_RECORDS: u64 = 2;

/// One row of the `IPT` table: where a body's coefficients live in a data record.
///
/// `offset` is the 1-based index of the first coefficient in the record, counted in f64 words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IptEntry {
    pub offset: u32,
    pub n_coeffs: u32,
    pub n_subintervals: u32,
}

impl IptEntry {
    fn from_triplet(triplet: &[u32]) -> Self {
        IptEntry {
            offset: triplet[0],
            n_coeffs: triplet[1],
            n_subintervals: triplet[2],
        }
    }

    pub fn is_present(&self) -> bool {
        self.n_coeffs > 0 && self.n_subintervals > 0
    }

    /// Number of f64 words the entry spans in a record
    fn words(&self, dimension: usize) -> usize {
        self.n_coeffs as usize * self.n_subintervals as usize * dimension
    }
}

pub type Ipt = [IptEntry; 15];

/// Fields of the fixed header span, before validation.
#[derive(Debug, Clone, PartialEq)]
struct RawHeader {
    titles: Vec<String>,
    start_jd: f64,
    end_jd: f64,
    step: f64,
    ncon: i32,
    au: f64,
    emrat: f64,
    ipt: Ipt,
    numde: u32,
}

/// Validated header of a JPL DE binary ephemeris.
///
/// Every offset used to address a data record comes from this structure, and none of them is
/// exposed before [`DeHeader::parse`] has checked it against the record size.
#[derive(Debug, Clone, PartialEq)]
pub struct DeHeader {
    titles: Vec<String>,
    numde: u32,
    start_jd: JulianDate,
    end_jd: JulianDate,
    step: f64,
    ncon: i32,
    au: f64,
    emrat: f64,
    ipt: Ipt,
    recsize: usize,
}

/// Size in bytes of one record, derived from the `IPT` table.
///
/// The DE format counts in 32-bit words: two words per coefficient plus four for the record
/// date span.
pub fn compute_recsize(ipt: &Ipt) -> usize {
    let words = ipt
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let body = DeBody::try_from(index as u8).ok()?;
            Some(2 * entry.words(body.dimension()))
        })
        .sum::<usize>();
    (4 + words) * 4
}

/// Total size in bytes of a file holding `records` data records, `None` when it does not fit
/// a `u64` offset.
fn file_span(records: f64, recsize: usize) -> Option<u64> {
    if !(records >= 1.0 && records < u64::MAX as f64) {
        return None;
    }
    (records as u64)
        .checked_add(HEADER_RECORDS)?
        .checked_mul(recsize as u64)
}

fn parse_fixed_width(input: &[u8], width: usize) -> IResult<&[u8], String> {
    let (rest, raw) = take(width)(input)?;
    Ok((rest, String::from_utf8_lossy(raw).trim().to_string()))
}

fn parse_title(input: &[u8]) -> IResult<&[u8], String> {
    parse_fixed_width(input, TITLE_WIDTH)
}

fn parse_constant_name(input: &[u8]) -> IResult<&[u8], String> {
    parse_fixed_width(input, CONSTANT_NAME_WIDTH)
}

fn parse_triplets(input: &[u8], n: usize) -> IResult<&[u8], Vec<IptEntry>> {
    let (rest, words) = count(le_u32, 3 * n).parse(input)?;
    Ok((rest, words.chunks(3).map(IptEntry::from_triplet).collect()))
}

fn parse_fixed_header(input: &[u8]) -> IResult<&[u8], RawHeader> {
    let (input, titles) = count(parse_title, TITLE_LINES).parse(input)?;
    let (input, _names) = count(parse_constant_name, OLD_MAX_CONSTANTS).parse(input)?;
    let (input, ss) = count(le_f64, 3).parse(input)?;
    let (input, ncon) = le_i32(input)?;
    let (input, au) = le_f64(input)?;
    let (input, emrat) = le_f64(input)?;
    let (input, first_rows) = parse_triplets(input, 12)?;
    let (input, numde) = le_u32(input)?;
    let (input, lpt) = parse_triplets(input, 1)?;

    let mut ipt: Ipt = [IptEntry::default(); 15];
    ipt[..12].copy_from_slice(&first_rows);
    ipt[12] = lpt[0];

    Ok((
        input,
        RawHeader {
            titles: titles.into_iter().filter(|t| !t.is_empty()).collect(),
            start_jd: ss[0],
            end_jd: ss[1],
            step: ss[2],
            ncon,
            au,
            emrat,
            ipt,
            numde,
        },
    ))
}

impl DeHeader {
    /// Read and validate the header from the first record of a DE file.
    ///
    /// For DE440 and later files with more than 400 constants, the `IPT` rows of the lunar
    /// Euler angle rates and TT−TDB follow the extra constant names and need a second read.
    ///
    /// Return
    /// ------
    /// * the header, a [`crate::remote_file::FileError::ShortRead`] when the file is shorter
    ///   than the fixed header span, or [`EphemError::InvalidEphemerisHeader`]
    pub fn read(file: &mut VirtualFile) -> Result<Self> {
        let bytes = file.read_exact_at(0, HEADER_SPAN)?;
        let mut raw = Self::parse_raw(&bytes)?;

        if raw.numde >= 440 && raw.ncon > OLD_MAX_CONSTANTS as i32 {
            let offset = HEADER_SPAN as u64
                + (raw.ncon as u64 - OLD_MAX_CONSTANTS as u64) * CONSTANT_NAME_WIDTH as u64;
            let extra = file.read_exact_at(offset, 24)?;
            let (_, rows) = parse_triplets(&extra, 2).map_err(|_| {
                EphemError::NomParsingError("IPT rows of DE440+ extended header".into())
            })?;
            raw.ipt[13] = rows[0];
            raw.ipt[14] = rows[1];
        }

        Self::validate(raw)
    }

    /// Validate a header from the fixed span only (no extended `IPT` rows).
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Self::validate(Self::parse_raw(bytes)?)
    }

    fn parse_raw(bytes: &[u8]) -> Result<RawHeader> {
        if bytes.len() < HEADER_SPAN {
            return Err(EphemError::InvalidEphemerisHeader(format!(
                "header buffer has {} bytes, expected at least {HEADER_SPAN}",
                bytes.len()
            )));
        }
        let (_, raw) = parse_fixed_header(bytes)
            .map_err(|_| EphemError::NomParsingError("DE header record".into()))?;
        Ok(raw)
    }

    fn validate(raw: RawHeader) -> Result<Self> {
        let invalid = |reason: String| Err(EphemError::InvalidEphemerisHeader(reason));

        if !(raw.start_jd.is_finite() && raw.end_jd.is_finite() && raw.start_jd < raw.end_jd) {
            return invalid(format!(
                "start {} is not before end {}",
                raw.start_jd, raw.end_jd
            ));
        }
        if !(raw.step.is_finite() && raw.step > 0.0) {
            return invalid(format!("record span {} is not positive", raw.step));
        }
        let records = (raw.end_jd - raw.start_jd) / raw.step;
        if (records - records.round()).abs() > RECORD_COUNT_TOLERANCE {
            return invalid(format!(
                "time range [{}, {}] is not a whole number of {}-day records",
                raw.start_jd, raw.end_jd, raw.step
            ));
        }
        if !(1..1000).contains(&raw.numde) {
            return invalid(format!("implausible DE number {}", raw.numde));
        }
        if raw.ncon < 0 {
            return invalid(format!("negative constant count {}", raw.ncon));
        }
        if !(raw.emrat.is_finite() && raw.emrat > 0.0) {
            return invalid(format!("Earth/Moon mass ratio {} is not positive", raw.emrat));
        }
        if !(raw.au.is_finite() && raw.au > 0.0) {
            return invalid(format!("AU constant {} is not positive", raw.au));
        }

        let recsize = compute_recsize(&raw.ipt);
        if recsize <= 16 {
            return invalid(format!("record size {recsize} bytes is too small"));
        }
        let record_words = recsize / 8;
        if file_span(records.round(), recsize).is_none() {
            return invalid(format!(
                "{} records of {recsize} bytes cannot be addressed in a file",
                records.round()
            ));
        }

        for (index, entry) in raw.ipt.iter().enumerate() {
            let body = DeBody::try_from(index as u8)?;
            let required = index <= u8::from(DeBody::Sun) as usize;
            if !entry.is_present() {
                if required {
                    return invalid(format!("no coefficients for {body:?}"));
                }
                continue;
            }
            if entry.offset < 3
                || entry.offset as usize - 1 + entry.words(body.dimension()) > record_words
            {
                return invalid(format!(
                    "IPT entry of {body:?} ({}, {}, {}) does not fit a {record_words}-word record",
                    entry.offset, entry.n_coeffs, entry.n_subintervals
                ));
            }
        }

        Ok(DeHeader {
            titles: raw.titles,
            numde: raw.numde,
            start_jd: raw.start_jd,
            end_jd: raw.end_jd,
            step: raw.step,
            ncon: raw.ncon,
            au: raw.au,
            emrat: raw.emrat,
            ipt: raw.ipt,
            recsize,
        })
    }

    pub fn version(&self) -> String {
        format!("DE{}", self.numde)
    }

    pub fn numde(&self) -> u32 {
        self.numde
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    pub fn start_jd(&self) -> JulianDate {
        self.start_jd
    }

    pub fn end_jd(&self) -> JulianDate {
        self.end_jd
    }

    /// Time span of one data record, in days
    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn ncon(&self) -> i32 {
        self.ncon
    }

    /// Astronomical unit in km as stored in the file
    pub fn au(&self) -> f64 {
        self.au
    }

    /// Earth/Moon mass ratio
    pub fn emrat(&self) -> f64 {
        self.emrat
    }

    pub fn ipt(&self, body: DeBody) -> IptEntry {
        self.ipt[body as usize]
    }

    /// Record size in bytes
    pub fn recsize(&self) -> usize {
        self.recsize
    }

    /// Number of data records covering `[start, end]`
    pub fn record_count(&self) -> usize {
        ((self.end_jd - self.start_jd) / self.step).round() as usize
    }
}

impl fmt::Display for DeHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.version())?;
        for title in &self.titles {
            writeln!(f, "  {title}")?;
        }
        writeln!(
            f,
            "  range: JD {:.1} .. {:.1} ({} records of {} days)",
            self.start_jd,
            self.end_jd,
            self.record_count(),
            self.step
        )?;
        writeln!(f, "  constants: {}", self.ncon)?;
        writeln!(f, "  AU: {} km", self.au)?;
        writeln!(f, "  EMRAT: {}", self.emrat)?;
        writeln!(f, "  record size: {} bytes", self.recsize)?;
        writeln!(f, "  {:<18} {:>6} {:>6} {:>6}", "block", "offset", "coeffs", "subs")?;
        for (index, entry) in self.ipt.iter().enumerate() {
            if let Ok(body) = DeBody::try_from(index as u8) {
                writeln!(
                    f,
                    "  {:<18} {:>6} {:>6} {:>6}",
                    format!("{body:?}"),
                    entry.offset,
                    entry.n_coeffs,
                    entry.n_subintervals
                )?;
            }
        }
        Ok(())
    }
}
