use std::sync::Arc;

use crate::{
    bodies::Body,
    constants::JulianDate,
    ephem_errors::{EphemError, Result},
    ephemeris::body_state::{evaluate_body, BodyEphemeris, DerivationContext},
    remote_file::{FileError, VirtualFile, VirtualFs},
};

use super::{
    chebyshev::DeRecord,
    de_header::{DeHeader, HEADER_RECORDS},
    de_ids::DeBody,
    state_vector::StateVector,
};

/// A JPL DE binary ephemeris read record by record through a [`VirtualFile`].
///
/// The store keeps the last fetched record: all bodies of a time step, and the light-time
/// iterations around it, are served from a single range read. Clones made with
/// [`EphemerisStore::try_clone`] share the header and own their cursor and cache, so each
/// worker thread can hold one.
#[derive(Debug)]
pub struct EphemerisStore {
    header: Arc<DeHeader>,
    file: VirtualFile,
    cache: Option<DeRecord>,
}

impl EphemerisStore {
    /// Open a DE file by name on a file system and validate its header.
    pub fn open(fs: &VirtualFs, name: &str) -> Result<Self> {
        Self::from_file(fs.open(name)?)
    }

    /// Validate the header of an already opened file.
    pub fn from_file(mut file: VirtualFile) -> Result<Self> {
        let header = DeHeader::read(&mut file)?;

        let expected = (header.record_count() as u64)
            .checked_add(HEADER_RECORDS)
            .and_then(|records| records.checked_mul(header.recsize() as u64));
        if let (Some(size), Some(expected)) = (file.size(), expected) {
            if size < expected {
                log::warn!(
                    "{} holds {size} bytes, {expected} expected for {} records: late dates will fail",
                    file.name(),
                    header.record_count()
                );
            }
        }
        log::info!(
            "{} loaded from {}: JD {} to {}",
            header.version(),
            file.name(),
            header.start_jd(),
            header.end_jd()
        );

        Ok(EphemerisStore {
            header: Arc::new(header),
            file,
            cache: None,
        })
    }

    pub fn header(&self) -> &DeHeader {
        &self.header
    }

    /// Independent handle on the same file (see [`VirtualFile::try_clone`]).
    pub fn try_clone(&self) -> Result<Self> {
        Ok(EphemerisStore {
            header: Arc::clone(&self.header),
            file: self.file.try_clone()?,
            cache: self.cache.clone(),
        })
    }

    /// Index of the data record covering `jd`; the end date belongs to the last record.
    fn record_index(&self, jd: JulianDate) -> Result<usize> {
        let (start, end) = (self.header.start_jd(), self.header.end_jd());
        if !(start..=end).contains(&jd) {
            log::warn!("JD {jd} outside the {} range [{start}, {end}]", self.header.version());
            return Err(EphemError::DateOutOfRange { jd, start, end });
        }

        let index = ((jd - start) / self.header.step()).floor() as usize;
        Ok(index.min(self.header.record_count().saturating_sub(1)))
    }

    fn record(&mut self, jd: JulianDate) -> Result<&DeRecord> {
        let index = self.record_index(jd)?;

        let cached = matches!(&self.cache, Some(record) if record.index == index);
        if !cached {
            let recsize = self.header.recsize();
            let offset = (index as u64)
                .checked_add(HEADER_RECORDS)
                .and_then(|records| records.checked_mul(recsize as u64))
                .ok_or_else(|| EphemError::InvalidEphemerisRecord {
                    record: index,
                    reason: format!("offset of a {recsize}-byte record overflows"),
                })?;
            log::debug!("fetching DE record {index} at byte {offset}");

            let bytes = self.file.read_exact_at(offset, recsize).map_err(|err| match err {
                FileError::ShortRead { received, .. } => EphemError::InvalidEphemerisRecord {
                    record: index,
                    reason: format!("truncated: {received} of {recsize} bytes"),
                },
                other => EphemError::File(other),
            })?;
            self.cache = Some(DeRecord::parse(index, &bytes)?);
        }

        self.cache
            .as_ref()
            .ok_or_else(|| EphemError::InvalidEphemerisRecord {
                record: index,
                reason: "record cache is empty".into(),
            })
    }

    /// State of one coefficient block, as stored: km and km/day, the Moon geocentric and
    /// every other block relative to the solar-system barycentre.
    pub fn raw_state(&mut self, block: DeBody, jd: JulianDate) -> Result<StateVector> {
        let entry = self.header.ipt(block);
        if !entry.is_present() {
            return Err(EphemError::UnknownBody(format!("{block:?} (absent from the file)")));
        }
        self.record(jd)?.interpolate(&entry, jd)
    }

    /// Barycentric state of a body in AU and AU/day, equatorial J2000.
    ///
    /// The Earth is `EMB − Moon/(1 + EMRAT)` and the Moon is the Earth plus the geocentric Moon.
    pub fn state(&mut self, body: Body, jd: JulianDate) -> Result<StateVector> {
        let state = match body {
            Body::Earth | Body::Moon => {
                let emb = self.raw_state(DeBody::EarthMoonBarycenter, jd)?;
                let moon = self.raw_state(DeBody::Moon, jd)?;
                let earth = emb - moon / (1.0 + self.header.emrat());
                if body == Body::Earth {
                    earth
                } else {
                    earth + moon
                }
            }
            _ => {
                let block = DeBody::of(body).ok_or_else(|| {
                    EphemError::UnknownBody(body.name().to_string())
                })?;
                self.raw_state(block, jd)?
            }
        };
        Ok(state.to_au())
    }

    /// Full geocentric ephemeris of a body at `jd`, RA/Dec referred to J2000.
    pub fn lookup(&mut self, body: Body, jd: JulianDate) -> Result<BodyEphemeris> {
        evaluate_body(self, body, jd, &DerivationContext::default())
    }
}
