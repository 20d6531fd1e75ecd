#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use approx::assert_relative_eq;
use camino::Utf8PathBuf;
use ephemera::remote_file::{FileError, RangeTransport, TransportResponse, VirtualFs};

pub const KM_PER_AU: f64 = 149_597_870.7;

/// A small DE-style file: 4 records of 32 days from JD 2451536.5, every block a constant
/// position, 4 coefficients and one sub-interval per component.
#[derive(Debug, Clone)]
pub struct DeFixture {
    pub start: f64,
    pub step: f64,
    pub records: usize,
    pub emrat: f64,
    /// Constant positions (km) of the first 11 blocks, DE order
    pub positions: [[f64; 3]; 11],
}

/// Block order of a DE record
pub const MERCURY: usize = 0;
pub const EMB: usize = 2;
pub const MARS: usize = 3;
pub const JUPITER: usize = 4;
pub const MOON: usize = 9;
pub const SUN: usize = 10;

const N_COEFFS: u32 = 4;

fn dimension(block: usize) -> u32 {
    match block {
        11 => 2,
        14 => 1,
        _ => 3,
    }
}

impl Default for DeFixture {
    fn default() -> Self {
        let mut positions = [[0.0; 3]; 11];
        for (block, position) in positions.iter_mut().enumerate().take(9) {
            let radius = (block as f64 + 1.0) * 0.6 * KM_PER_AU;
            let angle = block as f64 * 0.7;
            *position = [radius * angle.cos(), radius * angle.sin(), 0.01 * radius];
        }
        positions[EMB] = [KM_PER_AU, 0.0, 0.0];
        positions[MARS] = [0.0, 1.5 * KM_PER_AU, 0.0];
        positions[MOON] = [0.0, 384_400.0, 0.0];
        positions[SUN] = [0.0; 3];

        DeFixture {
            start: 2451536.5,
            step: 32.0,
            records: 4,
            emrat: 81.30056822149722,
            positions,
        }
    }
}

fn put(buffer: &mut [u8], at: usize, bytes: &[u8]) {
    buffer[at..at + bytes.len()].copy_from_slice(bytes);
}

impl DeFixture {
    pub fn end(&self) -> f64 {
        self.start + self.records as f64 * self.step
    }

    /// `(offset, n_coeffs, n_subintervals)` of the 15 blocks
    fn ipt(&self) -> [(u32, u32, u32); 15] {
        let mut ipt = [(0, 0, 0); 15];
        let mut offset = 3;
        for (block, entry) in ipt.iter_mut().enumerate() {
            let n_coeffs = match block {
                0..=11 => N_COEFFS,
                // Librations, sized so that a record can hold the header
                12 => 72,
                _ => 0,
            };
            let n_subs = u32::from(n_coeffs > 0);
            *entry = (offset, n_coeffs, n_subs);
            offset += n_coeffs * n_subs * dimension(block);
        }
        ipt
    }

    pub fn recsize(&self) -> usize {
        let words: u32 = self
            .ipt()
            .iter()
            .enumerate()
            .map(|(block, &(_, n, s))| n * s * dimension(block))
            .sum();
        (4 + 2 * words as usize) * 4
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let ipt = self.ipt();
        let recsize = self.recsize();

        let mut header = vec![b' '; recsize];
        header[2652..].fill(0);
        put(&mut header, 0, format!("{:<84}", "Fixture ephemeris DE440").as_bytes());
        put(&mut header, 2652, &self.start.to_le_bytes());
        put(&mut header, 2660, &self.end().to_le_bytes());
        put(&mut header, 2668, &self.step.to_le_bytes());
        put(&mut header, 2676, &400i32.to_le_bytes());
        put(&mut header, 2680, &KM_PER_AU.to_le_bytes());
        put(&mut header, 2688, &self.emrat.to_le_bytes());
        let entry = |(offset, n, s): (u32, u32, u32)| {
            [offset, n, s]
                .iter()
                .flat_map(|v| v.to_le_bytes())
                .collect::<Vec<u8>>()
        };
        for (row, &values) in ipt.iter().take(12).enumerate() {
            put(&mut header, 2696 + 12 * row, &entry(values));
        }
        put(&mut header, 2840, &440u32.to_le_bytes());
        put(&mut header, 2844, &entry(ipt[12]));

        let mut bytes = header;
        bytes.resize(2 * recsize, 0);
        for record in 0..self.records {
            let mut words = vec![0.0; recsize / 8];
            words[0] = self.start + record as f64 * self.step;
            words[1] = words[0] + self.step;
            for (block, position) in self.positions.iter().enumerate() {
                let base = ipt[block].0 as usize - 1;
                for (component, value) in position.iter().enumerate() {
                    words[base + component * N_COEFFS as usize] = *value;
                }
            }
            bytes.extend(words.iter().flat_map(|w| w.to_le_bytes()));
        }
        bytes
    }

    /// Write the file in a fresh temporary directory.
    pub fn write_to_tempdir(&self, name: &str) -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap();
        std::fs::write(&path, self.to_bytes()).unwrap();
        (dir, path)
    }
}

/// HTTP server stand-in for one URL, honouring byte ranges.
#[derive(Debug)]
pub struct RangeServer {
    pub url: String,
    pub content: Vec<u8>,
    pub gets: AtomicUsize,
}

impl RangeServer {
    pub fn new(url: &str, content: Vec<u8>) -> Arc<Self> {
        Arc::new(RangeServer {
            url: url.to_string(),
            content,
            gets: AtomicUsize::new(0),
        })
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn file_system(self: &Arc<Self>, base_url: &str) -> VirtualFs {
        VirtualFs::with_transport(base_url, self.clone())
    }
}

impl RangeTransport for RangeServer {
    fn head(&self, url: &str) -> Result<TransportResponse, FileError> {
        let found = url == self.url;
        Ok(TransportResponse {
            status: if found { 200 } else { 404 },
            content_length: found.then_some(self.content.len() as u64),
            body: Vec::new(),
        })
    }

    fn get_range(&self, url: &str, first: u64, last: u64) -> Result<TransportResponse, FileError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if url != self.url {
            return Ok(TransportResponse {
                status: 404,
                content_length: None,
                body: Vec::new(),
            });
        }
        let len = self.content.len() as u64;
        if first >= len {
            return Ok(TransportResponse {
                status: 416,
                content_length: None,
                body: Vec::new(),
            });
        }
        let body = self.content[first as usize..=(last.min(len - 1)) as usize].to_vec();
        Ok(TransportResponse {
            status: 206,
            content_length: Some(body.len() as u64),
            body,
        })
    }
}

/// Right ascension (hours) and declination (degrees) closer than `arcmin`.
pub fn assert_radec_close(
    ra_hours: f64,
    dec: f64,
    expected_ra_hours: f64,
    expected_dec: f64,
    arcmin: f64,
) {
    let d_ra = (ra_hours - expected_ra_hours) * 15.0 * dec.to_radians().cos();
    let d_dec = dec - expected_dec;
    let separation = (d_ra * d_ra + d_dec * d_dec).sqrt() * 60.0;
    assert!(
        separation < arcmin,
        "({ra_hours} h, {dec}°) is {separation:.3}′ from ({expected_ra_hours} h, {expected_dec}°)"
    );
}

pub fn assert_vec_close(actual: &[f64], expected: &[f64], epsilon: f64) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert_relative_eq!(*a, *e, epsilon = epsilon);
    }
}
