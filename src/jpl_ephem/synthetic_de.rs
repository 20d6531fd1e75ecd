//! In-memory DE files for the unit tests.
use std::collections::HashMap;

use super::{
    de_header::{compute_recsize, IptEntry, Ipt},
    de_ids::DeBody,
};

#[derive(Debug, Clone)]
pub(crate) struct SyntheticDe {
    pub start: f64,
    pub end: f64,
    pub step: f64,
    pub records: usize,
    pub numde: u32,
    pub ncon: i32,
    pub au: f64,
    pub emrat: f64,
    /// `(n_coeffs, n_subintervals)` per block
    pub layout: [(u32, u32); 15],
    pub offset_override: Option<(DeBody, u32)>,
    /// Added to the date span written in every data record
    pub record_shift: f64,
    /// Coefficients of a block, repeated in every record
    pub coefficients: HashMap<DeBody, Vec<f64>>,
}

impl Default for SyntheticDe {
    fn default() -> Self {
        let mut layout = [(4, 1); 15];
        layout[DeBody::Libration as usize] = (72, 1);
        layout[DeBody::LunarEulerRates as usize] = (0, 0);
        layout[DeBody::TtMinusTdb as usize] = (0, 0);

        let start = 2451536.5;
        SyntheticDe {
            start,
            end: start + 4.0 * 32.0,
            step: 32.0,
            records: 4,
            numde: 440,
            ncon: 400,
            au: 149597870.7,
            emrat: 81.30056822149722,
            layout,
            offset_override: None,
            record_shift: 0.0,
            coefficients: HashMap::new(),
        }
    }
}

fn put<const N: usize>(buffer: &mut [u8], at: usize, bytes: [u8; N]) {
    buffer[at..at + N].copy_from_slice(&bytes);
}

impl SyntheticDe {
    pub fn ipt(&self) -> Ipt {
        let mut ipt: Ipt = [IptEntry::default(); 15];
        let mut offset = 3;
        for (index, &(n_coeffs, n_subintervals)) in self.layout.iter().enumerate() {
            let block = DeBody::try_from(index as u8).unwrap();
            ipt[index] = IptEntry {
                offset,
                n_coeffs,
                n_subintervals,
            };
            offset += n_coeffs * n_subintervals * block.dimension() as u32;
        }
        if let Some((block, offset)) = self.offset_override {
            ipt[block as usize].offset = offset;
        }
        ipt
    }

    /// Block whose components are `constant + slope·T1(tc)` in every record.
    pub fn set_linear(&mut self, block: DeBody, constant: [f64; 3], slope: [f64; 3]) {
        let (n_coeffs, n_subs) = self.layout[block as usize];
        let n = n_coeffs as usize;
        let mut words = vec![0.0; n * n_subs as usize * 3];
        for sub in 0..n_subs as usize {
            for component in 0..3 {
                words[sub * n * 3 + component * n] = constant[component];
                words[sub * n * 3 + component * n + 1] = slope[component];
            }
        }
        self.coefficients.insert(block, words);
    }

    /// Header record, longer than `recsize` only for layouts too small to be valid.
    fn header_record(&self, ipt: &Ipt, recsize: usize) -> Vec<u8> {
        let extended = 2856 + (self.ncon.max(400) as usize - 400) * 6 + 24;
        let mut header = vec![b' '; recsize.max(extended)];
        header[2652..].fill(0);

        let title = format!("{:<84}", format!("Synthetic ephemeris DE{}", self.numde));
        header[..84].copy_from_slice(title.as_bytes());

        put(&mut header, 2652, self.start.to_le_bytes());
        put(&mut header, 2660, self.end.to_le_bytes());
        put(&mut header, 2668, self.step.to_le_bytes());
        put(&mut header, 2676, self.ncon.to_le_bytes());
        put(&mut header, 2680, self.au.to_le_bytes());
        put(&mut header, 2688, self.emrat.to_le_bytes());

        let write_entry = |header: &mut Vec<u8>, at: usize, entry: &IptEntry| {
            put(header, at, entry.offset.to_le_bytes());
            put(header, at + 4, entry.n_coeffs.to_le_bytes());
            put(header, at + 8, entry.n_subintervals.to_le_bytes());
        };
        for (row, entry) in ipt.iter().take(12).enumerate() {
            write_entry(&mut header, 2696 + 12 * row, entry);
        }
        put(&mut header, 2840, self.numde.to_le_bytes());
        write_entry(&mut header, 2844, &ipt[12]);

        if self.ncon > 400 {
            let at = 2856 + (self.ncon as usize - 400) * 6;
            write_entry(&mut header, at, &ipt[13]);
            write_entry(&mut header, at + 12, &ipt[14]);
        }
        header
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let ipt = self.ipt();
        let recsize = compute_recsize(&ipt);
        let mut bytes = self.header_record(&ipt, recsize);
        bytes.extend(vec![0u8; recsize]);

        for record in 0..self.records {
            let mut words = vec![0.0; recsize / 8];
            words[0] = self.start + record as f64 * self.step + self.record_shift;
            words[1] = words[0] + self.step;
            for (block, coefficients) in &self.coefficients {
                let at = ipt[*block as usize].offset as usize - 1;
                words[at..at + coefficients.len()].copy_from_slice(coefficients);
            }
            bytes.extend(words.iter().flat_map(|w| w.to_le_bytes()));
        }
        bytes
    }
}
