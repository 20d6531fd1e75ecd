//! JPL DE binary ephemerides read over byte ranges.
//!
//! The legacy DE files (`linux_p1550p2650.440` and friends) are a header record, a constants
//! record, then fixed-size **data records** covering consecutive time spans. A data record holds
//! the Chebyshev coefficients of every body for its span:
//!
//! ```text
//! +--------------------------------------------------------------------------+
//! | record 0: titles | 400 constant names | SS[3] | NCON | AU | EMRAT |      |
//! |           IPT[12][3] | NUMDE | LPT[3] | (DE440+: extra names, IPT[13..15])|
//! +--------------------------------------------------------------------------+
//! | record 1: constant values                                                |
//! +--------------------------------------------------------------------------+
//! | record 2 + k: [jd_start, jd_end, coefficients ...]  (little-endian f64)  |
//! +--------------------------------------------------------------------------+
//! ```
//!
//! Submodules:
//!
//! - [`de_header`]: parsing and validation of the header, record size.
//! - [`de_ids`]: [`de_ids::DeBody`], the coefficient blocks of a record.
//! - [`chebyshev`]: one decoded data record and its Chebyshev evaluation.
//! - [`state_vector`]: position/velocity pairs with unit conversion.
//! - [`ephem_store`]: [`ephem_store::EphemerisStore`], the entry point. Reads the header once,
//!   then one record per lookup through a [`crate::remote_file::VirtualFile`].
//!
//! ```rust,no_run
//! use ephemera::{bodies::Body, jpl_ephem::ephem_store::EphemerisStore, remote_file::VirtualFs};
//!
//! let fs = VirtualFs::local("/data/ephemerides");
//! let mut store = EphemerisStore::open(&fs, "linux_p1550p2650.440").unwrap();
//! let mars = store.state(Body::Mars, 2451545.0).unwrap();
//! println!("{}", mars.position);
//! ```
pub mod chebyshev;
pub mod de_header;
pub mod de_ids;
pub mod ephem_store;
pub mod state_vector;

#[cfg(test)]
pub(crate) mod synthetic_de;
