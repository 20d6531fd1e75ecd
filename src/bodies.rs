//! Identifiers of the solar-system bodies handled by the engine.
//!
//! The numeric identifiers follow the conventional ordering used by the command line and the
//! binary output: `0` is the Sun, `1..=9` are Mercury to Pluto in heliocentric order and `10`
//! is the Moon.
//!
//! Conversions
//! -----------
//! * [`TryFrom<u8>`] maps a raw identifier to a [`Body`].
//! * [`FromStr`] accepts either the numeric identifier or the English name
//!   (case-insensitive), so `"4"`, `"mars"` and `"Mars"` all resolve to [`Body::Mars`].
//! * [`Body::id`] recovers the numeric identifier.
use std::{fmt, str::FromStr};

use smallvec::SmallVec;

use crate::ephem_errors::EphemError;

/// Small inline list of bodies; a request rarely names more than the eleven known bodies.
pub type BodyList = SmallVec<[Body; 11]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Body {
    Sun = 0,
    Mercury = 1,
    Venus = 2,
    Earth = 3,
    Mars = 4,
    Jupiter = 5,
    Saturn = 6,
    Uranus = 7,
    Neptune = 8,
    Pluto = 9,
    Moon = 10,
}

impl Body {
    /// Every body, in identifier order.
    pub const ALL: [Body; 11] = [
        Body::Sun,
        Body::Mercury,
        Body::Venus,
        Body::Earth,
        Body::Mars,
        Body::Jupiter,
        Body::Saturn,
        Body::Uranus,
        Body::Neptune,
        Body::Pluto,
        Body::Moon,
    ];

    /// Bodies that can be observed from the Earth (everything but the Earth itself).
    pub const OBSERVABLE: [Body; 10] = [
        Body::Sun,
        Body::Mercury,
        Body::Venus,
        Body::Mars,
        Body::Jupiter,
        Body::Saturn,
        Body::Uranus,
        Body::Neptune,
        Body::Pluto,
        Body::Moon,
    ];

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Body::Sun => "Sun",
            Body::Mercury => "Mercury",
            Body::Venus => "Venus",
            Body::Earth => "Earth",
            Body::Mars => "Mars",
            Body::Jupiter => "Jupiter",
            Body::Saturn => "Saturn",
            Body::Uranus => "Uranus",
            Body::Neptune => "Neptune",
            Body::Pluto => "Pluto",
            Body::Moon => "Moon",
        }
    }

    /// Parse a comma separated list such as `"mars, 5,Moon"`.
    ///
    /// Arguments
    /// ---------
    /// * `list`: comma separated identifiers or names
    ///
    /// Return
    /// ------
    /// * The bodies in the given order, or [`EphemError::UnknownBody`] on the first entry that
    ///   does not resolve.
    pub fn parse_list(list: &str) -> Result<BodyList, EphemError> {
        list.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(Body::from_str)
            .collect()
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for Body {
    type Error = EphemError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Body::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| EphemError::UnknownBody(value.to_string()))
    }
}

impl FromStr for Body {
    type Err = EphemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = s.parse::<u8>() {
            return Body::try_from(id);
        }
        Body::ALL
            .iter()
            .copied()
            .find(|body| body.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| EphemError::UnknownBody(s.to_string()))
    }
}
