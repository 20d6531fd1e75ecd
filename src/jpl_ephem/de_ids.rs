use crate::{bodies::Body, ephem_errors::EphemError};

/// Index of a coefficient block in a DE data record.
///
/// The numbering follows the `IPT` table of the header: `0..=8` are Mercury to Pluto with the
/// Earth–Moon barycentre in slot 2, `9` is the geocentric Moon, `10` the Sun, then nutations,
/// lunar librations, lunar Euler angle rates and TT−TDB.
///
/// ```rust
/// use ephemera::jpl_ephem::de_ids::DeBody;
///
/// let id = DeBody::try_from(4).unwrap();
/// assert_eq!(id, DeBody::Jupiter);
/// assert_eq!(u8::from(DeBody::Moon), 9);
/// assert_eq!(DeBody::Nutation.dimension(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeBody {
    Mercury = 0,
    Venus = 1,
    EarthMoonBarycenter = 2,
    Mars = 3,
    Jupiter = 4,
    Saturn = 5,
    Uranus = 6,
    Neptune = 7,
    Pluto = 8,
    Moon = 9,
    Sun = 10,
    Nutation = 11,
    Libration = 12,
    LunarEulerRates = 13,
    TtMinusTdb = 14,
}

impl DeBody {
    /// Number of components stored per coefficient set.
    pub fn dimension(self) -> usize {
        match self {
            DeBody::Nutation => 2,
            DeBody::TtMinusTdb => 1,
            _ => 3,
        }
    }

    /// Block holding the heliocentric-ordered body, when the body has its own block.
    ///
    /// The Earth has none: it is recovered from the Earth–Moon barycentre and the Moon.
    pub fn of(body: Body) -> Option<DeBody> {
        match body {
            Body::Sun => Some(DeBody::Sun),
            Body::Mercury => Some(DeBody::Mercury),
            Body::Venus => Some(DeBody::Venus),
            Body::Earth => None,
            Body::Mars => Some(DeBody::Mars),
            Body::Jupiter => Some(DeBody::Jupiter),
            Body::Saturn => Some(DeBody::Saturn),
            Body::Uranus => Some(DeBody::Uranus),
            Body::Neptune => Some(DeBody::Neptune),
            Body::Pluto => Some(DeBody::Pluto),
            Body::Moon => Some(DeBody::Moon),
        }
    }
}

impl TryFrom<u8> for DeBody {
    type Error = EphemError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DeBody::Mercury),
            1 => Ok(DeBody::Venus),
            2 => Ok(DeBody::EarthMoonBarycenter),
            3 => Ok(DeBody::Mars),
            4 => Ok(DeBody::Jupiter),
            5 => Ok(DeBody::Saturn),
            6 => Ok(DeBody::Uranus),
            7 => Ok(DeBody::Neptune),
            8 => Ok(DeBody::Pluto),
            9 => Ok(DeBody::Moon),
            10 => Ok(DeBody::Sun),
            11 => Ok(DeBody::Nutation),
            12 => Ok(DeBody::Libration),
            13 => Ok(DeBody::LunarEulerRates),
            14 => Ok(DeBody::TtMinusTdb),
            _ => Err(EphemError::UnknownBody(format!("DE block {value}"))),
        }
    }
}

impl From<DeBody> for u8 {
    fn from(id: DeBody) -> Self {
        id as u8
    }
}
