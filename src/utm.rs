//! WGS84 latitude/longitude to UTM projection.
//!
//! Uses the Krüger series truncated after the third term, which is accurate to
//! well below a millimetre inside a zone.

use crate::error::{Error, Result};

// no 'I' or 'O' bands
const LAT_BANDS: [char; 20] = [
    'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W',
    'X',
];

// WGS84: a = 6378137.0, f = 1/298.257223563, n = f / (2 - f)
const ALPHA1: f64 = 8.377318188192541e-4; // n/2 - (2/3)n^2 + (5/16)n^3
const ALPHA2: f64 = 7.608496958699166e-7; // (13/48)n^2 - (3/5)n^3
const ALPHA3: f64 = 1.2034877875966646e-9; // (61/240)n^3
const ECC: f64 = 0.08181919084262149; // 2 sqrt(n) / (1 + n)
const K0_A: f64 = 6_364_902.166165087; // 0.9996 * a/(1+n) * (1 + n^2/4 + n^4/64)

const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

pub const MIN_LATITUDE: f64 = -80.0;
pub const MAX_LATITUDE: f64 = 84.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtmCoord {
    pub easting: f64,
    pub northing: f64,
    pub zone: u8,
    pub band: char,
}

impl UtmCoord {
    pub fn is_north(&self) -> bool {
        self.band >= 'N'
    }
}

/// Maps geographic coordinates onto a planar system.
pub trait Projector {
    fn project(&self, lat: f64, lon: f64) -> Result<UtmCoord>;
}

/// Standard UTM projection with the zone picked from the coordinate itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct UtmProjector;

impl UtmProjector {
    pub fn new() -> Self {
        Self
    }
}

impl Projector for UtmProjector {
    fn project(&self, lat: f64, lon: f64) -> Result<UtmCoord> {
        from_lat_lon(lat, lon)
    }
}

pub fn zone_number(lat: f64, lon: f64) -> u8 {
    // Norway
    if (56.0..64.0).contains(&lat) && (3.0..12.0).contains(&lon) {
        return 32;
    }

    // Svalbard
    if (72.0..=84.0).contains(&lat) && lon >= 0.0 {
        if lon < 9.0 {
            return 31;
        } else if lon < 21.0 {
            return 33;
        } else if lon < 33.0 {
            return 35;
        } else if lon < 42.0 {
            return 37;
        }
    }

    // lon == 180 belongs to zone 60
    if lon >= 180.0 {
        return 60;
    }

    ((((lon + 180.0) / 6.0).floor() as i64).rem_euclid(60) + 1) as u8
}

pub fn zone_letter(lat: f64) -> char {
    let idx = ((lat - MIN_LATITUDE) / 8.0).floor() as i64;
    LAT_BANDS[idx.clamp(0, LAT_BANDS.len() as i64 - 1) as usize]
}

pub fn central_meridian(zone: u8) -> f64 {
    (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0
}

pub fn from_lat_lon(lat: f64, lon: f64) -> Result<UtmCoord> {
    if !(MIN_LATITUDE..=MAX_LATITUDE).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(Error::OutOfRange { lat, lon });
    }

    let zone = zone_number(lat, lon);
    let band = zone_letter(lat);

    let phi = lat.to_radians();
    let d_lambda = (lon - central_meridian(zone)).to_radians();

    let sin_phi = phi.sin();
    let t = (sin_phi.atanh() - ECC * (ECC * sin_phi).atanh()).sinh();

    let xi = (t / d_lambda.cos()).atan();
    let eta = (d_lambda.sin() / (1.0 + t * t).sqrt()).atanh();

    let (xi2, xi4, xi6) = (2.0 * xi, 4.0 * xi, 6.0 * xi);
    let (eta2, eta4, eta6) = (2.0 * eta, 4.0 * eta, 6.0 * eta);

    let easting = FALSE_EASTING
        + K0_A
            * (eta
                + ALPHA1 * xi2.cos() * eta2.sinh()
                + ALPHA2 * xi4.cos() * eta4.sinh()
                + ALPHA3 * xi6.cos() * eta6.sinh());

    let false_northing = if lat < 0.0 { FALSE_NORTHING_SOUTH } else { 0.0 };
    let northing = false_northing
        + K0_A
            * (xi
                + ALPHA1 * xi2.sin() * eta2.cosh()
                + ALPHA2 * xi4.sin() * eta4.cosh()
                + ALPHA3 * xi6.sin() * eta6.cosh());

    Ok(UtmCoord {
        easting,
        northing,
        zone,
        band,
    })
}
