//! WGS84 to metric planar coordinate transforms.
//!
//! Distances and buffers are only meaningful in a CRS with meter units, so both
//! point collections are projected before matching. Which grid is used is a
//! deployment choice and comes from configuration:
//!
//! - `EPSG:28992` (Amersfoort / RD New), via the published RD polynomial
//!   approximation (sub-meter absolute accuracy across the Netherlands).
//! - `EPSG:326zz` / `EPSG:327zz` (WGS84 / UTM zone `zz` north / south), via the
//!   Krüger series to third order in the third flattening.

use geo::Coord;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("unsupported coordinate reference system '{0}' (expected EPSG:28992, EPSG:326zz or EPSG:327zz)")]
    UnsupportedCrs(String),
    #[error("({x}, {y}) is not a valid {what} position")]
    InvalidCoordinate { x: f64, y: f64, what: &'static str },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum MetricCrs {
    /// Amersfoort / RD New, the Dutch national grid.
    #[default]
    RdNew,
    /// WGS84 / UTM. `zone` is 1..=60.
    Utm { zone: u8, north: bool },
}

impl MetricCrs {
    pub fn epsg(&self) -> u32 {
        match *self {
            MetricCrs::RdNew => 28992,
            MetricCrs::Utm { zone, north: true } => 32600 + zone as u32,
            MetricCrs::Utm { zone, north: false } => 32700 + zone as u32,
        }
    }

    /// Longitude/latitude in degrees to planar meters.
    pub fn project(&self, lonlat: Coord<f64>) -> Result<Coord<f64>, ProjectionError> {
        let Coord { x: lon, y: lat } = lonlat;
        if !lon.is_finite() || !lat.is_finite() || lat.abs() > 90.0 || lon.abs() > 180.0 {
            return Err(ProjectionError::InvalidCoordinate { x: lon, y: lat, what: "WGS84" });
        }
        let out = match *self {
            MetricCrs::RdNew => rd::forward(lon, lat),
            MetricCrs::Utm { zone, north } => {
                tm::forward(utm_central_meridian(zone), utm_false_northing(north), lon, lat)
            }
        };
        if !out.x.is_finite() || !out.y.is_finite() {
            return Err(ProjectionError::InvalidCoordinate { x: lon, y: lat, what: "projectable" });
        }
        Ok(out)
    }
}

impl FromStr for MetricCrs {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let code = trimmed
            .get(..5)
            .filter(|prefix| prefix.eq_ignore_ascii_case("EPSG:"))
            .and_then(|_| trimmed[5..].trim().parse::<u32>().ok())
            .ok_or_else(|| ProjectionError::UnsupportedCrs(s.to_string()))?;

        match code {
            28992 => Ok(MetricCrs::RdNew),
            32601..=32660 => Ok(MetricCrs::Utm { zone: (code - 32600) as u8, north: true }),
            32701..=32760 => Ok(MetricCrs::Utm { zone: (code - 32700) as u8, north: false }),
            _ => Err(ProjectionError::UnsupportedCrs(s.to_string())),
        }
    }
}

impl TryFrom<String> for MetricCrs {
    type Error = ProjectionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for MetricCrs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

fn utm_central_meridian(zone: u8) -> f64 {
    zone as f64 * 6.0 - 183.0
}

fn utm_false_northing(north: bool) -> f64 {
    if north {
        0.0
    } else {
        10_000_000.0
    }
}

mod rd {
    use geo::Coord;

    const PHI0: f64 = 52.155_174_40;
    const LAM0: f64 = 5.387_206_21;
    const X0: f64 = 155_000.0;
    const Y0: f64 = 463_000.0;

    // (p, q, c): c * dphi^p * dlam^q, with dphi/dlam in units of 10^4 arcseconds.
    const X_TERMS: [(i32, i32, f64); 9] = [
        (0, 1, 190_094.945),
        (1, 1, -11_832.228),
        (2, 1, -114.221),
        (0, 3, -32.391),
        (1, 0, -0.705),
        (3, 1, -2.340),
        (1, 3, -0.608),
        (0, 2, -0.008),
        (2, 3, 0.148),
    ];
    const Y_TERMS: [(i32, i32, f64); 10] = [
        (1, 0, 309_056.544),
        (0, 2, 3_638.893),
        (2, 0, 73.077),
        (1, 2, -157.984),
        (3, 0, 59.788),
        (0, 1, 0.433),
        (2, 2, -6.439),
        (1, 1, -0.032),
        (0, 4, 0.092),
        (1, 4, -0.054),
    ];

    fn poly(terms: &[(i32, i32, f64)], a: f64, b: f64) -> f64 {
        terms
            .iter()
            .map(|&(p, q, c)| c * a.powi(p) * b.powi(q))
            .sum()
    }

    pub(super) fn forward(lon: f64, lat: f64) -> Coord<f64> {
        let dphi = 0.36 * (lat - PHI0);
        let dlam = 0.36 * (lon - LAM0);
        Coord {
            x: X0 + poly(&X_TERMS, dphi, dlam),
            y: Y0 + poly(&Y_TERMS, dphi, dlam),
        }
    }
}

mod tm {
    use geo::Coord;

    const A: f64 = 6_378_137.0;
    const F: f64 = 1.0 / 298.257_223_563;
    const K0: f64 = 0.9996;
    const FALSE_EASTING: f64 = 500_000.0;

    struct Series {
        a_hat: f64,
        alpha: [f64; 3],
        n: f64,
    }

    fn series() -> Series {
        let n = F / (2.0 - F);
        let n2 = n * n;
        let n3 = n2 * n;
        Series {
            a_hat: A / (1.0 + n) * (1.0 + n2 / 4.0 + n2 * n2 / 64.0),
            alpha: [
                n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0,
                13.0 * n2 / 48.0 - 3.0 * n3 / 5.0,
                61.0 * n3 / 240.0,
            ],
            n,
        }
    }

    pub(super) fn forward(lon0: f64, false_northing: f64, lon: f64, lat: f64) -> Coord<f64> {
        let s = series();
        let phi = lat.to_radians();
        let dlam = (lon - lon0).to_radians();

        let c = 2.0 * s.n.sqrt() / (1.0 + s.n);
        let t = (phi.sin().atanh() - c * (c * phi.sin()).atanh()).sinh();
        let xi_p = t.atan2(dlam.cos());
        let eta_p = (dlam.sin() / (1.0 + t * t).sqrt()).atanh();

        let mut xi = xi_p;
        let mut eta = eta_p;
        for (j, a) in s.alpha.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            xi += a * (k * xi_p).sin() * (k * eta_p).cosh();
            eta += a * (k * xi_p).cos() * (k * eta_p).sinh();
        }

        Coord {
            x: FALSE_EASTING + K0 * s.a_hat * eta,
            y: false_northing + K0 * s.a_hat * xi,
        }
    }
}
