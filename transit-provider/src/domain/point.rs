//! Geographic coordinates in microdegrees.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::PointError;

/// Largest valid latitude in microdegrees.
pub const MAX_LAT_E6: i32 = 90_000_000;

/// Largest valid longitude in microdegrees.
pub const MAX_LON_E6: i32 = 180_000_000;

/// WGS84 major semi-axis in meters.
const WGS84_A: f64 = 6_378_137.0;

/// WGS84 minor semi-axis in meters.
const WGS84_B: f64 = 6_356_752.314_2;

/// A WGS84 coordinate stored as fixed-point microdegrees (1e-6 degree units).
///
/// Integer storage keeps equality and hashing exact: two points built from
/// the same microdegree values are always equal, regardless of how they
/// travelled through serialization.
///
/// # Examples
///
/// ```
/// use transit_provider::domain::Point;
///
/// let p = Point::from_e6(52_525_589, 13_369_548).unwrap();
/// assert_eq!(p.lat_e6(), 52_525_589);
/// assert!((p.lat() - 52.525589).abs() < 1e-9);
///
/// // Out of range is rejected
/// assert!(Point::from_e6(91_000_000, 0).is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPoint")]
pub struct Point {
    lat: i32,
    lon: i32,
}

#[derive(Deserialize)]
struct RawPoint {
    lat: i32,
    lon: i32,
}

impl TryFrom<RawPoint> for Point {
    type Error = PointError;

    fn try_from(raw: RawPoint) -> Result<Self, Self::Error> {
        Point::from_e6(raw.lat, raw.lon)
    }
}

impl Point {
    /// Create a point from microdegrees.
    pub fn from_e6(lat: i32, lon: i32) -> Result<Self, PointError> {
        if !(-MAX_LAT_E6..=MAX_LAT_E6).contains(&lat) {
            return Err(PointError::Latitude(lat));
        }
        if !(-MAX_LON_E6..=MAX_LON_E6).contains(&lon) {
            return Err(PointError::Longitude(lon));
        }
        Ok(Self { lat, lon })
    }

    /// Create a point from 1e-5 degree units, as some backends report them.
    pub fn from_e5(lat: i32, lon: i32) -> Result<Self, PointError> {
        let lat = lat.checked_mul(10).ok_or(PointError::Latitude(i32::MAX))?;
        let lon = lon.checked_mul(10).ok_or(PointError::Longitude(i32::MAX))?;
        Self::from_e6(lat, lon)
    }

    /// Create a point from floating-point degrees, rounding to the nearest microdegree.
    pub fn from_degrees(lat: f64, lon: f64) -> Result<Self, PointError> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(PointError::NotFinite);
        }
        let lat = (lat * 1e6).round();
        let lon = (lon * 1e6).round();
        if lat.abs() > f64::from(MAX_LAT_E6) {
            return Err(PointError::Latitude(lat.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32));
        }
        if lon.abs() > f64::from(MAX_LON_E6) {
            return Err(PointError::Longitude(lon.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32));
        }
        Self::from_e6(lat as i32, lon as i32)
    }

    /// Latitude in microdegrees.
    pub fn lat_e6(&self) -> i32 {
        self.lat
    }

    /// Longitude in microdegrees.
    pub fn lon_e6(&self) -> i32 {
        self.lon
    }

    /// Latitude in 1e-5 degree units, rounded.
    pub fn lat_e5(&self) -> i32 {
        (f64::from(self.lat) / 10.0).round() as i32
    }

    /// Longitude in 1e-5 degree units, rounded.
    pub fn lon_e5(&self) -> i32 {
        (f64::from(self.lon) / 10.0).round() as i32
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        f64::from(self.lat) / 1e6
    }

    /// Longitude in degrees.
    pub fn lon(&self) -> f64 {
        f64::from(self.lon) / 1e6
    }

    /// Geodesic distance to another point in meters.
    ///
    /// Uses Vincenty's inverse formula on the WGS84 ellipsoid. For nearly
    /// antipodal points where the iteration does not converge, the last
    /// iterate is used, which is still accurate to well under a kilometer.
    pub fn distance_to(&self, other: &Point) -> f64 {
        if self == other {
            return 0.0;
        }
        vincenty_distance(self.lat(), self.lon(), other.lat(), other.lon())
    }
}

/// Vincenty inverse formula (NOAA "Inverse Formula", section 4).
#[allow(non_snake_case)]
fn vincenty_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const MAX_ITERATIONS: usize = 20;

    let f = (WGS84_A - WGS84_B) / WGS84_A;
    let a_sq_minus_b_sq_over_b_sq = (WGS84_A * WGS84_A - WGS84_B * WGS84_B) / (WGS84_B * WGS84_B);

    let L = (lon2 - lon1).to_radians();
    let U1 = ((1.0 - f) * lat1.to_radians().tan()).atan();
    let U2 = ((1.0 - f) * lat2.to_radians().tan()).atan();

    let (sin_u1, cos_u1) = U1.sin_cos();
    let (sin_u2, cos_u2) = U2.sin_cos();

    let mut A = 0.0;
    let mut sigma = 0.0;
    let mut delta_sigma = 0.0;
    let mut lambda = L;

    for _ in 0..MAX_ITERATIONS {
        let lambda_orig = lambda;
        let (sin_lambda, cos_lambda) = lambda.sin_cos();

        let t1 = cos_u2 * sin_lambda;
        let t2 = cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda;
        let sin_sigma = (t1 * t1 + t2 * t2).sqrt();
        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        sigma = sin_sigma.atan2(cos_sigma);

        let sin_alpha = if sin_sigma == 0.0 {
            0.0
        } else {
            cos_u1 * cos_u2 * sin_lambda / sin_sigma
        };
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        let cos_2sm = if cos_sq_alpha == 0.0 {
            0.0
        } else {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        };

        let u_sq = cos_sq_alpha * a_sq_minus_b_sq_over_b_sq;
        A = 1.0 + (u_sq / 16384.0) * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
        let B = (u_sq / 1024.0) * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
        let C = (f / 16.0) * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
        let cos_2sm_sq = cos_2sm * cos_2sm;

        delta_sigma = B
            * sin_sigma
            * (cos_2sm
                + (B / 4.0)
                    * (cos_sigma * (-1.0 + 2.0 * cos_2sm_sq)
                        - (B / 6.0)
                            * cos_2sm
                            * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                            * (-3.0 + 4.0 * cos_2sm_sq)));

        lambda = L
            + (1.0 - C)
                * f
                * sin_alpha
                * (sigma + C * sin_sigma * (cos_2sm + C * cos_sigma * (-1.0 + 2.0 * cos_2sm_sq)));

        if lambda == 0.0 || ((lambda - lambda_orig) / lambda).abs() < 1.0e-12 {
            break;
        }
    }

    WGS84_B * A * (sigma - delta_sigma)
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point({self})")
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}/{:.6}", self.lat(), self.lon())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_range() {
        assert!(Point::from_e6(0, 0).is_ok());
        assert!(Point::from_e6(MAX_LAT_E6, MAX_LON_E6).is_ok());
        assert!(Point::from_e6(-MAX_LAT_E6, -MAX_LON_E6).is_ok());
    }

    #[test]
    fn reject_out_of_range() {
        assert_eq!(
            Point::from_e6(MAX_LAT_E6 + 1, 0),
            Err(PointError::Latitude(MAX_LAT_E6 + 1))
        );
        assert_eq!(
            Point::from_e6(0, -MAX_LON_E6 - 1),
            Err(PointError::Longitude(-MAX_LON_E6 - 1))
        );
        assert!(Point::from_degrees(f64::NAN, 0.0).is_err());
        assert!(Point::from_degrees(0.0, 181.0).is_err());
    }

    #[test]
    fn degree_conversion_rounds_to_microdegrees() {
        let p = Point::from_degrees(52.377_548_4, 4.901_218_6).unwrap();
        assert_eq!(p.lat_e6(), 52_377_548);
        assert_eq!(p.lon_e6(), 4_901_219);
    }

    #[test]
    fn e5_units() {
        let p = Point::from_e5(5_237_755, 490_122).unwrap();
        assert_eq!(p.lat_e6(), 52_377_550);
        assert_eq!(p.lat_e5(), 5_237_755);
        assert_eq!(p.lon_e5(), 490_122);
    }

    #[test]
    fn display() {
        let p = Point::from_e6(52_377_548, 4_901_218).unwrap();
        assert_eq!(p.to_string(), "52.377548/4.901218");
        assert_eq!(format!("{p:?}"), "Point(52.377548/4.901218)");
    }

    #[test]
    fn distance_between_known_stations() {
        // Amsterdam Centraal to Amsterdam Zuid is roughly 5.1 km
        let centraal = Point::from_e6(52_378_901, 4_900_272).unwrap();
        let zuid = Point::from_e6(52_338_865, 4_873_148).unwrap();
        let d = centraal.distance_to(&zuid);
        assert!((4_700.0..5_100.0).contains(&d), "distance was {d}");
    }

    #[test]
    fn one_microdegree_is_well_under_a_meter() {
        let a = Point::from_e6(48_000_000, 11_000_000).unwrap();
        let b = Point::from_e6(48_000_001, 11_000_001).unwrap();
        assert!(a.distance_to(&b) < 1.0);
        assert_eq!(a.distance_to(&a), 0.0);
    }

    #[test]
    fn serde_validates() {
        let p: Point = serde_json::from_str(r#"{"lat":1,"lon":2}"#).unwrap();
        assert_eq!(p, Point::from_e6(1, 2).unwrap());
        assert!(serde_json::from_str::<Point>(r#"{"lat":95000000,"lon":2}"#).is_err());
    }
}
