use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius used by the haversine formula.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 coordinate pair. Construct through [`Coordinate::new`] so the
/// bounds hold everywhere downstream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum InvalidCoordinate {
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinate> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(InvalidCoordinate::Latitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(InvalidCoordinate::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Great-circle distance between two points, in kilometers.
///
/// Used for display annotation only; filtering and ranking never depend on it.
pub fn distance_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_out_of_range_latitude() {
        let coord = Coordinate::new(90.5, 0.0);
        assert_eq!(coord, Err(InvalidCoordinate::Latitude(90.5)));
    }

    #[test]
    fn new_rejects_out_of_range_longitude() {
        let coord = Coordinate::new(0.0, -180.5);
        assert_eq!(coord, Err(InvalidCoordinate::Longitude(-180.5)));
    }

    #[test]
    fn new_accepts_boundary_values() {
        assert!(Coordinate::new(-90.0, 180.0).is_ok());
        assert!(Coordinate::new(90.0, -180.0).is_ok());
    }

    #[test]
    fn distance_to_self_is_zero() {
        let p = Coordinate::new(-23.5505, -46.6333).unwrap();
        assert_eq!(distance_km(&p, &p), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coordinate::new(51.5074, -0.1278).unwrap();
        let b = Coordinate::new(48.8566, 2.3522).unwrap();
        assert!((distance_km(&a, &b) - distance_km(&b, &a)).abs() < 1e-9);
    }

    #[test]
    fn distance_matches_sao_paulo_fixture() {
        let a = Coordinate::new(-23.5505, -46.6333).unwrap();
        let b = Coordinate::new(-23.5510, -46.6340).unwrap();
        let d = distance_km(&a, &b);
        assert!((d - 0.07).abs() < 0.02, "unexpected distance: {}", d);
    }
}
