use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean Earth radius in metres, used for haversine distances
const EARTH_RADIUS: f64 = 6_371_008.8;

/// A WGS84 coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validates that the coordinates are within valid ranges
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }

    /// Same as [`LatLng::is_valid`], as a validation result
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ValidationError::CoordinatesOutOfRange {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }

    /// Great-circle distance in metres (haversine)
    pub fn distance_to(&self, other: &LatLng) -> f64 {
        let lat1_rad = self.lat.to_radians();
        let lat2_rad = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lng = (other.lng - self.lng).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS * c
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lng)
    }
}

/// Represents a bounding box of geographical coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl LatLngBounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Creates bounds from individual coordinates
    pub fn from_coords(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self::new(LatLng::new(south, west), LatLng::new(north, east))
    }

    /// Checks if the bounds contain a point
    pub fn contains(&self, point: &LatLng) -> bool {
        point.lat >= self.south_west.lat
            && point.lat <= self.north_east.lat
            && point.lng >= self.south_west.lng
            && point.lng <= self.north_east.lng
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lat_lng_range() {
        assert!(LatLng::new(19.0760, 72.8777).is_valid());
        assert!(LatLng::new(-90.0, 180.0).is_valid());
        assert!(!LatLng::new(90.5, 0.0).is_valid());
        assert!(!LatLng::new(0.0, -180.01).is_valid());
        assert!(!LatLng::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_validate_reports_offending_coordinates() {
        let err = LatLng::new(120.0, 10.0).validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::CoordinatesOutOfRange { lat: 120.0, lng: 10.0 }
        );
    }

    #[test]
    fn test_lat_lng_distance() {
        let mumbai = LatLng::new(19.0760, 72.8777);
        let pune = LatLng::new(18.5204, 73.8567);
        let distance = mumbai.distance_to(&pune);

        // Roughly 120 km apart
        assert!((distance - 120_000.0).abs() < 5_000.0);
    }

    #[test]
    fn test_display_uses_four_decimals() {
        assert_eq!(LatLng::new(19.07601, 72.87771).to_string(), "19.0760, 72.8777");
    }

    #[test]
    fn test_bounds_contains_edges() {
        let bounds = LatLngBounds::from_coords(18.5, 72.8, 19.2, 73.8);
        assert!(bounds.contains(&LatLng::new(19.0, 73.0)));
        assert!(bounds.contains(&LatLng::new(18.5, 72.8)));
        assert!(bounds.contains(&LatLng::new(19.2, 73.8)));
        assert!(!bounds.contains(&LatLng::new(20.0, 73.0)));
        assert!(!bounds.contains(&LatLng::new(19.0, 72.7)));
    }
}
