//! Geospatial helpers for radius and distance queries.
//!
//! Distances are great-circle distances on a sphere. Radius queries convert
//! the requested distance into radians using the earth radius of the chosen
//! unit; distance queries compute metres and scale them to the unit.

use std::str::FromStr;

use serde_json::json;

use crate::error::AppError;

/// Earth radius used for metre distances.
pub const EARTH_RADIUS_METRES: f64 = 6_378_100.0;

const EARTH_RADIUS_MILES: f64 = 3963.2;
const EARTH_RADIUS_KM: f64 = 6378.1;

const METRES_TO_MILES: f64 = 0.000621371;
const METRES_TO_KM: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
    Miles,
    Kilometers,
}

impl DistanceUnit {
    pub fn earth_radius(self) -> f64 {
        match self {
            DistanceUnit::Miles => EARTH_RADIUS_MILES,
            DistanceUnit::Kilometers => EARTH_RADIUS_KM,
        }
    }

    /// Factor converting metres into this unit.
    pub fn multiplier(self) -> f64 {
        match self {
            DistanceUnit::Miles => METRES_TO_MILES,
            DistanceUnit::Kilometers => METRES_TO_KM,
        }
    }

    /// Converts a distance in this unit into radians on the earth's surface.
    pub fn to_radians(self, distance: f64) -> f64 {
        distance / self.earth_radius()
    }
}

impl FromStr for DistanceUnit {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mi" => Ok(DistanceUnit::Miles),
            "km" => Ok(DistanceUnit::Kilometers),
            other => Err(AppError::bad_request(
                "Please provide the unit as either mi or km.",
                json!({ "unit": other }),
            )),
        }
    }
}

/// A `lat,lng` pair taken from the URL.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl FromStr for LatLng {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            AppError::bad_request(
                "Please provide latitude and longitude in the format lat,lng.",
                json!({ "latlng": s }),
            )
        };

        let (lat, lng) = s.split_once(',').ok_or_else(invalid)?;
        let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
        let lng: f64 = lng.trim().parse().map_err(|_| invalid())?;

        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(invalid());
        }

        Ok(Self { lat, lng })
    }
}

/// Parses a radius distance. Must be a non-negative number.
pub fn parse_distance(raw: &str) -> Result<f64, AppError> {
    raw.parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| AppError::cast("distance", raw))
}

/// Central angle in radians between two points (haversine).
pub fn central_angle(a: LatLng, b: LatLng) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let d_lat = lat2 - lat1;
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * h.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_latlng() {
        let p: LatLng = "34.111745,-118.113491".parse().unwrap();
        assert_eq!(p.lat, 34.111745);
        assert_eq!(p.lng, -118.113491);

        assert!("34.1".parse::<LatLng>().is_err());
        assert!("abc,def".parse::<LatLng>().is_err());
        assert!("95,10".parse::<LatLng>().is_err());
    }

    #[test]
    fn test_parse_unit() {
        assert_eq!("mi".parse::<DistanceUnit>().unwrap(), DistanceUnit::Miles);
        assert_eq!("km".parse::<DistanceUnit>().unwrap(), DistanceUnit::Kilometers);
        assert!("yd".parse::<DistanceUnit>().is_err());
    }

    #[test]
    fn test_radius_in_radians() {
        assert!((DistanceUnit::Miles.to_radians(3963.2) - 1.0).abs() < f64::EPSILON);
        assert!((DistanceUnit::Kilometers.to_radians(637.81) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_parse_distance() {
        assert_eq!(parse_distance("250").unwrap(), 250.0);
        assert!(parse_distance("-1").is_err());
        assert_eq!(parse_distance("far").unwrap_err().to_string(), "Invalid distance: far");
    }

    #[test]
    fn test_central_angle() {
        let la = LatLng {
            lat: 34.0522,
            lng: -118.2437,
        };
        let ny = LatLng {
            lat: 40.7128,
            lng: -74.0060,
        };

        let km = central_angle(la, ny) * EARTH_RADIUS_METRES * DistanceUnit::Kilometers.multiplier();
        assert!((km - 3940.0).abs() < 20.0, "got {km}");
        assert_eq!(central_angle(la, la), 0.0);
    }
}
