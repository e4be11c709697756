/// A named point drawn on the map of locations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationPoint {
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
}

/// The fixed set of cities shown on the map.
pub const LOCATIONS: [LocationPoint; 3] = [
    LocationPoint {
        name: "San Francisco",
        latitude: 37.7749,
        longitude: -122.4194,
    },
    LocationPoint {
        name: "Los Angeles",
        latitude: 34.0522,
        longitude: -118.2437,
    },
    LocationPoint {
        name: "New York",
        latitude: 40.7128,
        longitude: -74.0060,
    },
];

/// Returns the `(latitude, longitude)` mean of `points`, the map's view centre.
///
/// Returns `(0.0, 0.0)` for an empty slice.
pub fn view_center(points: &[LocationPoint]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let n = points.len() as f64;
    let latitude = points.iter().map(|p| p.latitude).sum::<f64>() / n;
    let longitude = points.iter().map(|p| p.longitude).sum::<f64>() / n;
    (latitude, longitude)
}
