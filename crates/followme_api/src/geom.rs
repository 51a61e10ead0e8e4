use crate::prelude::*;

/// radius of the earth in meters
pub const EARTH_RADIUS: f64 = 6371e3;

/// A geographic point in degrees. This is both the wire format of `position` and what we hand to the map.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
    fn to_radians(self) -> (f64, f64) {
        (self.lat.to_radians(), self.lng.to_radians())
    }
    /// Distance in meters to `other` using the haversine formula.
    ///
    /// <http://www.movable-type.co.uk/scripts/latlong.html>
    pub fn distance_to(self, other: LatLng) -> f64 {
        let (lat1, lng1) = self.to_radians();
        let (lat2, lng2) = other.to_radians();
        let dlat = lat2 - lat1;
        let dlng = lng2 - lng1;

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS * c
    }
    /// Initial bearing towards `other`, in degrees within `[0, 360)`.
    ///
    /// θ = atan2(sin Δλ ⋅ cos φ2 , cos φ1 ⋅ sin φ2 − sin φ1 ⋅ cos φ2 ⋅ cos Δλ)
    pub fn bearing_to(self, other: LatLng) -> f64 {
        let (lat1, lng1) = self.to_radians();
        let (lat2, lng2) = other.to_radians();
        let dlng = lng2 - lng1;
        let x = dlng.sin() * lat2.cos();
        let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlng.cos();
        x.atan2(y).to_degrees().rem_euclid(360.0)
    }
    /// The point reached by travelling `distance` meters from self along `bearing` degrees.
    pub fn move_bearing(self, bearing: f64, distance: f64) -> LatLng {
        let (lat1, lng1) = self.to_radians();
        let b = bearing.to_radians();
        let angular = distance / EARTH_RADIUS;

        let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * b.cos()).asin();
        let lng2 = lng1
            + (b.sin() * angular.sin() * lat1.cos()).atan2(angular.cos() - lat1.sin() * lat2.sin());
        LatLng::new(lat2.to_degrees(), lng2.to_degrees())
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.lat, self.lng)
    }
}
