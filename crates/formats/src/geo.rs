/// A WGS84 coordinate in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoPoint {
    pub lon_deg: f64,
    pub lat_deg: f64,
}

impl GeoPoint {
    pub fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self { lon_deg, lat_deg }
    }
}

/// Axis-aligned lon/lat bounds in degrees.
///
/// No antimeridian handling: the service area is a single city well away
/// from the date line.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LonLatBounds {
    pub min: GeoPoint,
    pub max: GeoPoint,
}

impl LonLatBounds {
    pub fn of(point: GeoPoint) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    pub fn new(min: GeoPoint, max: GeoPoint) -> Self {
        Self { min, max }
    }

    pub fn extend(&mut self, point: GeoPoint) {
        self.min.lon_deg = self.min.lon_deg.min(point.lon_deg);
        self.min.lat_deg = self.min.lat_deg.min(point.lat_deg);
        self.max.lon_deg = self.max.lon_deg.max(point.lon_deg);
        self.max.lat_deg = self.max.lat_deg.max(point.lat_deg);
    }

    pub fn merge(&mut self, other: LonLatBounds) {
        self.extend(other.min);
        self.extend(other.max);
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min.lon_deg + self.max.lon_deg) * 0.5,
            (self.min.lat_deg + self.max.lat_deg) * 0.5,
        )
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        point.lon_deg >= self.min.lon_deg
            && point.lon_deg <= self.max.lon_deg
            && point.lat_deg >= self.min.lat_deg
            && point.lat_deg <= self.max.lat_deg
    }
}

#[cfg(test)]
mod tests {
    use super::{GeoPoint, LonLatBounds};

    #[test]
    fn extend_grows_bounds() {
        let mut b = LonLatBounds::of(GeoPoint::new(106.8, -6.2));
        b.extend(GeoPoint::new(106.9, -6.1));
        b.extend(GeoPoint::new(106.7, -6.3));
        assert_eq!(b.min, GeoPoint::new(106.7, -6.3));
        assert_eq!(b.max, GeoPoint::new(106.9, -6.1));
    }

    #[test]
    fn contains_is_inclusive() {
        let b = LonLatBounds::new(GeoPoint::new(106.5, -6.5), GeoPoint::new(107.1, -5.9));
        assert!(b.contains(GeoPoint::new(106.5, -5.9)));
        assert!(b.contains(GeoPoint::new(106.8, -6.2)));
        assert!(!b.contains(GeoPoint::new(107.2, -6.2)));
    }
}
