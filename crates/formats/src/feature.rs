use serde_json::{Map, Value};

use crate::geo::{GeoPoint, LonLatBounds};

/// Decoded vector geometry in lon/lat degrees (WGS84).
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(GeoPoint),
    MultiPoint(Vec<GeoPoint>),
    LineString(Vec<GeoPoint>),
    MultiLineString(Vec<Vec<GeoPoint>>),
    Polygon(Vec<Vec<GeoPoint>>),
    MultiPolygon(Vec<Vec<Vec<GeoPoint>>>),
}

impl Geometry {
    /// Bounds over every coordinate, `None` for degenerate empty geometries.
    pub fn bounds(&self) -> Option<LonLatBounds> {
        let mut out: Option<LonLatBounds> = None;
        self.for_each_point(&mut |p| match &mut out {
            Some(b) => b.extend(*p),
            None => out = Some(LonLatBounds::of(*p)),
        });
        out
    }

    pub fn for_each_point(&self, f: &mut impl FnMut(&GeoPoint)) {
        match self {
            Geometry::Point(p) => f(p),
            Geometry::MultiPoint(ps) | Geometry::LineString(ps) => {
                ps.iter().for_each(&mut *f);
            }
            Geometry::MultiLineString(lines) | Geometry::Polygon(lines) => {
                for line in lines {
                    line.iter().for_each(&mut *f);
                }
            }
            Geometry::MultiPolygon(polys) => {
                for rings in polys {
                    for ring in rings {
                        ring.iter().for_each(&mut *f);
                    }
                }
            }
        }
    }
}

/// One decoded feature: optional id, free-form property bag, geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Option<String>,
    pub properties: Map<String, Value>,
    pub geometry: Geometry,
}

/// A decoded feature collection, independent of the wire format it came in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    pub features: Vec<Feature>,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn bounds(&self) -> Option<LonLatBounds> {
        let mut out: Option<LonLatBounds> = None;
        for feature in &self.features {
            let Some(b) = feature.geometry.bounds() else {
                continue;
            };
            match &mut out {
                Some(acc) => acc.merge(b),
                None => out = Some(b),
            }
        }
        out
    }
}

#[derive(Debug)]
pub enum DecodeError {
    /// The payload root is not what the format requires.
    UnexpectedRoot(&'static str),
    InvalidFeature {
        index: usize,
        reason: String,
    },
    InvalidTopology(String),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::UnexpectedRoot(expected) => {
                write!(f, "expected {expected}")
            }
            DecodeError::InvalidFeature { index, reason } => {
                write!(f, "invalid feature at index {index}: {reason}")
            }
            DecodeError::InvalidTopology(reason) => {
                write!(f, "invalid topology: {reason}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

#[cfg(test)]
mod tests {
    use super::{Feature, FeatureSet, Geometry};
    use crate::geo::GeoPoint;
    use serde_json::Map;

    fn point_feature(lon: f64, lat: f64) -> Feature {
        Feature {
            id: None,
            properties: Map::new(),
            geometry: Geometry::Point(GeoPoint::new(lon, lat)),
        }
    }

    #[test]
    fn set_bounds_cover_all_features() {
        let set = FeatureSet {
            features: vec![point_feature(106.7, -6.3), point_feature(106.9, -6.1)],
        };
        let b = set.bounds().expect("bounds");
        assert_eq!(b.min, GeoPoint::new(106.7, -6.3));
        assert_eq!(b.max, GeoPoint::new(106.9, -6.1));
    }

    #[test]
    fn polygon_bounds_include_holes() {
        let geom = Geometry::Polygon(vec![
            vec![
                GeoPoint::new(0.0, 0.0),
                GeoPoint::new(4.0, 0.0),
                GeoPoint::new(4.0, 4.0),
                GeoPoint::new(0.0, 4.0),
            ],
            vec![
                GeoPoint::new(1.0, 1.0),
                GeoPoint::new(2.0, 1.0),
                GeoPoint::new(2.0, 2.0),
            ],
        ]);
        let b = geom.bounds().expect("bounds");
        assert_eq!(b.max, GeoPoint::new(4.0, 4.0));
    }
}
