//! TopoJSON topology decoding.
//!
//! Bulk layers arrive as quantized topologies. Decoding applies the
//! quantization transform, delta-decodes arcs, and stitches shared arcs back
//! into per-feature rings so downstream code only ever sees a `FeatureSet`.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::feature::{DecodeError, Feature, FeatureSet, Geometry};
use crate::geo::GeoPoint;

/// Object name the flood API uses for its layer collections.
pub const COLLECTION_OBJECT: &str = "collection";

const ROOT: &str = "a TopoJSON Topology";

#[derive(Debug, Clone, Copy, Deserialize)]
struct Transform {
    scale: [f64; 2],
    translate: [f64; 2],
}

impl Transform {
    fn apply(&self, x: f64, y: f64) -> GeoPoint {
        GeoPoint::new(
            x * self.scale[0] + self.translate[0],
            y * self.scale[1] + self.translate[1],
        )
    }
}

pub fn decode_str(payload: &str) -> Result<Option<FeatureSet>, DecodeError> {
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| DecodeError::InvalidTopology(format!("JSON parse error: {e}")))?;
    decode(&value)
}

pub fn decode(value: &Value) -> Result<Option<FeatureSet>, DecodeError> {
    decode_object(value, COLLECTION_OBJECT)
}

/// Decodes the named object of a topology into features.
pub fn decode_object(value: &Value, object: &str) -> Result<Option<FeatureSet>, DecodeError> {
    let obj = value.as_object().ok_or(DecodeError::UnexpectedRoot(ROOT))?;

    // The API signals an empty layer with a `features: null` stub in place of
    // a real topology.
    if matches!(obj.get("features"), Some(Value::Null)) {
        return Ok(None);
    }

    match obj.get("type").and_then(Value::as_str) {
        Some("Topology") => {}
        _ => return Err(DecodeError::UnexpectedRoot(ROOT)),
    }

    let transform = match obj.get("transform") {
        None | Some(Value::Null) => None,
        Some(t) => Some(
            Transform::deserialize(t)
                .map_err(|e| DecodeError::InvalidTopology(format!("bad transform: {e}")))?,
        ),
    };

    let arcs = decode_arcs(obj.get("arcs"), transform.as_ref())?;

    let target = obj
        .get("objects")
        .and_then(Value::as_object)
        .and_then(|objects| objects.get(object))
        .ok_or_else(|| DecodeError::InvalidTopology(format!("missing object '{object}'")))?;

    let mut features = Vec::new();
    collect_features(target, &arcs, transform.as_ref(), &mut features)
        .map_err(DecodeError::InvalidTopology)?;
    Ok(Some(FeatureSet { features }))
}

fn collect_features(
    value: &Value,
    arcs: &[Vec<GeoPoint>],
    transform: Option<&Transform>,
    out: &mut Vec<Feature>,
) -> Result<(), String> {
    let obj = value.as_object().ok_or("geometry object must be an object")?;
    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or("geometry object missing type")?;

    if kind == "GeometryCollection" {
        let members = obj
            .get("geometries")
            .and_then(Value::as_array)
            .ok_or("GeometryCollection missing geometries")?;
        for member in members {
            collect_features(member, arcs, transform, out)?;
        }
        return Ok(());
    }

    let geometry = decode_geometry(kind, obj, arcs, transform)?;
    let id = match obj.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    let properties = obj
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    out.push(Feature {
        id,
        properties,
        geometry,
    });
    Ok(())
}

fn decode_geometry(
    kind: &str,
    obj: &Map<String, Value>,
    arcs: &[Vec<GeoPoint>],
    transform: Option<&Transform>,
) -> Result<Geometry, String> {
    match kind {
        "Point" => {
            let (x, y) = pair(obj.get("coordinates").ok_or("Point missing coordinates")?)?;
            Ok(Geometry::Point(absolute(x, y, transform)))
        }
        "MultiPoint" => {
            let items = array(obj.get("coordinates"), "MultiPoint coordinates")?;
            let mut points = Vec::with_capacity(items.len());
            for item in items {
                let (x, y) = pair(item)?;
                points.push(absolute(x, y, transform));
            }
            Ok(Geometry::MultiPoint(points))
        }
        "LineString" => {
            let indices = arc_indices(obj.get("arcs"), "LineString arcs")?;
            Ok(Geometry::LineString(stitch(&indices, arcs)?))
        }
        "MultiLineString" => {
            let mut lines = Vec::new();
            for line in array(obj.get("arcs"), "MultiLineString arcs")? {
                let indices = arc_indices(Some(line), "MultiLineString arc list")?;
                lines.push(stitch(&indices, arcs)?);
            }
            Ok(Geometry::MultiLineString(lines))
        }
        "Polygon" => Ok(Geometry::Polygon(decode_rings(obj.get("arcs"), arcs)?)),
        "MultiPolygon" => {
            let mut polys = Vec::new();
            for poly in array(obj.get("arcs"), "MultiPolygon arcs")? {
                polys.push(decode_rings(Some(poly), arcs)?);
            }
            Ok(Geometry::MultiPolygon(polys))
        }
        other => Err(format!("unsupported geometry type: {other}")),
    }
}

fn decode_rings(
    value: Option<&Value>,
    arcs: &[Vec<GeoPoint>],
) -> Result<Vec<Vec<GeoPoint>>, String> {
    let mut rings = Vec::new();
    for ring in array(value, "Polygon arcs")? {
        let indices = arc_indices(Some(ring), "ring arc list")?;
        rings.push(stitch(&indices, arcs)?);
    }
    Ok(rings)
}

/// Concatenates arcs into one point run.
///
/// A negative index `i` selects arc `-1 - i` in reversed orientation. Each
/// subsequent arc shares its first point with the previous arc's last point;
/// the duplicate is dropped while stitching.
fn stitch(indices: &[i64], arcs: &[Vec<GeoPoint>]) -> Result<Vec<GeoPoint>, String> {
    let mut out: Vec<GeoPoint> = Vec::new();
    for &ix in indices {
        let (arc_index, reversed) = if ix < 0 {
            ((-1 - ix) as usize, true)
        } else {
            (ix as usize, false)
        };
        let arc = arcs
            .get(arc_index)
            .ok_or_else(|| format!("arc index {ix} out of range"))?;

        let skip = usize::from(!out.is_empty());
        if reversed {
            out.extend(arc.iter().rev().skip(skip));
        } else {
            out.extend(arc.iter().skip(skip));
        }
    }
    Ok(out)
}

fn decode_arcs(
    value: Option<&Value>,
    transform: Option<&Transform>,
) -> Result<Vec<Vec<GeoPoint>>, DecodeError> {
    let raw = value
        .and_then(Value::as_array)
        .ok_or_else(|| DecodeError::InvalidTopology("missing arcs".to_string()))?;

    let mut arcs = Vec::with_capacity(raw.len());
    for (arc_index, arc_val) in raw.iter().enumerate() {
        let points = arc_val.as_array().ok_or_else(|| {
            DecodeError::InvalidTopology(format!("arc {arc_index} must be an array"))
        })?;

        let mut arc = Vec::with_capacity(points.len());
        // Quantized arcs are delta-encoded; untransformed arcs are absolute.
        let mut x = 0.0;
        let mut y = 0.0;
        for point in points {
            let (dx, dy) = pair(point).map_err(|reason| {
                DecodeError::InvalidTopology(format!("arc {arc_index}: {reason}"))
            })?;
            match transform {
                Some(t) => {
                    x += dx;
                    y += dy;
                    arc.push(t.apply(x, y));
                }
                None => arc.push(GeoPoint::new(dx, dy)),
            }
        }
        arcs.push(arc);
    }
    Ok(arcs)
}

fn absolute(x: f64, y: f64, transform: Option<&Transform>) -> GeoPoint {
    match transform {
        Some(t) => t.apply(x, y),
        None => GeoPoint::new(x, y),
    }
}

fn pair(value: &Value) -> Result<(f64, f64), String> {
    let arr = value.as_array().ok_or("position must be an array")?;
    if arr.len() < 2 {
        return Err("position must have two components".to_string());
    }
    let x = arr[0].as_f64().ok_or("position x must be a number")?;
    let y = arr[1].as_f64().ok_or("position y must be a number")?;
    Ok((x, y))
}

fn array<'a>(value: Option<&'a Value>, what: &str) -> Result<&'a Vec<Value>, String> {
    value
        .and_then(Value::as_array)
        .ok_or_else(|| format!("{what} must be an array"))
}

fn arc_indices(value: Option<&Value>, what: &str) -> Result<Vec<i64>, String> {
    let mut out = Vec::new();
    for item in array(value, what)? {
        out.push(
            item.as_i64()
                .ok_or_else(|| format!("{what} entries must be integers"))?,
        );
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{decode, decode_str};
    use crate::feature::Geometry;
    use serde_json::json;

    fn close_to(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    // Two adjacent quantized squares sharing their middle edge as arc 1.
    fn sample_topology() -> serde_json::Value {
        json!({
            "type": "Topology",
            "transform": {"scale": [0.001, 0.001], "translate": [106.0, -7.0]},
            "arcs": [
                // west square, open boundary (up the left side, across the top)
                [[800, 700], [0, 10], [10, 0]],
                // shared edge, north to south
                [[810, 710], [0, -10]],
                // closes the west square along the bottom
                [[810, 700], [-10, 0]],
                // east square's own boundary, counterclockwise from its NW corner
                [[810, 710], [10, 0], [0, -10], [-10, 0]]
            ],
            "objects": {
                "collection": {
                    "type": "GeometryCollection",
                    "geometries": [
                        {
                            "type": "Polygon",
                            "arcs": [[0, 1, 2]],
                            "id": 1,
                            "properties": {"level_name": "Kali Barat"}
                        },
                        {
                            "type": "Polygon",
                            "arcs": [[-2, 3]],
                            "id": 2,
                            "properties": {"level_name": "Kali Timur"}
                        }
                    ]
                }
            }
        })
    }

    #[test]
    fn stitches_shared_arcs_into_closed_rings() {
        let set = decode(&sample_topology()).expect("decode").expect("non-empty");
        assert_eq!(set.len(), 2);

        let Geometry::Polygon(rings) = &set.features[0].geometry else {
            panic!("expected polygon");
        };
        let ring = &rings[0];
        assert_eq!(ring.len(), 5);
        // Ring closes on its starting corner.
        assert!(close_to(ring[0].lon_deg, ring[4].lon_deg));
        assert!(close_to(ring[0].lat_deg, ring[4].lat_deg));
        assert!(close_to(ring[0].lon_deg, 106.8));
        assert!(close_to(ring[0].lat_deg, -6.3));
    }

    #[test]
    fn negative_indices_reverse_the_shared_arc() {
        let set = decode(&sample_topology()).expect("decode").expect("non-empty");
        let Geometry::Polygon(rings) = &set.features[1].geometry else {
            panic!("expected polygon");
        };
        let ring = &rings[0];
        // Reversed arc 1 leads south-to-north, arc 3 completes the ring.
        assert_eq!(ring.len(), 5);
        assert!(close_to(ring[0].lon_deg, 106.81));
        assert!(close_to(ring[0].lat_deg, -6.3));
        assert!(close_to(ring[1].lat_deg, -6.29));
        assert!(close_to(ring[0].lon_deg, ring[4].lon_deg));
        assert!(close_to(ring[0].lat_deg, ring[4].lat_deg));
    }

    #[test]
    fn carries_ids_and_properties() {
        let set = decode(&sample_topology()).expect("decode").expect("non-empty");
        assert_eq!(set.features[0].id.as_deref(), Some("1"));
        assert_eq!(set.features[1].properties["level_name"], "Kali Timur");
    }

    #[test]
    fn null_features_decode_to_empty_layer() {
        let set = decode_str(r#"{"features":null}"#).expect("decode");
        assert!(set.is_none());
    }

    #[test]
    fn point_coordinates_pass_through_the_transform() {
        let topo = json!({
            "type": "Topology",
            "transform": {"scale": [0.001, 0.001], "translate": [106.0, -7.0]},
            "arcs": [],
            "objects": {
                "collection": {
                    "type": "GeometryCollection",
                    "geometries": [
                        {"type": "Point", "coordinates": [832, 808], "properties": {}}
                    ]
                }
            }
        });
        let set = decode(&topo).expect("decode").expect("non-empty");
        let Geometry::Point(p) = &set.features[0].geometry else {
            panic!("expected point");
        };
        assert!(close_to(p.lon_deg, 106.832));
        assert!(close_to(p.lat_deg, -6.192));
    }

    #[test]
    fn untransformed_arcs_are_absolute() {
        let topo = json!({
            "type": "Topology",
            "arcs": [[[106.8, -6.3], [106.81, -6.3]]],
            "objects": {
                "collection": {"type": "LineString", "arcs": [0], "properties": {}}
            }
        });
        let set = decode(&topo).expect("decode").expect("non-empty");
        let Geometry::LineString(points) = &set.features[0].geometry else {
            panic!("expected line");
        };
        assert_eq!(points.len(), 2);
        assert!(close_to(points[1].lon_deg, 106.81));
    }
}
