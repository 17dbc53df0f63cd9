//! GeoJSON decoding.
//!
//! The flood API wraps empty layers as `{"features": null}` rather than an
//! empty array; that case decodes to `Ok(None)` and is not an error.

use serde_json::Value;

use crate::feature::{DecodeError, Feature, FeatureSet, Geometry};
use crate::geo::GeoPoint;

pub fn decode_str(payload: &str) -> Result<Option<FeatureSet>, DecodeError> {
    let value: Value = serde_json::from_str(payload).map_err(|e| DecodeError::InvalidFeature {
        index: 0,
        reason: format!("JSON parse error: {e}"),
    })?;
    decode(&value)
}

pub fn decode(value: &Value) -> Result<Option<FeatureSet>, DecodeError> {
    const ROOT: &str = "a GeoJSON FeatureCollection";

    let obj = value.as_object().ok_or(DecodeError::UnexpectedRoot(ROOT))?;
    match obj.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => {}
        _ => return Err(DecodeError::UnexpectedRoot(ROOT)),
    }

    let features = match obj.get("features") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(DecodeError::UnexpectedRoot(ROOT)),
    };

    let mut out = Vec::with_capacity(features.len());
    for (index, item) in features.iter().enumerate() {
        out.push(decode_feature(item).map_err(|reason| DecodeError::InvalidFeature {
            index,
            reason,
        })?);
    }
    Ok(Some(FeatureSet { features: out }))
}

fn decode_feature(value: &Value) -> Result<Feature, String> {
    let obj = value.as_object().ok_or("feature must be an object")?;
    match obj.get("type").and_then(Value::as_str) {
        Some("Feature") => {}
        Some(other) => return Err(format!("unexpected feature type: {other}")),
        None => return Err("feature missing type".to_string()),
    }

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

    let geometry = decode_geometry(obj.get("geometry").ok_or("feature missing geometry")?)?;

    Ok(Feature {
        id,
        properties,
        geometry,
    })
}

fn decode_geometry(value: &Value) -> Result<Geometry, String> {
    let obj = value.as_object().ok_or("geometry must be an object")?;
    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or("geometry missing type")?;
    let coords = obj
        .get("coordinates")
        .ok_or("geometry missing coordinates")?;

    match kind {
        "Point" => Ok(Geometry::Point(position(coords)?)),
        "MultiPoint" => Ok(Geometry::MultiPoint(positions(coords)?)),
        "LineString" => Ok(Geometry::LineString(positions(coords)?)),
        "MultiLineString" => Ok(Geometry::MultiLineString(nested(coords, positions)?)),
        "Polygon" => Ok(Geometry::Polygon(nested(coords, positions)?)),
        "MultiPolygon" => Ok(Geometry::MultiPolygon(nested(coords, |v| {
            nested(v, positions)
        })?)),
        other => Err(format!("unsupported geometry type: {other}")),
    }
}

fn position(value: &Value) -> Result<GeoPoint, String> {
    let arr = value.as_array().ok_or("position must be an array")?;
    if arr.len() < 2 {
        return Err("position must have [lon, lat]".to_string());
    }
    let lon = arr[0].as_f64().ok_or("position lon must be a number")?;
    let lat = arr[1].as_f64().ok_or("position lat must be a number")?;
    Ok(GeoPoint::new(lon, lat))
}

fn positions(value: &Value) -> Result<Vec<GeoPoint>, String> {
    nested(value, position)
}

fn nested<T>(value: &Value, mut element: impl FnMut(&Value) -> Result<T, String>) -> Result<Vec<T>, String> {
    let arr = value.as_array().ok_or("coordinates must be an array")?;
    let mut out = Vec::with_capacity(arr.len());
    for item in arr {
        out.push(element(item)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{decode, decode_str};
    use crate::feature::Geometry;
    use crate::geo::GeoPoint;
    use serde_json::json;

    #[test]
    fn decodes_a_point_collection() {
        let payload = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"pkey": 211, "source": "twitter"},
                "geometry": {"type": "Point", "coordinates": [106.83, -6.19]}
            }]
        });
        let set = decode(&payload).expect("decode").expect("non-empty");
        assert_eq!(set.len(), 1);
        assert_eq!(
            set.features[0].geometry,
            Geometry::Point(GeoPoint::new(106.83, -6.19))
        );
        assert_eq!(set.features[0].properties["pkey"], 211);
    }

    #[test]
    fn null_features_decode_to_empty_layer() {
        let set = decode_str(r#"{"type":"FeatureCollection","features":null}"#).expect("decode");
        assert!(set.is_none());
    }

    #[test]
    fn rejects_non_collection_roots() {
        assert!(decode_str(r#"{"type":"Feature"}"#).is_err());
        assert!(decode_str("[]").is_err());
    }

    #[test]
    fn rejects_malformed_coordinates() {
        let payload = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {},
                "geometry": {"type": "Point", "coordinates": [106.83]}
            }]
        });
        assert!(decode(&payload).is_err());
    }

    #[test]
    fn decodes_multipolygons() {
        let payload = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {},
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]]
                }
            }]
        });
        let set = decode(&payload).expect("decode").expect("non-empty");
        match &set.features[0].geometry {
            Geometry::MultiPolygon(polys) => {
                assert_eq!(polys.len(), 1);
                assert_eq!(polys[0][0].len(), 4);
            }
            other => panic!("unexpected geometry: {other:?}"),
        }
    }
}
