use serde_json::{Map, Value};

use crate::error::ModelError;
use crate::report::{key_property, string_property};
use formats::{Feature, Geometry, LonLatBounds};

/// Server-assigned key of an administrative region polygon.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub u64);

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Administrative aggregation level served by the aggregates endpoint.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegionLevel {
    Subdistrict,
    Village,
    /// RW-level neighbourhood, the finest level and the one the table edits.
    Neighbourhood,
}

impl RegionLevel {
    pub const ALL: [RegionLevel; 3] = [
        RegionLevel::Subdistrict,
        RegionLevel::Village,
        RegionLevel::Neighbourhood,
    ];

    pub fn as_wire(self) -> &'static str {
        match self {
            RegionLevel::Subdistrict => "subdistrict",
            RegionLevel::Village => "village",
            RegionLevel::Neighbourhood => "rw",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "subdistrict" => Some(RegionLevel::Subdistrict),
            "village" => Some(RegionLevel::Village),
            "rw" => Some(RegionLevel::Neighbourhood),
            _ => None,
        }
    }
}

/// User-recorded flood severity for a region.
///
/// Code 0 means no data and renders transparent; 1 is caution; 2 through 4
/// are increasing flood-depth bands.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FloodState {
    #[default]
    Unset,
    Caution,
    Minor,
    Moderate,
    Severe,
}

impl FloodState {
    pub const ALL: [FloodState; 5] = [
        FloodState::Unset,
        FloodState::Caution,
        FloodState::Minor,
        FloodState::Moderate,
        FloodState::Severe,
    ];

    pub fn code(self) -> u8 {
        match self {
            FloodState::Unset => 0,
            FloodState::Caution => 1,
            FloodState::Minor => 2,
            FloodState::Moderate => 3,
            FloodState::Severe => 4,
        }
    }

    /// Unknown codes are a wire error, never clamped.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(FloodState::Unset),
            1 => Some(FloodState::Caution),
            2 => Some(FloodState::Minor),
            3 => Some(FloodState::Moderate),
            4 => Some(FloodState::Severe),
            _ => None,
        }
    }

    pub fn is_flooded(self) -> bool {
        self.code() >= 2
    }
}

/// One administrative region polygon with its aggregate report data.
///
/// `state` and `selected` are the only fields user interaction mutates;
/// `count` is recomputed from point-in-polygon counts against the loaded
/// reports.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRegion {
    pub pkey: RegionId,
    pub level: RegionLevel,
    pub name: String,
    pub parent_name: Option<String>,
    pub count: u32,
    pub state: FloodState,
    /// Auxiliary server-computed status, display-only.
    pub dims_state: Option<i64>,
    pub selected: bool,
    pub geometry: Geometry,
}

impl AggregateRegion {
    pub fn from_feature(feature: &Feature, level: RegionLevel) -> Result<Self, ModelError> {
        match &feature.geometry {
            Geometry::Polygon(_) | Geometry::MultiPolygon(_) => {}
            _ => return Err(ModelError::WrongGeometry("a polygon")),
        }

        let props = &feature.properties;
        Ok(AggregateRegion {
            pkey: RegionId(key_property(props, "pkey")?),
            level,
            name: string_property(props, "level_name")
                .ok_or(ModelError::MissingProperty("level_name"))?,
            parent_name: string_property(props, "parent_name"),
            count: count_property(props)?,
            state: state_property(props)?,
            dims_state: props.get("dims_state").and_then(Value::as_i64),
            selected: false,
            geometry: feature.geometry.clone(),
        })
    }

    pub fn bounds(&self) -> Option<LonLatBounds> {
        self.geometry.bounds()
    }
}

fn count_property(props: &Map<String, Value>) -> Result<u32, ModelError> {
    match props.get("count") {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => {
            n.as_u64()
                .map(|c| c as u32)
                .ok_or_else(|| ModelError::InvalidProperty {
                    key: "count",
                    reason: format!("not a non-negative integer: {n}"),
                })
        }
        Some(other) => Err(ModelError::InvalidProperty {
            key: "count",
            reason: format!("unexpected value: {other}"),
        }),
    }
}

fn state_property(props: &Map<String, Value>) -> Result<FloodState, ModelError> {
    let code = match props.get("state") {
        None | Some(Value::Null) => return Ok(FloodState::Unset),
        Some(Value::Number(n)) => n.as_u64(),
        Some(_) => None,
    };
    code.and_then(|c| u8::try_from(c).ok())
        .and_then(FloodState::from_code)
        .ok_or_else(|| ModelError::InvalidProperty {
            key: "state",
            reason: format!("unknown severity code: {:?}", props.get("state")),
        })
}

#[cfg(test)]
mod tests {
    use super::{AggregateRegion, FloodState, RegionLevel};
    use formats::{Feature, GeoPoint, Geometry};
    use serde_json::json;

    fn square() -> Geometry {
        Geometry::Polygon(vec![vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(1.0, 0.0),
            GeoPoint::new(1.0, 1.0),
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(0.0, 0.0),
        ]])
    }

    fn feature(props: serde_json::Value) -> Feature {
        Feature {
            id: None,
            properties: props.as_object().cloned().unwrap_or_default(),
            geometry: square(),
        }
    }

    #[test]
    fn builds_a_region_with_defaults() {
        let f = feature(json!({"pkey": 17, "level_name": "Kampung Melayu"}));
        let r = AggregateRegion::from_feature(&f, RegionLevel::Village).expect("region");
        assert_eq!(r.pkey.0, 17);
        assert_eq!(r.state, FloodState::Unset);
        assert_eq!(r.count, 0);
        assert!(!r.selected);
    }

    #[test]
    fn reads_state_count_and_parent() {
        let f = feature(json!({
            "pkey": 5,
            "level_name": "RW 04",
            "parent_name": "Kampung Melayu",
            "count": 12,
            "state": 3,
            "dims_state": 1
        }));
        let r = AggregateRegion::from_feature(&f, RegionLevel::Neighbourhood).expect("region");
        assert_eq!(r.state, FloodState::Moderate);
        assert_eq!(r.count, 12);
        assert_eq!(r.parent_name.as_deref(), Some("Kampung Melayu"));
        assert_eq!(r.dims_state, Some(1));
    }

    #[test]
    fn unknown_severity_codes_are_rejected() {
        let f = feature(json!({"pkey": 5, "level_name": "RW 04", "state": 9}));
        assert!(AggregateRegion::from_feature(&f, RegionLevel::Neighbourhood).is_err());
    }

    #[test]
    fn point_geometry_is_rejected() {
        let f = Feature {
            id: None,
            properties: json!({"pkey": 1, "level_name": "x"})
                .as_object()
                .cloned()
                .unwrap(),
            geometry: Geometry::Point(GeoPoint::new(0.0, 0.0)),
        };
        assert!(AggregateRegion::from_feature(&f, RegionLevel::Village).is_err());
    }

    #[test]
    fn severity_codes_round_trip() {
        for state in FloodState::ALL {
            assert_eq!(FloodState::from_code(state.code()), Some(state));
        }
        assert_eq!(FloodState::from_code(5), None);
    }

    #[test]
    fn flooded_threshold_sits_above_caution() {
        assert!(!FloodState::Unset.is_flooded());
        assert!(!FloodState::Caution.is_flooded());
        assert!(FloodState::Minor.is_flooded());
        assert!(FloodState::Severe.is_flooded());
    }
}
