use serde::Deserialize;

use crate::error::ModelError;
use crate::report::string_property;
use formats::{Feature, Geometry};

/// Hydrological infrastructure layer kinds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum InfrastructureKind {
    Waterway,
    Pump,
    Floodgate,
    Gauge,
}

impl InfrastructureKind {
    pub const ALL: [InfrastructureKind; 4] = [
        InfrastructureKind::Waterway,
        InfrastructureKind::Pump,
        InfrastructureKind::Floodgate,
        InfrastructureKind::Gauge,
    ];

    /// Path segment used by the infrastructure endpoint.
    pub fn as_wire(self) -> &'static str {
        match self {
            InfrastructureKind::Waterway => "waterways",
            InfrastructureKind::Pump => "pumps",
            InfrastructureKind::Floodgate => "floodgates",
            InfrastructureKind::Gauge => "gauges",
        }
    }
}

/// One river-gauge reading.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GaugeObservation {
    pub measured_at: String,
    pub depth_cm: f64,
}

/// A static infrastructure feature. Gauges carry their recent observations;
/// other kinds have none.
#[derive(Debug, Clone, PartialEq)]
pub struct InfrastructureFeature {
    pub name: String,
    pub kind: InfrastructureKind,
    pub geometry: Geometry,
    pub observations: Vec<GaugeObservation>,
}

impl InfrastructureFeature {
    pub fn from_feature(feature: &Feature, kind: InfrastructureKind) -> Result<Self, ModelError> {
        let observations = match feature.properties.get("observations") {
            Some(value) if kind == InfrastructureKind::Gauge => {
                Vec::<GaugeObservation>::deserialize(value).map_err(|e| {
                    ModelError::InvalidProperty {
                        key: "observations",
                        reason: e.to_string(),
                    }
                })?
            }
            _ => Vec::new(),
        };

        Ok(InfrastructureFeature {
            name: string_property(&feature.properties, "name").unwrap_or_default(),
            kind,
            geometry: feature.geometry.clone(),
            observations,
        })
    }
}
