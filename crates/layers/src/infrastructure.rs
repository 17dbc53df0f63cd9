use crate::symbology::{InfrastructureStyle, infrastructure_style};
use formats::FeatureSet;
use model::{InfrastructureFeature, InfrastructureKind, ModelError};

/// One static infrastructure overlay (waterways, pumps, floodgates, gauges).
#[derive(Debug, Clone, PartialEq)]
pub struct InfrastructureLayer {
    kind: InfrastructureKind,
    features: Vec<InfrastructureFeature>,
}

impl InfrastructureLayer {
    pub fn from_features(kind: InfrastructureKind, set: &FeatureSet) -> Result<Self, ModelError> {
        let mut features = Vec::with_capacity(set.len());
        for feature in &set.features {
            features.push(InfrastructureFeature::from_feature(feature, kind)?);
        }
        Ok(InfrastructureLayer { kind, features })
    }

    pub fn empty(kind: InfrastructureKind) -> Self {
        InfrastructureLayer {
            kind,
            features: Vec::new(),
        }
    }

    pub fn kind(&self) -> InfrastructureKind {
        self.kind
    }

    pub fn style(&self) -> InfrastructureStyle {
        infrastructure_style(self.kind)
    }

    pub fn features(&self) -> &[InfrastructureFeature] {
        &self.features
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::InfrastructureLayer;
    use crate::symbology::InfrastructureStyle;
    use formats::{Feature, FeatureSet, GeoPoint, Geometry};
    use model::InfrastructureKind;

    #[test]
    fn waterways_draw_as_paths_and_pumps_as_icons() {
        let set = FeatureSet {
            features: vec![Feature {
                id: None,
                properties: serde_json::Map::new(),
                geometry: Geometry::LineString(vec![
                    GeoPoint::new(106.8, -6.2),
                    GeoPoint::new(106.81, -6.21),
                ]),
            }],
        };
        let waterways =
            InfrastructureLayer::from_features(InfrastructureKind::Waterway, &set).expect("layer");
        assert!(matches!(waterways.style(), InfrastructureStyle::Path(_)));

        let pumps = InfrastructureLayer::empty(InfrastructureKind::Pump);
        assert!(matches!(pumps.style(), InfrastructureStyle::Icon(_)));
        assert!(pumps.is_empty());
    }
}
