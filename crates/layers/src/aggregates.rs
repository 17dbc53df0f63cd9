use std::collections::BTreeMap;

use crate::geometry::geometry_contains;
use formats::{FeatureSet, GeoPoint};
use model::{AggregateRegion, FloodState, ModelError, RegionId, RegionLevel, Report};

/// The aggregate overlay for one administrative level.
///
/// Regions keep their load order; `region_at` resolves overlapping polygons
/// to the first loaded one so pointer hit testing is deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateLayer {
    level: RegionLevel,
    regions: Vec<AggregateRegion>,
    by_pkey: BTreeMap<RegionId, usize>,
}

impl AggregateLayer {
    pub fn build(level: RegionLevel, regions: Vec<AggregateRegion>) -> Self {
        let mut layer = AggregateLayer {
            level,
            regions: Vec::with_capacity(regions.len()),
            by_pkey: BTreeMap::new(),
        };
        for region in regions {
            match layer.by_pkey.get(&region.pkey) {
                Some(&slot) => layer.regions[slot] = region,
                None => {
                    layer.by_pkey.insert(region.pkey, layer.regions.len());
                    layer.regions.push(region);
                }
            }
        }
        layer
    }

    pub fn from_features(level: RegionLevel, set: &FeatureSet) -> Result<Self, ModelError> {
        let mut regions = Vec::with_capacity(set.len());
        for feature in &set.features {
            regions.push(AggregateRegion::from_feature(feature, level)?);
        }
        Ok(Self::build(level, regions))
    }

    pub fn empty(level: RegionLevel) -> Self {
        Self::build(level, Vec::new())
    }

    pub fn level(&self) -> RegionLevel {
        self.level
    }

    pub fn regions(&self) -> &[AggregateRegion] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn region(&self, pkey: RegionId) -> Option<&AggregateRegion> {
        self.by_pkey.get(&pkey).map(|&slot| &self.regions[slot])
    }

    pub fn contains(&self, pkey: RegionId) -> bool {
        self.by_pkey.contains_key(&pkey)
    }

    /// Updates the recorded severity in place.
    ///
    /// Returns `true` if the value changed; unknown regions return `false`.
    pub fn set_state(&mut self, pkey: RegionId, state: FloodState) -> bool {
        let Some(&slot) = self.by_pkey.get(&pkey) else {
            return false;
        };
        if self.regions[slot].state == state {
            return false;
        }
        self.regions[slot].state = state;
        true
    }

    /// Overlays the server-computed DIMS status for a region.
    pub fn set_dims_state(&mut self, pkey: RegionId, dims_state: i64) -> bool {
        let Some(&slot) = self.by_pkey.get(&pkey) else {
            return false;
        };
        self.regions[slot].dims_state = Some(dims_state);
        true
    }

    pub fn set_selected(&mut self, pkey: RegionId, selected: bool) -> bool {
        let Some(&slot) = self.by_pkey.get(&pkey) else {
            return false;
        };
        if self.regions[slot].selected == selected {
            return false;
        }
        self.regions[slot].selected = selected;
        true
    }

    /// Recomputes every region's report count from point-in-polygon tests
    /// against the current report set.
    pub fn recount(&mut self, reports: &[Report]) {
        for region in &mut self.regions {
            region.count = reports
                .iter()
                .filter(|r| geometry_contains(&region.geometry, r.location))
                .count() as u32;
        }
    }

    /// First loaded region containing the point.
    pub fn region_at(&self, point: GeoPoint) -> Option<&AggregateRegion> {
        self.regions
            .iter()
            .find(|region| geometry_contains(&region.geometry, point))
    }
}

#[cfg(test)]
mod tests {
    use super::AggregateLayer;
    use formats::{GeoPoint, Geometry};
    use model::{AggregateRegion, FloodState, RegionId, RegionLevel, Report, ReportKey,
                ReportSource, ReportStatus};

    fn square(x0: f64, y0: f64, size: f64) -> Geometry {
        Geometry::Polygon(vec![vec![
            GeoPoint::new(x0, y0),
            GeoPoint::new(x0 + size, y0),
            GeoPoint::new(x0 + size, y0 + size),
            GeoPoint::new(x0, y0 + size),
            GeoPoint::new(x0, y0),
        ]])
    }

    fn region(pkey: u64, x0: f64) -> AggregateRegion {
        AggregateRegion {
            pkey: RegionId(pkey),
            level: RegionLevel::Neighbourhood,
            name: format!("RW {pkey:02}"),
            parent_name: Some("Kampung Melayu".to_string()),
            count: 0,
            state: FloodState::Unset,
            dims_state: None,
            selected: false,
            geometry: square(x0, 0.0, 1.0),
        }
    }

    fn report_at(key: u64, lon: f64, lat: f64) -> Report {
        Report {
            key: ReportKey(key),
            source: ReportSource::Twitter,
            status: ReportStatus::Confirmed,
            location: GeoPoint::new(lon, lat),
            text: String::new(),
            title: None,
            url: None,
            created_at: None,
            image_url: None,
        }
    }

    #[test]
    fn recount_assigns_reports_to_containing_regions() {
        let mut layer = AggregateLayer::build(
            RegionLevel::Neighbourhood,
            vec![region(1, 0.0), region(2, 2.0)],
        );
        layer.recount(&[
            report_at(10, 0.5, 0.5),
            report_at(11, 0.6, 0.4),
            report_at(12, 2.5, 0.5),
            report_at(13, 9.0, 9.0),
        ]);
        assert_eq!(layer.region(RegionId(1)).unwrap().count, 2);
        assert_eq!(layer.region(RegionId(2)).unwrap().count, 1);
    }

    #[test]
    fn set_state_reports_changes_only() {
        let mut layer =
            AggregateLayer::build(RegionLevel::Neighbourhood, vec![region(1, 0.0)]);
        assert!(layer.set_state(RegionId(1), FloodState::Minor));
        assert!(!layer.set_state(RegionId(1), FloodState::Minor));
        assert!(!layer.set_state(RegionId(9), FloodState::Minor));
        assert_eq!(layer.region(RegionId(1)).unwrap().state, FloodState::Minor);
    }

    #[test]
    fn region_at_prefers_load_order() {
        // Two coincident squares; the first loaded one wins.
        let layer = AggregateLayer::build(
            RegionLevel::Neighbourhood,
            vec![region(5, 0.0), region(6, 0.0)],
        );
        let hit = layer.region_at(GeoPoint::new(0.5, 0.5)).expect("hit");
        assert_eq!(hit.pkey, RegionId(5));
        assert!(layer.region_at(GeoPoint::new(8.0, 8.0)).is_none());
    }

    #[test]
    fn duplicate_pkeys_replace_in_place() {
        let mut newer = region(1, 0.0);
        newer.name = "RW 01 rev".to_string();
        let layer =
            AggregateLayer::build(RegionLevel::Neighbourhood, vec![region(1, 0.0), newer]);
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.region(RegionId(1)).unwrap().name, "RW 01 rev");
    }
}
