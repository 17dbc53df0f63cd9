use std::collections::BTreeMap;

use crate::popup::popup_html;
use crate::symbology::{MarkerStyle, marker_style};
use formats::GeoPoint;
use model::{Report, ReportKey};

/// One report rendered as a circular marker.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportMarker {
    pub key: ReportKey,
    pub location: GeoPoint,
    pub style: MarkerStyle,
    pub popup: String,
}

/// The report overlay: markers plus a lookup keyed by report id, so a
/// URL-specified report can be focused without refetching.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportLayer {
    markers: Vec<ReportMarker>,
    by_key: BTreeMap<ReportKey, usize>,
}

impl ReportLayer {
    pub fn build(reports: &[Report]) -> Self {
        let mut layer = ReportLayer::default();
        for report in reports {
            layer.insert(report);
        }
        layer
    }

    /// Adds one report, replacing any marker with the same key.
    pub fn insert(&mut self, report: &Report) {
        let marker = ReportMarker {
            key: report.key,
            location: report.location,
            style: marker_style(report.source, report.status),
            popup: popup_html(report),
        };
        match self.by_key.get(&report.key) {
            Some(&slot) => self.markers[slot] = marker,
            None => {
                self.by_key.insert(report.key, self.markers.len());
                self.markers.push(marker);
            }
        }
    }

    pub fn get(&self, key: ReportKey) -> Option<&ReportMarker> {
        self.by_key.get(&key).map(|&slot| &self.markers[slot])
    }

    pub fn contains(&self, key: ReportKey) -> bool {
        self.by_key.contains_key(&key)
    }

    pub fn markers(&self) -> &[ReportMarker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::ReportLayer;
    use formats::GeoPoint;
    use model::{Report, ReportKey, ReportSource, ReportStatus};

    fn report(key: u64, lon: f64) -> Report {
        Report {
            key: ReportKey(key),
            source: ReportSource::Twitter,
            status: ReportStatus::Confirmed,
            location: GeoPoint::new(lon, -6.2),
            text: "banjir".to_string(),
            title: None,
            url: None,
            created_at: None,
            image_url: None,
        }
    }

    #[test]
    fn lookup_by_key_finds_the_marker() {
        let layer = ReportLayer::build(&[report(1, 106.8), report(2, 106.9)]);
        assert_eq!(layer.len(), 2);
        let m = layer.get(ReportKey(2)).expect("marker");
        assert_eq!(m.location.lon_deg, 106.9);
        assert!(layer.get(ReportKey(3)).is_none());
    }

    #[test]
    fn inserting_an_existing_key_replaces_in_place() {
        let mut layer = ReportLayer::build(&[report(1, 106.8)]);
        layer.insert(&report(1, 106.7));
        assert_eq!(layer.len(), 1);
        assert_eq!(
            layer.get(ReportKey(1)).expect("marker").location.lon_deg,
            106.7
        );
    }
}
