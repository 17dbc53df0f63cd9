use crate::symbology::{COUNT_GRADES, count_color};
use model::{AggregateRegion, FloodState};

/// One swatch of the graded report-count legend.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CountLegendEntry {
    pub grade: u32,
    pub color: &'static str,
}

/// Swatches for the hover legend: one per grade boundary, colored by the
/// bucket the boundary opens.
pub fn count_legend() -> Vec<CountLegendEntry> {
    COUNT_GRADES
        .iter()
        .map(|&grade| CountLegendEntry {
            grade,
            color: count_color(grade + 1),
        })
        .collect()
}

/// Region counts per recorded severity state, shown next to the REM editor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeverityLegend {
    counts: [usize; 5],
}

impl SeverityLegend {
    pub fn tally(regions: &[AggregateRegion]) -> Self {
        let mut counts = [0usize; 5];
        for region in regions {
            counts[region.state.code() as usize] += 1;
        }
        SeverityLegend { counts }
    }

    pub fn count(&self, state: FloodState) -> usize {
        self.counts[state.code() as usize]
    }

    pub fn entries(&self) -> impl Iterator<Item = (FloodState, usize)> + '_ {
        FloodState::ALL
            .into_iter()
            .map(|state| (state, self.counts[state.code() as usize]))
    }
}

#[cfg(test)]
mod tests {
    use super::{SeverityLegend, count_legend};
    use formats::{GeoPoint, Geometry};
    use model::{AggregateRegion, FloodState, RegionId, RegionLevel};

    fn region(pkey: u64, state: FloodState) -> AggregateRegion {
        AggregateRegion {
            pkey: RegionId(pkey),
            level: RegionLevel::Neighbourhood,
            name: format!("RW {pkey}"),
            parent_name: None,
            count: 0,
            state,
            dims_state: None,
            selected: false,
            geometry: Geometry::Polygon(vec![vec![
                GeoPoint::new(0.0, 0.0),
                GeoPoint::new(1.0, 0.0),
                GeoPoint::new(1.0, 1.0),
                GeoPoint::new(0.0, 0.0),
            ]]),
        }
    }

    #[test]
    fn tally_counts_by_state() {
        let legend = SeverityLegend::tally(&[
            region(1, FloodState::Unset),
            region(2, FloodState::Minor),
            region(3, FloodState::Minor),
            region(4, FloodState::Severe),
        ]);
        assert_eq!(legend.count(FloodState::Unset), 1);
        assert_eq!(legend.count(FloodState::Minor), 2);
        assert_eq!(legend.count(FloodState::Caution), 0);
        assert_eq!(legend.count(FloodState::Severe), 1);
    }

    #[test]
    fn count_legend_has_one_swatch_per_grade() {
        let entries = count_legend();
        assert_eq!(entries.len(), 8);
        assert_eq!(entries[0].grade, 0);
        assert_eq!(entries[7].grade, 30);
    }
}
