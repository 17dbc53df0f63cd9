use crate::binding::RowId;
use crate::effect::Effect;
use crate::table::TableModel;
use model::RegionId;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum InteractionState {
    #[default]
    Idle,
    Hover(RegionId),
    Selected(RegionId),
}

/// Hover/select state machine shared by map polygons and table rows.
///
/// Contract:
/// - At most one region is highlighted or selected at a time; activating a
///   new highlight first clears the prior one (last-write-wins, no queue).
/// - While a region is selected, hover events change nothing until the
///   selection is cleared by a second click or an explicit deselect.
/// - Transitions return effects for the shell to execute; the controller
///   itself never touches DOM, canvas, or network.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InteractionController {
    state: InteractionState,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn selected_region(&self) -> Option<RegionId> {
        match self.state {
            InteractionState::Selected(region) => Some(region),
            _ => None,
        }
    }

    pub fn pointer_enter(&mut self, region: RegionId, table: &TableModel) -> Vec<Effect> {
        match self.state {
            InteractionState::Selected(_) => Vec::new(),
            InteractionState::Hover(prev) if prev == region => Vec::new(),
            InteractionState::Hover(prev) => {
                let mut effects = clear_highlight(prev, table);
                effects.extend(highlight(region, table));
                self.state = InteractionState::Hover(region);
                effects
            }
            InteractionState::Idle => {
                self.state = InteractionState::Hover(region);
                highlight(region, table)
            }
        }
    }

    pub fn pointer_leave(&mut self, region: RegionId, table: &TableModel) -> Vec<Effect> {
        match self.state {
            InteractionState::Hover(current) if current == region => {
                self.state = InteractionState::Idle;
                let mut effects = clear_highlight(region, table);
                effects.push(Effect::ClearInfo);
                effects
            }
            // Selected: suppressed. Hover of another region: a stale leave.
            _ => Vec::new(),
        }
    }

    pub fn click(&mut self, region: RegionId, table: &TableModel) -> Vec<Effect> {
        match self.state {
            InteractionState::Selected(current) if current == region => self.deselect(table),
            InteractionState::Selected(current) => {
                // Last-write-wins: the selection moves to the new region.
                let mut effects = vec![Effect::SetSelected {
                    region: current,
                    selected: false,
                }];
                effects.extend(clear_highlight(current, table));
                effects.extend(self.select(region, table));
                effects
            }
            InteractionState::Hover(prev) if prev != region => {
                let mut effects = clear_highlight(prev, table);
                effects.extend(self.select(region, table));
                effects
            }
            InteractionState::Hover(_) | InteractionState::Idle => self.select(region, table),
        }
    }

    pub fn deselect(&mut self, table: &TableModel) -> Vec<Effect> {
        let InteractionState::Selected(region) = self.state else {
            return Vec::new();
        };
        self.state = InteractionState::Idle;
        let mut effects = vec![Effect::SetSelected {
            region,
            selected: false,
        }];
        effects.extend(clear_highlight(region, table));
        effects.push(Effect::ClearInfo);
        effects
    }

    /// Row-side entry points: rows address regions through the binding, so a
    /// hover on either side highlights both.
    pub fn row_enter(&mut self, row: RowId, table: &TableModel) -> Vec<Effect> {
        match table.region_for_row(row) {
            Some(region) => self.pointer_enter(region, table),
            None => Vec::new(),
        }
    }

    pub fn row_leave(&mut self, row: RowId, table: &TableModel) -> Vec<Effect> {
        match table.region_for_row(row) {
            Some(region) => self.pointer_leave(region, table),
            None => Vec::new(),
        }
    }

    pub fn row_click(&mut self, row: RowId, table: &TableModel) -> Vec<Effect> {
        match table.region_for_row(row) {
            Some(region) => self.click(region, table),
            None => Vec::new(),
        }
    }

    fn select(&mut self, region: RegionId, table: &TableModel) -> Vec<Effect> {
        self.state = InteractionState::Selected(region);
        let mut effects = vec![
            Effect::SetSelected {
                region,
                selected: true,
            },
            Effect::SelectLayer(region),
        ];
        if let Some(row) = table.row_for_region(region) {
            if let Some(parent) = table.parent_of(row) {
                effects.push(Effect::ExpandParentRow(parent));
            }
            effects.push(Effect::HighlightRow(row));
            effects.push(Effect::ScrollRowIntoView(row));
        }
        effects.push(Effect::ShowRegionInfo(region));
        effects
    }
}

fn highlight(region: RegionId, table: &TableModel) -> Vec<Effect> {
    let mut effects = vec![Effect::HighlightLayer(region)];
    if let Some(row) = table.row_for_region(region) {
        effects.push(Effect::HighlightRow(row));
        effects.push(Effect::ScrollRowIntoView(row));
    }
    effects.push(Effect::ShowRegionInfo(region));
    effects
}

fn clear_highlight(region: RegionId, table: &TableModel) -> Vec<Effect> {
    let mut effects = vec![Effect::RestyleLayer(region)];
    if let Some(row) = table.row_for_region(region) {
        effects.push(Effect::ClearRowHighlight(row));
    }
    effects
}

#[cfg(test)]
mod tests {
    use super::{InteractionController, InteractionState};
    use crate::effect::Effect;
    use crate::table::TableModel;
    use formats::{GeoPoint, Geometry};
    use layers::AggregateLayer;
    use model::{AggregateRegion, FloodState, RegionId, RegionLevel};

    fn region(pkey: u64, level: RegionLevel, name: &str, parent: Option<&str>) -> AggregateRegion {
        AggregateRegion {
            pkey: RegionId(pkey),
            level,
            name: name.to_string(),
            parent_name: parent.map(str::to_string),
            count: 0,
            state: FloodState::Unset,
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

    fn table() -> TableModel {
        let villages = AggregateLayer::build(
            RegionLevel::Village,
            vec![region(1, RegionLevel::Village, "Kampung Melayu", None)],
        );
        let neighbourhoods = AggregateLayer::build(
            RegionLevel::Neighbourhood,
            vec![
                region(10, RegionLevel::Neighbourhood, "RW 01", Some("Kampung Melayu")),
                region(11, RegionLevel::Neighbourhood, "RW 02", Some("Kampung Melayu")),
            ],
        );
        TableModel::build(&villages, &neighbourhoods)
    }

    #[test]
    fn hover_highlights_layer_row_and_info() {
        let table = table();
        let mut ctl = InteractionController::new();

        let effects = ctl.pointer_enter(RegionId(10), &table);
        assert!(effects.contains(&Effect::HighlightLayer(RegionId(10))));
        assert!(effects.iter().any(|e| matches!(e, Effect::HighlightRow(_))));
        assert!(effects.contains(&Effect::ShowRegionInfo(RegionId(10))));
        assert_eq!(ctl.state(), InteractionState::Hover(RegionId(10)));

        let effects = ctl.pointer_leave(RegionId(10), &table);
        assert!(effects.contains(&Effect::RestyleLayer(RegionId(10))));
        assert!(effects.contains(&Effect::ClearInfo));
        assert_eq!(ctl.state(), InteractionState::Idle);
    }

    #[test]
    fn a_new_hover_clears_the_previous_one_first() {
        let table = table();
        let mut ctl = InteractionController::new();

        ctl.pointer_enter(RegionId(10), &table);
        let effects = ctl.pointer_enter(RegionId(11), &table);
        assert_eq!(effects[0], Effect::RestyleLayer(RegionId(10)));
        assert!(effects.contains(&Effect::HighlightLayer(RegionId(11))));
        assert_eq!(ctl.state(), InteractionState::Hover(RegionId(11)));
    }

    #[test]
    fn selection_suppresses_hover_until_deselected() {
        let table = table();
        let mut ctl = InteractionController::new();

        ctl.click(RegionId(10), &table);
        assert_eq!(ctl.state(), InteractionState::Selected(RegionId(10)));

        assert!(ctl.pointer_enter(RegionId(11), &table).is_empty());
        assert!(ctl.pointer_leave(RegionId(11), &table).is_empty());
        assert_eq!(ctl.state(), InteractionState::Selected(RegionId(10)));

        let effects = ctl.deselect(&table);
        assert!(effects.contains(&Effect::SetSelected {
            region: RegionId(10),
            selected: false
        }));
        assert_eq!(ctl.state(), InteractionState::Idle);

        // Hover responsiveness returns immediately.
        let effects = ctl.pointer_enter(RegionId(11), &table);
        assert!(effects.contains(&Effect::HighlightLayer(RegionId(11))));
    }

    #[test]
    fn clicking_the_selected_region_toggles_it_off() {
        let table = table();
        let mut ctl = InteractionController::new();

        ctl.click(RegionId(10), &table);
        let effects = ctl.click(RegionId(10), &table);
        assert!(effects.contains(&Effect::SetSelected {
            region: RegionId(10),
            selected: false
        }));
        assert_eq!(ctl.state(), InteractionState::Idle);
    }

    #[test]
    fn clicking_another_region_moves_the_selection() {
        let table = table();
        let mut ctl = InteractionController::new();

        ctl.click(RegionId(10), &table);
        let effects = ctl.click(RegionId(11), &table);
        assert_eq!(
            effects[0],
            Effect::SetSelected {
                region: RegionId(10),
                selected: false
            }
        );
        assert!(effects.contains(&Effect::SetSelected {
            region: RegionId(11),
            selected: true
        }));
        assert_eq!(ctl.state(), InteractionState::Selected(RegionId(11)));
    }

    #[test]
    fn selecting_a_child_expands_its_parent_row() {
        let table = table();
        let mut ctl = InteractionController::new();

        let effects = ctl.click(RegionId(10), &table);
        let parent = table
            .parent_of(table.row_for_region(RegionId(10)).unwrap())
            .unwrap();
        assert!(effects.contains(&Effect::ExpandParentRow(parent)));
    }

    #[test]
    fn row_events_round_trip_through_the_binding() {
        let table = table();
        let mut ctl = InteractionController::new();

        let row = table.row_for_region(RegionId(11)).unwrap();
        let effects = ctl.row_enter(row, &table);
        assert!(effects.contains(&Effect::HighlightLayer(RegionId(11))));
        assert_eq!(ctl.state(), InteractionState::Hover(RegionId(11)));
    }
}
