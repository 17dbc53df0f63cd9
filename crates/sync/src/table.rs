use std::collections::BTreeSet;

use crate::binding::{RowBinding, RowId};
use layers::AggregateLayer;
use model::RegionId;

/// A parent (village) row. Children are the neighbourhood rows grouped under
/// it by `parent_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRow {
    pub row: RowId,
    pub region: RegionId,
    pub children: Vec<RowId>,
}

/// A sub-region (neighbourhood) row. Orphans whose `parent_name` matches no
/// village still get a row; they render at the top level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildRow {
    pub row: RowId,
    pub region: RegionId,
    pub parent: Option<RowId>,
}

/// The two-tier table mirroring the aggregate layers.
///
/// Rows hold only identities and links; severity, counts, and names are read
/// from the aggregate layers at render time, so an edit never has to touch
/// the table structure. A data load replaces the whole model (fresh row ids,
/// fresh binding) instead of patching the old one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableModel {
    parents: Vec<ParentRow>,
    children: Vec<ChildRow>,
    binding: RowBinding,
    expanded: BTreeSet<RowId>,
}

impl TableModel {
    pub fn build(villages: &AggregateLayer, neighbourhoods: &AggregateLayer) -> Self {
        let mut model = TableModel::default();
        let mut next_row = 0u32;
        let mut alloc = || {
            let row = RowId(next_row);
            next_row += 1;
            row
        };

        for village in villages.regions() {
            let row = alloc();
            model.binding.bind(row, village.pkey);
            model.parents.push(ParentRow {
                row,
                region: village.pkey,
                children: Vec::new(),
            });
        }

        for neighbourhood in neighbourhoods.regions() {
            let row = alloc();
            model.binding.bind(row, neighbourhood.pkey);

            let parent = neighbourhood.parent_name.as_deref().and_then(|name| {
                model
                    .parents
                    .iter()
                    .position(|p| villages.region(p.region).is_some_and(|v| v.name == name))
            });
            if let Some(slot) = parent {
                model.parents[slot].children.push(row);
            }
            model.children.push(ChildRow {
                row,
                region: neighbourhood.pkey,
                parent: parent.map(|slot| model.parents[slot].row),
            });
        }

        model
    }

    pub fn parents(&self) -> &[ParentRow] {
        &self.parents
    }

    pub fn children(&self) -> &[ChildRow] {
        &self.children
    }

    pub fn children_of(&self, parent: RowId) -> impl Iterator<Item = &ChildRow> + '_ {
        self.children
            .iter()
            .filter(move |c| c.parent == Some(parent))
    }

    pub fn row_for_region(&self, region: RegionId) -> Option<RowId> {
        self.binding.row_for_region(region)
    }

    pub fn region_for_row(&self, row: RowId) -> Option<RegionId> {
        self.binding.region_for_row(row)
    }

    /// Parent row of a sub-region row, if it has one.
    pub fn parent_of(&self, row: RowId) -> Option<RowId> {
        self.children
            .iter()
            .find(|c| c.row == row)
            .and_then(|c| c.parent)
    }

    pub fn binding(&self) -> &RowBinding {
        &self.binding
    }

    pub fn is_expanded(&self, parent: RowId) -> bool {
        self.expanded.contains(&parent)
    }

    /// Returns `true` if the expansion state changed.
    pub fn expand(&mut self, parent: RowId) -> bool {
        self.parents.iter().any(|p| p.row == parent) && self.expanded.insert(parent)
    }

    pub fn collapse(&mut self, parent: RowId) -> bool {
        self.expanded.remove(&parent)
    }

    pub fn toggle(&mut self, parent: RowId) -> bool {
        if self.is_expanded(parent) {
            self.collapse(parent)
        } else {
            self.expand(parent)
        }
    }
}
