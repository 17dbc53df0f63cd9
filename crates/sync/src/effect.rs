use crate::binding::RowId;
use model::{FloodState, RegionId};

/// Side effects requested by the interaction controller and the severity
/// editor.
///
/// State transitions stay pure and testable; the shell executes these
/// against the DOM, the canvas, and the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Apply the hover highlight style to a region polygon.
    HighlightLayer(RegionId),
    /// Apply the frozen selection style to a region polygon.
    SelectLayer(RegionId),
    /// Restore a region polygon to its severity fill.
    RestyleLayer(RegionId),
    /// Write the `selected` flag through to the region model.
    SetSelected { region: RegionId, selected: bool },
    HighlightRow(RowId),
    ClearRowHighlight(RowId),
    ScrollRowIntoView(RowId),
    ExpandParentRow(RowId),
    /// Show a region's name and count in the info box.
    ShowRegionInfo(RegionId),
    /// Reset the info box to the localized hover prompt.
    ClearInfo,
    /// Send the new severity state to the server. Emitted exactly once per
    /// accepted edit.
    PersistState { region: RegionId, state: FloodState },
    /// Severity bucket counts changed; re-derive the REM legend.
    RefreshLegend,
}
