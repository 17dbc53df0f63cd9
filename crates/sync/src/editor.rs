use crate::effect::Effect;
use layers::AggregateLayer;
use model::{FloodState, RegionId, UserSession};

#[derive(Debug, PartialEq, Eq)]
pub enum EditError {
    /// The session has no editor or admin role.
    NotPermitted,
    UnknownRegion(RegionId),
}

impl std::fmt::Display for EditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditError::NotPermitted => write!(f, "session is not permitted to edit"),
            EditError::UnknownRegion(region) => write!(f, "unknown region {region}"),
        }
    }
}

impl std::error::Error for EditError {}

/// Applies a REM severity edit from the table dropdown.
///
/// On an accepted change this updates the in-memory region, then asks the
/// shell to restyle the polygon, persist the new state (exactly one
/// persistence effect), and re-derive the severity legend. Re-picking the
/// current value is a no-op.
pub fn apply_state_change(
    layer: &mut AggregateLayer,
    region: RegionId,
    state: FloodState,
    session: &UserSession,
) -> Result<Vec<Effect>, EditError> {
    if !session.can_edit() {
        return Err(EditError::NotPermitted);
    }
    if !layer.contains(region) {
        return Err(EditError::UnknownRegion(region));
    }
    if !layer.set_state(region, state) {
        return Ok(Vec::new());
    }
    Ok(vec![
        Effect::RestyleLayer(region),
        Effect::PersistState { region, state },
        Effect::RefreshLegend,
    ])
}
