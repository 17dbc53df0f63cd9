use serde::Deserialize;

/// Role flags for the signed-in user, as returned by the session endpoint.
///
/// Absent flags deserialize to `false`, so an anonymous session payload of
/// `{}` yields a read-only view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserSession {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub editor: bool,
    #[serde(default)]
    pub admin: bool,
}

impl UserSession {
    /// Whether severity-edit controls should render at all.
    pub fn can_edit(&self) -> bool {
        self.editor || self.admin
    }
}
