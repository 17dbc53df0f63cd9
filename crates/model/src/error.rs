#[derive(Debug)]
pub enum ModelError {
    MissingProperty(&'static str),
    InvalidProperty {
        key: &'static str,
        reason: String,
    },
    /// The feature geometry does not fit the model type (e.g. a report that
    /// is not a point).
    WrongGeometry(&'static str),
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::MissingProperty(key) => write!(f, "missing property '{key}'"),
            ModelError::InvalidProperty { key, reason } => {
                write!(f, "invalid property '{key}': {reason}")
            }
            ModelError::WrongGeometry(expected) => {
                write!(f, "unexpected geometry, wanted {expected}")
            }
        }
    }
}

impl std::error::Error for ModelError {}
