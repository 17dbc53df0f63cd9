use formats::DecodeError;

/// Failure taxonomy for the fetch layer.
///
/// Empty layers never appear here: the server's `features: null` stub
/// decodes to a valid `None` layer upstream of this type.
#[derive(Debug)]
pub enum ApiError {
    /// The request never produced a response (network down, CORS, abort).
    Transport(String),
    /// The server answered with a non-success status.
    Http { status: u16 },
    Parse(DecodeError),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Transport(reason) => write!(f, "transport failure: {reason}"),
            ApiError::Http { status } => write!(f, "server returned status {status}"),
            ApiError::Parse(err) => write!(f, "payload parse failure: {err}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DecodeError> for ApiError {
    fn from(err: DecodeError) -> Self {
        ApiError::Parse(err)
    }
}
