use muxcall_encoding::EncodingError;

/// Errors from request construction.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// A setter received an out-of-range or malformed value. The builder
    /// stays usable; correct the value and retry.
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// Body or header encoding failed. Any partially produced buffer is
    /// released before this surfaces.
    #[error("encoding failed: {0}")]
    Encoding(#[from] EncodingError),

    /// A construction invariant does not hold. Raised by `validate()`;
    /// reached through `build()` it triggers release of all held buffers
    /// first.
    #[error("invalid request: {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// The builder already produced a request or released its buffers.
    #[error("builder already spent")]
    BuilderSpent,
}

impl RequestError {
    /// The offending field, for validation and setter errors.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            RequestError::InvalidField { field, .. } | RequestError::Validation { field, .. } => {
                Some(*field)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RequestError>;
