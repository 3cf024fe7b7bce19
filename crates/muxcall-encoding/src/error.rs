/// Errors that can occur while encoding or decoding argument segments.
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    /// The scheme tag is not one this crate knows about.
    #[error("unknown arg scheme '{0}'")]
    UnknownScheme(String),

    /// More application headers than the block format can carry.
    #[error("too many application headers ({count}, max {max})")]
    TooManyHeaders { count: usize, max: usize },

    /// A single header key or value exceeds the block's length prefix.
    #[error("header entry too long ({len} bytes, max {max})")]
    EntryTooLong { len: usize, max: usize },

    /// The header block ended before the advertised entries were read.
    #[error("truncated header block")]
    Truncated,

    /// Bytes remained after the advertised entries were read.
    #[error("trailing bytes after header block ({0} bytes)")]
    TrailingBytes(usize),

    /// A header entry is not valid UTF-8.
    #[error("header entry is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EncodingError>;
