use enough::StopReason;

/// Errors from region decoder construction and region decoding.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RegionError {
    /// No backend recognized the stream.
    #[error("image format not supported")]
    UnsupportedFormat,

    /// The format was recognized but its content could not be indexed.
    #[error("image failed to decode using {format} decoder: {reason}")]
    IndexBuildFailed {
        format: &'static str,
        reason: String,
    },

    /// A region decode failed. The handle stays usable.
    #[error("region decode failed: {0}")]
    DecodeFailed(String),

    #[error("operation cancelled")]
    Cancelled(StopReason),

    /// A file or descriptor source could not be statted or opened.
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("i/o error reading source: {0}")]
    Io(#[from] std::io::Error),

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),
}

impl From<StopReason> for RegionError {
    fn from(r: StopReason) -> Self {
        RegionError::Cancelled(r)
    }
}

impl RegionError {
    /// Whether this error came from a cancellation request or a stop token.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RegionError::Cancelled(_))
    }

    pub(crate) fn index(format: &'static str, reason: impl Into<String>) -> Self {
        RegionError::IndexBuildFailed {
            format,
            reason: reason.into(),
        }
    }
}
