use thiserror::Error;
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("sample source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("acquisition buffer full ({capacity} samples); raise the assumed device rate")]
    BufferFull { capacity: usize },
    #[error("read range {lo}..{hi} outside written samples (0..{len})")]
    OutOfRange { lo: usize, hi: usize, len: usize },
    #[error("need at least 2 samples to interpolate, buffer holds {available}")]
    InsufficientSamples { available: usize },
    #[error("window has {samples} samples; at least 2 are required for features")]
    InsufficientWindowData { samples: usize },
    #[error("window carries {actual} axes, dataset expects {expected}")]
    AxisMismatch { expected: usize, actual: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("malformed table at line {line}: {reason}")]
    MalformedTable { line: usize, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}
impl CaptureError {
    /// Short tag used when tallying skipped windows.
    pub fn kind(&self) -> &'static str {
        match self {
            CaptureError::SourceUnavailable(_) => "source unavailable",
            CaptureError::BufferFull { .. } => "buffer full",
            CaptureError::OutOfRange { .. } => "out of range",
            CaptureError::InsufficientSamples { .. } => "insufficient samples",
            CaptureError::InsufficientWindowData { .. } => "insufficient window data",
            CaptureError::AxisMismatch { .. } => "axis mismatch",
            CaptureError::InvalidConfig(_) => "invalid config",
            CaptureError::MalformedTable { .. } => "malformed table",
            CaptureError::Io(_) => "io",
            CaptureError::Serialization(_) => "serialization",
        }
    }
}
