#[derive(Debug, thiserror::Error)]
pub enum ExporterError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Timeout error: operation timed out after {millis} ms")]
    Timeout { millis: u64 },

    #[error("No snapshot available yet")]
    Unavailable,

    #[error("HTTP server error: {0}")]
    Server(#[from] warp::Error),
}

impl From<alloy::transports::TransportError> for ExporterError {
    fn from(err: alloy::transports::TransportError) -> Self {
        ExporterError::Rpc(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ExporterError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Warning,
    Error,
}

/// Names the operation a failure belongs to so the sampler can log every
/// query outcome the same way.
pub struct ErrorContext {
    pub operation: String,
    pub severity: ErrorSeverity,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            severity: ErrorSeverity::Error,
        }
    }

    pub fn transient(mut self) -> Self {
        self.severity = ErrorSeverity::Warning;
        self
    }

    pub fn log_error(&self, error: &ExporterError) {
        use tracing::{error, warn};

        match self.severity {
            ErrorSeverity::Warning => {
                warn!(
                    "Operation '{}' failed: {} (keeping previous value)",
                    self.operation, error
                );
            }
            ErrorSeverity::Error => {
                error!("Operation '{}' failed: {}", self.operation, error);
            }
        }
    }
}

pub trait ResultExt<T> {
    fn with_context(self, context: ErrorContext) -> Result<T>;

    /// Logs the failure and turns it into `None`.
    fn logged(self, context: ErrorContext) -> Option<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, context: ErrorContext) -> Result<T> {
        if let Err(ref e) = self {
            context.log_error(e);
        }
        self
    }

    fn logged(self, context: ErrorContext) -> Option<T> {
        self.with_context(context).ok()
    }
}
