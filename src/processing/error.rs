//! Processing chain failure types.

use thiserror::Error;

use crate::pipeline::context::RequestContext;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error raised by a processor. The variant is the processor's own
/// classification and is passed through to statistics unchanged.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Recoverable failure of the processing logic itself.
    #[error("execution error: {0}")]
    Execution(BoxError),

    /// Unrecoverable infrastructure failure.
    #[error("fatal error: {0}")]
    Fatal(BoxError),
}

impl ProcessingError {
    pub fn execution(error: impl Into<BoxError>) -> Self {
        Self::Execution(error.into())
    }

    pub fn fatal(error: impl Into<BoxError>) -> Self {
        Self::Fatal(error.into())
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

/// A processing error together with the context it happened on.
#[derive(Debug)]
pub struct ProcessingFailure {
    pub error: ProcessingError,
    pub context: RequestContext,
}

impl ProcessingFailure {
    pub fn new(error: ProcessingError, context: RequestContext) -> Self {
        Self { error, context }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_preserved() {
        assert!(!ProcessingError::execution("bad input").is_fatal());
        assert!(ProcessingError::fatal("disk gone").is_fatal());
    }

    #[test]
    fn display_includes_cause() {
        let err = ProcessingError::execution(String::from("bad input"));
        assert_eq!(err.to_string(), "execution error: bad input");
    }
}
