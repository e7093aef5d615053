#![forbid(unsafe_code)]

//! Command error taxonomy.

use std::rc::Rc;

use thiserror::Error;

/// Errors surfaced by command invocation.
///
/// `AlreadyExecuting` and `ParameterMismatch` are caller bugs and never
/// retriable. `Cancelled` is the expected cooperative-cancellation outcome.
/// `Fault` wraps whatever the execution body failed with; the payload is
/// shared (`Rc`) so the observable fault slot can hand it out repeatedly.
#[derive(Debug, Error, Clone)]
pub enum CommandError {
    /// An invocation was requested while the command was already running.
    /// Callers are expected to consult `can_execute` first.
    #[error("command is already executing")]
    AlreadyExecuting,

    /// The execution body observed a cancellation request and unwound.
    #[error("operation was cancelled")]
    Cancelled,

    /// The parameter handed to a typed command did not narrow to the
    /// declared type.
    #[error("parameter does not match the expected type {expected}")]
    ParameterMismatch {
        /// Type name the command narrows to.
        expected: &'static str,
    },

    /// Any other failure raised by the execution body.
    #[error("execution failed: {0}")]
    Fault(Rc<dyn std::error::Error>),
}

impl CommandError {
    /// Wrap an arbitrary body failure.
    #[must_use]
    pub fn fault(source: impl std::error::Error + 'static) -> Self {
        Self::Fault(Rc::new(source))
    }

    /// Whether this is the expected cooperative-cancellation outcome.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            CommandError::AlreadyExecuting.to_string(),
            "command is already executing"
        );
        assert_eq!(
            CommandError::Cancelled.to_string(),
            "operation was cancelled"
        );
        let fault = CommandError::fault(std::io::Error::other("disk on fire"));
        assert!(fault.to_string().contains("disk on fire"));
    }

    #[test]
    fn fault_is_shared_on_clone() {
        let fault = CommandError::fault(std::io::Error::other("boom"));
        let copy = fault.clone();
        assert!(copy.to_string().contains("boom"));
        assert!(!copy.is_cancelled());
        assert!(CommandError::Cancelled.is_cancelled());
    }
}
