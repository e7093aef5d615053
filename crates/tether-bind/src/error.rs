#![forbid(unsafe_code)]

//! Substrate error type.

use thiserror::Error;

/// Errors raised at the substrate's public entry points.
///
/// Every variant is a caller bug; none is retriable.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BindError {
    /// A property name passed to registration or signal raising was empty.
    #[error("property name must not be empty")]
    EmptyPropertyName,
}
