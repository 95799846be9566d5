//! Error types for understudy
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Two distinct families:
//! - [`MockError`]: errors of the mocking machinery itself (declaration
//!   misuse, behavior validation, assertion failures)
//! - [`Raised`]: the error *value* a stubbed behavior throws; it belongs to
//!   the test's domain and propagates to the mocked method's caller, not to
//!   the test framework

use crate::location::Location;
use std::fmt;
use thiserror::Error;

/// Result type alias for mock-engine operations
pub type Result<T> = std::result::Result<T, MockError>;

/// Which assertion failed, for failure-kind sensitive reporting
///
/// An out-of-order in-sequence match reports differently from a not-found
/// match, so the kind is carried alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssertionKind {
    /// `assert_invoked` / `assert_invoked_in_sequence` found no matching call
    NotInvoked,
    /// `assert_not_invoked` found a matching call
    UnexpectedInvocation,
    /// `assert_invoked_in_sequence` matched a call before an already
    /// in-order-verified one
    OutOfOrder,
    /// `assert_no_more_invocations` found unverified unstubbed calls
    MoreInvocationsObserved,
}

impl fmt::Display for AssertionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssertionKind::NotInvoked => "not invoked",
            AssertionKind::UnexpectedInvocation => "unexpected invocation",
            AssertionKind::OutOfOrder => "invoked out of order",
            AssertionKind::MoreInvocationsObserved => "more invocations observed",
        };
        write!(f, "{}", name)
    }
}

/// Errors of the mock engine
#[derive(Debug, Error)]
pub enum MockError {
    /// Stub or assertion syntax used incorrectly. Fatal: aborts the current test.
    #[error("Invalid mock syntax: {message}\ndeclared at {location}")]
    Declaration {
        /// What was misused
        message: String,
        /// Where the offending statement was declared
        location: Location,
    },

    /// A behavior refused to execute for the invocation it was matched to.
    /// Attributed to the stub's declaration site, not the call site.
    #[error("Invalid mock behavior: {message}\ndeclared at {declared_at}")]
    Validation {
        /// Why the behavior cannot apply
        message: String,
        /// Where the stub was declared
        declared_at: Location,
    },

    /// A verification assertion failed. Carries the rendered scenario report
    /// so the author sees the full observed history, not just the offending call.
    #[error("Assertion failed ({kind}): {message}\n\nObserved scenario:\n{report}")]
    AssertionFailed {
        /// Which assertion failed
        kind: AssertionKind,
        /// What was expected / unexpected
        message: String,
        /// Rendered observed-invocations report
        report: String,
    },
}

impl MockError {
    /// Build a declaration error at the given location
    pub fn declaration(message: impl Into<String>, location: Location) -> Self {
        MockError::Declaration {
            message: message.into(),
            location,
        }
    }

    /// Build a validation error attributed to the stub's declaration site
    pub fn validation(message: impl Into<String>, declared_at: Location) -> Self {
        MockError::Validation {
            message: message.into(),
            declared_at,
        }
    }

    /// Build an assertion failure with its scenario report
    pub fn assertion(
        kind: AssertionKind,
        message: impl Into<String>,
        report: impl Into<String>,
    ) -> Self {
        MockError::AssertionFailed {
            kind,
            message: message.into(),
            report: report.into(),
        }
    }

    /// The assertion kind, if this is an assertion failure
    pub fn assertion_kind(&self) -> Option<AssertionKind> {
        match self {
            MockError::AssertionFailed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// An error value thrown by a stubbed behavior
///
/// `mock.raises(Raised::new("IoError", "disk full")).read()` makes the
/// mocked `read` fail with this value. It is recorded into the scenario
/// before it propagates to the mocked method's caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name}: {message}")]
pub struct Raised {
    /// Error kind name, e.g. `"IoError"`
    pub name: String,
    /// Human-readable message, may be empty
    pub message: String,
}

impl Raised {
    /// An error value with a kind name and message
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Raised {
            name: name.into(),
            message: message.into(),
        }
    }

    /// An error value carrying only a kind name
    ///
    /// The analogue of raising an exception *class* rather than an instance.
    pub fn of_kind(name: impl Into<String>) -> Self {
        Raised {
            name: name.into(),
            message: String::new(),
        }
    }
}
