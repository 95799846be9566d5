//! Source locations for declaration-site attribution
//!
//! Stub and assertion mistakes are reported against the line where the
//! statement was *declared*, not where the mocked call later executed.
//! Fluent API entry points are `#[track_caller]` and capture one of these.

use std::fmt;
use std::panic::Location as PanicLocation;

/// A captured `file:line` declaration site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Source file
    pub file: String,
    /// Line number
    pub line: u32,
}

impl Location {
    /// Capture the caller's location
    ///
    /// Must be called from a `#[track_caller]` chain to point at test code
    /// rather than library internals.
    #[track_caller]
    pub fn caller() -> Self {
        let loc = PanicLocation::caller();
        Location {
            file: loc.file().to_string(),
            line: loc.line(),
        }
    }

    /// An unknown location, used where no declaration site applies
    pub fn unknown() -> Self {
        Location {
            file: "<unknown>".to_string(),
            line: 0,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}
