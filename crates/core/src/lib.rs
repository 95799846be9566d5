//! Core types for understudy
//!
//! This crate defines the foundational types used throughout the system:
//! - Value: Unified value enum for mocked arguments and results
//! - ArgCell: Shared argument cell with call-time snapshots
//! - ProxyHandle: Opaque reference to a mock proxy
//! - MethodSig / ReturnKind / MockedType: reflection-free method model
//! - Location: declaration-site capture for error attribution
//! - MockError / Raised: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod location;
pub mod method;
pub mod value;

// Re-export commonly used types
pub use error::{AssertionKind, MockError, Raised, Result};
pub use location::Location;
pub use method::{MethodSig, MockedType, ReturnKind};
pub use value::{ArgCell, ProxyHandle, Value};
