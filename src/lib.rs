//! understudy: behavior-programmable mocks with call verification
//!
//! Facade crate re-exporting the fluent surface of `understudy-api`.
//! Create a [`MockContext`], describe the mocked interface as a
//! [`MockedType`], program behavior with `returns`/`raises`/`performs`
//! statements, drive the code under test through [`Mock::invoke`], then
//! verify with the `assert_*` statements.
//!
//! ```
//! use understudy::{matchers::eq, MockContext, MockedType, ReturnKind, Value};
//!
//! let context = MockContext::new();
//! let mock = context.mock(
//!     "user_service",
//!     MockedType::new("UserService").method("find_user", 1, ReturnKind::Str),
//! );
//!
//! mock.returns("bob").call("find_user", vec![eq("id1")]).unwrap();
//! let result = mock.invoke_values("find_user", vec!["id1".into()]).unwrap();
//! assert_eq!(result, Ok(Value::Str("bob".into())));
//!
//! mock.assert_invoked().call("find_user", vec![eq("id1")]).unwrap();
//! context.assert_no_more_invocations().unwrap();
//! ```

#![warn(missing_docs)]

pub use understudy_api::*;

/// Core value model, method signatures, locations and errors
pub use understudy_core as core;

/// Matching, scenario and verification machinery
pub use understudy_engine as engine;
