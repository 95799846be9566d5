//! Fluent test-author surface for understudy
//!
//! Everything a test touches lives here: the [`MockContext`] factory, the
//! [`Mock`] handle with its stub and assertion statements, and the matcher
//! constructors in [`matchers`]. The matching and verification machinery
//! itself is `understudy-engine`; this crate adds the two-phase statement
//! syntax, its misuse detection, and chained stubbing on top.
//!
//! ```
//! use understudy_api::{matchers::eq, MockContext};
//! use understudy_api::{MockedType, ReturnKind, Value};
//!
//! let context = MockContext::new();
//! let mock = context.mock(
//!     "user_service",
//!     MockedType::new("UserService").method("find_user", 1, ReturnKind::Str),
//! );
//!
//! mock.returns("bob").call("find_user", vec![eq("id1")]).unwrap();
//!
//! let result = mock.invoke_values("find_user", vec!["id1".into()]).unwrap();
//! assert_eq!(result, Ok(Value::Str("bob".into())));
//!
//! mock.assert_invoked().call("find_user", vec![eq("id1")]).unwrap();
//! context.assert_no_more_invocations().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod matchers;
pub mod matching;
pub mod mock;

pub use context::MockContext;
pub use matching::MatchingMock;
pub use mock::Mock;

pub use understudy_core::{
    ArgCell, AssertionKind, Location, MethodSig, MockError, MockedType, ProxyHandle, Raised,
    Result, ReturnKind, Value,
};
pub use understudy_engine::{
    ArgMatcher, CallDelegate, CallResult, Captor, EngineConfig, Invocation, InvocationHandler,
    MockBehavior,
};
