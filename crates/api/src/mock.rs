//! The mock handle test authors hold
//!
//! A [`Mock`] wraps one proxy plus the shared context. Its methods come in
//! three groups:
//!
//! - behavior definition: `returns`, `raises`, `performs` and their
//!   `once_` variants open a stub statement
//! - verification: `assert_invoked`, `assert_invoked_in_sequence`,
//!   `assert_not_invoked` open an assertion statement
//! - interception: `invoke` is the entry point a stand-in implementation
//!   forwards intercepted calls into
//!
//! Every entry point records its caller's source location, so failures
//! point at the test line, not at this crate.

use std::sync::Arc;
use understudy_core::{ArgCell, Location, MockError, Raised, Result, Value};
use understudy_engine::{
    CallResult, ExceptionThrowingBehavior, Invocation, MockBehavior, MockProxy, PerformsBehavior,
    StubBehavior, ValueReturningBehavior,
};

use crate::context::ContextInner;
use crate::matching::{MatchingKind, MatchingMock};

/// Handle to one mock within a [`crate::MockContext`]
#[derive(Clone)]
pub struct Mock {
    proxy: Arc<MockProxy>,
    context: Arc<ContextInner>,
}

impl Mock {
    pub(crate) fn new(proxy: Arc<MockProxy>, context: Arc<ContextInner>) -> Self {
        Mock { proxy, context }
    }

    /// Name of the mock
    pub fn name(&self) -> &str {
        self.proxy.name()
    }

    /// Whether unstubbed calls fall through to an original implementation
    pub fn is_partial(&self) -> bool {
        self.proxy.is_partial()
    }

    /// A value-level handle to this mock, usable as an argument or a
    /// stubbed return value
    pub fn handle(&self) -> Value {
        Value::Handle(self.proxy.handle())
    }

    fn stub_statement(
        &self,
        behavior: Arc<dyn MockBehavior>,
        one_time: bool,
        operation: &str,
        declared_at: Location,
    ) -> MatchingMock {
        MatchingMock::start(
            self.proxy.clone(),
            self.context.clone(),
            MatchingKind::Stub { behavior, one_time },
            operation,
            declared_at,
        )
    }

    fn assert_statement(
        &self,
        kind: MatchingKind,
        operation: &str,
        asserted_at: Location,
    ) -> MatchingMock {
        MatchingMock::start(
            self.proxy.clone(),
            self.context.clone(),
            kind,
            operation,
            asserted_at,
        )
    }

    /// Always return `value` from the matched method
    #[track_caller]
    pub fn returns(&self, value: impl Into<Value>) -> MatchingMock {
        self.stub_statement(
            Arc::new(ValueReturningBehavior::new(value)),
            false,
            "returns",
            Location::caller(),
        )
    }

    /// Return `value` from the matched method once, then fall back
    #[track_caller]
    pub fn once_returns(&self, value: impl Into<Value>) -> MatchingMock {
        self.stub_statement(
            Arc::new(ValueReturningBehavior::new(value)),
            true,
            "once_returns",
            Location::caller(),
        )
    }

    /// Always raise `raised` from the matched method
    #[track_caller]
    pub fn raises(&self, raised: Raised) -> MatchingMock {
        self.stub_statement(
            Arc::new(ExceptionThrowingBehavior::new(raised)),
            false,
            "raises",
            Location::caller(),
        )
    }

    /// Raise `raised` from the matched method once, then fall back
    #[track_caller]
    pub fn once_raises(&self, raised: Raised) -> MatchingMock {
        self.stub_statement(
            Arc::new(ExceptionThrowingBehavior::new(raised)),
            true,
            "once_raises",
            Location::caller(),
        )
    }

    /// Always run `action` for the matched method
    #[track_caller]
    pub fn performs(
        &self,
        action: impl Fn(&Invocation) -> CallResult + Send + Sync + 'static,
    ) -> MatchingMock {
        self.stub_statement(
            Arc::new(PerformsBehavior::new(action)),
            false,
            "performs",
            Location::caller(),
        )
    }

    /// Run `action` for the matched method once, then fall back
    #[track_caller]
    pub fn once_performs(
        &self,
        action: impl Fn(&Invocation) -> CallResult + Send + Sync + 'static,
    ) -> MatchingMock {
        self.stub_statement(
            Arc::new(PerformsBehavior::new(action)),
            true,
            "once_performs",
            Location::caller(),
        )
    }

    /// Mark the matched method as an expected background interaction
    ///
    /// It returns its type default, and `assert_no_more_invocations` stops
    /// flagging its calls.
    #[track_caller]
    pub fn stubs(&self) -> MatchingMock {
        self.stub_statement(Arc::new(StubBehavior), false, "stubs", Location::caller())
    }

    /// Register a custom behavior for the matched method
    #[track_caller]
    pub fn performs_behavior(&self, behavior: Arc<dyn MockBehavior>) -> MatchingMock {
        self.stub_statement(behavior, false, "performs_behavior", Location::caller())
    }

    /// Verify that a matching call was observed
    #[track_caller]
    pub fn assert_invoked(&self) -> MatchingMock {
        self.assert_statement(MatchingKind::AssertInvoked, "assert_invoked", Location::caller())
    }

    /// Verify that a matching call was observed, in assertion sequence
    #[track_caller]
    pub fn assert_invoked_in_sequence(&self) -> MatchingMock {
        self.assert_statement(
            MatchingKind::AssertInvokedInSequence,
            "assert_invoked_in_sequence",
            Location::caller(),
        )
    }

    /// Verify that no matching call was observed
    #[track_caller]
    pub fn assert_not_invoked(&self) -> MatchingMock {
        self.assert_statement(
            MatchingKind::AssertNotInvoked,
            "assert_not_invoked",
            Location::caller(),
        )
    }

    /// Verify nothing unexpected was invoked on any mock of the context
    #[track_caller]
    pub fn assert_no_more_invocations(&self) -> Result<()> {
        let asserted_at = Location::caller();
        if let Some(err) = self.context.monitor.pending_error() {
            return Err(err);
        }
        self.context
            .scenario
            .lock()
            .assert_no_more_invocations(&asserted_at)
    }

    /// Drop every stub rule on this mock, keeping the observed history
    pub fn reset_behavior(&self) {
        self.proxy.reset_behavior();
    }

    /// Forward one intercepted call into the mock
    ///
    /// This is the interception boundary: a hand-written stand-in (or a
    /// generated one) builds the argument cells and forwards here. The
    /// outer error is a framework failure aborting the test; the inner
    /// [`CallResult`] is what the mocked method produced.
    #[track_caller]
    pub fn invoke(&self, method_name: &str, arguments: Vec<ArgCell>) -> Result<CallResult> {
        let invoked_at = Location::caller();
        if let Some(err) = self.context.monitor.pending_error() {
            return Err(err);
        }
        let method = match self.proxy.find_method(method_name) {
            Some(method) => method.clone(),
            None => {
                return Err(MockError::declaration(
                    format!(
                        "mocked type {} has no method named {}",
                        self.proxy.mocked_type().name,
                        method_name
                    ),
                    invoked_at,
                ))
            }
        };
        if arguments.len() != method.arity {
            return Err(MockError::declaration(
                format!(
                    "method {} takes {} argument(s) but {} were given",
                    method.name,
                    method.arity,
                    arguments.len()
                ),
                invoked_at,
            ));
        }
        self.proxy.invoke(method, arguments, invoked_at)
    }

    /// Forward one intercepted call with plain values as arguments
    #[track_caller]
    pub fn invoke_values(&self, method_name: &str, arguments: Vec<Value>) -> Result<CallResult> {
        let cells = arguments.into_iter().map(ArgCell::new).collect();
        self.invoke(method_name, cells)
    }
}
