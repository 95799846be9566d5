//! The mock context
//!
//! One [`MockContext`] per test harness. It owns the shared scenario every
//! mock records into, the registry of mocked-type descriptions chained
//! stubbing draws from, the syntax monitor, and the chained-mock cache.
//! Mocks created from the same context verify against one combined call
//! history, which is what makes cross-mock ordering assertions possible.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use understudy_core::{Location, MockedType, Result, Value};
use understudy_engine::{CallDelegate, ChainedMocks, EngineConfig, MockProxy, Scenario};

use crate::matching::SyntaxMonitor;
use crate::mock::Mock;

/// Shared state behind a context and every mock created from it
pub(crate) struct ContextInner {
    pub(crate) scenario: Arc<Mutex<Scenario>>,
    pub(crate) config: EngineConfig,
    pub(crate) types: Mutex<HashMap<String, MockedType>>,
    pub(crate) monitor: SyntaxMonitor,
    pub(crate) chained: ChainedMocks,
}

impl ContextInner {
    /// Create a proxy for a chain target, if its type is registered
    pub(crate) fn create_chained_proxy(
        &self,
        name: &str,
        type_name: &str,
    ) -> Option<Arc<MockProxy>> {
        let mocked_type = self.types.lock().get(type_name).cloned()?;
        Some(MockProxy::new(name, mocked_type, self.scenario.clone()))
    }
}

/// Factory and shared state for a family of mocks
#[derive(Clone)]
pub struct MockContext {
    inner: Arc<ContextInner>,
}

impl MockContext {
    /// A context with the default configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// A context with an explicit configuration
    pub fn with_config(config: EngineConfig) -> Self {
        let scenario = Arc::new(Mutex::new(Scenario::new(config.max_report_invocations)));
        MockContext {
            inner: Arc::new(ContextInner {
                scenario,
                config,
                types: Mutex::new(HashMap::new()),
                monitor: SyntaxMonitor::default(),
                chained: ChainedMocks::new(),
            }),
        }
    }

    /// Register a mocked-type description for chained stubbing
    ///
    /// A stubbed method whose return kind names this type gets a chained
    /// mock built from it. Types of mocks created through [`Self::mock`]
    /// are registered automatically.
    pub fn register_type(&self, mocked_type: MockedType) {
        self.inner
            .types
            .lock()
            .insert(mocked_type.name.clone(), mocked_type);
    }

    /// Create a mock of the described type
    pub fn mock(&self, name: impl Into<String>, mocked_type: MockedType) -> Mock {
        let name = name.into();
        self.register_type(mocked_type.clone());
        let proxy = MockProxy::new(&name, mocked_type, self.inner.scenario.clone());
        debug!(mock = %name, "mock created");
        Mock::new(proxy, self.inner.clone())
    }

    /// Create a partial mock: unstubbed calls run the original behavior
    pub fn partial_mock(
        &self,
        name: impl Into<String>,
        mocked_type: MockedType,
        delegate: Arc<dyn CallDelegate>,
    ) -> Mock {
        let name = name.into();
        self.register_type(mocked_type.clone());
        let proxy =
            MockProxy::new_partial(&name, mocked_type, self.inner.scenario.clone(), delegate);
        debug!(mock = %name, "partial mock created");
        Mock::new(proxy, self.inner.clone())
    }

    /// The mock behind a handle value returned by a chained stub
    pub fn mock_for_handle(&self, value: &Value) -> Option<Mock> {
        let handle = value.as_handle()?;
        let proxy = handle.target().clone().downcast::<MockProxy>().ok()?;
        Some(Mock::new(proxy, self.inner.clone()))
    }

    /// Scope the scenario to a test subject, resetting it on change
    ///
    /// Returns true if a reset happened. Call this at the start of each
    /// test method with an identifier unique to it; state then accumulates
    /// within one test and clears across tests without explicit teardown.
    pub fn ensure_subject(&self, subject: &str) -> bool {
        self.inner.scenario.lock().ensure_subject(subject)
    }

    /// Clear the scenario unconditionally
    pub fn reset(&self) {
        self.inner.scenario.lock().reset();
    }

    /// Verify nothing unexpected was invoked on any mock of this context
    #[track_caller]
    pub fn assert_no_more_invocations(&self) -> Result<()> {
        let asserted_at = Location::caller();
        if let Some(err) = self.inner.monitor.pending_error() {
            return Err(err);
        }
        self.inner
            .scenario
            .lock()
            .assert_no_more_invocations(&asserted_at)
    }

    /// The rendered observed-invocations report
    pub fn scenario_report(&self) -> String {
        self.inner.scenario.lock().render_report()
    }

    /// The active configuration
    pub fn config(&self) -> EngineConfig {
        self.inner.config.clone()
    }
}

impl Default for MockContext {
    fn default() -> Self {
        MockContext::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchers::{any, eq};
    use understudy_core::{Raised, ReturnKind};

    fn user_service_type() -> MockedType {
        MockedType::new("UserService")
            .method("find_user", 1, ReturnKind::Str)
            .method("session", 0, ReturnKind::mockable("Session"))
            .method("count", 0, ReturnKind::Int)
    }

    fn session_type() -> MockedType {
        MockedType::new("Session")
            .method("query", 1, ReturnKind::Str)
            .method("close", 0, ReturnKind::Void)
    }

    #[test]
    fn test_mocks_share_one_scenario() {
        let context = MockContext::new();
        let first = context.mock("first", user_service_type());
        let second = context.mock("second", user_service_type());

        first.invoke_values("count", vec![]).unwrap();
        second.invoke_values("count", vec![]).unwrap();

        first.assert_invoked_in_sequence().call("count", vec![]).unwrap();
        second.assert_invoked_in_sequence().call("count", vec![]).unwrap();
    }

    #[test]
    fn test_chained_stubbing_end_to_end() {
        let context = MockContext::new();
        context.register_type(session_type());
        let mock = context.mock("service", user_service_type());

        let continuation = mock
            .returns("rows")
            .call("session", vec![])
            .unwrap()
            .unwrap();
        continuation.call("query", vec![eq("select 1")]).unwrap();

        // The outer call now returns the chained mock's handle
        let handle = mock.invoke_values("session", vec![]).unwrap().unwrap();
        assert!(handle.is_handle());

        let session = context.mock_for_handle(&handle).unwrap();
        assert_eq!(session.name(), "service.session");
        assert_eq!(
            session.invoke_values("query", vec!["select 1".into()]).unwrap(),
            Ok(Value::Str("rows".into()))
        );
    }

    #[test]
    fn test_restubbing_a_fluent_path_reuses_the_chained_mock() {
        let context = MockContext::new();
        context.register_type(session_type());
        let mock = context.mock("service", user_service_type());

        mock.returns("one")
            .call("session", vec![])
            .unwrap()
            .unwrap()
            .call("query", vec![eq("a")])
            .unwrap();
        mock.returns("two")
            .call("session", vec![])
            .unwrap()
            .unwrap()
            .call("query", vec![eq("b")])
            .unwrap();

        let first = mock.invoke_values("session", vec![]).unwrap().unwrap();
        let second = mock.invoke_values("session", vec![]).unwrap().unwrap();
        assert_eq!(first, second);

        let session = context.mock_for_handle(&first).unwrap();
        assert_eq!(
            session.invoke_values("query", vec!["a".into()]).unwrap(),
            Ok(Value::Str("one".into()))
        );
        assert_eq!(
            session.invoke_values("query", vec!["b".into()]).unwrap(),
            Ok(Value::Str("two".into()))
        );
    }

    #[test]
    fn test_unregistered_chain_type_degrades_to_terminal_stub() {
        let context = MockContext::new();
        // Session is never registered
        let mock = context.mock("service", user_service_type());

        let continuation = mock.returns(Value::Null).call("session", vec![]).unwrap();
        assert!(continuation.is_none());
        // The terminal rule still applies
        assert_eq!(
            mock.invoke_values("session", vec![]).unwrap(),
            Ok(Value::Null)
        );
    }

    #[test]
    fn test_chaining_can_be_disabled() {
        let config = EngineConfig {
            chaining_enabled: false,
            ..EngineConfig::default()
        };
        let context = MockContext::with_config(config);
        context.register_type(session_type());
        let mock = context.mock("service", user_service_type());

        let continuation = mock.returns(Value::Null).call("session", vec![]).unwrap();
        assert!(continuation.is_none());
    }

    #[test]
    fn test_ensure_subject_scopes_state_per_test() {
        let context = MockContext::new();
        let mock = context.mock("service", user_service_type());

        context.ensure_subject("test_one");
        mock.invoke_values("count", vec![]).unwrap();
        assert!(context.assert_no_more_invocations().is_err());

        // A new subject clears the history
        assert!(context.ensure_subject("test_two"));
        context.assert_no_more_invocations().unwrap();
    }

    #[test]
    fn test_partial_mock_runs_original_behavior() {
        use understudy_engine::{CallResult, Invocation};

        struct FixedCounter;
        impl CallDelegate for FixedCounter {
            fn call(&self, _invocation: &Invocation) -> CallResult {
                Ok(Value::Int(41))
            }
        }

        let context = MockContext::new();
        let mock = context.partial_mock("counter", user_service_type(), Arc::new(FixedCounter));

        assert_eq!(mock.invoke_values("count", vec![]).unwrap(), Ok(Value::Int(41)));
        mock.returns(7).call("count", vec![]).unwrap();
        assert_eq!(mock.invoke_values("count", vec![]).unwrap(), Ok(Value::Int(7)));
    }

    #[test]
    fn test_scenario_report_lists_observed_calls() {
        let context = MockContext::new();
        let mock = context.mock("service", user_service_type());
        mock.invoke_values("find_user", vec!["id1".into()]).unwrap();

        let report = context.scenario_report();
        assert!(report.contains("service.find_user(\"id1\")"));
    }

    #[test]
    fn test_failing_assertion_reports_raised_outcome() {
        let context = MockContext::new();
        let mock = context.mock("service", user_service_type());
        mock.raises(Raised::new("DbError", "down"))
            .call("find_user", vec![any()])
            .unwrap();
        let _ = mock.invoke_values("find_user", vec!["id1".into()]).unwrap();

        let err = context.assert_no_more_invocations();
        // Stubbed calls are expected interactions
        err.unwrap();

        let report = context.scenario_report();
        assert!(report.contains("raised DbError: down"));
    }
}
