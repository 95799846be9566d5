//! Mock proxy core: resolution, execution and recording
//!
//! `MockProxy` is the engine behind one mock. Every intercepted call flows
//! through [`InvocationHandler::handle_invocation`]:
//!
//! 1. resolve the best-matching stub rule (one-time pool first, then the
//!    always pool)
//! 2. pick the behavior to execute: the resolved one, the partial-mock
//!    delegate, or the type-appropriate default ("do nothing" for void)
//! 3. validate the resolved behavior; a refusal aborts before recording,
//!    attributed to the stub's declaration site
//! 4. append the observed invocation to the shared scenario
//! 5. execute, record the outcome, then return it
//!
//! A raised error is recorded before it propagates, so an end-of-test
//! "no more invocations" check still reports every call on the failing
//! path.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;
use understudy_core::{Location, MethodSig, MockedType, ProxyHandle, Value};

use crate::behavior::{
    DefaultValueReturningBehavior, MockBehavior, OriginalBehaviorInvokingBehavior,
};
use crate::behavior_defining::{
    BehaviorDefiningInvocation, BehaviorDefiningInvocations, PoolKind,
};
use crate::invocation::{
    CallDelegate, CallResult, Invocation, InvocationHandler, ObservedInvocation, ProxyId,
};
use crate::scenario::Scenario;

/// The engine behind one mock: registries, identity and the call pipeline
pub struct MockProxy {
    id: ProxyId,
    name: String,
    mocked_type: MockedType,
    one_time_behaviors: Mutex<BehaviorDefiningInvocations>,
    always_behaviors: Mutex<BehaviorDefiningInvocations>,
    scenario: Arc<Mutex<Scenario>>,
    partial_delegate: Option<Arc<dyn CallDelegate>>,
}

impl MockProxy {
    /// Create a proxy for the mocked type, sharing the given scenario
    pub fn new(
        name: impl Into<String>,
        mocked_type: MockedType,
        scenario: Arc<Mutex<Scenario>>,
    ) -> Arc<Self> {
        Self::build(name, mocked_type, scenario, None)
    }

    /// Create a partial-mock proxy: unstubbed calls delegate to `delegate`
    pub fn new_partial(
        name: impl Into<String>,
        mocked_type: MockedType,
        scenario: Arc<Mutex<Scenario>>,
        delegate: Arc<dyn CallDelegate>,
    ) -> Arc<Self> {
        Self::build(name, mocked_type, scenario, Some(delegate))
    }

    fn build(
        name: impl Into<String>,
        mocked_type: MockedType,
        scenario: Arc<Mutex<Scenario>>,
        partial_delegate: Option<Arc<dyn CallDelegate>>,
    ) -> Arc<Self> {
        Arc::new(MockProxy {
            id: ProxyId::new(),
            name: name.into(),
            mocked_type,
            one_time_behaviors: Mutex::new(BehaviorDefiningInvocations::new(PoolKind::OneTime)),
            always_behaviors: Mutex::new(BehaviorDefiningInvocations::new(PoolKind::Always)),
            scenario,
            partial_delegate,
        })
    }

    /// Identity of this proxy
    pub fn id(&self) -> ProxyId {
        self.id
    }

    /// Name of the mock
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The mocked interface description
    pub fn mocked_type(&self) -> &MockedType {
        &self.mocked_type
    }

    /// The scenario this proxy records into
    pub fn scenario(&self) -> &Arc<Mutex<Scenario>> {
        &self.scenario
    }

    /// Whether this is a partial mock
    pub fn is_partial(&self) -> bool {
        self.partial_delegate.is_some()
    }

    /// A value-level handle to this proxy, as returned by chained stubs
    pub fn handle(self: &Arc<Self>) -> ProxyHandle {
        let target: Arc<dyn std::any::Any + Send + Sync> = self.clone();
        ProxyHandle::new(self.name.clone(), target)
    }

    /// Register a stub rule into the pool matching its one-time flag
    pub fn add_behavior(&self, invocation: Arc<BehaviorDefiningInvocation>) {
        if invocation.is_one_time_match() {
            self.one_time_behaviors.lock().add(invocation);
        } else {
            self.always_behaviors.lock().add(invocation);
        }
    }

    /// Remove a previously registered stub rule
    pub fn remove_behavior(&self, invocation: &Arc<BehaviorDefiningInvocation>) {
        if invocation.is_one_time_match() {
            self.one_time_behaviors.lock().remove(invocation);
        } else {
            self.always_behaviors.lock().remove(invocation);
        }
    }

    /// Clear both stub pools. The shared scenario is untouched.
    pub fn reset_behavior(&self) {
        self.one_time_behaviors.lock().clear();
        self.always_behaviors.lock().clear();
        debug!(mock = %self.name, "behavior reset");
    }

    /// Look up a method on the mocked type
    pub fn find_method(&self, method_name: &str) -> Option<&MethodSig> {
        self.mocked_type.find_method(method_name)
    }

    fn resolve(&self, invocation: &Invocation) -> Option<Arc<BehaviorDefiningInvocation>> {
        // One-time declarations take precedence; the always pool is only
        // consulted when nothing one-time matches
        self.one_time_behaviors
            .lock()
            .get_matching(invocation)
            .or_else(|| self.always_behaviors.lock().get_matching(invocation))
    }
}

impl InvocationHandler for MockProxy {
    fn handle_invocation(&self, invocation: Invocation) -> understudy_core::Result<CallResult> {
        let resolved = self.resolve(&invocation);

        let behavior: Option<Arc<dyn MockBehavior>> = match &resolved {
            Some(rule) => {
                // A refusal aborts before anything is recorded and points at
                // the stub's declaration line
                rule.behavior().validate(&invocation, rule.declared_at())?;
                Some(rule.behavior().clone())
            }
            None => {
                if let Some(delegate) = &self.partial_delegate {
                    Some(Arc::new(OriginalBehaviorInvokingBehavior::new(
                        delegate.clone(),
                    )))
                } else if invocation.method().return_kind.is_void() {
                    // An unstubbed void method does nothing
                    None
                } else {
                    Some(Arc::new(DefaultValueReturningBehavior))
                }
            }
        };

        let observed =
            ObservedInvocation::new(invocation.clone(), resolved.clone(), behavior.clone());
        let observed_idx = {
            let mut scenario = self.scenario.lock();
            scenario.add_observed_invocation(observed);
            scenario.observed_invocations().len() - 1
        };

        // The lock is not held while user behavior runs; it may call into
        // other mocks sharing this scenario
        let result = match &behavior {
            Some(behavior) => behavior.execute(&invocation),
            None => Ok(Value::Null),
        };

        {
            let scenario = self.scenario.lock();
            if let Some(observed) = scenario.observed_invocations().get(observed_idx) {
                observed.set_result(result.clone());
            }
        }

        debug!(
            call = %invocation.describe(),
            stubbed = resolved.is_some(),
            raised = result.is_err(),
            "handled invocation"
        );
        Ok(result)
    }
}

impl MockProxy {
    /// Capture and handle a call in one step
    ///
    /// Convenience for hand-written stand-ins: builds the [`Invocation`]
    /// record and forwards it into the proxy.
    pub fn invoke(
        self: &Arc<Self>,
        method: MethodSig,
        arguments: Vec<understudy_core::ArgCell>,
        invoked_at: Location,
    ) -> understudy_core::Result<CallResult> {
        let invocation = Invocation::capture(self.id, &self.name, method, arguments, invoked_at);
        self.handle_invocation(invocation)
    }
}
