//! Mock behaviors
//!
//! A behavior is what a mocked method does when an invocation matches its
//! stub rule (or when nothing matched and a default applies). Behaviors can
//! refuse to execute for a given invocation via [`MockBehavior::validate`];
//! a refusal is attributed to the line where the stub was declared, so the
//! authoring mistake is locatable.

use std::fmt;
use std::sync::Arc;
use understudy_core::{Location, MockError, Raised, Value};

use crate::invocation::{CallDelegate, CallResult, Invocation};

/// Behavior executed when a mocked method is invoked
pub trait MockBehavior: Send + Sync {
    /// Check that this behavior can legally apply to the invocation.
    /// `declared_at` is the stub's declaration site, used for attribution.
    fn validate(
        &self,
        invocation: &Invocation,
        declared_at: &Location,
    ) -> understudy_core::Result<()> {
        let _ = (invocation, declared_at);
        Ok(())
    }

    /// Run the behavior for the invocation
    fn execute(&self, invocation: &Invocation) -> CallResult;

    /// Short human-readable form for reports
    fn describe(&self) -> String;
}

impl fmt::Debug for dyn MockBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// Returns a fixed value on every match
pub struct ValueReturningBehavior {
    value: Value,
}

impl ValueReturningBehavior {
    /// Behavior returning `value`
    pub fn new(value: impl Into<Value>) -> Self {
        ValueReturningBehavior {
            value: value.into(),
        }
    }
}

impl MockBehavior for ValueReturningBehavior {
    fn validate(
        &self,
        invocation: &Invocation,
        declared_at: &Location,
    ) -> understudy_core::Result<()> {
        let method = invocation.method();
        if method.return_kind.is_void() {
            return Err(MockError::validation(
                format!(
                    "cannot define a return value for void method {}",
                    method.name
                ),
                declared_at.clone(),
            ));
        }
        if !method.return_kind.accepts(&self.value) {
            return Err(MockError::validation(
                format!(
                    "return value of type {} is not valid for method {} returning {:?}",
                    self.value.type_name(),
                    method.name,
                    method.return_kind
                ),
                declared_at.clone(),
            ));
        }
        Ok(())
    }

    fn execute(&self, _invocation: &Invocation) -> CallResult {
        Ok(self.value.clone())
    }

    fn describe(&self) -> String {
        format!("returns {}", self.value)
    }
}

/// Raises a fixed error value on every match
pub struct ExceptionThrowingBehavior {
    raised: Raised,
}

impl ExceptionThrowingBehavior {
    /// Behavior raising `raised`
    pub fn new(raised: Raised) -> Self {
        ExceptionThrowingBehavior { raised }
    }
}

impl MockBehavior for ExceptionThrowingBehavior {
    fn execute(&self, _invocation: &Invocation) -> CallResult {
        Err(self.raised.clone())
    }

    fn describe(&self) -> String {
        format!("raises {}", self.raised)
    }
}

/// Runs a user-supplied closure
pub struct PerformsBehavior {
    action: Box<dyn Fn(&Invocation) -> CallResult + Send + Sync>,
}

impl PerformsBehavior {
    /// Behavior running `action` against each matched invocation
    pub fn new(action: impl Fn(&Invocation) -> CallResult + Send + Sync + 'static) -> Self {
        PerformsBehavior {
            action: Box::new(action),
        }
    }
}

impl MockBehavior for PerformsBehavior {
    fn execute(&self, invocation: &Invocation) -> CallResult {
        (self.action)(invocation)
    }

    fn describe(&self) -> String {
        "performs <custom>".to_string()
    }
}

/// No-op behavior: silently returns the type-appropriate default
pub struct StubBehavior;

impl MockBehavior for StubBehavior {
    fn execute(&self, invocation: &Invocation) -> CallResult {
        Ok(invocation.method().return_kind.default_value())
    }

    fn describe(&self) -> String {
        "stub".to_string()
    }
}

/// Default behavior for an unstubbed call on a regular mock
///
/// Void methods do nothing; everything else returns the kind's default
/// value from the closed type table.
pub struct DefaultValueReturningBehavior;

impl MockBehavior for DefaultValueReturningBehavior {
    fn execute(&self, invocation: &Invocation) -> CallResult {
        Ok(invocation.method().return_kind.default_value())
    }

    fn describe(&self) -> String {
        "returns default".to_string()
    }
}

/// Default behavior for an unstubbed call on a partial mock: delegate to
/// the wrapped original instance
pub struct OriginalBehaviorInvokingBehavior {
    delegate: Arc<dyn CallDelegate>,
}

impl OriginalBehaviorInvokingBehavior {
    /// Behavior delegating to the given original implementation
    pub fn new(delegate: Arc<dyn CallDelegate>) -> Self {
        OriginalBehaviorInvokingBehavior { delegate }
    }
}

impl MockBehavior for OriginalBehaviorInvokingBehavior {
    fn execute(&self, invocation: &Invocation) -> CallResult {
        self.delegate.call(invocation)
    }

    fn describe(&self) -> String {
        "invokes original behavior".to_string()
    }
}
