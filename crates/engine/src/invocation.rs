//! Invocation records
//!
//! This module defines:
//! - ProxyId: Unique identity of a mock proxy
//! - Invocation: Immutable record of one call on a mock proxy
//! - CallResult: What a mocked call produces (value or raised error)
//! - InvocationHandler: The interception boundary proxies call into
//! - ObservedInvocation: An invocation plus its resolution and outcome
//!
//! An `Invocation` snapshots every argument cell at construction time.
//! Matching and reporting always read the snapshots, so a caller mutating a
//! shared argument after the call cannot retroactively change what was seen.

use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;
use understudy_core::{ArgCell, Location, MethodSig, Raised, Value};
use uuid::Uuid;

use crate::behavior::MockBehavior;
use crate::behavior_defining::BehaviorDefiningInvocation;

/// Unique identity of a mock proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProxyId(Uuid);

impl ProxyId {
    /// Generate a fresh proxy identity
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        ProxyId(Uuid::new_v4())
    }
}

impl fmt::Display for ProxyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a mocked call produced: a return value or a raised error
pub type CallResult = std::result::Result<Value, Raised>;

/// The interception boundary
///
/// Any proxy-generation strategy (hand-written stand-in, macro-generated
/// stub, dynamic dispatcher) forwards every call into this trait and blocks
/// until a result comes back. The matching/verification core never knows how
/// the proxy was produced.
///
/// The outer `Result` carries framework errors (declaration or validation
/// mistakes, which abort the test); the inner [`CallResult`] carries the
/// mocked call's own outcome.
pub trait InvocationHandler: Send + Sync {
    /// Handle one intercepted call
    fn handle_invocation(&self, invocation: Invocation) -> understudy_core::Result<CallResult>;
}

/// A real implementation a partial mock falls back to
///
/// Unstubbed calls on a partial mock are delegated here instead of
/// returning default values.
pub trait CallDelegate: Send + Sync {
    /// Execute the original (non-mocked) behavior for the invocation
    fn call(&self, invocation: &Invocation) -> CallResult;
}

/// Immutable record of one call on a mock proxy
#[derive(Clone)]
pub struct Invocation {
    proxy_id: ProxyId,
    mock_name: String,
    method: MethodSig,
    arguments: Vec<ArgCell>,
    argument_snapshots: Vec<Value>,
    invoked_at: Location,
}

impl Invocation {
    /// Capture an invocation, snapshotting every argument cell
    pub fn capture(
        proxy_id: ProxyId,
        mock_name: impl Into<String>,
        method: MethodSig,
        arguments: Vec<ArgCell>,
        invoked_at: Location,
    ) -> Self {
        let argument_snapshots = arguments.iter().map(|cell| cell.snapshot()).collect();
        Invocation {
            proxy_id,
            mock_name: mock_name.into(),
            method,
            arguments,
            argument_snapshots,
            invoked_at,
        }
    }

    /// Identity of the proxy the call was made on
    pub fn proxy_id(&self) -> ProxyId {
        self.proxy_id
    }

    /// Name of the mock the call was made on
    pub fn mock_name(&self) -> &str {
        &self.mock_name
    }

    /// The invoked method
    pub fn method(&self) -> &MethodSig {
        &self.method
    }

    /// The live argument cells, in call order
    pub fn arguments(&self) -> &[ArgCell] {
        &self.arguments
    }

    /// The call-time argument snapshots, in call order
    pub fn argument_snapshots(&self) -> &[Value] {
        &self.argument_snapshots
    }

    /// Where the call was made
    pub fn invoked_at(&self) -> &Location {
        &self.invoked_at
    }

    /// `name.method(arg, ...)` for reports and failure messages
    pub fn describe(&self) -> String {
        let args: Vec<String> = self
            .argument_snapshots
            .iter()
            .map(|v| v.to_string())
            .collect();
        format!("{}.{}({})", self.mock_name, self.method.name, args.join(", "))
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("mock_name", &self.mock_name)
            .field("method", &self.method.name)
            .field("arguments", &self.argument_snapshots)
            .field("invoked_at", &self.invoked_at)
            .finish()
    }
}

/// An invocation as observed by the scenario, with its resolution and outcome
///
/// Append-only once created: everything is fixed at construction except the
/// result, which is written exactly once after the behavior executes.
pub struct ObservedInvocation {
    invocation: Invocation,
    behavior_defining: Option<Arc<BehaviorDefiningInvocation>>,
    executed_behavior: Option<Arc<dyn MockBehavior>>,
    result: OnceCell<CallResult>,
}

impl ObservedInvocation {
    /// Record an observed invocation before its behavior executes
    pub fn new(
        invocation: Invocation,
        behavior_defining: Option<Arc<BehaviorDefiningInvocation>>,
        executed_behavior: Option<Arc<dyn MockBehavior>>,
    ) -> Self {
        ObservedInvocation {
            invocation,
            behavior_defining,
            executed_behavior,
            result: OnceCell::new(),
        }
    }

    /// The underlying invocation record
    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    /// The behavior-defining invocation that matched, if any
    ///
    /// `None` means the call was unexpectedly unstubbed, which is what
    /// `assert_no_more_invocations` looks for.
    pub fn behavior_defining(&self) -> Option<&Arc<BehaviorDefiningInvocation>> {
        self.behavior_defining.as_ref()
    }

    /// The behavior that was actually executed, if any
    pub fn executed_behavior(&self) -> Option<&Arc<dyn MockBehavior>> {
        self.executed_behavior.as_ref()
    }

    /// Write the call outcome. Write-once: a second write is ignored.
    ///
    /// The stored value is a snapshot taken at completion time.
    pub fn set_result(&self, result: CallResult) {
        let _ = self.result.set(result);
    }

    /// The recorded outcome, if the behavior has completed
    pub fn result(&self) -> Option<&CallResult> {
        self.result.get()
    }

    /// One report line fragment: `name.method(args) -> result`
    pub fn describe(&self) -> String {
        let call = self.invocation.describe();
        match self.result.get() {
            Some(Ok(value)) => {
                if self.invocation.method().return_kind.is_void() {
                    call
                } else {
                    format!("{} -> {}", call, value)
                }
            }
            Some(Err(raised)) => format!("{} raised {}", call, raised),
            None => call,
        }
    }
}

impl fmt::Debug for ObservedInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservedInvocation")
            .field("invocation", &self.invocation)
            .field("stubbed", &self.behavior_defining.is_some())
            .field("result", &self.result.get())
            .finish()
    }
}
