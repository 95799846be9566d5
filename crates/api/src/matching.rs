//! Matching statements
//!
//! Every stub or assertion is a two-phase statement. Phase one picks the
//! operation (`returns`, `assert_invoked`, ...) and yields a
//! [`MatchingMock`]; phase two names the method and its matchers via
//! [`MatchingMock::call`], which registers the stub rule or runs the
//! assertion.
//!
//! The [`SyntaxMonitor`] keeps the two phases honest. Starting a statement
//! while another is still open, or invoking a mock with a statement open,
//! is a declaration error attributed to the line that opened the dangling
//! statement.
//!
//! A completed stub statement on a method with a mockable return kind
//! yields a continuation `MatchingMock` for the chained mock. Continuing
//! the chain supersedes the previous step's terminal rule with a rule
//! returning the chained mock's handle, then re-registers the declared
//! behavior one step deeper. Ignoring the continuation leaves the terminal
//! rule in place.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;
use understudy_core::{Location, MethodSig, MockError, Result, Value};
use understudy_engine::{
    ArgMatcher, BehaviorDefiningInvocation, InvocationPattern, MockBehavior, MockProxy,
    ValueReturningBehavior,
};

use crate::context::ContextInner;

/// A matching statement that was opened but not yet completed
pub(crate) struct PendingStart {
    token: u64,
    pub(crate) description: String,
    pub(crate) location: Location,
}

/// Tracks the single statement allowed to be open at a time
///
/// Each started statement gets a token; only the statement holding the
/// current token may complete. A statement superseded by a later start can
/// no longer complete, and the later start learns about the dangling one.
#[derive(Default)]
pub(crate) struct SyntaxMonitor {
    pending: Mutex<Option<PendingStart>>,
    next_token: AtomicU64,
}

impl SyntaxMonitor {
    /// Open a statement; returns its token and the previously open
    /// statement, if any
    pub(crate) fn start(
        &self,
        description: String,
        location: Location,
    ) -> (u64, Option<PendingStart>) {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let previous = self.pending.lock().replace(PendingStart {
            token,
            description,
            location,
        });
        (token, previous)
    }

    /// Close the statement holding `token`; false if it is no longer pending
    pub(crate) fn complete(&self, token: u64) -> bool {
        let mut pending = self.pending.lock();
        match &*pending {
            Some(current) if current.token == token => {
                *pending = None;
                true
            }
            _ => false,
        }
    }

    /// Error for a statement left open, clearing it
    pub(crate) fn pending_error(&self) -> Option<MockError> {
        self.pending.lock().take().map(|pending| {
            MockError::declaration(
                format!(
                    "matching statement {} was started but never completed with a method call",
                    pending.description
                ),
                pending.location,
            )
        })
    }
}

/// What completing the statement does
pub(crate) enum MatchingKind {
    /// Register a stub rule executing `behavior`
    Stub {
        behavior: Arc<dyn MockBehavior>,
        one_time: bool,
    },
    /// Verify a matching call was observed
    AssertInvoked,
    /// Verify a matching call was observed, in declaration sequence
    AssertInvokedInSequence,
    /// Verify no matching call was observed
    AssertNotInvoked,
}

/// Phase two of a stub or assertion statement
///
/// Produced by the operation methods on [`crate::Mock`]; consumed by
/// [`MatchingMock::call`], which names the method the statement applies to.
pub struct MatchingMock {
    proxy: Arc<MockProxy>,
    context: Arc<ContextInner>,
    kind: MatchingKind,
    declared_at: Location,
    token: u64,
    violation: Option<PendingStart>,
    supersedes: Option<(Arc<MockProxy>, Arc<BehaviorDefiningInvocation>)>,
    chained: bool,
}

impl fmt::Debug for MatchingMock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchingMock")
            .field("declared_at", &self.declared_at)
            .field("token", &self.token)
            .field("chained", &self.chained)
            .finish_non_exhaustive()
    }
}

impl MatchingMock {
    /// Open a statement through the context's syntax monitor
    pub(crate) fn start(
        proxy: Arc<MockProxy>,
        context: Arc<ContextInner>,
        kind: MatchingKind,
        operation: &str,
        declared_at: Location,
    ) -> Self {
        let (token, violation) = context.monitor.start(
            format!("{}.{}(...)", proxy.name(), operation),
            declared_at.clone(),
        );
        MatchingMock {
            proxy,
            context,
            kind,
            declared_at,
            token,
            violation,
            supersedes: None,
            chained: false,
        }
    }

    /// The mock this statement applies to; the chained mock on continuations
    pub fn mock_name(&self) -> &str {
        self.proxy.name()
    }

    /// Complete the statement against `method_name` with one matcher per
    /// parameter
    ///
    /// For stub statements the return value is the chain continuation:
    /// `Some` when the method's return kind is mockable and a chained mock
    /// could be created, `None` otherwise. Assertion statements run
    /// immediately and never chain.
    pub fn call(
        self,
        method_name: &str,
        matchers: Vec<ArgMatcher>,
    ) -> Result<Option<MatchingMock>> {
        let MatchingMock {
            proxy,
            context,
            kind,
            declared_at,
            token,
            violation,
            supersedes,
            chained,
        } = self;

        // A statement left open by an earlier line is reported here, at the
        // first place the misuse becomes visible
        if let Some(previous) = violation {
            return Err(MockError::declaration(
                format!(
                    "matching statement {} was started but never completed with a method call",
                    previous.description
                ),
                previous.location,
            ));
        }
        if !chained && !context.monitor.complete(token) {
            return Err(MockError::declaration(
                "matching statement was already completed or superseded by a later one",
                declared_at,
            ));
        }

        let method = match proxy.find_method(method_name) {
            Some(method) => method.clone(),
            None => {
                return Err(MockError::declaration(
                    format!(
                        "mocked type {} has no method named {}",
                        proxy.mocked_type().name,
                        method_name
                    ),
                    declared_at,
                ))
            }
        };
        if matchers.len() != method.arity {
            return Err(MockError::declaration(
                format!(
                    "method {} takes {} argument(s) but {} matcher(s) were given",
                    method.name,
                    method.arity,
                    matchers.len()
                ),
                declared_at,
            ));
        }

        match kind {
            MatchingKind::Stub { behavior, one_time } => {
                if let Some((outer, superseded)) = supersedes {
                    Self::replace_with_chain_link(&outer, &superseded, &proxy);
                }
                let rule = Arc::new(BehaviorDefiningInvocation::new(
                    proxy.name().to_string(),
                    method.clone(),
                    matchers,
                    behavior.clone(),
                    one_time,
                    declared_at.clone(),
                ));
                proxy.add_behavior(rule.clone());
                debug!(rule = %rule.describe(), one_time, "stub rule registered");
                Ok(Self::continuation(
                    proxy, context, method, behavior, one_time, rule, declared_at,
                ))
            }
            MatchingKind::AssertInvoked => {
                let pattern =
                    InvocationPattern::new(proxy.id(), proxy.name(), method, matchers, declared_at);
                context.scenario.lock().assert_invoked(&pattern)?;
                Ok(None)
            }
            MatchingKind::AssertInvokedInSequence => {
                let pattern =
                    InvocationPattern::new(proxy.id(), proxy.name(), method, matchers, declared_at);
                context.scenario.lock().assert_invoked_in_sequence(&pattern)?;
                Ok(None)
            }
            MatchingKind::AssertNotInvoked => {
                let pattern =
                    InvocationPattern::new(proxy.id(), proxy.name(), method, matchers, declared_at);
                context.scenario.lock().assert_not_invoked(&pattern)?;
                Ok(None)
            }
        }
    }

    /// Supersede the previous chain step's terminal rule with one returning
    /// the chained mock's handle
    ///
    /// One link per superseded declaration: each matcher set a fluent path
    /// was stubbed with keeps resolving to the chained mock. Restubbing the
    /// same matchers lands duplicate links in the always pool, where the
    /// latest wins, so duplicates are harmless.
    fn replace_with_chain_link(
        outer: &Arc<MockProxy>,
        superseded: &Arc<BehaviorDefiningInvocation>,
        chained: &Arc<MockProxy>,
    ) {
        outer.remove_behavior(superseded);
        let link = Arc::new(BehaviorDefiningInvocation::new(
            outer.name().to_string(),
            superseded.method().clone(),
            superseded.matchers().to_vec(),
            Arc::new(ValueReturningBehavior::new(Value::Handle(chained.handle()))),
            false,
            superseded.declared_at().clone(),
        ));
        outer.add_behavior(link);
        debug!(
            mock = %outer.name(),
            method = %superseded.method().name,
            chained = %chained.name(),
            "chain link registered"
        );
    }

    /// The continuation for a completed stub step, when the method chains
    fn continuation(
        proxy: Arc<MockProxy>,
        context: Arc<ContextInner>,
        method: MethodSig,
        behavior: Arc<dyn MockBehavior>,
        one_time: bool,
        rule: Arc<BehaviorDefiningInvocation>,
        declared_at: Location,
    ) -> Option<MatchingMock> {
        if !context.config.chaining_enabled || !method.return_kind.is_mockable() {
            return None;
        }
        let chained_proxy = context.chained.get_or_create(&proxy, &method, |type_name| {
            let name = format!("{}.{}", proxy.name(), method.name);
            context.create_chained_proxy(&name, type_name)
        })?;
        Some(MatchingMock {
            proxy: chained_proxy,
            context,
            kind: MatchingKind::Stub { behavior, one_time },
            declared_at,
            token: 0,
            violation: None,
            supersedes: Some((proxy, rule)),
            chained: true,
        })
    }
}
