//! Mock invocation matching and verification engine
//!
//! This crate is the core of understudy:
//! - Invocation capture records (invocation)
//! - Argument matchers with scored matching (matcher)
//! - Behavior-defining invocations and the match resolver (behavior_defining)
//! - Mock behaviors and their validation (behavior)
//! - The proxy call pipeline: resolve, validate, execute, record (proxy)
//! - Scenario log and verification state machine (scenario)
//! - Observed-invocations report rendering (report)
//! - Chained-mock support for fluent stubbing (chain)
//! - Engine configuration (config)
//!
//! The fluent test-author surface lives in `understudy-api`; this crate is
//! pure bookkeeping over in-memory state, scoped to one test execution.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod behavior;
pub mod behavior_defining;
pub mod chain;
pub mod config;
pub mod invocation;
pub mod matcher;
pub mod proxy;
pub mod report;
pub mod scenario;

pub use behavior::{
    DefaultValueReturningBehavior, ExceptionThrowingBehavior, MockBehavior,
    OriginalBehaviorInvokingBehavior, PerformsBehavior, StubBehavior, ValueReturningBehavior,
};
pub use behavior_defining::{BehaviorDefiningInvocation, BehaviorDefiningInvocations, PoolKind};
pub use chain::ChainedMocks;
pub use config::EngineConfig;
pub use invocation::{
    CallDelegate, CallResult, Invocation, InvocationHandler, ObservedInvocation, ProxyId,
};
pub use matcher::{
    score_arguments, AnyMatcher, ArgMatcher, ArgumentMatcher, CaptureMatcher, Captor,
    EqualsMatcher, MatchResult, PredicateMatcher, SameMatcher, SCORE_ANY, SCORE_EQUALS,
    SCORE_SAME,
};
pub use proxy::MockProxy;
pub use report::render_observed_invocations;
pub use scenario::{InvocationPattern, Scenario, VerificationStatus};
