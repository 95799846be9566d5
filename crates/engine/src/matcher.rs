//! Argument matchers
//!
//! One matcher per formal parameter of a stubbed or asserted method.
//! A matcher evaluates a call-time argument and yields a [`MatchResult`]:
//! no match, or a match with an integer score. More specific matchers score
//! higher, so an exact-value stub beats a wildcard-heavy one.
//!
//! Stateful matchers (capture) record the matched value through the
//! [`ArgumentMatcher::matched`] hook, which the resolver fires exactly once
//! for the winning candidate. Trial scoring of rejected candidates never
//! triggers side effects.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use understudy_core::{ArgCell, Value};

/// Score of a wildcard match (any, predicate, capture)
pub const SCORE_ANY: u32 = 1;
/// Score of a deep-equality match
pub const SCORE_EQUALS: u32 = 2;
/// Score of an identity match, the most specific
pub const SCORE_SAME: u32 = 3;

/// Outcome of evaluating one matcher against one argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    /// The argument does not satisfy the matcher
    NoMatch,
    /// The argument matches, with the given specificity score
    Match(u32),
}

impl MatchResult {
    /// The score, or `None` for no match
    pub fn score(&self) -> Option<u32> {
        match self {
            MatchResult::NoMatch => None,
            MatchResult::Match(score) => Some(*score),
        }
    }
}

/// A match rule for one argument position
///
/// Matchers see two views of the argument: the live cell (for identity)
/// and the value it held when the call was captured (for everything else).
/// Assertions run long after the call, so value-based matching must read
/// the invocation-time snapshot or a mutated shared argument would
/// retroactively change what was seen.
pub trait ArgumentMatcher: Send + Sync {
    /// Evaluate the argument. Must be free of side effects: candidates are
    /// trial-scored and most of them lose.
    fn matches(&self, argument: &ArgCell, invoked_value: &Value) -> MatchResult;

    /// Side-effect hook, fired once when this matcher's candidate wins the
    /// final resolution. Captures record their value here.
    fn matched(&self, argument: &ArgCell) {
        let _ = argument;
    }

    /// Whether this matcher was declared with a not-default value.
    /// Feeds the specificity tie-break of the match resolver.
    fn is_not_default_argument(&self) -> bool {
        false
    }

    /// Human-readable form for failure messages, e.g. `"abc"` or `<any>`
    fn describe(&self) -> String;
}

impl fmt::Debug for dyn ArgumentMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// Shared handle to arguments: a boxed, reference-counted matcher
pub type ArgMatcher = Arc<dyn ArgumentMatcher>;

/// Evaluate a matcher set against an argument list
///
/// `invoked_values` are the invocation-time snapshots, parallel to
/// `arguments`. Returns `None` when the sizes differ or any matcher yields
/// no match; otherwise the summed per-argument score. This is the single
/// matching rule shared by behavior resolution and assertion patterns.
pub fn score_arguments(
    matchers: &[ArgMatcher],
    arguments: &[ArgCell],
    invoked_values: &[Value],
) -> Option<u32> {
    if matchers.len() != arguments.len() {
        return None;
    }
    let mut total = 0u32;
    for ((matcher, argument), invoked_value) in
        matchers.iter().zip(arguments).zip(invoked_values)
    {
        total += matcher.matches(argument, invoked_value).score()?;
    }
    Some(total)
}

/// Fire the `matched` hook of every matcher against its argument
///
/// Called exactly once, for the finally-resolved candidate only.
pub fn fire_matched_hooks(matchers: &[ArgMatcher], arguments: &[ArgCell]) {
    for (matcher, argument) in matchers.iter().zip(arguments) {
        matcher.matched(argument);
    }
}

/// Deep-equality matcher against a snapshot taken at declaration time
pub struct EqualsMatcher {
    expected: Value,
}

impl EqualsMatcher {
    /// Match arguments deep-equal to `expected`
    pub fn new(expected: impl Into<Value>) -> Self {
        EqualsMatcher {
            expected: expected.into(),
        }
    }
}

impl ArgumentMatcher for EqualsMatcher {
    fn matches(&self, _argument: &ArgCell, invoked_value: &Value) -> MatchResult {
        if *invoked_value == self.expected {
            MatchResult::Match(SCORE_EQUALS)
        } else {
            MatchResult::NoMatch
        }
    }

    fn is_not_default_argument(&self) -> bool {
        !self.expected.is_default()
    }

    fn describe(&self) -> String {
        self.expected.to_string()
    }
}

/// Wildcard matcher: matches anything with the lowest score
pub struct AnyMatcher;

impl ArgumentMatcher for AnyMatcher {
    fn matches(&self, _argument: &ArgCell, _invoked_value: &Value) -> MatchResult {
        MatchResult::Match(SCORE_ANY)
    }

    fn describe(&self) -> String {
        "<any>".to_string()
    }
}

/// Identity matcher: matches the exact same argument cell (or the same
/// proxy handle), scoring above deep equality
pub struct SameMatcher {
    expected: ArgCell,
}

impl SameMatcher {
    /// Match only the given cell itself
    pub fn new(expected: ArgCell) -> Self {
        SameMatcher { expected }
    }
}

impl ArgumentMatcher for SameMatcher {
    fn matches(&self, argument: &ArgCell, invoked_value: &Value) -> MatchResult {
        if self.expected.ptr_eq(argument) {
            return MatchResult::Match(SCORE_SAME);
        }
        // Distinct cells holding the same proxy handle are still the same
        // mocked instance
        if let (Value::Handle(expected), Value::Handle(actual)) =
            (&self.expected.snapshot(), invoked_value)
        {
            if expected.ptr_eq(actual) {
                return MatchResult::Match(SCORE_SAME);
            }
        }
        MatchResult::NoMatch
    }

    fn is_not_default_argument(&self) -> bool {
        !self.expected.snapshot().is_default()
    }

    fn describe(&self) -> String {
        format!("<same as {}>", self.expected.snapshot())
    }
}

/// Custom-predicate matcher over the argument's snapshot value
pub struct PredicateMatcher {
    predicate: Box<dyn Fn(&Value) -> bool + Send + Sync>,
    description: String,
}

impl PredicateMatcher {
    /// Match arguments whose snapshot satisfies the predicate
    pub fn new(
        description: impl Into<String>,
        predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        PredicateMatcher {
            predicate: Box::new(predicate),
            description: description.into(),
        }
    }
}

impl ArgumentMatcher for PredicateMatcher {
    fn matches(&self, _argument: &ArgCell, invoked_value: &Value) -> MatchResult {
        if (self.predicate)(invoked_value) {
            MatchResult::Match(SCORE_ANY)
        } else {
            MatchResult::NoMatch
        }
    }

    fn describe(&self) -> String {
        format!("<{}>", self.description)
    }
}

/// Shared cell a [`CaptureMatcher`] records matched values into
#[derive(Clone, Default)]
pub struct Captor {
    values: Arc<Mutex<Vec<Value>>>,
}

impl Captor {
    /// Create an empty captor
    pub fn new() -> Self {
        Captor::default()
    }

    /// The most recently captured value
    pub fn last(&self) -> Option<Value> {
        self.values.lock().last().cloned()
    }

    /// Every captured value, in capture order
    pub fn all(&self) -> Vec<Value> {
        self.values.lock().clone()
    }

    /// Number of captured values
    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    /// Whether nothing has been captured yet
    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }

    fn push(&self, value: Value) {
        self.values.lock().push(value);
    }
}

impl fmt::Debug for Captor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Captor").field(&*self.values.lock()).finish()
    }
}

/// Wildcard matcher that records the matched value into a [`Captor`]
///
/// Recording happens in the `matched` hook only, so values from rejected
/// candidates are never captured.
pub struct CaptureMatcher {
    captor: Captor,
}

impl CaptureMatcher {
    /// Capture matched values into the given captor
    pub fn new(captor: Captor) -> Self {
        CaptureMatcher { captor }
    }
}

impl ArgumentMatcher for CaptureMatcher {
    fn matches(&self, _argument: &ArgCell, _invoked_value: &Value) -> MatchResult {
        MatchResult::Match(SCORE_ANY)
    }

    fn matched(&self, argument: &ArgCell) {
        self.captor.push(argument.snapshot());
    }

    fn describe(&self) -> String {
        "<capture>".to_string()
    }
}
