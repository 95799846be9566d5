//! Matcher constructors for the fluent surface
//!
//! One matcher per argument position of the stubbed or asserted method.
//! `eq` is what most statements want; `any` widens a position, `same`
//! narrows it to identity, `satisfies` accepts a predicate, and `capture`
//! records whatever matched for later inspection.

use std::sync::Arc;
use understudy_core::{ArgCell, Value};
use understudy_engine::{
    AnyMatcher, ArgMatcher, CaptureMatcher, Captor, EqualsMatcher, PredicateMatcher, SameMatcher,
};

/// Match arguments deep-equal to `expected`
pub fn eq(expected: impl Into<Value>) -> ArgMatcher {
    Arc::new(EqualsMatcher::new(expected))
}

/// Match any argument
pub fn any() -> ArgMatcher {
    Arc::new(AnyMatcher)
}

/// Match only the given argument cell itself (identity, not equality)
pub fn same(expected: ArgCell) -> ArgMatcher {
    Arc::new(SameMatcher::new(expected))
}

/// Match arguments whose value satisfies the predicate
pub fn satisfies(
    description: impl Into<String>,
    predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
) -> ArgMatcher {
    Arc::new(PredicateMatcher::new(description, predicate))
}

/// Match any argument, recording the matched value into `captor`
pub fn capture(captor: &Captor) -> ArgMatcher {
    Arc::new(CaptureMatcher::new(captor.clone()))
}
