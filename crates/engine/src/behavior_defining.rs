//! Behavior-defining invocations and the match resolver
//!
//! A behavior-defining invocation is one declared stub rule: a method, one
//! matcher per parameter, the behavior to execute on a match, and a
//! one-time flag. Each mock owns two registries of them:
//!
//! - the **one-time** pool: entries are consumed on first match, earliest
//!   declared wins a tie (declarations are used in the order they were
//!   written)
//! - the **always** pool: entries are reusable, latest declared wins a tie
//!   (explicit re-stubbing overrides earlier stubbing)
//!
//! Resolution ranks candidates by summed matching score first, then by the
//! count of not-default declared arguments, and only then by declaration
//! order. Score dominates; the not-default count never overrides it.

use std::fmt;
use std::sync::Arc;
use tracing::debug;
use understudy_core::{Location, MethodSig};

use crate::behavior::MockBehavior;
use crate::invocation::Invocation;
use crate::matcher::{fire_matched_hooks, score_arguments, ArgMatcher};

/// One declared stub rule
pub struct BehaviorDefiningInvocation {
    mock_name: String,
    method: MethodSig,
    matchers: Vec<ArgMatcher>,
    behavior: Arc<dyn MockBehavior>,
    one_time_match: bool,
    declared_at: Location,
}

impl BehaviorDefiningInvocation {
    /// Create a stub rule
    pub fn new(
        mock_name: impl Into<String>,
        method: MethodSig,
        matchers: Vec<ArgMatcher>,
        behavior: Arc<dyn MockBehavior>,
        one_time_match: bool,
        declared_at: Location,
    ) -> Self {
        BehaviorDefiningInvocation {
            mock_name: mock_name.into(),
            method,
            matchers,
            behavior,
            one_time_match,
            declared_at,
        }
    }

    /// The stubbed method
    pub fn method(&self) -> &MethodSig {
        &self.method
    }

    /// The declared matcher set, one per parameter
    pub fn matchers(&self) -> &[ArgMatcher] {
        &self.matchers
    }

    /// The behavior to execute on a match
    pub fn behavior(&self) -> &Arc<dyn MockBehavior> {
        &self.behavior
    }

    /// Whether this rule is consumed on first match
    pub fn is_one_time_match(&self) -> bool {
        self.one_time_match
    }

    /// Where the stub was declared
    pub fn declared_at(&self) -> &Location {
        &self.declared_at
    }

    /// Score this rule against an incoming invocation
    ///
    /// `None` when the method differs, the matcher-set size differs from
    /// the argument count, or any matcher rejects its argument. Otherwise
    /// the summed per-argument score.
    pub fn matching_score(&self, invocation: &Invocation) -> Option<u32> {
        if self.method.name != invocation.method().name {
            return None;
        }
        score_arguments(
            &self.matchers,
            invocation.arguments(),
            invocation.argument_snapshots(),
        )
    }

    /// Number of matchers declared with a not-default value
    ///
    /// The specificity tie-break: among equal-score candidates, a stub
    /// declared with concrete arguments beats a wildcard-heavy one.
    pub fn not_default_argument_count(&self) -> usize {
        self.matchers
            .iter()
            .filter(|m| m.is_not_default_argument())
            .count()
    }

    /// Fire the matchers' side-effect hooks for the resolved invocation
    pub fn matched(&self, invocation: &Invocation) {
        fire_matched_hooks(&self.matchers, invocation.arguments());
    }

    /// `name.method(matcher, ...)` for failure messages
    pub fn describe(&self) -> String {
        let args: Vec<String> = self.matchers.iter().map(|m| m.describe()).collect();
        format!("{}.{}({})", self.mock_name, self.method.name, args.join(", "))
    }
}

impl fmt::Debug for BehaviorDefiningInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviorDefiningInvocation")
            .field("rule", &self.describe())
            .field("behavior", &self.behavior.describe())
            .field("one_time_match", &self.one_time_match)
            .field("declared_at", &self.declared_at)
            .finish()
    }
}

/// Which tie-break a registry applies among equally-ranked candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolKind {
    /// Consumed on first match; earliest declared wins ties
    OneTime,
    /// Reusable; latest declared wins ties
    Always,
}

/// An ordered registry of stub rules for one mock
pub struct BehaviorDefiningInvocations {
    pool: PoolKind,
    entries: Vec<Arc<BehaviorDefiningInvocation>>,
}

impl BehaviorDefiningInvocations {
    /// Create an empty registry with the given tie-break rule
    pub fn new(pool: PoolKind) -> Self {
        BehaviorDefiningInvocations {
            pool,
            entries: Vec::new(),
        }
    }

    /// Append a stub rule (declaration order is significant)
    pub fn add(&mut self, invocation: Arc<BehaviorDefiningInvocation>) {
        self.entries.push(invocation);
    }

    /// Remove a specific rule (used when a chain step supersedes it)
    pub fn remove(&mut self, invocation: &Arc<BehaviorDefiningInvocation>) {
        self.entries.retain(|entry| !Arc::ptr_eq(entry, invocation));
    }

    /// Drop every rule
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Whether the registry holds no rules
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The registered rules, in declaration order
    pub fn entries(&self) -> &[Arc<BehaviorDefiningInvocation>] {
        &self.entries
    }

    /// Resolve the best-matching rule for an invocation
    ///
    /// Ranking: highest score, then most not-default declared arguments,
    /// then the pool's declaration-order tie-break. A one-time pool removes
    /// the winner before returning it. The winner's matcher side effects
    /// (captures) fire here, exactly once, never during trial scoring.
    pub fn get_matching(
        &mut self,
        invocation: &Invocation,
    ) -> Option<Arc<BehaviorDefiningInvocation>> {
        let mut best: Option<(usize, u32, usize)> = None;
        for (idx, entry) in self.entries.iter().enumerate() {
            let score = match entry.matching_score(invocation) {
                Some(score) => score,
                None => continue,
            };
            let not_default = entry.not_default_argument_count();
            let better = match best {
                None => true,
                Some((_, best_score, best_not_default)) => {
                    if score != best_score {
                        score > best_score
                    } else if not_default != best_not_default {
                        not_default > best_not_default
                    } else {
                        // Equal on both criteria: one-time keeps the earliest
                        // declaration, always prefers the latest
                        self.pool == PoolKind::Always
                    }
                }
            };
            if better {
                best = Some((idx, score, not_default));
            }
        }

        let (idx, score, _) = best?;
        let entry = if self.pool == PoolKind::OneTime {
            self.entries.remove(idx)
        } else {
            self.entries[idx].clone()
        };
        debug!(
            rule = %entry.describe(),
            score,
            pool = ?self.pool,
            "resolved behavior defining invocation"
        );
        entry.matched(invocation);
        Some(entry)
    }
}
