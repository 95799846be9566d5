//! Scenario log and verifier
//!
//! The scenario is the ordered, append-only history of every call observed
//! on any mock within the current test-subject scope. Each entry carries a
//! verification status driven by the assertion state machine:
//!
//! ```text
//! Unverified --assert_invoked-------------> Verified            (terminal)
//! Unverified --assert_invoked_in_sequence-> VerifiedInOrder     (terminal)
//! ```
//!
//! Both verified states are terminal for their entry: a second assertion of
//! the same kind can never re-verify the same call, which is what makes
//! repeated assertions count distinct calls instead of double-counting one.
//!
//! The scenario is reset when a new test subject is installed, not on a
//! fixed schedule; that scopes state per test method without explicit
//! teardown.

use std::fmt;
use tracing::debug;
use understudy_core::{AssertionKind, Location, MethodSig, MockError};

use crate::invocation::{Invocation, ObservedInvocation, ProxyId};
use crate::matcher::{score_arguments, ArgMatcher};
use crate::report::render_observed_invocations;

/// Verification status of one observed invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStatus {
    /// Not yet matched by any assertion
    Unverified,
    /// Matched by `assert_invoked`; terminal
    Verified,
    /// Matched by `assert_invoked_in_sequence`; terminal
    VerifiedInOrder,
}

/// A recorded assertion pattern: method + matchers, matched pass/fail
///
/// Uses the same per-argument rule as behavior resolution, but an assertion
/// only needs to know *whether* a call matches, not how well.
pub struct InvocationPattern {
    proxy_id: ProxyId,
    mock_name: String,
    method: MethodSig,
    matchers: Vec<ArgMatcher>,
    asserted_at: Location,
}

impl InvocationPattern {
    /// Create an assertion pattern for the given proxy and method
    pub fn new(
        proxy_id: ProxyId,
        mock_name: impl Into<String>,
        method: MethodSig,
        matchers: Vec<ArgMatcher>,
        asserted_at: Location,
    ) -> Self {
        InvocationPattern {
            proxy_id,
            mock_name: mock_name.into(),
            method,
            matchers,
            asserted_at,
        }
    }

    /// Whether the observed invocation satisfies this pattern
    ///
    /// Argument values are the invocation-time snapshots, so mutating a
    /// shared argument after the call cannot change the verdict.
    pub fn matches(&self, invocation: &Invocation) -> bool {
        invocation.proxy_id() == self.proxy_id
            && invocation.method().name == self.method.name
            && score_arguments(
                &self.matchers,
                invocation.arguments(),
                invocation.argument_snapshots(),
            )
            .is_some()
    }

    /// Where the assertion was declared
    pub fn asserted_at(&self) -> &Location {
        &self.asserted_at
    }

    /// `name.method(matcher, ...)` for failure messages
    pub fn describe(&self) -> String {
        let args: Vec<String> = self.matchers.iter().map(|m| m.describe()).collect();
        format!("{}.{}({})", self.mock_name, self.method.name, args.join(", "))
    }
}

impl fmt::Debug for InvocationPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationPattern")
            .field("pattern", &self.describe())
            .field("asserted_at", &self.asserted_at)
            .finish()
    }
}

/// Ordered history of observed invocations with verification statuses
pub struct Scenario {
    observed_invocations: Vec<ObservedInvocation>,
    verification_statuses: Vec<VerificationStatus>,
    test_subject: Option<String>,
    max_report_invocations: usize,
}

impl Scenario {
    /// Create an empty scenario
    pub fn new(max_report_invocations: usize) -> Self {
        Scenario {
            observed_invocations: Vec::new(),
            verification_statuses: Vec::new(),
            test_subject: None,
            max_report_invocations,
        }
    }

    /// The currently installed test-subject id, if any
    pub fn test_subject(&self) -> Option<&str> {
        self.test_subject.as_deref()
    }

    /// Install a test subject, resetting the scenario if it changed
    ///
    /// Returns true if a reset happened. Installing the same subject twice
    /// is a no-op, so state accumulates within one test method and clears
    /// across them.
    pub fn ensure_subject(&mut self, subject: &str) -> bool {
        if self.test_subject.as_deref() == Some(subject) {
            return false;
        }
        debug!(subject, "new test subject detected, resetting scenario");
        self.reset();
        self.test_subject = Some(subject.to_string());
        true
    }

    /// Clear the log and all statuses
    pub fn reset(&mut self) {
        self.observed_invocations.clear();
        self.verification_statuses.clear();
        self.test_subject = None;
    }

    /// Append an observed invocation with status `Unverified`
    pub fn add_observed_invocation(&mut self, observed_invocation: ObservedInvocation) {
        self.observed_invocations.push(observed_invocation);
        self.verification_statuses.push(VerificationStatus::Unverified);
    }

    /// The observed invocations, in call-arrival order
    pub fn observed_invocations(&self) -> &[ObservedInvocation] {
        &self.observed_invocations
    }

    /// The verification statuses, parallel to the invocation list
    pub fn verification_statuses(&self) -> &[VerificationStatus] {
        &self.verification_statuses
    }

    /// Assert that an unverified matching call was observed; marks it verified
    ///
    /// Scans in arrival order and marks the first unverified match, so two
    /// assertions for two equal prior calls verify two distinct entries.
    pub fn assert_invoked(&mut self, pattern: &InvocationPattern) -> understudy_core::Result<()> {
        for (idx, observed) in self.observed_invocations.iter().enumerate() {
            if self.verification_statuses[idx] == VerificationStatus::Unverified
                && pattern.matches(observed.invocation())
            {
                self.verification_statuses[idx] = VerificationStatus::Verified;
                return Ok(());
            }
        }
        Err(MockError::assertion(
            AssertionKind::NotInvoked,
            format!(
                "expected invocation of {}, but it did not occur (asserted at {})",
                pattern.describe(),
                pattern.asserted_at()
            ),
            self.render_report(),
        ))
    }

    /// Assert that an unverified matching call was observed, in sequence
    ///
    /// Marks the first unverified match as verified-in-order, then requires
    /// that no later entry was already verified in order: successive
    /// in-sequence assertions must match entries at non-decreasing log
    /// positions. An order violation reports differently from a missing
    /// call.
    pub fn assert_invoked_in_sequence(
        &mut self,
        pattern: &InvocationPattern,
    ) -> understudy_core::Result<()> {
        let mut matched_idx: Option<usize> = None;
        for idx in 0..self.observed_invocations.len() {
            let status = self.verification_statuses[idx];
            if matched_idx.is_none()
                && status == VerificationStatus::Unverified
                && pattern.matches(self.observed_invocations[idx].invocation())
            {
                self.verification_statuses[idx] = VerificationStatus::VerifiedInOrder;
                matched_idx = Some(idx);
                continue;
            }
            // A later entry already verified in order means the matched call
            // happened before one that was asserted earlier
            if let Some(matched) = matched_idx {
                if status == VerificationStatus::VerifiedInOrder {
                    let matched_call = self.observed_invocations[matched].invocation().describe();
                    let out_of_order_call =
                        self.observed_invocations[idx].invocation().describe();
                    return Err(MockError::assertion(
                        AssertionKind::OutOfOrder,
                        format!(
                            "invocation of {} was expected to be performed after {} but actually occurred before it (asserted at {})",
                            matched_call,
                            out_of_order_call,
                            pattern.asserted_at()
                        ),
                        self.render_report(),
                    ));
                }
            }
        }
        if matched_idx.is_none() {
            return Err(MockError::assertion(
                AssertionKind::NotInvoked,
                format!(
                    "expected invocation of {}, but it did not occur (asserted at {})",
                    pattern.describe(),
                    pattern.asserted_at()
                ),
                self.render_report(),
            ));
        }
        Ok(())
    }

    /// Assert that no unverified matching call was observed
    ///
    /// Never mutates verification statuses: a negative assertion does not
    /// consume.
    pub fn assert_not_invoked(&self, pattern: &InvocationPattern) -> understudy_core::Result<()> {
        for (idx, observed) in self.observed_invocations.iter().enumerate() {
            if self.verification_statuses[idx] == VerificationStatus::Unverified
                && pattern.matches(observed.invocation())
            {
                return Err(MockError::assertion(
                    AssertionKind::UnexpectedInvocation,
                    format!(
                        "expected no invocation of {}, but it did occur at {} (asserted at {})",
                        pattern.describe(),
                        observed.invocation().invoked_at(),
                        pattern.asserted_at()
                    ),
                    self.render_report(),
                ));
            }
        }
        Ok(())
    }

    /// Assert that every unexpectedly-unstubbed call has been verified
    ///
    /// Entries that matched a declared stub are expected "background"
    /// interactions and are exempt; only unstubbed, still-unverified calls
    /// fail this check.
    pub fn assert_no_more_invocations(&self, asserted_at: &Location) -> understudy_core::Result<()> {
        let unexpected: Vec<&ObservedInvocation> = self
            .observed_invocations
            .iter()
            .enumerate()
            .filter(|(idx, observed)| {
                observed.behavior_defining().is_none()
                    && self.verification_statuses[*idx] == VerificationStatus::Unverified
            })
            .map(|(_, observed)| observed)
            .collect();
        if unexpected.is_empty() {
            return Ok(());
        }
        let calls: Vec<String> = unexpected
            .iter()
            .map(|observed| observed.invocation().describe())
            .collect();
        Err(MockError::assertion(
            AssertionKind::MoreInvocationsObserved,
            format!(
                "no more invocations expected, yet observed: {} (asserted at {})",
                calls.join(", "),
                asserted_at
            ),
            self.render_report(),
        ))
    }

    /// Render the full observed-invocations report
    pub fn render_report(&self) -> String {
        render_observed_invocations(
            &self.observed_invocations,
            &self.verification_statuses,
            self.max_report_invocations,
        )
    }
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("test_subject", &self.test_subject)
            .field("observed", &self.observed_invocations.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{AnyMatcher, EqualsMatcher};
    use std::sync::Arc;
    use understudy_core::{ArgCell, ReturnKind, Value};

    struct Fixture {
        scenario: Scenario,
        proxy_id: ProxyId,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                scenario: Scenario::new(50),
                proxy_id: ProxyId::new(),
            }
        }

        fn observe(&mut self, method: &str, argument: impl Into<Value>) {
            let invocation = Invocation::capture(
                self.proxy_id,
                "service",
                MethodSig::new(method, 1, ReturnKind::Str),
                vec![ArgCell::new(argument)],
                Location::unknown(),
            );
            self.scenario
                .add_observed_invocation(ObservedInvocation::new(invocation, None, None));
        }

        fn pattern(&self, method: &str, argument: impl Into<Value>) -> InvocationPattern {
            InvocationPattern::new(
                self.proxy_id,
                "service",
                MethodSig::new(method, 1, ReturnKind::Str),
                vec![Arc::new(EqualsMatcher::new(argument))],
                Location::unknown(),
            )
        }

        fn wildcard_pattern(&self, method: &str) -> InvocationPattern {
            InvocationPattern::new(
                self.proxy_id,
                "service",
                MethodSig::new(method, 1, ReturnKind::Str),
                vec![Arc::new(AnyMatcher)],
                Location::unknown(),
            )
        }
    }

    #[test]
    fn test_assert_invoked_marks_first_unverified_match() {
        let mut fixture = Fixture::new();
        fixture.observe("find", "a");
        fixture.observe("find", "a");

        let pattern = fixture.wildcard_pattern("find");
        fixture.scenario.assert_invoked(&pattern).unwrap();
        fixture.scenario.assert_invoked(&pattern).unwrap();

        // Two assertions verified two distinct entries
        assert_eq!(
            fixture.scenario.verification_statuses(),
            &[VerificationStatus::Verified, VerificationStatus::Verified]
        );
        // A third assertion has nothing left to match
        let err = fixture.scenario.assert_invoked(&pattern).unwrap_err();
        assert_eq!(err.assertion_kind(), Some(AssertionKind::NotInvoked));
    }

    #[test]
    fn test_assert_invoked_failure_names_expected_call() {
        let mut fixture = Fixture::new();
        fixture.observe("save", "b");

        let err = fixture
            .scenario
            .assert_invoked(&fixture.pattern("find", "a"))
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("service.find(\"a\")"));
        // The full scenario is reported, not just the offending call
        assert!(msg.contains("service.save(\"b\")"));
    }

    #[test]
    fn test_assert_invoked_in_sequence_in_order() {
        let mut fixture = Fixture::new();
        fixture.observe("find", 1);
        fixture.observe("find", 2);

        fixture
            .scenario
            .assert_invoked_in_sequence(&fixture.pattern("find", 1))
            .unwrap();
        fixture
            .scenario
            .assert_invoked_in_sequence(&fixture.pattern("find", 2))
            .unwrap();
    }

    #[test]
    fn test_assert_invoked_in_sequence_out_of_order_reports_ordering_failure() {
        let mut fixture = Fixture::new();
        fixture.observe("find", 1);
        fixture.observe("find", 2);

        fixture
            .scenario
            .assert_invoked_in_sequence(&fixture.pattern("find", 2))
            .unwrap();
        let err = fixture
            .scenario
            .assert_invoked_in_sequence(&fixture.pattern("find", 1))
            .unwrap_err();

        // Ordering failure, not a not-found failure
        assert_eq!(err.assertion_kind(), Some(AssertionKind::OutOfOrder));
    }

    #[test]
    fn test_assert_invoked_in_sequence_missing_reports_not_invoked() {
        let mut fixture = Fixture::new();
        fixture.observe("find", 1);

        let err = fixture
            .scenario
            .assert_invoked_in_sequence(&fixture.pattern("find", 9))
            .unwrap_err();
        assert_eq!(err.assertion_kind(), Some(AssertionKind::NotInvoked));
    }

    #[test]
    fn test_assert_not_invoked_never_mutates_status() {
        let mut fixture = Fixture::new();
        fixture.observe("find", "a");

        let before = fixture.scenario.verification_statuses().to_vec();
        fixture
            .scenario
            .assert_not_invoked(&fixture.pattern("find", "z"))
            .unwrap();
        assert_eq!(fixture.scenario.verification_statuses(), &before[..]);

        let err = fixture
            .scenario
            .assert_not_invoked(&fixture.pattern("find", "a"))
            .unwrap_err();
        assert_eq!(err.assertion_kind(), Some(AssertionKind::UnexpectedInvocation));
        // Even a failing negative assertion leaves statuses untouched
        assert_eq!(fixture.scenario.verification_statuses(), &before[..]);
    }

    #[test]
    fn test_verified_entries_are_terminal_across_assertion_kinds() {
        let mut fixture = Fixture::new();
        fixture.observe("find", "a");

        fixture
            .scenario
            .assert_invoked(&fixture.pattern("find", "a"))
            .unwrap();
        // The single call is consumed; the in-sequence assertion cannot
        // re-verify it
        let err = fixture
            .scenario
            .assert_invoked_in_sequence(&fixture.pattern("find", "a"))
            .unwrap_err();
        assert_eq!(err.assertion_kind(), Some(AssertionKind::NotInvoked));
    }

    #[test]
    fn test_assert_no_more_invocations_exempts_stubbed_calls() {
        use crate::behavior::ValueReturningBehavior;
        use crate::behavior_defining::BehaviorDefiningInvocation;

        let mut fixture = Fixture::new();
        // An unstubbed call
        fixture.observe("find", "a");
        // A stubbed ("background") call
        let stubbed = Invocation::capture(
            fixture.proxy_id,
            "service",
            MethodSig::new("ping", 0, ReturnKind::Str),
            vec![],
            Location::unknown(),
        );
        let rule = Arc::new(BehaviorDefiningInvocation::new(
            "service",
            MethodSig::new("ping", 0, ReturnKind::Str),
            vec![],
            Arc::new(ValueReturningBehavior::new("pong")),
            false,
            Location::unknown(),
        ));
        fixture
            .scenario
            .add_observed_invocation(ObservedInvocation::new(stubbed, Some(rule), None));

        let err = fixture
            .scenario
            .assert_no_more_invocations(&Location::unknown())
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("service.find(\"a\")"));
        assert!(!msg.contains("no more invocations expected, yet observed: service.ping"));

        // Verifying the unstubbed call satisfies the check
        fixture
            .scenario
            .assert_invoked(&fixture.pattern("find", "a"))
            .unwrap();
        fixture
            .scenario
            .assert_no_more_invocations(&Location::unknown())
            .unwrap();
    }

    #[test]
    fn test_ensure_subject_resets_only_on_change() {
        let mut fixture = Fixture::new();
        fixture.scenario.ensure_subject("test_a");
        fixture.observe("find", "a");

        assert!(!fixture.scenario.ensure_subject("test_a"));
        assert_eq!(fixture.scenario.observed_invocations().len(), 1);

        assert!(fixture.scenario.ensure_subject("test_b"));
        assert!(fixture.scenario.observed_invocations().is_empty());
        assert_eq!(fixture.scenario.test_subject(), Some("test_b"));
    }

    #[test]
    fn test_pattern_requires_same_proxy() {
        let mut fixture = Fixture::new();
        fixture.observe("find", "a");

        let other_proxy_pattern = InvocationPattern::new(
            ProxyId::new(),
            "other",
            MethodSig::new("find", 1, ReturnKind::Str),
            vec![Arc::new(AnyMatcher)],
            Location::unknown(),
        );
        let err = fixture
            .scenario
            .assert_invoked(&other_proxy_pattern)
            .unwrap_err();
        assert_eq!(err.assertion_kind(), Some(AssertionKind::NotInvoked));
    }
}
