//! Observed-invocations report
//!
//! Plain-text rendering of the scenario, embedded in every assertion
//! failure so the test author sees the surrounding call history, not just
//! the offending call. Read-only over the log.

use crate::invocation::ObservedInvocation;
use crate::scenario::VerificationStatus;

/// Render one numbered line per observed invocation
///
/// Format: `N. name.method(args) -> result  [marker]` where the marker
/// reflects the entry's verification status. Output is capped at
/// `max_invocations` lines; a trailing line notes how many were elided.
pub fn render_observed_invocations(
    observed_invocations: &[ObservedInvocation],
    verification_statuses: &[VerificationStatus],
    max_invocations: usize,
) -> String {
    if observed_invocations.is_empty() {
        return "<no invocations observed>".to_string();
    }

    let mut lines = Vec::new();
    for (idx, observed) in observed_invocations.iter().take(max_invocations).enumerate() {
        let marker = match verification_statuses.get(idx) {
            Some(VerificationStatus::Verified) => "  [verified]",
            Some(VerificationStatus::VerifiedInOrder) => "  [verified in order]",
            _ => "",
        };
        lines.push(format!("{}. {}{}", idx + 1, observed.describe(), marker));
    }
    if observed_invocations.len() > max_invocations {
        lines.push(format!(
            "... {} more invocation(s) not shown",
            observed_invocations.len() - max_invocations
        ));
    }
    lines.join("\n")
}
