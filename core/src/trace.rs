//! Evaluation trace types for debugging authorization decisions.
//!
//! Trace types mirror the runtime types ([`Matcher`](crate::Matcher),
//! [`AuthorizationEngine`](crate::AuthorizationEngine)) but capture
//! evaluation results instead of inputs. Use `evaluate_with_trace()` to see
//! why a request was allowed or denied.
//!
//! # Two Levels of Trace
//!
//! - [`MatcherTrace`] — Per-matcher: which sub-expressions matched?
//! - [`EvalTrace`] — Per-engine: which policies were checked, which one fired?
//!
//! # Example
//!
//! ```ignore
//! let trace = engine.evaluate_with_trace(&request);
//! println!("Decision: {:?}", trace.decision);
//! for step in &trace.steps {
//!     println!("  policy {}: matched={}", step.name, step.matched);
//! }
//! ```

use crate::{Decision, Field};
use std::fmt;
use std::sync::Arc;

/// Trace of a matcher evaluation.
///
/// In And/Or, ALL children are evaluated (no short-circuit) for maximum
/// debugging value. The `matched` result is still correct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatcherTrace {
    /// `Any` always matches.
    Any,
    /// A header lookup.
    Header {
        /// Whether the header matcher matched.
        matched: bool,
        /// Lower-cased header name.
        name: String,
        /// The header value, if present.
        value: Option<String>,
    },
    /// A request field lookup.
    Field {
        /// Whether the field matcher matched.
        matched: bool,
        /// Which field was read.
        field: Field,
        /// The field value, if present.
        value: Option<String>,
        /// Debug description of the value matcher.
        matcher: String,
    },
    /// AND: all children must match.
    And {
        /// Whether all children matched.
        matched: bool,
        /// Trace of each child.
        children: Vec<MatcherTrace>,
    },
    /// OR: any child must match.
    Or {
        /// Whether any child matched.
        matched: bool,
        /// Trace of each child.
        children: Vec<MatcherTrace>,
    },
    /// NOT: inverts inner result.
    Not {
        /// Whether the NOT matched (i.e., inner did NOT match).
        matched: bool,
        /// Trace of the inner matcher.
        inner: Box<MatcherTrace>,
    },
}

impl MatcherTrace {
    /// Get the overall match result.
    #[must_use]
    pub fn matched(&self) -> bool {
        match self {
            Self::Any => true,
            Self::Header { matched, .. }
            | Self::Field { matched, .. }
            | Self::And { matched, .. }
            | Self::Or { matched, .. }
            | Self::Not { matched, .. } => *matched,
        }
    }
}

/// One policy's evaluation in an [`EvalTrace`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyStep {
    /// Policy name.
    pub name: Arc<str>,
    /// Did both the permission and principal matchers match?
    pub matched: bool,
    /// Trace of the permission matcher.
    pub permissions: MatcherTrace,
    /// Trace of the principal matcher.
    pub principals: MatcherTrace,
}

/// Trace of a full [`AuthorizationEngine`](crate::AuthorizationEngine) evaluation.
///
/// # INV: `decision` == `evaluate()` result
///
/// Steps stop after the first matching policy (first-match-wins), so the
/// last step is the matched one when `decision` names a policy.
#[derive(Clone, PartialEq, Eq)]
pub struct EvalTrace {
    /// The final decision (identical to what `evaluate()` returns).
    pub decision: Decision,
    /// Trace of each policy that was evaluated, in order.
    pub steps: Vec<PolicyStep>,
}

impl fmt::Debug for EvalTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvalTrace")
            .field("decision", &self.decision)
            .field("steps", &self.steps)
            .finish()
    }
}

impl fmt::Display for EvalTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.decision)?;
        for step in &self.steps {
            writeln!(
                f,
                "  policy {:?}: permissions={} principals={} => {}",
                &*step.name,
                step.permissions.matched(),
                step.principals.matched(),
                if step.matched { "MATCH" } else { "no match" },
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DecisionType;

    #[test]
    fn matcher_trace_matched() {
        assert!(MatcherTrace::Any.matched());
        assert!(!MatcherTrace::Or {
            matched: false,
            children: vec![],
        }
        .matched());
        assert!(MatcherTrace::Not {
            matched: true,
            inner: Box::new(MatcherTrace::Header {
                matched: false,
                name: "x".into(),
                value: None,
            }),
        }
        .matched());
    }

    #[test]
    fn field_trace_debug_format() {
        let trace = MatcherTrace::Field {
            matched: true,
            field: Field::MethodName,
            value: Some("/pkg.Svc/Get".into()),
            matcher: "Exact".into(),
        };
        let debug = format!("{trace:?}");
        assert!(debug.contains("MethodName"));
        assert!(debug.contains("/pkg.Svc/Get"));
    }

    #[test]
    fn eval_trace_display() {
        let trace = EvalTrace {
            decision: Decision::new(DecisionType::Deny, Some("blocklist".into())),
            steps: vec![PolicyStep {
                name: "blocklist".into(),
                matched: true,
                permissions: MatcherTrace::Any,
                principals: MatcherTrace::Any,
            }],
        };
        let shown = trace.to_string();
        assert!(shown.starts_with("DENY (blocklist)"));
        assert!(shown.contains("\"blocklist\""));
        assert!(shown.contains("MATCH"));
    }
}
