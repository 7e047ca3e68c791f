//! Per-iteration verdicts

use crate::oracle::{self, Tolerance, ToleranceBound};
use crate::runner::ExecutionResult;
use serde::Serialize;
use std::fmt;

/// Which of the two programs under comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Reference,
    Candidate,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Reference => write!(f, "reference"),
            Role::Candidate => write!(f, "candidate"),
        }
    }
}

/// Programs that terminated abnormally in one iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Culprit {
    Reference,
    Candidate,
    Both,
}

impl Culprit {
    fn from_failures(reference: bool, candidate: bool) -> Option<Self> {
        match (reference, candidate) {
            (true, true) => Some(Culprit::Both),
            (true, false) => Some(Culprit::Reference),
            (false, true) => Some(Culprit::Candidate),
            (false, false) => None,
        }
    }

    pub fn roles(&self) -> &'static [Role] {
        match self {
            Culprit::Reference => &[Role::Reference],
            Culprit::Candidate => &[Role::Candidate],
            Culprit::Both => &[Role::Reference, Role::Candidate],
        }
    }

    pub fn includes(&self, role: Role) -> bool {
        self.roles().contains(&role)
    }
}

/// Outcome of one iteration. Anything but `Ok` halts the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Ok,
    RuntimeError {
        which: Culprit,
    },
    ToleranceViolation {
        reference: i64,
        candidate: i64,
        tolerance: Tolerance,
    },
    ParseError {
        which: Role,
        raw: String,
    },
}

impl Verdict {
    pub fn is_ok(&self) -> bool {
        matches!(self, Verdict::Ok)
    }

    /// Two-letter code used in progress and report output
    pub fn code(&self) -> &'static str {
        match self {
            Verdict::Ok => "OK",
            Verdict::RuntimeError { .. } => "RE",
            Verdict::ToleranceViolation { .. } => "WA",
            Verdict::ParseError { .. } => "PE",
        }
    }
}

/// Score one iteration from the two program runs.
///
/// Abnormal termination is checked first (both programs are reported when
/// both failed), then the reference output is parsed, then the candidate
/// output, and only then is the oracle consulted.
pub fn evaluate(
    reference: &ExecutionResult,
    candidate: &ExecutionResult,
    tolerance: &Tolerance,
) -> Verdict {
    if let Some(which) = Culprit::from_failures(!reference.is_success(), !candidate.is_success()) {
        return Verdict::RuntimeError { which };
    }

    let Some(expected) = oracle::parse_answer(&reference.stdout) else {
        return Verdict::ParseError {
            which: Role::Reference,
            raw: reference.stdout.clone(),
        };
    };
    let Some(actual) = oracle::parse_answer(&candidate.stdout) else {
        return Verdict::ParseError {
            which: Role::Candidate,
            raw: candidate.stdout.clone(),
        };
    };

    if tolerance.exceeded_by(expected, actual) {
        Verdict::ToleranceViolation {
            reference: expected,
            candidate: actual,
            tolerance: *tolerance,
        }
    } else {
        Verdict::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ExitOutcome;

    fn ok(stdout: &str) -> ExecutionResult {
        ExecutionResult {
            outcome: ExitOutcome::Success,
            stdout: stdout.to_string(),
            stderr: String::new(),
            elapsed_ms: 0,
        }
    }

    fn crashed(stdout: &str) -> ExecutionResult {
        ExecutionResult {
            outcome: ExitOutcome::Failed { code: Some(139) },
            ..ok(stdout)
        }
    }

    fn half() -> Tolerance {
        Tolerance::float(0.5).unwrap()
    }

    #[test]
    fn test_within_tolerance_is_ok() {
        assert_eq!(evaluate(&ok("100\n"), &ok("150\n"), &half()), Verdict::Ok);
    }

    #[test]
    fn test_overshoot_is_violation() {
        assert_eq!(
            evaluate(&ok("100\n"), &ok("151\n"), &half()),
            Verdict::ToleranceViolation {
                reference: 100,
                candidate: 151,
                tolerance: half(),
            }
        );
    }

    #[test]
    fn test_candidate_crash() {
        let verdict = evaluate(&ok("100"), &crashed("100"), &half());
        assert_eq!(
            verdict,
            Verdict::RuntimeError {
                which: Culprit::Candidate
            }
        );
    }

    #[test]
    fn test_both_crash_reports_both() {
        let verdict = evaluate(&crashed(""), &crashed(""), &half());
        assert_eq!(verdict, Verdict::RuntimeError { which: Culprit::Both });
    }

    #[test]
    fn test_runtime_error_wins_over_parse_error() {
        let verdict = evaluate(&crashed("garbage"), &ok("1"), &half());
        assert_eq!(
            verdict,
            Verdict::RuntimeError {
                which: Culprit::Reference
            }
        );
    }

    #[test]
    fn test_timeout_counts_as_runtime_error() {
        let timed_out = ExecutionResult {
            outcome: ExitOutcome::TimedOut { after_ms: 10 },
            ..ok("")
        };
        let verdict = evaluate(&ok("1"), &timed_out, &half());
        assert_eq!(
            verdict,
            Verdict::RuntimeError {
                which: Culprit::Candidate
            }
        );
    }

    #[test]
    fn test_unparsable_reference_reported_first() {
        let verdict = evaluate(&ok("n/a"), &ok("also bad"), &half());
        assert_eq!(
            verdict,
            Verdict::ParseError {
                which: Role::Reference,
                raw: "n/a".to_string()
            }
        );
    }

    #[test]
    fn test_unparsable_candidate_keeps_raw_text() {
        let verdict = evaluate(&ok("5"), &ok(""), &half());
        assert_eq!(
            verdict,
            Verdict::ParseError {
                which: Role::Candidate,
                raw: String::new()
            }
        );
    }

    #[test]
    fn test_verdict_codes() {
        assert_eq!(Verdict::Ok.code(), "OK");
        assert_eq!(
            Verdict::RuntimeError {
                which: Culprit::Both
            }
            .code(),
            "RE"
        );
    }

    #[test]
    fn test_culprit_roles() {
        assert!(Culprit::Both.includes(Role::Reference));
        assert!(Culprit::Both.includes(Role::Candidate));
        assert!(!Culprit::Candidate.includes(Role::Reference));
    }

    #[test]
    fn test_verdict_json_shape() {
        let json = serde_json::to_value(Verdict::RuntimeError {
            which: Culprit::Candidate,
        })
        .unwrap();
        assert_eq!(json["verdict"], "runtime_error");
        assert_eq!(json["which"], "candidate");
    }
}
