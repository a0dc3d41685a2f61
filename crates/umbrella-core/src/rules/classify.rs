//! Per-file verdict derived from a scan outcome.
//!
//! Policy:
//!
//!   - Any High or Critical signature → MALICIOUS
//!   - Else any matched signature     → SUSPICIOUS
//!   - Else                           → CLEAN
//!
//! The verdict depends only on the set of matched signatures, never on
//! match order or occurrence counts.

use serde::{Deserialize, Serialize};

use crate::rules::catalog::Severity;
use crate::rules::eval::ScanOutcome;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Clean,
    Suspicious,
    Malicious,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Verdict::Clean => "CLEAN",
            Verdict::Suspicious => "SUSPICIOUS",
            Verdict::Malicious => "MALICIOUS",
        };
        f.write_str(s)
    }
}

pub fn classify(outcome: &ScanOutcome) -> Verdict {
    match outcome.highest_severity() {
        None => Verdict::Clean,
        Some(Severity::High | Severity::Critical) => Verdict::Malicious,
        Some(Severity::Low | Severity::Medium) => Verdict::Suspicious,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::catalog::{Category, SignatureId};
    use crate::rules::eval::TriggeredSignature;

    fn outcome(severities: &[Severity]) -> ScanOutcome {
        let matched: Vec<TriggeredSignature> = severities
            .iter()
            .enumerate()
            .map(|(i, sev)| TriggeredSignature {
                id: SignatureId(format!("T-{i:02}")),
                title: "t".into(),
                category: Category::CodeExecution,
                severity: *sev,
                lines: Vec::new(),
            })
            .collect();
        ScanOutcome {
            threat_count: matched.len() as u32,
            matched,
        }
    }

    #[test]
    fn no_matches_is_clean() {
        assert_eq!(classify(&ScanOutcome::default()), Verdict::Clean);
    }

    #[test]
    fn low_and_medium_are_suspicious() {
        assert_eq!(classify(&outcome(&[Severity::Low])), Verdict::Suspicious);
        assert_eq!(
            classify(&outcome(&[Severity::Low, Severity::Medium])),
            Verdict::Suspicious
        );
    }

    #[test]
    fn any_high_or_critical_is_malicious() {
        assert_eq!(
            classify(&outcome(&[Severity::Medium, Severity::High])),
            Verdict::Malicious
        );
        assert_eq!(classify(&outcome(&[Severity::Critical])), Verdict::Malicious);
    }

    #[test]
    fn verdict_is_order_independent() {
        let a = outcome(&[Severity::Low, Severity::Critical, Severity::Medium]);
        let b = outcome(&[Severity::Critical, Severity::Medium, Severity::Low]);
        assert_eq!(classify(&a), classify(&b));
    }

    #[test]
    fn verdict_serializes_screaming_case() {
        assert_eq!(
            serde_json::to_string(&Verdict::Malicious).unwrap(),
            "\"MALICIOUS\""
        );
        assert_eq!(Verdict::Suspicious.to_string(), "SUSPICIOUS");
    }
}
