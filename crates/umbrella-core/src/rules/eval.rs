use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::rules::catalog::{Catalog, Category, Severity, SignatureId};

/// A catalog entry that matched the scanned content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggeredSignature {
    pub id: SignatureId,
    pub title: String,
    pub category: Category,
    pub severity: Severity,
    /// 1-based lines holding a match, ascending and deduplicated.
    pub lines: Vec<usize>,
}

/// Per-file matching result.
///
/// `threat_count` is the number of distinct signatures that matched, not
/// the number of occurrences, so rescanning unchanged content against an
/// unchanged catalog always yields the same count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub threat_count: u32,
    pub matched: Vec<TriggeredSignature>,
}

impl ScanOutcome {
    pub fn is_clean(&self) -> bool {
        self.threat_count == 0
    }

    pub fn matched_ids(&self) -> BTreeSet<SignatureId> {
        self.matched.iter().map(|t| t.id.clone()).collect()
    }

    pub fn highest_severity(&self) -> Option<Severity> {
        self.matched.iter().map(|t| t.severity).max()
    }
}

/// Evaluate every signature in `catalog` against `text`.
///
/// Pure function: no IO, no state. Each signature contributes at most once
/// however many lines it matches on.
pub fn evaluate(catalog: &Catalog, text: &str) -> ScanOutcome {
    let newlines: Vec<usize> = text.match_indices('\n').map(|(i, _)| i).collect();

    let mut matched: Vec<TriggeredSignature> = catalog
        .iter()
        .filter_map(|sig| {
            let offsets = sig.match_offsets(text);
            if offsets.is_empty() {
                return None;
            }
            let mut lines: Vec<usize> = offsets
                .into_iter()
                .map(|offset| line_of(&newlines, offset))
                .collect();
            lines.dedup();
            Some(TriggeredSignature {
                id: sig.id().clone(),
                title: sig.title().to_string(),
                category: sig.category(),
                severity: sig.severity(),
                lines,
            })
        })
        .collect();

    crate::util::deterministic::sort_triggered(&mut matched);

    ScanOutcome {
        threat_count: u32::try_from(matched.len()).unwrap_or(u32::MAX),
        matched,
    }
}

fn line_of(newlines: &[usize], offset: usize) -> usize {
    newlines.partition_point(|&nl| nl < offset) + 1
}
