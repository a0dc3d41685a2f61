use serde::{Deserialize, Serialize};

use crate::rules::classify::Verdict;
use crate::rules::eval::ScanOutcome;

/// Aggregate counts returned by every scan.
///
/// This is the only shape that crosses the C boundary: signature ids and
/// matcher details stay on the Rust side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub threats_found: u64,
    pub files_scanned: u64,
    pub scan_time_ms: u64,
}

/// Result of scanning one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileScan {
    pub path: String,
    pub bytes_scanned: u64,
    pub truncated: bool,
    pub sha256: String,
    pub outcome: ScanOutcome,
    pub verdict: Verdict,
    /// Wall-clock time of open + match, rounded down.
    pub elapsed_ms: u64,
}

impl FileScan {
    pub fn summary(&self) -> ScanSummary {
        ScanSummary {
            threats_found: u64::from(self.outcome.threat_count),
            files_scanned: 1,
            scan_time_ms: self.elapsed_ms,
        }
    }
}

/// Result of a recursive directory walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryScan {
    pub root: String,
    /// Successfully scanned files, sorted by path.
    pub files: Vec<FileScan>,
    /// Entries that could not be opened or read during the walk.
    pub skipped: u64,
    /// Wall-clock span of the whole walk, not the sum of per-file times.
    pub elapsed_ms: u64,
}

impl DirectoryScan {
    pub fn threats_found(&self) -> u64 {
        self.files
            .iter()
            .map(|f| u64::from(f.outcome.threat_count))
            .sum()
    }

    pub fn flagged(&self) -> impl Iterator<Item = &FileScan> {
        self.files.iter().filter(|f| !f.outcome.is_clean())
    }

    pub fn summary(&self) -> ScanSummary {
        ScanSummary {
            threats_found: self.threats_found(),
            files_scanned: self.files.len() as u64,
            scan_time_ms: self.elapsed_ms,
        }
    }
}

/// Either kind of scan, as emitted by report renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanReport {
    File(FileScan),
    Directory(DirectoryScan),
}

impl ScanReport {
    pub fn summary(&self) -> ScanSummary {
        match self {
            ScanReport::File(f) => f.summary(),
            ScanReport::Directory(d) => d.summary(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::catalog::{Category, Severity, SignatureId};
    use crate::rules::eval::TriggeredSignature;

    fn file(path: &str, threats: u32) -> FileScan {
        let matched = (0..threats)
            .map(|i| TriggeredSignature {
                id: SignatureId(format!("T-{i}")),
                title: "t".into(),
                category: Category::CodeExecution,
                severity: Severity::High,
                lines: vec![1],
            })
            .collect();
        FileScan {
            path: path.into(),
            bytes_scanned: 10,
            truncated: false,
            sha256: "abcd".into(),
            outcome: ScanOutcome {
                threat_count: threats,
                matched,
            },
            verdict: if threats == 0 {
                Verdict::Clean
            } else {
                Verdict::Malicious
            },
            elapsed_ms: 3,
        }
    }

    #[test]
    fn file_summary_counts_one_file() {
        let s = file("a.py", 2).summary();
        assert_eq!(
            s,
            ScanSummary {
                threats_found: 2,
                files_scanned: 1,
                scan_time_ms: 3
            }
        );
    }

    #[test]
    fn directory_summary_sums_threats() {
        let scan = DirectoryScan {
            root: "root".into(),
            files: vec![file("a.ma", 0), file("b.py", 2), file("c.mel", 3)],
            skipped: 1,
            elapsed_ms: 40,
        };
        let s = scan.summary();
        assert_eq!(s.threats_found, 5);
        assert_eq!(s.files_scanned, 3);
        assert_eq!(s.scan_time_ms, 40);
        assert_eq!(scan.flagged().count(), 2);
    }

    #[test]
    fn report_is_tagged_by_kind() {
        let report = ScanReport::File(file("a.py", 1));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["kind"], "file");
        assert_eq!(json["verdict"], "MALICIOUS");
        assert_eq!(json["outcome"]["threat_count"], 1);
    }
}
