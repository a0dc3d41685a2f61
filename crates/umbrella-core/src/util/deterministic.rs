//! Deterministic ordering helpers.
//!
//! Reports must be identical for identical inputs regardless of signature
//! evaluation order or worker scheduling during directory walks.

use crate::report::model::FileScan;
use crate::rules::eval::TriggeredSignature;

/// Sort triggered signatures by id.
pub fn sort_triggered(matched: &mut [TriggeredSignature]) {
    matched.sort_by(|a, b| a.id.cmp(&b.id));
}

/// Sort per-file results by path.
///
/// Worker threads finish in arbitrary order; this restores a stable order.
pub fn sort_file_scans(files: &mut [FileScan]) {
    files.sort_by(|a, b| a.path.cmp(&b.path));
}
