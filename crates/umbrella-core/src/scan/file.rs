use std::path::Path;
use std::time::Instant;

use tracing::debug;

use crate::config::EngineConfig;
use crate::error::ScanError;
use crate::report::model::FileScan;
use crate::rules::catalog::Catalog;
use crate::rules::classify::classify;
use crate::rules::eval::evaluate;
use crate::scan::read::read_bounded;

/// Open, read (bounded) and match a single file against `catalog`.
///
/// Any open or read failure is reported as `ScanError::InputNotFound`.
pub fn scan_path(
    catalog: &Catalog,
    path: &Path,
    config: &EngineConfig,
) -> Result<FileScan, ScanError> {
    let started = Instant::now();

    let sample =
        read_bounded(path, config.max_scan_bytes).map_err(|e| ScanError::input(path, e))?;
    let outcome = evaluate(catalog, &sample.text());
    let verdict = classify(&outcome);
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    debug!(
        path = %path.display(),
        bytes = sample.bytes.len(),
        truncated = sample.truncated,
        threats = outcome.threat_count,
        %verdict,
        "scanned file"
    );

    Ok(FileScan {
        path: path.display().to_string(),
        bytes_scanned: sample.bytes.len() as u64,
        truncated: sample.truncated,
        sha256: sample.sha256,
        outcome,
        verdict,
        elapsed_ms,
    })
}
