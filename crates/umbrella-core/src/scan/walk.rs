//! Recursive directory scanning.
//!
//! Enumeration is sequential (`walkdir`, symlinks never followed); matching
//! runs on the engine's bounded worker pool and is folded into a single
//! tally, so no counter is shared between workers.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::ThreadPool;
use rayon::prelude::*;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::EngineConfig;
use crate::error::ScanError;
use crate::report::model::{DirectoryScan, FileScan};
use crate::rules::catalog::Catalog;
use crate::scan::file::scan_path;
use crate::util::deterministic::sort_file_scans;

/// Regular files under `root` plus the number of entries the walk could not read.
#[derive(Debug, Default)]
pub struct Discovery {
    pub files: Vec<PathBuf>,
    pub unreadable: u64,
}

/// Enumerate regular files under `root`.
///
/// Symbolic links are not followed and symlinked files are not visited, so
/// the walk always terminates inside the given subtree.
pub fn discover(root: &Path, config: &EngineConfig) -> Discovery {
    let mut discovery = Discovery::default();

    for entry in WalkDir::new(root).follow_links(false) {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && config.accepts_extension(entry.path()) {
                    discovery.files.push(entry.into_path());
                }
            }
            Err(err) => {
                debug!(error = %err, "skipping unreadable entry");
                discovery.unreadable += 1;
            }
        }
    }

    discovery
}

/// Per-file results of scanning a `Discovery`.
#[derive(Debug, Default)]
pub struct Tally {
    pub files: Vec<FileScan>,
    /// Discovered files that could not be opened or read.
    pub skipped: u64,
}

impl Tally {
    fn merge(mut self, mut other: Tally) -> Tally {
        self.files.append(&mut other.files);
        self.skipped += other.skipped;
        self
    }
}

/// Scan every discovered file on `pool`, sorted by path.
///
/// A file that fails to open or read is counted in `skipped` and the rest
/// are still scanned.
pub fn scan_discovered(
    catalog: &Catalog,
    pool: &ThreadPool,
    discovery: &Discovery,
    config: &EngineConfig,
) -> Tally {
    let mut tally = pool.install(|| {
        discovery
            .files
            .par_iter()
            .map(|path| match scan_path(catalog, path, config) {
                Ok(scan) => Tally {
                    files: vec![scan],
                    skipped: 0,
                },
                Err(err) => {
                    debug!(error = %err, "skipping file");
                    Tally {
                        files: Vec::new(),
                        skipped: 1,
                    }
                }
            })
            .reduce(Tally::default, Tally::merge)
    });
    sort_file_scans(&mut tally.files);
    tally
}

/// Scan every regular file under `root`.
///
/// Files that fail to open mid-walk are counted in `skipped` and never
/// abort the walk. Only a missing root (or a root that is not a directory)
/// fails the whole call.
pub fn scan_tree(
    catalog: &Catalog,
    pool: &ThreadPool,
    root: &Path,
    config: &EngineConfig,
) -> Result<DirectoryScan, ScanError> {
    let started = Instant::now();

    let meta = fs::metadata(root).map_err(|e| ScanError::input(root, e))?;
    if !meta.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let discovery = discover(root, config);
    let tally = scan_discovered(catalog, pool, &discovery, config);

    let scan = DirectoryScan {
        root: root.display().to_string(),
        files: tally.files,
        skipped: tally.skipped + discovery.unreadable,
        elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    };

    info!(
        root = %root.display(),
        files = scan.files.len(),
        skipped = scan.skipped,
        threats = scan.threats_found(),
        elapsed_ms = scan.elapsed_ms,
        "directory scan complete"
    );

    Ok(scan)
}
