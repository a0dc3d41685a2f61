use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Upper bound on bytes read from any single file before matching.
pub const DEFAULT_MAX_SCAN_BYTES: u64 = 100 * 1024 * 1024;

/// Worker count used when `worker_threads` is 0 is capped at this value.
pub const MAX_AUTO_WORKERS: usize = 8;

/// Engine tuning knobs. Missing fields in a config file take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Files larger than this are truncated before matching, never rejected.
    pub max_scan_bytes: u64,

    /// Size of the directory-walk worker pool. 0 picks the available
    /// parallelism, capped at `MAX_AUTO_WORKERS`.
    pub worker_threads: usize,

    /// Extensions (without the dot, case-insensitive) considered during
    /// directory walks. Empty means every regular file.
    pub include_extensions: Vec<String>,

    /// Extensions skipped during directory walks. Wins over
    /// `include_extensions` when both name the same extension.
    pub exclude_extensions: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_scan_bytes: DEFAULT_MAX_SCAN_BYTES,
            worker_threads: 0,
            include_extensions: Vec::new(),
            exclude_extensions: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let mut config: EngineConfig = toml_edit::de::from_str(text)?;
        config.validate()?;
        config.normalize();
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_scan_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_scan_bytes must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Number of threads the scan pool is built with.
    pub fn effective_workers(&self) -> usize {
        if self.worker_threads > 0 {
            return self.worker_threads;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(MAX_AUTO_WORKERS)
    }

    /// Whether a file found during a directory walk should be scanned.
    pub fn accepts_extension(&self, path: &Path) -> bool {
        let ext = path.extension().and_then(|ext| ext.to_str());
        let listed = |list: &[String]| {
            ext.is_some_and(|ext| list.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        };

        if listed(&self.exclude_extensions) {
            return false;
        }
        self.include_extensions.is_empty() || listed(&self.include_extensions)
    }

    fn normalize(&mut self) {
        normalize_extensions(&mut self.include_extensions);
        normalize_extensions(&mut self.exclude_extensions);
    }
}

fn normalize_extensions(list: &mut Vec<String>) {
    for ext in list.iter_mut() {
        *ext = ext.trim_start_matches('.').to_ascii_lowercase();
    }
    list.sort();
    list.dedup();
}
