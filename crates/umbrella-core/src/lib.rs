pub mod config;
pub mod engine;
pub mod error;
pub mod report;
pub mod rules;
pub mod scan;
pub mod util;

pub use config::EngineConfig;
pub use engine::{Engine, LifecycleState};
pub use error::{CatalogError, ConfigError, EngineError, ErrorCode, ScanError};
pub use report::model::{DirectoryScan, FileScan, ScanReport, ScanSummary};

pub const TOOL_NAME: &str = "umbrella";

/// Engine version reported by `version_string` and across the C boundary.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version of the builtin signature table.
/// Bump whenever a builtin signature is added, removed or changes meaning.
pub const CATALOG_VERSION: &str = "0.1.0";

/// Human-readable version banner. Static metadata, valid in any engine state.
pub fn version_string() -> String {
    format!("{TOOL_NAME} {ENGINE_VERSION} (signatures {CATALOG_VERSION})")
}
