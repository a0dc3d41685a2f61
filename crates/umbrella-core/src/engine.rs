//! Engine lifecycle: `Uninitialized → Ready → Terminated`, re-init allowed.
//!
//! State lives behind an `RwLock`. Scans hold the read guard for their whole
//! duration, so several scans may run at once while `init` and `cleanup`
//! (write guard) wait for them to drain and are serialized with each other.

use std::fmt;
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{ConfigError, EngineError, ScanError};
use crate::report::model::{DirectoryScan, FileScan};
use crate::rules::builtin::BUILTIN_SIGNATURES;
use crate::rules::catalog::{Catalog, SignatureSpec};
use crate::scan::{file, walk};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    Uninitialized,
    Ready,
    Terminated,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Ready => "ready",
            LifecycleState::Terminated => "terminated",
        };
        f.write_str(s)
    }
}

/// Resources that only exist while the engine is ready.
struct Resources {
    catalog: Catalog,
    pool: ThreadPool,
    config: EngineConfig,
}

enum State {
    Uninitialized,
    Ready(Resources),
    Terminated,
}

impl State {
    fn lifecycle(&self) -> LifecycleState {
        match self {
            State::Uninitialized => LifecycleState::Uninitialized,
            State::Ready(_) => LifecycleState::Ready,
            State::Terminated => LifecycleState::Terminated,
        }
    }
}

/// Owned engine context. Construct once and pass it to every call.
pub struct Engine {
    config: EngineConfig,
    signatures: &'static [SignatureSpec],
    state: RwLock<State>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    /// Engine over the builtin signature table.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_signatures(config, BUILTIN_SIGNATURES)
    }

    /// Engine over a custom signature table, compiled at `init`.
    pub fn with_signatures(config: EngineConfig, signatures: &'static [SignatureSpec]) -> Self {
        Self {
            config,
            signatures,
            state: RwLock::new(State::Uninitialized),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.read_state().lifecycle()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == LifecycleState::Ready
    }

    /// Compile the catalog and start the worker pool with the configuration
    /// given at construction.
    pub fn init(&self) -> Result<(), EngineError> {
        self.init_with(self.config.clone())
    }

    /// Like `init`, with an explicit configuration.
    pub fn init_with(&self, config: EngineConfig) -> Result<(), EngineError> {
        self.init_from(|| Ok(config))
    }

    /// Like `init`, with the configuration produced by `load`.
    ///
    /// A no-op while already ready: `load` is not called and the running
    /// configuration is kept. On failure the engine is left `Uninitialized`
    /// so `init` can be retried.
    pub fn init_from<F>(&self, load: F) -> Result<(), EngineError>
    where
        F: FnOnce() -> Result<EngineConfig, ConfigError>,
    {
        let mut state = self.write_state_recovering();
        let previous = state.lifecycle();
        if previous == LifecycleState::Ready {
            debug!("init while ready; nothing to do");
            return Ok(());
        }

        match build_resources(self.signatures, load) {
            Ok(resources) => {
                info!(
                    from = %previous,
                    signatures = resources.catalog.len(),
                    workers = resources.pool.current_num_threads(),
                    max_scan_bytes = resources.config.max_scan_bytes,
                    "engine ready"
                );
                *state = State::Ready(resources);
                Ok(())
            }
            Err(err) => {
                *state = State::Uninitialized;
                Err(err)
            }
        }
    }

    /// Release the catalog and worker pool.
    ///
    /// Waits for in-flight scans. A no-op success when not ready. If the
    /// state was poisoned by a panic the engine is still forced to
    /// `Terminated` and `StatePoisoned` is returned.
    pub fn cleanup(&self) -> Result<(), EngineError> {
        let (mut state, poisoned) = match self.state.write() {
            Ok(guard) => (guard, false),
            Err(poison) => (poison.into_inner(), true),
        };

        if poisoned {
            *state = State::Terminated;
            self.state.clear_poison();
            warn!("engine state was poisoned; forced to terminated");
            return Err(EngineError::StatePoisoned);
        }

        let previous = state.lifecycle();
        if previous == LifecycleState::Ready {
            *state = State::Terminated;
            info!("engine terminated");
        } else {
            debug!(state = %previous, "cleanup while not ready; nothing to do");
        }
        Ok(())
    }

    /// Scan a single file.
    pub fn scan_file(&self, path: impl AsRef<Path>) -> Result<FileScan, ScanError> {
        let state = self.read_state();
        let resources = ready(&state)?;
        file::scan_path(&resources.catalog, path.as_ref(), &resources.config)
    }

    /// Recursively scan every regular file under a directory.
    pub fn scan_directory(&self, path: impl AsRef<Path>) -> Result<DirectoryScan, ScanError> {
        let state = self.read_state();
        let resources = ready(&state)?;
        walk::scan_tree(
            &resources.catalog,
            &resources.pool,
            path.as_ref(),
            &resources.config,
        )
    }

    /// Number of compiled signatures, if ready.
    pub fn signature_count(&self) -> Option<usize> {
        match &*self.read_state() {
            State::Ready(r) => Some(r.catalog.len()),
            _ => None,
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state_recovering(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|poison| {
            self.state.clear_poison();
            poison.into_inner()
        })
    }
}

fn build_resources<F>(signatures: &[SignatureSpec], load: F) -> Result<Resources, EngineError>
where
    F: FnOnce() -> Result<EngineConfig, ConfigError>,
{
    let config = load()?;
    let catalog = Catalog::compile(signatures)?;
    let pool = ThreadPoolBuilder::new()
        .num_threads(config.effective_workers())
        .thread_name(|i| format!("umbrella-scan-{i}"))
        .build()?;
    Ok(Resources {
        catalog,
        pool,
        config,
    })
}

fn ready(state: &State) -> Result<&Resources, ScanError> {
    match state {
        State::Ready(resources) => Ok(resources),
        other => Err(ScanError::NotReady(other.lifecycle())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::rules::catalog::{Category, MatcherSpec, Severity};
    use std::fs;
    use std::sync::Arc;
    use tempfile::tempdir;

    static BROKEN: &[SignatureSpec] = &[SignatureSpec {
        id: "T-BROKEN",
        title: "broken",
        category: Category::CodeExecution,
        severity: Severity::High,
        matcher: MatcherSpec::Pattern("(eval"),
    }];

    #[test]
    fn starts_uninitialized_and_rejects_scans() {
        let engine = Engine::default();
        assert_eq!(engine.state(), LifecycleState::Uninitialized);

        let err = engine.scan_file("anything.ma").unwrap_err();
        assert!(matches!(err, ScanError::NotReady(LifecycleState::Uninitialized)));
        assert_eq!(err.error_code(), ErrorCode::NotReady);
    }

    #[test]
    fn init_is_idempotent() {
        let engine = Engine::default();
        engine.init().unwrap();
        engine.init().unwrap();
        assert!(engine.is_ready());
        assert_eq!(engine.signature_count(), Some(BUILTIN_SIGNATURES.len()));
    }

    #[test]
    fn cleanup_twice_succeeds() {
        let engine = Engine::default();
        engine.init().unwrap();
        engine.cleanup().unwrap();
        engine.cleanup().unwrap();
        assert_eq!(engine.state(), LifecycleState::Terminated);
        assert_eq!(engine.signature_count(), None);
    }

    #[test]
    fn cleanup_before_init_is_noop() {
        let engine = Engine::default();
        engine.cleanup().unwrap();
        assert_eq!(engine.state(), LifecycleState::Uninitialized);
    }

    #[test]
    fn scans_fail_after_cleanup_and_work_after_reinit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.py");
        fs::write(&path, "eval('x')\n").unwrap();

        let engine = Engine::default();
        engine.init().unwrap();
        engine.cleanup().unwrap();
        assert!(matches!(
            engine.scan_file(&path),
            Err(ScanError::NotReady(LifecycleState::Terminated))
        ));

        engine.init().unwrap();
        assert_eq!(engine.scan_file(&path).unwrap().outcome.threat_count, 1);
    }

    #[test]
    fn broken_catalog_fails_init_and_stays_uninitialized() {
        let engine = Engine::with_signatures(EngineConfig::default(), BROKEN);
        let err = engine.init().unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::CatalogBuild);
        assert_eq!(engine.state(), LifecycleState::Uninitialized);
        assert!(engine.init().is_err());
    }

    #[test]
    fn init_while_ready_does_not_load_config() {
        let engine = Engine::default();
        engine.init().unwrap();

        let mut loaded = false;
        engine
            .init_from(|| {
                loaded = true;
                Err(ConfigError::Invalid("unreadable".into()))
            })
            .unwrap();
        assert!(!loaded);
        assert!(engine.is_ready());
    }

    #[test]
    fn config_failure_fails_init() {
        let engine = Engine::default();
        let err = engine
            .init_from(|| Err(ConfigError::Invalid("bad".into())))
            .unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::Config);
        assert_eq!(engine.state(), LifecycleState::Uninitialized);
    }

    #[test]
    fn failed_reinit_after_cleanup_returns_to_uninitialized() {
        let engine = Engine::default();
        engine.init().unwrap();
        engine.cleanup().unwrap();
        assert_eq!(engine.state(), LifecycleState::Terminated);

        assert!(engine
            .init_from(|| Err(ConfigError::Invalid("bad".into())))
            .is_err());
        assert_eq!(engine.state(), LifecycleState::Uninitialized);
        assert!(matches!(
            engine.scan_file("a.ma"),
            Err(ScanError::NotReady(LifecycleState::Uninitialized))
        ));

        engine.init().unwrap();
        assert!(engine.is_ready());
    }

    #[test]
    fn init_with_overrides_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.py");
        fs::write(&path, format!("{}\neval('x')\n", "#".repeat(32))).unwrap();

        let engine = Engine::default();
        engine
            .init_with(EngineConfig {
                max_scan_bytes: 16,
                worker_threads: 1,
                ..EngineConfig::default()
            })
            .unwrap();
        let scan = engine.scan_file(&path).unwrap();
        assert!(scan.truncated);
        assert_eq!(scan.outcome.threat_count, 0);
    }

    #[test]
    fn poisoned_state_cleanup_reports_failure_but_terminates() {
        let engine = Arc::new(Engine::default());
        engine.init().unwrap();

        let clone = Arc::clone(&engine);
        let _ = std::thread::spawn(move || {
            let _guard = clone.state.write().unwrap();
            panic!("poison the engine state");
        })
        .join();

        let err = engine.cleanup().unwrap_err();
        assert!(matches!(err, EngineError::StatePoisoned));
        assert_eq!(err.error_code(), ErrorCode::StatePoisoned);
        assert_eq!(engine.state(), LifecycleState::Terminated);

        // Poison is cleared; the engine is usable again.
        engine.cleanup().unwrap();
        engine.init().unwrap();
        assert!(engine.is_ready());
    }

    #[test]
    fn concurrent_scans_and_cleanup_do_not_tear_state() {
        let dir = tempdir().unwrap();
        for i in 0..16 {
            fs::write(dir.path().join(format!("f{i}.py")), "eval('x')\n").unwrap();
        }

        let engine = Arc::new(Engine::default());
        engine.init().unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                let root = dir.path().to_path_buf();
                std::thread::spawn(move || engine.scan_directory(&root))
            })
            .collect();
        engine.cleanup().unwrap();

        for handle in handles {
            match handle.join().unwrap() {
                Ok(scan) => assert_eq!(scan.threats_found(), 16),
                Err(err) => assert!(matches!(err, ScanError::NotReady(_))),
            }
        }
        assert_eq!(engine.state(), LifecycleState::Terminated);
    }
}
