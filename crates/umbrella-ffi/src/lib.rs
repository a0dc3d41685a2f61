//! C boundary for the umbrella scanning engine.
//!
//! One process-wide [`Engine`] sits behind these functions. Every entry point
//! catches panics, records an [`ErrorCode`] readable through
//! [`umbrella_last_error_code`] on the calling thread, and never unwinds into
//! the host. The matching declarations live in `include/umbrella.h`.

pub mod last_error;
pub mod logging;
pub mod strings;
pub mod types;

use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::sync::LazyLock;

use tracing::{error, info, warn};
use umbrella_core::{ConfigError, Engine, EngineConfig, ErrorCode, ScanError, ScanSummary};

pub use types::{ScanResult, UmbrellaResult};

/// Environment variable naming a TOML configuration file read at init.
pub const CONFIG_ENV: &str = "UMBRELLA_CONFIG";

static ENGINE: LazyLock<Engine> = LazyLock::new(Engine::default);

fn guarded<T>(fallback: T, call: impl FnOnce() -> T) -> T {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(value) => value,
        Err(_) => {
            last_error::set(ErrorCode::Panic);
            error!("panic caught at the C boundary");
            fallback
        }
    }
}

fn config_from_env() -> Result<EngineConfig, ConfigError> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => EngineConfig::load(path),
        None => Ok(EngineConfig::default()),
    }
}

/// Borrow a caller-owned path string.
///
/// # Safety
///
/// `raw` must be null or point to a NUL-terminated string that stays valid
/// for the returned lifetime.
unsafe fn path_arg<'a>(raw: *const c_char) -> Result<&'a str, ErrorCode> {
    if raw.is_null() {
        return Err(ErrorCode::InvalidPath);
    }
    // SAFETY: non-null and NUL-terminated per the caller contract.
    let text = unsafe { CStr::from_ptr(raw) };
    text.to_str().map_err(|_| ErrorCode::InvalidPath)
}

/// # Safety
///
/// Same contract on `raw` as [`path_arg`].
unsafe fn scan_with(
    op: &'static str,
    raw: *const c_char,
    run: impl FnOnce(&str) -> Result<ScanSummary, ScanError>,
) -> ScanResult {
    // SAFETY: forwarded caller contract.
    let path = match unsafe { path_arg(raw) } {
        Ok(path) => path,
        Err(code) => {
            warn!(op, code = code.as_i32(), "path is null or not UTF-8");
            last_error::set(code);
            return ScanResult::not_scanned();
        }
    };

    match run(path) {
        Ok(summary) => {
            last_error::set(ErrorCode::Ok);
            summary.into()
        }
        Err(err) => {
            let code = err.error_code();
            warn!(op, code = code.as_i32(), "{err}");
            last_error::set(code);
            ScanResult::not_scanned()
        }
    }
}

/// Initialize the engine. Safe to call repeatedly.
///
/// Reads `UMBRELLA_CONFIG` when set, unless the engine is already ready. On
/// failure the engine stays unusable and `error_code` says why.
#[unsafe(no_mangle)]
pub extern "C" fn umbrella_init() -> UmbrellaResult {
    guarded(UmbrellaResult::failure(ErrorCode::Panic), || {
        logging::install();

        match ENGINE.init_from(config_from_env) {
            Ok(()) => {
                last_error::set(ErrorCode::Ok);
                UmbrellaResult::success()
            }
            Err(err) => {
                error!("init failed: {err}");
                last_error::set(err.error_code());
                UmbrellaResult::failure(err.error_code())
            }
        }
    })
}

/// Scan one file. `threats_found` is -1 when the scan could not run.
///
/// # Safety
///
/// `file_path` must be null or a valid NUL-terminated string for the
/// duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn umbrella_scan_file(file_path: *const c_char) -> ScanResult {
    guarded(ScanResult::not_scanned(), || {
        // SAFETY: forwarded caller contract.
        unsafe {
            scan_with("scan_file", file_path, |path| {
                ENGINE.scan_file(path).map(|scan| scan.summary())
            })
        }
    })
}

/// Recursively scan a directory. `threats_found` is -1 when the scan could
/// not run.
///
/// # Safety
///
/// `dir_path` must be null or a valid NUL-terminated string for the
/// duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn umbrella_scan_directory(dir_path: *const c_char) -> ScanResult {
    guarded(ScanResult::not_scanned(), || {
        // SAFETY: forwarded caller contract.
        unsafe {
            scan_with("scan_directory", dir_path, |path| {
                ENGINE.scan_directory(path).map(|scan| scan.summary())
            })
        }
    })
}

/// Engine and signature catalog version. Release with
/// [`umbrella_free_string`]. Works in any lifecycle state.
#[unsafe(no_mangle)]
pub extern "C" fn umbrella_get_version() -> *mut c_char {
    guarded(ptr::null_mut(), || {
        strings::into_raw(&umbrella_core::version_string())
    })
}

/// Release a string returned by this library.
///
/// Null, foreign and already-released pointers are ignored.
#[unsafe(no_mangle)]
pub extern "C" fn umbrella_free_string(ptr: *mut c_char) {
    guarded((), || {
        if !ptr.is_null() && !strings::release(ptr) {
            warn!("free_string called with a pointer this library does not own");
        }
    })
}

/// Release engine resources. Safe to call repeatedly and before init.
#[unsafe(no_mangle)]
pub extern "C" fn umbrella_cleanup() -> UmbrellaResult {
    guarded(UmbrellaResult::failure(ErrorCode::Panic), || {
        match ENGINE.cleanup() {
            Ok(()) => {
                info!("cleanup complete");
                last_error::set(ErrorCode::Ok);
                UmbrellaResult::success()
            }
            Err(err) => {
                error!("cleanup: {err}");
                last_error::set(err.error_code());
                UmbrellaResult::failure(err.error_code())
            }
        }
    })
}

/// Code recorded by the most recent call on the calling thread.
#[unsafe(no_mangle)]
pub extern "C" fn umbrella_last_error_code() -> c_int {
    last_error::get().as_i32()
}
