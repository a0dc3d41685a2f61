//! Ownership transfer of strings handed to C callers.
//!
//! Every pointer returned to C is recorded in a registry of live
//! allocations. Releasing frees only registered pointers and unregisters
//! them, which makes release of null, foreign or already-released pointers
//! a no-op instead of a double free.

use std::collections::HashSet;
use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

static LIVE: LazyLock<Mutex<HashSet<usize>>> = LazyLock::new(|| Mutex::new(HashSet::new()));

fn live() -> MutexGuard<'static, HashSet<usize>> {
    LIVE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Allocate a NUL-terminated copy of `text` owned by the caller until
/// `release`. Returns null if `text` contains an interior NUL.
pub fn into_raw(text: &str) -> *mut c_char {
    match CString::new(text) {
        Ok(owned) => {
            let raw = owned.into_raw();
            live().insert(raw as usize);
            raw
        }
        Err(_) => ptr::null_mut(),
    }
}

/// Free a pointer previously returned by `into_raw`.
///
/// Returns whether anything was freed.
pub fn release(raw: *mut c_char) -> bool {
    if raw.is_null() || !live().remove(&(raw as usize)) {
        return false;
    }
    // SAFETY: the pointer came from `CString::into_raw` in `into_raw` and
    // was still registered, so it has not been freed yet.
    drop(unsafe { CString::from_raw(raw) });
    true
}

/// Number of strings currently owned by callers.
pub fn outstanding() -> usize {
    live().len()
}
