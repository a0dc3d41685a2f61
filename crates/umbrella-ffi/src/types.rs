//! Fixed-layout values returned across the C boundary.

use std::os::raw::c_int;

use umbrella_core::{ErrorCode, ScanSummary};

/// Outcome of a lifecycle call.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UmbrellaResult {
    pub success: bool,
    pub error_code: c_int,
}

impl UmbrellaResult {
    pub fn success() -> Self {
        Self {
            success: true,
            error_code: ErrorCode::Ok.as_i32(),
        }
    }

    pub fn failure(code: ErrorCode) -> Self {
        Self {
            success: false,
            error_code: code.as_i32(),
        }
    }
}

/// Aggregate scan counts. `threats_found == -1` means the scan could not be
/// performed; a clean scan reports 0.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanResult {
    pub threats_found: c_int,
    pub files_scanned: c_int,
    pub scan_time_ms: c_int,
}

impl ScanResult {
    pub const NOT_SCANNED: c_int = -1;

    pub fn not_scanned() -> Self {
        Self {
            threats_found: Self::NOT_SCANNED,
            files_scanned: 0,
            scan_time_ms: 0,
        }
    }
}

impl From<ScanSummary> for ScanResult {
    fn from(summary: ScanSummary) -> Self {
        Self {
            threats_found: saturate(summary.threats_found),
            files_scanned: saturate(summary.files_scanned),
            scan_time_ms: saturate(summary.scan_time_ms),
        }
    }
}

fn saturate(value: u64) -> c_int {
    c_int::try_from(value).unwrap_or(c_int::MAX)
}
