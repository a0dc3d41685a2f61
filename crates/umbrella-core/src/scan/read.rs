use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

/// Bytes read from a single file, bounded by the engine's scan limit.
#[derive(Debug, Clone)]
pub struct ContentSample {
    /// At most `max_bytes` bytes from the start of the file.
    pub bytes: Vec<u8>,

    /// True when the file had more data than was read.
    pub truncated: bool,

    /// Hex-encoded SHA-256 of `bytes`.
    pub sha256: String,
}

impl ContentSample {
    /// Content decoded as text. Malformed UTF-8 is replaced, never rejected.
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

/// Read up to `max_bytes` from `path`.
///
/// Oversized files are truncated, not rejected. Any open or read failure
/// (missing file, permission denied, directory) is returned as-is.
pub fn read_bounded(path: &Path, max_bytes: u64) -> io::Result<ContentSample> {
    let mut file = File::open(path)?;

    let hint = file
        .metadata()
        .map(|m| m.len().min(max_bytes))
        .unwrap_or(0);
    let mut bytes = Vec::with_capacity(usize::try_from(hint).unwrap_or(0));
    file.by_ref().take(max_bytes).read_to_end(&mut bytes)?;

    let truncated = if bytes.len() as u64 >= max_bytes {
        let mut probe = [0u8; 1];
        file.read(&mut probe)? > 0
    } else {
        false
    };

    let digest = Sha256::digest(&bytes);

    Ok(ContentSample {
        bytes,
        truncated,
        sha256: hex::encode(digest),
    })
}
