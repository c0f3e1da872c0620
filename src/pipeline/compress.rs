//! Deterministic gzip compression.
//!
//! The gzip header carries no file name and a zero mtime, and the level is
//! fixed, so identical input bytes always produce identical output.

use std::io::Write;

use flate2::{Compression, GzBuilder};

use super::TransformError;
use super::headers::{StorageHeaders, names};

/// Fixed compression level.
pub const LEVEL: u32 = 9;

/// Gzip `content` into a self-contained stream.
pub fn gzip_bytes(content: &[u8]) -> Result<Vec<u8>, TransformError> {
    let mut encoder = GzBuilder::new()
        .mtime(0)
        .write(Vec::with_capacity(content.len() / 2), Compression::new(LEVEL));
    encoder.write_all(content).map_err(TransformError::Compress)?;
    encoder.finish().map_err(TransformError::Compress)
}

/// Gzip `content` and mark the headers with `content-encoding: gzip`.
///
/// Headers are only touched when compression succeeds.
pub fn gzip(
    mut headers: StorageHeaders,
    content: &[u8],
) -> Result<(StorageHeaders, Vec<u8>), TransformError> {
    let compressed = gzip_bytes(content)?;
    headers.insert(names::CONTENT_ENCODING, "gzip");
    Ok((headers, compressed))
}
