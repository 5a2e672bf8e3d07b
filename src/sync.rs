//! Promotion of module artifacts into the shared library directory.
//!
//! A freshly built library is copied only when its bytes differ from the shared
//! copy. Timestamps are never consulted: a rebuild that regenerates identical
//! output is reported as unchanged and leaves the shared file untouched.

use crate::error::{ForgeError, Result};
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::Path;
use tempfile::NamedTempFile;

const CHUNK: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// The destination did not exist.
    Created,
    /// The destination existed with different content and was replaced.
    Updated,
    Unchanged,
}

impl SyncStatus {
    pub fn wrote(self) -> bool {
        self != SyncStatus::Unchanged
    }
}

/// Promotes `source` to `dest` if the content differs.
pub fn sync_artifact(source: &Path, dest: &Path) -> Result<SyncStatus> {
    if !dest.exists() {
        install_file(source, dest)?;
        return Ok(SyncStatus::Created);
    }

    if files_identical(source, dest)? {
        tracing::debug!("{} unchanged", dest.display());
        return Ok(SyncStatus::Unchanged);
    }

    install_file(source, dest)?;
    Ok(SyncStatus::Updated)
}

/// Byte-exact comparison. Sizes are checked first so differing files of
/// different lengths are never read.
pub fn files_identical(a: &Path, b: &Path) -> Result<bool> {
    let len_a = fs::metadata(a).map_err(|e| ForgeError::io(a, e))?.len();
    let len_b = fs::metadata(b).map_err(|e| ForgeError::io(b, e))?.len();
    if len_a != len_b {
        return Ok(false);
    }

    let mut reader_a = BufReader::new(File::open(a).map_err(|e| ForgeError::io(a, e))?);
    let mut reader_b = BufReader::new(File::open(b).map_err(|e| ForgeError::io(b, e))?);
    let mut buf_a = [0u8; CHUNK];
    let mut buf_b = [0u8; CHUNK];

    loop {
        let n = read_full(&mut reader_a, &mut buf_a).map_err(|e| ForgeError::io(a, e))?;
        let m = read_full(&mut reader_b, &mut buf_b).map_err(|e| ForgeError::io(b, e))?;
        if n != m || buf_a[..n] != buf_b[..m] {
            return Ok(false);
        }
        if n == 0 {
            return Ok(true);
        }
    }
}

// Fills `buf` unless EOF comes first, so both readers advance in lockstep.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Copies `source` over `dest` all-or-nothing: the bytes go to a temporary file in
/// the destination directory, which is then renamed into place. The destination
/// directory is created if needed.
pub fn install_file(source: &Path, dest: &Path) -> Result<()> {
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|e| ForgeError::io(dir, e))?;

    let mut input = File::open(source).map_err(|e| ForgeError::io(source, e))?;
    let mut staged = NamedTempFile::new_in(dir).map_err(|e| ForgeError::io(dir, e))?;
    io::copy(&mut input, staged.as_file_mut()).map_err(|e| ForgeError::io(dest, e))?;
    staged
        .as_file()
        .sync_all()
        .map_err(|e| ForgeError::io(dest, e))?;
    staged
        .persist(dest)
        .map_err(|e| ForgeError::io(dest, e.error))?;
    Ok(())
}
