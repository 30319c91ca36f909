//! Streaming file copy used by the built-in mirror.
//!
//! - Writes to a newly created destination file (never clobbers).
//! - Buffered I/O with large (1 MiB) buffers; model files are big.
//! - The destination is fsynced before returning so a later rename publishes
//!   complete data.
//!
//! The source is read once from start to EOF; if it grows concurrently the
//! extra bytes are not included.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

pub(crate) const BUF_SIZE: usize = 1024 * 1024;

/// Copy `src` -> `dst` and return the number of bytes written.
/// `dst` is created with `create_new(true)`.
pub(crate) fn copy_streaming(src: &Path, dst: &Path) -> io::Result<u64> {
    let src_f = File::open(src)?;

    let mut opts = OpenOptions::new();
    opts.write(true).create_new(true);
    let dst_f = opts.open(dst)?;

    let mut reader = BufReader::with_capacity(BUF_SIZE, src_f);
    let mut writer = BufWriter::with_capacity(BUF_SIZE, dst_f);
    let bytes = io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;

    Ok(bytes)
}
