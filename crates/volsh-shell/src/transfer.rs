//! Chunked transfer between the volume service and standard streams.
//!
//! Both directions reuse one fixed-size buffer and retain nothing across
//! chunks. Loops terminate cleanly only on their terminator code (end of
//! file) or on stream exhaustion; every other failure aborts the transfer
//! immediately, with no retry.

use std::io::{self, ErrorKind, Read, Write};

use thiserror::Error;

use volsh_volume::{FileHandle, VolumeError, VolumeService};

/// Size of the reusable transfer buffer.
pub const CHUNK_SIZE: usize = 4096;

/// Failure of a chunked transfer.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The volume service rejected a chunk.
    #[error(transparent)]
    Volume(#[from] VolumeError),
    /// The local stream failed.
    #[error("stream access failed: {0}")]
    Io(#[from] io::Error),
    /// The volume accepted fewer bytes than requested.
    #[error("short write: {accepted} of {requested} bytes accepted")]
    ShortWrite {
        /// Bytes handed to the volume service.
        requested: usize,
        /// Bytes it reported written.
        accepted: usize,
    },
}

/// Streams an open file to `out` until the end-of-file code.
///
/// Returns the number of bytes transferred. Any volume status other than
/// end-of-file is a failure.
pub fn drain_to_output<V: VolumeService>(
    volume: &V,
    file: FileHandle,
    out: &mut dyn Write,
) -> Result<u64, TransferError> {
    let mut buf = [0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        match volume.read_chunk(file, &mut buf) {
            Ok(n) => {
                out.write_all(&buf[..n])?;
                total += n as u64;
            }
            Err(VolumeError::EndOfFile) => break,
            Err(e) => return Err(e.into()),
        }
    }
    out.flush()?;
    Ok(total)
}

/// Streams `input` into an open file until the input is exhausted.
///
/// A chunk the volume service does not accept in full aborts the transfer;
/// there is no partial-write retry.
pub fn fill_from_input<V: VolumeService>(
    volume: &V,
    file: FileHandle,
    input: &mut dyn Read,
) -> Result<u64, TransferError> {
    let mut buf = [0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let n = match input.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        let accepted = volume.write_chunk(file, &buf[..n])?;
        if accepted != n {
            return Err(TransferError::ShortWrite {
                requested: n,
                accepted,
            });
        }
        total += accepted as u64;
    }
    Ok(total)
}
