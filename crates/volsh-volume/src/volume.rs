//! The capability-style volume service contract.
//!
//! All operations are synchronous and block until the driver responds.
//! Handles are opaque capabilities scoped to a single caller; an open call
//! that fails never yields a handle needing closure.

use crate::entry::DirEntry;
use crate::error::VolumeResult;

/// Opaque capability for an open directory iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirHandle(pub u64);

/// Opaque capability for an open file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileHandle(pub u64);

/// Mode selected when opening a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read existing content from the start.
    Read,
    /// Create the file if absent, discard existing content.
    WriteTruncate,
    /// Create the file if absent, position writes at the end.
    WriteAppend,
}

/// Filesystem driver interface consumed by the shell.
///
/// Every method returns exactly one status; callers must inspect it before
/// trusting any produced value. [`VolumeError::EndOfDirectory`] and
/// [`VolumeError::EndOfFile`] are loop terminators recognized by the
/// consuming loops, never surfaced as errors.
///
/// [`VolumeError::EndOfDirectory`]: crate::VolumeError::EndOfDirectory
/// [`VolumeError::EndOfFile`]: crate::VolumeError::EndOfFile
pub trait VolumeService {
    /// Opens the directory at `path` for iteration.
    fn open_dir(&self, path: &str) -> VolumeResult<DirHandle>;

    /// Yields the next entry, or `Err(EndOfDirectory)` when exhausted.
    fn read_dir_next(&self, dir: DirHandle) -> VolumeResult<DirEntry>;

    /// Releases a directory handle.
    fn close_dir(&self, dir: DirHandle) -> VolumeResult<()>;

    /// Creates the directory named by `path`.
    fn make_dir(&self, path: &str) -> VolumeResult<()>;

    /// Removes the directory named by `path`.
    fn remove_dir(&self, path: &str) -> VolumeResult<()>;

    /// Removes the file named by `path`.
    fn remove_file(&self, path: &str) -> VolumeResult<()>;

    /// Opens the file at `path` in the given mode.
    fn open_file(&self, path: &str, mode: OpenMode) -> VolumeResult<FileHandle>;

    /// Reads up to `buf.len()` bytes, returning the count actually read,
    /// or `Err(EndOfFile)` once content is exhausted.
    fn read_chunk(&self, file: FileHandle, buf: &mut [u8]) -> VolumeResult<usize>;

    /// Writes `data`, returning the count actually written.
    fn write_chunk(&self, file: FileHandle, data: &[u8]) -> VolumeResult<usize>;

    /// Releases a file handle.
    fn close_file(&self, file: FileHandle) -> VolumeResult<()>;
}
