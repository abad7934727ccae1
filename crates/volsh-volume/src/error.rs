//! Failure kinds reported by the volume service.
//!
//! Every service call returns exactly one status; callers inspect it before
//! trusting any value it produced. Two variants are loop terminators rather
//! than user-visible errors: [`VolumeError::EndOfDirectory`] and
//! [`VolumeError::EndOfFile`].

use thiserror::Error;

/// Result alias used by every volume service operation.
pub type VolumeResult<T> = Result<T, VolumeError>;

/// The fixed enumeration of volume service failure kinds.
///
/// Each variant has a stable negative wire code (-1..=-21) used by foreign
/// drivers; [`VolumeError::code`] and [`VolumeError::from_code`] convert
/// between the two representations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum VolumeError {
    /// A parameter was missing, out of range, or referenced a dead handle.
    #[error("Invalid parameters.")]
    InvalidParameters,
    /// The backing device could not be read or written.
    #[error("Device access failed.")]
    DeviceAccess,
    /// The volume header did not describe a usable volume.
    #[error("Bad boot sector.")]
    BadBootSector,
    /// The allocation table was malformed.
    #[error("Bad allocation table.")]
    BadAllocationTable,
    /// The supplied path was not a well-formed absolute path.
    #[error("Invalid path.")]
    InvalidPath,
    /// Directory iteration is complete. Terminator, not a user-visible error.
    #[error("Got the last directory entry.")]
    EndOfDirectory,
    /// The open mode did not permit the requested operation.
    #[error("Invalid open mode.")]
    InvalidOpenMode,
    /// The file named by the path does not exist.
    #[error("File does not exist.")]
    FileNotFound,
    /// The file exists but could not be opened.
    #[error("Open file failed.")]
    FileOpenFailed,
    /// The volume has no room for the requested write.
    #[error("No free disk space.")]
    NoFreeSpace,
    /// A write was attempted on a read-only file.
    #[error("Tried to write a read-only file.")]
    ReadOnlyFile,
    /// File content is exhausted. Terminator, not a user-visible error.
    #[error("Reached the end of the file.")]
    EndOfFile,
    /// The allocation table could not be accessed.
    #[error("Allocation table access failed.")]
    AllocationTableAccess,
    /// A directory with that name already exists.
    #[error("Directory already exists.")]
    DirectoryExists,
    /// The new directory could not be initialized.
    #[error("Initialize directory failed.")]
    DirectoryInitFailed,
    /// No entry of any kind exists at the path.
    #[error("No such file or directory.")]
    NoSuchEntry,
    /// The path names a directory where a file was required.
    #[error("This is not a file.")]
    NotAFile,
    /// The file could not be removed.
    #[error("Remove file failed.")]
    RemoveFileFailed,
    /// The path names a file where a directory was required.
    #[error("This is not a directory.")]
    NotADirectory,
    /// The directory still contains entries.
    #[error("This is not an empty directory.")]
    DirectoryNotEmpty,
    /// The directory could not be removed.
    #[error("Remove directory failed.")]
    RemoveDirFailed,
}

/// All variants in wire-code order (code -1 first).
const ALL: [VolumeError; 21] = [
    VolumeError::InvalidParameters,
    VolumeError::DeviceAccess,
    VolumeError::BadBootSector,
    VolumeError::BadAllocationTable,
    VolumeError::InvalidPath,
    VolumeError::EndOfDirectory,
    VolumeError::InvalidOpenMode,
    VolumeError::FileNotFound,
    VolumeError::FileOpenFailed,
    VolumeError::NoFreeSpace,
    VolumeError::ReadOnlyFile,
    VolumeError::EndOfFile,
    VolumeError::AllocationTableAccess,
    VolumeError::DirectoryExists,
    VolumeError::DirectoryInitFailed,
    VolumeError::NoSuchEntry,
    VolumeError::NotAFile,
    VolumeError::RemoveFileFailed,
    VolumeError::NotADirectory,
    VolumeError::DirectoryNotEmpty,
    VolumeError::RemoveDirFailed,
];

impl VolumeError {
    /// Returns the stable negative wire code for this failure kind.
    pub fn code(&self) -> i32 {
        match self {
            VolumeError::InvalidParameters => -1,
            VolumeError::DeviceAccess => -2,
            VolumeError::BadBootSector => -3,
            VolumeError::BadAllocationTable => -4,
            VolumeError::InvalidPath => -5,
            VolumeError::EndOfDirectory => -6,
            VolumeError::InvalidOpenMode => -7,
            VolumeError::FileNotFound => -8,
            VolumeError::FileOpenFailed => -9,
            VolumeError::NoFreeSpace => -10,
            VolumeError::ReadOnlyFile => -11,
            VolumeError::EndOfFile => -12,
            VolumeError::AllocationTableAccess => -13,
            VolumeError::DirectoryExists => -14,
            VolumeError::DirectoryInitFailed => -15,
            VolumeError::NoSuchEntry => -16,
            VolumeError::NotAFile => -17,
            VolumeError::RemoveFileFailed => -18,
            VolumeError::NotADirectory => -19,
            VolumeError::DirectoryNotEmpty => -20,
            VolumeError::RemoveDirFailed => -21,
        }
    }

    /// Resolves a wire code back to a failure kind.
    ///
    /// Returns `None` for any code outside the known range; a foreign code
    /// reaching this point is a driver bug, never something to display.
    pub fn from_code(code: i32) -> Option<Self> {
        if (-21..=-1).contains(&code) {
            Some(ALL[(-(code + 1)) as usize])
        } else {
            None
        }
    }

    /// True for the two codes that signal normal loop completion.
    pub fn is_terminator(&self) -> bool {
        matches!(self, VolumeError::EndOfDirectory | VolumeError::EndOfFile)
    }
}
