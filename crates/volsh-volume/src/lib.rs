//! Volume service contract and reference backend for volsh.
//!
//! This crate provides:
//! - The capability-style [`VolumeService`] trait consumed by the shell
//! - The fixed enumeration of failure kinds ([`VolumeError`])
//! - Directory entry records and creation timestamps
//! - A reference backend: an in-memory tree persisted as an image file
//!
//! Real drivers (FAT and friends) live outside this repository and plug in
//! through the same trait.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod entry;
pub mod error;
pub mod image;
pub mod mem;
pub mod volume;

pub use entry::{DirEntry, EntryAttrs, EntryTime};
pub use error::{VolumeError, VolumeResult};
pub use image::VolumeImage;
pub use mem::MemVolume;
pub use volume::{DirHandle, FileHandle, OpenMode, VolumeService};
