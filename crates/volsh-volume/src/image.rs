//! Image-backed mounting for the reference backend.
//!
//! The image is a serde_json document with a small header and the whole
//! volume tree. Mounting deserializes the tree into a [`MemVolume`];
//! unmounting writes it back. There is deliberately no incremental on-disk
//! structure here; real drivers keep their own formats.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::entry::DirEntry;
use crate::error::{VolumeError, VolumeResult};
use crate::mem::{MemVolume, Node};
use crate::volume::{DirHandle, FileHandle, OpenMode, VolumeService};

/// Identifies a volsh image file.
const IMAGE_MAGIC: &str = "volsh-image";
/// Current image format version.
const IMAGE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct ImageDocument {
    magic: String,
    version: u32,
    capacity: Option<u64>,
    root: Node,
}

/// A volume mounted from an image file.
///
/// Implements [`VolumeService`] by delegating to the in-memory tree; the
/// tree is persisted back to the image path on [`VolumeImage::unmount`].
pub struct VolumeImage {
    volume: MemVolume,
    path: PathBuf,
}

impl VolumeImage {
    /// Mounts the image at `path`.
    ///
    /// An unreadable file is a device access failure; a file that does not
    /// parse as a current-version image is a bad boot sector.
    pub fn mount(path: &Path) -> VolumeResult<Self> {
        let bytes = fs::read(path).map_err(|_| VolumeError::DeviceAccess)?;
        let doc: ImageDocument =
            serde_json::from_slice(&bytes).map_err(|_| VolumeError::BadBootSector)?;
        if doc.magic != IMAGE_MAGIC || doc.version != IMAGE_VERSION {
            return Err(VolumeError::BadBootSector);
        }
        info!(path = %path.display(), "mounted volume image");
        Ok(Self {
            volume: MemVolume::from_parts(doc.root, doc.capacity),
            path: path.to_path_buf(),
        })
    }

    /// Unmounts the volume, writing the tree back to the image file.
    pub fn unmount(self) -> VolumeResult<()> {
        let path = self.path;
        let (root, capacity) = self.volume.into_parts();
        let doc = ImageDocument {
            magic: IMAGE_MAGIC.to_string(),
            version: IMAGE_VERSION,
            capacity,
            root,
        };
        let bytes = serde_json::to_vec(&doc).map_err(|_| VolumeError::DeviceAccess)?;
        fs::write(&path, bytes).map_err(|_| VolumeError::DeviceAccess)?;
        info!(path = %path.display(), "unmounted volume image");
        Ok(())
    }

    /// Writes a fresh empty image to `path`.
    pub fn create(path: &Path, capacity: Option<u64>) -> VolumeResult<()> {
        let doc = ImageDocument {
            magic: IMAGE_MAGIC.to_string(),
            version: IMAGE_VERSION,
            capacity,
            root: Node::empty_dir(),
        };
        let bytes = serde_json::to_vec_pretty(&doc).map_err(|_| VolumeError::DeviceAccess)?;
        fs::write(path, bytes).map_err(|_| VolumeError::DeviceAccess)?;
        debug!(path = %path.display(), ?capacity, "created volume image");
        Ok(())
    }
}

impl VolumeService for VolumeImage {
    fn open_dir(&self, path: &str) -> VolumeResult<DirHandle> {
        self.volume.open_dir(path)
    }

    fn read_dir_next(&self, dir: DirHandle) -> VolumeResult<DirEntry> {
        self.volume.read_dir_next(dir)
    }

    fn close_dir(&self, dir: DirHandle) -> VolumeResult<()> {
        self.volume.close_dir(dir)
    }

    fn make_dir(&self, path: &str) -> VolumeResult<()> {
        self.volume.make_dir(path)
    }

    fn remove_dir(&self, path: &str) -> VolumeResult<()> {
        self.volume.remove_dir(path)
    }

    fn remove_file(&self, path: &str) -> VolumeResult<()> {
        self.volume.remove_file(path)
    }

    fn open_file(&self, path: &str, mode: OpenMode) -> VolumeResult<FileHandle> {
        self.volume.open_file(path, mode)
    }

    fn read_chunk(&self, file: FileHandle, buf: &mut [u8]) -> VolumeResult<usize> {
        self.volume.read_chunk(file, buf)
    }

    fn write_chunk(&self, file: FileHandle, data: &[u8]) -> VolumeResult<usize> {
        self.volume.write_chunk(file, data)
    }

    fn close_file(&self, file: FileHandle) -> VolumeResult<()> {
        self.volume.close_file(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_path(dir: &tempfile::TempDir, name: &str) -> PathBuf {
        dir.path().join(name)
    }

    #[test]
    fn test_create_mount_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = image_path(&dir, "disk.img");

        VolumeImage::create(&path, Some(1024)).unwrap();

        let mounted = VolumeImage::mount(&path).unwrap();
        mounted.make_dir("/docs").unwrap();
        let file = mounted
            .open_file("/docs/note", OpenMode::WriteTruncate)
            .unwrap();
        mounted.write_chunk(file, b"persisted").unwrap();
        mounted.close_file(file).unwrap();
        mounted.unmount().unwrap();

        let reopened = VolumeImage::mount(&path).unwrap();
        let file = reopened.open_file("/docs/note", OpenMode::Read).unwrap();
        let mut buf = [0u8; 32];
        let n = reopened.read_chunk(file, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"persisted");
        reopened.close_file(file).unwrap();
        reopened.unmount().unwrap();
    }

    #[test]
    fn test_mount_missing_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = image_path(&dir, "absent.img");
        assert!(matches!(
            VolumeImage::mount(&path),
            Err(VolumeError::DeviceAccess)
        ));
    }

    #[test]
    fn test_mount_corrupt_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = image_path(&dir, "corrupt.img");
        fs::write(&path, b"not an image at all").unwrap();
        assert!(matches!(
            VolumeImage::mount(&path),
            Err(VolumeError::BadBootSector)
        ));
    }

    #[test]
    fn test_mount_wrong_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = image_path(&dir, "foreign.img");
        fs::write(
            &path,
            br#"{"magic":"other-image","version":1,"capacity":null,"root":{"Dir":{"created":{"year":0,"month":1,"day":1,"hour":0,"minute":0}}}}"#,
        )
        .unwrap();
        assert!(matches!(
            VolumeImage::mount(&path),
            Err(VolumeError::BadBootSector)
        ));
    }

    #[test]
    fn test_capacity_survives_remount() {
        let dir = tempfile::tempdir().unwrap();
        let path = image_path(&dir, "small.img");
        VolumeImage::create(&path, Some(4)).unwrap();

        let mounted = VolumeImage::mount(&path).unwrap();
        let file = mounted.open_file("/f", OpenMode::WriteTruncate).unwrap();
        assert_eq!(
            mounted.write_chunk(file, b"way too large"),
            Err(VolumeError::NoFreeSpace)
        );
        mounted.close_file(file).unwrap();
        mounted.unmount().unwrap();

        let reopened = VolumeImage::mount(&path).unwrap();
        let file = reopened.open_file("/f", OpenMode::WriteTruncate).unwrap();
        assert_eq!(
            reopened.write_chunk(file, b"still!"),
            Err(VolumeError::NoFreeSpace)
        );
        reopened.close_file(file).unwrap();
        reopened.unmount().unwrap();
    }
}
