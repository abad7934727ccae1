//! Reference in-memory volume backend.
//!
//! Holds the whole tree in memory and tracks open handles in tables keyed by
//! monotonically allocated ids. Deliberately free of on-disk concerns; the
//! image module persists and restores the tree wholesale.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entry::{DirEntry, EntryAttrs, EntryTime};
use crate::error::{VolumeError, VolumeResult};
use crate::volume::{DirHandle, FileHandle, OpenMode, VolumeService};

/// One node of the volume tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) enum Node {
    /// Regular file.
    File {
        created: EntryTime,
        #[serde(default)]
        read_only: bool,
        #[serde(default)]
        content: Vec<u8>,
    },
    /// Directory with named children.
    Dir {
        created: EntryTime,
        #[serde(default)]
        entries: BTreeMap<String, Node>,
    },
}

impl Node {
    pub(crate) fn empty_dir() -> Self {
        Node::Dir {
            created: EntryTime::now(),
            entries: BTreeMap::new(),
        }
    }

    fn new_file() -> Self {
        Node::File {
            created: EntryTime::now(),
            read_only: false,
            content: Vec::new(),
        }
    }

    fn is_dir(&self) -> bool {
        matches!(self, Node::Dir { .. })
    }

    fn to_dir_entry(&self, name: &str) -> DirEntry {
        match self {
            Node::File {
                created,
                read_only,
                content,
            } => DirEntry {
                name: name.to_string(),
                size: content.len() as u64,
                created: *created,
                attr: EntryAttrs {
                    directory: false,
                    read_only: *read_only,
                },
            },
            Node::Dir { created, .. } => DirEntry {
                name: name.to_string(),
                size: 0,
                created: *created,
                attr: EntryAttrs {
                    directory: true,
                    read_only: false,
                },
            },
        }
    }

    /// Total file content bytes in this subtree.
    fn content_bytes(&self) -> u64 {
        match self {
            Node::File { content, .. } => content.len() as u64,
            Node::Dir { entries, .. } => entries.values().map(Node::content_bytes).sum(),
        }
    }
}

/// Splits an absolute path into components.
///
/// Only plain absolute paths are accepted; `.` and `..` have no meaning in a
/// single-shot shell with no working directory.
fn split_path(path: &str) -> VolumeResult<Vec<String>> {
    if !path.starts_with('/') {
        return Err(VolumeError::InvalidPath);
    }
    let mut parts = Vec::new();
    for comp in path.split('/') {
        if comp.is_empty() {
            continue;
        }
        if comp == "." || comp == ".." {
            return Err(VolumeError::InvalidPath);
        }
        parts.push(comp.to_string());
    }
    Ok(parts)
}

/// Walks `parts` down from `root`, failing with NoSuchEntry for a missing
/// component and NotADirectory when traversal passes through a file.
fn lookup<'a>(root: &'a Node, parts: &[String]) -> VolumeResult<&'a Node> {
    let mut node = root;
    for part in parts {
        match node {
            Node::Dir { entries, .. } => {
                node = entries.get(part).ok_or(VolumeError::NoSuchEntry)?;
            }
            Node::File { .. } => return Err(VolumeError::NotADirectory),
        }
    }
    Ok(node)
}

/// Walks to the directory at `parts` and returns its entry map.
fn lookup_dir_mut<'a>(
    root: &'a mut Node,
    parts: &[String],
) -> VolumeResult<&'a mut BTreeMap<String, Node>> {
    let mut node = root;
    for part in parts {
        match node {
            Node::Dir { entries, .. } => {
                node = entries.get_mut(part).ok_or(VolumeError::NoSuchEntry)?;
            }
            Node::File { .. } => return Err(VolumeError::NotADirectory),
        }
    }
    match node {
        Node::Dir { entries, .. } => Ok(entries),
        Node::File { .. } => Err(VolumeError::NotADirectory),
    }
}

/// Snapshot cursor over one open directory.
struct DirCursor {
    entries: Vec<DirEntry>,
    next: usize,
}

/// Bookkeeping for one open file.
struct OpenFile {
    path: Vec<String>,
    mode: OpenMode,
    pos: usize,
}

struct State {
    root: Node,
    capacity: Option<u64>,
    next_handle: u64,
    open_dirs: HashMap<u64, DirCursor>,
    open_files: HashMap<u64, OpenFile>,
}

impl State {
    fn allocate_handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }
}

/// In-memory [`VolumeService`] implementation.
pub struct MemVolume {
    state: RwLock<State>,
}

impl MemVolume {
    /// Creates an empty, unbounded volume.
    pub fn new() -> Self {
        Self::with_capacity(None)
    }

    /// Creates an empty volume that rejects writes past `capacity` total
    /// content bytes.
    pub fn with_capacity(capacity: Option<u64>) -> Self {
        Self::from_parts(Node::empty_dir(), capacity)
    }

    pub(crate) fn from_parts(root: Node, capacity: Option<u64>) -> Self {
        Self {
            state: RwLock::new(State {
                root,
                capacity,
                next_handle: 1,
                open_dirs: HashMap::new(),
                open_files: HashMap::new(),
            }),
        }
    }

    pub(crate) fn into_parts(self) -> (Node, Option<u64>) {
        let state = self.state.into_inner();
        (state.root, state.capacity)
    }

    /// Marks an existing file read-only (or writable again).
    pub fn set_read_only(&self, path: &str, value: bool) -> VolumeResult<()> {
        let parts = split_path(path)?;
        let mut state = self.state.write();
        let (dir, name) = match parts.split_last() {
            Some((name, dir)) => (dir, name),
            None => return Err(VolumeError::NotAFile),
        };
        let entries = lookup_dir_mut(&mut state.root, dir)?;
        match entries.get_mut(name) {
            Some(Node::File { read_only, .. }) => {
                *read_only = value;
                Ok(())
            }
            Some(Node::Dir { .. }) => Err(VolumeError::NotAFile),
            None => Err(VolumeError::NoSuchEntry),
        }
    }

    /// Total content bytes currently stored.
    pub fn used_bytes(&self) -> u64 {
        self.state.read().root.content_bytes()
    }
}

impl Default for MemVolume {
    fn default() -> Self {
        Self::new()
    }
}

impl VolumeService for MemVolume {
    fn open_dir(&self, path: &str) -> VolumeResult<DirHandle> {
        let parts = split_path(path)?;
        let mut state = self.state.write();
        let node = lookup(&state.root, &parts)?;
        let entries = match node {
            Node::Dir { entries, .. } => entries
                .iter()
                .map(|(name, child)| child.to_dir_entry(name))
                .collect(),
            Node::File { .. } => return Err(VolumeError::NotADirectory),
        };
        let handle = state.allocate_handle();
        state.open_dirs.insert(handle, DirCursor { entries, next: 0 });
        debug!(path, handle, "open_dir");
        Ok(DirHandle(handle))
    }

    fn read_dir_next(&self, dir: DirHandle) -> VolumeResult<DirEntry> {
        let mut state = self.state.write();
        let cursor = state
            .open_dirs
            .get_mut(&dir.0)
            .ok_or(VolumeError::InvalidParameters)?;
        if cursor.next >= cursor.entries.len() {
            return Err(VolumeError::EndOfDirectory);
        }
        let entry = cursor.entries[cursor.next].clone();
        cursor.next += 1;
        Ok(entry)
    }

    fn close_dir(&self, dir: DirHandle) -> VolumeResult<()> {
        let mut state = self.state.write();
        state
            .open_dirs
            .remove(&dir.0)
            .ok_or(VolumeError::InvalidParameters)?;
        debug!(handle = dir.0, "close_dir");
        Ok(())
    }

    fn make_dir(&self, path: &str) -> VolumeResult<()> {
        let parts = split_path(path)?;
        let mut state = self.state.write();
        let (name, dir) = match parts.split_last() {
            Some((name, dir)) => (name, dir),
            // The root always exists.
            None => return Err(VolumeError::DirectoryExists),
        };
        let entries = lookup_dir_mut(&mut state.root, dir)?;
        if entries.contains_key(name) {
            return Err(VolumeError::DirectoryExists);
        }
        entries.insert(name.clone(), Node::empty_dir());
        debug!(path, "make_dir");
        Ok(())
    }

    fn remove_dir(&self, path: &str) -> VolumeResult<()> {
        let parts = split_path(path)?;
        let mut state = self.state.write();
        let (name, dir) = match parts.split_last() {
            Some((name, dir)) => (name, dir),
            None => return Err(VolumeError::RemoveDirFailed),
        };
        let entries = lookup_dir_mut(&mut state.root, dir)?;
        match entries.get(name) {
            None => return Err(VolumeError::NoSuchEntry),
            Some(Node::File { .. }) => return Err(VolumeError::NotADirectory),
            Some(Node::Dir { entries: children, .. }) => {
                if !children.is_empty() {
                    return Err(VolumeError::DirectoryNotEmpty);
                }
            }
        }
        entries.remove(name);
        debug!(path, "remove_dir");
        Ok(())
    }

    fn remove_file(&self, path: &str) -> VolumeResult<()> {
        let parts = split_path(path)?;
        let mut state = self.state.write();
        let (name, dir) = match parts.split_last() {
            Some((name, dir)) => (name, dir),
            None => return Err(VolumeError::NotAFile),
        };
        let entries = lookup_dir_mut(&mut state.root, dir)?;
        match entries.get(name) {
            None => return Err(VolumeError::NoSuchEntry),
            Some(Node::Dir { .. }) => return Err(VolumeError::NotAFile),
            Some(Node::File { .. }) => {}
        }
        entries.remove(name);
        debug!(path, "remove_file");
        Ok(())
    }

    fn open_file(&self, path: &str, mode: OpenMode) -> VolumeResult<FileHandle> {
        let parts = split_path(path)?;
        let mut state = self.state.write();
        let (name, dir) = match parts.split_last() {
            Some((name, dir)) => (name, dir),
            None => return Err(VolumeError::NotAFile),
        };

        let pos;
        match mode {
            OpenMode::Read => {
                let node = match lookup(&state.root, dir) {
                    Ok(Node::Dir { entries, .. }) => entries.get(name),
                    Ok(Node::File { .. }) => return Err(VolumeError::NotADirectory),
                    Err(e) => return Err(e),
                };
                match node {
                    None => return Err(VolumeError::FileNotFound),
                    Some(Node::Dir { .. }) => return Err(VolumeError::NotAFile),
                    Some(Node::File { .. }) => {}
                }
                pos = 0;
            }
            OpenMode::WriteTruncate | OpenMode::WriteAppend => {
                let entries = lookup_dir_mut(&mut state.root, dir)?;
                match entries.get_mut(name) {
                    Some(Node::Dir { .. }) => return Err(VolumeError::NotAFile),
                    Some(Node::File {
                        read_only, content, ..
                    }) => {
                        if *read_only {
                            return Err(VolumeError::ReadOnlyFile);
                        }
                        if mode == OpenMode::WriteTruncate {
                            content.clear();
                        }
                        pos = content.len();
                    }
                    None => {
                        entries.insert(name.clone(), Node::new_file());
                        pos = 0;
                    }
                }
            }
        }

        let handle = state.allocate_handle();
        state.open_files.insert(
            handle,
            OpenFile {
                path: parts,
                mode,
                pos,
            },
        );
        debug!(path, ?mode, handle, "open_file");
        Ok(FileHandle(handle))
    }

    fn read_chunk(&self, file: FileHandle, buf: &mut [u8]) -> VolumeResult<usize> {
        let mut state = self.state.write();
        let State {
            root, open_files, ..
        } = &mut *state;
        let open = open_files
            .get_mut(&file.0)
            .ok_or(VolumeError::InvalidParameters)?;
        if open.mode != OpenMode::Read {
            return Err(VolumeError::InvalidOpenMode);
        }
        let content = match lookup(root, &open.path) {
            Ok(Node::File { content, .. }) => content,
            // The file went away underneath the handle.
            Ok(Node::Dir { .. }) | Err(_) => return Err(VolumeError::FileOpenFailed),
        };
        if open.pos >= content.len() {
            return Err(VolumeError::EndOfFile);
        }
        let n = buf.len().min(content.len() - open.pos);
        buf[..n].copy_from_slice(&content[open.pos..open.pos + n]);
        open.pos += n;
        Ok(n)
    }

    fn write_chunk(&self, file: FileHandle, data: &[u8]) -> VolumeResult<usize> {
        let mut state = self.state.write();
        let State {
            root,
            capacity,
            open_files,
            ..
        } = &mut *state;
        let open = open_files
            .get_mut(&file.0)
            .ok_or(VolumeError::InvalidParameters)?;
        if open.mode == OpenMode::Read {
            return Err(VolumeError::InvalidOpenMode);
        }
        if let Some(cap) = capacity {
            let used = root.content_bytes();
            if used + data.len() as u64 > *cap {
                return Err(VolumeError::NoFreeSpace);
            }
        }
        let (name, dir) = match open.path.split_last() {
            Some((name, dir)) => (name, dir),
            None => return Err(VolumeError::FileOpenFailed),
        };
        let content = match lookup_dir_mut(root, dir) {
            Ok(entries) => match entries.get_mut(name) {
                Some(Node::File { content, .. }) => content,
                _ => return Err(VolumeError::FileOpenFailed),
            },
            Err(_) => return Err(VolumeError::FileOpenFailed),
        };
        content.extend_from_slice(data);
        open.pos = content.len();
        Ok(data.len())
    }

    fn close_file(&self, file: FileHandle) -> VolumeResult<()> {
        let mut state = self.state.write();
        state
            .open_files
            .remove(&file.0)
            .ok_or(VolumeError::InvalidParameters)?;
        debug!(handle = file.0, "close_file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(volume: &MemVolume, path: &str) -> Vec<u8> {
        let file = volume.open_file(path, OpenMode::Read).unwrap();
        let mut out = Vec::new();
        let mut buf = [0u8; 16];
        loop {
            match volume.read_chunk(file, &mut buf) {
                Ok(n) => out.extend_from_slice(&buf[..n]),
                Err(VolumeError::EndOfFile) => break,
                Err(e) => panic!("read_chunk failed: {e}"),
            }
        }
        volume.close_file(file).unwrap();
        out
    }

    fn write_all(volume: &MemVolume, path: &str, mode: OpenMode, data: &[u8]) {
        let file = volume.open_file(path, mode).unwrap();
        assert_eq!(volume.write_chunk(file, data).unwrap(), data.len());
        volume.close_file(file).unwrap();
    }

    #[test]
    fn test_mkdir_and_list() {
        let volume = MemVolume::new();
        volume.make_dir("/docs").unwrap();
        volume.make_dir("/docs/old").unwrap();

        let dir = volume.open_dir("/docs").unwrap();
        let entry = volume.read_dir_next(dir).unwrap();
        assert_eq!(entry.name, "old");
        assert!(entry.is_directory());
        assert_eq!(
            volume.read_dir_next(dir),
            Err(VolumeError::EndOfDirectory)
        );
        volume.close_dir(dir).unwrap();
    }

    #[test]
    fn test_mkdir_errors() {
        let volume = MemVolume::new();
        volume.make_dir("/docs").unwrap();
        assert_eq!(volume.make_dir("/docs"), Err(VolumeError::DirectoryExists));
        assert_eq!(volume.make_dir("/"), Err(VolumeError::DirectoryExists));
        assert_eq!(volume.make_dir("/gone/sub"), Err(VolumeError::NoSuchEntry));
        assert_eq!(volume.make_dir("relative"), Err(VolumeError::InvalidPath));
        assert_eq!(volume.make_dir("/a/../b"), Err(VolumeError::InvalidPath));
    }

    #[test]
    fn test_write_read_roundtrip() {
        let volume = MemVolume::new();
        write_all(&volume, "/note.txt", OpenMode::WriteTruncate, b"hello");
        assert_eq!(read_all(&volume, "/note.txt"), b"hello");

        write_all(&volume, "/note.txt", OpenMode::WriteTruncate, b"fresh");
        assert_eq!(read_all(&volume, "/note.txt"), b"fresh");
    }

    #[test]
    fn test_append() {
        let volume = MemVolume::new();
        write_all(&volume, "/log", OpenMode::WriteAppend, b"foo");
        write_all(&volume, "/log", OpenMode::WriteAppend, b"bar");
        assert_eq!(read_all(&volume, "/log"), b"foobar");
    }

    #[test]
    fn test_open_read_missing() {
        let volume = MemVolume::new();
        assert_eq!(
            volume.open_file("/nope", OpenMode::Read),
            Err(VolumeError::FileNotFound)
        );
    }

    #[test]
    fn test_open_dir_as_file() {
        let volume = MemVolume::new();
        volume.make_dir("/docs").unwrap();
        assert_eq!(
            volume.open_file("/docs", OpenMode::Read),
            Err(VolumeError::NotAFile)
        );
        assert_eq!(
            volume.open_file("/docs", OpenMode::WriteTruncate),
            Err(VolumeError::NotAFile)
        );
    }

    #[test]
    fn test_remove_file_semantics() {
        let volume = MemVolume::new();
        volume.make_dir("/docs").unwrap();
        write_all(&volume, "/note", OpenMode::WriteTruncate, b"x");

        assert_eq!(volume.remove_file("/docs"), Err(VolumeError::NotAFile));
        assert_eq!(volume.remove_file("/gone"), Err(VolumeError::NoSuchEntry));
        volume.remove_file("/note").unwrap();
        assert_eq!(
            volume.open_file("/note", OpenMode::Read),
            Err(VolumeError::FileNotFound)
        );
    }

    #[test]
    fn test_remove_dir_semantics() {
        let volume = MemVolume::new();
        volume.make_dir("/docs").unwrap();
        volume.make_dir("/docs/old").unwrap();
        write_all(&volume, "/note", OpenMode::WriteTruncate, b"x");

        assert_eq!(
            volume.remove_dir("/docs"),
            Err(VolumeError::DirectoryNotEmpty)
        );
        assert_eq!(volume.remove_dir("/note"), Err(VolumeError::NotADirectory));
        assert_eq!(volume.remove_dir("/"), Err(VolumeError::RemoveDirFailed));

        volume.remove_dir("/docs/old").unwrap();
        volume.remove_dir("/docs").unwrap();
    }

    #[test]
    fn test_read_only_file() {
        let volume = MemVolume::new();
        write_all(&volume, "/locked", OpenMode::WriteTruncate, b"keep");
        volume.set_read_only("/locked", true).unwrap();

        assert_eq!(
            volume.open_file("/locked", OpenMode::WriteTruncate),
            Err(VolumeError::ReadOnlyFile)
        );
        assert_eq!(
            volume.open_file("/locked", OpenMode::WriteAppend),
            Err(VolumeError::ReadOnlyFile)
        );
        // Reading is unaffected.
        assert_eq!(read_all(&volume, "/locked"), b"keep");
    }

    #[test]
    fn test_capacity_exhaustion() {
        let volume = MemVolume::with_capacity(Some(8));
        write_all(&volume, "/a", OpenMode::WriteTruncate, b"12345");

        let file = volume.open_file("/b", OpenMode::WriteTruncate).unwrap();
        assert_eq!(
            volume.write_chunk(file, b"too much"),
            Err(VolumeError::NoFreeSpace)
        );
        // The failed write stored nothing.
        assert_eq!(volume.write_chunk(file, b"ok!").unwrap(), 3);
        volume.close_file(file).unwrap();
        assert_eq!(volume.used_bytes(), 8);
    }

    #[test]
    fn test_stale_handles() {
        let volume = MemVolume::new();
        assert_eq!(
            volume.close_dir(DirHandle(99)),
            Err(VolumeError::InvalidParameters)
        );
        assert_eq!(
            volume.close_file(FileHandle(99)),
            Err(VolumeError::InvalidParameters)
        );
        let mut buf = [0u8; 4];
        assert_eq!(
            volume.read_chunk(FileHandle(99), &mut buf),
            Err(VolumeError::InvalidParameters)
        );
    }

    #[test]
    fn test_mode_mismatch() {
        let volume = MemVolume::new();
        write_all(&volume, "/f", OpenMode::WriteTruncate, b"data");

        let reader = volume.open_file("/f", OpenMode::Read).unwrap();
        assert_eq!(
            volume.write_chunk(reader, b"x"),
            Err(VolumeError::InvalidOpenMode)
        );
        volume.close_file(reader).unwrap();

        let writer = volume.open_file("/f", OpenMode::WriteAppend).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(
            volume.read_chunk(writer, &mut buf),
            Err(VolumeError::InvalidOpenMode)
        );
        volume.close_file(writer).unwrap();
    }

    #[test]
    fn test_empty_file_reads_eof() {
        let volume = MemVolume::new();
        write_all(&volume, "/empty", OpenMode::WriteTruncate, b"");
        let file = volume.open_file("/empty", OpenMode::Read).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(
            volume.read_chunk(file, &mut buf),
            Err(VolumeError::EndOfFile)
        );
        volume.close_file(file).unwrap();
    }
}
