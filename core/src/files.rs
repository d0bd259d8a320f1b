//! Platform file services exposed to the logic module
//!
//! Read contents are parked in a handle table until the logic module copies
//! them into the arena and frees the handle. Names are resolved against a
//! single root directory.

use std::path::{Component, Path, PathBuf};

use hashbrown::HashMap;

use crate::error::FileIoError;

/// Convert a 64-bit length to 32 bits, refusing anything that would truncate.
pub fn safe_truncate_u64(value: u64) -> Option<u32> {
    u32::try_from(value).ok()
}

#[derive(Debug, Default)]
pub struct FileServices {
    root: PathBuf,
    open: HashMap<u32, Vec<u8>>,
    next_handle: u32,
}

impl FileServices {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            open: HashMap::new(),
            next_handle: 0,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a logic-supplied name to a path under the root.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, FileIoError> {
        let relative = Path::new(name);
        let is_plain = !name.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        if !is_plain {
            return Err(FileIoError::InvalidPath(name.to_string()));
        }
        Ok(self.root.join(relative))
    }

    /// Read an entire file into memory.
    pub fn read_entire_file(&self, name: &str) -> Result<Vec<u8>, FileIoError> {
        let path = self.resolve(name)?;
        let len = std::fs::metadata(&path)
            .map_err(|source| FileIoError::Io {
                path: path.clone(),
                source,
            })?
            .len();
        if safe_truncate_u64(len).is_none() {
            return Err(FileIoError::TooLarge { path, len });
        }
        std::fs::read(&path).map_err(|source| FileIoError::Io { path, source })
    }

    /// Replace the contents of a file.
    pub fn write_entire_file(&self, name: &str, contents: &[u8]) -> Result<(), FileIoError> {
        let path = self.resolve(name)?;
        std::fs::write(&path, contents).map_err(|source| FileIoError::Io { path, source })
    }

    /// Read a file and park its contents behind a non-zero handle.
    pub fn open(&mut self, name: &str) -> Result<u32, FileIoError> {
        let contents = self.read_entire_file(name)?;
        self.next_handle = self.next_handle.wrapping_add(1).max(1);
        while self.open.contains_key(&self.next_handle) {
            self.next_handle = self.next_handle.wrapping_add(1).max(1);
        }
        self.open.insert(self.next_handle, contents);
        Ok(self.next_handle)
    }

    pub fn contents(&self, handle: u32) -> Option<&[u8]> {
        self.open.get(&handle).map(Vec::as_slice)
    }

    /// Release a handle's contents. Returns false for unknown handles.
    pub fn free_file_memory(&mut self, handle: u32) -> bool {
        self.open.remove(&handle).is_some()
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read_through_handle() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = FileServices::new(dir.path());

        files.write_entire_file("level.dat", b"tiles").unwrap();
        let handle = files.open("level.dat").unwrap();

        assert_ne!(handle, 0);
        assert_eq!(files.contents(handle), Some(&b"tiles"[..]));
        assert!(files.free_file_memory(handle));
        assert!(!files.free_file_memory(handle));
        assert_eq!(files.open_count(), 0);
    }

    #[test]
    fn test_handles_are_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = FileServices::new(dir.path());
        files.write_entire_file("a", b"1").unwrap();

        let first = files.open("a").unwrap();
        let second = files.open("a").unwrap();
        assert_ne!(first, second);
        assert_eq!(files.open_count(), 2);
    }

    #[test]
    fn test_rejects_paths_outside_root() {
        let files = FileServices::new("/tmp/root");
        assert!(matches!(files.resolve("../secret"), Err(FileIoError::InvalidPath(_))));
        assert!(matches!(files.resolve("/etc/passwd"), Err(FileIoError::InvalidPath(_))));
        assert!(matches!(files.resolve(""), Err(FileIoError::InvalidPath(_))));
        assert_eq!(
            files.resolve("saves/slot1").unwrap(),
            PathBuf::from("/tmp/root/saves/slot1")
        );
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = FileServices::new(dir.path());
        assert!(matches!(files.open("missing"), Err(FileIoError::Io { .. })));
    }

    #[test]
    fn test_safe_truncate() {
        assert_eq!(safe_truncate_u64(5), Some(5));
        assert_eq!(safe_truncate_u64(u32::MAX as u64), Some(u32::MAX));
        assert_eq!(safe_truncate_u64(u32::MAX as u64 + 1), None);
    }
}
