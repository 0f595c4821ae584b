//! FileSystem and File trait definitions

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::SystemTime;

/// Metadata about a file system entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub size: u64,
    pub file_type: FileType,
    pub accessed: Option<SystemTime>,
    pub modified: Option<SystemTime>,
}

/// Type of file system entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
    Symlink,
    Other,
}

impl FileMetadata {
    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }

    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }

    pub fn is_symlink(&self) -> bool {
        self.file_type == FileType::Symlink
    }

    pub fn len(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

impl From<fs::Metadata> for FileMetadata {
    fn from(meta: fs::Metadata) -> Self {
        let file_type = if meta.file_type().is_symlink() {
            FileType::Symlink
        } else if meta.is_dir() {
            FileType::Directory
        } else if meta.is_file() {
            FileType::File
        } else {
            FileType::Other
        };

        Self {
            size: meta.len(),
            file_type,
            accessed: meta.accessed().ok(),
            modified: meta.modified().ok(),
        }
    }
}

/// What a walk visitor wants to happen next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Keep walking
    Continue,
    /// On a directory, skip its contents. On a file, skip the rest of its parent directory.
    SkipDir,
    /// Stop the walk without an error
    SkipAll,
}

/// Visitor invoked by [`FileSystem::walk`] for every entry.
///
/// Receives the entry path and either its metadata or the error hit while
/// reaching it. Returning `Err` aborts the walk with that error.
pub type WalkFn<'a> = dyn FnMut(&Path, io::Result<FileMetadata>) -> io::Result<Visit> + 'a;

/// An open file handle
///
/// Handles are exclusively owned. `close` consumes the handle, so it runs at most once.
pub trait File: Read + Write + Send {
    /// Path the handle was opened with
    fn name(&self) -> &Path;

    /// Current size of the file, queried from the OS
    fn size(&self) -> io::Result<u64>;

    /// Flush data and metadata to disk
    fn sync(&mut self) -> io::Result<()>;

    /// Release the handle's resources and report the first failure
    fn close(self: Box<Self>) -> io::Result<()>;
}

/// Abstraction over file system operations for testability
pub trait FileSystem: Send + Sync {
    /// Create or truncate a file for reading and writing
    fn create(&self, path: &Path) -> io::Result<Box<dyn File>>;

    /// Open an existing file read-only
    fn open(&self, path: &Path) -> io::Result<Box<dyn File>>;

    /// Remove a file or empty directory
    fn remove(&self, path: &Path) -> io::Result<()>;

    /// Rename a path
    fn rename(&self, old: &Path, new: &Path) -> io::Result<()>;

    /// Check if a path exists. Any stat failure counts as absent.
    fn exists(&self, path: &Path) -> bool {
        self.try_exists(path).unwrap_or(false)
    }

    /// Check if a path exists, reporting stat failures other than not-found
    fn try_exists(&self, path: &Path) -> io::Result<bool>;

    /// Create a directory and all missing parents
    fn mkdir_all(&self, path: &Path) -> io::Result<()>;

    /// Set access and modification times
    fn chtimes(&self, path: &Path, atime: SystemTime, mtime: SystemTime) -> io::Result<()>;

    /// Get file/directory metadata
    fn metadata(&self, path: &Path) -> io::Result<FileMetadata>;

    /// Walk the tree under `root` in lexical pre-order
    fn walk(&self, root: &Path, visit: &mut WalkFn<'_>) -> io::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_metadata_is_file() {
        let meta = FileMetadata {
            size: 100,
            file_type: FileType::File,
            accessed: None,
            modified: None,
        };
        assert!(meta.is_file());
        assert!(!meta.is_dir());
        assert_eq!(meta.len(), 100);
    }

    #[test]
    fn test_file_metadata_is_dir() {
        let meta = FileMetadata {
            size: 0,
            file_type: FileType::Directory,
            accessed: None,
            modified: None,
        };
        assert!(meta.is_dir());
        assert!(!meta.is_file());
        assert!(meta.is_empty());
    }

    #[test]
    fn test_metadata_from_std() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("data.bin");
        std::fs::write(&path, b"abc").unwrap();

        let meta = FileMetadata::from(std::fs::metadata(&path).unwrap());
        assert!(meta.is_file());
        assert_eq!(meta.size, 3);
        assert!(meta.modified.is_some());

        let meta = FileMetadata::from(std::fs::metadata(temp.path()).unwrap());
        assert!(meta.is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_metadata_from_symlink() {
        let temp = tempfile::TempDir::new().unwrap();
        let target = temp.path().join("target");
        let link = temp.path().join("link");
        std::fs::write(&target, b"x").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let meta = FileMetadata::from(std::fs::symlink_metadata(&link).unwrap());
        assert!(meta.is_symlink());
    }
}
