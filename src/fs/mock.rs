use super::{File, FileMetadata, FileSystem, FileType, Visit, WalkFn};
use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::SystemTime;

#[derive(Debug, Clone)]
pub struct MockEntry {
    pub content: Vec<u8>,
    pub file_type: FileType,
    pub accessed: SystemTime,
    pub modified: SystemTime,
}

impl MockEntry {
    fn file(content: Vec<u8>) -> Self {
        let now = SystemTime::now();
        Self {
            content,
            file_type: FileType::File,
            accessed: now,
            modified: now,
        }
    }

    fn dir() -> Self {
        let now = SystemTime::now();
        Self {
            content: Vec::new(),
            file_type: FileType::Directory,
            accessed: now,
            modified: now,
        }
    }

    fn metadata(&self) -> FileMetadata {
        FileMetadata {
            size: self.content.len() as u64,
            file_type: self.file_type,
            accessed: Some(self.accessed),
            modified: Some(self.modified),
        }
    }
}

type Entries = BTreeMap<PathBuf, MockEntry>;

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("Path not found: {:?}", path),
    )
}

/// In-memory file system for tests of code written against [`FileSystem`]
pub struct MockFileSystem {
    files: Arc<RwLock<Entries>>,
    root: PathBuf,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::with_root(PathBuf::from("/mock"))
    }

    pub fn with_root(root: PathBuf) -> Self {
        let mut files = Entries::new();
        ensure_parents(&mut files, &root);
        Self {
            files: Arc::new(RwLock::new(files)),
            root,
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = self.normalize_path(path.as_ref());
        let mut files = self.entries_mut();

        if let Some(parent) = path.parent() {
            ensure_parents(&mut files, parent);
        }

        files.insert(path, MockEntry::file(content.into()));
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = self.normalize_path(path.as_ref());
        ensure_parents(&mut self.entries_mut(), &path);
    }

    /// Current content of a file, if present
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        let path = self.normalize_path(path.as_ref());
        self.entries()
            .get(&path)
            .filter(|e| e.file_type == FileType::File)
            .map(|e| e.content.clone())
    }

    fn normalize_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn entries(&self) -> RwLockReadGuard<'_, Entries> {
        self.files.read().unwrap_or_else(|e| e.into_inner())
    }

    fn entries_mut(&self) -> RwLockWriteGuard<'_, Entries> {
        self.files.write().unwrap_or_else(|e| e.into_inner())
    }

    fn children(files: &Entries, dir: &Path) -> Vec<PathBuf> {
        files
            .range(dir.to_path_buf()..)
            .take_while(|(p, _)| p.starts_with(dir))
            .filter(|(p, _)| p.parent() == Some(dir))
            .map(|(p, _)| p.clone())
            .collect()
    }

    fn walk_entry(&self, path: &Path, visit: &mut WalkFn<'_>) -> io::Result<Visit> {
        let meta = self.entries().get(path).map(MockEntry::metadata);
        let meta = match meta {
            Some(meta) => meta,
            None => {
                return match visit(path, Err(not_found(path)))? {
                    Visit::SkipDir => Ok(Visit::Continue),
                    other => Ok(other),
                }
            }
        };

        let is_dir = meta.is_dir();
        match visit(path, Ok(meta))? {
            Visit::Continue if is_dir => {}
            Visit::SkipDir if is_dir => return Ok(Visit::Continue),
            other => return Ok(other),
        }

        let children = Self::children(&self.entries(), path);
        for child in children {
            match self.walk_entry(&child, visit)? {
                Visit::Continue => {}
                // Only files pass SkipDir up: the rest of this directory is skipped.
                Visit::SkipDir => break,
                Visit::SkipAll => return Ok(Visit::SkipAll),
            }
        }
        Ok(Visit::Continue)
    }
}

fn ensure_parents(files: &mut Entries, path: &Path) {
    let mut current = PathBuf::new();
    for component in path.components() {
        current.push(component);
        files.entry(current.clone()).or_insert_with(MockEntry::dir);
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MockFileSystem {
    fn create(&self, path: &Path) -> io::Result<Box<dyn File>> {
        let path = self.normalize_path(path);
        let mut files = self.entries_mut();

        let parent_is_dir = path
            .parent()
            .and_then(|p| files.get(p))
            .is_some_and(|e| e.file_type == FileType::Directory);
        if !parent_is_dir {
            return Err(not_found(&path));
        }

        match files.get_mut(&path) {
            Some(entry) if entry.file_type == FileType::Directory => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("Is a directory: {:?}", path),
                ));
            }
            Some(entry) => {
                entry.content.clear();
                entry.modified = SystemTime::now();
            }
            None => {
                files.insert(path.clone(), MockEntry::file(Vec::new()));
            }
        }

        Ok(Box::new(MockFile {
            files: Arc::clone(&self.files),
            path,
            pos: 0,
            writable: true,
        }))
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn File>> {
        let path = self.normalize_path(path);
        match self.entries().get(&path) {
            None => return Err(not_found(&path)),
            Some(entry) if entry.file_type == FileType::Directory => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("Is a directory: {:?}", path),
                ));
            }
            Some(_) => {}
        }

        Ok(Box::new(MockFile {
            files: Arc::clone(&self.files),
            path,
            pos: 0,
            writable: false,
        }))
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        let path = self.normalize_path(path);
        let mut files = self.entries_mut();

        let is_dir = match files.get(&path) {
            None => return Err(not_found(&path)),
            Some(entry) => entry.file_type == FileType::Directory,
        };
        if is_dir && !Self::children(&files, &path).is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("Directory not empty: {:?}", path),
            ));
        }

        files.remove(&path);
        Ok(())
    }

    fn rename(&self, old: &Path, new: &Path) -> io::Result<()> {
        let old = self.normalize_path(old);
        let new = self.normalize_path(new);
        let mut files = self.entries_mut();

        let old_is_dir = match files.get(&old) {
            None => return Err(not_found(&old)),
            Some(entry) => entry.file_type == FileType::Directory,
        };
        let parent_is_dir = new
            .parent()
            .and_then(|p| files.get(p))
            .is_some_and(|e| e.file_type == FileType::Directory);
        if !parent_is_dir {
            return Err(not_found(&new));
        }
        if old == new {
            return Ok(());
        }
        if new.starts_with(&old) || old.starts_with(&new) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Cannot rename {:?} onto {:?}", old, new),
            ));
        }

        if let Some(target) = files.get(&new) {
            let target_is_dir = target.file_type == FileType::Directory;
            let reason = match (old_is_dir, target_is_dir) {
                (false, true) => Some("Is a directory"),
                (true, false) => Some("Not a directory"),
                (true, true) if !Self::children(&files, &new).is_empty() => {
                    Some("Directory not empty")
                }
                _ => None,
            };
            if let Some(reason) = reason {
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!("{}: {:?}", reason, new),
                ));
            }
        }

        let moved: Vec<PathBuf> = files
            .range(old.clone()..)
            .take_while(|(p, _)| p.starts_with(&old))
            .map(|(p, _)| p.clone())
            .collect();

        files.remove(&new);
        for from in moved {
            if let Some(entry) = files.remove(&from) {
                let rest = from.strip_prefix(&old).unwrap_or(Path::new(""));
                let to = if rest.as_os_str().is_empty() {
                    new.clone()
                } else {
                    new.join(rest)
                };
                files.insert(to, entry);
            }
        }
        Ok(())
    }

    fn try_exists(&self, path: &Path) -> io::Result<bool> {
        let path = self.normalize_path(path);
        Ok(self.entries().contains_key(&path))
    }

    fn mkdir_all(&self, path: &Path) -> io::Result<()> {
        let path = self.normalize_path(path);
        let mut files = self.entries_mut();

        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            match files.get(&current) {
                Some(entry) if entry.file_type != FileType::Directory => {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("Not a directory: {:?}", current),
                    ));
                }
                Some(_) => {}
                None => {
                    files.insert(current.clone(), MockEntry::dir());
                }
            }
        }
        Ok(())
    }

    fn chtimes(&self, path: &Path, atime: SystemTime, mtime: SystemTime) -> io::Result<()> {
        let path = self.normalize_path(path);
        let mut files = self.entries_mut();
        let entry = files.get_mut(&path).ok_or_else(|| not_found(&path))?;
        entry.accessed = atime;
        entry.modified = mtime;
        Ok(())
    }

    fn metadata(&self, path: &Path) -> io::Result<FileMetadata> {
        let path = self.normalize_path(path);
        self.entries()
            .get(&path)
            .map(MockEntry::metadata)
            .ok_or_else(|| not_found(&path))
    }

    fn walk(&self, root: &Path, visit: &mut WalkFn<'_>) -> io::Result<()> {
        let root = self.normalize_path(root);
        self.walk_entry(&root, visit).map(|_| ())
    }
}

/// Handle onto an entry of a [`MockFileSystem`]
pub struct MockFile {
    files: Arc<RwLock<Entries>>,
    path: PathBuf,
    pos: usize,
    writable: bool,
}

impl Read for MockFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        let entry = files.get(&self.path).ok_or_else(|| not_found(&self.path))?;
        let available = entry.content.get(self.pos..).unwrap_or(&[]);
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pos += n;
        Ok(n)
    }
}

impl Write for MockFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.writable {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("File opened read-only: {:?}", self.path),
            ));
        }

        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        let entry = files
            .get_mut(&self.path)
            .ok_or_else(|| not_found(&self.path))?;

        let end = self.pos + buf.len();
        if entry.content.len() < end {
            entry.content.resize(end, 0);
        }
        entry.content[self.pos..end].copy_from_slice(buf);
        entry.modified = SystemTime::now();
        self.pos = end;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl File for MockFile {
    fn name(&self) -> &Path {
        &self.path
    }

    fn size(&self) -> io::Result<u64> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files
            .get(&self.path)
            .map(|e| e.content.len() as u64)
            .ok_or_else(|| not_found(&self.path))
    }

    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}
