use super::file::RealFile;
use super::{File, FileMetadata, FileSystem, Visit, WalkFn};
use crate::config::FsConfig;
use filetime::FileTime;
use memmap2::Mmap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Permission bits for directories created by `mkdir_all`
pub const MKDIR_ALL_MODE: u32 = 0o755;

/// Disk-backed file system with optional memory-mapped reads
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFileSystem {
    use_mmap: bool,
}

impl RealFileSystem {
    pub fn new(use_mmap: bool) -> Self {
        Self { use_mmap }
    }

    pub fn from_config(config: &FsConfig) -> Self {
        Self::new(config.use_mmap)
    }

    pub fn uses_mmap(&self) -> bool {
        self.use_mmap
    }
}

fn map_file(file: &fs::File) -> io::Result<Mmap> {
    let meta = file.metadata()?;
    if !meta.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "cannot memory-map a non-regular file",
        ));
    }
    if meta.len() == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "cannot memory-map an empty file",
        ));
    }
    // SAFETY: the mapping is read-only and owned by the handle alongside the
    // descriptor. Truncation by another process while mapped is not guarded.
    unsafe { Mmap::map(file) }
}

impl FileSystem for RealFileSystem {
    fn create(&self, path: &Path) -> io::Result<Box<dyn File>> {
        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        debug!(path = %path.display(), "Created file");
        Ok(Box::new(RealFile::direct(path.to_path_buf(), file)))
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn File>> {
        let file = fs::File::open(path)?;
        if !self.use_mmap {
            debug!(path = %path.display(), "Opened file for direct reads");
            return Ok(Box::new(RealFile::direct(path.to_path_buf(), file)));
        }

        match map_file(&file) {
            Ok(map) => {
                debug!(path = %path.display(), len = map.len(), "Opened file for mapped reads");
                Ok(Box::new(RealFile::mapped(path.to_path_buf(), file, map)))
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to memory-map file");
                drop(file);
                Err(e)
            }
        }
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        match fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => fs::remove_dir(path),
            _ => fs::remove_file(path),
        }
    }

    fn rename(&self, old: &Path, new: &Path) -> io::Result<()> {
        fs::rename(old, new)
    }

    fn try_exists(&self, path: &Path) -> io::Result<bool> {
        match fs::metadata(path) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn mkdir_all(&self, path: &Path) -> io::Result<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(MKDIR_ALL_MODE);
        }
        builder.create(path)
    }

    fn chtimes(&self, path: &Path, atime: SystemTime, mtime: SystemTime) -> io::Result<()> {
        filetime::set_file_times(
            path,
            FileTime::from_system_time(atime),
            FileTime::from_system_time(mtime),
        )
    }

    fn metadata(&self, path: &Path) -> io::Result<FileMetadata> {
        fs::metadata(path).map(FileMetadata::from)
    }

    fn walk(&self, root: &Path, visit: &mut WalkFn<'_>) -> io::Result<()> {
        let mut entries = WalkDir::new(root)
            .follow_links(false)
            .follow_root_links(false)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = entries.next() {
            let (path, meta): (PathBuf, io::Result<FileMetadata>) = match entry {
                Ok(entry) => {
                    let meta = entry
                        .metadata()
                        .map(FileMetadata::from)
                        .map_err(io::Error::from);
                    (entry.into_path(), meta)
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| root.to_path_buf());
                    debug!(path = %path.display(), error = %e, "Walk error handed to visitor");
                    (path, Err(io::Error::from(e)))
                }
            };

            let failed = meta.is_err();
            match visit(&path, meta)? {
                Visit::Continue => {}
                // SkipDir answered to an error entry moves on to the next sibling.
                Visit::SkipDir if failed => {}
                Visit::SkipDir => entries.skip_current_dir(),
                Visit::SkipAll => break,
            }
        }

        Ok(())
    }
}
