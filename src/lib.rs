//! diskfs - filesystem abstraction with optional memory-mapped reads
//!
//! Code that stores or scans files depends on the [`FileSystem`] and [`File`]
//! traits instead of calling `std::fs` directly. [`RealFileSystem`] forwards
//! every operation to the host OS; [`MockFileSystem`] keeps everything in
//! memory so callers can be tested without touching disk.
//!
//! # Example
//!
//! ```no_run
//! use diskfs::{FileSystem, RealFileSystem};
//! use std::io::{Read, Write};
//! use std::path::Path;
//!
//! # fn main() -> std::io::Result<()> {
//! let fs = RealFileSystem::new(true);
//! fs.mkdir_all(Path::new("/tmp/segments"))?;
//!
//! let mut file = fs.create(Path::new("/tmp/segments/0001.log"))?;
//! file.write_all(b"first record\n")?;
//! file.close()?;
//!
//! // Served from a memory mapping because the adapter was built with `true`.
//! let mut file = fs.open(Path::new("/tmp/segments/0001.log"))?;
//! let mut content = String::new();
//! file.read_to_string(&mut content)?;
//! file.close()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod fs;
pub mod util;

pub use config::{ConfigError, FsConfig};
pub use fs::{
    File, FileMetadata, FileSystem, FileType, MockFileSystem, RealFileSystem, Visit, WalkFn,
};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_diskfs() {
        assert_eq!(NAME, "diskfs");
    }
}
