//! FileSystem abstraction over the host OS, with an in-memory double for tests

mod closer;
mod file;
mod mock;
mod real;
mod r#trait;

pub use closer::{Close, CompositeCloser};
pub use file::{MappedReader, ReadStrategy, RealFile};
pub use mock::{MockEntry, MockFile, MockFileSystem};
pub use r#trait::{File, FileMetadata, FileSystem, FileType, Visit, WalkFn};
pub use real::{RealFileSystem, MKDIR_ALL_MODE};
