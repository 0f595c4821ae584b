use super::closer::{Close, CompositeCloser};
use super::File;
use memmap2::Mmap;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Reads a mapped byte range from a fixed starting offset
pub struct MappedReader {
    map: Mmap,
    pos: usize,
}

impl MappedReader {
    pub fn new(map: Mmap, offset: usize) -> Self {
        Self { map, pos: offset }
    }

    fn into_map(self) -> Mmap {
        self.map
    }
}

impl Read for MappedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.map.get(self.pos..).unwrap_or(&[]);
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pos += n;
        Ok(n)
    }
}

/// Where a [`RealFile`] reads its bytes from
pub enum ReadStrategy {
    /// Read through the descriptor
    Direct,
    /// Read from a memory mapping of the descriptor
    Mapped(MappedReader),
}

/// A file handle backed by an OS descriptor
pub struct RealFile {
    path: PathBuf,
    file: fs::File,
    reader: ReadStrategy,
}

impl RealFile {
    pub fn direct(path: PathBuf, file: fs::File) -> Self {
        Self {
            path,
            file,
            reader: ReadStrategy::Direct,
        }
    }

    pub fn mapped(path: PathBuf, file: fs::File, map: Mmap) -> Self {
        Self {
            path,
            file,
            reader: ReadStrategy::Mapped(MappedReader::new(map, 0)),
        }
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self.reader, ReadStrategy::Mapped(_))
    }
}

impl Read for RealFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.reader {
            ReadStrategy::Direct => self.file.read(buf),
            ReadStrategy::Mapped(reader) => reader.read(buf),
        }
    }
}

impl Write for RealFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl File for RealFile {
    fn name(&self) -> &Path {
        &self.path
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    fn sync(&mut self) -> io::Result<()> {
        self.file.sync_all()
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        let RealFile { file, reader, .. } = *self;
        match reader {
            ReadStrategy::Direct => Box::new(file).close(),
            ReadStrategy::Mapped(reader) => {
                let resources: Vec<Box<dyn Close>> =
                    vec![Box::new(reader.into_map()), Box::new(file)];
                Box::new(CompositeCloser::new(resources)).close()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Seek;

    fn map_bytes(content: &[u8]) -> (fs::File, Mmap) {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(content).unwrap();
        file.rewind().unwrap();
        let map = unsafe { Mmap::map(&file) }.unwrap();
        (file, map)
    }

    #[test]
    fn test_mapped_reader_reads_from_offset() {
        let (_file, map) = map_bytes(b"hello world");
        let mut reader = MappedReader::new(map, 6);

        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "world");
        assert_eq!(reader.read(&mut [0u8; 4]).unwrap(), 0);
    }

    #[test]
    fn test_mapped_reader_short_reads() {
        let (_file, map) = map_bytes(b"abcdef");
        let mut reader = MappedReader::new(map, 0);

        let mut buf = [0u8; 4];
        assert_eq!(reader.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(reader.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"ef");
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_mapped_reader_offset_past_end() {
        let (_file, map) = map_bytes(b"abc");
        let mut reader = MappedReader::new(map, 10);

        let mut buf = [0u8; 4];
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_real_file_mapped_close() {
        let (file, map) = map_bytes(b"payload");
        let mut handle = RealFile::mapped(PathBuf::from("payload"), file, map);
        assert!(handle.is_mapped());

        let mut out = Vec::new();
        handle.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"payload");
        assert_eq!(handle.size().unwrap(), 7);
        Box::new(handle).close().unwrap();
    }

    #[test]
    fn test_real_file_direct_write_and_size() {
        let file = tempfile::tempfile().unwrap();
        let mut handle = RealFile::direct(PathBuf::from("scratch"), file);
        assert!(!handle.is_mapped());
        assert_eq!(handle.name(), Path::new("scratch"));

        handle.write_all(b"12345").unwrap();
        handle.sync().unwrap();
        assert_eq!(handle.size().unwrap(), 5);
        Box::new(handle).close().unwrap();
    }
}
