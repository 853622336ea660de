// Storage accessor abstraction
// The FAT16 reader never opens files itself; it pulls bytes through this trait

use crate::error::{FatError, FatResult};
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use log::trace;

/// Absolute, positioned byte access to a volume image
///
/// Implementations must return exactly `len` bytes or an error. A request
/// for zero bytes returns an empty buffer. Partial reads are reported as
/// [`FatError::ShortRead`], never padded.
pub trait StorageAccessor {
    fn read_at(&self, offset: u64, len: usize) -> FatResult<Vec<u8>>;

    /// Total size of the backing image, when known
    fn len(&self) -> Option<u64> {
        None
    }
}

impl<T: StorageAccessor + ?Sized> StorageAccessor for &T {
    fn read_at(&self, offset: u64, len: usize) -> FatResult<Vec<u8>> {
        (**self).read_at(offset, len)
    }

    fn len(&self) -> Option<u64> {
        (**self).len()
    }
}

impl<T: StorageAccessor + ?Sized> StorageAccessor for Box<T> {
    fn read_at(&self, offset: u64, len: usize) -> FatResult<Vec<u8>> {
        (**self).read_at(offset, len)
    }

    fn len(&self) -> Option<u64> {
        (**self).len()
    }
}

/// Accessor backed by an image file on disk
///
/// The seek and read pair is serialised behind a mutex so reads only need `&self`.
#[derive(Debug)]
pub struct ImageFile {
    path: PathBuf,
    file: Mutex<File>,
    size: u64,
}

impl ImageFile {
    /// Open an image read-only
    pub fn open<P: AsRef<Path>>(path: P) -> FatResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let size = file.metadata()?.len();
        trace!("Opened image {} ({} bytes)", path.display(), size);

        Ok(Self {
            path,
            file: Mutex::new(file),
            size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageAccessor for ImageFile {
    fn read_at(&self, offset: u64, len: usize) -> FatResult<Vec<u8>> {
        if len == 0 {
            return Ok(Vec::new());
        }

        trace!("Reading {} bytes at offset {:#x} from {}", len, offset, self.path.display());

        // Requests past the end of the image fail before anything is allocated
        if offset.saturating_add(len as u64) > self.size {
            return Err(FatError::ShortRead {
                offset,
                expected: len,
                actual: self.size.saturating_sub(offset).min(len as u64) as usize,
            });
        }

        let mut file = self
            .file
            .lock()
            .map_err(|_| FatError::Io(std::io::Error::new(ErrorKind::Other, "image lock poisoned")))?;
        file.seek(SeekFrom::Start(offset))?;

        let mut buffer = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            match file.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(FatError::Io(e)),
            }
        }

        if filled < len {
            return Err(FatError::ShortRead {
                offset,
                expected: len,
                actual: filled,
            });
        }

        Ok(buffer)
    }

    fn len(&self) -> Option<u64> {
        Some(self.size)
    }
}

/// Accessor over an in-memory image
#[derive(Debug, Clone, Default)]
pub struct MemoryImage {
    data: Vec<u8>,
}

impl MemoryImage {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for MemoryImage {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl StorageAccessor for MemoryImage {
    fn read_at(&self, offset: u64, len: usize) -> FatResult<Vec<u8>> {
        if len == 0 {
            return Ok(Vec::new());
        }

        let total = self.data.len() as u64;
        let start = offset.min(total) as usize;
        let end = offset.saturating_add(len as u64).min(total) as usize;
        if end - start < len {
            return Err(FatError::ShortRead {
                offset,
                expected: len,
                actual: end - start,
            });
        }

        Ok(self.data[start..end].to_vec())
    }

    fn len(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }
}
