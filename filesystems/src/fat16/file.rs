// FAT16 file handle
// Translates logical file offsets into physical reads across the cluster chain

use super::chain::ClusterChain;
use super::dir_entry::ShortEntry;
use super::volume::Volume;
use fatlens_core::{EndSeekPolicy, FatError, FatResult, StorageAccessor};
use log::{debug, warn};
use std::io;

/// Reference point for [`Fat16File::seek`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOrigin {
    Start,
    Current,
    End,
}

#[derive(Debug)]
enum HandleState {
    Open { chain: ClusterChain },
    Closed,
}

/// An open regular file
///
/// Borrows the volume immutably, so any number of handles can read the same
/// volume; each handle owns its cursor and cluster chain.
pub struct Fat16File<'v, S: StorageAccessor> {
    volume: &'v Volume<S>,
    name: String,
    size: u64,
    offset: u64,
    state: HandleState,
}

impl<'v, S: StorageAccessor> Fat16File<'v, S> {
    /// Open the file described by `entry`
    pub fn open(volume: &'v Volume<S>, entry: &ShortEntry) -> FatResult<Self> {
        let name = entry.display_name();
        if entry.is_directory() || entry.is_volume_label() {
            return Err(FatError::IsDirectory(name));
        }

        let chain = volume.resolve_chain(entry.first_cluster()?)?;
        let size = entry.file_size as u64;
        let capacity = chain.capacity_bytes(volume.geometry().cluster_size_bytes());
        if capacity < size {
            warn!(
                "{} declares {} bytes but its chain only covers {}",
                name, size, capacity
            );
        }
        debug!("Opened {} ({} bytes, {} clusters)", name, size, chain.len());

        Ok(Self {
            volume,
            name,
            size,
            offset: 0,
            state: HandleState::Open { chain },
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared file size in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn position(&self) -> u64 {
        self.offset
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, HandleState::Closed)
    }

    pub fn chain(&self) -> FatResult<&ClusterChain> {
        match &self.state {
            HandleState::Open { chain } => Ok(chain),
            HandleState::Closed => Err(FatError::Closed),
        }
    }

    /// Move the cursor; returns the new position
    ///
    /// Positions past the end are allowed and read as empty. A position
    /// below zero fails with `InvalidOffset`.
    pub fn seek(&mut self, delta: i64, origin: SeekOrigin) -> FatResult<u64> {
        self.chain()?;

        let candidate = match origin {
            SeekOrigin::Start => delta as i128,
            SeekOrigin::Current => self.offset as i128 + delta as i128,
            SeekOrigin::End => match self.volume.config().end_seek {
                EndSeekPolicy::Relative => self.size as i128 + delta as i128,
                EndSeekPolicy::ClampToEnd => self.size as i128,
            },
        };

        let new_offset = u64::try_from(candidate).map_err(|_| FatError::InvalidOffset(candidate))?;
        self.offset = new_offset;
        Ok(new_offset)
    }

    /// Read up to `buf.len()` bytes at the cursor
    ///
    /// Reads never extend past the declared size. Returns 0 at or past the
    /// end. The cursor only moves when the whole read succeeds.
    pub fn read(&mut self, buf: &mut [u8]) -> FatResult<usize> {
        let chain = self.chain()?;
        if self.offset >= self.size {
            return Ok(0);
        }

        let length = (buf.len() as u64).min(self.size - self.offset) as usize;
        let geometry = self.volume.geometry();
        let cluster_size = geometry.cluster_size_bytes();

        let mut cluster_index = (self.offset / cluster_size) as usize;
        let mut intra_offset = self.offset % cluster_size;
        let mut done = 0usize;

        while done < length {
            let cluster = chain.get(cluster_index).ok_or_else(|| {
                FatError::CorruptChain(format!(
                    "{} declares {} bytes but its chain ends after {} clusters",
                    self.name,
                    self.size,
                    chain.len()
                ))
            })?;

            let physical = geometry.cluster_to_physical_offset(cluster)? + intra_offset;
            let step = ((length - done) as u64).min(cluster_size - intra_offset) as usize;
            let data = self.volume.read_exact_at(physical, step)?;
            buf[done..done + step].copy_from_slice(&data);

            done += step;
            cluster_index += 1;
            intra_offset = 0;
        }

        self.offset += done as u64;
        Ok(done)
    }

    /// Read `length` bytes (or fewer at end of file) into a new buffer
    pub fn read_bytes(&mut self, length: usize) -> FatResult<Vec<u8>> {
        let available = self.size.saturating_sub(self.offset).min(length as u64) as usize;
        let mut buf = vec![0u8; available];
        let n = self.read(&mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }

    /// Read from the cursor to the end of the file
    pub fn read_to_end(&mut self) -> FatResult<Vec<u8>> {
        let remaining = self.size.saturating_sub(self.offset) as usize;
        self.read_bytes(remaining)
    }

    /// Release the chain. Every later call, including another close,
    /// fails with `Closed`.
    pub fn close(&mut self) -> FatResult<()> {
        match std::mem::replace(&mut self.state, HandleState::Closed) {
            HandleState::Open { .. } => {
                debug!("Closed {}", self.name);
                Ok(())
            }
            HandleState::Closed => Err(FatError::Closed),
        }
    }
}

fn to_io_error(error: FatError) -> io::Error {
    match error {
        FatError::Io(e) => e,
        FatError::ShortRead { .. } => io::Error::new(io::ErrorKind::UnexpectedEof, error),
        FatError::InvalidOffset(_) => io::Error::new(io::ErrorKind::InvalidInput, error),
        other => io::Error::new(io::ErrorKind::Other, other),
    }
}

impl<S: StorageAccessor> io::Read for Fat16File<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Fat16File::read(self, buf).map_err(to_io_error)
    }
}

impl<S: StorageAccessor> io::Seek for Fat16File<'_, S> {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        match pos {
            io::SeekFrom::Start(offset) => {
                self.chain().map_err(to_io_error)?;
                self.offset = offset;
                Ok(offset)
            }
            io::SeekFrom::Current(delta) => {
                Fat16File::seek(self, delta, SeekOrigin::Current).map_err(to_io_error)
            }
            io::SeekFrom::End(delta) => {
                Fat16File::seek(self, delta, SeekOrigin::End).map_err(to_io_error)
            }
        }
    }
}
