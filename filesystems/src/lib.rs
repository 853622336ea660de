// Read-only FAT16 volume interpretation

pub mod fat_common;
pub mod fat16;

#[cfg(test)]
pub mod test_helpers;

pub use fat16::{
    DirEntry, Fat16File, FatEntry, FatTable, FileAttributes, Geometry, SeekOrigin, Volume,
    VolumeInfo,
};
pub use fatlens_core::{
    EndSeekPolicy, FatError, FatResult, ImageFile, LongNamePolicy, MemoryImage, ReaderConfig,
    StorageAccessor,
};
