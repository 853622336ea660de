// FAT16 module - boot sector, allocation table, directories and file reads

pub mod boot_sector;
pub mod chain;
pub mod dir_entry;
pub mod directory;
pub mod fat_table;
pub mod file;
pub mod geometry;
pub mod long_names;
pub mod volume;

pub use boot_sector::BootSector;
pub use chain::{resolve_chain, ClusterChain};
pub use dir_entry::{
    classify, format_short_name, lfn_checksum, DirSlot, FileAttributes, LongNameFragment,
    ShortEntry,
};
pub use directory::{parse_directory, DirEntry, DirectoryIter, EntrySummary};
pub use fat_table::{FatEntry, FatTable};
pub use file::{Fat16File, SeekOrigin};
pub use geometry::Geometry;
pub use long_names::reconstruct_long_name;
pub use volume::{Volume, VolumeInfo};
