// FAT16 file allocation table

use super::geometry::Geometry;
use crate::fat_common::constants::*;
use byteorder::{ByteOrder, LittleEndian};
use fatlens_core::{FatError, FatResult, StorageAccessor};
use log::debug;

/// Meaning of a single FAT16 entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatEntry {
    Free,
    Reserved,
    Next(u16),
    Bad(u16),
    EndOfChain,
}

impl From<u16> for FatEntry {
    fn from(value: u16) -> Self {
        match value {
            FAT16_FREE => FatEntry::Free,
            FAT16_RESERVED => FatEntry::Reserved,
            FIRST_DATA_CLUSTER..=FAT16_MAX_LINK => FatEntry::Next(value),
            FAT16_BAD_MIN..=FAT16_BAD_MAX => FatEntry::Bad(value),
            _ => FatEntry::EndOfChain,
        }
    }
}

/// First FAT copy, loaded verbatim and never modified
#[derive(Debug, Clone)]
pub struct FatTable {
    entries: Vec<u16>,
}

impl FatTable {
    /// Read the first FAT copy through the accessor
    pub fn load<S: StorageAccessor + ?Sized>(geometry: &Geometry, accessor: &S) -> FatResult<Self> {
        let offset = geometry.fat_region_offset();
        let size = geometry.fat_size_bytes() as usize;

        debug!("Loading FAT at offset {:#x}, {} bytes", offset, size);
        let raw = accessor.read_at(offset, size)?;
        if raw.len() != size {
            return Err(FatError::ShortRead {
                offset,
                expected: size,
                actual: raw.len(),
            });
        }

        Ok(Self::from_bytes(&raw))
    }

    /// Interpret little-endian bytes as FAT entries; a trailing odd byte is ignored
    pub fn from_bytes(raw: &[u8]) -> Self {
        let mut entries = vec![0u16; raw.len() / FAT16_ENTRY_SIZE];
        LittleEndian::read_u16_into(&raw[..entries.len() * FAT16_ENTRY_SIZE], &mut entries);
        Self { entries }
    }

    pub fn from_entries(entries: Vec<u16>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw entry for `cluster`
    pub fn entry_at(&self, cluster: u16) -> FatResult<u16> {
        self.entries.get(cluster as usize).copied().ok_or_else(|| {
            FatError::CorruptChain(format!(
                "cluster {} is outside the FAT ({} entries)",
                cluster,
                self.entries.len()
            ))
        })
    }

    pub fn entry(&self, cluster: u16) -> FatResult<FatEntry> {
        self.entry_at(cluster).map(FatEntry::from)
    }

    /// Free clusters among the first `data_clusters` data clusters
    pub fn free_clusters(&self, data_clusters: u64) -> u64 {
        let end = (data_clusters as usize + FIRST_DATA_CLUSTER as usize).min(self.entries.len());
        self.entries
            .get(FIRST_DATA_CLUSTER as usize..end)
            .map_or(0, |slice| slice.iter().filter(|&&e| e == FAT16_FREE).count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fat16::boot_sector::BootSector;
    use crate::test_helpers::ImageBuilder;
    use fatlens_core::MemoryImage;

    #[test]
    fn test_entry_classification() {
        assert_eq!(FatEntry::from(0x0000), FatEntry::Free);
        assert_eq!(FatEntry::from(0x0001), FatEntry::Reserved);
        assert_eq!(FatEntry::from(0x0002), FatEntry::Next(2));
        assert_eq!(FatEntry::from(0xFFEF), FatEntry::Next(0xFFEF));
        assert_eq!(FatEntry::from(0xFFF0), FatEntry::Bad(0xFFF0));
        assert_eq!(FatEntry::from(0xFFF7), FatEntry::Bad(0xFFF7));
        assert_eq!(FatEntry::from(0xFFF8), FatEntry::EndOfChain);
        assert_eq!(FatEntry::from(0xFFFF), FatEntry::EndOfChain);
    }

    #[test]
    fn test_load_reads_first_copy() {
        let mut builder = ImageBuilder::new();
        builder.set_fat(2, 3).set_fat(3, 0xFFFF).set_fat(7, 0xFFF7);
        let image = MemoryImage::new(builder.build());
        let bs = BootSector::parse(&builder.boot_sector()).unwrap();
        let geometry = Geometry::new(&bs).unwrap();

        let fat = FatTable::load(&geometry, &image).unwrap();
        assert_eq!(fat.len(), 16 * 512 / 2);
        assert_eq!(fat.entry_at(0).unwrap(), 0xFFF8);
        assert_eq!(fat.entry_at(2).unwrap(), 3);
        assert_eq!(fat.entry(3).unwrap(), FatEntry::EndOfChain);
        assert_eq!(fat.entry(7).unwrap(), FatEntry::Bad(0xFFF7));
        assert_eq!(fat.entry(4).unwrap(), FatEntry::Free);
    }

    #[test]
    fn test_entry_out_of_bounds() {
        let fat = FatTable::from_entries(vec![0xFFF8, 0xFFFF, 0xFFFF]);
        assert!(matches!(fat.entry_at(3), Err(FatError::CorruptChain(_))));
        assert!(matches!(fat.entry_at(u16::MAX), Err(FatError::CorruptChain(_))));
    }

    #[test]
    fn test_truncated_image_fails_with_io() {
        let builder = ImageBuilder::new();
        let image = MemoryImage::new(builder.boot_sector());
        let bs = BootSector::parse(&builder.boot_sector()).unwrap();
        let geometry = Geometry::new(&bs).unwrap();

        let err = FatTable::load(&geometry, &image).unwrap_err();
        assert!(err.is_io(), "unexpected error: {err}");
    }

    #[test]
    fn test_free_cluster_count() {
        let fat = FatTable::from_entries(vec![0xFFF8, 0xFFFF, 3, 0xFFFF, 0, 0, 0xFFF7, 0]);
        assert_eq!(fat.free_clusters(6), 3);
        assert_eq!(fat.free_clusters(2), 0);
        // Clamped to the table
        assert_eq!(fat.free_clusters(100), 3);
    }
}
