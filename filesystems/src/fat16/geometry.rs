// Volume geometry derived from the boot sector
// Every byte offset the reader touches is computed here

use super::boot_sector::BootSector;
use crate::fat_common::constants::{
    DIR_ENTRY_SIZE, FAT16_ENTRY_SIZE, FAT16_MAX_ENTRIES, FIRST_DATA_CLUSTER,
};
use fatlens_core::{FatError, FatResult};

/// Byte-level layout of a FAT16 volume
///
/// ```text
/// | reserved | FAT #1 .. FAT #n | root directory | data region (cluster 2 ...) |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    bytes_per_sector: u64,
    sectors_per_cluster: u64,
    reserved_sectors: u64,
    num_fats: u64,
    sectors_per_fat: u64,
    root_entries: u64,
    total_sectors: u64,
}

impl Geometry {
    pub fn new(boot_sector: &BootSector) -> FatResult<Self> {
        let geometry = Self {
            bytes_per_sector: boot_sector.bytes_per_sector as u64,
            sectors_per_cluster: boot_sector.sectors_per_cluster as u64,
            reserved_sectors: boot_sector.reserved_sectors as u64,
            num_fats: boot_sector.num_fats as u64,
            sectors_per_fat: boot_sector.sectors_per_fat as u64,
            root_entries: boot_sector.root_entries as u64,
            total_sectors: boot_sector.total_sectors() as u64,
        };

        if geometry.cluster_size_bytes() == 0 {
            return Err(FatError::MalformedVolume("cluster size is zero".into()));
        }
        if geometry.fat_entry_count() > FAT16_MAX_ENTRIES {
            return Err(FatError::MalformedVolume(format!(
                "FAT holds {} entries, more than 16-bit cluster numbers address",
                geometry.fat_entry_count()
            )));
        }
        if geometry.data_region_offset() > geometry.volume_size_bytes() {
            return Err(FatError::MalformedVolume(format!(
                "data region starts at {:#x}, past the end of a {} byte volume",
                geometry.data_region_offset(),
                geometry.volume_size_bytes()
            )));
        }

        Ok(geometry)
    }

    pub fn bytes_per_sector(&self) -> u64 {
        self.bytes_per_sector
    }

    pub fn num_fats(&self) -> u64 {
        self.num_fats
    }

    pub fn root_entries(&self) -> u64 {
        self.root_entries
    }

    pub fn volume_size_bytes(&self) -> u64 {
        self.total_sectors * self.bytes_per_sector
    }

    pub fn fat_region_offset(&self) -> u64 {
        self.reserved_sectors * self.bytes_per_sector
    }

    /// Size of one FAT copy
    pub fn fat_size_bytes(&self) -> u64 {
        self.sectors_per_fat * self.bytes_per_sector
    }

    /// Number of 16-bit entries in one FAT copy
    pub fn fat_entry_count(&self) -> u64 {
        self.fat_size_bytes() / FAT16_ENTRY_SIZE as u64
    }

    pub fn directory_region_offset(&self) -> u64 {
        self.fat_region_offset() + self.fat_size_bytes() * self.num_fats
    }

    pub fn directory_region_size_bytes(&self) -> u64 {
        self.root_entries * DIR_ENTRY_SIZE as u64
    }

    /// The root directory occupies whole sectors; the data region starts
    /// on the next sector boundary.
    pub fn data_region_offset(&self) -> u64 {
        let root_sectors = self.directory_region_size_bytes().div_ceil(self.bytes_per_sector);
        self.directory_region_offset() + root_sectors * self.bytes_per_sector
    }

    pub fn cluster_size_bytes(&self) -> u64 {
        self.sectors_per_cluster * self.bytes_per_sector
    }

    /// Clusters that fit in the data region
    pub fn data_cluster_count(&self) -> u64 {
        self.volume_size_bytes().saturating_sub(self.data_region_offset()) / self.cluster_size_bytes()
    }

    /// Highest cluster number backed by the data region
    pub fn max_cluster(&self) -> u64 {
        self.data_cluster_count() + FIRST_DATA_CLUSTER as u64 - 1
    }

    /// Absolute byte offset of a data cluster
    pub fn cluster_to_physical_offset(&self, cluster: u16) -> FatResult<u64> {
        if cluster < FIRST_DATA_CLUSTER {
            return Err(FatError::CorruptChain(format!(
                "cluster {} does not map into the data region",
                cluster
            )));
        }
        if cluster as u64 > self.max_cluster() {
            return Err(FatError::CorruptChain(format!(
                "cluster {} is beyond the last data cluster {}",
                cluster,
                self.max_cluster()
            )));
        }

        Ok(self.data_region_offset()
            + (cluster - FIRST_DATA_CLUSTER) as u64 * self.cluster_size_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::ImageBuilder;

    fn geometry_of(builder: &ImageBuilder) -> Geometry {
        Geometry::new(&BootSector::parse(&builder.boot_sector()).unwrap()).unwrap()
    }

    #[test]
    fn test_region_offsets() {
        let builder = ImageBuilder::new();
        let g = geometry_of(&builder);

        assert_eq!(g.fat_region_offset(), 512);
        assert_eq!(g.fat_size_bytes(), 16 * 512);
        assert_eq!(g.fat_entry_count(), 16 * 512 / 2);
        assert_eq!(g.directory_region_offset(), 512 + 2 * 16 * 512);
        assert_eq!(g.directory_region_size_bytes(), 512 * 32);
        assert_eq!(g.data_region_offset(), builder.data_offset());
        assert_eq!(g.data_cluster_count(), 64);
    }

    #[test]
    fn test_cluster_size_and_first_cluster() {
        for (bps, spc) in [(512u16, 1u8), (512, 3), (1024, 2), (4096, 8)] {
            let builder = ImageBuilder::new().bytes_per_sector(bps).sectors_per_cluster(spc);
            let g = geometry_of(&builder);
            assert_eq!(g.cluster_size_bytes(), bps as u64 * spc as u64);
            assert_eq!(g.cluster_to_physical_offset(2).unwrap(), g.data_region_offset());
            assert_eq!(
                g.cluster_to_physical_offset(5).unwrap(),
                g.data_region_offset() + 3 * g.cluster_size_bytes()
            );
        }
    }

    #[test]
    fn test_reserved_clusters_do_not_map() {
        let g = geometry_of(&ImageBuilder::new());
        assert!(matches!(g.cluster_to_physical_offset(0), Err(FatError::CorruptChain(_))));
        assert!(matches!(g.cluster_to_physical_offset(1), Err(FatError::CorruptChain(_))));
        assert!(g.cluster_to_physical_offset(65).is_ok());
        assert!(matches!(g.cluster_to_physical_offset(66), Err(FatError::CorruptChain(_))));
    }

    #[test]
    fn test_unaligned_root_rounds_to_sector() {
        // 20 entries = 640 bytes = 1.25 sectors
        let builder = ImageBuilder::new().root_entries(20);
        let g = geometry_of(&builder);
        assert_eq!(g.directory_region_size_bytes(), 640);
        assert_eq!(g.data_region_offset(), g.directory_region_offset() + 1024);
    }

    #[test]
    fn test_oversized_fat_is_malformed() {
        // 257 sectors of 256 entries each
        let builder = ImageBuilder::new().sectors_per_fat(257);
        let bs = BootSector::parse(&builder.boot_sector()).unwrap();
        assert!(matches!(Geometry::new(&bs), Err(FatError::MalformedVolume(_))));

        // Exactly one entry per cluster number is fine
        let g = geometry_of(&ImageBuilder::new().sectors_per_fat(256));
        assert_eq!(g.fat_entry_count(), FAT16_MAX_ENTRIES);
    }

    #[test]
    fn test_volume_too_small_for_layout() {
        let builder = ImageBuilder::new().total_sectors(10);
        let bs = BootSector::parse(&builder.boot_sector()).unwrap();
        assert!(matches!(Geometry::new(&bs), Err(FatError::MalformedVolume(_))));
    }
}
