// FAT16 volume
// Boot sector, geometry and FAT loaded once, then shared read-only by every open file

use super::boot_sector::BootSector;
use super::chain::{resolve_chain, ClusterChain};
use super::directory::{parse_directory, DirEntry, DirectoryIter};
use super::fat_table::FatTable;
use super::file::Fat16File;
use super::geometry::Geometry;
use crate::fat_common::constants::{BOOT_SECTOR_READ_LEN, FIRST_DATA_CLUSTER};
use fatlens_core::{FatError, FatResult, ImageFile, ReaderConfig, StorageAccessor};
use log::{debug, info, warn};
use serde::Serialize;
use std::path::Path;

/// Summary of a loaded volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeInfo {
    pub fs_type: String,
    pub label: Option<String>,
    pub oem_name: String,
    pub volume_id: u32,
    pub bytes_per_sector: u64,
    pub cluster_size: u64,
    pub total_bytes: u64,
    pub free_bytes: u64,
}

#[derive(Debug)]
pub struct Volume<S: StorageAccessor> {
    accessor: S,
    boot_sector: BootSector,
    geometry: Geometry,
    fat: FatTable,
    config: ReaderConfig,
}

impl Volume<ImageFile> {
    /// Open an image file and load the volume it contains
    pub fn open_image<P: AsRef<Path>>(path: P, config: ReaderConfig) -> FatResult<Self> {
        let image = ImageFile::open(path)?;
        Self::load(image, config)
    }
}

impl<S: StorageAccessor> Volume<S> {
    /// Decode the boot sector and load the FAT
    pub fn load(accessor: S, config: ReaderConfig) -> FatResult<Self> {
        let boot_len = accessor
            .len()
            .map_or(BOOT_SECTOR_READ_LEN, |len| len.min(BOOT_SECTOR_READ_LEN as u64) as usize);
        let boot_data = accessor.read_at(0, boot_len)?;
        let boot_sector = BootSector::parse(&boot_data)?;
        let geometry = Geometry::new(&boot_sector)?;

        info!("FAT16 volume details:");
        info!("  Bytes per sector: {}", boot_sector.bytes_per_sector);
        info!("  Sectors per cluster: {}", boot_sector.sectors_per_cluster);
        info!("  Root entries: {}", boot_sector.root_entries);
        info!("  FAT offset: {:#x}", geometry.fat_region_offset());
        info!("  Root directory offset: {:#x}", geometry.directory_region_offset());
        info!("  Data region offset: {:#x}", geometry.data_region_offset());
        info!("  Data clusters: {}", geometry.data_cluster_count());

        if let Some(len) = accessor.len() {
            if len < geometry.volume_size_bytes() {
                warn!(
                    "Image is {} bytes but the boot sector declares {}; reads near the end will fail",
                    len,
                    geometry.volume_size_bytes()
                );
            }
        }

        let fat = FatTable::load(&geometry, &accessor)?;
        if (fat.len() as u64) < geometry.data_cluster_count() + FIRST_DATA_CLUSTER as u64 {
            warn!(
                "FAT has {} entries, fewer than the {} data clusters need",
                fat.len(),
                geometry.data_cluster_count()
            );
        }

        Ok(Self {
            accessor,
            boot_sector,
            geometry,
            fat,
            config,
        })
    }

    pub fn boot_sector(&self) -> &BootSector {
        &self.boot_sector
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn fat(&self) -> &FatTable {
        &self.fat
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn accessor(&self) -> &S {
        &self.accessor
    }

    /// Read through the accessor, holding it to its exact-length contract
    pub(crate) fn read_exact_at(&self, offset: u64, len: usize) -> FatResult<Vec<u8>> {
        let data = self.accessor.read_at(offset, len)?;
        if data.len() != len {
            return Err(FatError::ShortRead {
                offset,
                expected: len,
                actual: data.len(),
            });
        }
        Ok(data)
    }

    pub fn resolve_chain(&self, start_cluster: u16) -> FatResult<ClusterChain> {
        resolve_chain(&self.fat, start_cluster)
    }

    /// Entries of the fixed root directory region
    pub fn root_directory(&self) -> FatResult<Vec<DirEntry>> {
        parse_directory(&self.root_directory_bytes()?, &self.config)
    }

    /// Entries of a subdirectory, read through its cluster chain
    ///
    /// A ".." entry with cluster 0 refers to the root directory.
    pub fn read_directory(&self, dir: &DirEntry) -> FatResult<Vec<DirEntry>> {
        parse_directory(&self.directory_bytes(dir)?, &self.config)
    }

    fn root_directory_bytes(&self) -> FatResult<Vec<u8>> {
        let offset = self.geometry.directory_region_offset();
        let size = self.geometry.directory_region_size_bytes() as usize;
        debug!("Reading root directory at offset {:#x}, size: {}", offset, size);
        self.read_exact_at(offset, size)
    }

    fn directory_bytes(&self, dir: &DirEntry) -> FatResult<Vec<u8>> {
        if !dir.is_directory() || dir.is_volume_label() {
            return Err(FatError::NotADirectory(dir.name.clone()));
        }

        let start = dir.entry.first_cluster()?;
        if start < FIRST_DATA_CLUSTER {
            return self.root_directory_bytes();
        }

        let chain = self.resolve_chain(start)?;
        let cluster_size = self.geometry.cluster_size_bytes() as usize;
        let mut data = Vec::with_capacity(chain.len() * cluster_size);
        for &cluster in chain.clusters() {
            let offset = self.geometry.cluster_to_physical_offset(cluster)?;
            data.extend_from_slice(&self.read_exact_at(offset, cluster_size)?);
        }

        debug!("Directory {} spans {} cluster(s)", dir.name, chain.len());
        Ok(data)
    }

    /// Scan a directory buffer for `name`
    ///
    /// Entries whose names fail to decode are skipped so they cannot hide
    /// their siblings. When nothing matches, the first such failure is
    /// returned, since the undecodable entry may be the one asked for.
    fn find_entry(&self, data: &[u8], name: &str) -> FatResult<Option<DirEntry>> {
        let mut undecodable = None;
        for item in DirectoryIter::new(data, &self.config) {
            match item {
                Ok(entry) if !entry.is_volume_label() && entry.matches(name) => {
                    return Ok(Some(entry))
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("Skipping undecodable entry while looking for {}: {}", name, e);
                    undecodable.get_or_insert(e);
                }
            }
        }

        undecodable.map_or(Ok(None), Err)
    }

    /// Find an entry by slash-separated path, matching long or short names
    /// case-insensitively
    pub fn lookup(&self, path: &str) -> FatResult<DirEntry> {
        let components: Vec<&str> = path
            .split(['/', '\\'])
            .filter(|c| !c.is_empty() && *c != ".")
            .collect();
        let Some((last, parents)) = components.split_last() else {
            return Err(FatError::NotFound(format!("empty path {:?}", path)));
        };

        let mut data = self.root_directory_bytes()?;
        for component in parents {
            let dir = self
                .find_entry(&data, component)?
                .ok_or_else(|| FatError::NotFound(format!("{} (in {})", component, path)))?;
            data = self.directory_bytes(&dir)?;
        }

        self.find_entry(&data, last)?
            .ok_or_else(|| FatError::NotFound(path.to_string()))
    }

    /// Open a regular file entry
    pub fn open(&self, entry: &DirEntry) -> FatResult<Fat16File<'_, S>> {
        Fat16File::open(self, &entry.entry)
    }

    pub fn open_path(&self, path: &str) -> FatResult<Fat16File<'_, S>> {
        let entry = self.lookup(path)?;
        self.open(&entry)
    }

    /// Volume label from the root directory, falling back to the boot sector
    pub fn label(&self) -> FatResult<Option<String>> {
        let data = self.root_directory_bytes()?;
        let from_root = DirectoryIter::new(&data, &self.config)
            .filter_map(Result::ok)
            .find(|e| e.is_volume_label())
            .map(|e| e.name);
        let label = from_root.unwrap_or_else(|| self.boot_sector.volume_label());

        Ok(if label.is_empty() || label == "NO NAME" {
            None
        } else {
            Some(label)
        })
    }

    pub fn info(&self) -> FatResult<VolumeInfo> {
        let cluster_size = self.geometry.cluster_size_bytes();
        let data_clusters = self.geometry.data_cluster_count();

        Ok(VolumeInfo {
            fs_type: self.boot_sector.fs_type(),
            label: self.label()?,
            oem_name: self.boot_sector.oem_name(),
            volume_id: self.boot_sector.volume_id,
            bytes_per_sector: self.geometry.bytes_per_sector(),
            cluster_size,
            total_bytes: data_clusters * cluster_size,
            free_bytes: self.fat.free_clusters(data_clusters) * cluster_size,
        })
    }
}
