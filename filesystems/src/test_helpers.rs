// Test helpers for building FAT16 images in memory
// Self-contained so integration tests can pull it in with #[path]

use std::collections::BTreeMap;

pub const ATTR_VOLUME_ID: u8 = 0x08;
pub const ATTR_DIRECTORY: u8 = 0x10;
pub const ATTR_ARCHIVE: u8 = 0x20;
pub const ATTR_LONG_NAME: u8 = 0x0F;

/// Builds a FAT16 volume image with files laid out in contiguous clusters
/// unless the caller links the FAT by hand.
#[derive(Debug, Clone)]
pub struct ImageBuilder {
    bytes_per_sector: u16,
    sectors_per_cluster: u8,
    reserved_sectors: u16,
    num_fats: u8,
    root_entries: u16,
    sectors_per_fat: u16,
    data_clusters: u32,
    total_sectors: Option<u32>,
    label: [u8; 11],
    root_slots: Vec<[u8; 32]>,
    fat: BTreeMap<u16, u16>,
    clusters: BTreeMap<u16, Vec<u8>>,
    next_free: u16,
}

impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBuilder {
    pub fn new() -> Self {
        Self {
            bytes_per_sector: 512,
            sectors_per_cluster: 4,
            reserved_sectors: 1,
            num_fats: 2,
            root_entries: 512,
            sectors_per_fat: 16,
            data_clusters: 64,
            total_sectors: None,
            label: *b"NO NAME    ",
            root_slots: Vec::new(),
            fat: BTreeMap::new(),
            clusters: BTreeMap::new(),
            next_free: 2,
        }
    }

    pub fn bytes_per_sector(mut self, value: u16) -> Self {
        self.bytes_per_sector = value;
        self
    }

    pub fn sectors_per_cluster(mut self, value: u8) -> Self {
        self.sectors_per_cluster = value;
        self
    }

    pub fn root_entries(mut self, value: u16) -> Self {
        self.root_entries = value;
        self
    }

    pub fn sectors_per_fat(mut self, value: u16) -> Self {
        self.sectors_per_fat = value;
        self
    }

    pub fn total_sectors(mut self, value: u32) -> Self {
        self.total_sectors = Some(value);
        self
    }

    pub fn label(mut self, label: [u8; 11]) -> Self {
        self.label = label;
        self
    }

    pub fn cluster_size(&self) -> usize {
        self.bytes_per_sector as usize * self.sectors_per_cluster as usize
    }

    fn root_dir_sectors(&self) -> u32 {
        let bytes = self.root_entries as u32 * 32;
        (bytes + self.bytes_per_sector as u32 - 1) / self.bytes_per_sector as u32
    }

    fn fat_offset(&self) -> u64 {
        self.reserved_sectors as u64 * self.bytes_per_sector as u64
    }

    fn root_offset(&self) -> u64 {
        self.fat_offset()
            + self.num_fats as u64 * self.sectors_per_fat as u64 * self.bytes_per_sector as u64
    }

    pub fn data_offset(&self) -> u64 {
        self.root_offset() + self.root_dir_sectors() as u64 * self.bytes_per_sector as u64
    }

    fn cluster_offset(&self, cluster: u16) -> u64 {
        self.data_offset() + (cluster as u64 - 2) * self.cluster_size() as u64
    }

    fn computed_total_sectors(&self) -> u32 {
        self.total_sectors.unwrap_or_else(|| {
            self.reserved_sectors as u32
                + self.num_fats as u32 * self.sectors_per_fat as u32
                + self.root_dir_sectors()
                + self.data_clusters * self.sectors_per_cluster as u32
        })
    }

    /// Append a raw 32-byte slot to the root directory
    pub fn root_slot(&mut self, slot: [u8; 32]) -> &mut Self {
        self.root_slots.push(slot);
        self
    }

    /// Override a FAT entry
    pub fn set_fat(&mut self, cluster: u16, value: u16) -> &mut Self {
        self.fat.insert(cluster, value);
        self
    }

    /// Place raw bytes at the start of a cluster
    pub fn set_cluster_data(&mut self, cluster: u16, data: Vec<u8>) -> &mut Self {
        self.clusters.insert(cluster, data);
        if cluster >= self.next_free {
            self.next_free = cluster + 1;
        }
        self
    }

    /// Allocate a contiguous chain for `data` and link it in the FAT.
    /// Returns the first cluster, or 0 for empty data.
    pub fn alloc_chain(&mut self, data: &[u8]) -> u16 {
        if data.is_empty() {
            return 0;
        }
        let cluster_size = self.cluster_size();
        let count = (data.len() + cluster_size - 1) / cluster_size;
        let first = self.next_free;
        for i in 0..count {
            let cluster = first + i as u16;
            let next = if i + 1 == count { 0xFFFF } else { cluster + 1 };
            self.fat.insert(cluster, next);
            let start = i * cluster_size;
            let end = (start + cluster_size).min(data.len());
            self.clusters.insert(cluster, data[start..end].to_vec());
        }
        self.next_free = first + count as u16;
        first
    }

    /// Add a regular file to the root directory
    pub fn add_file(&mut self, name: &[u8; 11], data: &[u8]) -> u16 {
        let first = self.alloc_chain(data);
        self.root_slot(short_entry(name, ATTR_ARCHIVE, first, data.len() as u32));
        first
    }

    /// Add a regular file preceded by its long-name fragments
    pub fn add_long_file(&mut self, long_name: &str, short: &[u8; 11], data: &[u8]) -> u16 {
        for slot in lfn_entries(long_name, short) {
            self.root_slot(slot);
        }
        self.add_file(short, data)
    }

    pub fn boot_sector(&self) -> Vec<u8> {
        let mut bs = vec![0u8; self.bytes_per_sector.max(512) as usize];
        bs[0..3].copy_from_slice(&[0xEB, 0x3C, 0x90]);
        bs[3..11].copy_from_slice(b"FATLENS ");
        bs[11..13].copy_from_slice(&self.bytes_per_sector.to_le_bytes());
        bs[13] = self.sectors_per_cluster;
        bs[14..16].copy_from_slice(&self.reserved_sectors.to_le_bytes());
        bs[16] = self.num_fats;
        bs[17..19].copy_from_slice(&self.root_entries.to_le_bytes());
        let total = self.computed_total_sectors();
        if total < 65536 {
            bs[19..21].copy_from_slice(&(total as u16).to_le_bytes());
        } else {
            bs[32..36].copy_from_slice(&total.to_le_bytes());
        }
        bs[21] = 0xF8;
        bs[22..24].copy_from_slice(&self.sectors_per_fat.to_le_bytes());
        bs[24..26].copy_from_slice(&63u16.to_le_bytes());
        bs[26..28].copy_from_slice(&255u16.to_le_bytes());
        bs[36] = 0x80;
        bs[38] = 0x29;
        bs[39..43].copy_from_slice(&0x1234_5678u32.to_le_bytes());
        bs[43..54].copy_from_slice(&self.label);
        bs[54..62].copy_from_slice(b"FAT16   ");
        bs[510] = 0x55;
        bs[511] = 0xAA;
        bs
    }

    pub fn build(&self) -> Vec<u8> {
        let bps = self.bytes_per_sector as usize;
        let total_bytes = self.computed_total_sectors() as usize * bps;
        let mut image = vec![0u8; total_bytes];

        let bs = self.boot_sector();
        let bs_len = bs.len().min(total_bytes);
        image[..bs_len].copy_from_slice(&bs[..bs_len]);

        let fat_bytes = self.sectors_per_fat as usize * bps;
        let mut fat = vec![0u8; fat_bytes];
        fat[0..2].copy_from_slice(&0xFFF8u16.to_le_bytes());
        fat[2..4].copy_from_slice(&0xFFFFu16.to_le_bytes());
        for (&cluster, &value) in &self.fat {
            let at = cluster as usize * 2;
            if at + 2 <= fat.len() {
                fat[at..at + 2].copy_from_slice(&value.to_le_bytes());
            }
        }
        for copy in 0..self.num_fats as usize {
            let at = self.fat_offset() as usize + copy * fat_bytes;
            image[at..at + fat_bytes].copy_from_slice(&fat);
        }

        let root = self.root_offset() as usize;
        for (i, slot) in self.root_slots.iter().enumerate() {
            let at = root + i * 32;
            image[at..at + 32].copy_from_slice(slot);
        }

        for (&cluster, data) in &self.clusters {
            let at = self.cluster_offset(cluster) as usize;
            image[at..at + data.len()].copy_from_slice(data);
        }

        image
    }
}

/// Encode a short directory entry
pub fn short_entry(name: &[u8; 11], attributes: u8, first_cluster: u16, size: u32) -> [u8; 32] {
    let mut slot = [0u8; 32];
    slot[0..11].copy_from_slice(name);
    slot[11] = attributes;
    // 2024-01-15 14:30:58
    let date: u16 = ((2024 - 1980) << 9) | (1 << 5) | 15;
    let time: u16 = (14 << 11) | (30 << 5) | 29;
    slot[14..16].copy_from_slice(&time.to_le_bytes());
    slot[16..18].copy_from_slice(&date.to_le_bytes());
    slot[18..20].copy_from_slice(&date.to_le_bytes());
    slot[22..24].copy_from_slice(&time.to_le_bytes());
    slot[24..26].copy_from_slice(&date.to_le_bytes());
    slot[26..28].copy_from_slice(&first_cluster.to_le_bytes());
    slot[28..32].copy_from_slice(&size.to_le_bytes());
    slot
}

pub fn checksum(short_name: &[u8; 11]) -> u8 {
    let mut sum = 0u8;
    for &byte in short_name {
        sum = ((sum >> 1) | ((sum & 1) << 7)).wrapping_add(byte);
    }
    sum
}

/// Encode the long-name fragments for `long_name`, in on-disk order
/// (highest sequence first, flagged as last).
pub fn lfn_entries(long_name: &str, short_name: &[u8; 11]) -> Vec<[u8; 32]> {
    let sum = checksum(short_name);
    let mut units: Vec<u16> = long_name.encode_utf16().collect();
    let count = (units.len() + 12) / 13;
    if units.len() % 13 != 0 {
        units.push(0x0000);
    }
    units.resize(count * 13, 0xFFFF);

    let mut slots = Vec::with_capacity(count);
    for seq in (1..=count).rev() {
        let mut slot = [0u8; 32];
        slot[0] = seq as u8 | if seq == count { 0x40 } else { 0 };
        slot[11] = ATTR_LONG_NAME;
        slot[13] = sum;
        let chunk = &units[(seq - 1) * 13..seq * 13];
        let offsets = [1usize, 3, 5, 7, 9, 14, 16, 18, 20, 22, 24, 28, 30];
        for (unit, &at) in chunk.iter().zip(offsets.iter()) {
            slot[at..at + 2].copy_from_slice(&unit.to_le_bytes());
        }
        slots.push(slot);
    }
    slots
}
