// FAT16 boot sector / BIOS parameter block decoding

use crate::fat_common::constants::*;
use byteorder::{ByteOrder, LittleEndian};
use fatlens_core::{FatError, FatResult};
use log::{debug, warn};

/// Decoded FAT16 boot sector. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootSector {
    pub jump_boot: [u8; 3],
    pub oem_name: [u8; 8],
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub num_fats: u8,
    pub root_entries: u16,
    pub total_sectors_16: u16,
    pub media_descriptor: u8,
    pub sectors_per_fat: u16,
    pub sectors_per_track: u16,
    pub num_heads: u16,
    pub hidden_sectors: u32,
    pub total_sectors_32: u32,
    pub drive_number: u8,
    pub boot_signature: u8,
    pub volume_id: u32,
    /// Space-padded, not NUL-terminated
    pub volume_label: [u8; 11],
    pub fs_type: [u8; 8],
    /// Whether 0x55AA was present at offset 510
    pub has_boot_signature: bool,
}

impl BootSector {
    /// Decode the BPB from the first bytes of the volume
    pub fn parse(data: &[u8]) -> FatResult<Self> {
        if data.len() < BPB_REGION_LEN {
            return Err(FatError::MalformedVolume(format!(
                "boot sector truncated: {} bytes, need at least {}",
                data.len(),
                BPB_REGION_LEN
            )));
        }

        let mut jump_boot = [0u8; 3];
        jump_boot.copy_from_slice(&data[BS_JMP_BOOT..BS_JMP_BOOT + 3]);
        let mut oem_name = [0u8; 8];
        oem_name.copy_from_slice(&data[BS_OEM_NAME..BS_OEM_NAME + 8]);
        let mut volume_label = [0u8; 11];
        volume_label.copy_from_slice(&data[BS16_VOL_LAB..BS16_VOL_LAB + 11]);
        let mut fs_type = [0u8; 8];
        fs_type.copy_from_slice(&data[BS16_FIL_SYS_TYPE..BS16_FIL_SYS_TYPE + 8]);

        let has_boot_signature = data.len() >= BOOT_SIGNATURE_OFFSET + 2
            && data[BOOT_SIGNATURE_OFFSET..BOOT_SIGNATURE_OFFSET + 2] == BOOT_SIGNATURE;

        let boot_sector = Self {
            jump_boot,
            oem_name,
            bytes_per_sector: LittleEndian::read_u16(&data[BPB_BYTES_PER_SEC..]),
            sectors_per_cluster: data[BPB_SEC_PER_CLUS],
            reserved_sectors: LittleEndian::read_u16(&data[BPB_RSVD_SEC_CNT..]),
            num_fats: data[BPB_NUM_FATS],
            root_entries: LittleEndian::read_u16(&data[BPB_ROOT_ENT_CNT..]),
            total_sectors_16: LittleEndian::read_u16(&data[BPB_TOT_SEC16..]),
            media_descriptor: data[BPB_MEDIA],
            sectors_per_fat: LittleEndian::read_u16(&data[BPB_FAT_SZ16..]),
            sectors_per_track: LittleEndian::read_u16(&data[BPB_SEC_PER_TRK..]),
            num_heads: LittleEndian::read_u16(&data[BPB_NUM_HEADS..]),
            hidden_sectors: LittleEndian::read_u32(&data[BPB_HIDD_SEC..]),
            total_sectors_32: LittleEndian::read_u32(&data[BPB_TOT_SEC32..]),
            drive_number: data[BS16_DRV_NUM],
            boot_signature: data[BS16_BOOT_SIG],
            volume_id: LittleEndian::read_u32(&data[BS16_VOL_ID..]),
            volume_label,
            fs_type,
            has_boot_signature,
        };

        boot_sector.validate()?;
        Ok(boot_sector)
    }

    fn validate(&self) -> FatResult<()> {
        if !VALID_BYTES_PER_SECTOR.contains(&self.bytes_per_sector) {
            return Err(FatError::MalformedVolume(format!(
                "bytes per sector is {}, expected 512, 1024, 2048 or 4096",
                self.bytes_per_sector
            )));
        }
        if self.sectors_per_cluster == 0 {
            return Err(FatError::MalformedVolume("sectors per cluster is zero".into()));
        }
        if self.reserved_sectors == 0 {
            return Err(FatError::MalformedVolume(
                "reserved sector count is zero; FAT would overlap the boot sector".into(),
            ));
        }
        if self.num_fats == 0 {
            return Err(FatError::MalformedVolume("no FAT copies".into()));
        }
        if self.sectors_per_fat == 0 {
            return Err(FatError::MalformedVolume(
                "FAT size is zero (FAT32 volume?)".into(),
            ));
        }
        if self.total_sectors() == 0 {
            return Err(FatError::MalformedVolume("total sector count is zero".into()));
        }

        if !self.sectors_per_cluster.is_power_of_two() {
            warn!("Unusual sectors per cluster: {}", self.sectors_per_cluster);
        }
        if !self.has_boot_signature {
            warn!("Boot sector signature 0x55AA missing");
        }
        if !self.fs_type.starts_with(b"FAT") {
            debug!("Filesystem type tag is {:?}", String::from_utf8_lossy(&self.fs_type));
        }

        Ok(())
    }

    /// Authoritative total sector count: the 16-bit field unless it is zero
    pub fn total_sectors(&self) -> u32 {
        if self.total_sectors_16 != 0 {
            self.total_sectors_16 as u32
        } else {
            self.total_sectors_32
        }
    }

    /// BPB volume label with the padding removed
    pub fn volume_label(&self) -> String {
        trim_padded(&self.volume_label)
    }

    /// Filesystem type tag, e.g. "FAT16"
    pub fn fs_type(&self) -> String {
        trim_padded(&self.fs_type)
    }

    pub fn oem_name(&self) -> String {
        trim_padded(&self.oem_name)
    }
}

fn trim_padded(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map_or(0, |p| p + 1);
    bytes[..end].iter().map(|&b| b as char).collect()
}
