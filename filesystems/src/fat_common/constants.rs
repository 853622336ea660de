// FAT16 on-disk layout constants

// Boot sector offsets
pub const BS_JMP_BOOT: usize = 0x00;
pub const BS_OEM_NAME: usize = 0x03;
pub const BPB_BYTES_PER_SEC: usize = 0x0B;
pub const BPB_SEC_PER_CLUS: usize = 0x0D;
pub const BPB_RSVD_SEC_CNT: usize = 0x0E;
pub const BPB_NUM_FATS: usize = 0x10;
pub const BPB_ROOT_ENT_CNT: usize = 0x11;
pub const BPB_TOT_SEC16: usize = 0x13;
pub const BPB_MEDIA: usize = 0x15;
pub const BPB_FAT_SZ16: usize = 0x16;
pub const BPB_SEC_PER_TRK: usize = 0x18;
pub const BPB_NUM_HEADS: usize = 0x1A;
pub const BPB_HIDD_SEC: usize = 0x1C;
pub const BPB_TOT_SEC32: usize = 0x20;

// FAT16 extended BPB
pub const BS16_DRV_NUM: usize = 0x24;
pub const BS16_BOOT_SIG: usize = 0x26;
pub const BS16_VOL_ID: usize = 0x27;
pub const BS16_VOL_LAB: usize = 0x2B;
pub const BS16_FIL_SYS_TYPE: usize = 0x36;

/// Bytes of the boot sector covered by the FAT16 BPB (ends after the fs type tag)
pub const BPB_REGION_LEN: usize = 0x3E;

/// Bytes read from the start of the volume when decoding the boot sector
pub const BOOT_SECTOR_READ_LEN: usize = 512;

/// Sector sizes a FAT volume may declare
pub const VALID_BYTES_PER_SECTOR: [u16; 4] = [512, 1024, 2048, 4096];

pub const BOOT_SIGNATURE: [u8; 2] = [0x55, 0xAA];
pub const BOOT_SIGNATURE_OFFSET: usize = 0x1FE;

// FAT entry values
pub const FAT16_FREE: u16 = 0x0000;
pub const FAT16_RESERVED: u16 = 0x0001;
pub const FAT16_MAX_LINK: u16 = 0xFFEF;
pub const FAT16_BAD_MIN: u16 = 0xFFF0;
pub const FAT16_BAD_MAX: u16 = 0xFFF7;
pub const FAT16_EOC: u16 = 0xFFF8; // End of chain marker
pub const FAT16_ENTRY_SIZE: usize = 2;
/// Every u16 cluster number has a slot; a larger FAT cannot be addressed
pub const FAT16_MAX_ENTRIES: u64 = 0x1_0000;

/// First cluster number that maps into the data region
pub const FIRST_DATA_CLUSTER: u16 = 2;

// Directory entries
pub const DIR_ENTRY_SIZE: usize = 32;
pub const DIR_NAME_LEN: usize = 11;
pub const DIR_BASE_NAME_LEN: usize = 8;
pub const DIR_END_MARKER: u8 = 0x00;
pub const DIR_DELETED_MARKER: u8 = 0xE5;
/// A leading 0x05 stands in for a real 0xE5 first character
pub const DIR_KANJI_E5_ESCAPE: u8 = 0x05;

// Short entry field offsets
pub const DIR_NAME: usize = 0x00;
pub const DIR_ATTR: usize = 0x0B;
pub const DIR_NT_RES: usize = 0x0C;
pub const DIR_CRT_TIME_TENTH: usize = 0x0D;
pub const DIR_CRT_TIME: usize = 0x0E;
pub const DIR_CRT_DATE: usize = 0x10;
pub const DIR_LST_ACC_DATE: usize = 0x12;
pub const DIR_FST_CLUS_HI: usize = 0x14;
pub const DIR_WRT_TIME: usize = 0x16;
pub const DIR_WRT_DATE: usize = 0x18;
pub const DIR_FST_CLUS_LO: usize = 0x1A;
pub const DIR_FILE_SIZE: usize = 0x1C;

// Long name entry field offsets
pub const LDIR_ORD: usize = 0x00;
pub const LDIR_NAME1: usize = 0x01;
pub const LDIR_ATTR: usize = 0x0B;
pub const LDIR_TYPE: usize = 0x0C;
pub const LDIR_CHKSUM: usize = 0x0D;
pub const LDIR_NAME2: usize = 0x0E;
pub const LDIR_FST_CLUS_LO: usize = 0x1A;
pub const LDIR_NAME3: usize = 0x1C;

pub const LFN_NAME1_UNITS: usize = 5;
pub const LFN_NAME2_UNITS: usize = 6;
pub const LFN_NAME3_UNITS: usize = 2;
pub const LFN_CHARS_PER_ENTRY: usize = 13;
pub const LFN_LAST_ENTRY_FLAG: u8 = 0x40;
pub const LFN_SEQUENCE_MASK: u8 = 0x1F;
pub const LFN_MAX_ENTRIES: usize = 20; // 255 characters
pub const LFN_TERMINATOR: u16 = 0x0000;
pub const LFN_PADDING: u16 = 0xFFFF;

static_assertions::const_assert_eq!(
    LFN_NAME1_UNITS + LFN_NAME2_UNITS + LFN_NAME3_UNITS,
    LFN_CHARS_PER_ENTRY
);
static_assertions::const_assert_eq!(LDIR_NAME3 + LFN_NAME3_UNITS * 2, DIR_ENTRY_SIZE);
