// FAT16 directory slot decoding
// Every 32-byte slot is classified before anything else looks at it

use crate::fat_common::constants::*;
use crate::fat_common::timestamps::{fat_date, fat_datetime};
use byteorder::{ByteOrder, LittleEndian};
use chrono::{NaiveDate, NaiveDateTime};
use fatlens_core::{FatError, FatResult};
use serde::Serialize;
use std::fmt;

/// Directory entry attribute byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FileAttributes(pub u8);

impl FileAttributes {
    pub const READ_ONLY: u8 = 0x01;
    pub const HIDDEN: u8 = 0x02;
    pub const SYSTEM: u8 = 0x04;
    pub const VOLUME_ID: u8 = 0x08;
    pub const DIRECTORY: u8 = 0x10;
    pub const ARCHIVE: u8 = 0x20;
    /// Attribute pattern of a VFAT long-name fragment
    pub const LONG_NAME: u8 = Self::READ_ONLY | Self::HIDDEN | Self::SYSTEM | Self::VOLUME_ID;
    pub const LONG_NAME_MASK: u8 = Self::LONG_NAME | Self::DIRECTORY | Self::ARCHIVE;

    pub fn contains(self, flag: u8) -> bool {
        self.0 & flag == flag
    }

    pub fn is_read_only(self) -> bool {
        self.contains(Self::READ_ONLY)
    }

    pub fn is_hidden(self) -> bool {
        self.contains(Self::HIDDEN)
    }

    pub fn is_system(self) -> bool {
        self.contains(Self::SYSTEM)
    }

    pub fn is_volume_label(self) -> bool {
        self.contains(Self::VOLUME_ID)
    }

    pub fn is_directory(self) -> bool {
        self.contains(Self::DIRECTORY)
    }

    pub fn is_archive(self) -> bool {
        self.contains(Self::ARCHIVE)
    }

    pub fn is_long_name(self) -> bool {
        self.0 & Self::LONG_NAME_MASK == Self::LONG_NAME
    }
}

impl fmt::Display for FileAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = [
            (Self::READ_ONLY, 'R'),
            (Self::HIDDEN, 'H'),
            (Self::SYSTEM, 'S'),
            (Self::VOLUME_ID, 'V'),
            (Self::DIRECTORY, 'D'),
            (Self::ARCHIVE, 'A'),
        ];
        for (flag, c) in flags {
            write!(f, "{}", if self.contains(flag) { c } else { '-' })?;
        }
        Ok(())
    }
}

/// A classic 8.3 directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortEntry {
    pub name: [u8; 11],
    pub attributes: FileAttributes,
    pub nt_reserved: u8,
    pub create_time_tenths: u8,
    pub create_time: u16,
    pub create_date: u16,
    pub access_date: u16,
    pub first_cluster_hi: u16,
    pub write_time: u16,
    pub write_date: u16,
    pub first_cluster_lo: u16,
    pub file_size: u32,
}

impl ShortEntry {
    pub fn parse(slot: &[u8; DIR_ENTRY_SIZE]) -> Self {
        let mut name = [0u8; DIR_NAME_LEN];
        name.copy_from_slice(&slot[DIR_NAME..DIR_NAME + DIR_NAME_LEN]);

        Self {
            name,
            attributes: FileAttributes(slot[DIR_ATTR]),
            nt_reserved: slot[DIR_NT_RES],
            create_time_tenths: slot[DIR_CRT_TIME_TENTH],
            create_time: LittleEndian::read_u16(&slot[DIR_CRT_TIME..]),
            create_date: LittleEndian::read_u16(&slot[DIR_CRT_DATE..]),
            access_date: LittleEndian::read_u16(&slot[DIR_LST_ACC_DATE..]),
            first_cluster_hi: LittleEndian::read_u16(&slot[DIR_FST_CLUS_HI..]),
            write_time: LittleEndian::read_u16(&slot[DIR_WRT_TIME..]),
            write_date: LittleEndian::read_u16(&slot[DIR_WRT_DATE..]),
            first_cluster_lo: LittleEndian::read_u16(&slot[DIR_FST_CLUS_LO..]),
            file_size: LittleEndian::read_u32(&slot[DIR_FILE_SIZE..]),
        }
    }

    /// First cluster of the entry's data
    ///
    /// FAT16 never uses the high half; a non-zero value means the entry is
    /// corrupt (or belongs to a FAT32 volume) and is rejected.
    pub fn first_cluster(&self) -> FatResult<u16> {
        if self.first_cluster_hi != 0 {
            return Err(FatError::CorruptChain(format!(
                "entry {} has non-zero high cluster half {:#06x}",
                self.display_name(),
                self.first_cluster_hi
            )));
        }
        Ok(self.first_cluster_lo)
    }

    pub fn display_name(&self) -> String {
        format_short_name(&self.name)
    }

    pub fn is_directory(&self) -> bool {
        self.attributes.is_directory()
    }

    pub fn is_volume_label(&self) -> bool {
        self.attributes.is_volume_label()
    }

    /// "." and ".." in subdirectories
    pub fn is_dot_entry(&self) -> bool {
        &self.name == b".          " || &self.name == b"..         "
    }

    pub fn created(&self) -> Option<NaiveDateTime> {
        fat_datetime(self.create_date, self.create_time, self.create_time_tenths)
    }

    pub fn modified(&self) -> Option<NaiveDateTime> {
        fat_datetime(self.write_date, self.write_time, 0)
    }

    pub fn accessed(&self) -> Option<NaiveDate> {
        fat_date(self.access_date)
    }
}

/// One VFAT long-name fragment (13 UTF-16 code units)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongNameFragment {
    pub ordinal: u8,
    pub units: [u16; LFN_CHARS_PER_ENTRY],
    pub checksum: u8,
}

impl LongNameFragment {
    pub fn parse(slot: &[u8; DIR_ENTRY_SIZE]) -> Self {
        let mut units = [0u16; LFN_CHARS_PER_ENTRY];
        let groups = [
            (LDIR_NAME1, LFN_NAME1_UNITS),
            (LDIR_NAME2, LFN_NAME2_UNITS),
            (LDIR_NAME3, LFN_NAME3_UNITS),
        ];

        let mut at = 0;
        for (offset, count) in groups {
            LittleEndian::read_u16_into(&slot[offset..offset + count * 2], &mut units[at..at + count]);
            at += count;
        }

        Self {
            ordinal: slot[LDIR_ORD],
            units,
            checksum: slot[LDIR_CHKSUM],
        }
    }

    /// Position of this fragment counting from 1 at the start of the name
    pub fn sequence(&self) -> u8 {
        self.ordinal & LFN_SEQUENCE_MASK
    }

    /// Set on the physically first fragment, which holds the end of the name
    pub fn is_last(&self) -> bool {
        self.ordinal & LFN_LAST_ENTRY_FLAG != 0
    }
}

/// Classified 32-byte directory slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirSlot {
    EndOfDirectory,
    Deleted,
    VolumeLabel(ShortEntry),
    LongNameFragment(LongNameFragment),
    Short(ShortEntry),
}

/// Classify a raw slot
pub fn classify(slot: &[u8; DIR_ENTRY_SIZE]) -> DirSlot {
    let attributes = FileAttributes(slot[DIR_ATTR]);

    if slot[DIR_NAME] == DIR_END_MARKER {
        DirSlot::EndOfDirectory
    } else if slot[DIR_NAME] == DIR_DELETED_MARKER {
        DirSlot::Deleted
    } else if attributes.is_long_name() {
        DirSlot::LongNameFragment(LongNameFragment::parse(slot))
    } else if attributes.is_volume_label() && !attributes.is_directory() {
        DirSlot::VolumeLabel(ShortEntry::parse(slot))
    } else {
        DirSlot::Short(ShortEntry::parse(slot))
    }
}

/// Render a packed 8.3 name for display
///
/// Trailing pad spaces are dropped from the base name; the extension is
/// appended after a dot only when it is not blank.
pub fn format_short_name(raw: &[u8; DIR_NAME_LEN]) -> String {
    let (base, ext) = raw.split_at(DIR_BASE_NAME_LEN);
    let base_len = base.iter().rposition(|&b| b != b' ').map_or(0, |p| p + 1);
    let ext_len = ext.iter().rposition(|&b| b != b' ').map_or(0, |p| p + 1);

    let mut name = String::with_capacity(DIR_NAME_LEN + 1);
    for (i, &b) in base[..base_len].iter().enumerate() {
        if i == 0 && b == DIR_KANJI_E5_ESCAPE {
            name.push(DIR_DELETED_MARKER as char);
        } else {
            name.push(b as char);
        }
    }

    if ext_len > 0 {
        name.push('.');
        name.extend(ext[..ext_len].iter().map(|&b| b as char));
    }

    name
}

/// Checksum of a short name stored in each of its long-name fragments
pub fn lfn_checksum(short_name: &[u8; DIR_NAME_LEN]) -> u8 {
    let mut sum = 0u8;
    for &byte in short_name {
        sum = ((sum >> 1) | ((sum & 1) << 7)).wrapping_add(byte);
    }
    sum
}
