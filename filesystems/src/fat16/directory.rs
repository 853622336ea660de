// Directory iteration
// Pairs each short entry with the long-name run immediately before it

use super::dir_entry::{classify, DirSlot, LongNameFragment, ShortEntry};
use super::long_names::{checksum_matches, is_complete_run, reconstruct_long_name};
use crate::fat_common::constants::{DIR_ENTRY_SIZE, LFN_MAX_ENTRIES};
use fatlens_core::{FatResult, LongNamePolicy, ReaderConfig};
use log::{debug, trace};
use serde::Serialize;

/// A live directory entry with its reconstructed name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Long name when one is attached, otherwise the 8.3 name
    pub name: String,
    pub short_name: String,
    pub long_name: Option<String>,
    pub entry: ShortEntry,
    /// Index of the short slot within its directory
    pub slot_index: usize,
}

impl DirEntry {
    pub fn is_directory(&self) -> bool {
        self.entry.is_directory()
    }

    pub fn is_volume_label(&self) -> bool {
        self.entry.is_volume_label()
    }

    pub fn is_file(&self) -> bool {
        !self.is_directory() && !self.is_volume_label()
    }

    pub fn size(&self) -> u32 {
        self.entry.file_size
    }

    /// Case-insensitive match against the long or short name
    pub fn matches(&self, name: &str) -> bool {
        self.short_name.eq_ignore_ascii_case(name)
            || self.long_name.as_deref().is_some_and(|l| l.eq_ignore_ascii_case(name))
    }

    pub fn summary(&self) -> EntrySummary {
        EntrySummary {
            name: self.name.clone(),
            short_name: self.short_name.clone(),
            is_directory: self.is_directory(),
            size: self.size(),
            first_cluster: self.entry.first_cluster_lo,
            attributes: self.entry.attributes.to_string(),
            modified: self.entry.modified().map(|m| m.to_string()),
        }
    }
}

/// Flat, serializable view of an entry for listing tools
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntrySummary {
    pub name: String,
    pub short_name: String,
    pub is_directory: bool,
    pub size: u32,
    pub first_cluster: u16,
    pub attributes: String,
    pub modified: Option<String>,
}

/// Iterator over the live entries of a raw directory buffer
///
/// Deleted slots are skipped, orphaned long-name runs are dropped, and
/// iteration stops at the end-of-directory marker or the end of the buffer.
/// Volume labels are yielded; callers filter them with `is_volume_label`.
pub struct DirectoryIter<'a> {
    data: &'a [u8],
    index: usize,
    pending: Vec<LongNameFragment>,
    policy: LongNamePolicy,
    verify_checksum: bool,
    finished: bool,
}

impl<'a> DirectoryIter<'a> {
    pub fn new(data: &'a [u8], config: &ReaderConfig) -> Self {
        Self {
            data,
            index: 0,
            pending: Vec::new(),
            policy: config.long_names,
            verify_checksum: config.verify_lfn_checksum,
            finished: false,
        }
    }

    fn drop_pending(&mut self, reason: &str) {
        if !self.pending.is_empty() {
            debug!(
                "Dropping {} orphaned long-name fragment(s) before slot {}: {}",
                self.pending.len(),
                self.index,
                reason
            );
            self.pending.clear();
        }
    }

    fn attach_long_name(&mut self, entry: &ShortEntry) -> FatResult<Option<String>> {
        if self.pending.is_empty() {
            return Ok(None);
        }

        let run = std::mem::take(&mut self.pending);
        if !is_complete_run(&run) {
            debug!("Incomplete long-name run before {}", entry.display_name());
            return Ok(None);
        }
        if self.verify_checksum && !checksum_matches(&run, &entry.name) {
            debug!("Long-name checksum mismatch for {}", entry.display_name());
            return Ok(None);
        }

        reconstruct_long_name(&run, self.policy).map(Some)
    }
}

impl Iterator for DirectoryIter<'_> {
    type Item = FatResult<DirEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            let start = self.index * DIR_ENTRY_SIZE;
            let Some(raw) = self.data.get(start..start + DIR_ENTRY_SIZE) else {
                self.drop_pending("directory data ended");
                self.finished = true;
                break;
            };
            let mut slot = [0u8; DIR_ENTRY_SIZE];
            slot.copy_from_slice(raw);
            trace!("Slot {}: {}", self.index, hex::encode(slot));

            let slot_index = self.index;
            self.index += 1;

            match classify(&slot) {
                DirSlot::EndOfDirectory => {
                    self.drop_pending("end of directory");
                    self.finished = true;
                }
                DirSlot::Deleted => self.drop_pending("deleted entry"),
                DirSlot::LongNameFragment(fragment) => {
                    if fragment.is_last() {
                        self.drop_pending("new long-name run started");
                    }
                    if self.pending.len() >= LFN_MAX_ENTRIES {
                        self.drop_pending("run longer than 255 characters");
                    }
                    self.pending.push(fragment);
                }
                DirSlot::VolumeLabel(entry) => {
                    self.drop_pending("volume label");
                    let label = String::from_utf8_lossy(&entry.name).trim_end().to_string();
                    return Some(Ok(DirEntry {
                        name: label.clone(),
                        short_name: label,
                        long_name: None,
                        entry,
                        slot_index,
                    }));
                }
                DirSlot::Short(entry) => {
                    let long_name = match self.attach_long_name(&entry) {
                        Ok(long_name) => long_name,
                        Err(e) => return Some(Err(e)),
                    };
                    let short_name = entry.display_name();
                    return Some(Ok(DirEntry {
                        name: long_name.clone().unwrap_or_else(|| short_name.clone()),
                        short_name,
                        long_name,
                        entry,
                        slot_index,
                    }));
                }
            }
        }

        None
    }
}

/// Decode every live entry of a directory buffer
pub fn parse_directory(data: &[u8], config: &ReaderConfig) -> FatResult<Vec<DirEntry>> {
    DirectoryIter::new(data, config).collect()
}
