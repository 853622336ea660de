// VFAT long filename reassembly
// Only the single-byte subset of UTF-16 is representable here

use super::dir_entry::{lfn_checksum, LongNameFragment};
use crate::fat_common::constants::*;
use fatlens_core::{FatError, FatResult, LongNamePolicy};
use log::{debug, warn};

const SUBSTITUTE_CHAR: char = '?';

/// Whether `fragments` (physical order) form one complete long name:
/// the first is flagged last, and sequences count down to 1 without gaps.
pub fn is_complete_run(fragments: &[LongNameFragment]) -> bool {
    let Some(first) = fragments.first() else {
        return false;
    };
    if !first.is_last() || fragments.len() > LFN_MAX_ENTRIES {
        return false;
    }
    if first.sequence() as usize != fragments.len() {
        return false;
    }

    fragments
        .iter()
        .enumerate()
        .all(|(i, f)| f.sequence() as usize == fragments.len() - i && (i == 0 || !f.is_last()))
}

/// Whether every fragment carries the checksum of `short_name`
pub fn checksum_matches(fragments: &[LongNameFragment], short_name: &[u8; DIR_NAME_LEN]) -> bool {
    let expected = lfn_checksum(short_name);
    fragments.iter().all(|f| f.checksum == expected)
}

/// Reassemble a long name from its fragments
///
/// Each fragment is placed by its own sequence number, so the result does
/// not depend on the order of `fragments`. The name ends at the first NUL
/// code unit; 0xFFFF padding is dropped.
pub fn reconstruct_long_name(
    fragments: &[LongNameFragment],
    policy: LongNamePolicy,
) -> FatResult<String> {
    let count = fragments
        .iter()
        .find(|f| f.is_last())
        .or(fragments.first())
        .map_or(0, |f| f.sequence() as usize);

    let mut units = vec![LFN_PADDING; count * LFN_CHARS_PER_ENTRY];
    for fragment in fragments {
        let sequence = fragment.sequence() as usize;
        if sequence == 0 || sequence > count {
            debug!("Ignoring long-name fragment with sequence {} of {}", sequence, count);
            continue;
        }
        let at = (sequence - 1) * LFN_CHARS_PER_ENTRY;
        units[at..at + LFN_CHARS_PER_ENTRY].copy_from_slice(&fragment.units);
    }

    let mut name = String::with_capacity(units.len());
    let mut substituted = 0;
    for &unit in &units {
        match unit {
            LFN_TERMINATOR => break,
            LFN_PADDING => continue,
            0x0001..=0x00FF => name.push(unit as u8 as char),
            _ => match policy {
                LongNamePolicy::Strict => return Err(FatError::UnrepresentableCharacter(unit)),
                LongNamePolicy::Substitute => {
                    name.push(SUBSTITUTE_CHAR);
                    substituted += 1;
                }
            },
        }
    }

    if substituted > 0 {
        warn!(
            "Long name {:?}: {} code unit(s) above U+00FF replaced with '{}'",
            name, substituted, SUBSTITUTE_CHAR
        );
    }

    Ok(name)
}
