// MS-DOS packed date/time decoding
// FAT date: bits 15-9: year (0=1980), bits 8-5: month, bits 4-0: day
// FAT time: bits 15-11: hours, bits 10-5: minutes, bits 4-0: seconds/2

use chrono::{NaiveDate, NaiveDateTime};

/// Decode a packed FAT date. Returns `None` for zero or out-of-range fields.
pub fn fat_date(date: u16) -> Option<NaiveDate> {
    let year = ((date >> 9) & 0x7F) as i32 + 1980;
    let month = ((date >> 5) & 0x0F) as u32;
    let day = (date & 0x1F) as u32;

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Decode a packed FAT date and time
///
/// `tenths` is the creation-time refinement (0-199, units of 10ms) that only
/// creation timestamps carry; pass 0 otherwise.
pub fn fat_datetime(date: u16, time: u16, tenths: u8) -> Option<NaiveDateTime> {
    let hour = ((time >> 11) & 0x1F) as u32;
    let minute = ((time >> 5) & 0x3F) as u32;
    let second = ((time & 0x1F) * 2) as u32;

    let extra_ms = if tenths < 200 { tenths as u32 * 10 } else { 0 };

    fat_date(date)?.and_hms_milli_opt(hour, minute, second + extra_ms / 1000, extra_ms % 1000)
}
