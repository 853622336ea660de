// Definitions shared by the FAT16 decoder

pub mod constants;
pub mod timestamps;

pub use timestamps::{fat_date, fat_datetime};
