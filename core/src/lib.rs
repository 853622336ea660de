pub mod config;
pub mod error;
pub mod storage;

pub use config::{EndSeekPolicy, LongNamePolicy, ReaderConfig};
pub use error::{FatError, FatResult};
pub use storage::{ImageFile, MemoryImage, StorageAccessor};
