use thiserror::Error;

pub type FatResult<T> = Result<T, FatError>;

#[derive(Debug, Error)]
pub enum FatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Short read at offset {offset:#x}: expected {expected} bytes, got {actual}")]
    ShortRead {
        offset: u64,
        expected: usize,
        actual: usize,
    },

    #[error("Malformed volume: {0}")]
    MalformedVolume(String),

    #[error("Corrupt cluster chain: {0}")]
    CorruptChain(String),

    #[error("Is a directory: {0}")]
    IsDirectory(String),

    #[error("Invalid offset: {0}")]
    InvalidOffset(i128),

    #[error("Unrepresentable character in long name: U+{0:04X}")]
    UnrepresentableCharacter(u16),

    #[error("File handle is closed")]
    Closed,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FatError {
    /// True for failures that originate in the storage accessor
    pub fn is_io(&self) -> bool {
        matches!(self, FatError::Io(_) | FatError::ShortRead { .. })
    }
}
