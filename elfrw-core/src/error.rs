use thiserror::Error;

/// Failures raised while parsing or re-emitting ELF headers.
///
/// Every variant is fatal for the buffer it was raised against; nothing here
/// is worth retrying.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ElfError {
    #[error("bad ELF magic {found:02x?}, expected [7f, 45, 4c, 46]")]
    MagicMismatch { found: Vec<u8> },

    #[error("unsupported ELF version {0}")]
    UnsupportedVersion(u8),

    #[error("unknown ELF class {0}")]
    UnknownClass(u8),

    #[error("unknown ELF data encoding {0}")]
    UnknownDataEncoding(u8),

    #[error("truncated input: need {needed} bytes at offset {offset:#x}, only {available} available")]
    TruncatedInput {
        offset: u64,
        needed: u64,
        available: u64,
    },

    #[error("cannot write {len} bytes at offset {offset:#x}: buffer cannot grow that far")]
    WriteOutOfRange { offset: u64, len: u64 },

    #[error("schema mismatch: expected {expected}, found {found}")]
    SchemaMismatch { expected: String, found: String },
}

pub type Result<T> = std::result::Result<T, ElfError>;

impl ElfError {
    pub(crate) fn mismatch(expected: impl ToString, found: impl ToString) -> Self {
        ElfError::SchemaMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}
