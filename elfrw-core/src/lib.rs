pub mod binary;
pub mod error;
pub mod header;
pub mod marshal;
mod parser;
pub mod schema;
pub mod types;

pub use binary::*;
pub use error::{ElfError, Result};
pub use header::file::FileHeader;
pub use header::ident::{Class, DataEncoding, Ident};
pub use header::program::ProgramHeader;
pub use header::section::SectionHeader;
pub use header::{Header, Record};
pub use marshal::{FieldMap, Marshaller};
pub use types::{Prim, Value};
