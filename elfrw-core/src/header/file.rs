use goblin::elf::header::ET_EXEC;

use super::ident::{Class, Ident};
use super::{layout_fields, member, unsigned_field, Header, Record};
use crate::marshal::FieldMap;
use crate::schema::{FieldType, Schema};
use crate::types::Value;
use crate::{ElfError, Result};

/// The ELF file header (`Elf32_Ehdr` / `Elf64_Ehdr`).
///
/// Address and offset members are held as `u64` whatever the class; emitting
/// a narrow header fails with a schema mismatch if one no longer fits in 32
/// bits.
///
/// Reference: [ELF Specification v1.2](https://refspecs.linuxfoundation.org/elf/elf.pdf)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// ELF identification bytes (magic number and other information).
    pub ident: Ident,

    /// Object file type (e.g. relocatable, executable, shared, core).
    ///
    /// Common values:
    /// - `ET_NONE` (0): No file type
    /// - `ET_REL` (1): Relocatable file
    /// - `ET_EXEC` (2): Executable file
    /// - `ET_DYN` (3): Shared object
    /// - `ET_CORE` (4): Core dump
    pub e_type: u16,

    /// Target architecture, e.g. `EM_X86_64` (62) or `EM_AARCH64` (183).
    pub e_machine: u16,

    /// ELF version (usually `EV_CURRENT` = 1).
    pub e_version: u32,

    /// Virtual address of the program entry point.
    pub e_entry: u64,

    /// File offset of the program header table.
    pub e_phoff: u64,

    /// File offset of the section header table.
    pub e_shoff: u64,

    /// Processor-specific flags.
    pub e_flags: u32,

    /// Size of this header (52 for ELF32, 64 for ELF64).
    pub e_ehsize: u16,

    /// Size of one entry in the program header table.
    pub e_phentsize: u16,

    /// Number of entries in the program header table.
    pub e_phnum: u16,

    /// Size of one entry in the section header table.
    pub e_shentsize: u16,

    /// Number of entries in the section header table.
    pub e_shnum: u16,

    /// Index of the section header string table.
    pub e_shstrndx: u16,
}

impl Header for FileHeader {
    fn entry_point(&self) -> u64 {
        self.e_entry
    }

    fn machine(&self) -> u16 {
        self.e_machine
    }

    fn is_64(&self) -> bool {
        self.ident.class == Class::Elf64
    }

    fn format_name(&self) -> &'static str {
        "ELF"
    }

    fn is_executable(&self) -> bool {
        self.e_type == ET_EXEC
    }
}

impl Record for FileHeader {
    fn from_fields(fields: &FieldMap) -> Result<Self> {
        Ok(FileHeader {
            ident: Ident::from_fields(fields.nested("e_ident")?)?,
            e_type: member(fields, "e_type")?,
            e_machine: member(fields, "e_machine")?,
            e_version: member(fields, "e_version")?,
            e_entry: member(fields, "e_entry")?,
            e_phoff: member(fields, "e_phoff")?,
            e_shoff: member(fields, "e_shoff")?,
            e_flags: member(fields, "e_flags")?,
            e_ehsize: member(fields, "e_ehsize")?,
            e_phentsize: member(fields, "e_phentsize")?,
            e_phnum: member(fields, "e_phnum")?,
            e_shentsize: member(fields, "e_shentsize")?,
            e_shnum: member(fields, "e_shnum")?,
            e_shstrndx: member(fields, "e_shstrndx")?,
        })
    }

    fn to_fields(&self, schema: &Schema) -> Result<FieldMap> {
        layout_fields(schema, |field| {
            if let FieldType::Nested(inner) = field.ty {
                return match field.name {
                    "e_ident" => Ok(Value::Struct(self.ident.to_fields(inner)?)),
                    other => Err(ElfError::mismatch(
                        format!("record member for `{other}`"),
                        "none",
                    )),
                };
            }
            let v = match field.name {
                "e_type" => Some(self.e_type as u64),
                "e_machine" => Some(self.e_machine as u64),
                "e_version" => Some(self.e_version as u64),
                "e_entry" => Some(self.e_entry),
                "e_phoff" => Some(self.e_phoff),
                "e_shoff" => Some(self.e_shoff),
                "e_flags" => Some(self.e_flags as u64),
                "e_ehsize" => Some(self.e_ehsize as u64),
                "e_phentsize" => Some(self.e_phentsize as u64),
                "e_phnum" => Some(self.e_phnum as u64),
                "e_shentsize" => Some(self.e_shentsize as u64),
                "e_shnum" => Some(self.e_shnum as u64),
                "e_shstrndx" => Some(self.e_shstrndx as u64),
                _ => None,
            };
            unsigned_field(field, v)
        })
    }
}
