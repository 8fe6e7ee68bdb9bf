use super::{layout_fields, member, unsigned_field, Record};
use crate::marshal::FieldMap;
use crate::schema::Schema;
use crate::Result;

/// One program header table entry (`Elf32_Phdr` / `Elf64_Phdr`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgramHeader {
    pub p_type: u32,
    pub p_flags: u32,
    pub p_offset: u64,
    pub p_vaddr: u64,
    pub p_paddr: u64,
    pub p_filesz: u64,
    pub p_memsz: u64,
    pub p_align: u64,
}

impl Record for ProgramHeader {
    fn from_fields(fields: &FieldMap) -> Result<Self> {
        Ok(ProgramHeader {
            p_type: member(fields, "p_type")?,
            p_flags: member(fields, "p_flags")?,
            p_offset: member(fields, "p_offset")?,
            p_vaddr: member(fields, "p_vaddr")?,
            p_paddr: member(fields, "p_paddr")?,
            p_filesz: member(fields, "p_filesz")?,
            p_memsz: member(fields, "p_memsz")?,
            p_align: member(fields, "p_align")?,
        })
    }

    fn to_fields(&self, schema: &Schema) -> Result<FieldMap> {
        layout_fields(schema, |field| {
            let v = match field.name {
                "p_type" => Some(self.p_type as u64),
                "p_flags" => Some(self.p_flags as u64),
                "p_offset" => Some(self.p_offset),
                "p_vaddr" => Some(self.p_vaddr),
                "p_paddr" => Some(self.p_paddr),
                "p_filesz" => Some(self.p_filesz),
                "p_memsz" => Some(self.p_memsz),
                "p_align" => Some(self.p_align),
                _ => None,
            };
            unsigned_field(field, v)
        })
    }
}
