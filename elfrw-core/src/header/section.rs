use super::{layout_fields, member, unsigned_field, Record};
use crate::marshal::FieldMap;
use crate::schema::Schema;
use crate::Result;

/// One section header table entry (`Elf32_Shdr` / `Elf64_Shdr`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SectionHeader {
    /// Offset of the section name in the section header string table.
    pub sh_name: u32,
    pub sh_type: u32,
    pub sh_flags: u64,
    pub sh_addr: u64,
    pub sh_offset: u64,
    pub sh_size: u64,
    pub sh_link: u32,
    pub sh_info: u32,
    pub sh_addralign: u64,
    pub sh_entsize: u64,
}

impl Record for SectionHeader {
    fn from_fields(fields: &FieldMap) -> Result<Self> {
        Ok(SectionHeader {
            sh_name: member(fields, "sh_name")?,
            sh_type: member(fields, "sh_type")?,
            sh_flags: member(fields, "sh_flags")?,
            sh_addr: member(fields, "sh_addr")?,
            sh_offset: member(fields, "sh_offset")?,
            sh_size: member(fields, "sh_size")?,
            sh_link: member(fields, "sh_link")?,
            sh_info: member(fields, "sh_info")?,
            sh_addralign: member(fields, "sh_addralign")?,
            sh_entsize: member(fields, "sh_entsize")?,
        })
    }

    fn to_fields(&self, schema: &Schema) -> Result<FieldMap> {
        layout_fields(schema, |field| {
            let v = match field.name {
                "sh_name" => Some(self.sh_name as u64),
                "sh_type" => Some(self.sh_type as u64),
                "sh_flags" => Some(self.sh_flags),
                "sh_addr" => Some(self.sh_addr),
                "sh_offset" => Some(self.sh_offset),
                "sh_size" => Some(self.sh_size),
                "sh_link" => Some(self.sh_link as u64),
                "sh_info" => Some(self.sh_info as u64),
                "sh_addralign" => Some(self.sh_addralign),
                "sh_entsize" => Some(self.sh_entsize),
                _ => None,
            };
            unsigned_field(field, v)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::elf::{PHDR64, SHDR32};
    use crate::types::Value;

    #[test]
    fn narrow_fields_are_32_bit() {
        let shdr = SectionHeader {
            sh_flags: 6,
            sh_size: 0x40,
            ..Default::default()
        };
        let fields = shdr.to_fields(&SHDR32).unwrap();
        assert_eq!(fields.get("sh_flags"), Some(&Value::U32(6)));
        assert_eq!(fields.get("sh_size"), Some(&Value::U32(0x40)));
    }

    #[test]
    fn wrong_schema_is_a_mismatch() {
        assert!(SectionHeader::default().to_fields(&PHDR64).is_err());
    }
}
