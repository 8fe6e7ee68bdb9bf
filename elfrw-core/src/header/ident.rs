use goblin::elf::header::{
    ELFCLASS32, ELFCLASS64, ELFDATA2LSB, ELFDATA2MSB, ELFMAG, EV_CURRENT, SELFMAG,
};

use super::{layout_fields, unsigned_field, Record};
use crate::marshal::FieldMap;
use crate::schema::Schema;
use crate::types::Value;
use crate::{ElfError, Result};

/// Address width selected by `EI_CLASS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Class {
    Elf32,
    Elf64,
}

impl Class {
    pub fn from_byte(b: u8) -> Result<Self> {
        match b {
            ELFCLASS32 => Ok(Class::Elf32),
            ELFCLASS64 => Ok(Class::Elf64),
            other => Err(ElfError::UnknownClass(other)),
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Class::Elf32 => ELFCLASS32,
            Class::Elf64 => ELFCLASS64,
        }
    }
}

/// Byte order selected by `EI_DATA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataEncoding {
    Little,
    Big,
}

impl DataEncoding {
    pub fn from_byte(b: u8) -> Result<Self> {
        match b {
            ELFDATA2LSB => Ok(DataEncoding::Little),
            ELFDATA2MSB => Ok(DataEncoding::Big),
            other => Err(ElfError::UnknownDataEncoding(other)),
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            DataEncoding::Little => ELFDATA2LSB,
            DataEncoding::Big => ELFDATA2MSB,
        }
    }
}

/// The 16-byte `e_ident` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident {
    pub magic: [u8; SELFMAG],
    pub class: Class,
    pub encoding: DataEncoding,
    pub version: u8,
    pub os_abi: u8,
    pub abi_version: u8,
    /// Unused, kept verbatim.
    pub pad: [u8; 7],
}

impl Ident {
    /// Fails unless `magic` is `\x7fELF`.
    pub fn check_magic(magic: &[u8]) -> Result<()> {
        if magic != ELFMAG {
            return Err(ElfError::MagicMismatch {
                found: magic.to_vec(),
            });
        }
        Ok(())
    }
}

impl Record for Ident {
    /// Validates magic, version, class and data encoding, in that order.
    fn from_fields(fields: &FieldMap) -> Result<Self> {
        let magic = fields.bytes("ELF_MAG")?;
        Self::check_magic(magic)?;

        let version = super::member::<u8>(fields, "EI_VERSION")?;
        if version != EV_CURRENT {
            return Err(ElfError::UnsupportedVersion(version));
        }

        let class = Class::from_byte(super::member(fields, "EI_CLASS")?)?;
        let encoding = DataEncoding::from_byte(super::member(fields, "EI_DATA")?)?;

        let pad = fields.bytes("EI_PAD")?;
        Ok(Ident {
            magic: *ELFMAG,
            class,
            encoding,
            version,
            os_abi: super::member(fields, "EI_OSABI")?,
            abi_version: super::member(fields, "EI_ABIVERSION")?,
            pad: pad
                .try_into()
                .map_err(|_| ElfError::mismatch("7 x char `EI_PAD`", pad.len()))?,
        })
    }

    fn to_fields(&self, schema: &Schema) -> Result<FieldMap> {
        layout_fields(schema, |field| match field.name {
            "ELF_MAG" => Ok(Value::Bytes(self.magic.to_vec())),
            "EI_PAD" => Ok(Value::Bytes(self.pad.to_vec())),
            name => {
                let v = match name {
                    "EI_CLASS" => Some(self.class.as_byte()),
                    "EI_DATA" => Some(self.encoding.as_byte()),
                    "EI_VERSION" => Some(self.version),
                    "EI_OSABI" => Some(self.os_abi),
                    "EI_ABIVERSION" => Some(self.abi_version),
                    _ => None,
                };
                unsigned_field(field, v.map(u64::from))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::elf::IDENT;

    fn ident_fields(bytes: [u8; 16]) -> FieldMap {
        crate::marshal::Marshaller::new(bytes.to_vec())
            .read_struct(&IDENT, DataEncoding::Big)
            .unwrap()
    }

    fn ident(class: u8, data: u8, version: u8) -> [u8; 16] {
        let mut b = [0u8; 16];
        b[..4].copy_from_slice(ELFMAG);
        b[4] = class;
        b[5] = data;
        b[6] = version;
        b
    }

    #[test]
    fn accepts_valid_ident() {
        let mut bytes = ident(2, 2, 1);
        bytes[7] = 3;
        bytes[15] = 0xee;
        let id = Ident::from_fields(&ident_fields(bytes)).unwrap();
        assert_eq!(id.class, Class::Elf64);
        assert_eq!(id.encoding, DataEncoding::Big);
        assert_eq!(id.os_abi, 3);
        assert_eq!(id.pad[6], 0xee);
        assert_eq!(id.to_fields(&IDENT).unwrap(), ident_fields(bytes));
    }

    #[test]
    fn rejects_in_order() {
        let mut bad_magic = ident(9, 9, 9);
        bad_magic[0] = 0;
        assert!(matches!(
            Ident::from_fields(&ident_fields(bad_magic)),
            Err(ElfError::MagicMismatch { .. })
        ));
        assert_eq!(
            Ident::from_fields(&ident_fields(ident(9, 9, 0))),
            Err(ElfError::UnsupportedVersion(0))
        );
        assert_eq!(
            Ident::from_fields(&ident_fields(ident(3, 9, 1))),
            Err(ElfError::UnknownClass(3))
        );
        assert_eq!(
            Ident::from_fields(&ident_fields(ident(1, 0, 1))),
            Err(ElfError::UnknownDataEncoding(0))
        );
    }
}
