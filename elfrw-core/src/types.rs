use std::fmt;

use crate::marshal::FieldMap;

/// Primitive wire types understood by the marshaller.
///
/// The set is closed: a schema can only name one of these, so an unknown type
/// is a compile error rather than something discovered while reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prim {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    /// One byte of a fixed-length raw block. A count of `n` reads `n` bytes
    /// verbatim, with no byte order applied.
    Char,
}

impl Prim {
    /// Width of a single element in bytes.
    pub const fn width(self) -> usize {
        match self {
            Prim::Int8 | Prim::UInt8 | Prim::Char => 1,
            Prim::Int16 | Prim::UInt16 => 2,
            Prim::Int32 | Prim::UInt32 | Prim::Float32 => 4,
            Prim::Int64 | Prim::UInt64 | Prim::Float64 => 8,
        }
    }

    pub const fn is_raw(self) -> bool {
        matches!(self, Prim::Char)
    }
}

impl fmt::Display for Prim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Prim::Int8 => "int8",
            Prim::UInt8 => "uint8",
            Prim::Int16 => "int16",
            Prim::UInt16 => "uint16",
            Prim::Int32 => "int32",
            Prim::UInt32 => "uint32",
            Prim::Int64 => "int64",
            Prim::UInt64 => "uint64",
            Prim::Float32 => "float",
            Prim::Float64 => "double",
            Prim::Char => "char",
        };
        write!(f, "{}", name)
    }
}

// ELF scalar aliases.
pub const ELF32_HALF: Prim = Prim::UInt16;
pub const ELF32_WORD: Prim = Prim::UInt32;
pub const ELF32_OFF: Prim = Prim::UInt32;
pub const ELF32_ADDR: Prim = Prim::UInt32;
pub const ELF64_HALF: Prim = Prim::UInt16;
pub const ELF64_WORD: Prim = Prim::UInt32;
pub const ELF64_OFF: Prim = Prim::UInt64;
pub const ELF64_ADDR: Prim = Prim::UInt64;
pub const ELF64_XWORD: Prim = Prim::UInt64;

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Bytes(Vec<u8>),
    /// A repeated scalar or nested record (`count > 1`).
    Array(Vec<Value>),
    Struct(FieldMap),
}

impl Value {
    /// Short description of the value's shape, used in mismatch errors.
    pub fn kind(&self) -> String {
        match self {
            Value::I8(_) => Prim::Int8.to_string(),
            Value::U8(_) => Prim::UInt8.to_string(),
            Value::I16(_) => Prim::Int16.to_string(),
            Value::U16(_) => Prim::UInt16.to_string(),
            Value::I32(_) => Prim::Int32.to_string(),
            Value::U32(_) => Prim::UInt32.to_string(),
            Value::I64(_) => Prim::Int64.to_string(),
            Value::U64(_) => Prim::UInt64.to_string(),
            Value::F32(_) => Prim::Float32.to_string(),
            Value::F64(_) => Prim::Float64.to_string(),
            Value::Bytes(b) => format!("{} x char", b.len()),
            Value::Array(items) => format!("array of {}", items.len()),
            Value::Struct(_) => "struct".to_string(),
        }
    }

    /// Whether this value is a single element of `prim`.
    pub fn is_scalar_of(&self, prim: Prim) -> bool {
        matches!(
            (prim, self),
            (Prim::Int8, Value::I8(_))
                | (Prim::UInt8, Value::U8(_))
                | (Prim::Int16, Value::I16(_))
                | (Prim::UInt16, Value::U16(_))
                | (Prim::Int32, Value::I32(_))
                | (Prim::UInt32, Value::U32(_))
                | (Prim::Int64, Value::I64(_))
                | (Prim::UInt64, Value::U64(_))
                | (Prim::Float32, Value::F32(_))
                | (Prim::Float64, Value::F64(_))
        )
    }

    /// Widens an unsigned scalar to `u64`. Signed, float and aggregate values
    /// yield `None`.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::U8(v) => Some(v as u64),
            Value::U16(v) => Some(v as u64),
            Value::U32(v) => Some(v as u64),
            Value::U64(v) => Some(v),
            _ => None,
        }
    }

    /// Builds the unsigned scalar `prim` holding `v`, failing when `v` does
    /// not fit the declared width.
    pub fn unsigned(prim: Prim, v: u64) -> crate::Result<Value> {
        let too_wide = || crate::ElfError::mismatch(prim, format!("value {v:#x}"));
        Ok(match prim {
            Prim::UInt8 => Value::U8(u8::try_from(v).map_err(|_| too_wide())?),
            Prim::UInt16 => Value::U16(u16::try_from(v).map_err(|_| too_wide())?),
            Prim::UInt32 => Value::U32(u32::try_from(v).map_err(|_| too_wide())?),
            Prim::UInt64 => Value::U64(v),
            _ => return Err(too_wide()),
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I8(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v:#x}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v:#x}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v:#x}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v:#x}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::Bytes(b) => {
                for byte in b {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Struct(fields) => write!(f, "{fields}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths() {
        assert_eq!(Prim::Char.width(), 1);
        assert_eq!(ELF32_HALF.width(), 2);
        assert_eq!(ELF32_ADDR.width(), 4);
        assert_eq!(ELF64_ADDR.width(), 8);
        assert_eq!(Prim::Float32.width(), 4);
        assert_eq!(Prim::Float64.width(), 8);
    }

    #[test]
    fn unsigned_rejects_overflow() {
        assert_eq!(Value::unsigned(Prim::UInt32, 7).unwrap(), Value::U32(7));
        assert!(matches!(
            Value::unsigned(Prim::UInt32, 1 << 32),
            Err(crate::ElfError::SchemaMismatch { .. })
        ));
        assert!(Value::unsigned(Prim::Int32, 1).is_err());
    }

    #[test]
    fn display_bytes_as_hex() {
        assert_eq!(Value::Bytes(vec![0x7f, b'E']).to_string(), "7f45");
        assert_eq!(Value::U16(0x3e).to_string(), "0x3e");
    }
}
