use std::fmt;
use std::io::Cursor;

use byteorder::{ByteOrder, BE, LE};

use crate::header::ident::DataEncoding;
use crate::schema::{FieldType, Schema};
use crate::types::{Prim, Value};
use crate::{ElfError, Result};

/// Field name to value association, kept in schema order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: Vec<(&'static str, Value)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &'static str, value: Value) {
        self.entries.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.entries.iter().map(|(n, v)| (*n, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up `name`, failing with a schema mismatch when it is absent.
    pub fn require(&self, name: &str) -> Result<&Value> {
        self.get(name)
            .ok_or_else(|| ElfError::mismatch(format!("field `{name}`"), "nothing"))
    }

    /// Looks up an unsigned scalar field and widens it to `u64`.
    pub fn unsigned(&self, name: &str) -> Result<u64> {
        let value = self.require(name)?;
        value
            .as_u64()
            .ok_or_else(|| ElfError::mismatch(format!("unsigned `{name}`"), value.kind()))
    }

    pub fn bytes(&self, name: &str) -> Result<&[u8]> {
        match self.require(name)? {
            Value::Bytes(b) => Ok(b),
            other => Err(ElfError::mismatch(format!("bytes `{name}`"), other.kind())),
        }
    }

    pub fn nested(&self, name: &str) -> Result<&FieldMap> {
        match self.require(name)? {
            Value::Struct(map) => Ok(map),
            other => Err(ElfError::mismatch(format!("struct `{name}`"), other.kind())),
        }
    }
}

impl fmt::Display for FieldMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        write!(f, "}}")
    }
}

/// Schema-driven reader/writer over an owned, seekable byte buffer.
///
/// Seeks are unchecked; running past the end only surfaces as
/// [`ElfError::TruncatedInput`] on the next read. Writes past the end grow the
/// buffer, zero-filling any gap.
#[derive(Debug, Clone)]
pub struct Marshaller {
    cursor: Cursor<Vec<u8>>,
}

impl Marshaller {
    pub fn new(buf: Vec<u8>) -> Self {
        Self {
            cursor: Cursor::new(buf),
        }
    }

    pub fn seek(&mut self, offset: u64) {
        self.cursor.set_position(offset);
    }

    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.cursor.get_ref()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.cursor.into_inner()
    }

    /// Reads `count` elements of `prim` under `order`.
    ///
    /// `Char` yields the raw block as [`Value::Bytes`]; other types yield a
    /// scalar when `count == 1` and a [`Value::Array`] otherwise.
    pub fn read(&mut self, prim: Prim, count: usize, order: DataEncoding) -> Result<Value> {
        let raw = self.take(prim.width() * count)?;
        if prim.is_raw() {
            return Ok(Value::Bytes(raw.to_vec()));
        }

        let mut items: Vec<Value> = raw
            .chunks_exact(prim.width())
            .map(|chunk| match order {
                DataEncoding::Little => decode::<LE>(prim, chunk),
                DataEncoding::Big => decode::<BE>(prim, chunk),
            })
            .collect();

        Ok(if count == 1 {
            items.remove(0)
        } else {
            Value::Array(items)
        })
    }

    /// Reads `len` raw bytes; byte order never applies.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        Ok(self.take(len)?.to_vec())
    }

    /// Reads up to a NUL terminator, consuming it but leaving it out of the
    /// result.
    pub fn read_cstring(&mut self) -> Result<Vec<u8>> {
        let start = self.position();
        let tail = self.as_bytes().get(start as usize..).unwrap_or(&[]);
        match tail.iter().position(|&b| b == 0) {
            Some(nul) => {
                let s = tail[..nul].to_vec();
                self.seek(start + nul as u64 + 1);
                Ok(s)
            }
            None => Err(ElfError::TruncatedInput {
                offset: start,
                needed: tail.len() as u64 + 1,
                available: tail.len() as u64,
            }),
        }
    }

    /// Reads every field of `schema` in order, descending into nested schemas
    /// before moving on to the next field.
    pub fn read_struct(&mut self, schema: &Schema, order: DataEncoding) -> Result<FieldMap> {
        let mut fields = FieldMap::new();
        for field in schema.fields {
            let value = match field.ty {
                FieldType::Prim(prim) => self.read(prim, field.count, order)?,
                FieldType::Nested(inner) if field.count == 1 => {
                    Value::Struct(self.read_struct(inner, order)?)
                }
                FieldType::Nested(inner) => Value::Array(
                    (0..field.count)
                        .map(|_| self.read_struct(inner, order).map(Value::Struct))
                        .collect::<Result<_>>()?,
                ),
            };
            log::trace!("{}.{} = {}", schema.name, field.name, value);
            fields.push(field.name, value);
        }
        Ok(fields)
    }

    /// Mirror of [`Marshaller::read`]. `value` must have exactly the shape
    /// `count` elements of `prim` would decode to.
    pub fn write(
        &mut self,
        value: &Value,
        prim: Prim,
        count: usize,
        order: DataEncoding,
    ) -> Result<()> {
        let expected = || format!("{count} x {prim}");
        let mut out = vec![0u8; prim.width() * count];

        match value {
            Value::Bytes(b) if prim.is_raw() && b.len() == count => out.copy_from_slice(b),
            Value::Array(items) if !prim.is_raw() && count != 1 && items.len() == count => {
                for (item, chunk) in items.iter().zip(out.chunks_exact_mut(prim.width())) {
                    if !item.is_scalar_of(prim) {
                        return Err(ElfError::mismatch(expected(), format!("{} element", item.kind())));
                    }
                    encode_in(order, item, chunk);
                }
            }
            v if count == 1 && v.is_scalar_of(prim) => encode_in(order, v, &mut out),
            other => return Err(ElfError::mismatch(expected(), other.kind())),
        }

        self.put(&out)
    }

    /// Mirror of [`Marshaller::read_struct`]; fields are written in schema
    /// order and looked up in `fields` by name.
    pub fn write_struct(
        &mut self,
        fields: &FieldMap,
        schema: &Schema,
        order: DataEncoding,
    ) -> Result<()> {
        for field in schema.fields {
            let value = fields.require(field.name)?;
            match (field.ty, value) {
                (FieldType::Prim(prim), v) => self.write(v, prim, field.count, order)?,
                (FieldType::Nested(inner), Value::Struct(map)) if field.count == 1 => {
                    self.write_struct(map, inner, order)?
                }
                (FieldType::Nested(inner), Value::Array(items)) if items.len() == field.count => {
                    for item in items {
                        match item {
                            Value::Struct(map) => self.write_struct(map, inner, order)?,
                            other => {
                                return Err(ElfError::mismatch(
                                    format!("{} `{}`", inner.name, field.name),
                                    other.kind(),
                                ))
                            }
                        }
                    }
                }
                (FieldType::Nested(inner), other) => {
                    return Err(ElfError::mismatch(
                        format!("{} x {} `{}`", field.count, inner.name, field.name),
                        other.kind(),
                    ))
                }
            }
        }
        Ok(())
    }

    fn take(&mut self, len: usize) -> Result<&[u8]> {
        let offset = self.position();
        let available = (self.as_bytes().len() as u64).saturating_sub(offset);
        if available < len as u64 {
            return Err(ElfError::TruncatedInput {
                offset,
                needed: len as u64,
                available,
            });
        }
        self.seek(offset + len as u64);
        let start = offset as usize;
        Ok(&self.cursor.get_ref()[start..start + len])
    }

    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        let offset = self.position();
        let out_of_range = || ElfError::WriteOutOfRange {
            offset,
            len: bytes.len() as u64,
        };
        let start = usize::try_from(offset).map_err(|_| out_of_range())?;
        let end = start.checked_add(bytes.len()).ok_or_else(out_of_range)?;

        let buf = self.cursor.get_mut();
        if buf.len() < end {
            buf.try_reserve(end - buf.len()).map_err(|_| out_of_range())?;
            buf.resize(end, 0);
        }
        buf[start..end].copy_from_slice(bytes);
        self.seek(end as u64);
        Ok(())
    }
}

fn decode<B: ByteOrder>(prim: Prim, b: &[u8]) -> Value {
    match prim {
        Prim::Int8 => Value::I8(b[0] as i8),
        Prim::UInt8 => Value::U8(b[0]),
        Prim::Int16 => Value::I16(B::read_i16(b)),
        Prim::UInt16 => Value::U16(B::read_u16(b)),
        Prim::Int32 => Value::I32(B::read_i32(b)),
        Prim::UInt32 => Value::U32(B::read_u32(b)),
        Prim::Int64 => Value::I64(B::read_i64(b)),
        Prim::UInt64 => Value::U64(B::read_u64(b)),
        Prim::Float32 => Value::F32(B::read_f32(b)),
        Prim::Float64 => Value::F64(B::read_f64(b)),
        Prim::Char => Value::Bytes(b.to_vec()),
    }
}

fn encode_in(order: DataEncoding, value: &Value, out: &mut [u8]) {
    match order {
        DataEncoding::Little => encode::<LE>(value, out),
        DataEncoding::Big => encode::<BE>(value, out),
    }
}

// Callers have already checked that `value` is a scalar sized to `out`.
fn encode<B: ByteOrder>(value: &Value, out: &mut [u8]) {
    match *value {
        Value::I8(v) => out[0] = v as u8,
        Value::U8(v) => out[0] = v,
        Value::I16(v) => B::write_i16(out, v),
        Value::U16(v) => B::write_u16(out, v),
        Value::I32(v) => B::write_i32(out, v),
        Value::U32(v) => B::write_u32(out, v),
        Value::I64(v) => B::write_i64(out, v),
        Value::U64(v) => B::write_u64(out, v),
        Value::F32(v) => B::write_f32(out, v),
        Value::F64(v) => B::write_f64(out, v),
        Value::Bytes(_) | Value::Array(_) | Value::Struct(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::elf::{IDENT, PHDR64};
    use crate::schema::Field;

    static IDENT_PAIR: Schema = Schema {
        name: "IdentPair",
        fields: &[
            Field::prim("tag", Prim::UInt16),
            Field {
                name: "idents",
                ty: FieldType::Nested(&IDENT),
                count: 2,
            },
        ],
    };

    fn ident_bytes(class: u8, pad_tail: u8) -> Vec<u8> {
        let mut b = b"\x7fELF".to_vec();
        b.extend_from_slice(&[class, 1, 1, 0, 0]);
        b.resize(16, 0);
        b[15] = pad_tail;
        b
    }

    #[test]
    fn byte_order_is_honoured() {
        let mut bm = Marshaller::new(vec![0x02, 0x00]);
        assert_eq!(bm.read(Prim::UInt16, 1, DataEncoding::Little).unwrap(), Value::U16(2));
        bm.seek(0);
        assert_eq!(bm.read(Prim::UInt16, 1, DataEncoding::Big).unwrap(), Value::U16(512));
    }

    #[test]
    fn raw_blocks_ignore_byte_order() {
        let mut bm = Marshaller::new(vec![1, 2, 3, 0, 0]);
        assert_eq!(
            bm.read(Prim::Char, 4, DataEncoding::Big).unwrap(),
            Value::Bytes(vec![1, 2, 3, 0])
        );
        assert_eq!(bm.position(), 4);
    }

    #[test]
    fn repeated_scalars_become_arrays() {
        let mut bm = Marshaller::new(vec![1, 0, 2, 0]);
        assert_eq!(
            bm.read(Prim::UInt16, 2, DataEncoding::Little).unwrap(),
            Value::Array(vec![Value::U16(1), Value::U16(2)])
        );
    }

    #[test]
    fn short_read_is_truncation() {
        let mut bm = Marshaller::new(vec![0; 6]);
        bm.seek(4);
        assert_eq!(
            bm.read(Prim::UInt32, 1, DataEncoding::Little),
            Err(ElfError::TruncatedInput {
                offset: 4,
                needed: 4,
                available: 2
            })
        );
    }

    #[test]
    fn seek_past_end_fails_on_next_read() {
        let mut bm = Marshaller::new(vec![0; 4]);
        bm.seek(100);
        assert_eq!(bm.position(), 100);
        assert!(matches!(
            bm.read(Prim::UInt8, 1, DataEncoding::Little),
            Err(ElfError::TruncatedInput { available: 0, .. })
        ));
    }

    #[test]
    fn write_rejects_wrong_shape() {
        let mut bm = Marshaller::new(Vec::new());
        let le = DataEncoding::Little;
        assert!(matches!(
            bm.write(&Value::U32(1), Prim::UInt16, 1, le),
            Err(ElfError::SchemaMismatch { .. })
        ));
        assert!(matches!(
            bm.write(&Value::Bytes(vec![1, 2]), Prim::Char, 3, le),
            Err(ElfError::SchemaMismatch { .. })
        ));
        assert!(matches!(
            bm.write(&Value::U16(1), Prim::UInt16, 2, le),
            Err(ElfError::SchemaMismatch { .. })
        ));
        assert!(bm.as_bytes().is_empty());
    }

    #[test]
    fn write_past_end_zero_fills() {
        let mut bm = Marshaller::new(vec![0xaa]);
        bm.seek(3);
        bm.write(&Value::U16(0x0102), Prim::UInt16, 1, DataEncoding::Big)
            .unwrap();
        assert_eq!(bm.into_inner(), vec![0xaa, 0, 0, 1, 2]);
    }

    #[test]
    fn struct_round_trip() {
        let bytes: Vec<u8> = (0u8..56).collect();
        let mut bm = Marshaller::new(bytes.clone());
        let fields = bm.read_struct(&PHDR64, DataEncoding::Big).unwrap();
        assert_eq!(fields.len(), PHDR64.fields.len());
        assert_eq!(fields.unsigned("p_type").unwrap(), 0x00010203);

        let mut out = Marshaller::new(Vec::new());
        out.write_struct(&fields, &PHDR64, DataEncoding::Big).unwrap();
        assert_eq!(out.as_bytes(), &bytes[..]);

        let mut again = Marshaller::new(out.into_inner());
        assert_eq!(again.read_struct(&PHDR64, DataEncoding::Big).unwrap(), fields);
    }

    #[test]
    fn struct_preserves_schema_order() {
        let mut ident = b"\x7fELF\x02\x01\x01".to_vec();
        ident.resize(16, 0);
        let mut bm = Marshaller::new(ident);
        let fields = bm.read_struct(&IDENT, DataEncoding::Big).unwrap();
        let names: Vec<_> = fields.iter().map(|(n, _)| n).collect();
        let expected: Vec<_> = IDENT.fields.iter().map(|f| f.name).collect();
        assert_eq!(names, expected);
        assert_eq!(fields.bytes("EI_PAD").unwrap(), &[0u8; 7]);
    }

    #[test]
    fn cstring_stops_at_nul() {
        let mut bm = Marshaller::new(b".text\0.data".to_vec());
        assert_eq!(bm.read_cstring().unwrap(), b".text");
        assert_eq!(bm.position(), 6);
        assert!(matches!(
            bm.read_cstring(),
            Err(ElfError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn write_beyond_addressable_range_fails() {
        let mut bm = Marshaller::new(vec![0xaa; 4]);
        bm.seek(u64::MAX - 8);
        assert_eq!(
            bm.write(&Value::U64(1), Prim::UInt64, 1, DataEncoding::Little),
            Err(ElfError::WriteOutOfRange {
                offset: u64::MAX - 8,
                len: 8
            })
        );
        assert_eq!(bm.into_inner(), vec![0xaa; 4]);
    }

    #[test]
    fn repeated_nested_schema_reads_array_of_structs() {
        let mut bytes = vec![0x00, 0x07];
        bytes.extend(ident_bytes(1, 0x11));
        bytes.extend(ident_bytes(2, 0x22));
        let mut bm = Marshaller::new(bytes.clone());

        let fields = bm.read_struct(&IDENT_PAIR, DataEncoding::Big).unwrap();
        assert_eq!(bm.position(), IDENT_PAIR.size() as u64);
        assert_eq!(fields.unsigned("tag").unwrap(), 7);
        let idents = match fields.require("idents").unwrap() {
            Value::Array(items) => items,
            other => panic!("expected array, got {}", other.kind()),
        };
        assert_eq!(idents.len(), 2);
        match (&idents[0], &idents[1]) {
            (Value::Struct(first), Value::Struct(second)) => {
                assert_eq!(first.unsigned("EI_CLASS").unwrap(), 1);
                assert_eq!(second.unsigned("EI_CLASS").unwrap(), 2);
                assert_eq!(second.bytes("EI_PAD").unwrap()[6], 0x22);
            }
            other => panic!("expected structs, got {:?}", other),
        }

        let mut out = Marshaller::new(Vec::new());
        out.write_struct(&fields, &IDENT_PAIR, DataEncoding::Big)
            .unwrap();
        assert_eq!(out.into_inner(), bytes);
    }

    #[test]
    fn repeated_nested_schema_rejects_wrong_length() {
        let mut bytes = vec![0x00, 0x07];
        bytes.extend(ident_bytes(1, 0));
        bytes.extend(ident_bytes(1, 0));
        let fields = Marshaller::new(bytes)
            .read_struct(&IDENT_PAIR, DataEncoding::Big)
            .unwrap();
        let Some(Value::Array(items)) = fields.get("idents") else {
            panic!("expected array");
        };

        let mut short = FieldMap::new();
        short.push("tag", Value::U16(7));
        short.push("idents", Value::Array(items[..1].to_vec()));
        let mut out = Marshaller::new(Vec::new());
        assert!(matches!(
            out.write_struct(&short, &IDENT_PAIR, DataEncoding::Big),
            Err(ElfError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn write_struct_requires_every_field() {
        let mut bm = Marshaller::new((0u8..56).collect());
        let full = bm.read_struct(&PHDR64, DataEncoding::Little).unwrap();
        let mut partial = FieldMap::new();
        for (name, value) in full.iter().filter(|(n, _)| *n != "p_align") {
            partial.push(name, value.clone());
        }

        let mut out = Marshaller::new(Vec::new());
        assert!(matches!(
            out.write_struct(&partial, &PHDR64, DataEncoding::Little),
            Err(ElfError::SchemaMismatch { .. })
        ));
    }
}
