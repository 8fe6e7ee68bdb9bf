pub mod elf;

use crate::types::Prim;

/// The type of a schema field: either a primitive or a whole nested schema.
#[derive(Debug, Clone, Copy)]
pub enum FieldType {
    Prim(Prim),
    Nested(&'static Schema),
}

/// One named field of a schema, repeated `count` times.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
    pub count: usize,
}

impl Field {
    pub const fn prim(name: &'static str, prim: Prim) -> Self {
        Self::repeated(name, prim, 1)
    }

    pub const fn repeated(name: &'static str, prim: Prim, count: usize) -> Self {
        Self {
            name,
            ty: FieldType::Prim(prim),
            count,
        }
    }

    pub const fn nested(name: &'static str, schema: &'static Schema) -> Self {
        Self {
            name,
            ty: FieldType::Nested(schema),
            count: 1,
        }
    }

    pub fn size(&self) -> usize {
        let element = match self.ty {
            FieldType::Prim(p) => p.width(),
            FieldType::Nested(s) => s.size(),
        };
        element * self.count
    }
}

/// An ordered list of fields describing a fixed-layout record.
#[derive(Debug)]
pub struct Schema {
    pub name: &'static str,
    pub fields: &'static [Field],
}

impl Schema {
    /// Encoded size of one record in bytes.
    pub fn size(&self) -> usize {
        self.fields.iter().map(Field::size).sum()
    }

    /// True when no field, however deeply nested, is a multi-byte scalar, so
    /// the record decodes identically under either byte order.
    pub fn is_order_independent(&self) -> bool {
        self.fields.iter().all(|f| match f.ty {
            FieldType::Prim(p) => p.is_raw() || p.width() == 1,
            FieldType::Nested(s) => s.is_order_independent(),
        })
    }
}
