pub mod file;
pub mod ident;
pub mod program;
pub mod section;

use crate::marshal::FieldMap;
use crate::schema::{Field, FieldType, Schema};
use crate::types::Value;
use crate::{ElfError, Result};

pub trait Header: std::fmt::Debug {
    /// Returns the virtual address of the entry point.
    fn entry_point(&self) -> u64;

    /// Returns the machine architecture identifier.
    fn machine(&self) -> u16;

    /// Returns true if this is a 64-bit binary.
    fn is_64(&self) -> bool;

    /// Returns a short human-readable name, e.g. "ELF".
    fn format_name(&self) -> &'static str;

    /// Returns true if the binary represents an executable (vs object/lib).
    fn is_executable(&self) -> bool;
}

/// A fixed-shape record that converts to and from the marshaller's
/// [`FieldMap`].
///
/// Record members are width-independent (addresses are always `u64`); the
/// schema passed to [`Record::to_fields`] decides the on-disk width and order.
pub trait Record: Sized {
    fn from_fields(fields: &FieldMap) -> Result<Self>;

    fn to_fields(&self, schema: &Schema) -> Result<FieldMap>;
}

/// Reads an unsigned member and narrows it to the record's Rust type.
pub(crate) fn member<T: TryFrom<u64>>(fields: &FieldMap, name: &str) -> Result<T> {
    let v = fields.unsigned(name)?;
    T::try_from(v).map_err(|_| {
        ElfError::mismatch(
            format!("`{name}` within {} bits", std::mem::size_of::<T>() * 8),
            format!("{v:#x}"),
        )
    })
}

/// Builds a field map in `schema` order, asking `value_of` for each field.
pub(crate) fn layout_fields(
    schema: &Schema,
    mut value_of: impl FnMut(&Field) -> Result<Value>,
) -> Result<FieldMap> {
    let mut fields = FieldMap::new();
    for field in schema.fields {
        fields.push(field.name, value_of(field)?);
    }
    Ok(fields)
}

/// Encodes `v` as the single unsigned scalar `field` declares.
pub(crate) fn unsigned_field(field: &Field, v: Option<u64>) -> Result<Value> {
    match (field.ty, v) {
        (FieldType::Prim(prim), Some(v)) if field.count == 1 => Value::unsigned(prim, v),
        _ => Err(ElfError::mismatch(
            format!("record member for `{}`", field.name),
            "none",
        )),
    }
}
