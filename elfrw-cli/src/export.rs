//! JSON export of a [`Description`], shaped `{"ELF": {"ehdr", "phdrs", "shdrs"}}`.

use elfrw_core::{Description, FieldMap, Value};
use serde::ser::{Serialize, SerializeMap, Serializer};

#[derive(serde::Serialize)]
struct Document<'a> {
    #[serde(rename = "ELF")]
    elf: Elf<'a>,
}

#[derive(serde::Serialize)]
struct Elf<'a> {
    ehdr: Fields<'a>,
    phdrs: Vec<Fields<'a>>,
    shdrs: Vec<Fields<'a>>,
}

/// Serialises a field map as an object, keeping schema order.
struct Fields<'a>(&'a FieldMap);

struct Json<'a>(&'a Value);

impl Serialize for Fields<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in self.0.iter() {
            map.serialize_entry(name, &Json(value))?;
        }
        map.end()
    }
}

impl Serialize for Json<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::I8(v) => serializer.serialize_i8(*v),
            Value::U8(v) => serializer.serialize_u8(*v),
            Value::I16(v) => serializer.serialize_i16(*v),
            Value::U16(v) => serializer.serialize_u16(*v),
            Value::I32(v) => serializer.serialize_i32(*v),
            Value::U32(v) => serializer.serialize_u32(*v),
            Value::I64(v) => serializer.serialize_i64(*v),
            Value::U64(v) => serializer.serialize_u64(*v),
            Value::F32(v) => serializer.serialize_f32(*v),
            Value::F64(v) => serializer.serialize_f64(*v),
            // Raw blocks print as hex, same as `Display`.
            Value::Bytes(_) => serializer.serialize_str(&self.0.to_string()),
            Value::Array(items) => serializer.collect_seq(items.iter().map(Json)),
            Value::Struct(fields) => Fields(fields).serialize(serializer),
        }
    }
}

pub fn to_json(desc: &Description) -> serde_json::Result<String> {
    let doc = Document {
        elf: Elf {
            ehdr: Fields(&desc.header),
            phdrs: desc.program_headers.iter().map(Fields).collect(),
            shdrs: desc.section_headers.iter().map(Fields).collect(),
        },
    };
    serde_json::to_string_pretty(&doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident() -> FieldMap {
        let mut ident = FieldMap::new();
        ident.push("ELF_MAG", Value::Bytes(b"\x7fELF".to_vec()));
        ident.push("EI_CLASS", Value::U8(2));
        ident
    }

    #[test]
    fn keeps_field_order_and_nesting() {
        let mut header = FieldMap::new();
        header.push("e_ident", Value::Struct(ident()));
        header.push("e_type", Value::U16(2));
        header.push("e_entry", Value::U64(0x401000));

        let mut phdr = FieldMap::new();
        phdr.push("p_type", Value::U32(1));
        phdr.push("p_flags", Value::U32(5));

        let desc = Description {
            ident: ident(),
            header,
            program_headers: vec![phdr],
            section_headers: Vec::new(),
        };
        let json = to_json(&desc).unwrap();

        let e_ident = json.find("\"e_ident\"").unwrap();
        let e_type = json.find("\"e_type\"").unwrap();
        let e_entry = json.find("\"e_entry\"").unwrap();
        assert!(e_ident < e_type && e_type < e_entry);
        assert!(json.contains("\"ELF_MAG\": \"7f454c46\""));
        assert!(json.find("\"p_type\"").unwrap() < json.find("\"p_flags\"").unwrap());

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["ELF"]["ehdr"]["e_entry"], 0x401000);
        assert_eq!(parsed["ELF"]["ehdr"]["e_ident"]["EI_CLASS"], 2);
        assert_eq!(parsed["ELF"]["shdrs"], serde_json::json!([]));
    }
}
