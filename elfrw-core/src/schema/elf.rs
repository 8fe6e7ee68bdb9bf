//! Fixed ELF record layouts.
//!
//! Narrow (ELFCLASS32) and wide (ELFCLASS64) variants are separate schemas.
//! They are picked once, when the class byte is resolved, and carried as a
//! [`Layout`] for the rest of the parse.

use goblin::elf::header::{SELFMAG, SIZEOF_IDENT};

use super::{Field, Schema};
use crate::header::ident::Class;
use crate::types::*;

/// Identification block (`e_ident`).
pub static IDENT: Schema = Schema {
    name: "Elf_Ident",
    fields: &[
        Field::repeated("ELF_MAG", Prim::Char, SELFMAG),
        Field::prim("EI_CLASS", Prim::UInt8),
        Field::prim("EI_DATA", Prim::UInt8),
        Field::prim("EI_VERSION", Prim::UInt8),
        Field::prim("EI_OSABI", Prim::UInt8),
        Field::prim("EI_ABIVERSION", Prim::UInt8),
        Field::repeated("EI_PAD", Prim::Char, SIZEOF_IDENT - SELFMAG - 5),
    ],
};

pub static EHDR32: Schema = Schema {
    name: "Elf32_Ehdr",
    fields: &[
        Field::nested("e_ident", &IDENT),
        Field::prim("e_type", ELF32_HALF),
        Field::prim("e_machine", ELF32_HALF),
        Field::prim("e_version", ELF32_WORD),
        Field::prim("e_entry", ELF32_ADDR),
        Field::prim("e_phoff", ELF32_OFF),
        Field::prim("e_shoff", ELF32_OFF),
        Field::prim("e_flags", ELF32_WORD),
        Field::prim("e_ehsize", ELF32_HALF),
        Field::prim("e_phentsize", ELF32_HALF),
        Field::prim("e_phnum", ELF32_HALF),
        Field::prim("e_shentsize", ELF32_HALF),
        Field::prim("e_shnum", ELF32_HALF),
        Field::prim("e_shstrndx", ELF32_HALF),
    ],
};

pub static EHDR64: Schema = Schema {
    name: "Elf64_Ehdr",
    fields: &[
        Field::nested("e_ident", &IDENT),
        Field::prim("e_type", ELF64_HALF),
        Field::prim("e_machine", ELF64_HALF),
        Field::prim("e_version", ELF64_WORD),
        Field::prim("e_entry", ELF64_ADDR),
        Field::prim("e_phoff", ELF64_OFF),
        Field::prim("e_shoff", ELF64_OFF),
        Field::prim("e_flags", ELF64_WORD),
        Field::prim("e_ehsize", ELF64_HALF),
        Field::prim("e_phentsize", ELF64_HALF),
        Field::prim("e_phnum", ELF64_HALF),
        Field::prim("e_shentsize", ELF64_HALF),
        Field::prim("e_shnum", ELF64_HALF),
        Field::prim("e_shstrndx", ELF64_HALF),
    ],
};

pub static PHDR32: Schema = Schema {
    name: "Elf32_Phdr",
    fields: &[
        Field::prim("p_type", ELF32_WORD),
        Field::prim("p_offset", ELF32_OFF),
        Field::prim("p_vaddr", ELF32_ADDR),
        Field::prim("p_paddr", ELF32_ADDR),
        Field::prim("p_filesz", ELF32_WORD),
        Field::prim("p_memsz", ELF32_WORD),
        Field::prim("p_flags", ELF32_WORD),
        Field::prim("p_align", ELF32_WORD),
    ],
};

// p_flags moves up next to p_type so the 64-bit fields stay 8-aligned.
pub static PHDR64: Schema = Schema {
    name: "Elf64_Phdr",
    fields: &[
        Field::prim("p_type", ELF64_WORD),
        Field::prim("p_flags", ELF64_WORD),
        Field::prim("p_offset", ELF64_OFF),
        Field::prim("p_vaddr", ELF64_ADDR),
        Field::prim("p_paddr", ELF64_ADDR),
        Field::prim("p_filesz", ELF64_XWORD),
        Field::prim("p_memsz", ELF64_XWORD),
        Field::prim("p_align", ELF64_XWORD),
    ],
};

pub static SHDR32: Schema = Schema {
    name: "Elf32_Shdr",
    fields: &[
        Field::prim("sh_name", ELF32_WORD),
        Field::prim("sh_type", ELF32_WORD),
        Field::prim("sh_flags", ELF32_WORD),
        Field::prim("sh_addr", ELF32_ADDR),
        Field::prim("sh_offset", ELF32_OFF),
        Field::prim("sh_size", ELF32_WORD),
        Field::prim("sh_link", ELF32_WORD),
        Field::prim("sh_info", ELF32_WORD),
        Field::prim("sh_addralign", ELF32_WORD),
        Field::prim("sh_entsize", ELF32_WORD),
    ],
};

pub static SHDR64: Schema = Schema {
    name: "Elf64_Shdr",
    fields: &[
        Field::prim("sh_name", ELF64_WORD),
        Field::prim("sh_type", ELF64_WORD),
        Field::prim("sh_flags", ELF64_XWORD),
        Field::prim("sh_addr", ELF64_ADDR),
        Field::prim("sh_offset", ELF64_OFF),
        Field::prim("sh_size", ELF64_XWORD),
        Field::prim("sh_link", ELF64_WORD),
        Field::prim("sh_info", ELF64_WORD),
        Field::prim("sh_addralign", ELF64_XWORD),
        Field::prim("sh_entsize", ELF64_XWORD),
    ],
};

/// The header, program-header and section-header schemas of one class.
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub class: Class,
    pub ehdr: &'static Schema,
    pub phdr: &'static Schema,
    pub shdr: &'static Schema,
}

impl Layout {
    pub fn for_class(class: Class) -> Self {
        match class {
            Class::Elf32 => Layout {
                class,
                ehdr: &EHDR32,
                phdr: &PHDR32,
                shdr: &SHDR32,
            },
            Class::Elf64 => Layout {
                class,
                ehdr: &EHDR64,
                phdr: &PHDR64,
                shdr: &SHDR64,
            },
        }
    }
}
