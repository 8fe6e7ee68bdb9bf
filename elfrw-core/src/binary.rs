use crate::header::file::FileHeader;
use crate::header::ident::{Class, DataEncoding, Ident};
use crate::header::program::ProgramHeader;
use crate::header::section::SectionHeader;
use crate::header::Record;
use crate::marshal::{FieldMap, Marshaller};
use crate::schema::elf::{Layout, IDENT};
use crate::Result;

/// The parsed headers of one ELF image.
///
/// Owns the buffer it was parsed from, so emitting writes the headers back
/// over an otherwise untouched copy of the original bytes.
///
/// Fields may be edited freely between [`HeaderModel::parse`] and
/// [`HeaderModel::emit`]. Keeping `e_phnum`/`e_phoff` and
/// `e_shnum`/`e_shoff` consistent with the header vectors is the caller's
/// job: emit writes whatever it is given, and tables that overlap or run past
/// the end of the buffer are written as-is.
#[derive(Debug, Clone)]
pub struct HeaderModel {
    pub header: FileHeader,
    pub program_headers: Vec<ProgramHeader>,
    pub section_headers: Vec<SectionHeader>,
    layout: Layout,
    encoding: DataEncoding,
    buffer: Vec<u8>,
}

/// Field-name to value view of a [`HeaderModel`], in on-disk field order.
#[derive(Debug, Clone, PartialEq)]
pub struct Description {
    pub ident: FieldMap,
    pub header: FieldMap,
    pub program_headers: Vec<FieldMap>,
    pub section_headers: Vec<FieldMap>,
}

impl HeaderModel {
    /// Parses the ELF identification, file header, program header table and
    /// section header table out of `bytes`.
    pub fn parse(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        crate::parser::parse(bytes.into())
    }

    pub(crate) fn from_parts(
        buffer: Vec<u8>,
        layout: Layout,
        header: FileHeader,
        program_headers: Vec<ProgramHeader>,
        section_headers: Vec<SectionHeader>,
    ) -> Self {
        Self {
            encoding: header.ident.encoding,
            header,
            program_headers,
            section_headers,
            layout,
            buffer,
        }
    }

    pub fn ident(&self) -> &Ident {
        &self.header.ident
    }

    /// Class resolved at parse time. Emission keeps using it even if
    /// `ident.class` is edited afterwards.
    pub fn class(&self) -> Class {
        self.layout.class
    }

    /// Byte order resolved at parse time, likewise fixed for emission.
    pub fn encoding(&self) -> DataEncoding {
        self.encoding
    }

    /// Writes the headers back into a copy of the original buffer.
    ///
    /// The file header goes at offset 0, then each program header in order
    /// from `e_phoff`, then each section header in order from `e_shoff`. Every
    /// record is laid out before anything is written, so a schema mismatch
    /// leaves no output at all.
    pub fn emit(&self) -> Result<Vec<u8>> {
        let layout = self.layout;
        let order = self.encoding;

        if self.program_headers.len() != self.header.e_phnum as usize {
            log::warn!(
                "Emitting {} program headers but e_phnum is {}",
                self.program_headers.len(),
                self.header.e_phnum
            );
        }
        if self.section_headers.len() != self.header.e_shnum as usize {
            log::warn!(
                "Emitting {} section headers but e_shnum is {}",
                self.section_headers.len(),
                self.header.e_shnum
            );
        }

        let ehdr = self.header.to_fields(layout.ehdr)?;
        let phdrs = lay_out(&self.program_headers, layout.phdr)?;
        let shdrs = lay_out(&self.section_headers, layout.shdr)?;

        let mut bm = Marshaller::new(self.buffer.clone());
        bm.seek(0);
        bm.write_struct(&ehdr, layout.ehdr, order)?;

        bm.seek(self.header.e_phoff);
        for phdr in &phdrs {
            bm.write_struct(phdr, layout.phdr, order)?;
        }

        bm.seek(self.header.e_shoff);
        for shdr in &shdrs {
            bm.write_struct(shdr, layout.shdr, order)?;
        }

        log::debug!("Emitted {} bytes", bm.as_bytes().len());
        Ok(bm.into_inner())
    }

    /// Field-name to value maps for the ident, file header and every table
    /// entry, for export.
    pub fn describe(&self) -> Result<Description> {
        Ok(Description {
            ident: self.header.ident.to_fields(&IDENT)?,
            header: self.header.to_fields(self.layout.ehdr)?,
            program_headers: lay_out(&self.program_headers, self.layout.phdr)?,
            section_headers: lay_out(&self.section_headers, self.layout.shdr)?,
        })
    }
}

fn lay_out<R: Record>(records: &[R], schema: &crate::schema::Schema) -> Result<Vec<FieldMap>> {
    records.iter().map(|r| r.to_fields(schema)).collect()
}
