use goblin::elf::header::SELFMAG;

use crate::header::file::FileHeader;
use crate::header::ident::{DataEncoding, Ident};
use crate::header::program::ProgramHeader;
use crate::header::section::SectionHeader;
use crate::header::Record;
use crate::marshal::Marshaller;
use crate::schema::elf::{Layout, IDENT};
use crate::schema::Schema;
use crate::{HeaderModel, Result};

/// Byte order used for the identification block, before `EI_DATA` is known.
///
/// Only sound while [`IDENT`] holds nothing but single bytes and raw blocks.
/// Adding a multi-byte scalar to that schema breaks the bootstrap.
const NOMINAL_ORDER: DataEncoding = DataEncoding::Big;

/// Progress of a single parse. Every state can fall through to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParseState {
    Unparsed,
    IdentificationRead,
    ClassResolved,
    HeaderRead,
    ProgramHeadersRead,
    SectionHeadersRead,
    Parsed,
    Failed,
}

struct Parser {
    bm: Marshaller,
    state: ParseState,
}

impl Parser {
    fn advance(&mut self, next: ParseState) {
        log::debug!("{:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn read_ident(&mut self) -> Result<Ident> {
        debug_assert!(IDENT.is_order_independent());

        // Check the magic on its own so a foreign file is rejected without
        // touching anything past it.
        self.bm.seek(0);
        let magic = self.bm.read_bytes(SELFMAG)?;
        Ident::check_magic(&magic)?;

        self.bm.seek(0);
        let fields = self.bm.read_struct(&IDENT, NOMINAL_ORDER)?;
        Ident::from_fields(&fields)
    }

    fn read_table<R: Record>(
        &mut self,
        schema: &Schema,
        offset: u64,
        count: u16,
        order: DataEncoding,
    ) -> Result<Vec<R>> {
        self.bm.seek(offset);
        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let fields = self.bm.read_struct(schema, order)?;
            entries.push(R::from_fields(&fields)?);
        }
        Ok(entries)
    }

    fn run(&mut self) -> Result<(Layout, FileHeader, Vec<ProgramHeader>, Vec<SectionHeader>)> {
        let ident = self.read_ident()?;
        self.advance(ParseState::IdentificationRead);

        let layout = Layout::for_class(ident.class);
        self.advance(ParseState::ClassResolved);

        // The byte order is fixed from here on.
        let order = ident.encoding;
        self.bm.seek(0);
        let fields = self.bm.read_struct(layout.ehdr, order)?;
        let header = FileHeader::from_fields(&fields)?;
        self.advance(ParseState::HeaderRead);

        let phdrs: Vec<ProgramHeader> =
            self.read_table(layout.phdr, header.e_phoff, header.e_phnum, order)?;
        self.advance(ParseState::ProgramHeadersRead);

        let shdrs: Vec<SectionHeader> =
            self.read_table(layout.shdr, header.e_shoff, header.e_shnum, order)?;
        self.advance(ParseState::SectionHeadersRead);

        Ok((layout, header, phdrs, shdrs))
    }
}

/// Runs the header parse to completion over `bytes`.
///
/// There is no partial result: any failure aborts the whole parse.
pub(crate) fn parse(bytes: Vec<u8>) -> Result<HeaderModel> {
    let mut parser = Parser {
        bm: Marshaller::new(bytes),
        state: ParseState::Unparsed,
    };

    let (layout, header, phdrs, shdrs) = match parser.run() {
        Ok(parts) => parts,
        Err(e) => {
            log::debug!("{}", e);
            parser.advance(ParseState::Failed);
            return Err(e);
        }
    };
    parser.advance(ParseState::Parsed);

    log::info!(
        "Parsed {:?} {:?} ELF: {} program headers, {} section headers",
        layout.class,
        header.ident.encoding,
        phdrs.len(),
        shdrs.len()
    );

    Ok(HeaderModel::from_parts(
        parser.bm.into_inner(),
        layout,
        header,
        phdrs,
        shdrs,
    ))
}
