use anyhow::Result;
use colored::Colorize;
use elfrw_core::{Header, HeaderModel, ProgramHeader, SectionHeader};
use goblin::elf::header::{et_to_str, machine_to_str};
use goblin::elf::program_header::{pt_to_str, PF_R, PF_W, PF_X};
use goblin::elf::section_header::sht_to_str;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Settings for the human-readable dump, passed in rather than read from
/// globals.
#[derive(Debug, Clone, Copy)]
pub struct DumpConfig {
    pub silent: bool,
    pub color: bool,
}

impl DumpConfig {
    fn heading(&self, title: &str) -> String {
        if self.color {
            title.bold().cyan().to_string()
        } else {
            title.to_string()
        }
    }
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    name: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct PhdrRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Flags")]
    flags: String,
    #[tabled(rename = "Offset")]
    offset: String,
    #[tabled(rename = "VirtAddr")]
    vaddr: String,
    #[tabled(rename = "PhysAddr")]
    paddr: String,
    #[tabled(rename = "FileSiz")]
    filesz: String,
    #[tabled(rename = "MemSiz")]
    memsz: String,
    #[tabled(rename = "Align")]
    align: String,
}

#[derive(Tabled)]
struct ShdrRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Flags")]
    flags: String,
    #[tabled(rename = "Addr")]
    addr: String,
    #[tabled(rename = "Offset")]
    offset: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Link")]
    link: u32,
    #[tabled(rename = "Info")]
    info: u32,
    #[tabled(rename = "Align")]
    align: String,
    #[tabled(rename = "EntSize")]
    entsize: String,
}

fn segment_flags(flags: u32) -> String {
    [(PF_R, 'R'), (PF_W, 'W'), (PF_X, 'X')]
        .iter()
        .map(|&(bit, c)| if flags & bit != 0 { c } else { ' ' })
        .collect()
}

fn phdr_row(index: usize, p: &ProgramHeader) -> PhdrRow {
    PhdrRow {
        index,
        kind: pt_to_str(p.p_type).to_string(),
        flags: segment_flags(p.p_flags),
        offset: format!("{:#x}", p.p_offset),
        vaddr: format!("{:#x}", p.p_vaddr),
        paddr: format!("{:#x}", p.p_paddr),
        filesz: format!("{:#x}", p.p_filesz),
        memsz: format!("{:#x}", p.p_memsz),
        align: format!("{:#x}", p.p_align),
    }
}

// Section names live in the string table, which is never read; show the
// offset into it instead.
fn shdr_row(index: usize, s: &SectionHeader) -> ShdrRow {
    ShdrRow {
        index,
        name: format!("+{:#x}", s.sh_name),
        kind: sht_to_str(s.sh_type).to_string(),
        flags: format!("{:#x}", s.sh_flags),
        addr: format!("{:#x}", s.sh_addr),
        offset: format!("{:#x}", s.sh_offset),
        size: format!("{:#x}", s.sh_size),
        link: s.sh_link,
        info: s.sh_info,
        align: format!("{:#x}", s.sh_addralign),
        entsize: format!("{:#x}", s.sh_entsize),
    }
}

fn render<T: Tabled>(rows: impl IntoIterator<Item = T>) -> String {
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

/// Prints the file header and both header tables, unless silenced.
pub fn print(model: &HeaderModel, config: &DumpConfig) -> Result<()> {
    if config.silent {
        return Ok(());
    }

    let desc = model.describe()?;
    let hdr = &model.header;

    println!(
        "{} ({:?}, {:?}-endian, {})",
        config.heading("EHDR"),
        model.class(),
        model.encoding(),
        if hdr.is_executable() { "executable" } else { "not executable" },
    );
    let rows = desc
        .header
        .iter()
        .filter(|(name, _)| *name != "e_ident")
        .map(|(name, value)| {
            let value = match name {
                "e_type" => format!("{value} ({})", et_to_str(hdr.e_type)),
                "e_machine" => format!("{value} ({})", machine_to_str(hdr.machine())),
                _ => value.to_string(),
            };
            FieldRow { name, value }
        });
    let ident = desc.ident.iter().map(|(name, value)| FieldRow {
        name,
        value: value.to_string(),
    });
    println!("{}", render(ident.chain(rows)));

    println!("{}", config.heading("PHDR"));
    if model.program_headers.is_empty() {
        println!("No program headers.");
    } else {
        println!(
            "{}",
            render(model.program_headers.iter().enumerate().map(|(i, p)| phdr_row(i, p)))
        );
    }

    println!("{}", config.heading("SHDR"));
    if model.section_headers.is_empty() {
        println!("No section headers.");
    } else {
        println!(
            "{}",
            render(model.section_headers.iter().enumerate().map(|(i, s)| shdr_row(i, s)))
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_render_like_readelf() {
        assert_eq!(segment_flags(PF_R | PF_X), "R X");
        assert_eq!(segment_flags(PF_R | PF_W), "RW ");
        assert_eq!(segment_flags(0), "   ");
    }

    #[test]
    fn rows_use_symbolic_types() {
        let row = phdr_row(
            0,
            &ProgramHeader {
                p_type: goblin::elf::program_header::PT_LOAD,
                p_flags: PF_R,
                ..Default::default()
            },
        );
        assert_eq!(row.kind, "PT_LOAD");
        assert_eq!(row.offset, "0x0");

        let shdr = shdr_row(
            3,
            &SectionHeader {
                sh_name: 0x1b,
                sh_type: goblin::elf::section_header::SHT_STRTAB,
                ..Default::default()
            },
        );
        assert_eq!(shdr.kind, "SHT_STRTAB");
        assert_eq!(shdr.name, "+0x1b");
    }

    #[test]
    fn plain_headings_without_color() {
        let config = DumpConfig {
            silent: false,
            color: false,
        };
        assert_eq!(config.heading("PHDR"), "PHDR");
    }
}
