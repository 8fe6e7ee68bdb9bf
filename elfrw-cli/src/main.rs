use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use elfrw_core::HeaderModel;

mod export;
mod report;

use report::DumpConfig;

/// ELF header round-tripper
#[derive(Parser)]
#[command(
    name = "elfrw",
    about = "Parse ELF headers and write them back out, as binary or JSON",
    version,
    author
)]
struct Cli {
    /// Input file
    #[arg(short, long, required = true)]
    file: PathBuf,

    /// Dump the parsed headers to JSON instead of re-emitting the binary
    #[arg(short, long)]
    json: bool,

    /// Disable diagnostic output
    #[arg(short, long)]
    silent: bool,

    /// Output file (defaults to `<input>.json` or `<input>_modified`)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn init_logging(silent: bool) {
    let mut builder = if silent {
        let mut b = env_logger::Builder::new();
        b.filter_level(log::LevelFilter::Off);
        b
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
    };
    builder.init();
}

/// `<basename><suffix>` in the current directory.
fn default_output(input: &Path, suffix: &str) -> PathBuf {
    let base = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "elf".to_string());
    PathBuf::from(format!("{base}{suffix}"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.silent);

    let config = DumpConfig {
        silent: cli.silent,
        color: std::io::stdout().is_terminal(),
    };

    let bytes =
        std::fs::read(&cli.file).with_context(|| format!("reading {}", cli.file.display()))?;
    let model = HeaderModel::parse(bytes)
        .with_context(|| format!("parsing ELF headers of {}", cli.file.display()))?;

    report::print(&model, &config)?;

    let output = if cli.json {
        let output = cli
            .output
            .unwrap_or_else(|| default_output(&cli.file, ".json"));
        let json = export::to_json(&model.describe()?)?;
        std::fs::write(&output, json)
            .with_context(|| format!("writing {}", output.display()))?;
        output
    } else {
        let output = cli
            .output
            .unwrap_or_else(|| default_output(&cli.file, "_modified"));
        let bytes = model.emit().context("re-emitting ELF headers")?;
        std::fs::write(&output, bytes)
            .with_context(|| format!("writing {}", output.display()))?;
        output
    };

    log::info!("Wrote {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_uses_basename() {
        assert_eq!(
            default_output(Path::new("/usr/bin/ls"), "_modified"),
            PathBuf::from("ls_modified")
        );
        assert_eq!(
            default_output(Path::new("a.out"), ".json"),
            PathBuf::from("a.out.json")
        );
    }

    #[test]
    fn flags_parse() {
        let cli = Cli::parse_from(["elfrw", "-f", "a.out", "-j", "-s", "-o", "x.json"]);
        assert!(cli.json && cli.silent);
        assert_eq!(cli.output, Some(PathBuf::from("x.json")));
        assert!(Cli::try_parse_from(["elfrw", "-j"]).is_err());
    }
}
