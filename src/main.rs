#![forbid(unsafe_code)]

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use exepak::embed::{self, Alignment, PackOptions, PackOutcome};

#[derive(Debug, Parser)]
#[command(
    name = "exepak",
    version,
    about = "Append resource files to the end of a built executable"
)]
struct Cli {
    /// Executable to embed into. Must carry the detection signature.
    executable: PathBuf,

    /// Directory to collect files from (default: the executable's directory).
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// File-name suffix filter, e.g. ".mo". "*" embeds every file.
    #[arg(long, default_value = "*")]
    filter: String,

    /// Pad payloads and table records to this boundary: none, 16 or 256.
    #[arg(long, default_value_t = Alignment::None)]
    align: Alignment,

    /// Store the table offset just before the end marker.
    #[arg(long, default_value_t = false)]
    table_pointer: bool,

    /// More log output (repeatable). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "exepak=warn",
        1 => "exepak=info",
        _ => "exepak=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut opts = PackOptions::new(cli.executable)
        .with_filemask(cli.filter)
        .with_alignment(cli.align)
        .with_table_pointer(cli.table_pointer);
    if let Some(dir) = cli.base_dir {
        opts = opts.with_base_dir(dir);
    }

    match embed::pack(&opts) {
        Ok(PackOutcome::Embedded(report)) => {
            println!(
                "embedded {} file(s) into {}",
                report.entries.len(),
                report.executable.display()
            );
        }
        Ok(PackOutcome::NoMatchingFiles { base_dir, filemask }) => {
            println!(
                "no files matching '{filemask}' found in '{}', leaving the executable unchanged",
                base_dir.display()
            );
        }
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
