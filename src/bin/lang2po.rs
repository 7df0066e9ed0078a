use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser as _;
use lang2po::catalog::DuplicateStyle;
use lang2po::convert::{run_converter, ConvertStatus, FORMATS};
use log::{info, warn};

/// Convert Mozilla .lang files to Gettext PO localization files.
#[derive(clap::Parser)]
#[command(version, about)]
struct Cli {
    /// Input .lang file, or "-" for stdin.
    input: Option<PathBuf>,
    /// Output PO file, or "-" for stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// The encoding of the input file.
    #[arg(long, default_value = "utf-8")]
    encoding: String,
    /// What to do with entries that share a key in the output catalog.
    #[arg(long, value_enum, default_value_t = DuplicateStyle::default())]
    duplicates: DuplicateStyle,
    /// Accepted for compatibility with batch conversion; the lang format
    /// has no template variant.
    #[arg(short = 'P', long)]
    pot: bool,
    /// Template directory passthrough for batch conversion; unused.
    #[arg(short, long)]
    templates: Option<PathBuf>,
}

/// Whether `path` has an extension the conversion framework knows.
fn known_format(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| FORMATS.iter().any(|(from, _)| *from == ext))
        .unwrap_or(false)
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().filter_or("RUST_LOG", "info"));
    let cli = Cli::parse();

    let (mut input, input_name): (Box<dyn Read>, String) = match &cli.input {
        Some(path) if path.as_os_str() != "-" => {
            if !known_format(path) {
                warn!("{} does not look like a .lang file", path.display());
            }
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            (Box::new(file), path.display().to_string())
        }
        _ => (Box::new(io::stdin()), String::from("-")),
    };

    let status = match &cli.output {
        Some(path) if path.as_os_str() != "-" => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            run_converter(
                &mut input,
                &input_name,
                file,
                cli.templates.as_deref(),
                cli.pot,
                cli.duplicates,
                &cli.encoding,
            )?
        }
        _ => run_converter(
            &mut input,
            &input_name,
            io::stdout().lock(),
            cli.templates.as_deref(),
            cli.pot,
            cli.duplicates,
            &cli.encoding,
        )?,
    };

    if status == ConvertStatus::NothingWritten {
        info!("no translatable units in {input_name}, nothing written");
    }
    Ok(())
}
