//! eessi-software-subdir: print the EESSI software subdirectory for this host.

mod logging;

use std::path::PathBuf;
use std::process;

use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser, ValueEnum};

use eessi_resolve::{software_layer, Resolution, Resolver};
use eessi_uarch::{Catalog, CpuInfoDetector, HostDetector};

#[derive(Parser, Debug)]
#[command(
    name = "eessi-software-subdir",
    version,
    about = "Determine the EESSI software subdirectory to use for the host CPU"
)]
struct Cli {
    /// EESSI prefix (e.g. /cvmfs/software.eessi.io/versions/2023.06)
    #[arg(required_unless_present = "host")]
    prefix: Option<PathBuf>,
    /// Use the generic subdirectory of the host's CPU family
    #[arg(long)]
    generic: bool,
    /// Print the host's own subdirectory and exit
    #[arg(long)]
    host: bool,
    /// Microarchitecture catalog to use instead of the built-in one
    #[arg(long, env = "EESSI_UARCH_CATALOG")]
    catalog: Option<PathBuf>,
    /// CPU identification source (default: /proc/cpuinfo)
    #[arg(long)]
    cpuinfo: Option<PathBuf>,
    /// CPU family (x86_64, aarch64, ppc64le) instead of the native one
    #[arg(long)]
    arch: Option<String>,
    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    #[arg(long = "override", env = "EESSI_SOFTWARE_SUBDIR_OVERRIDE", hide = true)]
    override_subdir: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            eprintln!("ERROR: {}", usage_error_line(&e));
            process::exit(1);
        }
    };
    logging::init(cli.verbose);

    match run(cli) {
        Ok(line) => println!("{line}"),
        Err(e) => {
            eprintln!("ERROR: {e}");
            process::exit(1);
        }
    }
}

/// Clap's report folded into one line, without its `error:` tag and help hint.
fn usage_error_line(err: &clap::Error) -> String {
    let rendered = err.render().to_string();
    rendered
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("For more information"))
        .map(|line| line.strip_prefix("error: ").unwrap_or(line))
        .collect::<Vec<_>>()
        .join(" ")
}

/// The single line to print on success.
fn run(cli: Cli) -> Result<String> {
    // The override skips catalog, layout and detection entirely.
    if !cli.host {
        if let Some(subdir) = cli.override_subdir.as_deref().filter(|s| !s.is_empty()) {
            log::info!("using override {subdir}");
            return Ok(match cli.format {
                Format::Text => subdir.to_string(),
                Format::Json => serde_json::to_string(&Resolution::overridden(subdir))?,
            });
        }
    }

    let loaded;
    let catalog = match &cli.catalog {
        Some(path) => {
            loaded = Catalog::load(path)?;
            &loaded
        }
        None => Catalog::builtin()?,
    };

    let mut detector = CpuInfoDetector::new(catalog);
    if let Some(path) = &cli.cpuinfo {
        detector = detector.with_path(path);
    }
    if let Some(arch) = &cli.arch {
        detector = detector.with_family(arch.as_str());
    }

    if cli.host {
        let host = detector.detect()?;
        return Ok(match cli.format {
            Format::Text => host.subdir(),
            Format::Json => serde_json::to_string(&host)?,
        });
    }

    let prefix = cli
        .prefix
        .ok_or_else(|| anyhow!("no EESSI prefix given"))?;
    let root = software_layer(&prefix, std::env::consts::OS)?;
    log::debug!("installation root {}", root.display());

    let resolution = Resolver::new(catalog, &detector).resolve(&root, cli.generic)?;

    Ok(match cli.format {
        Format::Text => resolution.subdir,
        Format::Json => serde_json::to_string(&resolution)?,
    })
}
