//! fritz-backup - saves configuration, phonebooks, call-barring list and
//! phone assets of a TR-064 router into a local directory.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use fritz_backup::{Backup, DEFAULT_CONFIG_FILE, Settings, display_name};
use tracing::{debug, error};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "fritz-backup")]
#[command(author, version, about = "Back up a router over TR-064")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "FRITZ_BACKUP_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// A failed step together with the process exit code it maps to.
struct Failure {
    exit_code: u8,
    error: anyhow::Error,
}

trait ExitCodeExt<T> {
    fn exit_code(self, code: u8) -> Result<T, Failure>;
}

impl<T, E> ExitCodeExt<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn exit_code(self, code: u8) -> Result<T, Failure> {
        self.map_err(|error| Failure {
            exit_code: code,
            error: error.into(),
        })
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    println!("{} {}\n", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let start = Instant::now();
    match run(&cli) {
        Ok(()) => {
            println!("finished in {:.2?}", start.elapsed());
            ExitCode::SUCCESS
        }
        Err(failure) => {
            error!(exit_code = failure.exit_code, "backup aborted");
            eprintln!("Error: {:#}", failure.error);
            ExitCode::from(failure.exit_code)
        }
    }
}

fn run(cli: &Cli) -> Result<(), Failure> {
    let settings = Settings::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))
        .exit_code(1)?;
    debug!(?settings, "configuration loaded");
    let mut backup = Backup::new(settings).exit_code(1)?;

    let report = backup.device_info().exit_code(2)?;
    println!("{report}");

    let url = backup.config_export_url().exit_code(3)?;
    let path = backup.backup_config(&url).exit_code(4)?;
    println!("{}", downloaded(&path));

    let export = &backup.settings().export;

    if export.phonebooks {
        let report = backup.backup_phonebooks().exit_code(5)?;
        print!("{report}");
    }

    if export.barring_list {
        let path = backup.backup_barring_list().exit_code(6)?;
        println!("{}", downloaded(&path));
    }

    if export.assets {
        let outcome = backup.backup_assets().exit_code(7)?;
        println!("{outcome}");
    }

    Ok(())
}

fn downloaded(path: &Path) -> String {
    format!("Downloaded: {}", display_name(path))
}
