//! lib-types: bundles a library's TypeScript declarations.

use camino::Utf8PathBuf;
use clap::Parser;
use lib_types::cli::Args;
use lib_types::{build, format_summary, write_assets, BuildError};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Overrides the log level, e.g. `LIB_TYPES_LOG=debug`.
const LOG_ENV: &str = "LIB_TYPES_LOG";

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

async fn run(args: Args) -> Result<(), BuildError> {
    let cwd = std::env::current_dir().map_err(|source| BuildError::Io {
        path: Utf8PathBuf::from("."),
        source,
    })?;
    let cwd = Utf8PathBuf::try_from(cwd).map_err(|err| BuildError::Io {
        path: Utf8PathBuf::from("."),
        source: err.into_io_error(),
    })?;

    let options = args.into_options(&cwd)?;
    let assets = build(&options).await?;
    if options.no_emit {
        println!("type-check passed");
        return Ok(());
    }

    let out_dir = options.root.join(&options.out_dir);
    let written = write_assets(&out_dir, &assets)?;
    println!("{}", format_summary(&written, &assets, &options.root));
    Ok(())
}
