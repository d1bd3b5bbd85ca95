use std::error::Error;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::{Parser, error::ErrorKind};
use tracing_subscriber::EnvFilter;

use crate::catalog::FileCatalog;
use crate::config::ReconcileConfig;
use crate::constants::apps::{CATALOG_BASE_ENV, DEFAULT_LOG_LEVEL};
use crate::diagnostics::TracingSink;
use crate::reconcile::Reconciler;

#[derive(Debug, Parser)]
#[command(
    name = "reconcile_sources",
    disable_help_subcommand = true,
    about = "Resolve embedded source descriptors against a canonical catalog",
    long_about = "Read concatenated JSON documents, rewrite every resolvable Source descriptor to its canonical catalog ID, and print only the documents that changed, one per line.",
    after_help = "The catalog root is resolved from --catalog, then the CATALOG_BASE environment variable. RUST_LOG overrides --log-level when set."
)]
/// CLI for `reconcile_sources`.
///
/// Common usage:
/// - `reconcile_sources --catalog ./catalog < records.json > changed.jsonl`
/// - Audit failures with `--log-level error --log-file reconcile.log` and grep for ERROR
/// - Round-trip: feed the output back in; a second pass prints nothing
struct ReconcileCli {
    #[arg(
        long,
        value_name = "PATH",
        help = "Catalog file or directory of canonical records"
    )]
    catalog: Option<PathBuf>,
    #[arg(
        long,
        value_name = "PATH",
        help = "Read documents from a file instead of stdin"
    )]
    input: Option<PathBuf>,
    #[arg(
        long = "check-structure",
        help = "Abort when References, SeeAlso, or Commentary is not a sequence or string"
    )]
    check_structure: bool,
    #[arg(
        long = "no-legacy-isbn-padding",
        help = "Do not left-pad 9-digit ISBNs with a leading zero"
    )]
    no_legacy_isbn_padding: bool,
    #[arg(
        long = "log-level",
        value_name = "FILTER",
        default_value = DEFAULT_LOG_LEVEL,
        help = "Diagnostics filter used when RUST_LOG is unset (e.g. error, info)"
    )]
    log_level: String,
    #[arg(
        long = "log-file",
        value_name = "PATH",
        help = "Append diagnostics to this file instead of stderr"
    )]
    log_file: Option<PathBuf>,
    #[arg(long, help = "Print a JSON run summary to stderr when done")]
    summary: bool,
}

/// Run the reconciler over stdin (or `--input`) and write changed documents to stdout.
pub fn run_reconcile<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let Some(cli) = parse_cli::<ReconcileCli, _>(
        std::iter::once("reconcile_sources".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    init_tracing(&cli.log_level, cli.log_file.as_deref())?;

    let catalog_root = resolve_catalog_root(cli.catalog, std::env::var(CATALOG_BASE_ENV).ok())?;
    let catalog = FileCatalog::open(&catalog_root)?;

    let config = ReconcileConfig {
        check_structure: cli.check_structure,
        pad_legacy_isbn: !cli.no_legacy_isbn_padding,
        ..ReconcileConfig::default()
    };
    let reconciler = Reconciler::new(&catalog, &config)?;

    let output = BufWriter::new(io::stdout().lock());
    let mut sink = TracingSink;
    let summary = match cli.input {
        Some(path) => reconciler.run(File::open(&path)?, output, &mut sink)?,
        None => reconciler.run(io::stdin().lock(), output, &mut sink)?,
    };

    if cli.summary {
        eprintln!("{}", serde_json::to_string(&summary)?);
    }
    Ok(())
}

fn init_tracing(level: &str, log_file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let _ = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(io::stderr).try_init(),
    };
    Ok(())
}

/// Explicit argument first, then the environment value.
fn resolve_catalog_root(
    explicit: Option<PathBuf>,
    from_env: Option<String>,
) -> Result<PathBuf, Box<dyn Error>> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    match from_env.filter(|value| !value.trim().is_empty()) {
        Some(value) => Ok(PathBuf::from(value)),
        None => Err(format!("no catalog root: pass --catalog or set {CATALOG_BASE_ENV}").into()),
    }
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}
