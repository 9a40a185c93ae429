use std::path::PathBuf;

use clap::{ArgMatches, Command};
use serde_json::json;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod connection;
mod error;
mod output;

use cli::{GlobalOpts, OutputFormat};
use error::CliError;
use opsctl_core::{Catalog, CatalogSet, Config};

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();

    // The command tree depends on the loaded catalogs, so catalog flags
    // and verbosity are scanned out of argv before clap runs.
    init_tracing(prescan_verbosity(&args));

    let extra_catalogs = prescan_paths(&args, "--catalog");
    let catalogs = match load_catalogs(&extra_catalogs) {
        Ok(catalogs) => catalogs,
        Err(e) => {
            e.print_diagnostic();
            std::process::exit(1);
        }
    };

    let cmd = cli::build_cli(&catalogs);
    let matches = cmd.clone().get_matches_from(args);
    let globals = GlobalOpts::from_matches(&matches);

    if let Err(e) = execute(cmd, &matches, &globals, &catalogs).await {
        e.print_diagnostic();
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    // RUST_LOG wins over the verbosity flag when set.
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "opsctl=warn,opsctl_core=warn",
            1 => "opsctl=info,opsctl_core=info",
            2 => "opsctl=debug,opsctl_core=debug",
            _ => "opsctl=trace,opsctl_core=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();

    debug!("tracing initialized with verbosity level {verbose}");
}

/// Count -v / -vv / --verbose occurrences ahead of parsing.
fn prescan_verbosity(args: &[String]) -> u8 {
    let mut count: u8 = 0;
    for arg in args.iter().skip(1) {
        if arg == "--" {
            break;
        }
        if arg == "--verbose" {
            count = count.saturating_add(1);
        } else if arg.len() > 1
            && arg.starts_with('-')
            && !arg.starts_with("--")
            && arg.chars().skip(1).all(|c| c == 'v')
        {
            count = count.saturating_add((arg.len() - 1) as u8);
        }
    }
    count
}

/// Collect the values of a repeatable `--flag value` / `--flag=value`
/// ahead of parsing.
fn prescan_paths(args: &[String], flag: &str) -> Vec<PathBuf> {
    let mut values = Vec::new();
    let prefix = format!("{flag}=");
    let mut i = 1;
    while i < args.len() {
        let arg = &args[i];
        if arg == "--" {
            break;
        }
        if arg == flag {
            if let Some(value) = args.get(i + 1) {
                values.push(PathBuf::from(value));
            }
            i += 2;
            continue;
        }
        if let Some(rest) = arg.strip_prefix(&prefix) {
            values.push(PathBuf::from(rest));
        }
        i += 1;
    }
    values
}

/// Load operation catalogs: everything in the config directory's
/// `catalogs/` folder, then any explicitly requested files.
///
/// Directory catalogs load leniently - one broken file should not take
/// the whole CLI down. Explicit `--catalog` files are load-bearing and
/// fail loudly.
fn load_catalogs(extra: &[PathBuf]) -> Result<CatalogSet, CliError> {
    let mut set = CatalogSet::new();

    if let Ok(dir) = Config::catalogs_dir()
        && dir.is_dir()
        && let Ok(entries) = std::fs::read_dir(&dir)
    {
        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        paths.sort();
        for path in paths {
            match Catalog::load(&path) {
                Ok(catalog) => {
                    if let Err(e) = set.push(catalog) {
                        warn!("skipping catalog {}: {e}", path.display());
                    }
                }
                Err(e) => warn!("skipping catalog {}: {e}", path.display()),
            }
        }
    }

    for path in extra {
        set.push(Catalog::load(path)?)?;
    }

    Ok(set)
}

async fn execute(
    cmd: Command,
    matches: &ArgMatches,
    globals: &GlobalOpts,
    catalogs: &CatalogSet,
) -> Result<(), CliError> {
    let (config, config_path) = match &globals.config_file {
        Some(path) => {
            debug!("loading config from explicit path: {}", path.display());
            (Config::load_from_path(path)?, Some(path.clone()))
        }
        None => (Config::load()?, None),
    };

    let start = std::time::Instant::now();
    let result = match matches.subcommand() {
        Some(("profile", sub)) => {
            let mut config = config;
            commands::profile::run(sub, &mut config, config_path.as_deref(), globals.output)
        }
        Some(("catalog", sub)) => commands::catalog::run(sub, catalogs, globals.output),
        Some(("version", _)) => show_version(globals.output),
        Some(("completions", sub)) => {
            generate_completions(cmd, sub);
            Ok(())
        }
        Some((command, sub)) => {
            let operation = catalogs
                .find(command)
                .expect("clap only admits registered subcommands");
            info!(%command, operation = %operation.name, "executing operation");
            commands::invoke::run(operation, sub, globals, &config).await
        }
        None => unreachable!("clap requires a subcommand"),
    };

    let duration = start.elapsed();
    match &result {
        Ok(()) => debug!("command completed in {duration:?}"),
        Err(e) => error!("command failed after {duration:?}: {e}"),
    }
    result
}

fn show_version(output: OutputFormat) -> Result<(), CliError> {
    match output {
        OutputFormat::Json | OutputFormat::Yaml => crate::output::print_output(
            &json!({
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            }),
            output,
        ),
        OutputFormat::Table => {
            println!("opsctl {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn generate_completions(mut cmd: Command, matches: &ArgMatches) {
    let shell = matches
        .get_one::<clap_complete::Shell>("shell")
        .copied()
        .expect("clap enforces the argument");
    clap_complete::generate(shell, &mut cmd, "opsctl", &mut std::io::stdout());
}
