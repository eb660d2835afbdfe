mod options;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use action_runner_core::{
    CommandTable, Context, Message, ResolveError, Resolver, RootOptions, TableOptions, intercept,
};
use action_runner_registry::Registry;
use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::options::{SharedRegistry, available_actions, global_options};

#[derive(Debug, Parser)]
#[command(name = "action")]
#[command(version)]
#[command(about = "Run commands laid out as a directory tree")]
struct Cli {
    /// Registry file (default: <config dir>/action-runner/config.json).
    #[arg(long, value_name = "FILE")]
    registry: Option<PathBuf>,
    /// Log more (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// `--register <name> <path>`, `--unregister <name>`, `--list`, or a
    /// registered root name followed by the tokens to resolve under it.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "TOKENS")]
    tokens: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode, String> {
    let path = match cli.registry {
        Some(path) => path,
        None => Registry::default_path().map_err(|err| err.to_string())?,
    };
    let registry = Registry::open(&path)
        .map_err(|err| format!("Failed to open registry '{}': {err}", path.display()))?;
    let locale = registry.locale().to_string();
    let registry: SharedRegistry = Arc::new(Mutex::new(registry));

    // Leading flags address the runner itself; when any are present the run
    // ends after them.
    let globals = global_options(&registry);
    let pass = match intercept(
        &cli.tokens,
        0,
        &TableOptions::new(&globals),
        Context::new(),
        &locale,
    ) {
        Ok(pass) => pass,
        Err(err) => return Ok(report(&err, &locale)),
    };
    if pass.cursor > 0 {
        debug!(flags = ?pass.context.flags(), "handled global options");
        return Ok(ExitCode::SUCCESS);
    }

    let registry = registry
        .lock()
        .map_err(|_| "registry lock poisoned".to_string())?;
    let Some(root) = cli
        .tokens
        .first()
        .and_then(|name| registry.lookup(name))
        .map(PathBuf::from)
    else {
        println!(
            "\n{}\n\n{}",
            Message::ParentActionNotFound.text(&locale),
            available_actions(&registry)
        );
        return Ok(ExitCode::FAILURE);
    };
    let exclusions = registry.exclusion_pattern().map_err(|err| err.to_string())?;
    drop(registry);

    debug!(root = %root.display(), "resolving under registered root");
    let table = CommandTable::new();
    let pass = match intercept(
        &cli.tokens,
        1,
        &RootOptions::new(&root, &table),
        Context::new(),
        &locale,
    ) {
        Ok(pass) => pass,
        Err(err) => return Ok(report(&err, &locale)),
    };

    let mut stdout = std::io::stdout().lock();
    let result = Resolver::new(&root, &table)
        .with_exclusions(exclusions)
        .with_locale(&locale)
        .resolve(&cli.tokens, pass.cursor, pass.context, &mut stdout)
        .await;
    stdout.flush().map_err(|err| err.to_string())?;

    match result {
        Ok(outcome) if outcome.is_success() => Ok(ExitCode::SUCCESS),
        Ok(_) => Ok(ExitCode::FAILURE),
        Err(err) => Ok(report(&err, &locale)),
    }
}

/// Prints `err` as a coded line and picks the exit code.
fn report(err: &ResolveError, locale: &str) -> ExitCode {
    if let Some(status) = err.exit_status() {
        debug!(status, "leaf process failed");
        return ExitCode::from(u8::try_from(status).unwrap_or(1));
    }
    eprintln!("{}", err.log_line(locale));
    ExitCode::FAILURE
}
