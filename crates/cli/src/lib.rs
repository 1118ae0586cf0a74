//! Command-line front end for apiconnect.

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod common;
pub mod connect;

/// Crates whose events are shown by default.
const LOG_TARGETS: [&str; 2] = ["apiconnect_core", "apiconnect_cli"];

#[derive(Parser, Debug)]
#[command(
    name = "apiconnect",
    version,
    about = "\x1b[33mapiconnect\x1b[0m wires a frontend to a backend's OpenAPI description 🔌"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 🔗 Discover the backend's API and generate client, bindings and types
    Connect(connect::ConnectArgs),
}

/// Parse `args` (including the program name) and run the selected command.
pub async fn run_cli_async(args: Vec<String>) -> i32 {
    match Cli::try_parse_from(args) {
        Ok(cli) => match cli.command {
            Some(Commands::Connect(connect_args)) => connect::run(connect_args).await,
            None => {
                let mut cmd = Cli::command();
                let _ = cmd.print_help();
                println!();
                0
            }
        },
        Err(e) => {
            let code = e.exit_code();
            let _ = e.print();
            code
        }
    }
}

/// Install the stderr fmt subscriber.
///
/// `APICONNECT_LOG` takes a plain level ("debug") applied to the apiconnect crates, or a
/// full filter spec like "apiconnect_core=debug,reqwest=warn".
pub fn init_tracing() {
    let filter = log_filter(std::env::var("APICONNECT_LOG").ok().as_deref());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(EnvFilter::new(filter));

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn log_filter(env: Option<&str>) -> String {
    match env {
        Some(level) if is_plain_level(level) => per_target(&level.to_ascii_lowercase()),
        Some(spec) if !spec.trim().is_empty() => spec.to_string(),
        _ => per_target("info"),
    }
}

fn per_target(level: &str) -> String {
    LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn is_plain_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}
