use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use apiconnect_core::{
    FileConfig, GenerationConfig, GenerationReport, Pipeline, PipelineError,
};
use clap::Args;
use console::style;
use tracing::debug;

use crate::common::{format_elapsed_ms, run_cli_async, spinner};

#[derive(Args, Debug, Clone)]
pub struct ConnectArgs {
    #[arg(long = "url", value_name = "BASE_URL", help = "Base URL of the backend")]
    pub url: String,
    #[arg(
        long = "framework",
        value_name = "TAG",
        help = "Target framework: react or vue [default: react]"
    )]
    pub framework: Option<String>,
    #[arg(
        long = "output",
        value_name = "DIR",
        help = "Directory the generated modules are written to [default: src/api]"
    )]
    pub output: Option<PathBuf>,
    #[arg(
        long = "auth",
        value_name = "MODE",
        help = "Auth mode: token, cookie or session [default: token]"
    )]
    pub auth: Option<String>,
    #[arg(long = "mock", help = "Generate mock responses and wire the client to them")]
    pub mock: bool,
    #[arg(
        long = "spec",
        value_name = "PATH|URL",
        help = "API description to use instead of discovering one"
    )]
    pub spec: Option<String>,
    #[arg(
        long = "config",
        value_name = "FILE",
        help = "Config file. Defaults to apiconnect.toml in the working directory, if present"
    )]
    pub config: Option<PathBuf>,
    #[arg(
        long = "timeout-secs",
        value_name = "N",
        help = "Upper bound on each discovery phase, in seconds"
    )]
    pub timeout_secs: Option<u64>,
}

pub async fn run(args: ConnectArgs) -> i32 {
    crate::init_tracing();
    run_cli_async(|| run_inner(args)).await
}

async fn run_inner(args: ConnectArgs) -> Result<(), String> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = build_config(&args, &cwd).map_err(|err| {
        format!("{} {err}", style("✗ Invalid configuration:").red().bold())
    })?;

    println!("Connecting to {}", style(&config.base_url).cyan());

    let start = Instant::now();
    let progress = spinner("Starting...");
    let observer = progress.clone();
    let result = Pipeline::new(&config)
        .with_observer(move |state| {
            if !state.is_terminal() {
                observer.set_message(format!("{}...", capitalize(&state.to_string())));
            }
        })
        .run()
        .await;
    progress.finish_and_clear();

    match result {
        Ok(report) => {
            print_report(&report, &config, start);
            Ok(())
        }
        Err(err) => Err(failure_message(&err)),
    }
}

/// Defaults, then the config file, then explicit flags.
pub fn build_config(args: &ConnectArgs, cwd: &Path) -> Result<GenerationConfig, String> {
    let mut config = GenerationConfig::new(args.url.clone());

    let file = match &args.config {
        Some(path) => Some(FileConfig::load(path).map_err(|e| e.to_string())?),
        None => FileConfig::discover(cwd).map_err(|e| e.to_string())?,
    };
    if let Some(file) = file {
        debug!("Applying config file.");
        config.apply_file(file);
    }

    if let Some(framework) = &args.framework {
        config.framework.clone_from(framework);
    }
    if let Some(output) = &args.output {
        config.output_dir.clone_from(output);
    }
    if let Some(auth) = &args.auth {
        config.auth_mode.clone_from(auth);
    }
    if args.mock {
        config.mock = true;
    }
    if args.spec.is_some() {
        config.spec_location.clone_from(&args.spec);
    }
    if let Some(secs) = args.timeout_secs {
        config.discovery.timeout = Duration::from_secs(secs);
    }
    Ok(config)
}

fn print_report(report: &GenerationReport, config: &GenerationConfig, start: Instant) {
    println!(
        "{} Generated {} client for {} endpoint(s) from {} ({})",
        style("✓").green().bold(),
        report.framework,
        report.endpoints.len(),
        report.source,
        format_elapsed_ms(start)
    );
    for file in &report.files {
        println!("   {}", file.display());
    }
    if config.mock {
        println!("   Mock mode is on: requests are answered from mocks.ts");
    }
}

fn failure_message(err: &PipelineError) -> String {
    format!(
        "{} {} failed ({}): {}",
        style("✗").red().bold(),
        capitalize(&err.stage.to_string()),
        style(err.kind()).yellow(),
        err.source
    )
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
