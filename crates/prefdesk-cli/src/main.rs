// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use prefdesk_app::{FormState, RemoteTable};
use prefdesk_remote::RestTable;
use prefdesk_testkit::MemoryTable;
use runtime::RemoteRuntime;
use std::env;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_ENV: &str = "PREFDESK_LOG";

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `prefdesk --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let log_path = init_logging(&config)?;
    info!(log = %log_path.display(), demo = options.demo, "prefdesk starting");

    if options.demo {
        if options.check_only {
            return Ok(());
        }
        return run_form(MemoryTable::demo());
    }

    let table = remote_table(&config, &options.config_path)?;
    if options.check_only {
        table
            .ping()
            .with_context(|| format!("check table {}", table.endpoint()))?;
        println!("ok: {}", table.endpoint());
        return Ok(());
    }

    info!(endpoint = table.endpoint(), "using remote table");
    run_form(table)
}

fn remote_table(config: &Config, config_path: &Path) -> Result<RestTable> {
    let invalid = || {
        format!(
            "invalid [remote] config in {}; fix base_url/table/api_key/timeout values",
            config_path.display()
        )
    };
    let base_url = config.base_url().with_context(invalid)?;
    let timeout = config.timeout().with_context(invalid)?;
    RestTable::new(base_url, config.table(), &config.api_key(), timeout).with_context(invalid)
}

fn run_form<T>(table: T) -> Result<()>
where
    T: RemoteTable + Clone + Send + 'static,
{
    let mut state = FormState::default();
    let mut runtime = RemoteRuntime::new(table);
    let result = prefdesk_tui::run_app(&mut state, &mut runtime);
    info!(ok = result.is_ok(), "prefdesk exiting");
    result
}

/// Sends logs to a file since the terminal belongs to the UI.
fn init_logging(config: &Config) -> Result<PathBuf> {
    let path = config.log_file()?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;

    let filter = log_filter(env::var(LOG_ENV).ok(), config.log_level())?;
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false),
        )
        .try_init()
        .context("install log subscriber")?;
    Ok(path)
}

fn log_filter(from_env: Option<String>, configured: &str) -> Result<EnvFilter> {
    let directives = from_env
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| configured.to_owned());
    EnvFilter::try_new(&directives)
        .with_context(|| format!("invalid log level {directives:?}; try info, debug, or warn"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("prefdesk: edit and search user preference flags");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --demo                   Launch against seeded in-memory records");
    println!("  --check                  Validate config and reach the remote table");
    println!("  --help                   Show this help");
    println!();
    println!("Environment: PREFDESK_CONFIG_PATH, PREFDESK_API_KEY, PREFDESK_LOG");
}
