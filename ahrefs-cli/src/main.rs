//! Ahrefs API CLI
//!
//! Command-line interface for the Ahrefs API v3.

use std::io::Write;
use std::path::Path;

use ahrefs_cli::cli::{
    generate_completion, handle_config, handle_site_explorer, print_command_list, Cli, Commands,
};
use ahrefs_cli::config::{ConfigStore, Settings};
use ahrefs_cli::format::{format_failure, OutputFormat, RenderError, Writer};
use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing::debug;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let format = cli.format;
    let output = cli.output.clone();
    let quiet = cli.quiet;

    if let Err(e) = run(cli).await {
        report_failure(format, output.as_deref(), quiet, &e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    if cli.list_commands {
        return print_command_list();
    }

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    if let Commands::Completion { shell } = command {
        generate_completion(shell);
        return Ok(());
    }

    let store = match &cli.config {
        Some(path) => ConfigStore::new(path),
        None => ConfigStore::default_location()?,
    };

    // Priority chain: CLI args → env → config file → defaults
    let mut builder = Settings::builder()
        .with_api_key(cli.api_key)
        .with_format(cli.format)
        .with_output(cli.output)
        .with_quiet(cli.quiet)
        .with_dry_run(cli.dry_run);
    if let Some(url) = cli.base_url {
        builder = builder.with_base_url(url)?;
    }
    let settings = builder
        .with_env_overrides()
        .with_config_file(&store)
        .build()?;

    debug!(
        base_url = %settings.base_url,
        format = ?settings.format,
        config = %store.path().display(),
        "Resolved settings"
    );

    match command {
        Commands::SiteExplorer { command } => {
            handle_site_explorer(command, &settings, shutdown_signal()).await
        }
        Commands::Config { command } => {
            handle_config(command, &store, &settings, shutdown_signal()).await
        }
        Commands::Completion { .. } => Ok(()),
    }
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        debug!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Render the error envelope, falling back to stdout if the output file
/// cannot be opened
fn report_failure(format: OutputFormat, output: Option<&Path>, quiet: bool, err: &anyhow::Error) {
    let rendered = match Writer::create(format, output) {
        Ok(writer) => {
            let result = render_error(writer, err);
            if result.is_ok() && output.is_some() && !quiet {
                eprintln!("{}", format_failure(&format!("{:#}", err)));
            }
            result
        }
        Err(open_err) => {
            debug!("{:#}", anyhow::Error::new(open_err));
            render_error(Writer::stdout(format), err)
        }
    };

    if let Err(render_err) = rendered {
        eprintln!("{}", format_failure(&format!("{:#}", err)));
        debug!("Failed to render error: {}", render_err);
    }
}

fn render_error<W: Write>(mut writer: Writer<W>, err: &anyhow::Error) -> Result<(), RenderError> {
    writer.write_error(err)?;
    writer.finish()?;
    Ok(())
}

/// Initialize tracing subscriber for logging
fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
