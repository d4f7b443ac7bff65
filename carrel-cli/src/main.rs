mod cli;
mod commands;
mod config;
mod error;

use std::process;

use clap::Parser;
use tracing::{Level, error};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use crate::{
    cli::{Args, Commands},
    config::AppConfig,
    error::{AppError, Result},
};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("Application error: {e}");
        eprintln!("Error: {e}");
        if let AppError::Sandbox(sandbox::SandboxError::ComposeDrift { .. }) = &e {
            eprintln!("Hint: rerun `carrel up` with --force-compose to replace the file");
        }
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    init_logging(args.verbose, args.quiet)?;

    // Deferred so `config --init` and `completions` work before any
    // config file exists.
    let config = AppConfig::load(args.config.as_deref());

    match args.command {
        Commands::Up {
            wait,
            force_compose,
        } => commands::up::run(&config?, wait, force_compose).await,

        Commands::Down { volumes } => commands::down::run(&config?, volumes).await,

        Commands::Status { json } => commands::status::run(&config?, json).await,

        Commands::Wait => commands::wait::run(&config?).await,

        Commands::ToScript { paths, output } => {
            commands::convert::to_script(&config?, &paths, output.as_deref())
        }

        Commands::ToNotebook { paths, output } => {
            commands::convert::to_notebook(&config?, &paths, output.as_deref())
        }

        Commands::Sync { paths } => commands::sync::run(&config?, &paths),

        Commands::Config { show, init } => {
            if init {
                let path = AppConfig::write_default(args.config.as_deref())?;
                println!("✓ Wrote {}", path.display());
            } else if show {
                println!("{}", config?.show()?);
            } else {
                println!(
                    "Use --show to display current configuration or --init to write a default carrel.toml"
                );
            }
            Ok(())
        }

        Commands::Completions { shell } => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Args::command();
            let bin_name = cmd.get_name().to_string();
            generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
            Ok(())
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) -> Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_level(verbose))
        .init();
    Ok(())
}
