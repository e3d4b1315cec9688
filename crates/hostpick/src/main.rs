//! hostpick CLI
#![deny(unsafe_code)]

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use hostpick::{Cli, Commands, EXIT_CANCELLED, commands};
use hostpick_core::ConfirmError;
use hostpick_core::config::ConfigLoader;
use owo_colors::OwoColorize;
use tracing::debug;

mod observability;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    cli.color.apply();

    if let Some(ref dir) = cli.chdir {
        std::env::set_current_dir(dir)
            .with_context(|| format!("failed to change directory to {}", dir.display()))?;
    }

    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let cwd = camino::Utf8PathBuf::try_from(cwd).map_err(|e| {
        anyhow::anyhow!(
            "current directory is not valid UTF-8: {}",
            e.into_path_buf().display()
        )
    })?;
    let mut loader = ConfigLoader::new().with_project_search(&cwd);
    if let Some(ref config_path) = cli.config {
        let config_path = camino::Utf8PathBuf::try_from(config_path.clone()).map_err(|e| {
            anyhow::anyhow!(
                "config path is not valid UTF-8: {}",
                e.into_path_buf().display()
            )
        })?;
        loader = loader.with_file(&config_path);
    }
    let config_files = loader.sources();
    let config = loader.load().context("failed to load configuration")?;

    let log_settings = observability::LogSettings::new(
        config
            .log_dir
            .as_ref()
            .map(|dir| dir.as_std_path().to_path_buf()),
    );
    let env_filter = observability::env_filter(cli.quiet, cli.verbose, config.log_level.as_str());
    let _guard = observability::init(&log_settings, env_filter)
        .context("failed to initialize logging")?;

    debug!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        json = cli.json,
        color = ?cli.color,
        chdir = ?cli.chdir,
        "CLI initialized"
    );

    let result = match cli.command {
        Commands::Init(args) => commands::init::cmd_init(args, cli.json, &config, &cwd),
        Commands::Targets(args) => commands::targets::cmd_targets(args, cli.json),
        Commands::Arm(args) => commands::arm::cmd_arm(args, cli.json, &config),
        Commands::Info(args) => {
            commands::info::cmd_info(args, cli.json, &config, &config_files, &cwd)
        },
        Commands::Doctor(args) => {
            commands::doctor::cmd_doctor(args, cli.json, &config, &config_files, &cwd)
        }
    };

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err)
            if err
                .downcast_ref::<ConfirmError>()
                .is_some_and(ConfirmError::is_cancelled) =>
        {
            tracing::info!("init cancelled by user");
            if !cli.quiet {
                eprintln!("{}", "Cancelled.".yellow());
            }
            Ok(ExitCode::from(EXIT_CANCELLED))
        }
        Err(err) => {
            tracing::error!(error = %err, "fatal error");
            Err(err)
        }
    }
}
