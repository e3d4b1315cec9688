//! Doctor command: diagnose configuration, environment, and the Azure CLI.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::Confirm;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use hostpick_core::config::{self, Config};
use hostpick_core::tools::{self, MIN_AZ_CLI_VERSION, ToolVersionCheck};

/// Arguments for the `doctor` subcommand.
#[derive(Args, Debug, Default)]
pub struct DoctorArgs {
    /// Skip running the Azure CLI
    #[arg(long)]
    pub offline: bool,
}

#[derive(Serialize)]
struct DoctorReport {
    directories: DirectoryPaths,
    config: ConfigStatus,
    azure_cli: AzureCliStatus,
    environment: EnvironmentInfo,
}

#[derive(Serialize)]
struct DirectoryPaths {
    config: Option<String>,
    cache: Option<String>,
    data_local: Option<String>,
}

#[derive(Serialize)]
struct ConfigStatus {
    /// Files merged into the configuration, lowest precedence first
    files: Vec<String>,
    /// Whether any config file was loaded
    found: bool,
}

#[derive(Serialize)]
struct AzureCliStatus {
    binary: String,
    installed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    minimum: String,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    problem: Option<String>,
}

impl AzureCliStatus {
    fn check(binary: &str, offline: bool) -> Self {
        let installed = tools::has_binary(binary);
        let mut status = Self {
            binary: binary.to_string(),
            installed,
            version: None,
            minimum: MIN_AZ_CLI_VERSION.to_string(),
            ok: false,
            problem: None,
        };
        if !installed {
            status.problem = Some(format!("`{binary}` not found on PATH"));
            return status;
        }
        if offline {
            status.problem = Some("version not checked (--offline)".into());
            return status;
        }
        match tools::check_tool_version(binary, &MIN_AZ_CLI_VERSION) {
            ToolVersionCheck::Ok(found) => {
                status.version = Some(found.to_string());
                status.ok = true;
            }
            ToolVersionCheck::TooOld { found, minimum } => {
                status.version = Some(found.to_string());
                status.problem = Some(format!("{found} is older than {minimum}"));
            }
            ToolVersionCheck::Unknown(reason) => status.problem = Some(reason),
        }
        status
    }
}

#[derive(Serialize)]
struct EnvironmentInfo {
    /// Current working directory
    cwd: String,
    /// Relevant environment variables
    env_vars: Vec<EnvVar>,
}

#[derive(Serialize)]
struct EnvVar {
    name: &'static str,
    value: Option<String>,
    description: &'static str,
}

const WATCHED_ENV_VARS: &[(&str, &str)] = &[
    ("XDG_CONFIG_HOME", "Override config directory"),
    ("XDG_CACHE_HOME", "Override cache directory"),
    ("RUST_LOG", "Log filter directive"),
    ("HOSTPICK_LOG_PATH", "Explicit log file path"),
    ("HOSTPICK_LOG_DIR", "Log directory"),
    ("AZURE_CONFIG_DIR", "Azure CLI profile directory"),
];

impl DoctorReport {
    fn gather(
        cwd: &Utf8Path,
        config: &Config,
        config_files: &[Utf8PathBuf],
        offline: bool,
    ) -> Self {
        Self {
            directories: DirectoryPaths {
                config: config::user_config_dir().map(|p| p.to_string()),
                cache: config::user_cache_dir().map(|p| p.to_string()),
                data_local: config::user_data_local_dir().map(|p| p.to_string()),
            },
            config: ConfigStatus {
                found: !config_files.is_empty(),
                files: config_files.iter().map(ToString::to_string).collect(),
            },
            azure_cli: AzureCliStatus::check(config.az_binary(), offline),
            environment: EnvironmentInfo {
                cwd: cwd.to_string(),
                env_vars: WATCHED_ENV_VARS
                    .iter()
                    .map(|&(name, description)| EnvVar {
                        name,
                        value: std::env::var(name).ok(),
                        description,
                    })
                    .collect(),
            },
        }
    }
}

/// Run diagnostics and report configuration status.
#[instrument(name = "cmd_doctor", skip_all, fields(json_output))]
pub fn cmd_doctor(
    args: DoctorArgs,
    global_json: bool,
    config: &Config,
    config_files: &[Utf8PathBuf],
    cwd: &Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, offline = args.offline, "executing doctor command");

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Gathering diagnostics...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let report = DoctorReport::gather(cwd, config, config_files, args.offline);
    spinner.finish_and_clear();

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "Configuration".bold().underline());
    if report.config.found {
        for file in &report.config.files {
            println!("  {} Config file: {}", "✓".green(), file.cyan());
        }
    } else {
        println!("  {} No config file found", "○".yellow());
        offer_config_creation()?;
    }
    println!();

    println!("{}", "Azure CLI".bold().underline());
    let az = &report.azure_cli;
    if az.ok {
        println!(
            "  {} {} {}",
            "✓".green(),
            az.binary,
            az.version.as_deref().unwrap_or_default().cyan()
        );
    } else {
        println!(
            "  {} {}: {}",
            "✗".red(),
            az.binary,
            az.problem.as_deref().unwrap_or("unavailable").yellow()
        );
        println!("    {} {}+ is needed for `hostpick arm`", "→".dimmed(), az.minimum);
    }
    println!();

    println!("{}", "Directories".bold().underline());
    print_dir("  Config", report.directories.config.as_deref());
    print_dir("  Cache", report.directories.cache.as_deref());
    print_dir("  Data (local)", report.directories.data_local.as_deref());
    println!();

    println!("{}", "Environment".bold().underline());
    println!("  {}: {}", "Working directory".dimmed(), report.environment.cwd.cyan());
    let set_vars: Vec<_> = report
        .environment
        .env_vars
        .iter()
        .filter(|v| v.value.is_some())
        .collect();
    if set_vars.is_empty() {
        println!("  {} No overrides set", "○".dimmed());
    } else {
        for var in set_vars {
            println!(
                "  {}: {}",
                var.name.dimmed(),
                var.value.as_deref().unwrap_or_default().cyan()
            );
        }
    }

    Ok(())
}

fn print_dir(label: &str, path: Option<&str>) {
    print!("{}: ", label.dimmed());
    match path {
        Some(p) => println!("{}", p.cyan()),
        None => println!("{}", "(unavailable)".yellow()),
    }
}

/// Offer to write a default user config when none exists.
fn offer_config_creation() -> anyhow::Result<()> {
    let Some(config_dir) = config::user_config_dir() else {
        return Ok(());
    };
    let config_path = config_dir.join("config.yaml");

    if config_path.exists() || !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Ok(());
    }

    let create = Confirm::new("Create a default config file?")
        .with_default(false)
        .with_help_message(&format!("Will create {config_path}"))
        .prompt();

    // Declining or interrupting both leave things as they are.
    if let Ok(true) = create {
        std::fs::create_dir_all(&config_dir)?;
        let yaml = serde_saphyr::to_string(&default_user_config())?;
        std::fs::write(&config_path, yaml)?;
        println!("  {} Created {}", "✓".green(), config_path.cyan());
    }

    Ok(())
}

/// Defaults written by [`offer_config_creation`], with every section spelled out.
fn default_user_config() -> Config {
    use hostpick_core::config::{ArmConfig, InitConfig, MalformedSelectionMode};
    use hostpick_core::{TargetKind, arm::MANAGEMENT_SCOPE};

    Config {
        init: Some(InitConfig {
            on_malformed_selection: Some(MalformedSelectionMode::UseDefault),
            fallback_target: Some(TargetKind::AppService),
        }),
        arm: Some(ArmConfig {
            scope: Some(MANAGEMENT_SCOPE.to_string()),
            az_binary: Some("az".to_string()),
        }),
        ..Config::default()
    }
}
