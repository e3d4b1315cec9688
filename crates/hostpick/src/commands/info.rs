//! Info command: show package, config, and detected project information.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use hostpick_core::config::Config;
use hostpick_core::{Language, MalformedSelectionPolicy, TargetKind};

/// Arguments for the `info` subcommand.
#[derive(Args, Debug, Default)]
pub struct InfoArgs {
    // No subcommand-specific arguments; uses global --json flag
}

#[derive(Serialize)]
struct PackageInfo {
    name: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    repository: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    license: &'static str,
}

impl PackageInfo {
    const fn new() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            description: env!("CARGO_PKG_DESCRIPTION"),
            repository: env!("CARGO_PKG_REPOSITORY"),
            license: env!("CARGO_PKG_LICENSE"),
        }
    }
}

#[derive(Serialize)]
struct ConfigInfo {
    /// Files merged into the configuration, lowest precedence first
    config_files: Vec<String>,
    log_level: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_dir: Option<String>,
    on_malformed_selection: MalformedSelectionPolicy,
    arm_scope: String,
    az_binary: String,
}

impl ConfigInfo {
    fn from_config(config: &Config, config_files: &[Utf8PathBuf]) -> Self {
        Self {
            config_files: config_files.iter().map(ToString::to_string).collect(),
            log_level: config.log_level.as_str(),
            log_dir: config.log_dir.as_ref().map(|p| p.to_string()),
            on_malformed_selection: config.malformed_selection_policy(),
            arm_scope: config.arm_scope().to_string(),
            az_binary: config.az_binary().to_string(),
        }
    }
}

#[derive(Serialize)]
struct ProjectInfo {
    language: Language,
    display_name: &'static str,
    path: String,
}

#[derive(Serialize)]
struct FullInfo {
    #[serde(flatten)]
    package: PackageInfo,
    config: ConfigInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    project: Option<ProjectInfo>,
}

fn describe_policy(policy: MalformedSelectionPolicy) -> String {
    match policy {
        MalformedSelectionPolicy::UseDefault(kind) => {
            format!("default to {} ({})", kind.label(), kind.code())
        }
        MalformedSelectionPolicy::Abort => "abort".to_string(),
    }
}

/// Print package, configuration, and project detection information.
#[instrument(name = "cmd_info", skip_all, fields(json_output))]
pub fn cmd_info(
    _args: InfoArgs,
    global_json: bool,
    config: &Config,
    config_files: &[Utf8PathBuf],
    cwd: &Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing info command");

    let info = FullInfo {
        package: PackageInfo::new(),
        config: ConfigInfo::from_config(config, config_files),
        project: Language::from_marker(cwd).map(|language| ProjectInfo {
            language,
            display_name: language.display_name(),
            path: cwd.to_string(),
        }),
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{} {}", info.package.name.bold(), info.package.version.green());
    if !info.package.description.is_empty() {
        println!("{}", info.package.description);
    }
    if !info.package.license.is_empty() {
        println!("{}: {}", "License".dimmed(), info.package.license);
    }
    if !info.package.repository.is_empty() {
        println!("{}: {}", "Repository".dimmed(), info.package.repository.cyan());
    }

    println!();
    println!("{}", "Configuration".bold().underline());
    if info.config.config_files.is_empty() {
        println!("{}: {}", "Config file".dimmed(), "none loaded".yellow());
    }
    for path in &info.config.config_files {
        println!("{}: {}", "Config file".dimmed(), path.cyan());
    }
    println!("{}: {}", "Log level".dimmed(), info.config.log_level);
    if let Some(ref dir) = info.config.log_dir {
        println!("{}: {}", "Log directory".dimmed(), dir);
    }
    println!(
        "{}: {}",
        "Malformed selection".dimmed(),
        describe_policy(info.config.on_malformed_selection)
    );
    println!("{}: {}", "Token scope".dimmed(), info.config.arm_scope);

    println!();
    println!("{}", "Project Detection".bold().underline());
    match info.project {
        Some(ref project) => {
            println!("{}: {}", "Language".dimmed(), project.display_name.cyan());
            println!("{}: {}", "Path".dimmed(), project.path.cyan());
            let menu: Vec<_> = TargetKind::OFFERED.iter().map(|k| k.label()).collect();
            println!("{}: {}", "Offered targets".dimmed(), menu.join(", "));
        }
        None => println!(
            "  {} {}",
            "○".yellow(),
            "No supported project detected".yellow()
        ),
    }

    Ok(())
}
