//! Init command: pick and confirm a hosting target for a project.

use std::collections::BTreeMap;
use std::io;

use anyhow::{Context, bail};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use hostpick_core::config::Config;
use hostpick_core::console::{Console, PresetConsole, PromptContext};
use hostpick_core::usage::{InMemoryUsage, Tee, TracingUsageSink, UsageKey};
use hostpick_core::{DetectedProject, HostTargetPrompt, Language, TargetKind};

use crate::console::InquireConsole;

/// Arguments for the `init` subcommand.
#[derive(Args, Debug, Default)]
pub struct InitArgs {
    /// Project directory (defaults to the current directory)
    #[arg(value_name = "PATH")]
    pub path: Option<Utf8PathBuf>,

    /// Project language (skips marker-file detection)
    #[arg(short, long, value_name = "LANG")]
    pub language: Option<Language>,

    /// Directory the project path is displayed relative to
    #[arg(long, value_name = "DIR")]
    pub root: Option<Utf8PathBuf>,

    /// Answer the target menu with N instead of prompting
    #[arg(long, value_name = "N", allow_hyphen_values = true)]
    pub select: Option<i64>,

    /// Answer the confirmation with "confirm"
    #[arg(long, conflicts_with = "cancel")]
    pub yes: bool,

    /// Answer the confirmation with "cancel"
    #[arg(long)]
    pub cancel: bool,
}

impl InitArgs {
    const fn is_preset(&self) -> bool {
        self.select.is_some() || self.yes || self.cancel
    }

    fn preset_console<W: io::Write>(&self, writer: W) -> PresetConsole<W> {
        let choice = match (self.yes, self.cancel) {
            (true, _) => Some(0),
            (_, true) => Some(1),
            _ => None,
        };
        PresetConsole::new(writer)
            .with_numbers(self.select)
            .with_choices(choice)
    }
}

#[derive(Serialize)]
struct InitReport<'a> {
    target: TargetKind,
    label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    hosting_product: Option<&'static str>,
    language: Language,
    path: &'a Utf8Path,
    usage: BTreeMap<UsageKey, Vec<String>>,
}

/// Run the select-then-confirm workflow.
///
/// Cancellation comes back as a [`hostpick_core::ConfirmError::Cancelled`]
/// inside the returned error so `main` can pick the exit code.
#[instrument(name = "cmd_init", skip_all, fields(json_output))]
pub fn cmd_init(
    args: InitArgs,
    global_json: bool,
    config: &Config,
    cwd: &Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, preset = args.is_preset(), "executing init command");

    let path = resolve(cwd, args.path.as_deref());
    if !path.is_dir() {
        bail!("project directory {path} does not exist");
    }
    let root = resolve(cwd, args.root.as_deref());
    let language = match args.language {
        Some(language) => language,
        None => Language::from_marker(&path).with_context(|| {
            format!("no supported project found in {path}; pass --language to choose one")
        })?,
    };
    let project = DetectedProject::new(language, &path);

    // Prompts and the summary go to stderr when stdout carries JSON.
    let console: Box<dyn Console> = match (args.is_preset(), global_json) {
        (true, true) => Box::new(args.preset_console(io::stderr())),
        (true, false) => Box::new(args.preset_console(io::stdout())),
        (false, true) => Box::new(InquireConsole::stderr()),
        (false, false) => Box::new(InquireConsole::stdout()),
    };
    let recorded = InMemoryUsage::new();
    let usage = Tee(TracingUsageSink, &recorded);
    let ctx = PromptContext::new();

    let session = HostTargetPrompt::new(console.as_ref(), &usage)
        .with_policy(config.malformed_selection_policy())
        .init(&ctx, &project, &root)
        .context("hosting target selection failed")?;
    let target = session
        .confirm(&ctx)
        .context("hosting target confirmation failed")?;

    let report = InitReport {
        target,
        label: target.label(),
        hosting_product: target.hosting_product(),
        language,
        path: &project.path,
        usage: recorded.attributes(),
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "  {} Hosting target: {} ({})",
            "✓".green(),
            report.label.bold(),
            report.target.code().dimmed()
        );
    }

    Ok(())
}

fn resolve(cwd: &Utf8Path, path: Option<&Utf8Path>) -> Utf8PathBuf {
    match path {
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => cwd.join(p),
        None => cwd.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostpick_core::ConfirmError;

    fn utf8_tempdir() -> (tempfile::TempDir, Utf8PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        (tmp, path)
    }

    #[test]
    fn resolve_relative_and_absolute() {
        let cwd = Utf8Path::new("/work");
        assert_eq!(resolve(cwd, None), Utf8PathBuf::from("/work"));
        assert_eq!(resolve(cwd, Some(Utf8Path::new("api"))), Utf8PathBuf::from("/work/api"));
        assert_eq!(resolve(cwd, Some(Utf8Path::new("/srv"))), Utf8PathBuf::from("/srv"));
    }

    #[test]
    fn preset_answers_follow_flags() {
        let args = InitArgs {
            select: Some(2),
            cancel: true,
            ..InitArgs::default()
        };
        assert!(args.is_preset());
        let console = args.preset_console(Vec::new());
        let ctx = PromptContext::new();
        assert_eq!(console.read_number(&ctx).unwrap(), 2);
        assert_eq!(console.select(&ctx, "Select an option", &["a", "b"]).unwrap(), 1);
    }

    #[test]
    fn confirmed_preset_run_succeeds() {
        let (_tmp, dir) = utf8_tempdir();
        let args = InitArgs {
            language: Some(Language::Python),
            select: Some(2),
            yes: true,
            ..InitArgs::default()
        };
        assert!(cmd_init(args, true, &Config::default(), &dir).is_ok());
    }

    #[test]
    fn cancelled_preset_run_reports_cancellation() {
        let (_tmp, dir) = utf8_tempdir();
        let args = InitArgs {
            language: Some(Language::Java),
            select: Some(1),
            cancel: true,
            ..InitArgs::default()
        };
        let err = cmd_init(args, false, &Config::default(), &dir).unwrap_err();
        assert!(
            err.downcast_ref::<ConfirmError>()
                .is_some_and(ConfirmError::is_cancelled)
        );
    }

    #[test]
    fn missing_language_marker_is_an_error() {
        let (_tmp, dir) = utf8_tempdir();
        let args = InitArgs {
            select: Some(1),
            yes: true,
            ..InitArgs::default()
        };
        let err = cmd_init(args, false, &Config::default(), &dir).unwrap_err();
        assert!(err.to_string().contains("--language"));
    }
}
