//! Targets command: list the hosting target registry.

use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use hostpick_core::TargetKind;

/// Arguments for the `targets` subcommand.
#[derive(Args, Debug, Default)]
pub struct TargetsArgs {
    /// Only list targets offered by the init menu
    #[arg(long)]
    pub offered: bool,
}

#[derive(Serialize)]
struct TargetEntry {
    code: &'static str,
    label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    hosting_product: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    menu_number: Option<usize>,
}

fn entries(offered_only: bool) -> Vec<TargetEntry> {
    TargetKind::ALL
        .iter()
        .filter(|kind| kind.is_specified())
        .map(|&kind| TargetEntry {
            code: kind.code(),
            label: kind.label(),
            hosting_product: kind.hosting_product(),
            menu_number: TargetKind::OFFERED
                .iter()
                .position(|&offered| offered == kind)
                .map(|i| i + 1),
        })
        .filter(|entry| !offered_only || entry.menu_number.is_some())
        .collect()
}

/// Print known hosting targets.
#[instrument(name = "cmd_targets", skip_all, fields(json_output))]
pub fn cmd_targets(args: TargetsArgs, global_json: bool) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing targets command");
    let entries = entries(args.offered);

    if global_json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{}", "Hosting targets".bold().underline());
    for entry in &entries {
        let menu = entry
            .menu_number
            .map_or_else(|| "  ".to_string(), |n| format!("{n}."));
        println!(
            "  {} {:<30} {}",
            menu.dimmed(),
            entry.code.cyan(),
            entry.label
        );
    }
    Ok(())
}
