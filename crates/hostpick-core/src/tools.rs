//! External tool probing.
//!
//! Checks whether a CLI tool is on `PATH` and whether its reported version
//! is recent enough.

use std::process::Command;

use tracing::{debug, instrument};

/// Minimum Azure CLI version with `account get-access-token --scope`.
pub const MIN_AZ_CLI_VERSION: semver::Version = semver::Version::new(2, 0, 0);

/// Check whether a binary is available on `PATH`.
pub fn has_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Result of a tool version check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolVersionCheck {
    /// Tool meets the minimum version.
    Ok(semver::Version),
    /// Tool is too old.
    TooOld {
        /// The version that was found.
        found: semver::Version,
        /// The minimum required version.
        minimum: semver::Version,
    },
    /// Could not determine the version (binary missing, parse failure, etc.).
    Unknown(String),
}

/// Check the installed version of a CLI tool.
///
/// Runs `<binary> --version` and compares the first semver token of its
/// output against `minimum`. `az --version` prints a table whose first row
/// is `azure-cli  2.61.0`, which matches.
#[instrument]
pub fn check_tool_version(binary: &str, minimum: &semver::Version) -> ToolVersionCheck {
    let output = match Command::new(binary).arg("--version").output() {
        Ok(o) if o.status.success() => o,
        Ok(o) => {
            return ToolVersionCheck::Unknown(format!(
                "`{binary} --version` exited with {}",
                o.status,
            ));
        }
        Err(e) => {
            return ToolVersionCheck::Unknown(format!(
                "failed to run `{binary} --version`: {e}",
            ));
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let Some(version) = parse_version_from_output(&stdout) else {
        return ToolVersionCheck::Unknown(format!(
            "could not parse version from `{binary} --version` output",
        ));
    };
    debug!(%version, "found tool version");

    compare(version, minimum)
}

fn compare(found: semver::Version, minimum: &semver::Version) -> ToolVersionCheck {
    if found >= *minimum {
        ToolVersionCheck::Ok(found)
    } else {
        ToolVersionCheck::TooOld {
            found,
            minimum: minimum.clone(),
        }
    }
}

/// Extract the first semver token from tool output.
fn parse_version_from_output(output: &str) -> Option<semver::Version> {
    output
        .split_whitespace()
        .find_map(|token| semver::Version::parse(token).ok())
}
