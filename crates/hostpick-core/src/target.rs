//! Hosting target registry.
//!
//! [`TargetKind`] is the closed set of managed hosting products an app can be
//! initialized for. The set is fixed at compile time: unknown codes fail to
//! parse rather than falling back to a default.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A recognized hosting target, or the `unspecified` sentinel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetKind {
    /// No target chosen yet. Never the result of a confirmed session.
    #[default]
    Unspecified,
    /// Azure App Service.
    AppService,
    /// Azure Container Apps.
    ContainerApp,
    /// Azure Functions.
    AzureFunction,
    /// Azure Static Web Apps.
    StaticWebApp,
    /// Azure Spring Apps.
    SpringApp,
    /// Azure Kubernetes Service.
    Aks,
    /// App Service running a .NET container image.
    AppServiceDotnetContainer,
    /// Azure AI online endpoint.
    AiEndpoint,
}

/// Error returned when a textual code names no known target.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown hosting target `{0}`")]
pub struct ParseTargetKindError(pub String);

impl TargetKind {
    /// Every kind in the registry, `Unspecified` first.
    pub const ALL: &[Self] = &[
        Self::Unspecified,
        Self::AppService,
        Self::ContainerApp,
        Self::AzureFunction,
        Self::StaticWebApp,
        Self::SpringApp,
        Self::Aks,
        Self::AppServiceDotnetContainer,
        Self::AiEndpoint,
    ];

    /// Targets offered by the interactive selection prompt, in menu order.
    ///
    /// Menu entry `n` (1-based) selects `OFFERED[n - 1]`.
    pub const OFFERED: &[Self] = &[Self::AppService, Self::ContainerApp];

    /// Short textual code, as used in config files and `--json` output.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::AppService => "app-service",
            Self::ContainerApp => "container-app",
            Self::AzureFunction => "azure-function",
            Self::StaticWebApp => "static-web-app",
            Self::SpringApp => "spring-app",
            Self::Aks => "aks",
            Self::AppServiceDotnetContainer => "app-service-dotnet-container",
            Self::AiEndpoint => "ai-endpoint",
        }
    }

    /// Label shown in the selection menu.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unspecified => "Unspecified",
            Self::AppService => "App Services",
            Self::ContainerApp => "Container Apps",
            Self::AzureFunction => "Functions",
            Self::StaticWebApp => "Static Web Apps",
            Self::SpringApp => "Spring Apps",
            Self::Aks => "Kubernetes Service",
            Self::AppServiceDotnetContainer => "App Services (.NET container)",
            Self::AiEndpoint => "AI Endpoint",
        }
    }

    /// Product named in the confirmation summary.
    ///
    /// Only the targets the init workflow can generate files for have one.
    pub const fn hosting_product(self) -> Option<&'static str> {
        match self {
            Self::AppService => Some("Azure App Service"),
            Self::ContainerApp => Some("Azure Container Apps"),
            _ => None,
        }
    }

    /// Map a 1-based menu number to an offered target.
    pub fn from_menu_number(number: i64) -> Option<Self> {
        let index = usize::try_from(number).ok()?.checked_sub(1)?;
        Self::OFFERED.get(index).copied()
    }

    /// Whether this is a concrete target rather than the sentinel.
    pub const fn is_specified(self) -> bool {
        !matches!(self, Self::Unspecified)
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for TargetKind {
    type Err = ParseTargetKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.code() == s)
            .ok_or_else(|| ParseTargetKindError(s.to_string()))
    }
}
