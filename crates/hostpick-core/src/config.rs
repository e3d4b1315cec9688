//! Configuration loading and discovery.
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. User config: `~/.config/hostpick/config.<ext>`
//! 3. Project config: `.hostpick.<ext>` or `hostpick.<ext>` in the current
//!    directory or any parent, stopping at a `.git` boundary
//! 4. Explicit files (`--config`)
//!
//! Where `<ext>` is one of: `toml`, `yaml`, `yml`, `json`
//!
//! # Example
//! ```no_run
//! use camino::Utf8PathBuf;
//! use hostpick_core::config::ConfigLoader;
//!
//! let cwd = std::env::current_dir().unwrap();
//! let cwd = Utf8PathBuf::try_from(cwd).expect("current directory is not valid UTF-8");
//! let config = ConfigLoader::new()
//!     .with_project_search(&cwd)
//!     .load()
//!     .unwrap();
//! println!("{:?}", config.malformed_selection_policy());
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};

use crate::arm::MANAGEMENT_SCOPE;
use crate::confirm::MalformedSelectionPolicy;
use crate::error::{ConfigError, ConfigResult};
use crate::target::TargetKind;

/// The configuration for hostpick.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Log level for the application (e.g., "debug", "info", "warn", "error").
    pub log_level: LogLevel,
    /// Directory for JSONL log files (falls back to platform defaults if unset).
    pub log_dir: Option<Utf8PathBuf>,
    /// Init workflow behavior.
    pub init: Option<InitConfig>,
    /// Management API request settings.
    pub arm: Option<ArmConfig>,
}

/// How `hostpick init` treats its target prompt.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct InitConfig {
    /// What to do with an unusable target selection (default: `use-default`).
    pub on_malformed_selection: Option<MalformedSelectionMode>,
    /// Target used by `use-default` (default: `app-service`).
    pub fallback_target: Option<TargetKind>,
}

/// Config-file spelling of [`MalformedSelectionPolicy`].
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MalformedSelectionMode {
    /// Warn and continue with the fallback target.
    #[default]
    UseDefault,
    /// Fail the init command.
    Abort,
}

/// Settings for authenticated management requests.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ArmConfig {
    /// Token scope (default: the Azure management scope).
    pub scope: Option<String>,
    /// Azure CLI binary used to acquire tokens (default: `az`).
    pub az_binary: Option<String>,
}

impl Config {
    /// The malformed-selection policy described by the `[init]` section.
    pub fn malformed_selection_policy(&self) -> MalformedSelectionPolicy {
        let init = self.init.clone().unwrap_or_default();
        match init.on_malformed_selection.unwrap_or_default() {
            MalformedSelectionMode::UseDefault => MalformedSelectionPolicy::UseDefault(
                init.fallback_target.unwrap_or(TargetKind::AppService),
            ),
            MalformedSelectionMode::Abort => MalformedSelectionPolicy::Abort,
        }
    }

    /// Token scope for management requests.
    pub fn arm_scope(&self) -> &str {
        self.arm
            .as_ref()
            .and_then(|arm| arm.scope.as_deref())
            .unwrap_or(MANAGEMENT_SCOPE)
    }

    /// Azure CLI binary name or path.
    pub fn az_binary(&self) -> &str {
        self.arm
            .as_ref()
            .and_then(|arm| arm.az_binary.as_deref())
            .unwrap_or("az")
    }

    fn validate(&self) -> ConfigResult<()> {
        let fallback = self.init.as_ref().and_then(|init| init.fallback_target);
        if fallback == Some(TargetKind::Unspecified) {
            return Err(ConfigError::Invalid(
                "init.fallback_target must name a hosting target, not `unspecified`".into(),
            ));
        }
        Ok(())
    }
}

/// Log level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose output for debugging and development.
    Debug,
    /// Standard operational information (default).
    #[default]
    Info,
    /// Warnings about potential issues.
    Warn,
    /// Errors that indicate failures.
    Error,
}

impl LogLevel {
    /// Returns the log level as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Supported configuration file extensions (in order of preference).
const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Application name for XDG directory lookup and config file names.
const APP_NAME: &str = "hostpick";

/// Builder for loading configuration from multiple sources.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Starting directory for project config search.
    project_search_root: Option<Utf8PathBuf>,
    /// Whether to include user config from XDG directory.
    include_user_config: bool,
    /// Stop searching when we hit a directory containing this file/dir.
    boundary_marker: Option<String>,
    /// Explicit config files to load.
    explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default settings.
    pub fn new() -> Self {
        Self {
            project_search_root: None,
            include_user_config: true,
            boundary_marker: Some(".git".to_string()),
            explicit_files: Vec::new(),
        }
    }

    /// Set the starting directory for project config search.
    pub fn with_project_search<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.project_search_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set whether to include user config from `~/.config/hostpick/`.
    pub const fn with_user_config(mut self, include: bool) -> Self {
        self.include_user_config = include;
        self
    }

    /// Stop the upward search at a directory containing `marker` (default `.git`).
    pub fn with_boundary_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.boundary_marker = Some(marker.into());
        self
    }

    /// Disable boundary marker (search all the way to filesystem root).
    pub fn without_boundary_marker(mut self) -> Self {
        self.boundary_marker = None;
        self
    }

    /// Add an explicit config file; later files take precedence.
    pub fn with_file<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.explicit_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Config files [`load`](Self::load) merges, lowest precedence first.
    ///
    /// Explicit files are listed whether or not they exist; `load` reports
    /// a missing one as an error.
    pub fn sources(&self) -> Vec<Utf8PathBuf> {
        let mut files = Vec::new();
        if self.include_user_config
            && let Some(user_config) = self.find_user_config()
        {
            files.push(user_config);
        }
        if let Some(ref root) = self.project_search_root
            && let Some(project_config) = self.find_project_config(root)
        {
            files.push(project_config);
        }
        files.extend(self.explicit_files.iter().cloned());
        files
    }

    /// Load and validate configuration, merging all discovered sources.
    #[tracing::instrument(skip(self), fields(search_root = ?self.project_search_root))]
    pub fn load(self) -> ConfigResult<Config> {
        tracing::debug!("loading configuration");
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        for file in self.sources() {
            figment = Self::merge_file(figment, &file);
        }

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;
        config.validate()?;
        tracing::info!(
            log_level = config.log_level.as_str(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Find project config by walking up from the given directory.
    fn find_project_config(&self, start: &Utf8Path) -> Option<Utf8PathBuf> {
        let mut current = Some(start.to_path_buf());

        while let Some(dir) = current {
            for ext in CONFIG_EXTENSIONS {
                let dotfile = dir.join(format!(".{APP_NAME}.{ext}"));
                if dotfile.is_file() {
                    return Some(dotfile);
                }

                let regular = dir.join(format!("{APP_NAME}.{ext}"));
                if regular.is_file() {
                    return Some(regular);
                }
            }

            // The boundary directory itself is searched; its parents are not.
            if let Some(ref marker) = self.boundary_marker
                && dir.join(marker).exists()
            {
                break;
            }

            current = dir.parent().map(Utf8Path::to_path_buf);
        }

        None
    }

    /// Find user config in XDG config directory.
    fn find_user_config(&self) -> Option<Utf8PathBuf> {
        let config_dir = user_config_dir()?;
        CONFIG_EXTENSIONS
            .iter()
            .map(|ext| config_dir.join(format!("config.{ext}")))
            .find(|path| path.is_file())
    }

    /// Merge a config file into the figment, detecting format from extension.
    fn merge_file(figment: Figment, path: &Utf8Path) -> Figment {
        match path.extension() {
            Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path.as_str())),
            Some("json") => figment.merge(Json::file_exact(path.as_str())),
            _ => figment.merge(Toml::file_exact(path.as_str())),
        }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// User config directory (`~/.config/hostpick/` on Linux).
pub fn user_config_dir() -> Option<Utf8PathBuf> {
    let proj_dirs = project_dirs()?;
    Utf8PathBuf::from_path_buf(proj_dirs.config_dir().to_path_buf()).ok()
}

/// User cache directory (`~/.cache/hostpick/` on Linux).
pub fn user_cache_dir() -> Option<Utf8PathBuf> {
    let proj_dirs = project_dirs()?;
    Utf8PathBuf::from_path_buf(proj_dirs.cache_dir().to_path_buf()).ok()
}

/// Machine-local data directory (`~/.local/share/hostpick/` on Linux).
pub fn user_data_local_dir() -> Option<Utf8PathBuf> {
    let proj_dirs = project_dirs()?;
    Utf8PathBuf::from_path_buf(proj_dirs.data_local_dir().to_path_buf()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn load_file(name: &str, contents: &str) -> ConfigResult<Config> {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(name);
        fs::write(&path, contents).unwrap();
        let path = Utf8PathBuf::try_from(path).unwrap();
        ConfigLoader::new()
            .with_user_config(false)
            .with_file(&path)
            .load()
    }

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(config.log_dir.is_none());
        assert!(config.init.is_none());
        assert_eq!(
            config.malformed_selection_policy(),
            MalformedSelectionPolicy::UseDefault(TargetKind::AppService)
        );
        assert_eq!(config.arm_scope(), MANAGEMENT_SCOPE);
        assert_eq!(config.az_binary(), "az");
    }

    #[test]
    fn loader_builds_with_defaults() {
        let config = ConfigLoader::new()
            .with_user_config(false)
            .without_boundary_marker()
            .load()
            .unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn init_section_toml() {
        let config = load_file(
            "config.toml",
            r#"
[init]
on_malformed_selection = "use-default"
fallback_target = "container-app"
"#,
        )
        .unwrap();
        assert_eq!(
            config.malformed_selection_policy(),
            MalformedSelectionPolicy::UseDefault(TargetKind::ContainerApp)
        );
    }

    #[test]
    fn abort_policy_yaml() {
        let config = load_file("config.yaml", "init:\n  on_malformed_selection: abort\n").unwrap();
        assert_eq!(
            config.malformed_selection_policy(),
            MalformedSelectionPolicy::Abort
        );
    }

    #[test]
    fn arm_section_json() {
        let config = load_file(
            "config.json",
            r#"{"arm": {"scope": "api://other/.default", "az_binary": "/opt/az/bin/az"}}"#,
        )
        .unwrap();
        assert_eq!(config.arm_scope(), "api://other/.default");
        assert_eq!(config.az_binary(), "/opt/az/bin/az");
    }

    #[test]
    fn unspecified_fallback_is_rejected() {
        let result = load_file("config.toml", "[init]\nfallback_target = \"unspecified\"\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn unknown_fallback_is_rejected() {
        let result = load_file("config.toml", "[init]\nfallback_target = \"lambda\"\n");
        assert!(matches!(result, Err(ConfigError::Deserialize(_))));
    }

    #[test]
    fn later_file_overrides_earlier() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("base.toml");
        fs::write(&base, r#"log_level = "warn""#).unwrap();
        let over = tmp.path().join("override.toml");
        fs::write(&over, r#"log_level = "error""#).unwrap();

        let config = ConfigLoader::new()
            .with_user_config(false)
            .with_file(Utf8PathBuf::try_from(base).unwrap())
            .with_file(Utf8PathBuf::try_from(over).unwrap())
            .load()
            .unwrap();
        assert_eq!(config.log_level, LogLevel::Error);
    }

    #[test]
    fn project_config_discovery_from_subdirectory() {
        let tmp = TempDir::new().unwrap();
        let project_dir = tmp.path().join("project");
        let sub_dir = project_dir.join("src").join("deep");
        fs::create_dir_all(&sub_dir).unwrap();
        fs::write(project_dir.join(".hostpick.toml"), r#"log_level = "debug""#).unwrap();

        let config = ConfigLoader::new()
            .with_user_config(false)
            .without_boundary_marker()
            .with_project_search(Utf8PathBuf::try_from(sub_dir).unwrap())
            .load()
            .unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn boundary_marker_stops_search() {
        let tmp = TempDir::new().unwrap();
        let parent = tmp.path().join("parent");
        let child = parent.join("child");
        let work = child.join("work");
        fs::create_dir_all(&work).unwrap();
        fs::write(parent.join(".hostpick.toml"), r#"log_level = "warn""#).unwrap();
        fs::create_dir(child.join(".git")).unwrap();

        let config = ConfigLoader::new()
            .with_user_config(false)
            .with_boundary_marker(".git")
            .with_project_search(Utf8PathBuf::try_from(work).unwrap())
            .load()
            .unwrap();
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn config_beside_boundary_marker_is_found() {
        let tmp = TempDir::new().unwrap();
        let repo = tmp.path().join("repo");
        let src = repo.join("src");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir(repo.join(".git")).unwrap();
        fs::write(repo.join(".hostpick.toml"), r#"log_level = "debug""#).unwrap();

        let config = ConfigLoader::new()
            .with_user_config(false)
            .with_project_search(Utf8PathBuf::try_from(src).unwrap())
            .load()
            .unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn explicit_file_overrides_project_config() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(".hostpick.toml"),
            "[init]\nfallback_target = \"container-app\"\n",
        )
        .unwrap();
        let over = tmp.path().join("override.toml");
        fs::write(&over, "[init]\non_malformed_selection = \"abort\"\n").unwrap();

        let config = ConfigLoader::new()
            .with_user_config(false)
            .without_boundary_marker()
            .with_project_search(Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap())
            .with_file(Utf8PathBuf::try_from(over).unwrap())
            .load()
            .unwrap();

        // Sections merge key by key.
        let init = config.init.clone().unwrap();
        assert_eq!(init.fallback_target, Some(TargetKind::ContainerApp));
        assert_eq!(
            config.malformed_selection_policy(),
            MalformedSelectionPolicy::Abort
        );
    }

    #[test]
    fn sources_lists_discovered_then_explicit_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("hostpick.yaml"), "log_level: warn\n").unwrap();
        let root = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        let explicit = root.join("override.toml");

        let loader = ConfigLoader::new()
            .with_user_config(false)
            .with_project_search(&root)
            .with_file(&explicit);
        assert_eq!(
            loader.sources(),
            vec![root.join("hostpick.yaml"), explicit]
        );
    }

    #[test]
    fn sources_respect_boundary_marker() {
        let tmp = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();
        fs::write(root.join(".hostpick.toml"), r#"log_level = "warn""#).unwrap();
        let src = root.join("repo").join("src");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir(root.join("repo").join(".git")).unwrap();

        let loader = ConfigLoader::new()
            .with_user_config(false)
            .with_project_search(&src);
        assert!(loader.sources().is_empty());
        assert_eq!(loader.load().unwrap().log_level, LogLevel::Info);
    }

    #[test]
    fn user_config_dir_names_app() {
        if let Some(path) = user_config_dir() {
            assert!(path.as_str().contains("hostpick"));
        }
    }
}
