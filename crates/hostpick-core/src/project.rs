//! Detected project model.
//!
//! A [`DetectedProject`] is produced outside the confirmation workflow; the
//! workflow only reads its language tag and path. [`Language::from_marker`]
//! is a single-marker-file lookup the CLI uses when no `--language` is given.
//!
//! # Example
//!
//! ```no_run
//! use camino::Utf8Path;
//! use hostpick_core::project::{DetectedProject, Language};
//!
//! let root = Utf8Path::new(".");
//! if let Some(language) = Language::from_marker(root) {
//!     let project = DetectedProject::new(language, root);
//!     println!("{}", project.display_name());
//! }
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, instrument};

/// Language tag of a detected project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// .NET (C# / F# project files).
    Dotnet,
    /// Python.
    Python,
    /// JavaScript (Node.js).
    Js,
    /// TypeScript.
    Ts,
    /// Java.
    Java,
}

/// Error returned when a language tag is not recognized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown language `{0}` (expected one of: dotnet, python, js, ts, java)")]
pub struct ParseLanguageError(pub String);

impl Language {
    /// All recognized languages, in marker lookup order.
    ///
    /// TypeScript precedes JavaScript since a TypeScript project also has a
    /// `package.json`.
    pub const ALL: &[Self] = &[Self::Dotnet, Self::Python, Self::Ts, Self::Js, Self::Java];

    /// Tag recorded in usage telemetry.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Dotnet => "dotnet",
            Self::Python => "python",
            Self::Js => "js",
            Self::Ts => "ts",
            Self::Java => "java",
        }
    }

    /// Human-readable name.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Dotnet => ".NET",
            Self::Python => "Python",
            Self::Js => "JavaScript",
            Self::Ts => "TypeScript",
            Self::Java => "Java",
        }
    }

    /// Marker files, any of which signals this language in a directory.
    const fn marker_files(self) -> &'static [&'static str] {
        match self {
            Self::Dotnet => &["global.json", "Directory.Build.props"],
            Self::Python => &["pyproject.toml", "requirements.txt"],
            Self::Ts => &["tsconfig.json"],
            Self::Js => &["package.json"],
            Self::Java => &["pom.xml", "build.gradle"],
        }
    }

    /// Identify a language from marker files directly under `dir`.
    ///
    /// Returns `None` if no marker is present.
    #[instrument(fields(dir = %dir))]
    pub fn from_marker(dir: &Utf8Path) -> Option<Self> {
        let language = Self::ALL.iter().copied().find(|language| {
            language
                .marker_files()
                .iter()
                .any(|marker| dir.join(marker).is_file())
        })?;
        debug!(language = language.tag(), "found language marker");
        Some(language)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Language {
    type Err = ParseLanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|language| language.tag().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseLanguageError(s.to_string()))
    }
}

/// A project found by detection, awaiting a hosting target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedProject {
    /// The project's language.
    pub language: Language,
    /// Directory containing the project.
    pub path: Utf8PathBuf,
}

impl DetectedProject {
    /// Create a project description.
    pub fn new(language: Language, path: impl AsRef<Utf8Path>) -> Self {
        Self {
            language,
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Name shown in the confirmation summary.
    pub const fn display_name(&self) -> &'static str {
        self.language.display_name()
    }

    /// Project path relative to `root`, for display.
    ///
    /// Yields `.` when the project is the root itself and the full path when
    /// the project lies outside `root`.
    pub fn relative_to(&self, root: &Utf8Path) -> String {
        match self.path.strip_prefix(root) {
            Ok(rel) if rel.as_str().is_empty() => ".".to_string(),
            Ok(rel) => rel.to_string(),
            Err(_) => self.path.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn utf8_tmp(tmp: &TempDir) -> &Utf8Path {
        Utf8Path::from_path(tmp.path()).expect("tempdir is UTF-8")
    }

    #[test]
    fn relative_path_under_root() {
        let project = DetectedProject::new(Language::Python, "/repo/app");
        assert_eq!(project.relative_to(Utf8Path::new("/repo")), "app");
    }

    #[test]
    fn relative_path_nested() {
        let project = DetectedProject::new(Language::Java, "/repo/src/api");
        assert_eq!(project.relative_to(Utf8Path::new("/repo")), "src/api");
    }

    #[test]
    fn relative_path_of_root_is_dot() {
        let project = DetectedProject::new(Language::Js, "/repo");
        assert_eq!(project.relative_to(Utf8Path::new("/repo")), ".");
    }

    #[test]
    fn relative_path_outside_root_is_full_path() {
        let project = DetectedProject::new(Language::Js, "/elsewhere/app");
        assert_eq!(project.relative_to(Utf8Path::new("/repo")), "/elsewhere/app");
    }

    #[test]
    fn language_parse_is_case_insensitive() {
        assert_eq!("Python".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("TS".parse::<Language>().unwrap(), Language::Ts);
        assert!("cobol".parse::<Language>().is_err());
    }

    #[test]
    fn language_serde_uses_tags() {
        let json = serde_json::to_string(&Language::Dotnet).unwrap();
        assert_eq!(json, "\"dotnet\"");
    }

    #[test]
    fn marker_python() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("requirements.txt"), "flask\n").unwrap();
        assert_eq!(Language::from_marker(utf8_tmp(&tmp)), Some(Language::Python));
    }

    #[test]
    fn marker_typescript_wins_over_javascript() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("package.json"), "{}").unwrap();
        fs::write(tmp.path().join("tsconfig.json"), "{}").unwrap();
        assert_eq!(Language::from_marker(utf8_tmp(&tmp)), Some(Language::Ts));
    }

    #[test]
    fn marker_javascript() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("package.json"), "{}").unwrap();
        assert_eq!(Language::from_marker(utf8_tmp(&tmp)), Some(Language::Js));
    }

    #[test]
    fn no_marker() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(Language::from_marker(utf8_tmp(&tmp)), None);
    }
}
