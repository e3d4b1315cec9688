//! Core library for hostpick.
//!
//! Picks a cloud hosting target for a detected application project and walks
//! the user through confirming it before any files are generated.
//!
//! # Modules
//!
//! - [`arm`] - Authenticated requests against the Azure management API
//! - [`config`] - Configuration loading and management
//! - [`confirm`] - The select-then-confirm hosting target workflow
//! - [`console`] - Console abstraction used by the workflow
//! - [`error`] - Error types and result aliases
//! - [`project`] - Detected projects and language detection
//! - [`target`] - Hosting target kinds
//! - [`tools`] - External tool probing
//! - [`usage`] - Usage attribute recording
//!
//! # Quick Start
//!
//! ```no_run
//! use hostpick_core::console::{PresetConsole, PromptContext};
//! use hostpick_core::usage::InMemoryUsage;
//! use hostpick_core::{DetectedProject, HostTargetPrompt, Language};
//!
//! let console = PresetConsole::stdout().with_numbers([2]).with_choices([0]);
//! let usage = InMemoryUsage::new();
//! let ctx = PromptContext::new();
//! let project = DetectedProject::new(Language::Python, "/repo/api");
//!
//! let session = HostTargetPrompt::new(&console, &usage)
//!     .init(&ctx, &project, camino::Utf8Path::new("/repo"))
//!     .expect("target selection failed");
//! let target = session.confirm(&ctx).expect("cancelled");
//! println!("hosting on {target}");
//! ```
#![deny(unsafe_code)]

pub mod arm;

pub mod config;

pub mod confirm;

pub mod console;

pub mod error;

pub mod project;

pub mod target;

pub mod tools;

pub mod usage;

pub use config::{Config, ConfigLoader, LogLevel};

pub use confirm::{ConfirmError, ConfirmationSession, HostTargetPrompt, MalformedSelectionPolicy};

pub use error::{ConfigError, ConfigResult};

pub use project::{DetectedProject, Language};

pub use target::TargetKind;
