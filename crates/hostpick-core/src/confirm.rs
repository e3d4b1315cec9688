//! Interactive hosting target confirmation.
//!
//! Two steps, both driven through a [`Console`]:
//!
//! 1. **Select** ([`HostTargetPrompt::init`]): print the numbered target menu,
//!    read one number, and map it to a [`TargetKind`]. A number outside the
//!    menu (or a failed read) is handled by the [`MalformedSelectionPolicy`].
//! 2. **Confirm** ([`ConfirmationSession::confirm`]): show a summary of the
//!    project and the chosen target, then ask to confirm or cancel until the
//!    user gives a definitive answer.
//!
//! Both steps report usage through the [`UsageSink`] handed to the prompt.
//!
//! # Example
//!
//! ```no_run
//! use camino::Utf8Path;
//! use hostpick_core::confirm::HostTargetPrompt;
//! use hostpick_core::console::{PresetConsole, PromptContext};
//! use hostpick_core::project::{DetectedProject, Language};
//! use hostpick_core::usage::TracingUsageSink;
//!
//! let console = PresetConsole::stdout().with_numbers([1]).with_choices([0]);
//! let project = DetectedProject::new(Language::Python, "/repo/app");
//! let ctx = PromptContext::new();
//!
//! let session = HostTargetPrompt::new(&console, &TracingUsageSink)
//!     .init(&ctx, &project, Utf8Path::new("/repo"))?;
//! let target = session.confirm(&ctx)?;
//! println!("hosting on {target}");
//! # Ok::<(), hostpick_core::confirm::ConfirmError>(())
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::console::{Console, ConsoleError, DisplayLine, PromptContext, Tone};
use crate::project::DetectedProject;
use crate::target::TargetKind;
use crate::usage::{UsageKey, UsageSink};

/// Prompt shown above the confirm/cancel choice.
const CONFIRM_PROMPT: &str = "Select an option";

/// Errors that end a confirmation workflow.
#[derive(Error, Debug)]
pub enum ConfirmError {
    /// The user chose to cancel. An expected outcome, not a fault.
    #[error("cancelled due to user input")]
    Cancelled,

    /// The target selection was unusable and the policy is to abort.
    #[error("invalid target selection: {0}")]
    InvalidSelection(String),

    /// The console failed while prompting.
    #[error(transparent)]
    Console(#[from] ConsoleError),
}

impl ConfirmError {
    /// Whether the user cancelled (as opposed to a failure).
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// What to do when the target selection is out of range or unreadable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MalformedSelectionPolicy {
    /// Print a warning and continue with this target.
    ///
    /// The target must be specified; `UseDefault(Unspecified)` aborts.
    UseDefault(TargetKind),
    /// Fail initialization.
    Abort,
}

impl Default for MalformedSelectionPolicy {
    fn default() -> Self {
        Self::UseDefault(TargetKind::AppService)
    }
}

/// Answer to the confirmation question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmChoice {
    /// Accept the summary and continue.
    Confirm,
    /// Stop without a result.
    Cancel,
}

impl ConfirmChoice {
    /// Choices in menu order.
    pub const ALL: &[Self] = &[Self::Confirm, Self::Cancel];

    /// Menu label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Confirm => "Confirm and continue initializing my app",
            Self::Cancel => "Cancel and exit",
        }
    }

    /// Choice at a menu index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Why a selection fell through to the policy.
enum Malformed {
    OutOfRange(i64),
    Unreadable(ConsoleError),
}

/// Entry point: asks the user which hosting target to use.
pub struct HostTargetPrompt<'a, C: ?Sized, U: ?Sized> {
    console: &'a C,
    usage: &'a U,
    policy: MalformedSelectionPolicy,
}

impl<'a, C, U> HostTargetPrompt<'a, C, U>
where
    C: Console + ?Sized,
    U: UsageSink + ?Sized,
{
    /// Create a prompt with the default [`MalformedSelectionPolicy`].
    pub fn new(console: &'a C, usage: &'a U) -> Self {
        Self {
            console,
            usage,
            policy: MalformedSelectionPolicy::default(),
        }
    }

    /// Override the malformed-selection policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: MalformedSelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Ask for a target for `project` and start a confirmation session.
    ///
    /// `root` is only used to display the project path relative to it.
    /// Under [`MalformedSelectionPolicy::UseDefault`] this does not fail: bad
    /// input is reported as a warning line and the fallback is used.
    #[instrument(skip_all, fields(language = %project.language, root = %root))]
    pub fn init(
        self,
        ctx: &PromptContext,
        project: &'a DetectedProject,
        root: &Utf8Path,
    ) -> Result<ConfirmationSession<'a, C, U>, ConfirmError> {
        let selected = self.select_target(ctx)?;
        info!(target_kind = %selected, "hosting target selected");

        record(self.usage, UsageKey::DetectedServices, project);

        Ok(ConfirmationSession {
            console: self.console,
            usage: self.usage,
            project,
            root: root.to_path_buf(),
            selected,
        })
    }

    fn select_target(&self, ctx: &PromptContext) -> Result<TargetKind, ConfirmError> {
        self.console
            .message(ctx, &DisplayLine::plain("Select the App Host:"));
        for (i, kind) in TargetKind::OFFERED.iter().enumerate() {
            self.console
                .message(ctx, &DisplayLine::plain(format!("{}. {}", i + 1, kind.label())));
        }

        let malformed = match self.console.read_number(ctx) {
            Ok(number) => match TargetKind::from_menu_number(number) {
                Some(kind) => return Ok(kind),
                None => Malformed::OutOfRange(number),
            },
            Err(err) => Malformed::Unreadable(err),
        };

        match self.policy {
            MalformedSelectionPolicy::UseDefault(fallback) if fallback.is_specified() => {
                let line = match &malformed {
                    Malformed::OutOfRange(number) => {
                        warn!(number, fallback = %fallback, "selection out of range");
                        format!("Invalid selection. Defaulting to {}.", fallback.label())
                    }
                    Malformed::Unreadable(err) => {
                        warn!(error = %err, fallback = %fallback, "could not read selection");
                        format!(
                            "Error reading selection ({err}). Defaulting to {}.",
                            fallback.label()
                        )
                    }
                };
                self.console
                    .message(ctx, &DisplayLine::toned(line, Tone::Warning));
                Ok(fallback)
            }
            MalformedSelectionPolicy::UseDefault(_) => Err(ConfirmError::InvalidSelection(
                "no fallback hosting target configured".into(),
            )),
            MalformedSelectionPolicy::Abort => match malformed {
                Malformed::OutOfRange(number) => Err(ConfirmError::InvalidSelection(format!(
                    "{number} is not one of the listed options"
                ))),
                Malformed::Unreadable(err) => Err(err.into()),
            },
        }
    }
}

/// State of one confirmation: the project, its root, and the chosen target.
pub struct ConfirmationSession<'a, C: ?Sized, U: ?Sized> {
    console: &'a C,
    usage: &'a U,
    project: &'a DetectedProject,
    root: Utf8PathBuf,
    selected: TargetKind,
}

impl<C, U> ConfirmationSession<'_, C, U>
where
    C: Console + ?Sized,
    U: UsageSink + ?Sized,
{
    /// Target picked during [`HostTargetPrompt::init`].
    pub const fn selected_target(&self) -> TargetKind {
        self.selected
    }

    /// Summary lines describing the project and the selected target.
    pub fn summary(&self) -> Vec<DisplayLine> {
        let mut lines = vec![
            DisplayLine::blank(),
            DisplayLine::toned("Detected services:", Tone::Heading),
            DisplayLine::blank(),
            DisplayLine::plain("  ").push(self.project.display_name(), Tone::Name),
            DisplayLine::plain("  Detected in: ")
                .push(self.project.relative_to(&self.root), Tone::Path),
            DisplayLine::blank(),
        ];
        if let Some(product) = self.selected.hosting_product() {
            lines.push(
                DisplayLine::plain(
                    "hostpick will generate the files necessary to host your app on Azure using ",
                )
                .push(product, Tone::Product)
                .push(".", Tone::Plain),
            );
            lines.push(DisplayLine::blank());
        }
        lines
    }

    /// Print the summary to the console.
    pub fn render(&self, ctx: &PromptContext) {
        for line in self.summary() {
            self.console.message(ctx, &line);
        }
    }

    /// Show the summary and ask to confirm until the user decides.
    ///
    /// Returns the selected target on confirmation,
    /// [`ConfirmError::Cancelled`] on cancellation, and any console error
    /// unchanged.
    #[instrument(skip_all, fields(target_kind = %self.selected))]
    pub fn confirm(self, ctx: &PromptContext) -> Result<TargetKind, ConfirmError> {
        let labels: Vec<&str> = ConfirmChoice::ALL.iter().map(|c| c.label()).collect();

        loop {
            self.render(ctx);

            let index = self.console.select(ctx, CONFIRM_PROMPT, &labels)?;
            match ConfirmChoice::from_index(index) {
                Some(ConfirmChoice::Confirm) => {
                    record(self.usage, UsageKey::ConfirmedServices, self.project);
                    info!("hosting target confirmed");
                    return Ok(self.selected);
                }
                Some(ConfirmChoice::Cancel) => {
                    info!("confirmation cancelled");
                    return Err(ConfirmError::Cancelled);
                }
                None => debug!(index, "unrecognized choice; asking again"),
            }
        }
    }
}

fn record<U: UsageSink + ?Sized>(usage: &U, key: UsageKey, project: &DetectedProject) {
    usage.record_usage(key, &[project.language.tag().to_string()]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::PresetConsole;
    use crate::project::Language;
    use crate::usage::InMemoryUsage;

    fn python_app() -> DetectedProject {
        DetectedProject::new(Language::Python, "/repo/app")
    }

    fn warnings(console: &PresetConsole<Vec<u8>>) -> usize {
        console
            .transcript()
            .iter()
            .filter(|line| line.has_tone(Tone::Warning))
            .count()
    }

    fn text(lines: &[DisplayLine]) -> String {
        lines
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn menu_numbers_select_offered_targets() {
        for (number, expected) in [(1, TargetKind::AppService), (2, TargetKind::ContainerApp)] {
            let console = PresetConsole::buffered().with_numbers([number]);
            let usage = InMemoryUsage::new();
            let project = python_app();
            let session = HostTargetPrompt::new(&console, &usage)
                .init(&PromptContext::new(), &project, Utf8Path::new("/repo"))
                .unwrap();

            assert_eq!(session.selected_target(), expected);
            assert_eq!(warnings(&console), 0);
        }
    }

    #[test]
    fn menu_is_printed_through_console() {
        let console = PresetConsole::buffered().with_numbers([1]);
        let usage = InMemoryUsage::new();
        let project = python_app();
        HostTargetPrompt::new(&console, &usage)
            .init(&PromptContext::new(), &project, Utf8Path::new("/repo"))
            .unwrap();

        let out = text(&console.transcript());
        assert!(out.starts_with("Select the App Host:\n1. App Services\n2. Container Apps"));
    }

    #[test]
    fn out_of_range_falls_back_with_one_warning() {
        for number in [0, 3, 9, -4] {
            let console = PresetConsole::buffered().with_numbers([number]);
            let usage = InMemoryUsage::new();
            let project = python_app();
            let session = HostTargetPrompt::new(&console, &usage)
                .init(&PromptContext::new(), &project, Utf8Path::new("/repo"))
                .unwrap();

            assert_eq!(session.selected_target(), TargetKind::AppService);
            assert_eq!(warnings(&console), 1, "number {number}");
        }
    }

    #[test]
    fn read_failure_falls_back_with_one_warning() {
        // No preset numbers: the read fails.
        let console = PresetConsole::buffered();
        let usage = InMemoryUsage::new();
        let project = python_app();
        let session = HostTargetPrompt::new(&console, &usage)
            .init(&PromptContext::new(), &project, Utf8Path::new("/repo"))
            .unwrap();

        assert_eq!(session.selected_target(), TargetKind::AppService);
        assert_eq!(warnings(&console), 1);
        assert_eq!(usage.count(UsageKey::DetectedServices), 1);
    }

    #[test]
    fn custom_fallback_is_used() {
        let console = PresetConsole::buffered().with_numbers([7]);
        let usage = InMemoryUsage::new();
        let project = python_app();
        let session = HostTargetPrompt::new(&console, &usage)
            .with_policy(MalformedSelectionPolicy::UseDefault(TargetKind::ContainerApp))
            .init(&PromptContext::new(), &project, Utf8Path::new("/repo"))
            .unwrap();

        assert_eq!(session.selected_target(), TargetKind::ContainerApp);
        let out = text(&console.transcript());
        assert!(out.contains("Invalid selection. Defaulting to Container Apps."));
    }

    #[test]
    fn abort_policy_rejects_out_of_range() {
        let console = PresetConsole::buffered().with_numbers([5]);
        let usage = InMemoryUsage::new();
        let project = python_app();
        let result = HostTargetPrompt::new(&console, &usage)
            .with_policy(MalformedSelectionPolicy::Abort)
            .init(&PromptContext::new(), &project, Utf8Path::new("/repo"));

        assert!(matches!(result, Err(ConfirmError::InvalidSelection(_))));
        assert_eq!(usage.count(UsageKey::DetectedServices), 0);
        assert_eq!(warnings(&console), 0);
    }

    #[test]
    fn abort_policy_propagates_read_failure() {
        let console = PresetConsole::buffered();
        let usage = InMemoryUsage::new();
        let project = python_app();
        let result = HostTargetPrompt::new(&console, &usage)
            .with_policy(MalformedSelectionPolicy::Abort)
            .init(&PromptContext::new(), &project, Utf8Path::new("/repo"));

        assert!(matches!(result, Err(ConfirmError::Console(_))));
    }

    #[test]
    fn unspecified_fallback_aborts() {
        let console = PresetConsole::buffered().with_numbers([42]);
        let usage = InMemoryUsage::new();
        let project = python_app();
        let result = HostTargetPrompt::new(&console, &usage)
            .with_policy(MalformedSelectionPolicy::UseDefault(TargetKind::Unspecified))
            .init(&PromptContext::new(), &project, Utf8Path::new("/repo"));

        assert!(matches!(result, Err(ConfirmError::InvalidSelection(_))));
    }

    #[test]
    fn init_records_detected_language() {
        let console = PresetConsole::buffered().with_numbers([2]);
        let usage = InMemoryUsage::new();
        let project = DetectedProject::new(Language::Java, "/repo/api");
        HostTargetPrompt::new(&console, &usage)
            .init(&PromptContext::new(), &project, Utf8Path::new("/repo"))
            .unwrap();

        assert_eq!(
            usage.events(),
            vec![(UsageKey::DetectedServices, vec!["java".to_string()])]
        );
    }

    #[test]
    fn render_twice_writes_identical_output() {
        let console = PresetConsole::buffered().with_numbers([2]);
        let usage = InMemoryUsage::new();
        let project = python_app();
        let ctx = PromptContext::new();
        let session = HostTargetPrompt::new(&console, &usage)
            .init(&ctx, &project, Utf8Path::new("/repo"))
            .unwrap();

        let start = console.output().len();
        session.render(&ctx);
        let middle = console.output().len();
        session.render(&ctx);
        let output = console.output();

        let (first, second) = (&output[start..middle], &output[middle..]);
        assert!(first.contains("Azure Container Apps"));
        assert_eq!(first, second);
    }

    #[test]
    fn summary_names_product_only_for_offered_targets() {
        let project = python_app();
        let console = PresetConsole::buffered();
        let usage = InMemoryUsage::new();

        for kind in TargetKind::ALL {
            let session = ConfirmationSession {
                console: &console,
                usage: &usage,
                project: &project,
                root: Utf8PathBuf::from("/repo"),
                selected: *kind,
            };
            let lines = session.summary();
            let has_sentence = lines.iter().any(|l| l.has_tone(Tone::Product));
            let expected = matches!(kind, TargetKind::AppService | TargetKind::ContainerApp);
            assert_eq!(has_sentence, expected, "{kind}");
            if !expected {
                assert!(!text(&lines).contains("will generate"), "{kind}");
            }
        }
    }

    #[test]
    fn confirm_returns_selected_target_and_records_once() {
        let console = PresetConsole::buffered().with_numbers([2]).with_choices([0]);
        let usage = InMemoryUsage::new();
        let project = python_app();
        let ctx = PromptContext::new();
        let session = HostTargetPrompt::new(&console, &usage)
            .init(&ctx, &project, Utf8Path::new("/repo"))
            .unwrap();

        assert_eq!(session.confirm(&ctx).unwrap(), TargetKind::ContainerApp);
        assert_eq!(usage.count(UsageKey::ConfirmedServices), 1);
    }

    #[test]
    fn cancel_returns_cancelled_without_confirmed_record() {
        let console = PresetConsole::buffered().with_numbers([1]).with_choices([1]);
        let usage = InMemoryUsage::new();
        let project = python_app();
        let ctx = PromptContext::new();
        let session = HostTargetPrompt::new(&console, &usage)
            .init(&ctx, &project, Utf8Path::new("/repo"))
            .unwrap();

        let err = session.confirm(&ctx).unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(err.to_string(), "cancelled due to user input");
        assert_eq!(usage.count(UsageKey::ConfirmedServices), 0);
    }

    #[test]
    fn unknown_choice_prompts_again() {
        let console = PresetConsole::buffered()
            .with_numbers([1])
            .with_choices([5, 0]);
        let usage = InMemoryUsage::new();
        let project = python_app();
        let ctx = PromptContext::new();
        let session = HostTargetPrompt::new(&console, &usage)
            .init(&ctx, &project, Utf8Path::new("/repo"))
            .unwrap();

        assert_eq!(session.confirm(&ctx).unwrap(), TargetKind::AppService);
        let headings = console
            .transcript()
            .iter()
            .filter(|l| l.has_tone(Tone::Heading))
            .count();
        assert_eq!(headings, 2);
        assert_eq!(usage.count(UsageKey::ConfirmedServices), 1);
    }

    #[test]
    fn console_error_propagates_from_confirm() {
        // A choice is never supplied, so select fails.
        let console = PresetConsole::buffered().with_numbers([1]);
        let usage = InMemoryUsage::new();
        let project = python_app();
        let ctx = PromptContext::new();
        let session = HostTargetPrompt::new(&console, &usage)
            .init(&ctx, &project, Utf8Path::new("/repo"))
            .unwrap();

        let err = session.confirm(&ctx).unwrap_err();
        assert!(matches!(err, ConfirmError::Console(ConsoleError::Unavailable(_))));
        assert_eq!(usage.count(UsageKey::ConfirmedServices), 0);
    }

    #[test]
    fn cancelled_context_short_circuits_confirm() {
        let console = PresetConsole::buffered().with_numbers([1]).with_choices([0]);
        let usage = InMemoryUsage::new();
        let project = python_app();
        let ctx = PromptContext::new();
        let session = HostTargetPrompt::new(&console, &usage)
            .init(&ctx, &project, Utf8Path::new("/repo"))
            .unwrap();

        ctx.cancel();
        let err = session.confirm(&ctx).unwrap_err();
        assert!(matches!(err, ConfirmError::Console(ConsoleError::Cancelled)));
        assert_eq!(usage.count(UsageKey::ConfirmedServices), 0);
    }

    #[test]
    fn scenario_python_app_confirmed() {
        let console = PresetConsole::buffered().with_numbers([1]).with_choices([0]);
        let usage = InMemoryUsage::new();
        let project = python_app();
        let ctx = PromptContext::new();
        let session = HostTargetPrompt::new(&console, &usage)
            .init(&ctx, &project, Utf8Path::new("/repo"))
            .unwrap();
        assert_eq!(session.selected_target(), TargetKind::AppService);

        let summary = text(&session.summary());
        assert!(summary.contains("Detected in: app"));
        assert!(summary.contains("Azure App Service"));

        assert_eq!(session.confirm(&ctx).unwrap(), TargetKind::AppService);
        assert_eq!(
            usage.events(),
            vec![
                (UsageKey::DetectedServices, vec!["python".to_string()]),
                (UsageKey::ConfirmedServices, vec!["python".to_string()]),
            ]
        );
    }

    #[test]
    fn scenario_invalid_number_then_cancel() {
        let console = PresetConsole::buffered().with_numbers([9]).with_choices([1]);
        let usage = InMemoryUsage::new();
        let project = python_app();
        let ctx = PromptContext::new();
        let session = HostTargetPrompt::new(&console, &usage)
            .init(&ctx, &project, Utf8Path::new("/repo"))
            .unwrap();
        assert_eq!(session.selected_target(), TargetKind::AppService);
        assert_eq!(warnings(&console), 1);

        let err = session.confirm(&ctx).unwrap_err();
        assert_eq!(err.to_string(), "cancelled due to user input");
    }

    #[test]
    fn policy_serde() {
        let json = serde_json::to_string(&MalformedSelectionPolicy::default()).unwrap();
        assert_eq!(json, r#"{"use-default":"app-service"}"#);
        let abort: MalformedSelectionPolicy = serde_json::from_str(r#""abort""#).unwrap();
        assert_eq!(abort, MalformedSelectionPolicy::Abort);
    }
}
