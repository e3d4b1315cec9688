//! Console collaborator interface.
//!
//! The confirmation workflow never touches stdin/stdout directly. Every line
//! it prints and every answer it reads goes through a [`Console`], so the CLI
//! can back it with real prompts and tests can back it with a script.
//!
//! Output is expressed as [`DisplayLine`]s: text segments tagged with a
//! [`Tone`]. Consoles decide how (or whether) to style each tone; the plain
//! text of a line is always its [`Display`](std::fmt::Display) output.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

mod preset;

pub use preset::PresetConsole;

/// Errors raised by a console while prompting.
#[derive(Error, Debug)]
pub enum ConsoleError {
    /// The user interrupted the prompt (e.g. Ctrl+C or Esc).
    #[error("prompt interrupted")]
    Interrupted,

    /// The prompt context was cancelled before or during the prompt.
    #[error("prompt cancelled")]
    Cancelled,

    /// The input stream is closed or not interactive.
    #[error("input is not available: {0}")]
    Unavailable(String),

    /// The answer could not be parsed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Underlying I/O failure.
    #[error("console I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Cancellation context threaded through every console call.
///
/// Clones share the same flag: cancelling any clone cancels them all.
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    cancelled: Arc<AtomicBool>,
}

impl PromptContext {
    /// Create a live (not cancelled) context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel this context and every clone of it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fail with [`ConsoleError::Cancelled`] if the context is cancelled.
    pub fn check(&self) -> Result<(), ConsoleError> {
        if self.is_cancelled() {
            Err(ConsoleError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Visual role of a text segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Unstyled text.
    Plain,
    /// Section heading.
    Heading,
    /// Name of the detected project.
    Name,
    /// Filesystem path.
    Path,
    /// Hosting product name.
    Product,
    /// Recoverable problem.
    Warning,
}

/// A run of text with one tone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// The text.
    pub text: String,
    /// How the text should be presented.
    pub tone: Tone,
}

/// One line of console output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayLine {
    segments: Vec<Segment>,
}

impl DisplayLine {
    /// An empty line.
    pub fn blank() -> Self {
        Self::default()
    }

    /// A line holding a single plain segment.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::blank().push(text, Tone::Plain)
    }

    /// A line holding a single segment with the given tone.
    pub fn toned(text: impl Into<String>, tone: Tone) -> Self {
        Self::blank().push(text, tone)
    }

    /// Append a segment.
    #[must_use]
    pub fn push(mut self, text: impl Into<String>, tone: Tone) -> Self {
        self.segments.push(Segment {
            text: text.into(),
            tone,
        });
        self
    }

    /// The segments of this line, in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether any segment carries `tone`.
    pub fn has_tone(&self, tone: Tone) -> bool {
        self.segments.iter().any(|s| s.tone == tone)
    }
}

impl fmt::Display for DisplayLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            f.write_str(&segment.text)?;
        }
        Ok(())
    }
}

/// Interactive console used by the confirmation workflow.
///
/// Implementations are called sequentially from one workflow at a time and
/// must honor `ctx` in their blocking calls.
pub trait Console {
    /// Print one line.
    fn message(&self, ctx: &PromptContext, line: &DisplayLine);

    /// Present `options` and block until one is picked; returns its index.
    fn select(
        &self,
        ctx: &PromptContext,
        prompt: &str,
        options: &[&str],
    ) -> Result<usize, ConsoleError>;

    /// Block until the user enters a whole number.
    fn read_number(&self, ctx: &PromptContext) -> Result<i64, ConsoleError>;
}
