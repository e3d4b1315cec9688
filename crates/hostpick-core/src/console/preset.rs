//! Console that answers prompts from preset values.
//!
//! Used for non-interactive runs (answers passed as CLI flags) and in tests.
//! Printed lines go to a writer and are also kept as a transcript.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Write};

use super::{Console, ConsoleError, DisplayLine, PromptContext};

/// A [`Console`] backed by queued answers.
///
/// Each `read_number` / `select` call consumes the next queued answer of its
/// kind; when none is left the call fails with [`ConsoleError::Unavailable`].
#[derive(Debug)]
pub struct PresetConsole<W> {
    writer: RefCell<W>,
    numbers: RefCell<VecDeque<i64>>,
    choices: RefCell<VecDeque<usize>>,
    transcript: RefCell<Vec<DisplayLine>>,
}

impl PresetConsole<Vec<u8>> {
    /// Console writing into an in-memory buffer.
    pub fn buffered() -> Self {
        Self::new(Vec::new())
    }

    /// Everything written so far, as text.
    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.writer.borrow()).into_owned()
    }
}

impl PresetConsole<io::Stdout> {
    /// Console writing to stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> PresetConsole<W> {
    /// Console writing to `writer` with no queued answers.
    pub fn new(writer: W) -> Self {
        Self {
            writer: RefCell::new(writer),
            numbers: RefCell::default(),
            choices: RefCell::default(),
            transcript: RefCell::default(),
        }
    }

    /// Queue answers for [`Console::read_number`].
    #[must_use]
    pub fn with_numbers(self, numbers: impl IntoIterator<Item = i64>) -> Self {
        self.numbers.borrow_mut().extend(numbers);
        self
    }

    /// Queue answers (option indexes) for [`Console::select`].
    #[must_use]
    pub fn with_choices(self, choices: impl IntoIterator<Item = usize>) -> Self {
        self.choices.borrow_mut().extend(choices);
        self
    }

    /// Lines passed to [`Console::message`], in order.
    pub fn transcript(&self) -> Vec<DisplayLine> {
        self.transcript.borrow().clone()
    }

    fn write_line(&self, text: &str) {
        let mut writer = self.writer.borrow_mut();
        let _ = writeln!(writer, "{text}");
        let _ = writer.flush();
    }
}

impl<W: Write> Console for PresetConsole<W> {
    fn message(&self, _ctx: &PromptContext, line: &DisplayLine) {
        self.transcript.borrow_mut().push(line.clone());
        self.write_line(&line.to_string());
    }

    fn select(
        &self,
        ctx: &PromptContext,
        prompt: &str,
        options: &[&str],
    ) -> Result<usize, ConsoleError> {
        ctx.check()?;
        let choice = self
            .choices
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| ConsoleError::Unavailable(format!("no answer preset for `{prompt}`")))?;
        let label = options.get(choice).copied().unwrap_or("<unlisted option>");
        self.write_line(&format!("{prompt}: {label}"));
        Ok(choice)
    }

    fn read_number(&self, ctx: &PromptContext) -> Result<i64, ConsoleError> {
        ctx.check()?;
        let number = self
            .numbers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| ConsoleError::Unavailable("no numeric answer preset".into()))?;
        self.write_line(&format!("> {number}"));
        Ok(number)
    }
}
