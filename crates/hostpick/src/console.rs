//! Terminal console backed by `inquire` prompts.

use hostpick_core::console::{Console, ConsoleError, DisplayLine, PromptContext, Tone};
use inquire::{InquireError, Select, Text};
use owo_colors::{OwoColorize, Stream};

/// Interactive [`Console`] for a terminal session.
///
/// Messages go to the chosen stream; inquire draws its prompts on stderr.
/// Tones are styled with owo-colors and honor `--color`.
#[derive(Debug, Clone, Copy)]
pub struct InquireConsole {
    stream: Stream,
}

impl InquireConsole {
    /// Messages on stdout.
    pub const fn stdout() -> Self {
        Self {
            stream: Stream::Stdout,
        }
    }

    /// Messages on stderr, leaving stdout for program output.
    pub const fn stderr() -> Self {
        Self {
            stream: Stream::Stderr,
        }
    }

    fn styled(&self, line: &DisplayLine) -> String {
        let stream = self.stream;
        line.segments()
            .iter()
            .map(|segment| {
                let text = segment.text.as_str();
                match segment.tone {
                    Tone::Plain => text.to_string(),
                    Tone::Heading => text
                        .if_supports_color(stream, |t| t.bold())
                        .to_string(),
                    Tone::Name => text
                        .if_supports_color(stream, |t| t.bright_blue())
                        .to_string(),
                    Tone::Path | Tone::Product => text
                        .if_supports_color(stream, |t| t.cyan())
                        .to_string(),
                    Tone::Warning => text
                        .if_supports_color(stream, |t| t.yellow())
                        .to_string(),
                }
            })
            .collect()
    }
}

impl Console for InquireConsole {
    fn message(&self, _ctx: &PromptContext, line: &DisplayLine) {
        let text = self.styled(line);
        match self.stream {
            Stream::Stdout => println!("{text}"),
            Stream::Stderr => eprintln!("{text}"),
        }
    }

    fn select(
        &self,
        ctx: &PromptContext,
        prompt: &str,
        options: &[&str],
    ) -> Result<usize, ConsoleError> {
        ctx.check()?;
        let choice = Select::new(prompt, options.to_vec())
            .with_starting_cursor(0)
            .raw_prompt()
            .map_err(console_error)?;
        Ok(choice.index)
    }

    fn read_number(&self, ctx: &PromptContext) -> Result<i64, ConsoleError> {
        ctx.check()?;
        let input = Text::new("Enter a number:")
            .prompt()
            .map_err(console_error)?;
        let trimmed = input.trim();
        trimmed
            .parse()
            .map_err(|_| ConsoleError::InvalidInput(trimmed.to_string()))
    }
}

fn console_error(err: InquireError) -> ConsoleError {
    match err {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => {
            ConsoleError::Interrupted
        }
        InquireError::NotTTY => ConsoleError::Unavailable("input is not a terminal".into()),
        InquireError::IO(io) => ConsoleError::Io(io),
        other => ConsoleError::Unavailable(other.to_string()),
    }
}
