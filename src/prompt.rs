//! Interactive prompts: yes/no confirmations and the distribution menu.
use std::io::{self, BufRead, BufReader, Write};
use std::sync::Mutex;

use anyhow::{Context as _, Result};

use crate::error::{MAX_CONFIRM_ATTEMPTS, ProvisionError};
use crate::platform::Distro;

/// Source of operator decisions.
#[cfg_attr(test, mockall::automock)]
pub trait Prompter: Send + Sync {
    /// Ask a yes/no question.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::InvalidConfirmation`] after too many
    /// unrecognised answers, or an I/O error.
    fn confirm(&self, question: &str) -> Result<bool>;

    /// Present the distribution menu and return the choice.
    ///
    /// `detected` is shown as a hint and never selected implicitly.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::InvalidSelection`] for input outside the
    /// menu, or an I/O error.
    fn choose_distro(&self, detected: Option<Distro>) -> Result<Distro>;
}

/// Interpret a yes/no answer.  Empty input means "no".
#[must_use]
pub fn parse_answer(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" | "" => Some(false),
        _ => None,
    }
}

/// Line-oriented prompter over any reader/writer pair.
///
/// The production instance reads standard input; tests feed a
/// [`std::io::Cursor`].
pub struct LinePrompter<R, W> {
    io: Mutex<(R, W)>,
    assume_yes: bool,
}

impl<R, W> std::fmt::Debug for LinePrompter<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinePrompter")
            .field("assume_yes", &self.assume_yes)
            .finish_non_exhaustive()
    }
}

/// Prompter bound to the process's standard input and output.
pub type StdioPrompter = LinePrompter<BufReader<io::Stdin>, io::Stdout>;

impl StdioPrompter {
    /// Create a prompter on stdin/stdout.
    #[must_use]
    pub fn stdio(assume_yes: bool) -> Self {
        LinePrompter::new(BufReader::new(io::stdin()), io::stdout()).assume_yes(assume_yes)
    }
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    /// Create a prompter reading answers from `reader` and writing questions
    /// to `writer`.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            io: Mutex::new((reader, writer)),
            assume_yes: false,
        }
    }

    /// Answer every confirmation with "yes" without reading input.
    #[must_use]
    pub fn assume_yes(mut self, assume_yes: bool) -> Self {
        self.assume_yes = assume_yes;
        self
    }

    /// Write `prompt` and read one line.  Returns `None` at end of input.
    fn ask(&self, prompt: &str) -> Result<Option<String>> {
        let mut guard = self
            .io
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let (reader, writer) = &mut *guard;
        write!(writer, "{prompt}").context("writing prompt")?;
        writer.flush().context("flushing prompt")?;
        let mut line = String::new();
        let read = reader.read_line(&mut line).context("reading answer")?;
        if read == 0 {
            writeln!(writer).ok();
            return Ok(None);
        }
        Ok(Some(line))
    }

    fn say(&self, text: &str) -> Result<()> {
        let mut guard = self
            .io
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        writeln!(guard.1, "{text}").context("writing prompt")
    }
}

impl<R, W> Prompter for LinePrompter<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn confirm(&self, question: &str) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        for attempt in 1..=MAX_CONFIRM_ATTEMPTS {
            let Some(line) = self.ask(&format!("{question} [y/N] "))? else {
                // End of input: treat as a decline rather than spinning.
                return Ok(false);
            };
            if let Some(answer) = parse_answer(&line) {
                return Ok(answer);
            }
            if attempt < MAX_CONFIRM_ATTEMPTS {
                self.say("please answer y or n")?;
            }
        }
        Err(ProvisionError::InvalidConfirmation {
            question: question.to_string(),
            attempts: MAX_CONFIRM_ATTEMPTS,
        }
        .into())
    }

    fn choose_distro(&self, detected: Option<Distro>) -> Result<Distro> {
        self.say("\nSelect your distribution:")?;
        for (i, distro) in Distro::ALL.iter().enumerate() {
            let hint = if Some(*distro) == detected {
                " (detected)"
            } else {
                ""
            };
            self.say(&format!("  \x1b[1m{}\x1b[0m) {}{hint}", i + 1, distro.label()))?;
        }
        let line = self
            .ask(&format!("\nSelect [1-{}]: ", Distro::ALL.len()))?
            .unwrap_or_default();
        Ok(Distro::from_menu_choice(&line)?)
    }
}
