//! Commands sent to an instrument.
//!
//! A [`Command`] is an opaque line of text along with two pieces of metadata
//! the channel needs in order to handle it correctly: what kind of response
//! (if any) it elicits and whether a completion barrier must follow it.
//!
//! ```
//! use scpisync::command::{Arity, Command};
//!
//! let reset = Command::write("*RST").synchronized();
//! assert!(reset.synchronize());
//!
//! let freq = Command::set("AFG:FREQUENCY", 1e6).synchronized();
//! assert_eq!(freq.text(), "AFG:FREQUENCY 1000000");
//!
//! let idn = Command::query("*IDN?");
//! assert_eq!(idn.arity(), Arity::SingleLine);
//! ```

use std::fmt::Display;

/// The kind of response a command elicits.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Arity {
    /// The command is not answered.
    #[default]
    None,
    /// The command is answered with a single line of text.
    SingleLine,
    /// The command is answered with an IEEE 488.2 block of raw bytes.
    RawBlock,
}

/// A single outbound instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Command {
    text: String,
    arity: Arity,
    synchronize: bool,
}

impl Command {
    /// Create a command that is not answered.
    pub fn write<S: Into<String>>(text: S) -> Self {
        Command {
            text: text.into(),
            arity: Arity::None,
            synchronize: false,
        }
    }

    /// Create a command that is answered with a single line.
    pub fn query<S: Into<String>>(text: S) -> Self {
        Command {
            text: text.into(),
            arity: Arity::SingleLine,
            synchronize: false,
        }
    }

    /// Create a command that is answered with a block of raw bytes.
    pub fn block_query<S: Into<String>>(text: S) -> Self {
        Command {
            text: text.into(),
            arity: Arity::RawBlock,
            synchronize: false,
        }
    }

    /// Create a `<HEADER> <VALUE>` command that is not answered.
    pub fn set<H: Display, V: Display>(header: H, value: V) -> Self {
        Command::write(format!("{header} {value}"))
    }

    /// Require a completion barrier after this command.
    #[must_use]
    pub fn synchronized(mut self) -> Self {
        self.synchronize = true;
        self
    }

    /// The text of the command, without a line terminator.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The kind of response the command elicits.
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Whether a completion barrier must follow this command.
    pub fn synchronize(&self) -> bool {
        self.synchronize
    }
}

impl AsRef<str> for Command {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for Command {
    fn from(text: &str) -> Self {
        Command::write(text)
    }
}

impl From<String> for Command {
    fn from(text: String) -> Self {
        Command::write(text)
    }
}

/// Return the first line terminator in `text`, if any.
pub(crate) fn find_line_terminator(text: &str) -> Option<char> {
    text.chars().find(|c| matches!(c, '\r' | '\n'))
}
