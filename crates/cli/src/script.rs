//! Cursor scripts: a compact list of steps and jumps.
//!
//! A script is a sequence of commands separated by whitespace or commas.
//! `n` steps forward, `p` steps backward, `^` jumps to the start and `$`
//! jumps to the end. A step may carry a repeat count, as in `n3`.

use std::fmt;

use preiter::{Direction, Term};

/// One scripted cursor operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Step once.
    Get(Direction),
    /// Move to a terminal.
    Jump(Term),
}

/// A parsed script.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Script {
    commands: Vec<Command>,
}

/// Malformed script text.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid script command '{token}': {reason}")]
pub struct ScriptError {
    token: String,
    reason: &'static str,
}

impl ScriptError {
    fn new(token: &str, reason: &'static str) -> Self {
        Self {
            token: token.to_owned(),
            reason,
        }
    }
}

impl Script {
    /// Parses `text`.
    pub fn parse(text: &str) -> Result<Self, ScriptError> {
        let mut commands = Vec::new();
        for token in text
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|token| !token.is_empty())
        {
            let mut chars = token.chars();
            let head = chars.next().unwrap_or_default();
            let rest = chars.as_str();
            let command = match head {
                'n' => Command::Get(Direction::Forward),
                'p' => Command::Get(Direction::Backward),
                '^' | '$' if !rest.is_empty() => {
                    return Err(ScriptError::new(token, "jumps take no count"));
                }
                '^' => Command::Jump(Term::StartOfData),
                '$' => Command::Jump(Term::EndOfData),
                _ => return Err(ScriptError::new(token, "expected n, p, ^ or $")),
            };
            let count = if rest.is_empty() {
                1
            } else {
                rest.parse::<usize>()
                    .map_err(|_| ScriptError::new(token, "count must be a number"))?
            };
            commands.extend(std::iter::repeat_n(command, count));
        }
        Ok(Self { commands })
    }

    /// The commands in order.
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get(Direction::Forward) => "n",
            Self::Get(Direction::Backward) => "p",
            Self::Jump(Term::StartOfData) => "^",
            Self::Jump(Term::EndOfData) => "$",
        })
    }
}
