//! Imperative commands from the renderer.
//!
//! Commands arrive as a name plus a JSON argument list and are parsed into a
//! typed [`Command`] before dispatch.

use serde_json::Value;
use thiserror::Error;

/// A parsed imperative command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Scroll to an offset.
    ScrollTo {
        /// Target x.
        x: f32,
        /// Target y.
        y: f32,
        /// Animate the move.
        animated: bool,
    },
    /// Scroll to the end of content.
    ScrollToEnd {
        /// Animate the move.
        animated: bool,
    },
    /// Flash the scroll indicators.
    FlashScrollIndicators,
    /// Focus a text field.
    Focus,
    /// Blur a text field.
    Blur,
    /// Replace text and selection, unless the event count is stale.
    SetTextAndSelection {
        /// Most recent event count the renderer has seen.
        event_count: i64,
        /// New text, if any.
        text: Option<String>,
        /// Selection start.
        start: i64,
        /// Selection end.
        end: i64,
    },
    /// Force the native refreshing flag.
    SetNativeRefreshing(bool),
}

/// Why a command could not be parsed.
#[derive(PartialEq, Eq, Error, Debug, Clone)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    /// No command has this name.
    Unknown(String),
    #[error("{command}: bad argument {index}")]
    /// An argument is missing or has the wrong type.
    BadArgument {
        /// Command name.
        command: &'static str,
        /// Argument position.
        index: usize,
    },
}

/// Argument accessors that name the failing position.
struct Args<'a> {
    /// Command name.
    command: &'static str,
    /// Raw arguments.
    args: &'a [Value],
}

impl<'a> Args<'a> {
    /// The error for argument `index`.
    fn bad(&self, index: usize) -> CommandError {
        CommandError::BadArgument {
            command: self.command,
            index,
        }
    }

    /// A number.
    fn f32(&self, index: usize) -> Result<f32, CommandError> {
        self.args
            .get(index)
            .and_then(Value::as_f64)
            .map(|v| v as f32)
            .ok_or_else(|| self.bad(index))
    }

    /// An integer.
    fn i64(&self, index: usize) -> Result<i64, CommandError> {
        self.args
            .get(index)
            .and_then(Value::as_i64)
            .ok_or_else(|| self.bad(index))
    }

    /// A boolean.
    fn bool(&self, index: usize) -> Result<bool, CommandError> {
        self.args
            .get(index)
            .and_then(Value::as_bool)
            .ok_or_else(|| self.bad(index))
    }

    /// A boolean that defaults when absent.
    fn bool_or(&self, index: usize, default: bool) -> Result<bool, CommandError> {
        match self.args.get(index) {
            None | Some(Value::Null) => Ok(default),
            Some(_) => self.bool(index),
        }
    }

    /// An optional string.
    fn opt_string(&self, index: usize) -> Result<Option<String>, CommandError> {
        match self.args.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.bad(index)),
        }
    }
}

impl Command {
    /// Parse a command name and argument list.
    pub fn parse(name: &str, args: &[Value]) -> Result<Self, CommandError> {
        let a = |command| Args { command, args };
        Ok(match name {
            "scrollTo" => {
                let a = a("scrollTo");
                Self::ScrollTo {
                    x: a.f32(0)?,
                    y: a.f32(1)?,
                    animated: a.bool_or(2, true)?,
                }
            }
            "scrollToEnd" => Self::ScrollToEnd {
                animated: a("scrollToEnd").bool_or(0, true)?,
            },
            "flashScrollIndicators" => Self::FlashScrollIndicators,
            "focus" => Self::Focus,
            "blur" => Self::Blur,
            "setTextAndSelection" => {
                let a = a("setTextAndSelection");
                Self::SetTextAndSelection {
                    event_count: a.i64(0)?,
                    text: a.opt_string(1)?,
                    start: a.i64(2)?,
                    end: a.i64(3)?,
                }
            }
            "setNativeRefreshing" => Self::SetNativeRefreshing(a("setNativeRefreshing").bool(0)?),
            other => return Err(CommandError::Unknown(other.to_string())),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_known_commands() {
        assert_eq!(
            Command::parse("scrollTo", &[json!(0), json!(120.5), json!(false)]),
            Ok(Command::ScrollTo {
                x: 0.0,
                y: 120.5,
                animated: false
            })
        );
        assert_eq!(
            Command::parse("scrollToEnd", &[]),
            Ok(Command::ScrollToEnd { animated: true })
        );
        assert_eq!(
            Command::parse("setTextAndSelection", &[json!(3), json!(null), json!(1), json!(2)]),
            Ok(Command::SetTextAndSelection {
                event_count: 3,
                text: None,
                start: 1,
                end: 2
            })
        );
        assert_eq!(
            Command::parse("setNativeRefreshing", &[json!(true)]),
            Ok(Command::SetNativeRefreshing(true))
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            Command::parse("explode", &[]),
            Err(CommandError::Unknown("explode".into()))
        );
        assert_eq!(
            Command::parse("scrollTo", &[json!("left"), json!(1)]),
            Err(CommandError::BadArgument {
                command: "scrollTo",
                index: 0
            })
        );
        assert_eq!(
            Command::parse("setNativeRefreshing", &[]),
            Err(CommandError::BadArgument {
                command: "setNativeRefreshing",
                index: 0
            })
        );
    }
}
