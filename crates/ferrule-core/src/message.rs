//! Structured log records emitted by `msg` and failed `assert` statements.

use std::fmt;

/// Severity of an emitted [`Message`]. Parsed case-insensitively from script
/// text; an unrecognized level silently falls back to `Info`
/// (`spec.md` §9, Open Questions: "current behavior is silent Info").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Warn,
    Error,
}

impl MessageLevel {
    /// Parse a level keyword case-insensitively. Unknown text maps to `Info`.
    pub fn parse(text: &str) -> MessageLevel {
        match text.to_ascii_lowercase().as_str() {
            "warn" | "warning" => MessageLevel::Warn,
            "error" => MessageLevel::Error,
            _ => MessageLevel::Info,
        }
    }
}

impl fmt::Display for MessageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageLevel::Info => "info",
            MessageLevel::Warn => "warn",
            MessageLevel::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// One message produced during execution, in program order.
#[derive(Debug, Clone)]
pub struct Message {
    pub level: MessageLevel,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_level_is_info() {
        assert_eq!(MessageLevel::parse("critical"), MessageLevel::Info);
    }

    #[test]
    fn level_parse_is_case_insensitive() {
        assert_eq!(MessageLevel::parse("WARN"), MessageLevel::Warn);
        assert_eq!(MessageLevel::parse("Error"), MessageLevel::Error);
    }
}
