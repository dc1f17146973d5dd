//! Session file format.
//!
//! One scanner read per line, replayed in order:
//!
//! ```text
//! # comment
//! 01040123456789011726123110L23A117
//! 240HP3300<GS>10LOT9
//! !manual L23B009 2
//! !undo
//! ```
//!
//! `<GS>` and the escape `\x1d` stand for the ASCII 29 group separator, which
//! text editors cannot type. Blank lines and `#` comments are ignored.

use std::fmt;

use scancount_recon::gs1::GROUP_SEPARATOR;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Scan(String),
    Undo,
    Manual { lot: String, count: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLine {
    /// 1-based line number in the file.
    pub line: usize,
    pub step: Step,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionParseError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for SessionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for SessionParseError {}

/// Replace the printable separator spellings with ASCII 29.
pub fn unescape_payload(raw: &str) -> String {
    let gs = GROUP_SEPARATOR.to_string();
    raw.replace("<GS>", &gs).replace("\\x1d", &gs).replace("\\x1D", &gs)
}

pub fn parse_session(text: &str) -> Result<Vec<SessionLine>, SessionParseError> {
    let mut steps = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let step = match trimmed.strip_prefix('!') {
            Some(directive) => parse_directive(directive, line)?,
            None => Step::Scan(unescape_payload(trimmed)),
        };
        steps.push(SessionLine { line, step });
    }

    Ok(steps)
}

fn parse_directive(directive: &str, line: usize) -> Result<Step, SessionParseError> {
    let err = |message: String| SessionParseError { line, message };
    let mut parts = directive.split_whitespace();

    match parts.next() {
        Some("undo") => match parts.next() {
            None => Ok(Step::Undo),
            Some(extra) => Err(err(format!("unexpected argument '{extra}' to !undo"))),
        },
        Some("manual") => {
            let (Some(lot), Some(count), None) = (parts.next(), parts.next(), parts.next()) else {
                return Err(err("usage: !manual <LOT> <count>".into()));
            };
            let count: i64 = count
                .parse()
                .map_err(|_| err(format!("'{count}' is not a whole number")))?;
            Ok(Step::Manual { lot: lot.to_string(), count })
        }
        Some(other) => Err(err(format!("unknown directive '!{other}'"))),
        None => Err(err("empty directive".into())),
    }
}
