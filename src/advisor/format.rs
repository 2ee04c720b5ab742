//! Splits advisory text into display lines.

use serde::Serialize;

/// One display line of an advisory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AdvisoryLine {
    /// A line fully wrapped in `**`.
    Heading { text: String },
    /// `N. label: body`. `body` is `None` when the item has no `:`.
    Numbered {
        number: u32,
        label: String,
        body: Option<String>,
        bold: bool,
    },
    /// `* item`.
    Bullet { text: String },
    /// Anything else, including blank lines.
    Text { text: String },
}

fn strip_bold(s: &str) -> String {
    s.replace("**", "")
}

/// Parses `"12. rest"` into `(12, "rest")`.
fn numbered_prefix(line: &str) -> Option<(u32, &str)> {
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let rest = line[digits..].strip_prefix('.')?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let number = line[..digits].parse().ok()?;
    Some((number, rest.trim_start()))
}

/// Classifies a single (untrimmed) line.
pub fn parse_line(raw: &str) -> AdvisoryLine {
    let line = raw.trim();

    if line.starts_with("**") && line.ends_with("**") {
        return AdvisoryLine::Heading {
            text: strip_bold(line).trim().to_string(),
        };
    }

    if let Some((number, content)) = numbered_prefix(line) {
        let bold = content.starts_with("**");
        let clean = strip_bold(content);
        let (label, body) = match clean.split_once(':') {
            Some((label, body)) => (label.trim().to_string(), Some(body.trim().to_string())),
            None => (clean.trim().to_string(), None),
        };
        return AdvisoryLine::Numbered {
            number,
            label,
            body,
            bold,
        };
    }

    if let Some(item) = line.strip_prefix("* ") {
        return AdvisoryLine::Bullet {
            text: strip_bold(item).trim().to_string(),
        };
    }

    AdvisoryLine::Text {
        text: strip_bold(line),
    }
}

/// Splits advisory text into display lines, one per input line.
///
/// ```
/// use panel_sim::advisor::format::{AdvisoryLine, format_advisory};
///
/// let lines = format_advisory("**System Status**\n* All nominal");
/// assert_eq!(lines[0], AdvisoryLine::Heading { text: "System Status".into() });
/// assert_eq!(lines[1], AdvisoryLine::Bullet { text: "All nominal".into() });
/// ```
pub fn format_advisory(text: &str) -> Vec<AdvisoryLine> {
    if text.is_empty() {
        return Vec::new();
    }
    text.lines().map(parse_line).collect()
}
