//! Checker diagnostics and the parser for compiler output.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A diagnostic from the checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The file, for diagnostics tied to one.
    pub file: Option<Utf8PathBuf>,
    /// 1-indexed line; 0 without a file.
    pub line: u32,
    /// 1-indexed column; 0 without a file.
    pub column: u32,
    /// e.g. `TS2322`.
    pub code: String,
    pub message: String,
    pub severity: DiagnosticSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Message,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
            DiagnosticSeverity::Message => "message",
        })
    }
}

impl Diagnostic {
    pub fn error(
        file: impl Into<Utf8PathBuf>,
        (line, column): (u32, u32),
        code: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file: Some(file.into()),
            line,
            column,
            code: code.to_string(),
            message: message.into(),
            severity: DiagnosticSeverity::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{file}({},{}): ", self.line, self.column)?;
        }
        write!(f, "{} {}: {}", self.severity, self.code, self.message)
    }
}

/// Parses compiler output into diagnostics.
///
/// Both `file(line,col): error TS1234: msg` (tsc) and
/// `file:line:col - error TS1234: msg` (pretty-less tsgo) are understood,
/// as are file-less `error TS5083: msg` lines. Indented lines continue the
/// previous message.
pub fn parse_output(output: &str) -> Vec<Diagnostic> {
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some(last) = diagnostics.last_mut() {
                last.message.push('\n');
                last.message.push_str(line.trim_end());
            }
            continue;
        }
        if let Some(diagnostic) = parse_line(line) {
            diagnostics.push(diagnostic);
        }
    }
    diagnostics
}

fn parse_line(line: &str) -> Option<Diagnostic> {
    if let Some(diagnostic) = parse_body(line) {
        return Some(diagnostic);
    }
    let (location, body) = split_location(line)?;
    let (file, line, column) = location;
    let mut diagnostic = parse_body(body)?;
    diagnostic.file = Some(Utf8PathBuf::from(file));
    diagnostic.line = line;
    diagnostic.column = column;
    Some(diagnostic)
}

/// Splits `file(l,c): rest` or `file:l:c - rest`.
fn split_location(line: &str) -> Option<((&str, u32, u32), &str)> {
    if let Some(idx) = line.find("): ") {
        let head = &line[..idx];
        if let Some(open) = head.rfind('(') {
            let (l, c) = head[open + 1..].split_once(',')?;
            if let (Ok(l), Ok(c)) = (l.parse(), c.parse()) {
                return Some(((&head[..open], l, c), &line[idx + 3..]));
            }
        }
    }

    let (location, body) = line.split_once(" - ")?;
    let mut parts = location.rsplitn(3, ':');
    let column = parts.next()?.parse().ok()?;
    let line_num = parts.next()?.parse().ok()?;
    let file = parts.next()?;
    Some(((file, line_num, column), body))
}

/// Parses `error TS1234: message`.
fn parse_body(body: &str) -> Option<Diagnostic> {
    let (severity, rest) = [
        ("error", DiagnosticSeverity::Error),
        ("warning", DiagnosticSeverity::Warning),
        ("message", DiagnosticSeverity::Message),
    ]
    .into_iter()
    .find_map(|(prefix, severity)| {
        body.strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix(' '))
            .map(|rest| (severity, rest))
    })?;
    let (code, message) = rest.split_once(": ")?;
    if !code.starts_with("TS") || !code[2..].bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(Diagnostic {
        file: None,
        line: 0,
        column: 0,
        code: code.to_string(),
        message: message.trim_end().to_string(),
        severity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tsc_format() {
        let diagnostics = parse_output(
            "src/a.ts(10,5): error TS2322: Type 'string' is not assignable to type 'number'.\n",
        );
        assert_eq!(
            diagnostics,
            vec![Diagnostic::error(
                "src/a.ts",
                (10, 5),
                "TS2322",
                "Type 'string' is not assignable to type 'number'."
            )]
        );
    }

    #[test]
    fn test_tsgo_format() {
        let diagnostics =
            parse_output("src/App.vue.ts:3:7 - error TS2304: Cannot find name 'foo'.");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].file.as_ref().map(|f| f.as_str()),
            Some("src/App.vue.ts")
        );
        assert_eq!((diagnostics[0].line, diagnostics[0].column), (3, 7));
        assert_eq!(diagnostics[0].code, "TS2304");
    }

    #[test]
    fn test_global_and_continuation_lines() {
        let output = "error TS5083: Cannot read file '/p/tsconfig.json'.\n\
                      src/a.ts(1,1): error TS2345: Argument is wrong.\n  \
                      Type 'A' is missing property 'b'.\n\
                      Found 2 errors.\n";
        let diagnostics = parse_output(output);
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].file, None);
        assert_eq!(
            diagnostics[0].to_string(),
            "error TS5083: Cannot read file '/p/tsconfig.json'."
        );
        assert_eq!(
            diagnostics[1].message,
            "Argument is wrong.\n  Type 'A' is missing property 'b'."
        );
    }

    #[test]
    fn test_windows_paths() {
        let diagnostics = parse_output("C:\\p\\a.ts(2,3): error TS1005: ';' expected.");
        assert_eq!(
            diagnostics[0].file.as_ref().map(|f| f.as_str()),
            Some("C:\\p\\a.ts")
        );
    }
}
