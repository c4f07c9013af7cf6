//! Output formatting.

use crate::build::EmittedAsset;
use camino::{Utf8Path, Utf8PathBuf};
use tsc_runner::{Diagnostic, DiagnosticSeverity};

/// Renders checker diagnostics, one block per diagnostic.
///
/// ```text
/// src/a.ts:2:7
/// Error: Type 'string' is not assignable to type 'number'. (TS2322)
/// ```
pub fn format_report(diagnostics: &[Diagnostic], root: &Utf8Path) -> String {
    let blocks: Vec<String> = diagnostics
        .iter()
        .map(|diag| {
            let severity = match diag.severity {
                DiagnosticSeverity::Error => "Error",
                DiagnosticSeverity::Warning => "Warning",
                DiagnosticSeverity::Message => "Message",
            };
            match &diag.file {
                Some(file) => format!(
                    "{}:{}:{}\n{}: {} ({})\n",
                    relative(file, root),
                    diag.line,
                    diag.column,
                    severity,
                    diag.message,
                    diag.code
                ),
                None => format!("{}: {} ({})\n", severity, diag.message, diag.code),
            }
        })
        .collect();
    blocks.join("\n")
}

/// One line per written asset, then a total.
pub fn format_summary(written: &[Utf8PathBuf], assets: &[EmittedAsset], root: &Utf8Path) -> String {
    let mut output = String::new();
    for (path, asset) in written.iter().zip(assets) {
        output.push_str(&format!(
            "{} ({}, {} bytes)\n",
            relative(path, root),
            asset.name,
            asset.source.len()
        ));
    }
    let noun = if written.len() == 1 { "file" } else { "files" };
    output.push_str(&format!("wrote {} declaration {noun}", written.len()));
    output
}

fn relative<'a>(path: &'a Utf8Path, root: &Utf8Path) -> &'a Utf8Path {
    path.strip_prefix(root).unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_report() {
        let mut warning = Diagnostic::error("/p/src/b.ts", (1, 1), "TS6133", "'x' is declared but never used.");
        warning.severity = DiagnosticSeverity::Warning;
        let diagnostics = vec![
            Diagnostic::error("/p/src/a.ts", (3, 14), "TS2304", "Cannot find name 'Foo'."),
            warning,
            Diagnostic {
                file: None,
                line: 0,
                column: 0,
                code: "TS5083".into(),
                message: "Cannot read file 'tsconfig.base.json'.".into(),
                severity: DiagnosticSeverity::Error,
            },
        ];

        insta::assert_snapshot!(format_report(&diagnostics, Utf8Path::new("/p")), @r"
        src/a.ts:3:14
        Error: Cannot find name 'Foo'. (TS2304)

        src/b.ts:1:1
        Warning: 'x' is declared but never used. (TS6133)

        Error: Cannot read file 'tsconfig.base.json'. (TS5083)
        ");
    }

    #[test]
    fn test_format_summary() {
        let assets = vec![EmittedAsset {
            name: "index".into(),
            file_name: "mylib.d.ts".into(),
            source: "export {};\n".into(),
        }];
        let written = vec![Utf8PathBuf::from("/p/dist/mylib.d.ts")];
        assert_eq!(
            format_summary(&written, &assets, Utf8Path::new("/p")),
            "dist/mylib.d.ts (index, 11 bytes)\nwrote 1 declaration file"
        );
    }
}
