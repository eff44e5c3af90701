use console::style;
use objmap_core::{Diagnostic, Severity};
use std::path::Path;

/// Prints every diagnostic to stderr, followed by a summary line.
pub(crate) fn diagnostics(input: &Path, diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("{}", render(input, diagnostic));
    }

    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    let warnings = diagnostics
        .iter()
        .filter(|d| d.severity() == Severity::Warning)
        .count();

    if errors > 0 {
        eprintln!(
            "{}",
            style(format!("{errors} error(s), {warnings} warning(s)")).red().bold()
        );
    } else if warnings > 0 {
        eprintln!("{}", style(format!("{warnings} warning(s)")).yellow().bold());
    }
}

/// One diagnostic with a `-->` line per request site.
pub(crate) fn render(input: &Path, diagnostic: &Diagnostic) -> String {
    let header = format!("{}[{}]", diagnostic.severity(), diagnostic.code.id());
    let header = match diagnostic.severity() {
        Severity::Error => style(header).red().bold(),
        Severity::Warning => style(header).yellow().bold(),
        Severity::Info => style(header).cyan(),
    };

    let mut out = format!("{}: {}", header, diagnostic.message());
    for site in &diagnostic.sites {
        let location = match &site.file {
            Some(_) => site.to_string(),
            None => format!("{}:{}", input.display(), site),
        };
        out.push_str(&format!("\n  {} {}", style("-->").blue().bold(), location));
    }
    out
}

/// Formats parse errors as `path:line:column: message`.
pub(crate) fn syntax_error(input: &Path, err: syn::Error) -> anyhow::Error {
    let messages: Vec<String> = err
        .into_iter()
        .map(|err| {
            let start = err.span().start();
            format!("{}:{}:{}: {}", input.display(), start.line, start.column + 1, err)
        })
        .collect();
    anyhow::anyhow!(messages.join("\n"))
}
