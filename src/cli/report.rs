//! Report formatting and printing utilities.
//!
//! Deferred sites are shown in cargo style (location, source line, caret);
//! run totals follow as one line per counter. Kept separate from the engine
//! so arbify can be used as a library.

use std::io::{self, Write};

use colored::Colorize;
use unicode_width::UnicodeWidthStr;

use super::commands::{CommandResult, CommandSummary, InitSummary, ScanSummary};
use crate::config::CONFIG_FILE_NAME;
use crate::core::{DeferredSite, RestoreSummary, Summary};

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Failure mark for consistent output formatting.
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

/// Print a command result to stdout, errors to stderr.
pub fn print(result: &CommandResult, verbose: bool) {
    print_to(result, verbose, &mut io::stdout().lock());
    print_errors_to(&result.errors, &mut io::stderr().lock());
}

/// Print a command result to a custom writer.
pub fn print_to<W: Write>(result: &CommandResult, verbose: bool, writer: &mut W) {
    match &result.summary {
        CommandSummary::Run(summary) => print_run(summary, verbose, writer),
        CommandSummary::Restore(summary) => print_restore(summary, writer),
        CommandSummary::Scan(summary) => print_scan(summary, writer),
        CommandSummary::Init(summary) => print_init(summary, writer),
    }
}

fn print_errors_to<W: Write>(errors: &[String], writer: &mut W) {
    for error in errors {
        let _ = writeln!(writer, "{}: {}", "error".bold().red(), error);
    }
}

fn plural(count: usize, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 { one } else { many }
}

// ============================================================
// Run
// ============================================================

fn print_run<W: Write>(summary: &Summary, verbose: bool, writer: &mut W) {
    let max_line_width = summary
        .files
        .iter()
        .flat_map(|f| f.deferred.iter())
        .map(|d| d.line)
        .max()
        .map(|n| n.to_string().len())
        .unwrap_or(1);

    for file in &summary.files {
        for site in &file.deferred {
            print_deferred(&file.path, site, writer, max_line_width);
        }
    }

    if verbose {
        for (suggestion, reason) in &summary.excluded {
            let _ = writeln!(
                writer,
                "{} {} \"{}\"  {}",
                "skipped:".dimmed(),
                suggestion.key,
                suggestion.value,
                reason.to_string().dimmed().cyan()
            );
        }
        for suggestion in &summary.unmatched {
            let _ = writeln!(
                writer,
                "{} {} \"{}\"  {}",
                "unmatched:".dimmed(),
                suggestion.key,
                suggestion.value,
                "no literal with this text".dimmed().cyan()
            );
        }
    }

    for file in summary.files.iter().filter(|f| f.rewritten > 0) {
        let mut parts = vec![format!(
            "{} {}",
            file.rewritten,
            plural(file.rewritten, "literal", "literals")
        )];
        if file.const_dropped > 0 {
            parts.push(format!("{} const dropped", file.const_dropped));
        }
        if file.import_added {
            parts.push("import added".to_string());
        }
        let _ = writeln!(writer, "  {} {}", file.path, parts.join(", ").dimmed());
    }

    let (verb, mark) = if summary.dry_run {
        ("Would rewrite".yellow().bold(), "-".yellow())
    } else {
        ("Rewrote".green().bold(), SUCCESS_MARK.green())
    };
    let _ = writeln!(
        writer,
        "{} {} {} {} in {} {} (scanned {})",
        mark,
        verb,
        summary.literals_rewritten,
        plural(summary.literals_rewritten, "literal", "literals"),
        summary.files_touched,
        plural(summary.files_touched, "file", "files"),
        summary.files_scanned
    );
    let _ = writeln!(
        writer,
        "  - suggestions: {} accepted, {} excluded{}",
        summary.suggestions_accepted,
        summary.excluded.len(),
        if summary.truncated > 0 {
            format!(", {} over the change limit", summary.truncated)
        } else {
            String::new()
        }
    );
    let _ = writeln!(
        writer,
        "  - catalog: {} {} added, {} {}",
        summary.keys_added,
        plural(summary.keys_added, "key", "keys"),
        summary.placeholders_added,
        plural(summary.placeholders_added, "placeholder", "placeholders")
    );

    let deferred = summary.deferred_count();
    if deferred > 0 {
        let _ = writeln!(
            writer,
            "  - {} {} deferred for manual follow-up",
            deferred.to_string().yellow(),
            plural(deferred, "site", "sites")
        );
    }
    if !summary.file_errors.is_empty() {
        let _ = writeln!(
            writer,
            "{} {} {} could not be processed",
            FAILURE_MARK.red(),
            summary.file_errors.len(),
            plural(summary.file_errors.len(), "file", "files")
        );
    }
    if let Some(backup) = &summary.backup {
        let _ = writeln!(
            writer,
            "Backup at {} (undo with {})",
            backup.display(),
            "--restore".cyan()
        );
    } else if summary.dry_run {
        let _ = writeln!(writer, "Run without {} to apply.", "--dry-run".cyan());
    }
}

fn print_deferred<W: Write>(path: &str, site: &DeferredSite, writer: &mut W, max_line_width: usize) {
    let _ = writeln!(
        writer,
        "{}: \"{}\"  {}",
        "deferred".bold().yellow(),
        site.value,
        site.kind.to_string().dimmed().cyan()
    );
    let _ = writeln!(
        writer,
        "  {} {}:{}:{}",
        "-->".blue(),
        path,
        site.line,
        site.column
    );

    let _ = writeln!(writer, "{:>width$} {}", "", "|".blue(), width = max_line_width);
    let _ = writeln!(
        writer,
        "{:>width$} {} {}",
        site.line.to_string().blue(),
        "|".blue(),
        site.source_line,
        width = max_line_width
    );

    // Caret pointing to the column (column is 1-based)
    let prefix: String = site.source_line.chars().take(site.column - 1).collect();
    let caret_padding = UnicodeWidthStr::width(prefix.as_str());
    let _ = writeln!(
        writer,
        "{:>width$} {} {:>padding$}{}",
        "",
        "|".blue(),
        "",
        "^".yellow(),
        width = max_line_width,
        padding = caret_padding
    );
    let _ = writeln!(
        writer,
        "{:>width$} {} {} key {}",
        "",
        "=".blue(),
        "note:".bold(),
        site.key,
        width = max_line_width
    );
    let _ = writeln!(writer);
}

// ============================================================
// Restore, scan, init
// ============================================================

fn print_restore<W: Write>(summary: &RestoreSummary, writer: &mut W) {
    for path in &summary.restored {
        let _ = writeln!(
            writer,
            "{} {}",
            SUCCESS_MARK.green(),
            format!("Restored {}", path.display()).green()
        );
    }
    let _ = writeln!(writer, "  from {}", summary.backup.display());
}

fn print_scan<W: Write>(summary: &ScanSummary, writer: &mut W) {
    for entry in &summary.entries {
        let literal = &entry.literal;
        let _ = writeln!(
            writer,
            "{}:{}:{}  {}  \"{}\"",
            entry.path,
            literal.line,
            literal.column,
            literal.context.kind.to_string().dimmed().cyan(),
            literal.value
        );
    }
    let count = summary.entries.len();
    let _ = writeln!(
        writer,
        "{} {} {} in {} {}",
        SUCCESS_MARK.green(),
        count,
        plural(count, "candidate", "candidates"),
        summary.files_scanned,
        plural(summary.files_scanned, "file", "files")
    );
}

fn print_init<W: Write>(summary: &InitSummary, writer: &mut W) {
    if summary.created {
        let _ = writeln!(
            writer,
            "{} {}",
            SUCCESS_MARK.green(),
            format!("Created {}", CONFIG_FILE_NAME).green()
        );
    } else if let Some(error) = &summary.error {
        let _ = writeln!(writer, "{} {}", FAILURE_MARK.red(), error);
    }
}

// ============================================================
// Tests
// ============================================================
