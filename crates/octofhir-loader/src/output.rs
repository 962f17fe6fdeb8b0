use std::path::Path;

use colored::Colorize;

use crate::loader::{LoadOutcome, LoadSummary};

/// How much of a rejected response body is echoed back.
const BODY_PREVIEW_CHARS: usize = 100;

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_no_files(dir: &Path) {
    println!("No JSON files found in {}", dir.display());
}

pub fn print_found(total: usize) {
    println!("Found {total} files to load.");
}

/// First `max` characters of `body`, cut on a char boundary.
pub fn truncate_body(body: &str, max: usize) -> &str {
    match body.char_indices().nth(max) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

/// Progress line for one file. `index` is 1-based.
pub fn format_outcome(index: usize, total: usize, name: &str, outcome: &LoadOutcome) -> String {
    match outcome {
        LoadOutcome::Loaded { .. } => format!("[{index}/{total}] Successfully loaded {name}"),
        LoadOutcome::Skipped => format!("Skipping {name}: No resourceType found."),
        LoadOutcome::Rejected { status, body } => format!(
            "[{index}/{total}] Failed to load {name}: {} - {}",
            status.as_u16(),
            truncate_body(body, BODY_PREVIEW_CHARS)
        ),
        LoadOutcome::Failed(e) => format!("[{index}/{total}] Error processing {name}: {e}"),
    }
}

pub fn print_outcome(index: usize, total: usize, name: &str, outcome: &LoadOutcome) {
    let line = format_outcome(index, total, name, outcome);
    match outcome {
        LoadOutcome::Loaded { .. } => println!("{}", line.green()),
        LoadOutcome::Skipped => println!("{}", line.yellow()),
        LoadOutcome::Rejected { .. } | LoadOutcome::Failed(_) => println!("{}", line.red()),
    }
}

pub fn format_summary(summary: &LoadSummary) -> Vec<String> {
    vec![
        "-".repeat(30),
        "Finished loading data.".to_string(),
        format!("Success: {}", summary.success),
        format!("Errors: {}", summary.errors),
    ]
}

pub fn print_summary(summary: &LoadSummary) {
    for line in format_summary(summary) {
        println!("{line}");
    }
}
