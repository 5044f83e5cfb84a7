//! Console output helpers for the run banner, per-job status lines and the
//! final summary. Everything user-facing goes through these so the styling
//! stays in one place; diagnostics go through the `log` facade instead.

use console::style;

/// Prints a section header.
pub fn print_section(title: &str) {
    println!();
    println!("===== {} =====", style(title).cyan().bold());
}

/// Prints an aligned label/value status line.
pub fn print_status(label: &str, value: &str) {
    let label_width: usize = 15;
    let padding = label_width.saturating_sub(label.len()).max(1);
    println!("  {}:{} {}", label, " ".repeat(padding), value);
}

/// Prints a processing step for one input file.
pub fn print_processing(message: &str) {
    println!();
    println!("  {} {}", style("»").bold(), style(message).bold());
}

/// Prints a success line for one finished job.
pub fn print_success(message: &str) {
    println!("  {} {}", style("✓").green().bold(), message);
}

/// Prints a failure line for one finished job.
pub fn print_failure(message: &str) {
    println!("  {} {}", style("✗").red().bold(), message);
}
