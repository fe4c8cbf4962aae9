use colored::Colorize;
use reconcile::{StatisticsSnapshot, UpdateAction};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// One line per planned resource
pub fn planned_create(key: &str) {
    println!("  {} {} {}", "+".green(), key, "(create)".dimmed());
}

pub fn planned_update(key: &str, actions: &[UpdateAction]) {
    println!(
        "  {} {} {}",
        "~".yellow(),
        key,
        format!("({} actions)", actions.len()).dimmed()
    );
    for action in actions {
        println!("      {}", action.summary().dimmed());
    }
}

pub fn planned_unchanged(key: &str) {
    println!("  {} {}", "=".dimmed(), key.dimmed());
}

/// Colored counts from a finished run
pub fn statistics(stats: &StatisticsSnapshot) {
    kv("processed", &stats.processed.to_string());
    kv("created", &stats.created.to_string().green().to_string());
    kv("updated", &stats.updated.to_string().yellow().to_string());
    kv("unchanged", &stats.unchanged.to_string());
    if stats.vetoed > 0 {
        kv("skipped by callback", &stats.vetoed.to_string());
    }
    let failed = if stats.failed > 0 {
        stats.failed.to_string().red().to_string()
    } else {
        stats.failed.to_string()
    };
    kv("failed", &failed);
}
