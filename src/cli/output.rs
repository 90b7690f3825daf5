//! Terminal output helpers.
//!
//! Everything the CLI prints goes through here so styling stays
//! consistent. Color is dropped when `NO_COLOR` is set:
//!
//! - green: success marks, commands
//! - red: failures
//! - yellow: warnings
//! - cyan: paths, hints
//! - dim: labels and secondary detail

use console::{style, StyledObject};
use std::fmt::Display;
use std::io::{self, Write as IoWrite};

const RULE_WIDTH: usize = 56;

fn colors_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

/// Apply `styling` unless color is off.
fn paint<D: Display>(value: D, styling: impl FnOnce(StyledObject<D>) -> StyledObject<D>) -> String {
    if colors_enabled() {
        styling(style(value)).to_string()
    } else {
        value.to_string()
    }
}

/// `✓ aws-chatbot-dev destroyed`
pub fn success(msg: &str) {
    println!("{} {}", paint("✓", |s| s.green()), msg);
}

/// Error line, on stderr.
pub fn error(msg: &str) {
    eprintln!("{} {}", paint("✗", |s| s.red()), msg);
}

pub fn warn(msg: &str) {
    println!("{} {}", paint("⚠", |s| s.yellow()), msg);
}

/// Follow-up suggestion, on stderr next to the error it belongs to.
///
/// `→ run: rigger deploy-infra -e dev`
pub fn hint(msg: &str) {
    eprintln!("{} {}", paint("→", |s| s.cyan()), paint(msg, |s| s.cyan()));
}

/// Aligned `label  value` row.
pub fn kv(label: &str, value: impl Display) {
    println!(
        "  {}  {}",
        paint(format!("{:<12}", label), |s| s.dim()),
        paint(value, |s| s.bold())
    );
}

pub fn list_item(item: &str) {
    println!("  • {}", item);
}

/// Inline path.
pub fn path(p: impl Display) -> String {
    paint(p, |s| s.cyan())
}

/// Inline command.
pub fn cmd(c: &str) -> String {
    paint(c, |s| s.green())
}

/// Open a `step... ` line; [`progress_done`] closes it.
pub fn progress(label: &str) {
    print!("{}... ", paint(label, |s| s.dim()));
    let _ = io::stdout().flush();
}

pub fn progress_done(ok: bool, status: &str) {
    if ok {
        println!("{}", paint(status, |s| s.green()));
    } else {
        println!("{}", paint(status, |s| s.red()));
    }
}

pub fn dimmed(msg: &str) {
    println!("{}", paint(msg, |s| s.dim()));
}

/// Bold title over a rule, preceded by a blank line.
///
/// ```text
/// Deploy aws-chatbot-dev
/// ────────────────────────────────────────────────────────
/// ```
pub fn section(title: &str) {
    println!();
    println!("{}", paint(title, |s| s.bold()));
    println!("{}", paint("─".repeat(RULE_WIDTH), |s| s.dim()));
}

/// `1 bucket`, `3 buckets`
pub fn plural(n: usize, word: &str) -> String {
    format!("{} {}{}", n, word, if n == 1 { "" } else { "s" })
}
