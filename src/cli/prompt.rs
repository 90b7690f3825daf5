//! Interactive confirmation.

use console::Term;
use dialoguer::Confirm as Prompt;

use crate::cli::output;
use crate::core::cleanup::Confirm;
use crate::error::Result;

/// Ask a yes/no question, defaulting to no.
///
/// With `assume_yes` the question is skipped. Without a terminal there is
/// nobody to ask, so the answer is no.
pub fn ask(question: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    if !Term::stderr().is_term() {
        output::warn("not a terminal; pass --yes to confirm");
        return Ok(false);
    }
    Prompt::new()
        .with_prompt(question)
        .default(false)
        .interact()
        .map_err(Into::into)
}

/// Lists bucket targets, then asks.
#[derive(Debug, Clone, Copy)]
pub struct TerminalConfirm {
    pub assume_yes: bool,
}

impl Confirm for TerminalConfirm {
    fn confirm(&self, targets: &[String]) -> Result<bool> {
        println!();
        println!("Every object, version and delete marker in these buckets will be deleted:");
        for name in targets {
            output::list_item(name);
        }
        println!();
        ask(
            &format!("Empty {}?", output::plural(targets.len(), "bucket")),
            self.assume_yes,
        )
    }
}
