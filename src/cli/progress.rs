//! Step progress lines.

use crate::cli::output;
use crate::core::cleanup::{BucketStatus, CleanupReport};
use crate::core::sequencer::{Observer, Outcome, Step};

/// Prints `step... outcome` for each step of a run.
#[derive(Debug, Default)]
pub struct StepProgress;

impl Observer for StepProgress {
    fn started(&self, step: Step) {
        output::progress(step.name());
    }

    fn finished(&self, _step: Step, outcome: Outcome) {
        output::progress_done(true, &outcome.to_string());
    }

    fn failed(&self, _step: Step) {
        output::progress_done(false, "failed");
    }

    fn cleanup(&self, report: &CleanupReport) {
        // The cleanup line is still open; break it for the table and
        // reopen it for the outcome.
        println!();
        print_cleanup(report);
        output::progress(Step::Cleanup.name());
    }
}

/// One line per bucket.
pub fn print_cleanup(report: &CleanupReport) {
    if report.buckets.is_empty() {
        output::dimmed("  no managed buckets found");
        return;
    }
    for bucket in &report.buckets {
        let counts = format!(
            "{}, {}, {}",
            output::plural(bucket.objects, "object"),
            output::plural(bucket.versions, "version"),
            output::plural(bucket.delete_markers, "delete marker"),
        );
        match &bucket.status {
            BucketStatus::Emptied => output::success(&format!("{} emptied ({})", bucket.name, counts)),
            BucketStatus::WouldEmpty => {
                output::list_item(&format!("{} would be emptied ({})", bucket.name, counts))
            }
            BucketStatus::Absent => output::dimmed(&format!("  {} already absent", bucket.name)),
            BucketStatus::Rejected { reason } => {
                output::warn(&format!("{} skipped: {}", bucket.name, reason))
            }
            BucketStatus::Failed => {
                output::error(&format!("{} not fully emptied ({})", bucket.name, counts));
                for err in &bucket.errors {
                    output::dimmed(&format!("    {}", err));
                }
            }
        }
    }
}
