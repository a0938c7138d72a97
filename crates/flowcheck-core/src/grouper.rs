//! Retry grouping.
//!
//! Maximal runs of consecutive retriable steps (checks and queries) are each
//! replaced by one `Retry` step that runs them in order under the retry loop.
//! Transitions pass through untouched, and order is preserved across the
//! whole list. A run of one is still wrapped.

use crate::retry::RetryPolicy;
use crate::step::Step;

/// Rewrite `steps` so that every run of retriable steps becomes a retry group.
///
/// Already-grouped `Retry` steps are not retriable themselves, so grouping a
/// grouped list returns it unchanged.
pub fn group_steps(steps: Vec<Step>, policy: &RetryPolicy) -> Vec<Step> {
    let mut grouped = Vec::with_capacity(steps.len());
    let mut run: Vec<Step> = Vec::new();

    for step in steps {
        if step.kind().is_retriable() {
            run.push(step);
        } else {
            flush_run(&mut run, &mut grouped, policy);
            grouped.push(step);
        }
    }
    flush_run(&mut run, &mut grouped, policy);

    grouped
}

fn flush_run(run: &mut Vec<Step>, grouped: &mut Vec<Step>, policy: &RetryPolicy) {
    if !run.is_empty() {
        grouped.push(Step::retry_group(std::mem::take(run), *policy));
    }
}
