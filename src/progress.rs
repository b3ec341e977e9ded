//! Progress presentation for pipeline runs
//!
//! All progress reporting goes through the [`ProgressReporter`] trait: a bar on
//! interactive terminals, plain lines otherwise.

use console::{Style, Term};
use indicatif::{ProgressBar, ProgressStyle};

/// Progress reporter for runs over several repositories
pub trait ProgressReporter {
    /// A repository is about to be processed
    fn start_target(&mut self, repo: &str, current: usize, total: usize);

    /// The repository finished successfully
    fn finish_target(&mut self, repo: &str);

    /// Print an operator-facing line without corrupting the bar
    fn println(&self, line: &str);

    /// The whole run finished
    fn finish(&mut self);

    /// The run aborted
    fn abandon(&mut self);
}

/// Reporter with an indicatif progress bar
pub struct InteractiveProgressReporter {
    bar: ProgressBar,
}

impl InteractiveProgressReporter {
    pub fn new(total: u64) -> Self {
        let style = ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");

        let bar = ProgressBar::new(total);
        bar.set_style(style);
        Self { bar }
    }
}

impl ProgressReporter for InteractiveProgressReporter {
    fn start_target(&mut self, repo: &str, current: usize, total: usize) {
        self.bar
            .set_message(format!("({}/{}) {}", current, total, repo));
    }

    fn finish_target(&mut self, repo: &str) {
        self.bar
            .println(format!("{} {}", Style::new().green().apply_to("✓"), repo));
        self.bar.inc(1);
    }

    fn println(&self, line: &str) {
        self.bar.println(line);
    }

    fn finish(&mut self) {
        self.bar.finish_and_clear();
    }

    fn abandon(&mut self) {
        self.bar.abandon();
    }
}

/// Reporter printing plain lines, for pipes and CI logs
#[derive(Debug, Default)]
pub struct SilentProgressReporter;

impl ProgressReporter for SilentProgressReporter {
    fn start_target(&mut self, _repo: &str, _current: usize, _total: usize) {}

    fn finish_target(&mut self, repo: &str) {
        println!("Finished {}", repo);
    }

    fn println(&self, line: &str) {
        println!("{}", line);
    }

    fn finish(&mut self) {}

    fn abandon(&mut self) {}
}

/// Pick a reporter for `total` targets based on the terminal
pub fn reporter(total: usize) -> Box<dyn ProgressReporter> {
    if Term::stdout().is_term() {
        Box::new(InteractiveProgressReporter::new(total as u64))
    } else {
        Box::new(SilentProgressReporter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_progress_reporter_no_ops() {
        let mut reporter = SilentProgressReporter;
        reporter.start_target("console", 1, 2);
        reporter.finish_target("console");
        reporter.finish();
        reporter.abandon();
    }

    #[test]
    fn test_interactive_progress_reporter_counts_targets() {
        let mut reporter = InteractiveProgressReporter::new(3);
        reporter.start_target("console", 1, 3);
        reporter.finish_target("console");
        reporter.finish_target("bootstrap");
        assert_eq!(reporter.bar.position(), 2);
    }
}
