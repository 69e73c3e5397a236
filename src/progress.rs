//! Progress bar display for deployments

use indicatif::{ProgressBar, ProgressStyle};

/// Progress display for a pipeline run
pub struct ProgressDisplay {
    /// One tick per stack handed to the provisioner
    stack_pb: ProgressBar,
}

impl ProgressDisplay {
    /// Create a new progress display with total stack count
    pub fn new(total_stacks: u64) -> Self {
        let style = ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");

        let stack_pb = ProgressBar::new(total_stacks);
        stack_pb.set_style(style);

        Self { stack_pb }
    }

    /// Show the stack currently being provisioned
    pub fn update_stack(&self, stage: &str, stack: &str) {
        self.stack_pb.set_message(format!("{stage}: {stack}"));
    }

    pub fn inc_stack(&self) {
        self.stack_pb.inc(1);
    }

    pub fn finish(&self) {
        self.stack_pb.finish_and_clear();
    }

    /// Abandon on failure
    pub fn abandon(&self) {
        self.stack_pb.abandon();
    }
}
