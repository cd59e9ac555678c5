//! Run loop
//!
//! Drives the workflow either once or on the daily schedule. A failed run is
//! logged with its full cause chain and reported to the notifier; it never
//! stops the loop.

use std::sync::Arc;

use crate::clock::Clock;
use crate::error::RotationError;
use crate::notify::{FailureReport, Notifier};
use crate::scheduler::DailySchedule;
use crate::workflow::RotationWorkflow;

/// How the runner schedules rotations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// One rotation now, then return
    Once,
    /// A rotation at the scheduled instant every day, forever
    Daily,
}

/// Owns the workflow and everything needed to trigger and report it
pub struct Runner {
    workflow: RotationWorkflow,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    schedule: DailySchedule,
}

impl Runner {
    /// Create runner
    pub fn new(
        workflow: RotationWorkflow,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        schedule: DailySchedule,
    ) -> Self {
        Self {
            workflow,
            notifier,
            clock,
            schedule,
        }
    }

    /// Schedule state
    #[inline]
    #[must_use]
    pub fn schedule(&self) -> &DailySchedule {
        &self.schedule
    }

    /// Workflow
    #[inline]
    #[must_use]
    pub fn workflow(&self) -> &RotationWorkflow {
        &self.workflow
    }

    /// Run in `mode`. Only returns for [`RunMode::Once`], with whether the
    /// rotation succeeded.
    pub async fn run(&mut self, mode: RunMode) -> bool {
        match mode {
            RunMode::Once => self.run_once().await,
            RunMode::Daily => loop {
                self.run_scheduled().await;
            },
        }
    }

    /// Wait for the next scheduled instant, then rotate
    pub async fn run_scheduled(&mut self) -> bool {
        self.schedule.next_tick(self.clock.as_ref()).await;
        self.run_once().await
    }

    /// Rotate immediately; failures are logged and reported
    pub async fn run_once(&mut self) -> bool {
        tracing::info!(at = %self.clock.now(), "running rotation");
        match self.workflow.run().await {
            Ok(outcome) => {
                tracing::info!(
                    previous = %outcome.previous,
                    active = %outcome.active,
                    "rotation completed"
                );
                true
            }
            Err(error) => {
                self.report_failure(&error).await;
                false
            }
        }
    }

    async fn report_failure(&self, error: &RotationError) {
        let report = FailureReport::from_error(
            "Spreadsheet rotation failed",
            format!(
                "Step '{}' failed at {}. Active pointer moved to copy: {}.",
                error.step,
                self.clock.now().format("%Y-%m-%d %H:%M:%S UTC"),
                if error.pointer_committed() { "yes" } else { "no" },
            ),
            error,
        );
        tracing::error!(
            step = %error.step,
            error = %report.error_body,
            "rotation failed"
        );
        self.notifier.notify(&report).await;
    }
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("workflow", &self.workflow)
            .field("schedule", &self.schedule)
            .finish_non_exhaustive()
    }
}
