//! Rotation Core - daily spreadsheet rotation
//!
//! Rotates a spreadsheet used as a temporary data store:
//! - Clears the data range of the active document
//! - Duplicates it under tomorrow's dated name
//! - Re-points the remote state service at the copy
//! - Replicates access permissions and deletes the original
//! - Purges the remote service's transient records
//!
//! Collaborators are reached through capability traits ([`StorageBackend`],
//! [`RemoteState`], [`Notifier`], [`Clock`]) so the workflow and scheduler can
//! be driven by fakes.
//!
//! # Example
//!
//! ```rust,ignore
//! use rotation_core::prelude::*;
//!
//! # async fn example(backend: impl StorageBackend + 'static, remote: Arc<dyn RemoteState>,
//! #     notifier: Arc<dyn Notifier>) -> Result<(), Box<dyn std::error::Error>> {
//! let clock: Arc<dyn Clock> = Arc::new(SystemClock);
//! let report = ReportCell { cell: resolve_cell("E3", 0)?, label: "Upper Caf.".into() };
//! let provider = Arc::new(SpreadsheetProvider::new(backend, clock.clone(), report));
//! let workflow = RotationWorkflow::new(provider, remote, resolve_range("G3:V")?);
//!
//! let schedule = DailySchedule::new(ScheduledInstant::new(4 * 3600).unwrap());
//! let mut runner = Runner::new(workflow, notifier, clock, schedule);
//! runner.run(RunMode::Daily).await;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod address;
pub mod clock;
pub mod error;
pub mod notify;
pub mod provider;
pub mod remote;
pub mod runner;
pub mod scheduler;
pub mod types;
pub mod workflow;

// Re-exports for convenience
pub use address::{column_index, column_letters, resolve_cell, resolve_range, OPEN_END_ROW};
pub use clock::{Clock, SystemClock};
pub use error::{
    AddressError, PermissionFailure, ProviderError, RemoteError, RotationError, StepError,
};
pub use notify::{FailureReport, Notifier, WebhookMessage};
pub use provider::{CellBlock, ReportCell, SpreadsheetOps, SpreadsheetProvider, StorageBackend};
pub use remote::RemoteState;
pub use runner::{RunMode, Runner};
pub use scheduler::DailySchedule;
pub use types::{
    CellRange, CellRef, FileMetadata, GridSize, PermissionEntry, RotationOutcome, RotationStep,
    ScheduledInstant, SheetProperties, SpreadsheetHandle,
};
pub use workflow::RotationWorkflow;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for wiring a rotation
    pub use crate::{
        resolve_cell, resolve_range, Clock, DailySchedule, Notifier, RemoteState, ReportCell,
        RotationWorkflow, RunMode, Runner, ScheduledInstant, SpreadsheetOps, SpreadsheetProvider,
        StorageBackend, SystemClock,
    };
    pub use std::sync::Arc;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
