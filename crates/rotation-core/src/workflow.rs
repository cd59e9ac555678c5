//! Rotation workflow
//!
//! One rotation, strictly in order:
//! 1. Clear the active document's data range
//! 2. Duplicate the active document
//! 3. Point remote state at the copy
//! 4. Copy permissions onto the copy
//! 5. Permanently delete the old document
//! 6. Re-read the active handle from remote state
//! 7. Purge transient remote records
//!
//! The active handle is read from remote state when the run starts. The
//! pointer is committed (step 3) before any cleanup, and nothing is rolled
//! back: the first failing step aborts the run with a [`RotationError`].

use std::sync::Arc;

use crate::error::RotationError;
use crate::provider::SpreadsheetOps;
use crate::remote::RemoteState;
use crate::types::{CellRange, RotationOutcome, RotationStep, SpreadsheetHandle};

/// Orchestrates one rotation across the spreadsheet provider and remote state
pub struct RotationWorkflow {
    spreadsheets: Arc<dyn SpreadsheetOps>,
    remote: Arc<dyn RemoteState>,
    clear_range: CellRange,
    /// Active handle as last confirmed by remote state
    current: Option<SpreadsheetHandle>,
}

impl RotationWorkflow {
    /// Create workflow
    pub fn new(
        spreadsheets: Arc<dyn SpreadsheetOps>,
        remote: Arc<dyn RemoteState>,
        clear_range: CellRange,
    ) -> Self {
        Self {
            spreadsheets,
            remote,
            clear_range,
            current: None,
        }
    }

    /// Active handle confirmed at the end of the last successful run
    #[inline]
    #[must_use]
    pub fn current(&self) -> Option<&SpreadsheetHandle> {
        self.current.as_ref()
    }

    /// Data range cleared on every run
    #[inline]
    #[must_use]
    pub fn clear_range(&self) -> &CellRange {
        &self.clear_range
    }

    /// Execute one full rotation
    ///
    /// # Errors
    /// The first failing step, tagged with its [`RotationStep`]. Steps after
    /// it are not attempted and earlier steps are not undone.
    pub async fn run(&mut self) -> Result<RotationOutcome, RotationError> {
        // Forget the previous run's handle; remote state is authoritative.
        self.current = None;

        let previous = self
            .remote
            .get_active_spreadsheet_id()
            .await
            .map_err(|e| RotationError::at(RotationStep::ReadActive, e))?;
        tracing::info!(spreadsheet = %previous, "starting rotation");

        self.spreadsheets
            .clear_range(&previous, &self.clear_range)
            .await
            .map_err(|e| RotationError::at(RotationStep::Clear, e))?;
        tracing::info!(spreadsheet = %previous, range = %self.clear_range, "cleared spreadsheet");

        let candidate = self
            .spreadsheets
            .duplicate(&previous)
            .await
            .map_err(|e| RotationError::at(RotationStep::Duplicate, e))?;
        tracing::info!(from = %previous, copy = %candidate, "created copy of spreadsheet");

        self.remote
            .set_active_spreadsheet_id(&candidate)
            .await
            .map_err(|e| RotationError::at(RotationStep::UpdatePointer, e))?;
        tracing::info!(spreadsheet = %candidate, "updated active spreadsheet id");

        self.spreadsheets
            .copy_permissions(&previous, &candidate)
            .await
            .map_err(|e| RotationError::at(RotationStep::CopyPermissions, e))?;
        tracing::info!(from = %previous, to = %candidate, "copied permissions to clone");

        self.spreadsheets
            .delete_permanently(&previous)
            .await
            .map_err(|e| RotationError::at(RotationStep::DeleteOld, e))?;
        tracing::info!(spreadsheet = %previous, "permanently deleted original spreadsheet");

        let active = self
            .remote
            .get_active_spreadsheet_id()
            .await
            .map_err(|e| RotationError::at(RotationStep::Resync, e))?;
        if active != candidate {
            tracing::warn!(
                expected = %candidate,
                actual = %active,
                "active spreadsheet changed concurrently"
            );
        }
        tracing::info!(spreadsheet = %active, "re-synced active spreadsheet id");
        self.current = Some(active.clone());

        self.remote
            .clear_transient_records()
            .await
            .map_err(|e| RotationError::at(RotationStep::ClearTransients, e))?;
        tracing::info!("cleared temporary times and periods for today");

        Ok(RotationOutcome { previous, active })
    }
}

impl std::fmt::Debug for RotationWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotationWorkflow")
            .field("clear_range", &self.clear_range)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}
