//! Remote state service interface
//!
//! The remote state service is the single source of truth for which
//! spreadsheet is active. It also holds the day-scoped transient time and
//! period records that every rotation purges.

use crate::error::RemoteError;
use crate::types::SpreadsheetHandle;

/// Typed operations of the remote state service
#[async_trait::async_trait]
pub trait RemoteState: Send + Sync {
    /// Currently active spreadsheet
    async fn get_active_spreadsheet_id(&self) -> Result<SpreadsheetHandle, RemoteError>;

    /// Make `handle` the active spreadsheet
    async fn set_active_spreadsheet_id(&self, handle: &SpreadsheetHandle)
        -> Result<(), RemoteError>;

    /// Flush pending derived data, then purge today's temporary times and
    /// periods
    async fn clear_transient_records(&self) -> Result<(), RemoteError>;
}
