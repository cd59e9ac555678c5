//! Testing utilities for the rotation workspace
//!
//! Shared fakes for every capability trait. The spreadsheet and remote-state
//! fakes write into one [`CallJournal`] so tests can assert cross-service
//! ordering.

#![allow(missing_docs)]

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use rotation_core::{
    CellBlock, CellRange, Clock, FailureReport, FileMetadata, GridSize, Notifier,
    PermissionEntry, ProviderError, RemoteError, RemoteState, SheetProperties, SpreadsheetHandle,
    SpreadsheetOps, StorageBackend,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// One observed call on a fake collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ClearRange(SpreadsheetHandle),
    Duplicate(SpreadsheetHandle),
    CopyPermissions {
        from: SpreadsheetHandle,
        to: SpreadsheetHandle,
    },
    Delete(SpreadsheetHandle),
    GetActive,
    SetActive(SpreadsheetHandle),
    ClearTransients,
}

/// Which call a fake should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    ClearRange,
    Duplicate,
    CopyPermissions,
    Delete,
    GetActive,
    SetActive,
    ClearTransients,
}

/// Ordered record of calls shared between fakes
#[derive(Debug, Clone, Default)]
pub struct CallJournal {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl CallJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn position(&self, call: &Call) -> Option<usize> {
        self.calls.lock().iter().position(|c| c == call)
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }
}

/// [`SpreadsheetOps`] fake that records calls and can fail chosen operations
#[derive(Debug)]
pub struct RecordingSpreadsheets {
    journal: CallJournal,
    copy_id: SpreadsheetHandle,
    failing: Mutex<HashSet<CallKind>>,
    last_range: Mutex<Option<CellRange>>,
}

impl RecordingSpreadsheets {
    pub fn new(journal: CallJournal, copy_id: impl Into<SpreadsheetHandle>) -> Self {
        Self {
            journal,
            copy_id: copy_id.into(),
            failing: Mutex::new(HashSet::new()),
            last_range: Mutex::new(None),
        }
    }

    pub fn fail_on(&self, kind: CallKind) {
        self.failing.lock().insert(kind);
    }

    pub fn last_range(&self) -> Option<CellRange> {
        *self.last_range.lock()
    }

    fn check(&self, kind: CallKind) -> Result<(), ProviderError> {
        if self.failing.lock().contains(&kind) {
            Err(ProviderError::request_failed("fake", 500, format!("{kind:?} failed")))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl SpreadsheetOps for RecordingSpreadsheets {
    async fn clear_range(
        &self,
        handle: &SpreadsheetHandle,
        range: &CellRange,
    ) -> Result<(), ProviderError> {
        self.journal.record(Call::ClearRange(handle.clone()));
        *self.last_range.lock() = Some(*range);
        self.check(CallKind::ClearRange)
    }

    async fn duplicate(
        &self,
        handle: &SpreadsheetHandle,
    ) -> Result<SpreadsheetHandle, ProviderError> {
        self.journal.record(Call::Duplicate(handle.clone()));
        self.check(CallKind::Duplicate)?;
        Ok(self.copy_id.clone())
    }

    async fn copy_permissions(
        &self,
        from: &SpreadsheetHandle,
        to: &SpreadsheetHandle,
    ) -> Result<(), ProviderError> {
        self.journal.record(Call::CopyPermissions {
            from: from.clone(),
            to: to.clone(),
        });
        self.check(CallKind::CopyPermissions)
    }

    async fn delete_permanently(&self, handle: &SpreadsheetHandle) -> Result<(), ProviderError> {
        self.journal.record(Call::Delete(handle.clone()));
        self.check(CallKind::Delete)
    }
}

/// [`RemoteState`] fake holding the active handle in memory
#[derive(Debug)]
pub struct FakeRemoteState {
    journal: CallJournal,
    active: Mutex<SpreadsheetHandle>,
    failing: Mutex<HashSet<CallKind>>,
    /// Handle another writer installs right after the next `set`
    concurrent_write: Mutex<Option<SpreadsheetHandle>>,
}

impl FakeRemoteState {
    pub fn new(journal: CallJournal, active: impl Into<SpreadsheetHandle>) -> Self {
        Self {
            journal,
            active: Mutex::new(active.into()),
            failing: Mutex::new(HashSet::new()),
            concurrent_write: Mutex::new(None),
        }
    }

    pub fn active(&self) -> SpreadsheetHandle {
        self.active.lock().clone()
    }

    pub fn fail_on(&self, kind: CallKind) {
        self.failing.lock().insert(kind);
    }

    pub fn overwrite_after_set(&self, handle: impl Into<SpreadsheetHandle>) {
        *self.concurrent_write.lock() = Some(handle.into());
    }

    fn check(&self, kind: CallKind, operation: &str) -> Result<(), RemoteError> {
        if self.failing.lock().contains(&kind) {
            Err(RemoteError::ErrorResponse {
                operation: operation.to_string(),
                messages: vec![format!("{kind:?} rejected")],
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl RemoteState for FakeRemoteState {
    async fn get_active_spreadsheet_id(&self) -> Result<SpreadsheetHandle, RemoteError> {
        self.journal.record(Call::GetActive);
        self.check(CallKind::GetActive, "GetSpreadsheetId")?;
        Ok(self.active())
    }

    async fn set_active_spreadsheet_id(
        &self,
        handle: &SpreadsheetHandle,
    ) -> Result<(), RemoteError> {
        self.journal.record(Call::SetActive(handle.clone()));
        self.check(CallKind::SetActive, "SetSpreadsheetId")?;
        let next = self
            .concurrent_write
            .lock()
            .take()
            .unwrap_or_else(|| handle.clone());
        *self.active.lock() = next;
        Ok(())
    }

    async fn clear_transient_records(&self) -> Result<(), RemoteError> {
        self.journal.record(Call::ClearTransients);
        self.check(CallKind::ClearTransients, "ClearTemps")
    }
}

/// [`StorageBackend`] fake with scripted metadata and per-grantee failures
#[derive(Debug, Default)]
pub struct FakeStorageBackend {
    pub sheets: Mutex<Vec<SheetProperties>>,
    pub metadata: Mutex<FileMetadata>,
    pub copy_result: Mutex<Option<SpreadsheetHandle>>,
    pub permissions: Mutex<Vec<PermissionEntry>>,
    /// Principals whose permission creation fails
    pub rejected_principals: Mutex<HashSet<String>>,
    pub update_status: Mutex<Option<u16>>,
    pub delete_status: Mutex<Option<u16>>,

    pub updates: Mutex<Vec<(SpreadsheetHandle, CellBlock)>>,
    pub copies: Mutex<Vec<(SpreadsheetHandle, String, String)>>,
    pub create_attempts: Mutex<Vec<(SpreadsheetHandle, PermissionEntry)>>,
    pub deletes: Mutex<Vec<SpreadsheetHandle>>,
}

impl FakeStorageBackend {
    /// Backend with one 1000×26 sheet, a named file in folder `folder-1`,
    /// and a copy that returns `copy-1`
    pub fn with_defaults() -> Self {
        let backend = Self::default();
        *backend.sheets.lock() = vec![SheetProperties {
            sheet_id: 0,
            grid: Some(GridSize {
                row_count: 1000,
                column_count: 26,
            }),
        }];
        *backend.metadata.lock() = FileMetadata {
            name: "Attendance <2026-10-16>".to_string(),
            parents: vec!["folder-1".to_string()],
        };
        *backend.copy_result.lock() = Some(SpreadsheetHandle::new("copy-1"));
        backend
    }

    pub fn reject_principal(&self, principal: &str) {
        self.rejected_principals.lock().insert(principal.to_string());
    }
}

#[async_trait::async_trait]
impl StorageBackend for FakeStorageBackend {
    async fn sheet_properties(
        &self,
        _handle: &SpreadsheetHandle,
    ) -> Result<Vec<SheetProperties>, ProviderError> {
        Ok(self.sheets.lock().clone())
    }

    async fn update_cells(
        &self,
        handle: &SpreadsheetHandle,
        block: CellBlock,
    ) -> Result<(), ProviderError> {
        if let Some(status) = *self.update_status.lock() {
            return Err(ProviderError::request_failed("batch update", status, "rejected"));
        }
        self.updates.lock().push((handle.clone(), block));
        Ok(())
    }

    async fn file_metadata(
        &self,
        _handle: &SpreadsheetHandle,
    ) -> Result<FileMetadata, ProviderError> {
        Ok(self.metadata.lock().clone())
    }

    async fn copy_file(
        &self,
        handle: &SpreadsheetHandle,
        parent: &str,
        name: &str,
    ) -> Result<Option<SpreadsheetHandle>, ProviderError> {
        self.copies
            .lock()
            .push((handle.clone(), parent.to_string(), name.to_string()));
        Ok(self.copy_result.lock().clone())
    }

    async fn list_permissions(
        &self,
        _handle: &SpreadsheetHandle,
    ) -> Result<Vec<PermissionEntry>, ProviderError> {
        Ok(self.permissions.lock().clone())
    }

    async fn create_permission(
        &self,
        handle: &SpreadsheetHandle,
        entry: &PermissionEntry,
    ) -> Result<(), ProviderError> {
        self.create_attempts
            .lock()
            .push((handle.clone(), entry.clone()));
        let rejected = entry
            .principal
            .as_ref()
            .is_some_and(|p| self.rejected_principals.lock().contains(p));
        if rejected {
            Err(ProviderError::request_failed(
                "create permission",
                403,
                format!("cannot share with {}", entry.principal.as_deref().unwrap_or("")),
            ))
        } else {
            Ok(())
        }
    }

    async fn delete_file(&self, handle: &SpreadsheetHandle) -> Result<(), ProviderError> {
        if let Some(status) = *self.delete_status.lock() {
            return Err(ProviderError::request_failed("delete file", status, "not found"));
        }
        self.deletes.lock().push(handle.clone());
        Ok(())
    }
}

/// [`Clock`] whose `sleep` advances its time instantly
#[derive(Debug)]
pub struct FakeClock {
    now: Mutex<DateTime<Utc>>,
    sleeps: Mutex<Vec<Duration>>,
}

impl FakeClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Clock at `h:m:s` UTC on 2026-10-16
    pub fn at(h: u32, m: u32, s: u32) -> Self {
        Self::new(fixed_time(h, m, s))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }

    pub fn total_slept(&self) -> Duration {
        self.sleeps.lock().iter().sum()
    }
}

#[async_trait::async_trait]
impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
        let step = chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::zero());
        let mut now = self.now.lock();
        *now += step;
    }
}

/// `h:m:s` UTC on 2026-10-16
pub fn fixed_time(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, h, m, s)
        .single()
        .unwrap_or_default()
}

/// [`Notifier`] that keeps every report
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    reports: Mutex<Vec<FailureReport>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<FailureReport> {
        self.reports.lock().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, report: &FailureReport) {
        self.reports.lock().push(report.clone());
    }
}
