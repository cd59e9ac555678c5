//! Spreadsheet provider operations
//!
//! [`StorageBackend`] is the raw capability surface of the storage provider
//! (batch cell updates, metadata, copy, permissions, delete).
//! [`SpreadsheetProvider`] builds the four rotation operations on top of it:
//! - clearing the data range and resetting the report cell
//! - duplicating a document under a dated name in the same folder
//! - replicating non-owner permissions, collecting per-grant failures
//! - permanent deletion

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use crate::clock::Clock;
use crate::error::{PermissionFailure, ProviderError};
use crate::types::{
    CellRange, CellRef, FileMetadata, PermissionEntry, SheetProperties, SpreadsheetHandle,
};

static DATE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<.+>").expect("date tag pattern is a valid regex"));

/// Block of string values written at a start cell of one sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellBlock {
    /// Target sheet (tab) id
    pub sheet_id: i64,
    /// Top-left cell of the block
    pub start: CellRef,
    /// Row-major values
    pub rows: Vec<Vec<String>>,
}

impl CellBlock {
    /// Block of `rows × columns` empty strings
    #[must_use]
    pub fn blank(sheet_id: i64, range: &CellRange) -> Self {
        let row = vec![String::new(); range.columns() as usize];
        Self {
            sheet_id,
            start: range.start(),
            rows: vec![row; range.rows() as usize],
        }
    }

    /// Single-cell block
    #[must_use]
    pub fn single(sheet_id: i64, cell: CellRef, value: impl Into<String>) -> Self {
        Self {
            sheet_id,
            start: cell,
            rows: vec![vec![value.into()]],
        }
    }
}

/// Raw storage-provider capabilities used by the rotation
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Sheet (tab) metadata of a spreadsheet document
    async fn sheet_properties(
        &self,
        handle: &SpreadsheetHandle,
    ) -> Result<Vec<SheetProperties>, ProviderError>;

    /// Overwrite a block of cells with user-entered string values
    async fn update_cells(
        &self,
        handle: &SpreadsheetHandle,
        block: CellBlock,
    ) -> Result<(), ProviderError>;

    /// Name and containing folders of a document
    async fn file_metadata(&self, handle: &SpreadsheetHandle)
        -> Result<FileMetadata, ProviderError>;

    /// Copy a document into `parent` under `name`; `None` if the response
    /// carried no id
    async fn copy_file(
        &self,
        handle: &SpreadsheetHandle,
        parent: &str,
        name: &str,
    ) -> Result<Option<SpreadsheetHandle>, ProviderError>;

    /// Every permission on a document
    async fn list_permissions(
        &self,
        handle: &SpreadsheetHandle,
    ) -> Result<Vec<PermissionEntry>, ProviderError>;

    /// Grant a permission without notifying the grantee
    async fn create_permission(
        &self,
        handle: &SpreadsheetHandle,
        entry: &PermissionEntry,
    ) -> Result<(), ProviderError>;

    /// Irreversibly delete a document
    async fn delete_file(&self, handle: &SpreadsheetHandle) -> Result<(), ProviderError>;
}

#[async_trait::async_trait]
impl<B: StorageBackend + ?Sized> StorageBackend for Arc<B> {
    async fn sheet_properties(
        &self,
        handle: &SpreadsheetHandle,
    ) -> Result<Vec<SheetProperties>, ProviderError> {
        (**self).sheet_properties(handle).await
    }

    async fn update_cells(
        &self,
        handle: &SpreadsheetHandle,
        block: CellBlock,
    ) -> Result<(), ProviderError> {
        (**self).update_cells(handle, block).await
    }

    async fn file_metadata(
        &self,
        handle: &SpreadsheetHandle,
    ) -> Result<FileMetadata, ProviderError> {
        (**self).file_metadata(handle).await
    }

    async fn copy_file(
        &self,
        handle: &SpreadsheetHandle,
        parent: &str,
        name: &str,
    ) -> Result<Option<SpreadsheetHandle>, ProviderError> {
        (**self).copy_file(handle, parent, name).await
    }

    async fn list_permissions(
        &self,
        handle: &SpreadsheetHandle,
    ) -> Result<Vec<PermissionEntry>, ProviderError> {
        (**self).list_permissions(handle).await
    }

    async fn create_permission(
        &self,
        handle: &SpreadsheetHandle,
        entry: &PermissionEntry,
    ) -> Result<(), ProviderError> {
        (**self).create_permission(handle, entry).await
    }

    async fn delete_file(&self, handle: &SpreadsheetHandle) -> Result<(), ProviderError> {
        (**self).delete_file(handle).await
    }
}

/// Document operations the rotation workflow performs
#[async_trait::async_trait]
pub trait SpreadsheetOps: Send + Sync {
    /// Blank every cell of `range` on the first sheet and reset the report cell
    async fn clear_range(
        &self,
        handle: &SpreadsheetHandle,
        range: &CellRange,
    ) -> Result<(), ProviderError>;

    /// Copy the document into its folder under tomorrow's dated name
    async fn duplicate(&self, handle: &SpreadsheetHandle)
        -> Result<SpreadsheetHandle, ProviderError>;

    /// Replicate every non-owner permission of `from` onto `to`
    async fn copy_permissions(
        &self,
        from: &SpreadsheetHandle,
        to: &SpreadsheetHandle,
    ) -> Result<(), ProviderError>;

    /// Irreversibly delete the document
    async fn delete_permanently(&self, handle: &SpreadsheetHandle) -> Result<(), ProviderError>;
}

/// Fixed cell reset to a label on every clear
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportCell {
    /// Cell position
    pub cell: CellRef,
    /// Label written into the cell
    pub label: String,
}

/// Rotation operations over a [`StorageBackend`]
pub struct SpreadsheetProvider<B> {
    backend: B,
    clock: Arc<dyn Clock>,
    report: ReportCell,
}

impl<B: StorageBackend> SpreadsheetProvider<B> {
    /// Create provider
    pub fn new(backend: B, clock: Arc<dyn Clock>, report: ReportCell) -> Self {
        Self {
            backend,
            clock,
            report,
        }
    }

    /// Underlying backend
    #[inline]
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B> std::fmt::Debug for SpreadsheetProvider<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpreadsheetProvider")
            .field("report", &self.report)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl<B: StorageBackend> SpreadsheetOps for SpreadsheetProvider<B> {
    async fn clear_range(
        &self,
        handle: &SpreadsheetHandle,
        range: &CellRange,
    ) -> Result<(), ProviderError> {
        let sheets = self.backend.sheet_properties(handle).await?;
        let (sheet_id, grid) = sheets
            .iter()
            .find_map(|sheet| sheet.grid.map(|grid| (sheet.sheet_id, grid)))
            .ok_or(ProviderError::NoSheetsFound)?;
        if grid.row_count == 0 || grid.column_count == 0 {
            return Err(ProviderError::NoGridDimensions);
        }

        match range.clip_to(grid) {
            Some(clipped) => {
                tracing::debug!(%handle, range = %clipped, "blanking cells");
                self.backend
                    .update_cells(handle, CellBlock::blank(sheet_id, &clipped))
                    .await?;
            }
            None => tracing::warn!(%handle, %range, "clear range lies outside the sheet grid"),
        }

        self.backend
            .update_cells(
                handle,
                CellBlock::single(sheet_id, self.report.cell, self.report.label.clone()),
            )
            .await
    }

    async fn duplicate(
        &self,
        handle: &SpreadsheetHandle,
    ) -> Result<SpreadsheetHandle, ProviderError> {
        let metadata = self.backend.file_metadata(handle).await?;
        let parent = metadata
            .parents
            .first()
            .ok_or_else(|| ProviderError::NotInFolder(handle.to_string()))?;

        let today = self.clock.now().date_naive();
        // `succ_opt` is only `None` at `NaiveDate::MAX`, which no clock reaches
        let tomorrow = today.succ_opt().unwrap_or(today);
        let name = copy_name(&metadata.name, tomorrow);

        tracing::debug!(%handle, parent = %parent, name = %name, "copying spreadsheet");
        self.backend
            .copy_file(handle, parent, &name)
            .await?
            .ok_or(ProviderError::MissingId)
    }

    async fn copy_permissions(
        &self,
        from: &SpreadsheetHandle,
        to: &SpreadsheetHandle,
    ) -> Result<(), ProviderError> {
        let entries = self.backend.list_permissions(from).await?;

        let mut failures = Vec::new();
        let mut copied = 0usize;
        for entry in entries {
            if entry.is_owner() {
                continue;
            }
            match self.backend.create_permission(to, &entry).await {
                Ok(()) => copied += 1,
                Err(error) => {
                    tracing::warn!(%to, permission = %entry, %error, "permission copy failed");
                    failures.push(PermissionFailure { entry, error });
                }
            }
        }

        tracing::debug!(%from, %to, copied, failed = failures.len(), "permissions replicated");
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ProviderError::PermissionCopyFailed { failures })
        }
    }

    async fn delete_permanently(&self, handle: &SpreadsheetHandle) -> Result<(), ProviderError> {
        self.backend.delete_file(handle).await
    }
}

/// Name for a copy: the first `<…>` tag is removed and `<date>` appended
#[must_use]
pub fn copy_name(original: &str, date: NaiveDate) -> String {
    let stripped = DATE_TAG.replace(original, "");
    let base = stripped.trim();
    if base.is_empty() {
        format!("<{date}>")
    } else {
        format!("{base} <{date}>")
    }
}
