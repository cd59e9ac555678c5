//! Core types for the rotation service
//!
//! Defines the values that flow between the workflow and its collaborators:
//! - Document handles
//! - Cell addresses and ranges
//! - Permission grants
//! - Document metadata returned by the storage provider
//! - The daily trigger instant

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::address::column_letters;

/// Seconds in one UTC day
pub const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// Opaque identifier of a document on the storage provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpreadsheetHandle(String);

impl SpreadsheetHandle {
    /// Wrap a provider id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Raw provider id
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpreadsheetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SpreadsheetHandle {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SpreadsheetHandle {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Single zero-based cell position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    /// Zero-based column index
    pub col: u32,
    /// Zero-based row index
    pub row: u32,
}

impl CellRef {
    /// Create cell reference
    #[inline]
    #[must_use]
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.col), u64::from(self.row) + 1)
    }
}

/// Inclusive zero-based rectangle of cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    /// First column
    pub start_col: u32,
    /// First row
    pub start_row: u32,
    /// Last column (inclusive)
    pub end_col: u32,
    /// Last row (inclusive)
    pub end_row: u32,
}

impl CellRange {
    /// Top-left corner
    #[inline]
    #[must_use]
    pub fn start(&self) -> CellRef {
        CellRef::new(self.start_col, self.start_row)
    }

    /// Number of rows covered
    #[inline]
    #[must_use]
    pub fn rows(&self) -> u32 {
        self.end_row.saturating_sub(self.start_row) + 1
    }

    /// Number of columns covered
    #[inline]
    #[must_use]
    pub fn columns(&self) -> u32 {
        self.end_col.saturating_sub(self.start_col) + 1
    }

    /// Intersect with a sheet of the given size.
    ///
    /// Returns `None` when the range lies entirely outside the grid.
    #[must_use]
    pub fn clip_to(&self, grid: GridSize) -> Option<Self> {
        if grid.row_count == 0 || grid.column_count == 0 {
            return None;
        }
        if self.start_row >= grid.row_count || self.start_col >= grid.column_count {
            return None;
        }
        Some(Self {
            start_col: self.start_col,
            start_row: self.start_row,
            end_col: self.end_col.min(grid.column_count - 1),
            end_row: self.end_row.min(grid.row_count - 1),
        })
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            self.start(),
            CellRef::new(self.end_col, self.end_row)
        )
    }
}

/// One access grant on a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionEntry {
    /// Access role (`owner`, `writer`, `commenter`, `reader`, ...)
    pub role: String,
    /// Grantee type (`user`, `group`, `domain`, `anyone`)
    #[serde(rename = "type")]
    pub kind: String,
    /// Email address or domain of the grantee, absent for `anyone`
    pub principal: Option<String>,
}

impl PermissionEntry {
    /// Role that is never replicated onto a copy
    pub const OWNER_ROLE: &'static str = "owner";

    /// Create permission entry
    #[must_use]
    pub fn new(
        role: impl Into<String>,
        kind: impl Into<String>,
        principal: Option<String>,
    ) -> Self {
        Self {
            role: role.into(),
            kind: kind.into(),
            principal,
        }
    }

    /// Whether this grant is document ownership
    #[inline]
    #[must_use]
    pub fn is_owner(&self) -> bool {
        self.role == Self::OWNER_ROLE
    }
}

impl fmt::Display for PermissionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.principal {
            Some(principal) => write!(f, "{} {} ({})", self.kind, principal, self.role),
            None => write!(f, "{} ({})", self.kind, self.role),
        }
    }
}

/// Grid dimensions of a sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSize {
    /// Number of rows
    pub row_count: u32,
    /// Number of columns
    pub column_count: u32,
}

/// Per-sheet metadata of a spreadsheet document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetProperties {
    /// Provider sheet id (the tab id, not the document id)
    pub sheet_id: i64,
    /// Grid size, absent for non-grid sheets
    pub grid: Option<GridSize>,
}

/// File-level metadata of a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMetadata {
    /// Display name
    pub name: String,
    /// Ids of the containing folders
    pub parents: Vec<String>,
}

/// Daily trigger point in seconds after UTC midnight
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScheduledInstant(u32);

impl ScheduledInstant {
    /// Create from seconds after midnight, rejecting values outside one day
    #[must_use]
    pub fn new(seconds: u32) -> Option<Self> {
        (seconds < SECONDS_PER_DAY).then_some(Self(seconds))
    }

    /// Seconds after UTC midnight
    #[inline]
    #[must_use]
    pub fn seconds(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ScheduledInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m, s) = (self.0 / 3600, (self.0 / 60) % 60, self.0 % 60);
        write!(f, "{h:02}:{m:02}:{s:02} UTC")
    }
}

/// Steps of one rotation, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RotationStep {
    /// Read the active handle from remote state
    ReadActive,
    /// Clear the active document's data range
    Clear,
    /// Duplicate the active document
    Duplicate,
    /// Point remote state at the copy
    UpdatePointer,
    /// Copy permissions onto the copy
    CopyPermissions,
    /// Permanently delete the old document
    DeleteOld,
    /// Re-read the active handle
    Resync,
    /// Purge transient remote records
    ClearTransients,
}

impl fmt::Display for RotationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ReadActive => "read active spreadsheet id",
            Self::Clear => "clear data range",
            Self::Duplicate => "duplicate spreadsheet",
            Self::UpdatePointer => "update active spreadsheet id",
            Self::CopyPermissions => "copy permissions",
            Self::DeleteOld => "delete old spreadsheet",
            Self::Resync => "re-read active spreadsheet id",
            Self::ClearTransients => "clear transient records",
        };
        f.write_str(name)
    }
}

/// Handles involved in a completed rotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationOutcome {
    /// Document that was active when the run started (now deleted)
    pub previous: SpreadsheetHandle,
    /// Active document according to remote state after the run
    pub active: SpreadsheetHandle,
}
