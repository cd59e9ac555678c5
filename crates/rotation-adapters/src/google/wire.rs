//! Request and response shapes of the Sheets v4 and Drive v3 APIs

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use rotation_core::{
    CellBlock, FileMetadata, GridSize, PermissionEntry, SheetProperties, SpreadsheetHandle,
};

/// Field mask for sheet metadata requests
pub(crate) const SHEET_FIELDS: &str = "sheets.properties";
/// Field mask for file metadata requests
pub(crate) const FILE_FIELDS: &str = "name,parents";
/// Field mask for permission listing
pub(crate) const PERMISSION_FIELDS: &str =
    "nextPageToken,permissions(role,type,emailAddress,domain)";

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Spreadsheet {
    #[serde(default)]
    sheets: Vec<Sheet>,
}

#[derive(Debug, Deserialize)]
struct Sheet {
    properties: Option<SheetPropertiesWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetPropertiesWire {
    #[serde(default)]
    sheet_id: i64,
    grid_properties: Option<GridPropertiesWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridPropertiesWire {
    #[serde(default)]
    row_count: u32,
    #[serde(default)]
    column_count: u32,
}

impl Spreadsheet {
    pub(crate) fn into_sheets(self) -> Vec<SheetProperties> {
        self.sheets
            .into_iter()
            .filter_map(|sheet| sheet.properties)
            .map(|props| SheetProperties {
                sheet_id: props.sheet_id,
                grid: props.grid_properties.map(|grid| GridSize {
                    row_count: grid.row_count,
                    column_count: grid.column_count,
                }),
            })
            .collect()
    }
}

/// `batchUpdate` body overwriting a block with user-entered strings
pub(crate) fn update_cells_body(block: &CellBlock) -> Value {
    let rows: Vec<Value> = block
        .rows
        .iter()
        .map(|row| {
            let values: Vec<Value> = row
                .iter()
                .map(|text| json!({ "userEnteredValue": { "stringValue": text } }))
                .collect();
            json!({ "values": values })
        })
        .collect();

    json!({
        "requests": [{
            "updateCells": {
                "start": {
                    "sheetId": block.sheet_id,
                    "rowIndex": block.start.row,
                    "columnIndex": block.start.col,
                },
                "rows": rows,
                "fields": "userEnteredValue",
            }
        }]
    })
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct File {
    id: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    parents: Vec<String>,
}

impl File {
    pub(crate) fn into_metadata(self) -> FileMetadata {
        FileMetadata {
            name: self.name,
            parents: self.parents,
        }
    }

    pub(crate) fn into_handle(self) -> Option<SpreadsheetHandle> {
        self.id.filter(|id| !id.is_empty()).map(SpreadsheetHandle::new)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CopyRequest<'a> {
    pub(crate) name: &'a str,
    pub(crate) parents: [&'a str; 1],
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PermissionPage {
    #[serde(default)]
    permissions: Vec<Permission>,
    pub(crate) next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Permission {
    role: String,
    #[serde(rename = "type")]
    kind: String,
    email_address: Option<String>,
    domain: Option<String>,
}

impl PermissionPage {
    pub(crate) fn take_entries(&mut self) -> Vec<PermissionEntry> {
        self.permissions
            .drain(..)
            .map(|p| PermissionEntry::new(p.role, p.kind, p.email_address.or(p.domain)))
            .collect()
    }
}

/// Permission create body; the principal goes to `domain` for domain
/// grants and to `emailAddress` otherwise
pub(crate) fn permission_body(entry: &PermissionEntry) -> Value {
    let mut body = json!({ "role": entry.role, "type": entry.kind });
    if let Some(principal) = &entry.principal {
        let key = if entry.kind == "domain" {
            "domain"
        } else {
            "emailAddress"
        };
        body[key] = Value::String(principal.clone());
    }
    body
}
