//! Google Workspace storage backend
//!
//! Implements [`StorageBackend`] over the Sheets v4 and Drive v3 REST APIs.
//! Every request carries a bearer token from a [`TokenSource`]; any
//! non-2xx answer becomes [`ProviderError::RequestFailed`] with the response
//! body attached.

pub mod auth;
mod wire;

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use rotation_core::{
    CellBlock, FileMetadata, PermissionEntry, ProviderError, SheetProperties, SpreadsheetHandle,
    StorageBackend,
};

use self::auth::TokenSource;
use self::wire::{CopyRequest, File, PermissionPage, Spreadsheet};

/// Sheets v4 spreadsheets collection
pub const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
/// Drive v3 files collection
pub const DRIVE_API: &str = "https://www.googleapis.com/drive/v3/files";

/// Sheets + Drive REST client
pub struct GoogleWorkspace {
    http: reqwest::Client,
    tokens: Arc<dyn TokenSource>,
    sheets_api: String,
    drive_api: String,
}

impl GoogleWorkspace {
    /// Create client against the public Google endpoints
    pub fn new(http: reqwest::Client, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            http,
            tokens,
            sheets_api: SHEETS_API.to_string(),
            drive_api: DRIVE_API.to_string(),
        }
    }

    /// Point the client at other Sheets and Drive collection URLs
    #[must_use]
    pub fn with_endpoints(
        mut self,
        sheets_api: impl Into<String>,
        drive_api: impl Into<String>,
    ) -> Self {
        self.sheets_api = sheets_api.into();
        self.drive_api = drive_api.into();
        self
    }

    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, ProviderError> {
        let token = self.tokens.access_token().await?;
        tracing::debug!(operation, "google request");

        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ProviderError::Transport {
                operation,
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ProviderError::request_failed(operation, status.as_u16(), body))
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, ProviderError> {
        let response = self.send(operation, request).await?;
        response.json().await.map_err(|e| ProviderError::Decode {
            operation,
            message: e.to_string(),
        })
    }

    fn file_url(&self, handle: &SpreadsheetHandle) -> String {
        format!("{}/{}", self.drive_api, handle)
    }
}

#[async_trait::async_trait]
impl StorageBackend for GoogleWorkspace {
    async fn sheet_properties(
        &self,
        handle: &SpreadsheetHandle,
    ) -> Result<Vec<SheetProperties>, ProviderError> {
        let request = self
            .http
            .get(format!("{}/{}", self.sheets_api, handle))
            .query(&[("fields", wire::SHEET_FIELDS)]);
        let spreadsheet: Spreadsheet = self.send_json("get spreadsheet", request).await?;
        Ok(spreadsheet.into_sheets())
    }

    async fn update_cells(
        &self,
        handle: &SpreadsheetHandle,
        block: CellBlock,
    ) -> Result<(), ProviderError> {
        let request = self
            .http
            .post(format!("{}/{}:batchUpdate", self.sheets_api, handle))
            .json(&wire::update_cells_body(&block));
        self.send("batch update", request).await?;
        Ok(())
    }

    async fn file_metadata(
        &self,
        handle: &SpreadsheetHandle,
    ) -> Result<FileMetadata, ProviderError> {
        let request = self
            .http
            .get(self.file_url(handle))
            .query(&[("fields", wire::FILE_FIELDS)]);
        let file: File = self.send_json("get file", request).await?;
        Ok(file.into_metadata())
    }

    async fn copy_file(
        &self,
        handle: &SpreadsheetHandle,
        parent: &str,
        name: &str,
    ) -> Result<Option<SpreadsheetHandle>, ProviderError> {
        let request = self
            .http
            .post(format!("{}/copy", self.file_url(handle)))
            .json(&CopyRequest {
                name,
                parents: [parent],
            });
        let file: File = self.send_json("copy file", request).await?;
        Ok(file.into_handle())
    }

    async fn list_permissions(
        &self,
        handle: &SpreadsheetHandle,
    ) -> Result<Vec<PermissionEntry>, ProviderError> {
        let url = format!("{}/permissions", self.file_url(handle));
        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(&url)
                .query(&[("fields", wire::PERMISSION_FIELDS)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let mut page: PermissionPage = self.send_json("list permissions", request).await?;
            entries.extend(page.take_entries());

            match page.next_page_token.take() {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }

        Ok(entries)
    }

    async fn create_permission(
        &self,
        handle: &SpreadsheetHandle,
        entry: &PermissionEntry,
    ) -> Result<(), ProviderError> {
        let request = self
            .http
            .post(format!("{}/permissions", self.file_url(handle)))
            .query(&[("sendNotificationEmail", "false")])
            .json(&wire::permission_body(entry));
        self.send("create permission", request).await?;
        Ok(())
    }

    async fn delete_file(&self, handle: &SpreadsheetHandle) -> Result<(), ProviderError> {
        let request = self.http.delete(self.file_url(handle));
        self.send("delete file", request).await?;
        Ok(())
    }
}

impl std::fmt::Debug for GoogleWorkspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleWorkspace")
            .field("sheets_api", &self.sheets_api)
            .field("drive_api", &self.drive_api)
            .finish_non_exhaustive()
    }
}
