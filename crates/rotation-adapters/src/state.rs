//! GraphQL client for the remote state service
//!
//! All three operations live in one query document; each request names the
//! operation to execute. Requests authenticate with `Client-Id` and
//! `Client-Secret` headers.

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use rotation_core::{RemoteError, RemoteState, SpreadsheetHandle};

/// Query document holding every operation the rotation uses
pub const QUERIES: &str = r"
mutation SetSpreadsheetId($newId: String!) {
    setSpreadsheetId(id: $newId)
}
query GetSpreadsheetId {
    id: currSpreadsheetId
}
mutation ClearTemps {
    syncAndFlushFutures
    clearAllTempTimes
    clearAllTempPeriods
}
";

const SET_SPREADSHEET_ID: &str = "SetSpreadsheetId";
const GET_SPREADSHEET_ID: &str = "GetSpreadsheetId";
const CLEAR_TEMPS: &str = "ClearTemps";

/// Credentials sent with every request
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

/// Body of a GraphQL POST
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest<'a> {
    pub query: &'a str,
    pub operation_name: &'a str,
    pub variables: Value,
}

/// Body of a GraphQL response
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    /// Absent, `null` and `[]` all mean success
    #[serde(default)]
    pub errors: Option<Vec<GraphQlErrorEntry>>,
}

/// One entry of a response's `errors` list
#[derive(Debug, Deserialize)]
pub struct GraphQlErrorEntry {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct ActiveSpreadsheet {
    id: String,
}

/// [`RemoteState`] over GraphQL-over-HTTP
pub struct GraphQlStateClient {
    http: reqwest::Client,
    endpoint: Url,
    credentials: ClientCredentials,
}

impl GraphQlStateClient {
    /// Create client
    pub fn new(http: reqwest::Client, endpoint: Url, credentials: ClientCredentials) -> Self {
        Self {
            http,
            endpoint,
            credentials,
        }
    }

    /// Execute `operation` and return its `data`, if any
    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &str,
        variables: Value,
    ) -> Result<Option<T>, RemoteError> {
        let body = GraphQlRequest {
            query: QUERIES,
            operation_name: operation,
            variables,
        };
        tracing::debug!(operation, endpoint = %self.endpoint, "remote state request");

        let response = self
            .http
            .post(self.endpoint.clone())
            .header("Client-Id", &self.credentials.client_id)
            .header("Client-Secret", &self.credentials.client_secret)
            .json(&body)
            .send()
            .await
            .map_err(|e| RemoteError::Transport {
                operation: operation.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::RequestFailed {
                operation: operation.to_string(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await.map_err(|e| RemoteError::Transport {
            operation: operation.to_string(),
            message: e.to_string(),
        })?;
        decode_response(operation, &text)
    }
}

#[async_trait::async_trait]
impl RemoteState for GraphQlStateClient {
    async fn get_active_spreadsheet_id(&self) -> Result<SpreadsheetHandle, RemoteError> {
        let data: Option<ActiveSpreadsheet> = self.execute(GET_SPREADSHEET_ID, json!({})).await?;
        data.map(|d| SpreadsheetHandle::new(d.id))
            .ok_or_else(|| RemoteError::MissingData(GET_SPREADSHEET_ID.to_string()))
    }

    async fn set_active_spreadsheet_id(
        &self,
        handle: &SpreadsheetHandle,
    ) -> Result<(), RemoteError> {
        self.execute::<Value>(SET_SPREADSHEET_ID, json!({ "newId": handle.as_str() }))
            .await?;
        Ok(())
    }

    async fn clear_transient_records(&self) -> Result<(), RemoteError> {
        self.execute::<Value>(CLEAR_TEMPS, json!({})).await?;
        Ok(())
    }
}

impl std::fmt::Debug for GraphQlStateClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQlStateClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

/// Decode a response body; a non-empty `errors` list fails the call
pub fn decode_response<T: DeserializeOwned>(
    operation: &str,
    body: &str,
) -> Result<Option<T>, RemoteError> {
    let response: GraphQlResponse<T> =
        serde_json::from_str(body).map_err(|e| RemoteError::Decode {
            operation: operation.to_string(),
            message: e.to_string(),
        })?;

    match response.errors {
        Some(errors) if !errors.is_empty() => Err(RemoteError::ErrorResponse {
            operation: operation.to_string(),
            messages: errors.into_iter().map(|e| e.message).collect(),
        }),
        _ => Ok(response.data),
    }
}
