use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reference identifying one job within a project. The `job_id` is generated
/// client-side (a random UUID) so resubmitting never collides with an
/// earlier job.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobReference {
    pub project_id: String,
    pub job_id: String,
}

/// Request body for POST /projects/{projectId}/jobs.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JobInsertRequest {
    pub job_reference: JobReference,
    pub configuration: JobConfiguration,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JobConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<JobConfigurationQuery>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JobConfigurationQuery {
    pub query: String,
    /// "INTERACTIVE" or "BATCH".
    pub priority: String,
    /// Dataset against which unqualified table names in the query resolve.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_dataset: Option<DatasetReference>,
}

/// Job resource as returned by jobs.insert and jobs.get.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_reference: Option<JobReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
}

/// Execution status snapshot. A fresh one is produced by every poll.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    /// "PENDING", "RUNNING", or "DONE". DONE is terminal; failure is carried
    /// in `error_result`, not in the state tag.
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_result: Option<ErrorProto>,
}

impl JobStatus {
    pub fn is_done(&self) -> bool {
        self.state == "DONE"
    }
}

/// Service-provided error detail, preserved verbatim in [`BigQueryError`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorProto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl std::fmt::Display for ErrorProto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.reason, &self.message) {
            (Some(reason), Some(message)) => write!(f, "{reason}: {message}"),
            (Some(reason), None) => write!(f, "{reason}"),
            (None, Some(message)) => write!(f, "{message}"),
            (None, None) => write!(f, "unknown error"),
        }
    }
}

/// Response body for GET /projects/{projectId}/queries/{jobId}.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryResultsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<TableSchema>,
    /// Absent entirely when the result set is empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<TableRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_complete: Option<bool>,
}

/// Ordered column descriptors returned alongside results.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct TableSchema {
    pub fields: Vec<TableFieldSchema>,
}

/// One column: name plus declared type tag ("INTEGER", "FLOAT", "STRING",
/// "BOOLEAN", "TIMESTAMP", "RECORD"). Both fields are optional on the wire;
/// a field missing either is a schema error, not a parse error.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct TableFieldSchema {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
}

/// One result row: cells in schema order. Rows carry values positionally,
/// never by name.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct TableRow {
    pub f: Vec<TableCell>,
}

/// One raw cell. Scalar values arrive as JSON strings; RECORD cells carry
/// arbitrary nested JSON.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct TableCell {
    pub v: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DatasetReference {
    pub project_id: String,
    pub dataset_id: String,
}

/// Request body for POST /projects/{projectId}/datasets.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DatasetInsertRequest {
    pub description: String,
    pub dataset_reference: DatasetReference,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DatasetListResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasets: Option<Vec<DatasetListEntry>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DatasetListEntry {
    pub dataset_reference: DatasetReference,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TableReference {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

/// Request body for POST /projects/{p}/datasets/{d}/tables. Only used here to
/// create views; `view.query` carries the defining SQL.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TableInsertRequest {
    pub table_reference: TableReference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<ViewDefinition>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ViewDefinition {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TableListResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables: Option<Vec<TableListEntry>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TableListEntry {
    pub table_reference: TableReference,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProjectListResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<ProjectListEntry>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProjectListEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
    pub project_reference: ProjectReference,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectReference {
    pub project_id: String,
}

/// Basic project info surfaced by `list_projects`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
    pub friendly_name: Option<String>,
    pub project_id: String,
}

/// Possible errors encountered by the BigQuery client.
#[derive(Error, Debug)]
pub enum BigQueryError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Not Found (404)")]
    NotFound,

    /// The service accepted and ran the job but it failed. Carries the
    /// service's error payload untouched.
    #[error("job execution failed: {0}")]
    JobExecution(ErrorProto),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("row has {got} cells but the schema has {expected} columns")]
    RowShape { expected: usize, got: usize },

    #[error("cannot decode column `{column}`: {message}")]
    Decode { column: String, message: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    /// The poll loop was cut short by its deadline before the job finished.
    #[error("wait for job cancelled: {0}")]
    Cancelled(String),
}
