use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::api::{JobsApi, MetadataApi};
use crate::models::*;

/// Default endpoint for the BigQuery v2 REST API.
pub const DEFAULT_BASE_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// Transport-level retry budget for job submission. Transient transport
/// failures only; HTTP error statuses are never retried.
const INSERT_JOB_ATTEMPTS: u32 = 5;
/// Transport-level retry budget for status polls.
const GET_JOB_ATTEMPTS: u32 = 2;
const RETRY_DELAY: Duration = Duration::from_millis(250);

/// Low-level BigQuery client that directly calls the v2 REST endpoints.
///
/// Holds a pre-acquired bearer token; credential acquisition is up to the
/// caller. Cheap to clone and safe to share across concurrent calls.
#[derive(Debug, Clone)]
pub struct BigQueryRestClient {
    base_url: String,
    token: String,
    http_client: Client,
}

impl BigQueryRestClient {
    /// Creates a new client against the public BigQuery endpoint.
    pub fn new(token: &str) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, token)
    }

    /// Creates a new client with an explicit base URL, e.g. a test server or
    /// a private service endpoint.
    pub fn with_base_url(base_url: &str, token: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            http_client: Client::new(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, BigQueryError> {
        let resp = self
            .http_client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        Self::handle_response(resp).await
    }

    /// Helper to deserialize a successful response body or surface the
    /// service's failure.
    async fn handle_response<T: DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, BigQueryError> {
        let status = resp.status();
        let text_body = resp.text().await?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BigQueryError::NotFound);
        }
        if !status.is_success() {
            return Err(BigQueryError::Api(format!("HTTP {}: {}", status, text_body)));
        }

        serde_json::from_str(&text_body)
            .map_err(|e| BigQueryError::Api(format!("JSON parse error: {}", e)))
    }

    /// Helper for endpoints whose response body we do not need.
    async fn handle_empty_response(resp: reqwest::Response) -> Result<(), BigQueryError> {
        let status = resp.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BigQueryError::NotFound);
        }
        if !status.is_success() {
            let body = resp.text().await?;
            return Err(BigQueryError::Api(format!("HTTP {}: {}", status, body)));
        }

        Ok(())
    }
}

impl JobsApi for BigQueryRestClient {
    /// POST /projects/{projectId}/jobs
    /// Submit a job, retrying transient transport failures up to 5 attempts.
    async fn insert_job(
        &self,
        project_id: &str,
        request: &JobInsertRequest,
    ) -> Result<Job, BigQueryError> {
        let url = format!("{}/projects/{}/jobs", self.base_url, project_id);

        let mut attempt = 0;
        loop {
            attempt += 1;
            let sent = self
                .http_client
                .post(&url)
                .bearer_auth(&self.token)
                .json(request)
                .send()
                .await;

            match sent {
                Ok(resp) => return Self::handle_response(resp).await,
                Err(err) if attempt < INSERT_JOB_ATTEMPTS => {
                    tracing::warn!(attempt, error = %err, "job submission failed, retrying");
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// GET /projects/{projectId}/jobs/{jobId}
    /// Fetch the job's status, retrying transient transport failures once.
    async fn get_job(&self, job: &JobReference) -> Result<Job, BigQueryError> {
        let url = format!(
            "{}/projects/{}/jobs/{}",
            self.base_url, job.project_id, job.job_id
        );

        let mut attempt = 0;
        loop {
            attempt += 1;
            let sent = self
                .http_client
                .get(&url)
                .bearer_auth(&self.token)
                .send()
                .await;

            match sent {
                Ok(resp) => return Self::handle_response(resp).await,
                Err(err) if attempt < GET_JOB_ATTEMPTS => {
                    tracing::warn!(attempt, error = %err, "status poll failed, retrying");
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// GET /projects/{projectId}/queries/{jobId}
    /// Fetch rows and schema for a completed query job.
    async fn get_query_results(
        &self,
        job: &JobReference,
    ) -> Result<QueryResultsResponse, BigQueryError> {
        let url = format!(
            "{}/projects/{}/queries/{}",
            self.base_url, job.project_id, job.job_id
        );

        self.get_json(&url).await
    }
}

impl MetadataApi for BigQueryRestClient {
    /// POST /projects/{projectId}/datasets
    async fn insert_dataset(
        &self,
        project_id: &str,
        request: &DatasetInsertRequest,
    ) -> Result<(), BigQueryError> {
        let url = format!("{}/projects/{}/datasets", self.base_url, project_id);

        let resp = self
            .http_client
            .post(&url)
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await?;

        Self::handle_empty_response(resp).await
    }

    /// GET /projects/{projectId}/datasets/{datasetId}
    async fn get_dataset(&self, dataset: &DatasetReference) -> Result<(), BigQueryError> {
        let url = format!(
            "{}/projects/{}/datasets/{}",
            self.base_url, dataset.project_id, dataset.dataset_id
        );

        let resp = self
            .http_client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        Self::handle_empty_response(resp).await
    }

    /// DELETE /projects/{projectId}/datasets/{datasetId}
    async fn delete_dataset(
        &self,
        dataset: &DatasetReference,
        delete_contents: bool,
    ) -> Result<(), BigQueryError> {
        let url = format!(
            "{}/projects/{}/datasets/{}",
            self.base_url, dataset.project_id, dataset.dataset_id
        );

        let resp = self
            .http_client
            .delete(&url)
            .bearer_auth(&self.token)
            .query(&[("deleteContents", delete_contents)])
            .send()
            .await?;

        Self::handle_empty_response(resp).await
    }

    /// GET /projects/{projectId}/datasets
    async fn list_datasets(&self, project_id: &str) -> Result<Vec<String>, BigQueryError> {
        let url = format!("{}/projects/{}/datasets", self.base_url, project_id);
        let listing: DatasetListResponse = self.get_json(&url).await?;

        Ok(listing
            .datasets
            .unwrap_or_default()
            .into_iter()
            .map(|d| d.dataset_reference.dataset_id)
            .collect())
    }

    /// GET /projects/{projectId}/datasets/{datasetId}/tables
    async fn list_tables(
        &self,
        dataset: &DatasetReference,
    ) -> Result<Vec<String>, BigQueryError> {
        let url = format!(
            "{}/projects/{}/datasets/{}/tables",
            self.base_url, dataset.project_id, dataset.dataset_id
        );
        let listing: TableListResponse = self.get_json(&url).await?;

        Ok(listing
            .tables
            .unwrap_or_default()
            .into_iter()
            .map(|t| t.table_reference.table_id)
            .collect())
    }

    /// POST /projects/{projectId}/datasets/{datasetId}/tables
    async fn insert_table(
        &self,
        dataset: &DatasetReference,
        request: &TableInsertRequest,
    ) -> Result<(), BigQueryError> {
        let url = format!(
            "{}/projects/{}/datasets/{}/tables",
            self.base_url, dataset.project_id, dataset.dataset_id
        );

        let resp = self
            .http_client
            .post(&url)
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await?;

        Self::handle_empty_response(resp).await
    }

    /// DELETE /projects/{projectId}/datasets/{datasetId}/tables/{tableId}
    async fn delete_table(&self, table: &TableReference) -> Result<(), BigQueryError> {
        let url = format!(
            "{}/projects/{}/datasets/{}/tables/{}",
            self.base_url, table.project_id, table.dataset_id, table.table_id
        );

        let resp = self
            .http_client
            .delete(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        Self::handle_empty_response(resp).await
    }

    /// GET /projects
    async fn list_projects(&self) -> Result<Vec<ProjectInfo>, BigQueryError> {
        let url = format!("{}/projects", self.base_url);
        let listing: ProjectListResponse = self.get_json(&url).await?;

        Ok(listing
            .projects
            .unwrap_or_default()
            .into_iter()
            .map(|p| ProjectInfo {
                friendly_name: p.friendly_name,
                project_id: p.project_reference.project_id,
            })
            .collect())
    }
}
