use crate::models::{
    BigQueryError, DatasetInsertRequest, DatasetReference, Job, JobInsertRequest, JobReference,
    ProjectInfo, QueryResultsResponse, TableInsertRequest, TableReference,
};

/// Job lifecycle operations against the warehouse service.
pub trait JobsApi {
    /// POST /projects/{projectId}/jobs
    /// Submit a job for asynchronous execution. Implementations may apply
    /// their own bounded retry for transient transport failures.
    async fn insert_job(
        &self,
        project_id: &str,
        request: &JobInsertRequest,
    ) -> Result<Job, BigQueryError>;

    /// GET /projects/{projectId}/jobs/{jobId}
    /// Fetch the job's current status snapshot.
    async fn get_job(&self, job: &JobReference) -> Result<Job, BigQueryError>;

    /// GET /projects/{projectId}/queries/{jobId}
    /// Fetch the results of a completed query job: raw rows plus schema.
    async fn get_query_results(
        &self,
        job: &JobReference,
    ) -> Result<QueryResultsResponse, BigQueryError>;
}

/// Dataset, table, and project metadata operations. Single requests with no
/// retry or state logic.
pub trait MetadataApi {
    /// POST /projects/{projectId}/datasets
    async fn insert_dataset(
        &self,
        project_id: &str,
        request: &DatasetInsertRequest,
    ) -> Result<(), BigQueryError>;

    /// GET /projects/{projectId}/datasets/{datasetId}
    async fn get_dataset(&self, dataset: &DatasetReference) -> Result<(), BigQueryError>;

    /// DELETE /projects/{projectId}/datasets/{datasetId}
    async fn delete_dataset(
        &self,
        dataset: &DatasetReference,
        delete_contents: bool,
    ) -> Result<(), BigQueryError>;

    /// GET /projects/{projectId}/datasets
    async fn list_datasets(&self, project_id: &str) -> Result<Vec<String>, BigQueryError>;

    /// GET /projects/{projectId}/datasets/{datasetId}/tables
    async fn list_tables(&self, dataset: &DatasetReference)
        -> Result<Vec<String>, BigQueryError>;

    /// POST /projects/{projectId}/datasets/{datasetId}/tables
    async fn insert_table(
        &self,
        dataset: &DatasetReference,
        request: &TableInsertRequest,
    ) -> Result<(), BigQueryError>;

    /// DELETE /projects/{projectId}/datasets/{datasetId}/tables/{tableId}
    async fn delete_table(&self, table: &TableReference) -> Result<(), BigQueryError>;

    /// GET /projects
    async fn list_projects(&self) -> Result<Vec<ProjectInfo>, BigQueryError>;
}
