use uuid::Uuid;

use crate::api::{JobsApi, MetadataApi};
use crate::models::*;
use crate::poller::JobPoller;
use crate::schema;
use crate::table::ResultTable;

/// Options for one query execution.
#[derive(Debug, Default, Clone)]
pub struct QueryOptions {
    /// Return the service payload untouched instead of a decoded table.
    pub raw: bool,
    /// Dataset against which unqualified table names resolve, overriding the
    /// service-level default for this query.
    pub target_dataset: Option<String>,
}

/// What a query execution produced.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Table(ResultTable),
    Raw(QueryResultsResponse),
}

impl QueryOutcome {
    pub fn into_table(self) -> Option<ResultTable> {
        match self {
            Self::Table(table) => Some(table),
            Self::Raw(_) => None,
        }
    }

    pub fn into_raw(self) -> Option<QueryResultsResponse> {
        match self {
            Self::Raw(raw) => Some(raw),
            Self::Table(_) => None,
        }
    }
}

/// Higher-level service built on top of the raw API: submits query jobs,
/// drives them to completion, decodes results, and wraps the thin dataset
/// and table management calls.
///
/// Holds the authenticated API handle read-only; one service can back
/// concurrent query calls, each with its own job reference.
#[derive(Clone)]
pub struct BigQueryService<A> {
    api: A,
    project_id: String,
    dataset: Option<String>,
    poller: JobPoller,
}

impl<A> BigQueryService<A> {
    pub fn new(api: A, project_id: &str) -> Self {
        Self {
            api,
            project_id: project_id.to_string(),
            dataset: None,
            poller: JobPoller::new(),
        }
    }

    /// Sets the default dataset for unqualified table names and for metadata
    /// calls that omit one.
    pub fn with_dataset(mut self, dataset_id: &str) -> Self {
        self.dataset = Some(dataset_id.to_string());
        self
    }

    /// Replaces the poll policy (interval, deadline, progress observer).
    pub fn with_poller(mut self, poller: JobPoller) -> Self {
        self.poller = poller;
        self
    }

    /// Switches the default dataset.
    pub fn use_dataset(&mut self, dataset_id: &str) {
        self.dataset = Some(dataset_id.to_string());
    }

    /// Returns a reference to the underlying API handle (if you need direct
    /// calls).
    pub fn api(&self) -> &A {
        &self.api
    }

    fn dataset_ref(&self, dataset: Option<&str>) -> Result<DatasetReference, BigQueryError> {
        let dataset_id = dataset.or(self.dataset.as_deref()).ok_or_else(|| {
            BigQueryError::Configuration(
                "no dataset specified and no default dataset configured".into(),
            )
        })?;

        Ok(DatasetReference {
            project_id: self.project_id.clone(),
            dataset_id: dataset_id.to_string(),
        })
    }
}

impl<A: JobsApi> BigQueryService<A> {
    /// Executes one query end to end: submit, poll to completion, fetch, and
    /// decode.
    ///
    /// With `options.raw` the service payload is returned unprocessed;
    /// otherwise rows are decoded against the returned schema and assembled
    /// into a [`ResultTable`]. A zero-row result yields an empty table that
    /// still carries its column names.
    pub async fn query(
        &self,
        query: &str,
        options: &QueryOptions,
    ) -> Result<QueryOutcome, BigQueryError> {
        // Fresh id per submission so retried calls never collide.
        let job_id = Uuid::new_v4().to_string();

        let default_dataset = options
            .target_dataset
            .as_deref()
            .or(self.dataset.as_deref())
            .map(|dataset_id| DatasetReference {
                project_id: self.project_id.clone(),
                dataset_id: dataset_id.to_string(),
            });

        let request = JobInsertRequest {
            job_reference: JobReference {
                project_id: self.project_id.clone(),
                job_id,
            },
            configuration: JobConfiguration {
                query: Some(JobConfigurationQuery {
                    query: query.to_string(),
                    priority: "INTERACTIVE".to_string(),
                    default_dataset,
                }),
            },
        };

        tracing::debug!(job_id = %request.job_reference.job_id, "submitting query job");
        let submitted = self.api.insert_job(&self.project_id, &request).await?;
        let job_ref = submitted
            .job_reference
            .ok_or_else(|| BigQueryError::Api("submitted job has no job reference".into()))?;

        self.poller.await_completion(&self.api, &job_ref).await?;

        let raw = self.api.get_query_results(&job_ref).await?;
        if options.raw {
            return Ok(QueryOutcome::Raw(raw));
        }

        let result_schema = raw
            .schema
            .ok_or_else(|| BigQueryError::Schema("query results carry no schema".into()))?;
        let plan = schema::build_decode_plan(&result_schema)?;

        // `rows` is absent entirely on an empty result set.
        let decoded = raw
            .rows
            .unwrap_or_default()
            .iter()
            .map(|row| schema::decode_row(row, &plan))
            .collect::<Result<Vec<_>, _>>()?;

        let table = ResultTable::assemble(decoded, plan.column_names())?;
        Ok(QueryOutcome::Table(table))
    }
}

impl<A: MetadataApi> BigQueryService<A> {
    /// Creates a dataset, then reads it back to confirm it exists.
    pub async fn create_dataset(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<(), BigQueryError> {
        let request = DatasetInsertRequest {
            description: description
                .unwrap_or("Dataset created by bigquery-client")
                .to_string(),
            dataset_reference: DatasetReference {
                project_id: self.project_id.clone(),
                dataset_id: name.to_string(),
            },
        };

        self.api.insert_dataset(&self.project_id, &request).await?;
        self.api.get_dataset(&request.dataset_reference).await
    }

    /// Deletes a dataset. Failures propagate; nothing is suppressed.
    pub async fn delete_dataset(
        &self,
        name: &str,
        delete_contents: bool,
    ) -> Result<(), BigQueryError> {
        let dataset = DatasetReference {
            project_id: self.project_id.clone(),
            dataset_id: name.to_string(),
        };
        self.api.delete_dataset(&dataset, delete_contents).await
    }

    /// Lists every dataset id in the project.
    pub async fn list_datasets(&self) -> Result<Vec<String>, BigQueryError> {
        self.api.list_datasets(&self.project_id).await
    }

    /// Lists table ids in the given dataset, falling back to the configured
    /// default. Fails with `Configuration` when neither is present.
    pub async fn list_tables(
        &self,
        dataset: Option<&str>,
    ) -> Result<Vec<String>, BigQueryError> {
        let dataset = self.dataset_ref(dataset)?;
        self.api.list_tables(&dataset).await
    }

    /// Drops a table from the given dataset (or the configured default).
    pub async fn drop_table(
        &self,
        table_id: &str,
        dataset: Option<&str>,
    ) -> Result<(), BigQueryError> {
        let dataset = self.dataset_ref(dataset)?;
        let table = TableReference {
            project_id: dataset.project_id,
            dataset_id: dataset.dataset_id,
            table_id: table_id.to_string(),
        };
        self.api.delete_table(&table).await
    }

    /// Creates a view defined by the given SQL in the given dataset (or the
    /// configured default).
    pub async fn create_view(
        &self,
        view_id: &str,
        view_query: &str,
        dataset: Option<&str>,
    ) -> Result<(), BigQueryError> {
        let dataset = self.dataset_ref(dataset)?;
        let request = TableInsertRequest {
            table_reference: TableReference {
                project_id: dataset.project_id.clone(),
                dataset_id: dataset.dataset_id.clone(),
                table_id: view_id.to_string(),
            },
            view: Some(ViewDefinition {
                query: view_query.to_string(),
            }),
        };
        self.api.insert_table(&dataset, &request).await
    }

    /// Lists every project this token can see.
    pub async fn list_projects(&self) -> Result<Vec<ProjectInfo>, BigQueryError> {
        self.api.list_projects().await
    }
}
