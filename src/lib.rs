//! Client for the BigQuery v2 REST API.
//!
//! Queries run as asynchronous jobs: [`BigQueryService::query`] submits a job
//! with a fresh client-generated id, polls it to its terminal state, fetches
//! the raw results, and decodes them against the returned schema into a
//! [`ResultTable`]. The decoding ([`schema`]) and polling ([`poller`]) pieces
//! are usable on their own for callers that already hold raw payloads or job
//! references.

pub mod api;
pub mod client;
pub mod models;
pub mod poller;
pub mod schema;
pub mod service;
pub mod table;

pub use api::{JobsApi, MetadataApi};
pub use client::BigQueryRestClient;
pub use models::BigQueryError;
pub use poller::{JobPoller, LogProgress, ProgressObserver};
pub use schema::{build_decode_plan, decode_row, DecodePlan, FieldType, Value};
pub use service::{BigQueryService, QueryOptions, QueryOutcome};
pub use table::ResultTable;
