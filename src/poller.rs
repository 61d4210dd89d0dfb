use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::api::JobsApi;
use crate::models::{BigQueryError, JobReference};

/// Receives progress notifications from the poll loop. Injectable so callers
/// can surface progress however they like; the default reports through
/// `tracing`.
pub trait ProgressObserver: Send + Sync {
    fn waiting(&self) {}
    fn complete(&self) {}
}

#[derive(Debug, Default)]
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn waiting(&self) {
        tracing::info!("waiting for job to finish");
    }

    fn complete(&self) {
        tracing::info!("job complete");
    }
}

/// Drives a submitted job to its terminal state by repeated status queries,
/// sleeping a fixed interval between attempts.
///
/// Without a deadline the loop polls indefinitely; against a stuck service it
/// will wait forever. Callers wanting a bound set one with
/// [`JobPoller::with_deadline`], which turns an overrun into
/// [`BigQueryError::Cancelled`].
#[derive(Clone)]
pub struct JobPoller {
    interval: Duration,
    deadline: Option<Duration>,
    observer: Arc<dyn ProgressObserver>,
}

impl Default for JobPoller {
    fn default() -> Self {
        Self::new()
    }
}

impl JobPoller {
    pub fn new() -> Self {
        Self {
            interval: Duration::from_secs(1),
            deadline: None,
            observer: Arc::new(LogProgress),
        }
    }

    /// Sleep this long between status checks. Defaults to one second.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Give up once the job has been non-terminal for this long.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Polls until the job reaches DONE.
    ///
    /// DONE with an error payload fails with `JobExecution` carrying the
    /// service's detail. Transport failures while querying status are not
    /// retried here and abort the loop immediately; the client applies its
    /// own bounded retry underneath.
    pub async fn await_completion(
        &self,
        api: &impl JobsApi,
        job: &JobReference,
    ) -> Result<(), BigQueryError> {
        let started = Instant::now();

        loop {
            let polled = api.get_job(job).await?;
            let status = polled
                .status
                .ok_or_else(|| BigQueryError::Api("job response has no status".into()))?;

            if status.is_done() {
                if let Some(detail) = status.error_result {
                    return Err(BigQueryError::JobExecution(detail));
                }
                self.observer.complete();
                return Ok(());
            }

            self.observer.waiting();

            if let Some(deadline) = self.deadline {
                if started.elapsed() >= deadline {
                    return Err(BigQueryError::Cancelled(format!(
                        "job {} still {} after {:.1}s",
                        job.job_id,
                        status.state,
                        deadline.as_secs_f64()
                    )));
                }
            }

            tokio::time::sleep(self.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::models::{
        ErrorProto, Job, JobInsertRequest, JobStatus, QueryResultsResponse,
    };

    /// JobsApi stub that replays a scripted sequence of poll outcomes.
    struct ScriptedJobs {
        polls: Mutex<VecDeque<Result<JobStatus, String>>>,
    }

    impl ScriptedJobs {
        fn new(polls: Vec<Result<JobStatus, String>>) -> Self {
            Self {
                polls: Mutex::new(polls.into()),
            }
        }
    }

    impl JobsApi for ScriptedJobs {
        async fn insert_job(
            &self,
            _project_id: &str,
            _request: &JobInsertRequest,
        ) -> Result<Job, BigQueryError> {
            panic!("poller never submits jobs")
        }

        async fn get_job(&self, job: &JobReference) -> Result<Job, BigQueryError> {
            let next = self
                .polls
                .lock()
                .unwrap()
                .pop_front()
                .expect("poll script exhausted");
            match next {
                Ok(status) => Ok(Job {
                    job_reference: Some(job.clone()),
                    status: Some(status),
                }),
                Err(message) => Err(BigQueryError::Api(message)),
            }
        }

        async fn get_query_results(
            &self,
            _job: &JobReference,
        ) -> Result<QueryResultsResponse, BigQueryError> {
            panic!("poller never fetches results")
        }
    }

    #[derive(Default)]
    struct CountingObserver {
        waits: AtomicUsize,
        completions: AtomicUsize,
    }

    impl ProgressObserver for CountingObserver {
        fn waiting(&self) {
            self.waits.fetch_add(1, Ordering::SeqCst);
        }

        fn complete(&self) {
            self.completions.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn running() -> Result<JobStatus, String> {
        Ok(JobStatus {
            state: "RUNNING".into(),
            error_result: None,
        })
    }

    fn done() -> Result<JobStatus, String> {
        Ok(JobStatus {
            state: "DONE".into(),
            error_result: None,
        })
    }

    fn job() -> JobReference {
        JobReference {
            project_id: "p".into(),
            job_id: "j".into(),
        }
    }

    #[tokio::test]
    async fn waits_until_done() {
        let api = ScriptedJobs::new(vec![running(), running(), done()]);
        let observer = Arc::new(CountingObserver::default());
        let poller = JobPoller::new()
            .with_interval(Duration::ZERO)
            .with_observer(observer.clone());

        poller.await_completion(&api, &job()).await.unwrap();

        assert_eq!(observer.waits.load(Ordering::SeqCst), 2);
        assert_eq!(observer.completions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_job_surfaces_service_detail_without_waiting() {
        let api = ScriptedJobs::new(vec![Ok(JobStatus {
            state: "DONE".into(),
            error_result: Some(ErrorProto {
                reason: Some("quotaExceeded".into()),
                message: Some("quota exceeded".into()),
                location: None,
            }),
        })]);
        let observer = Arc::new(CountingObserver::default());
        let poller = JobPoller::new()
            .with_interval(Duration::ZERO)
            .with_observer(observer.clone());

        let err = poller.await_completion(&api, &job()).await.unwrap_err();
        match err {
            BigQueryError::JobExecution(detail) => {
                assert_eq!(detail.message.as_deref(), Some("quota exceeded"));
            }
            other => panic!("expected JobExecution, got {other:?}"),
        }
        assert_eq!(observer.waits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn status_fetch_failure_aborts_the_loop() {
        let api = ScriptedJobs::new(vec![running(), Err("connection reset".into())]);
        let poller = JobPoller::new().with_interval(Duration::ZERO);

        let err = poller.await_completion(&api, &job()).await.unwrap_err();
        assert!(matches!(err, BigQueryError::Api(msg) if msg == "connection reset"));
    }

    #[tokio::test]
    async fn deadline_turns_into_cancelled() {
        let api = ScriptedJobs::new(vec![running(), running()]);
        let poller = JobPoller::new()
            .with_interval(Duration::ZERO)
            .with_deadline(Duration::ZERO);

        let err = poller.await_completion(&api, &job()).await.unwrap_err();
        assert!(matches!(err, BigQueryError::Cancelled(_)));
    }
}
