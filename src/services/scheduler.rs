use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::clock::Clock;
use crate::config::Config;
use crate::db::job_run_queries;
use crate::errors::AppError;
use crate::external::market_data_provider::MarketDataProvider;
use crate::external::prediction_port::PredictionModel;
use crate::external::scraper::ScraperClient;
use crate::jobs::{market_data_job, recommendation_job, sentiment_job};

/// Collaborators every job closure needs, handed in at construction rather
/// than reached for as globals — the same seam the teacher's
/// `JobContext` gives its jobs, generalized to this crate's three ports.
#[derive(Clone)]
pub struct JobContext {
    pub pool: Arc<PgPool>,
    pub market_data_provider: Arc<dyn MarketDataProvider>,
    pub scraper_client: Arc<ScraperClient>,
    pub prediction_model: Arc<dyn PredictionModel>,
    pub config: Arc<Config>,
    pub clock: Arc<dyn Clock>,
}

/// Registers the market-data (`:00`), sentiment (`:05`), and recommendation
/// (`:10`) triggers and owns the scheduler's lifecycle. Each trigger carries
/// its own in-flight guard so a slot that is still running when its next
/// tick arrives is skipped rather than run concurrently with itself — the
/// `max_instances=1` / missed-fire-coalescing contract.
pub struct Scheduler {
    inner: JobScheduler,
}

impl Scheduler {
    pub async fn new(context: JobContext) -> Result<Self, AppError> {
        let inner = JobScheduler::new()
            .await
            .map_err(|e| AppError::SchedulerError(e.to_string()))?;

        let scheduler = Self { inner };
        scheduler.register(&context).await?;
        Ok(scheduler)
    }

    async fn register(&self, context: &JobContext) -> Result<(), AppError> {
        self.add_slot("0 0 * * * *", "market_data", context.clone(), |ctx| async move {
            market_data_job::run(
                ctx.pool.as_ref(),
                ctx.market_data_provider.as_ref(),
                ctx.config.as_ref(),
                ctx.clock.as_ref(),
            )
            .await
            .map(|s| (s.succeeded as i32, s.failed as i32))
        })
        .await?;

        self.add_slot("0 5 * * * *", "sentiment", context.clone(), |ctx| async move {
            sentiment_job::run(
                ctx.pool.as_ref(),
                ctx.scraper_client.as_ref(),
                ctx.config.as_ref(),
                ctx.clock.as_ref(),
            )
            .await
            .map(|s| (s.aggregate_writes as i32, 0))
        })
        .await?;

        self.add_slot(
            "0 10 * * * *",
            "recommendation",
            context.clone(),
            |ctx| async move {
                recommendation_job::run(
                    ctx.pool.as_ref(),
                    ctx.prediction_model.as_ref(),
                    ctx.config.as_ref(),
                    ctx.clock.as_ref(),
                )
                .await
                .map(|s| (s.recommendations_persisted as i32, 0))
            },
        )
        .await?;

        Ok(())
    }

    /// Registers one cron slot. `job_fn` returns `(items_processed,
    /// items_failed)` on success; the wrapper records a `job_runs` row
    /// around every invocation and guards against overlap with an
    /// in-flight run of the same slot.
    async fn add_slot<F, Fut>(
        &self,
        cron_expr: &str,
        job_name: &'static str,
        context: JobContext,
        job_fn: F,
    ) -> Result<(), AppError>
    where
        F: Fn(JobContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(i32, i32), AppError>> + Send + 'static,
    {
        let in_flight = Arc::new(AtomicBool::new(false));
        let job_fn = Arc::new(job_fn);

        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let context = context.clone();
            let job_fn = job_fn.clone();
            let in_flight = in_flight.clone();

            Box::pin(async move {
                if in_flight
                    .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                    .is_err()
                {
                    warn!(job = job_name, "previous run still in flight, skipping this slot");
                    return;
                }

                run_with_tracking(job_name, context, job_fn).await;
                in_flight.store(false, Ordering::SeqCst);
            })
        })
        .map_err(|e| AppError::SchedulerError(format!("failed to build job {job_name}: {e}")))?;

        self.inner
            .add(job)
            .await
            .map_err(|e| AppError::SchedulerError(format!("failed to register job {job_name}: {e}")))?;

        info!(job = job_name, cron = cron_expr, "scheduled");
        Ok(())
    }

    pub async fn start(&self) -> Result<(), AppError> {
        self.inner
            .start()
            .await
            .map_err(|e| AppError::SchedulerError(e.to_string()))
    }

    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.inner
            .shutdown()
            .await
            .map_err(|e| AppError::SchedulerError(e.to_string()))
    }
}

async fn run_with_tracking<F, Fut>(job_name: &'static str, context: JobContext, job_fn: Arc<F>)
where
    F: Fn(JobContext) -> Fut,
    Fut: Future<Output = Result<(i32, i32), AppError>>,
{
    let pool = context.pool.as_ref();
    let started_at = Utc::now();

    let job_id = match job_run_queries::record_start(pool, job_name).await {
        Ok(id) => id,
        Err(e) => {
            error!(job = job_name, error = %e, "failed to record job start, running anyway");
            -1
        }
    };

    let result = job_fn(context.clone()).await;
    let duration_ms = (Utc::now() - started_at).num_milliseconds();

    match result {
        Ok((processed, failed)) => {
            info!(job = job_name, processed, failed, duration_ms, "job run complete");
            if job_id >= 0 {
                if let Err(e) =
                    job_run_queries::record_success(pool, job_id, processed, failed, duration_ms).await
                {
                    error!(job = job_name, error = %e, "failed to record job success");
                }
            }
        }
        Err(e) => {
            error!(job = job_name, error = %e, duration_ms, "job aborted");
            if job_id >= 0 {
                if let Err(record_err) =
                    job_run_queries::record_failure(pool, job_id, &e.to_string(), duration_ms).await
                {
                    error!(job = job_name, error = %record_err, "failed to record job failure");
                }
            }
        }
    }
}
