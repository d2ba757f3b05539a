use crate::core::write_atomic;
use bake_rigbake::{bake_file, BakeConfig, BakeError, BakeMode};
use crossbeam::channel::{unbounded, Receiver, Sender};
use std::any::Any;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{Builder, JoinHandle};
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct BakeJob
{
    pub source: PathBuf,
    pub destination: PathBuf,
}

#[derive(Debug)]
pub enum JobError
{
    Bake(BakeError),
    Encode(assets_rigbake::EncodeError),
    Write(io::Error),
    Panicked(String),
}
impl Error for JobError { }
impl Display for JobError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { Debug::fmt(self, f) }
}

#[derive(Debug)]
pub enum JobOutcome
{
    Written { issues: usize },
    /// Nothing to write, not an error
    Skipped,
    Failed(JobError),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary
{
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
    pub issues: usize,
}
impl BatchSummary
{
    fn record(&mut self, outcome: &JobOutcome)
    {
        match outcome
        {
            JobOutcome::Written { issues } =>
            {
                self.written += 1;
                self.issues += issues;
            }
            JobOutcome::Skipped => self.skipped += 1,
            JobOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Bake, encode and write one file
pub fn run_job(job: &BakeJob, mode: BakeMode, config: &BakeConfig) -> JobOutcome
{
    let start = Instant::now();
    log::info!("Baking {:?}", job.source);

    let output = match bake_file(&job.source, mode, config)
    {
        Ok(o) => o,
        Err(err) => return JobOutcome::Failed(JobError::Bake(err)),
    };
    let Some(asset) = output.asset else
    {
        log::info!("Nothing to write for {:?}", job.source);
        return JobOutcome::Skipped;
    };

    let bytes = match asset.encode()
    {
        Ok(b) => b,
        Err(err) => return JobOutcome::Failed(JobError::Encode(err)),
    };
    if let Err(err) = write_atomic(&job.destination, &bytes)
    {
        return JobOutcome::Failed(JobError::Write(err));
    }

    log::info!("Baked {:?} -> {:?} ({asset}, {} issues, {} bytes) in {:.1?}",
        job.source,
        job.destination,
        output.issues.len(),
        bytes.len(),
        start.elapsed());
    JobOutcome::Written { issues: output.issues.len() }
}

enum WorkerMessage
{
    Job(BakeJob),
    Stop,
}

fn panic_message(payload: &(dyn Any + Send)) -> String
{
    match (payload.downcast_ref::<&str>(), payload.downcast_ref::<String>())
    {
        (Some(s), _) => s.to_string(),
        (_, Some(s)) => s.clone(),
        _ => "<non-string panic>".to_string(),
    }
}

fn spawn_worker<F>(
    index: usize,
    jobs: Receiver<WorkerMessage>,
    results: Sender<(BakeJob, JobOutcome)>,
    bake: Arc<F>) -> io::Result<JoinHandle<()>>
where F: Fn(&BakeJob) -> JobOutcome + Send + Sync + 'static
{
    Builder::new()
        .name(format!("bake-worker-{index}"))
        .spawn(move ||
        {
            log::debug!("Starting bake worker {index}");
            'worker: loop
            {
                match jobs.recv()
                {
                    Ok(WorkerMessage::Job(job)) =>
                    {
                        let outcome = panic::catch_unwind(AssertUnwindSafe(|| bake(&job)))
                            .unwrap_or_else(|payload| JobOutcome::Failed(JobError::Panicked(panic_message(&*payload))));
                        if results.send((job, outcome)).is_err()
                        {
                            break 'worker;
                        }
                    }
                    Ok(WorkerMessage::Stop) | Err(_) => break 'worker,
                }
            }
            log::debug!("Stopping bake worker {index}");
        })
}

/// Run `bake` over every job on `worker_count` threads. A failed or panicking job never stops the others
pub fn run_jobs<F>(jobs: Vec<BakeJob>, worker_count: usize, bake: F) -> io::Result<BatchSummary>
where F: Fn(&BakeJob) -> JobOutcome + Send + Sync + 'static
{
    let worker_count = worker_count.clamp(1, jobs.len().max(1));
    let bake = Arc::new(bake);
    let (job_send, job_recv) = unbounded::<WorkerMessage>();
    let (result_send, result_recv) = unbounded::<(BakeJob, JobOutcome)>();

    let mut workers = Vec::with_capacity(worker_count);
    for i in 0..worker_count
    {
        workers.push(spawn_worker(i, job_recv.clone(), result_send.clone(), bake.clone())?);
    }
    drop(result_send);

    let job_count = jobs.len();
    for job in jobs
    {
        // the receivers live in the workers, which only exit on Stop
        let _ = job_send.send(WorkerMessage::Job(job));
    }
    for _ in 0..worker_count
    {
        let _ = job_send.send(WorkerMessage::Stop);
    }

    let mut summary = BatchSummary::default();
    for (job, outcome) in result_recv.iter().take(job_count)
    {
        if let JobOutcome::Failed(err) = &outcome
        {
            log::error!("Failed to bake {:?}: {err}", job.source);
        }
        summary.record(&outcome);
    }

    for worker in workers
    {
        if worker.join().is_err()
        {
            log::error!("A bake worker panicked outside of a job");
        }
    }
    Ok(summary)
}

pub fn run_batch(jobs: Vec<BakeJob>, mode: BakeMode, config: BakeConfig, worker_count: usize) -> io::Result<BatchSummary>
{
    run_jobs(jobs, worker_count, move |job| run_job(job, mode, &config))
}
