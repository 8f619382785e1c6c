//! Fixed-size worker pool running render jobs.
//!
//! Jobs are handed to workers over a bounded crossbeam channel; `submit`
//! blocks once `queue_capacity` jobs are waiting. Each job runs start to
//! finish on one worker thread.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use beatcut_common::{BeatcutError, BeatcutResult, RenderError, RenderStage, WorkerConfig};
use beatcut_project_model::{RenderJob, RenderOutput};
use crossbeam_channel::{bounded, Receiver, Sender};
use uuid::Uuid;

use crate::cancel::CancellationToken;
use crate::renderer::Renderer;

type JobResult = Result<RenderOutput, RenderError>;

struct Task {
    job: RenderJob,
    cancel: CancellationToken,
    reply: Sender<JobResult>,
}

/// Handle to a submitted job.
pub struct JobHandle {
    pub id: Uuid,
    cancel: CancellationToken,
    result: Receiver<JobResult>,
}

impl JobHandle {
    /// Ask the job to stop at its next stage boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Block until the job finishes.
    pub fn wait(self) -> JobResult {
        self.result.recv().unwrap_or_else(|_| {
            Err(RenderError::new(
                RenderStage::Cleanup,
                "worker exited without reporting a result",
            ))
        })
    }
}

pub struct RenderPool {
    sender: Option<Sender<Task>>,
    workers: Vec<JoinHandle<()>>,
}

impl RenderPool {
    /// Start `config.threads` workers sharing `renderer`.
    pub fn new(renderer: Arc<Renderer>, config: &WorkerConfig) -> BeatcutResult<Self> {
        let threads = config.threads.max(1);
        let (sender, receiver) = bounded::<Task>(config.queue_capacity.max(1));

        let mut workers = Vec::with_capacity(threads);
        for index in 0..threads {
            let receiver = receiver.clone();
            let renderer = Arc::clone(&renderer);
            let handle = thread::Builder::new()
                .name(format!("beatcut-render-{index}"))
                .spawn(move || worker_loop(index, &renderer, &receiver))?;
            workers.push(handle);
        }
        tracing::info!(threads, queue_capacity = config.queue_capacity, "Render pool started");

        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    /// Queue `job`. Blocks while the queue is full.
    pub fn submit(&self, job: RenderJob) -> BeatcutResult<JobHandle> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| BeatcutError::unsupported("render pool is shut down"))?;
        let (reply, result) = bounded(1);
        let cancel = CancellationToken::new();
        let id = job.id;
        sender
            .send(Task {
                job,
                cancel: cancel.clone(),
                reply,
            })
            .map_err(|_| BeatcutError::unsupported("render pool has no running workers"))?;
        tracing::debug!(job_id = %id, "Job queued");
        Ok(JobHandle { id, cancel, result })
    }

    /// Stop accepting jobs, finish the queued ones and join the workers.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.sender.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                tracing::error!("Render worker panicked");
            }
        }
    }
}

impl Drop for RenderPool {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(index: usize, renderer: &Renderer, tasks: &Receiver<Task>) {
    tracing::debug!(worker = index, "Render worker started");
    for task in tasks.iter() {
        let job_id = task.job.id;
        let result = catch_unwind(AssertUnwindSafe(|| renderer.run(&task.job, &task.cancel)))
            .unwrap_or_else(|_| {
                tracing::error!(worker = index, job_id = %job_id, "Render job panicked");
                Err(RenderError::new(RenderStage::Cleanup, "render job panicked"))
            });
        // The submitter may have dropped its handle.
        let _ = task.reply.send(result);
    }
    tracing::debug!(worker = index, "Render worker stopped");
}
