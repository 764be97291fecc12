//! Bounded parallel chunk dispatch.
//!
//! All chunk tasks are queued up front and driven by at most `parallelism`
//! concurrent workers. Each task gets its own retry loop; every attempt
//! re-checks the access token, reads its range with an independent file
//! handle and sends it. Outcomes are collected after the queue drains and
//! folded into one result, so a single chunk that exhausts its attempts
//! fails the whole upload.
//!
//! The scheduler stops starting new attempts once any chunk fails
//! terminally, the caller cancels, or the progress callback returns `false`.
//! Attempts already in flight run to completion.

use std::path::Path;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use super::chunk::{read_chunk, ChunkTask};
use super::session::UploadSession;
use crate::api::{ChunkAck, DriveApi, DriveItem};
use crate::auth::CredentialManager;
use crate::cancel::CancelToken;
use crate::error::{Result, UploadError};
use crate::progress::{ProgressCallback, TransferProgress};
use crate::retry::RetryPolicy;

/// Final state of one chunk task.
#[derive(Debug)]
pub struct ChunkOutcome {
    pub task: ChunkTask,
    /// Attempts consumed, zero if the task never started.
    pub attempts: u32,
    /// Last error when the chunk did not make it.
    pub error: Option<UploadError>,
}

impl ChunkOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything the workers produced for one upload.
#[derive(Debug)]
pub struct DispatchReport {
    /// Outcomes ordered by start offset.
    pub outcomes: Vec<ChunkOutcome>,
    /// Item record from the completing chunk, when the service sent one.
    pub completed: Option<DriveItem>,
}

impl DispatchReport {
    /// Fold the outcomes into the upload result.
    ///
    /// Precedence: an unexpected error (for example `Auth`) is returned
    /// as-is, then chunk failures as `ChunksFailed`, then `Cancelled`.
    pub fn into_result(self) -> Result<Option<DriveItem>> {
        let total = self.outcomes.len();
        let mut unexpected = None;
        let mut first_failure: Option<UploadError> = None;
        let mut failed = 0;
        let mut cancelled = false;

        for outcome in self.outcomes {
            match outcome.error {
                None => {}
                Some(UploadError::Cancelled) => cancelled = true,
                Some(err) if err.is_chunk_failure() => {
                    failed += 1;
                    first_failure.get_or_insert(err);
                }
                Some(err) => {
                    unexpected.get_or_insert(err);
                }
            }
        }

        if let Some(err) = unexpected {
            return Err(err);
        }
        if let Some(first) = first_failure {
            return Err(UploadError::ChunksFailed {
                failed,
                total,
                detail: first.to_string(),
            });
        }
        if cancelled {
            return Err(UploadError::Cancelled);
        }
        Ok(self.completed)
    }
}

/// Drives chunk tasks through a bounded worker pool.
pub struct ChunkScheduler<'a> {
    api: &'a dyn DriveApi,
    credentials: &'a CredentialManager,
    policy: RetryPolicy,
    parallelism: usize,
}

impl<'a> ChunkScheduler<'a> {
    pub fn new(
        api: &'a dyn DriveApi,
        credentials: &'a CredentialManager,
        policy: RetryPolicy,
        parallelism: usize,
    ) -> Self {
        Self {
            api,
            credentials,
            policy,
            parallelism: parallelism.max(1),
        }
    }

    /// Upload every task of `source` into `session`.
    pub async fn dispatch(
        &self,
        source: &Path,
        session: &UploadSession,
        tasks: Vec<ChunkTask>,
        cancel: &CancelToken,
        mut progress: Option<&mut ProgressCallback>,
    ) -> DispatchReport {
        let halt = cancel.child();
        let chunks_total = tasks.len();
        let filename = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        debug!(
            "dispatching {} chunks with {} workers",
            chunks_total, self.parallelism
        );

        let worker_halt = halt.clone();
        let mut results = stream::iter(tasks)
            .map(move |task| {
                let halt = worker_halt.clone();
                async move {
                    let label = label_of(task);
                    let attempted = self
                        .policy
                        .run(&label, &halt, move |attempt| async move {
                            debug!("chunk {}-{} attempt {}", task.start, task.end, attempt);
                            self.send_chunk(source, session, task).await
                        })
                        .await;
                    (task, attempted)
                }
            })
            .buffer_unordered(self.parallelism);

        let mut outcomes = Vec::with_capacity(chunks_total);
        let mut completed = None;
        let mut bytes_done = 0u64;
        let mut chunks_done = 0usize;

        while let Some((task, attempted)) = results.next().await {
            let error = match attempted.result {
                Ok(ack) => {
                    bytes_done += task.len();
                    chunks_done += 1;
                    if let ChunkAck::Completed(item) = ack {
                        completed = item;
                    }

                    if let Some(callback) = progress.as_deref_mut() {
                        let report = TransferProgress::new(
                            bytes_done,
                            session.size,
                            chunks_done,
                            chunks_total,
                            filename.as_str(),
                        );
                        if !callback(&report) {
                            warn!("upload cancelled by progress callback");
                            halt.cancel();
                        }
                    }
                    None
                }
                Err(UploadError::Cancelled) => Some(UploadError::Cancelled),
                Err(err) => {
                    warn!(
                        "{} failed terminally after {} attempts: {}",
                        label_of(task),
                        attempted.attempts,
                        err
                    );
                    halt.cancel();
                    Some(err)
                }
            };

            outcomes.push(ChunkOutcome {
                task,
                attempts: attempted.attempts,
                error,
            });
        }

        outcomes.sort_by_key(|o| o.task.start);
        DispatchReport {
            outcomes,
            completed,
        }
    }

    /// One attempt: refresh the token if needed, read the range, send it.
    async fn send_chunk(
        &self,
        source: &Path,
        session: &UploadSession,
        task: ChunkTask,
    ) -> Result<ChunkAck> {
        self.credentials.ensure_valid().await?;
        let data = read_chunk(source, task).await?;
        self.api
            .upload_chunk(&session.upload_url, task.content_range(session.size), data)
            .await
    }
}

fn label_of(task: ChunkTask) -> String {
    format!("chunk {}-{}", task.start, task.end)
}
