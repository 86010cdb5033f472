//! Transaction submission paths.
//!
//! By default each request fetches its own nonce and broadcasts directly,
//! so concurrent submissions from this process can collide on a nonce and
//! the node rejects one of them. With `serialize_submissions` enabled, one
//! worker task owns nonce fetch, signing and broadcast, and serves
//! requests in arrival order over a channel.

use alloy::primitives::TxHash;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::blockchain::transaction::{ContractCall, TxBuilder};
use crate::blockchain::types::{BlockchainError, BlockchainResult};

const QUEUE_CAPACITY: usize = 256;

struct SubmitJob {
    call: ContractCall,
    reply: oneshot::Sender<BlockchainResult<TxHash>>,
}

/// How signed transactions reach the node.
#[derive(Clone)]
pub struct Submitter {
    inner: Mode,
}

#[derive(Clone)]
enum Mode {
    /// Each caller builds and broadcasts on its own task.
    Direct(TxBuilder),
    /// Calls are handed to the single submission worker.
    Queued(mpsc::Sender<SubmitJob>),
}

impl Submitter {
    /// Submit directly from the calling task.
    pub fn direct(builder: TxBuilder) -> Self {
        Self {
            inner: Mode::Direct(builder),
        }
    }

    /// Spawn the submission worker and return a handle feeding it.
    ///
    /// The worker stops when `shutdown` fires or every handle is dropped.
    pub fn spawn_queued(builder: TxBuilder, mut shutdown: broadcast::Receiver<()>) -> Self {
        let (tx, mut rx) = mpsc::channel::<SubmitJob>(QUEUE_CAPACITY);

        tokio::spawn(async move {
            tracing::info!("Submission worker started");
            loop {
                tokio::select! {
                    job = rx.recv() => {
                        let Some(job) = job else { break };
                        let result = builder.send(job.call).await;
                        // Caller may have gone away; the transaction is out either way
                        let _ = job.reply.send(result);
                    }
                    _ = shutdown.recv() => break,
                }
            }
            tracing::info!("Submission worker stopped");
        });

        Self {
            inner: Mode::Queued(tx),
        }
    }

    /// Whether submissions go through the single worker.
    pub fn is_serialized(&self) -> bool {
        matches!(self.inner, Mode::Queued(_))
    }

    /// Build, sign and broadcast `call`, returning the transaction hash.
    pub async fn submit(&self, call: ContractCall) -> BlockchainResult<TxHash> {
        match &self.inner {
            Mode::Direct(builder) => builder.send(call).await,
            Mode::Queued(queue) => {
                let (reply, response) = oneshot::channel();
                queue
                    .send(SubmitJob { call, reply })
                    .await
                    .map_err(|_| BlockchainError::SubmissionQueueClosed)?;
                response
                    .await
                    .map_err(|_| BlockchainError::SubmissionQueueClosed)?
            }
        }
    }
}

impl std::fmt::Debug for Submitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Submitter")
            .field("serialized", &self.is_serialized())
            .finish()
    }
}
