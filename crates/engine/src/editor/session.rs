//! Serialized mutation queue shared by every editing surface.
//!
//! The session task owns the current revision. Surfaces submit operations through a
//! cloneable [`SessionHandle`]; requests are applied one at a time in arrival order and
//! every accepted change is broadcast to subscribers.

use std::sync::Arc;

use thiserror::Error;
use tokio::{
    sync::{broadcast, mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, info};

use crate::{
    config::EngineConfig,
    editor::{operation::EditOperation, reducer::apply_with, state::EditorState},
    error::{DanglingReference, EditError},
};

const REQUEST_CAPACITY: usize = 64;
const REVISION_CAPACITY: usize = 64;

/// A numbered revision of the editing state.
#[derive(Debug, Clone, PartialEq)]
pub struct Revision {
    /// Starts at 0 and increases by one per accepted change.
    pub number: u64,
    pub state: EditorState,
    /// Warnings raised by the operation that produced this revision.
    pub warnings: Vec<DanglingReference>,
}

/// Errors surfaced by [`SessionHandle`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The session task has stopped.
    #[error("editing session is closed")]
    Closed,
    #[error(transparent)]
    Edit(#[from] EditError),
}

#[derive(Debug)]
enum Request {
    Apply {
        operation: EditOperation,
        reply: oneshot::Sender<Result<Arc<Revision>, EditError>>,
    },
    Snapshot {
        reply: oneshot::Sender<Arc<Revision>>,
    },
}

/// Cloneable entry point into a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    requests: mpsc::Sender<Request>,
    revisions: broadcast::Sender<Arc<Revision>>,
}

impl SessionHandle {
    /// Starts the session task. It stops once every handle has been dropped.
    pub fn spawn(state: EditorState, config: EngineConfig) -> (Self, JoinHandle<()>) {
        let (requests, receiver) = mpsc::channel(REQUEST_CAPACITY);
        let (revisions, _) = broadcast::channel(REVISION_CAPACITY);
        let initial = Arc::new(Revision {
            number: 0,
            state,
            warnings: Vec::new(),
        });

        let task = tokio::spawn(run_session(initial, config, receiver, revisions.clone()));
        (Self { requests, revisions }, task)
    }

    /// Applies an operation after every previously submitted one.
    ///
    /// Returns the resulting revision; a no-op returns the current revision number.
    pub async fn submit(&self, operation: EditOperation) -> Result<Arc<Revision>, SessionError> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(Request::Apply { operation, reply })
            .await
            .map_err(|_| SessionError::Closed)?;
        let outcome = response.await.map_err(|_| SessionError::Closed)?;
        Ok(outcome?)
    }

    /// Current revision.
    pub async fn snapshot(&self) -> Result<Arc<Revision>, SessionError> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(Request::Snapshot { reply })
            .await
            .map_err(|_| SessionError::Closed)?;
        response.await.map_err(|_| SessionError::Closed)
    }

    /// Receives every revision accepted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Revision>> {
        self.revisions.subscribe()
    }
}

async fn run_session(
    mut current: Arc<Revision>,
    config: EngineConfig,
    mut requests: mpsc::Receiver<Request>,
    revisions: broadcast::Sender<Arc<Revision>>,
) {
    debug!("editing session started");
    while let Some(request) = requests.recv().await {
        match request {
            Request::Apply { operation, reply } => {
                let result = apply_with(&config, &current.state, operation).map(|outcome| {
                    let revision = Arc::new(Revision {
                        number: current.number + u64::from(outcome.changed),
                        state: outcome.state,
                        warnings: outcome.warnings,
                    });
                    if outcome.changed {
                        current = Arc::clone(&revision);
                        let _ = revisions.send(Arc::clone(&revision));
                    }
                    revision
                });
                if reply.send(result).is_err() {
                    debug!("submitter dropped before the edit completed");
                }
            }
            Request::Snapshot { reply } => {
                let _ = reply.send(Arc::clone(&current));
            }
        }
    }
    info!(revision = current.number, "editing session closed");
}
