//! Background probes keyed by buffer revision.
//!
//! A probe is a piece of blocking work (a subprocess call, a scan of a text
//! snapshot) started on behalf of a view. Each [`ProbeKind`] has at most one
//! live task: starting a new probe aborts the previous one and bumps the
//! kind's generation. Results come back over an mpsc channel tagged with the
//! generation and the buffer revision they were computed against; the
//! consumer applies a result only when both are still current.

use std::collections::HashMap;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeKind {
    /// Same-identifier highlight refresh.
    Highlight,
    /// Lint / vet diagnostics.
    Lint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeTicket {
    pub kind: ProbeKind,
    pub generation: u64,
    pub revision: u64,
}

#[derive(Debug)]
pub struct ProbeResult<T> {
    pub ticket: ProbeTicket,
    pub payload: T,
}

pub struct ProbeScheduler<T> {
    handle: Handle,
    tx: UnboundedSender<ProbeResult<T>>,
    rx: UnboundedReceiver<ProbeResult<T>>,
    generations: HashMap<ProbeKind, u64>,
    running: HashMap<ProbeKind, JoinHandle<()>>,
    discarded: u64,
}

impl<T: Send + 'static> ProbeScheduler<T> {
    pub fn new(handle: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            handle,
            tx,
            rx,
            generations: HashMap::new(),
            running: HashMap::new(),
            discarded: 0,
        }
    }

    /// Start `work` for `kind`, superseding any probe of the same kind.
    pub fn spawn<F>(&mut self, kind: ProbeKind, revision: u64, work: F) -> ProbeTicket
    where
        F: FnOnce() -> T + Send + 'static,
    {
        if let Some(prev) = self.running.remove(&kind) {
            prev.abort();
            trace!(target: "events.probe", ?kind, "probe_superseded");
        }
        let generation = self.generations.entry(kind).or_insert(0);
        *generation += 1;
        let ticket = ProbeTicket {
            kind,
            generation: *generation,
            revision,
        };
        let tx = self.tx.clone();
        let task = self.handle.spawn(async move {
            match tokio::task::spawn_blocking(work).await {
                Ok(payload) => {
                    let _ = tx.send(ProbeResult { ticket, payload });
                }
                Err(err) if err.is_cancelled() => {}
                Err(err) => warn!(target: "events.probe", ?kind, %err, "probe_task_failed"),
            }
        });
        self.running.insert(kind, task);
        debug!(target: "events.probe", ?kind, generation = ticket.generation, revision, "probe_spawned");
        ticket
    }

    /// Current generation of `kind` (0 when never spawned).
    pub fn generation(&self, kind: ProbeKind) -> u64 {
        self.generations.get(&kind).copied().unwrap_or(0)
    }

    pub fn is_current(&self, ticket: &ProbeTicket, revision: u64) -> bool {
        ticket.generation == self.generation(ticket.kind) && ticket.revision == revision
    }

    /// Payload of `result` if it still applies to a buffer at `revision`.
    pub fn accept(&mut self, result: ProbeResult<T>, revision: u64) -> Option<T> {
        let ticket = result.ticket;
        if ticket.generation == self.generation(ticket.kind) {
            // the live task for this kind has delivered
            self.running.remove(&ticket.kind);
        }
        if ticket.revision == revision && ticket.generation == self.generation(ticket.kind) {
            return Some(result.payload);
        }
        self.discarded += 1;
        debug!(target: "events.probe", kind = ?result.ticket.kind, generation = result.ticket.generation, result_revision = result.ticket.revision, revision, "probe_result_stale");
        None
    }

    /// Non-blocking poll for a finished probe.
    pub fn try_next(&mut self) -> Option<ProbeResult<T>> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next finished probe.
    pub async fn next(&mut self) -> Option<ProbeResult<T>> {
        self.rx.recv().await
    }

    pub fn pending(&self) -> usize {
        self.running.len()
    }

    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Abort every live probe.
    pub fn shutdown(&mut self) {
        for (_, task) in self.running.drain() {
            task.abort();
        }
    }
}

impl<T> Drop for ProbeScheduler<T> {
    fn drop(&mut self) {
        for (_, task) in self.running.drain() {
            task.abort();
        }
    }
}
