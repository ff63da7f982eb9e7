//! The event channel between the background worker and the UI.
//!
//! Exactly one producer (the job worker) and one consumer (the egui update
//! loop).  The channel is unbounded: [`EventSender::push`] never blocks and
//! never fails visibly — event volume is progress ticks and segment strings,
//! not raw audio.  The consumer polls with [`EventReceiver::drain_all`],
//! which never blocks either.
//!
//! Ordering invariant: for any two events `e1` pushed before `e2`,
//! `drain_all` never yields `e2` before `e1` (`std::sync::mpsc` is FIFO per
//! sender).

use std::sync::mpsc;

use crate::transcript::Transcript;

// ---------------------------------------------------------------------------
// JobEvent
// ---------------------------------------------------------------------------

/// A discrete notification produced by the worker and consumed by the UI
/// poll loop.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    /// Replace the status line text.
    Status(String),
    /// Set the progress bar to this percentage (clamped to 0–100 by the
    /// consumer).
    Progress(u8),
    /// Append a transcribed segment to the text area.
    Segment(String),
    /// Terminal: the job finished; controls are re-enabled and the
    /// transcript stored.
    Completed(Transcript),
    /// Terminal: the job failed; controls are re-enabled, the text area is
    /// left untouched.
    Failed(String),
}

impl JobEvent {
    /// `true` for the two events that end a job.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobEvent::Completed(_) | JobEvent::Failed(_))
    }
}

// ---------------------------------------------------------------------------
// Channel endpoints
// ---------------------------------------------------------------------------

/// Producer endpoint, cloned into each worker.
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::Sender<JobEvent>,
}

impl EventSender {
    /// Enqueue an event.  Never blocks; if the UI has shut down and the
    /// receiver is gone the event is silently discarded.
    pub fn push(&self, event: JobEvent) {
        let _ = self.tx.send(event);
    }
}

/// Consumer endpoint, owned by the UI.
pub struct EventReceiver {
    rx: mpsc::Receiver<JobEvent>,
}

impl EventReceiver {
    /// Return all currently buffered events in FIFO order, or an empty
    /// vector when none are pending.  Never blocks.
    pub fn drain_all(&self) -> Vec<JobEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            drained.push(event);
        }
        drained
    }
}

/// Create a connected sender/receiver pair.
pub fn event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::channel();
    (EventSender { tx }, EventReceiver { rx })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
