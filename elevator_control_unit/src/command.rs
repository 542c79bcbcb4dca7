//! Cross-thread setpoint requests.
//!
//! Any thread may hold a [`SetpointSender`]; the loop thread owns the
//! matching [`SetpointReceiver`] and drains a bounded batch without blocking
//! before each tick. A deferred request carries a height source that is
//! evaluated once, on the loop thread, at the moment the request is applied.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use thiserror::Error;

/// Height source evaluated when a deferred request is applied.
pub type HeightSource = Box<dyn FnOnce() -> f64 + Send>;

/// A queued "set target height" request.
pub enum HeightRequest {
    /// Fixed height, known when the request is sent.
    Fixed(f64),
    /// Height read from a source when the loop applies the request.
    Deferred(HeightSource),
}

impl HeightRequest {
    /// Produce the requested height, consuming the request.
    ///
    /// `None` if a deferred source panicked. The panic is contained so the
    /// loop thread keeps running; under `panic = "abort"` it still aborts.
    pub fn resolve(self) -> Option<f64> {
        match self {
            Self::Fixed(height) => Some(height),
            Self::Deferred(source) => panic::catch_unwind(AssertUnwindSafe(source)).ok(),
        }
    }
}

impl fmt::Debug for HeightRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(height) => f.debug_tuple("Fixed").field(height).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// Error returned when the loop side of the channel is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("setpoint receiver disconnected")]
pub struct Disconnected;

/// Sending half, cloneable across threads.
#[derive(Debug, Clone)]
pub struct SetpointSender {
    tx: Sender<HeightRequest>,
}

impl SetpointSender {
    /// Queue a fixed target height.
    pub fn set_height(&self, height: f64) -> Result<(), Disconnected> {
        self.send(HeightRequest::Fixed(height))
    }

    /// Queue a height read from `source` when the request is applied.
    ///
    /// `source` runs on the loop thread and should return promptly. A panic
    /// drops the request; with the release profile's `panic = "abort"` it
    /// aborts the process instead.
    pub fn set_height_from<F>(&self, source: F) -> Result<(), Disconnected>
    where
        F: FnOnce() -> f64 + Send + 'static,
    {
        self.send(HeightRequest::Deferred(Box::new(source)))
    }

    /// Queue a prepared request.
    pub fn send(&self, request: HeightRequest) -> Result<(), Disconnected> {
        self.tx.send(request).map_err(|_| Disconnected)
    }
}

/// Receiving half, owned by the loop thread.
#[derive(Debug)]
pub struct SetpointReceiver {
    rx: Receiver<HeightRequest>,
}

impl SetpointReceiver {
    /// Take the next pending request, if any. Never blocks.
    pub fn try_next(&self) -> Option<HeightRequest> {
        match self.rx.try_recv() {
            Ok(request) => Some(request),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Iterate over at most `max` queued requests, in send order.
    ///
    /// Anything beyond `max` stays queued for the next call.
    pub fn drain(&self, max: usize) -> impl Iterator<Item = HeightRequest> + '_ {
        self.rx.try_iter().take(max)
    }
}

/// Create a connected sender/receiver pair.
pub fn setpoint_channel() -> (SetpointSender, SetpointReceiver) {
    let (tx, rx) = mpsc::channel();
    (SetpointSender { tx }, SetpointReceiver { rx })
}
