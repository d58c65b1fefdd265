//! Affinity dispatcher — funnel work onto one owning thread.
//!
//! `affinity_channel` is called on the thread that owns some state (the
//! display thread). It returns a cloneable `AffinityDispatcher` that any
//! thread may use, and the `OwnerLoop` that the owning thread drains.
//!
//! `run` executes in place when already on the owning thread. From any
//! other thread it enqueues the action and blocks until the owning thread
//! has executed it, handing back the action's result. An action whose
//! caller timed out before it started is discarded, never run late.

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, trace};

/// Returns whether the action actually ran.
type Job = Box<dyn FnOnce() -> bool + Send + 'static>;

/// Why a marshaled action could not be completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    /// The owner loop is gone; nothing will ever drain the queue.
    Closed,
    /// The owner loop dropped the action without running it.
    Abandoned,
    /// The owning thread did not finish the action in time.
    TimedOut(Duration),
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => f.write_str("owner loop closed"),
            Self::Abandoned => f.write_str("action dropped by owner loop"),
            Self::TimedOut(after) => write!(f, "owner thread did not respond within {after:?}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("dispatch target unavailable: {reason}")]
    TargetUnavailable { reason: UnavailableReason },
}

pub type DispatchResult<T> = Result<T, DispatchError>;

fn unavailable(reason: UnavailableReason) -> DispatchError {
    DispatchError::TargetUnavailable { reason }
}

/// Create a dispatcher bound to the calling thread.
///
/// `timeout` bounds how long `run` waits for the owning thread; `None`
/// waits indefinitely.
pub fn affinity_channel(timeout: Option<Duration>) -> (AffinityDispatcher, OwnerLoop) {
    let owner = thread::current().id();
    let (queue, jobs) = mpsc::channel();
    debug!(?owner, ?timeout, "affinity channel created");
    (
        AffinityDispatcher {
            owner,
            queue,
            timeout,
        },
        OwnerLoop {
            owner,
            jobs,
            _not_send: PhantomData,
        },
    )
}

/// Handle for running actions on the owning thread.
#[derive(Clone)]
pub struct AffinityDispatcher {
    owner: ThreadId,
    queue: Sender<Job>,
    timeout: Option<Duration>,
}

impl fmt::Debug for AffinityDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AffinityDispatcher")
            .field("owner", &self.owner)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AffinityDispatcher {
    pub fn is_owner_thread(&self) -> bool {
        thread::current().id() == self.owner
    }

    /// Run `action` on the owning thread and return its result.
    ///
    /// On timeout the action is cancelled: if the owning thread has not
    /// started it yet it never runs. One already started is awaited.
    pub fn run<F, R>(&self, action: F) -> DispatchResult<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_owner_thread() {
            return Ok(action());
        }

        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        // Whoever flips this first decides: the job runs, or the caller gives up.
        let claimed = Arc::new(AtomicBool::new(false));
        let job_claim = claimed.clone();
        let job: Job = Box::new(move || {
            if job_claim.swap(true, Ordering::AcqRel) {
                trace!("skipping cancelled action");
                return false;
            }
            let _ = reply_tx.send(action());
            true
        });
        self.queue
            .send(job)
            .map_err(|_| unavailable(UnavailableReason::Closed))?;
        trace!(owner = ?self.owner, "action marshaled");

        match self.timeout {
            Some(limit) => match reply_rx.recv_timeout(limit) {
                Ok(value) => Ok(value),
                Err(RecvTimeoutError::Timeout) if !claimed.swap(true, Ordering::AcqRel) => {
                    debug!(owner = ?self.owner, ?limit, "marshaled action cancelled");
                    Err(unavailable(UnavailableReason::TimedOut(limit)))
                }
                // Started just as the limit passed; it finishes promptly.
                Err(RecvTimeoutError::Timeout) => reply_rx
                    .recv()
                    .map_err(|_| unavailable(UnavailableReason::Abandoned)),
                Err(RecvTimeoutError::Disconnected) => {
                    Err(unavailable(UnavailableReason::Abandoned))
                }
            },
            None => reply_rx
                .recv()
                .map_err(|_| unavailable(UnavailableReason::Abandoned)),
        }
    }
}

/// The owning thread's side of the channel. Not `Send`: jobs always run
/// on the thread that created it.
pub struct OwnerLoop {
    owner: ThreadId,
    jobs: Receiver<Job>,
    _not_send: PhantomData<*const ()>,
}

impl OwnerLoop {
    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    /// Run every queued action without blocking. Returns how many ran;
    /// cancelled actions are dropped and not counted.
    pub fn pump(&self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.jobs.try_recv() {
            ran += usize::from(job());
        }
        ran
    }

    /// Wait up to `wait` for work, then drain the queue.
    pub fn pump_for(&self, wait: Duration) -> usize {
        match self.jobs.recv_timeout(wait) {
            Ok(job) => usize::from(job()) + self.pump(),
            Err(_) => 0,
        }
    }

    /// Keep draining until `done` returns true, checking every `poll`.
    pub fn run_until(&self, mut done: impl FnMut() -> bool, poll: Duration) -> usize {
        let started = Instant::now();
        let mut ran = 0;
        while !done() {
            ran += self.pump_for(poll);
        }
        // Work queued right before `done` flipped.
        ran += self.pump();
        debug!(ran, elapsed = ?started.elapsed(), "owner loop finished");
        ran
    }
}
