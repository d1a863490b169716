//! Class initialization barrier.
//!
//! A side table from class to initialization state. The first thread to
//! reach an uninitialized class runs its initializer; calls from that same
//! thread while the initializer runs proceed without waiting, and every
//! other thread blocks until it finishes. A successful initialization
//! removes the entry: from then on the host reports the class initialized.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use dashmap::DashMap;
use linkform_core::ClassKey;
use tracing::debug;

use super::error::{Result, RuntimeError};

/// Outcome of passing the barrier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitStatus {
    /// The class is initialized; barrier forms may be dropped.
    Done,
    /// The current thread is running the class's initializer.
    Reentrant,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum InitState {
    Pending,
    Initializing(ThreadId),
    Initialized,
    Failed(String),
}

struct InitSlot {
    state: Mutex<InitState>,
    ready: Condvar,
}

impl InitSlot {
    fn lock(&self) -> MutexGuard<'_, InitState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fails the slot and wakes waiters if the initializer unwinds.
struct Running<'a> {
    slot: &'a InitSlot,
    finished: bool,
}

impl Drop for Running<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        *self.slot.lock() = InitState::Failed("initializer panicked".to_string());
        self.slot.ready.notify_all();
    }
}

#[derive(Default)]
pub struct ClassInitTable {
    slots: DashMap<ClassKey, Arc<InitSlot>>,
}

impl ClassInitTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure `class` is initialized, running `initialize` at most once
    /// across threads.
    ///
    /// `is_initialized` is consulted under the slot lock, so a thread that
    /// arrives after a finished initialization never runs it again.
    pub fn ensure(
        &self,
        class: &ClassKey,
        is_initialized: impl Fn() -> bool,
        initialize: impl FnOnce() -> std::result::Result<(), String>,
    ) -> Result<InitStatus> {
        if is_initialized() {
            return Ok(InitStatus::Done);
        }
        let me = thread::current().id();
        let slot = Arc::clone(
            self.slots
                .entry(class.clone())
                .or_insert_with(|| {
                    Arc::new(InitSlot {
                        state: Mutex::new(InitState::Pending),
                        ready: Condvar::new(),
                    })
                })
                .value(),
        );

        let mut state = slot.lock();
        loop {
            match &*state {
                InitState::Initialized => return Ok(InitStatus::Done),
                InitState::Failed(reason) => {
                    return Err(RuntimeError::ClassInitFailed {
                        class: class.clone(),
                        reason: reason.clone(),
                    });
                }
                InitState::Initializing(owner) if *owner == me => {
                    return Ok(InitStatus::Reentrant);
                }
                InitState::Initializing(_) => {}
                InitState::Pending => break,
            }
            state = slot.ready.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
        if is_initialized() {
            *state = InitState::Initialized;
            drop(state);
            self.slots.remove(class);
            return Ok(InitStatus::Done);
        }

        *state = InitState::Initializing(me);
        drop(state);
        debug!(target: "linkform::init", class = %class, "running class initializer");
        let mut running = Running {
            slot: &*slot,
            finished: false,
        };
        let outcome = initialize();
        running.finished = true;
        drop(running);

        let mut state = slot.lock();
        *state = match &outcome {
            Ok(()) => InitState::Initialized,
            Err(reason) => InitState::Failed(reason.clone()),
        };
        drop(state);
        slot.ready.notify_all();
        match outcome {
            Ok(()) => {
                self.slots.remove(class);
                debug!(target: "linkform::init", class = %class, "class initialized");
                Ok(InitStatus::Done)
            }
            Err(reason) => Err(RuntimeError::ClassInitFailed {
                class: class.clone(),
                reason,
            }),
        }
    }

    /// Whether some thread is running, or failed to run, `class`'s initializer.
    pub fn is_tracked(&self, class: &ClassKey) -> bool {
        self.slots.contains_key(class)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
