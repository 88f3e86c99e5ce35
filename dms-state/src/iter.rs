//! Sync-first change iterator for device list updates
//!
//! Provides a blocking iterator over [`ControllerEvent`]s in the order the
//! update thread produced them.
//!
//! # Example
//!
//! ```rust,ignore
//! use dms_state::Controller;
//!
//! let controller = Controller::builder().build(source)?;
//!
//! // Blocking iteration
//! for event in controller.iter() {
//!     println!("{:?}", event);
//! }
//!
//! // Non-blocking check
//! for event in controller.iter().try_iter() {
//!     println!("{:?}", event);
//! }
//!
//! // With timeout
//! if let Some(event) = controller.iter().recv_timeout(Duration::from_secs(1)) {
//!     println!("Got event: {:?}", event);
//! }
//! ```

use std::sync::{mpsc, Arc};
use std::time::Duration;

use parking_lot::Mutex;

use crate::event::ControllerEvent;

/// Blocking iterator over controller events
///
/// Every iterator obtained from the same controller drains the same queue,
/// so each event is seen by exactly one of them.
pub struct ChangeIterator {
    rx: Arc<Mutex<mpsc::Receiver<ControllerEvent>>>,
}

impl ChangeIterator {
    pub(crate) fn new(rx: Arc<Mutex<mpsc::Receiver<ControllerEvent>>>) -> Self {
        Self { rx }
    }

    /// Block until the next event is available
    ///
    /// Returns `None` if the update thread has stopped and the queue is
    /// drained.
    pub fn recv(&self) -> Option<ControllerEvent> {
        self.rx.lock().recv().ok()
    }

    /// Block until the next event or timeout expires
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ControllerEvent> {
        self.rx.lock().recv_timeout(timeout).ok()
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&self) -> Option<ControllerEvent> {
        self.rx.lock().try_recv().ok()
    }

    /// Non-blocking iterator over currently queued events
    pub fn try_iter(&self) -> TryIter<'_> {
        TryIter { inner: self }
    }

    /// Blocking iterator that stops once `timeout` passes without an event
    pub fn timeout_iter(&self, timeout: Duration) -> TimeoutIter<'_> {
        TimeoutIter {
            inner: self,
            timeout,
        }
    }
}

impl Iterator for ChangeIterator {
    type Item = ControllerEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.recv()
    }
}

/// Non-blocking iterator over currently available events
pub struct TryIter<'a> {
    inner: &'a ChangeIterator,
}

impl<'a> Iterator for TryIter<'a> {
    type Item = ControllerEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.try_recv()
    }
}

/// Blocking iterator with timeout
pub struct TimeoutIter<'a> {
    inner: &'a ChangeIterator,
    timeout: Duration,
}

impl<'a> Iterator for TimeoutIter<'a> {
    type Item = ControllerEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.recv_timeout(self.timeout)
    }
}
