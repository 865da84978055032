// SPDX-License-Identifier: LGPL-3.0-only

use std::sync::{Condvar, Mutex};

use super::WindowRequest;
use crate::error::WindowError;

#[derive(Default)]
struct Handoff {
    request: Option<WindowRequest>,
    in_flight: bool,
    outcome: Option<Result<(), WindowError>>,
}

/// Blocking hand-off of window creation requests to the UI thread.
///
/// Callers on any thread [submit](Self::submit) a request and block until the
/// UI thread reports the outcome with [complete](Self::complete). Only one
/// request is in flight at a time; later callers wait for their turn.
pub struct WindowRendezvous {
    state: Mutex<Handoff>,
    changed: Condvar,
}

impl WindowRendezvous {
    /// Creates an idle rendezvous.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(Handoff::default()),
            changed: Condvar::new(),
        }
    }

    /// Offers `request` to the UI thread and waits for the creation outcome.
    pub fn submit(&self, request: WindowRequest) -> Result<(), WindowError> {
        let mut state = self.state.lock().unwrap();
        while state.in_flight {
            state = self.changed.wait(state).unwrap();
        }
        log::debug!("window request submitted: {:?}", request.options.title);
        state.in_flight = true;
        state.outcome = None;
        state.request = Some(request);
        self.changed.notify_all();

        loop {
            if let Some(outcome) = state.outcome.take() {
                state.in_flight = false;
                state.request = None;
                self.changed.notify_all();
                return outcome;
            }
            state = self.changed.wait(state).unwrap();
        }
    }

    /// Blocks until a request is pending and returns it without consuming it.
    pub fn next_request(&self) -> WindowRequest {
        let mut state = self.state.lock().unwrap();
        loop {
            if state.outcome.is_none() {
                if let Some(request) = state.request.as_ref() {
                    return request.clone();
                }
            }
            state = self.changed.wait(state).unwrap();
        }
    }

    /// Blocks until a request is pending and consumes it.
    pub fn take_request(&self) -> WindowRequest {
        let mut state = self.state.lock().unwrap();
        loop {
            if state.outcome.is_none() {
                if let Some(request) = state.request.take() {
                    return request;
                }
            }
            state = self.changed.wait(state).unwrap();
        }
    }

    /// Reports the outcome of the in-flight request to its caller.
    pub fn complete(&self, outcome: Result<(), WindowError>) {
        let mut state = self.state.lock().unwrap();
        if !state.in_flight {
            log::warn!("window creation outcome without a pending request: {:?}", outcome);
            return;
        }
        state.outcome = Some(outcome);
        self.changed.notify_all();
    }

    /// Whether a request is waiting for its outcome.
    pub fn is_pending(&self) -> bool {
        self.state.lock().unwrap().in_flight
    }
}

impl Default for WindowRendezvous {
    fn default() -> Self {
        Self::new()
    }
}
