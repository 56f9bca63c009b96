//! Per-tool request state machine.
//!
//! Every tool in the workbench moves through the same states:
//! `Idle -> Loading -> Ready | Failed`, or straight from `Idle` to `Ready`
//! when a local heuristic runs without an artificial delay. A new
//! submission supersedes whatever was pending; completions for older
//! requests are dropped.

use std::time::{Duration, Instant};

use tracing::debug;

/// Identifier handed out for each submission.
pub type RequestId = u64;

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetState<T> {
    Idle,
    Loading { request_id: RequestId, started: Instant },
    Ready(T),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct Widget<T> {
    state: WidgetState<T>,
    next_request_id: RequestId,
}

impl<T> Default for Widget<T> {
    fn default() -> Self {
        Self {
            state: WidgetState::Idle,
            next_request_id: 1,
        }
    }
}

impl<T> Widget<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WidgetState<T> {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, WidgetState::Loading { .. })
    }

    /// Submit is allowed for non-blank input while nothing is in flight.
    pub fn can_submit(&self, input: &str) -> bool {
        !input.trim().is_empty() && !self.is_loading()
    }

    pub fn result(&self) -> Option<&T> {
        match &self.state {
            WidgetState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            WidgetState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Time spent in the current loading state.
    pub fn loading_elapsed(&self) -> Option<Duration> {
        match &self.state {
            WidgetState::Loading { started, .. } => Some(started.elapsed()),
            _ => None,
        }
    }

    /// Enter `Loading` and return the id the completion must carry.
    pub fn begin(&mut self) -> RequestId {
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.state = WidgetState::Loading {
            request_id,
            started: Instant::now(),
        };
        request_id
    }

    /// Skip `Loading` for synchronous work.
    pub fn complete_now(&mut self, value: T) {
        self.next_request_id += 1;
        self.state = WidgetState::Ready(value);
    }

    /// Apply a completion. Returns false if it was stale and ignored.
    pub fn finish(&mut self, request_id: RequestId, outcome: Result<T, String>) -> bool {
        match self.state {
            WidgetState::Loading { request_id: pending, .. } if pending == request_id => {
                self.state = match outcome {
                    Ok(value) => WidgetState::Ready(value),
                    Err(message) => WidgetState::Failed(message),
                };
                true
            }
            _ => {
                debug!(request_id, "stale_completion_dropped");
                false
            }
        }
    }

    pub fn reset(&mut self) {
        self.state = WidgetState::Idle;
    }
}
