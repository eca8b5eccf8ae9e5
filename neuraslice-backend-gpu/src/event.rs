//! Gestion des événements GPU

use crate::error::GpuBackendError;
use crate::stream::GpuStream;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq)]
enum EventState {
    /// Never recorded; counts as completed.
    Idle,
    Pending,
    Completed(Instant),
}

#[derive(Debug)]
struct EventInner {
    state: Mutex<EventState>,
    signal: Condvar,
}

/// Marker recorded into a stream; completes once all work submitted before it has run.
#[derive(Debug, Clone)]
pub struct GpuEvent {
    inner: Arc<EventInner>,
    enable_timing: bool,
}

impl GpuEvent {
    pub fn new(enable_timing: bool) -> Self {
        GpuEvent {
            inner: Arc::new(EventInner {
                state: Mutex::new(EventState::Idle),
                signal: Condvar::new(),
            }),
            enable_timing,
        }
    }

    pub fn record(&self, stream: &GpuStream) -> Result<(), GpuBackendError> {
        *self.lock_state() = EventState::Pending;
        let inner = Arc::clone(&self.inner);
        stream.enqueue_marker(move || {
            let mut state = inner.state.lock().unwrap_or_else(|p| p.into_inner());
            *state = EventState::Completed(Instant::now());
            inner.signal.notify_all();
        })
    }

    pub fn synchronize(&self) -> Result<(), GpuBackendError> {
        let mut state = self.lock_state();
        while *state == EventState::Pending {
            state = self.inner.signal.wait(state).unwrap_or_else(|p| p.into_inner());
        }
        Ok(())
    }

    pub fn is_completed(&self) -> bool {
        !matches!(*self.lock_state(), EventState::Pending)
    }

    pub fn elapsed_time_ms(start: &GpuEvent, end: &GpuEvent) -> Result<f32, GpuBackendError> {
        if !start.enable_timing || !end.enable_timing {
            return Err(GpuBackendError::InvalidConfig(
                "elapsed_time_ms requires events created with timing enabled".to_string(),
            ));
        }
        match (*start.lock_state(), *end.lock_state()) {
            (EventState::Completed(t0), EventState::Completed(t1)) => {
                Ok(t1.saturating_duration_since(t0).as_secs_f32() * 1000.0)
            }
            _ => Err(GpuBackendError::EventNotReady),
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, EventState> {
        self.inner.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}
