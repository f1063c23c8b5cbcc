//! Presenter that records every frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::tracking::{Presenter, PresenterError, TrackingContext, TrackingState};

/// A recorded render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFrame {
    pub state: TrackingState,
    pub context: TrackingContext,
}

/// Presenter for assertions on what the controller rendered.
///
/// Can be told to fail or panic to exercise the controller's fault handling.
/// Failed and panicking renders are not recorded.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    frames: Mutex<Vec<RecordedFrame>>,
    fail: AtomicBool,
    panic: AtomicBool,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_renders(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn panic_on_render(&self, panic: bool) {
        self.panic.store(panic, Ordering::SeqCst);
    }

    pub fn frames(&self) -> Vec<RecordedFrame> {
        self.lock().clone()
    }

    pub fn states(&self) -> Vec<TrackingState> {
        self.lock().iter().map(|frame| frame.state).collect()
    }

    pub fn last_state(&self) -> Option<TrackingState> {
        self.lock().last().map(|frame| frame.state)
    }

    pub fn last_context(&self) -> Option<TrackingContext> {
        self.lock().last().map(|frame| frame.context.clone())
    }

    pub fn render_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RecordedFrame>> {
        self.frames.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Presenter for RecordingPresenter {
    fn render(
        &self,
        state: TrackingState,
        context: &TrackingContext,
    ) -> Result<(), PresenterError> {
        if self.panic.load(Ordering::SeqCst) {
            panic!("presenter asked to panic while rendering {state}");
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(PresenterError::Render(format!("refusing to render {state}")));
        }

        self.lock().push(RecordedFrame {
            state,
            context: context.clone(),
        });
        Ok(())
    }
}
