use std::cell::RefCell;

use crate::model::ClipId;

/// Presentation-side listener for clip changes.
pub trait TimelineObserver {
    fn clip_changed(&self, clip_id: ClipId);
}

/// Keeps every notification it receives. Useful for tests and headless runs.
#[derive(Default, Debug)]
pub struct RecordingObserver {
    changed: RefCell<Vec<ClipId>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changed(&self) -> Vec<ClipId> {
        self.changed.borrow().clone()
    }

    pub fn clear(&self) {
        self.changed.borrow_mut().clear();
    }
}

impl TimelineObserver for RecordingObserver {
    fn clip_changed(&self, clip_id: ClipId) {
        self.changed.borrow_mut().push(clip_id);
    }
}
