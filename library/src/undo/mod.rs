//! Reversible edits.
//!
//! Every mutating request on [`TimelineModel`] takes an `undo`/`redo` pair and
//! extends it with the actions needed to revert and replay itself. Callers
//! start from [`noop`] and hand the finished pair to an [`UndoStack`].

mod stack;

pub use stack::{UndoCommand, UndoStack};

use crate::timeline::TimelineModel;

/// A deferred action against the timeline. Returns false if it could not be applied.
pub type Fun = Box<dyn Fn(&mut TimelineModel) -> bool>;

/// The identity action.
pub fn noop() -> Fun {
    Box::new(|_: &mut TimelineModel| true)
}

/// Append `operation` to `redo` and prepend `reverse` to `undo`, so that the
/// pair keeps replaying in order and reverting in reverse order.
pub fn update_undo_redo(operation: Fun, reverse: Fun, undo: &mut Fun, redo: &mut Fun) {
    push_front(reverse, undo);
    push_back(operation, redo);
}

/// `action` runs before whatever `fun` already does.
pub fn push_front(action: Fun, fun: &mut Fun) {
    let previous = std::mem::replace(fun, noop());
    *fun = Box::new(move |timeline: &mut TimelineModel| action(timeline) && previous(timeline));
}

/// `action` runs after whatever `fun` already does.
pub fn push_back(action: Fun, fun: &mut Fun) {
    let previous = std::mem::replace(fun, noop());
    *fun = Box::new(move |timeline: &mut TimelineModel| previous(timeline) && action(timeline));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimelineConfig;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder(log: &Rc<RefCell<Vec<&'static str>>>, name: &'static str) -> Fun {
        let log = Rc::clone(log);
        Box::new(move |_: &mut TimelineModel| {
            log.borrow_mut().push(name);
            true
        })
    }

    #[test]
    fn test_update_undo_redo_ordering() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut timeline = TimelineModel::new(TimelineConfig::default());
        let mut undo = noop();
        let mut redo = noop();

        update_undo_redo(recorder(&log, "op1"), recorder(&log, "rev1"), &mut undo, &mut redo);
        update_undo_redo(recorder(&log, "op2"), recorder(&log, "rev2"), &mut undo, &mut redo);

        assert!(redo(&mut timeline));
        assert!(undo(&mut timeline));
        assert_eq!(*log.borrow(), vec!["op1", "op2", "rev2", "rev1"]);
    }

    #[test]
    fn test_failure_short_circuits() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut timeline = TimelineModel::new(TimelineConfig::default());
        let mut redo = noop();
        push_back(Box::new(|_: &mut TimelineModel| false), &mut redo);
        push_back(recorder(&log, "after"), &mut redo);

        assert!(!redo(&mut timeline));
        assert!(log.borrow().is_empty());
    }
}
