use std::collections::VecDeque;
use std::fmt;

use log::{debug, warn};

use super::Fun;
use crate::timeline::TimelineModel;

/// One user-level edit: a label plus the actions that revert and replay it.
pub struct UndoCommand {
    label: String,
    undo: Fun,
    redo: Fun,
}

impl UndoCommand {
    pub fn new(label: impl Into<String>, undo: Fun, redo: Fun) -> Self {
        Self {
            label: label.into(),
            undo,
            redo,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for UndoCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoCommand")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Session-owned edit history.
#[derive(Debug)]
pub struct UndoStack {
    undo_stack: VecDeque<UndoCommand>,
    redo_stack: Vec<UndoCommand>,
    /// 0 means unlimited.
    limit: usize,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(0)
    }
}

impl UndoStack {
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            limit,
        }
    }

    /// Record an edit that has already been applied. Clears the redo branch.
    pub fn push(&mut self, label: impl Into<String>, undo: Fun, redo: Fun) {
        let command = UndoCommand::new(label, undo, redo);
        debug!("Push undo entry '{}'", command.label);
        self.undo_stack.push_back(command);
        self.redo_stack.clear();
        if self.limit > 0 {
            while self.undo_stack.len() > self.limit {
                self.undo_stack.pop_front();
            }
        }
    }

    /// Revert the latest edit. Returns false if there is nothing to undo or
    /// the edit could not be reverted; the history is left untouched then.
    pub fn undo(&mut self, timeline: &mut TimelineModel) -> bool {
        let Some(command) = self.undo_stack.pop_back() else {
            return false;
        };
        if (command.undo)(timeline) {
            debug!("Undo '{}'", command.label);
            self.redo_stack.push(command);
            true
        } else {
            warn!("Failed to undo '{}'", command.label);
            self.undo_stack.push_back(command);
            false
        }
    }

    /// Replay the latest undone edit.
    pub fn redo(&mut self, timeline: &mut TimelineModel) -> bool {
        let Some(command) = self.redo_stack.pop() else {
            return false;
        };
        if (command.redo)(timeline) {
            debug!("Redo '{}'", command.label);
            self.undo_stack.push_back(command);
            true
        } else {
            warn!("Failed to redo '{}'", command.label);
            self.redo_stack.push(command);
            false
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.undo_stack.back().map(UndoCommand::label)
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.redo_stack.last().map(UndoCommand::label)
    }

    /// Number of edits that can be undone.
    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
