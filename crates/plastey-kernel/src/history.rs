//! Bounded undo/redo history of discrete user actions.
//!
//! Each entry is a pair of closures over the history's target type `T`: one
//! that reverts the action and one that (re)applies it.  The cursor counts
//! applied entries, so it always lies in `[0, len]`:
//!
//! ```text
//! entries:  [a] [b] [c] [d]
//! cursor:               ^ 3   (a, b, c applied; d undone)
//! ```
//!
//! - [`History::push`] drops every entry past the cursor, evicts the oldest
//!   entry when full, appends, and moves the cursor to the tail.
//! - [`History::undo`] steps the cursor back and reverts that entry.
//! - [`History::redo`] re-applies the entry at the cursor and steps forward.
//! - [`History::perform`] runs the newest applied entry's redo action for
//!   the first time, tagged [`Replay::Initial`].
//!
//! Stepping past either end invokes the caller's `on_empty` callback
//! instead and leaves the cursor clamped.
//!
//! # Example
//!
//! ```rust
//! use plastey_kernel::history::History;
//!
//! let mut counter = 0i32;
//! let mut history: History<i32> = History::new();
//! history.push(|n, _| *n -= 1, |n, _| *n += 1);
//! history.perform(&mut counter);
//! assert_eq!(counter, 1);
//!
//! history.undo(&mut counter, |_| {});
//! assert_eq!(counter, 0);
//! let mut empty = false;
//! history.undo(&mut counter, |_| empty = true);
//! assert!(empty);
//! ```

use std::collections::VecDeque;

use tracing::debug;

/// Default number of entries kept before the oldest is evicted.
pub const DEFAULT_CAPACITY: usize = 64;

/// Why an action closure is being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replay {
    /// First execution, straight after the push.
    Initial,
    Undo,
    Redo,
}

impl Replay {
    /// Prefix for status messages written by the action.
    pub fn prefix(self) -> &'static str {
        match self {
            Replay::Initial => "",
            Replay::Undo => "[ UNDO ] ",
            Replay::Redo => "[ REDO ] ",
        }
    }

    pub fn is_replay(self) -> bool {
        self != Replay::Initial
    }
}

/// An undo or redo closure.
pub type Action<T> = Box<dyn FnMut(&mut T, Replay)>;

struct Entry<T: ?Sized> {
    undo: Action<T>,
    redo: Action<T>,
}

pub struct History<T: ?Sized> {
    entries: VecDeque<Entry<T>>,
    cursor: usize,
    capacity: usize,
}

impl<T: ?Sized> Default for History<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> History<T> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            cursor: 0,
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    pub fn push(
        &mut self,
        undo: impl FnMut(&mut T, Replay) + 'static,
        redo: impl FnMut(&mut T, Replay) + 'static,
    ) {
        self.entries.truncate(self.cursor);
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(Entry {
            undo: Box::new(undo),
            redo: Box::new(redo),
        });
        self.cursor = self.entries.len();
        debug!(len = self.entries.len(), "history push");
    }

    /// Revert the entry before the cursor.  Returns `false` (after calling
    /// `on_empty`) when nothing is left to undo.
    pub fn undo(&mut self, target: &mut T, on_empty: impl FnOnce(&mut T)) -> bool {
        if self.cursor == 0 {
            on_empty(target);
            return false;
        }
        self.cursor -= 1;
        let entry = &mut self.entries[self.cursor];
        (entry.undo)(target, Replay::Undo);
        true
    }

    /// Re-apply the entry at the cursor.  Returns `false` (after calling
    /// `on_empty`) when nothing is left to redo.
    pub fn redo(&mut self, target: &mut T, on_empty: impl FnOnce(&mut T)) -> bool {
        let Some(entry) = self.entries.get_mut(self.cursor) else {
            on_empty(target);
            return false;
        };
        (entry.redo)(target, Replay::Redo);
        self.cursor += 1;
        true
    }

    /// Run the newest applied entry's redo action as its first execution.
    /// Returns `false` when no entry is applied.
    pub fn perform(&mut self, target: &mut T) -> bool {
        let Some(index) = self.cursor.checked_sub(1) else {
            return false;
        };
        (self.entries[index].redo)(target, Replay::Initial);
        true
    }
}
