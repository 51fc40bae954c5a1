use crate::state::EditorState;

/// Linear undo/redo history over committed [`EditorState`] snapshots.
///
/// Invariants once a session has begun: the sequence is non-empty,
/// `cursor < entries.len()`, and `entries[cursor]` is the live state.
/// Committing while undone prunes everything after the cursor (no tree
/// history). Identical consecutive commits are not deduped and there is no
/// depth cap; both match the source behavior of repeated control taps each
/// being undoable.
#[derive(Clone, Debug, Default)]
pub struct History {
    entries: Vec<EditorState>,
    cursor: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the history with the state at editor entry.
    ///
    /// Idempotent: re-invoking mid-session is a no-op so spurious re-entry
    /// cannot wipe in-progress history.
    pub fn init(&mut self, initial: EditorState) {
        if self.entries.is_empty() {
            self.entries.push(initial);
            self.cursor = 0;
        }
    }

    /// True once `init` (or a first commit) has run and `reset` has not.
    pub fn is_started(&self) -> bool {
        !self.entries.is_empty()
    }

    /// The live state, if a session has begun.
    pub fn current(&self) -> Option<&EditorState> {
        self.entries.get(self.cursor)
    }

    /// Truncate any redo branch, append `next`, and move the cursor to it.
    pub fn commit(&mut self, next: EditorState) {
        if self.entries.is_empty() {
            self.entries.push(next);
            self.cursor = 0;
            return;
        }
        self.entries.truncate(self.cursor + 1);
        self.entries.push(next);
        self.cursor = self.entries.len() - 1;
    }

    /// Step back one entry. At the start of history this is a silent no-op.
    pub fn undo(&mut self) -> Option<&EditorState> {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
        self.current()
    }

    /// Step forward one entry. At the end of history this is a silent no-op.
    pub fn redo(&mut self) -> Option<&EditorState> {
        if self.cursor + 1 < self.entries.len() {
            self.cursor += 1;
        }
        self.current()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.cursor < self.entries.len() - 1
    }

    /// Discard everything ("start over"). A later `init` begins a new session.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
