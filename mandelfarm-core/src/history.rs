use tracing::debug;

use crate::view::ViewState;

/// Undo stack of view states.
///
/// The bottom entry is the session's initial state and can never be popped,
/// so [`peek`](Self::peek) always has something to return.  Growth is
/// unbounded: every new view is kept until it is undone.
#[derive(Debug, Clone)]
pub struct ViewHistory {
    states: Vec<ViewState>,
}

impl ViewHistory {
    pub fn new(initial: ViewState) -> Self {
        Self {
            states: vec![initial],
        }
    }

    /// Push a newly rendered state.
    pub fn push(&mut self, state: ViewState) {
        self.states.push(state);
        debug!(depth = self.states.len(), "Pushed view state");
    }

    /// The active state (top of the stack).
    pub fn peek(&self) -> ViewState {
        // The stack is never empty: `new` seeds it and `undo` keeps the bottom.
        self.states[self.states.len() - 1]
    }

    /// Discard the active state and fall back to the one before it.
    ///
    /// Returns `false`, leaving the history untouched, when only the initial
    /// state is left.
    pub fn undo(&mut self) -> bool {
        if self.states.len() <= 1 {
            debug!("Nothing to undo");
            return false;
        }
        self.states.pop();
        debug!(depth = self.states.len(), "Undid view state");
        true
    }

    /// Number of states on the stack, always at least one.
    pub fn depth(&self) -> usize {
        self.states.len()
    }

    /// States from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &ViewState> {
        self.states.iter()
    }
}

impl Default for ViewHistory {
    fn default() -> Self {
        Self::new(ViewState::initial())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::PlaneOrigin;

    fn state(min_x: f64) -> ViewState {
        ViewState::new(PlaneOrigin::new(min_x, 0.0), 0.01).unwrap()
    }

    #[test]
    fn undo_on_single_entry_is_a_no_op() {
        let mut history = ViewHistory::new(state(1.0));
        assert!(!history.undo());
        assert_eq!(history.depth(), 1);
        assert_eq!(history.peek(), state(1.0));
    }

    #[test]
    fn undo_restores_previous_entry() {
        let mut history = ViewHistory::new(state(1.0));
        history.push(state(2.0));
        history.push(state(3.0));

        assert!(history.undo());
        assert_eq!(history.depth(), 2);
        assert_eq!(history.peek(), state(2.0));

        assert!(history.undo());
        assert_eq!(history.peek(), state(1.0));
        assert!(!history.undo());
    }

    #[test]
    fn push_never_discards() {
        let mut history = ViewHistory::default();
        for i in 0..1000 {
            history.push(state(i as f64));
        }
        assert_eq!(history.depth(), 1001);
        assert_eq!(history.iter().next(), Some(&ViewState::initial()));
        assert_eq!(history.peek(), state(999.0));
    }
}
