//! Bounded linear undo/redo over form snapshots.

use crate::widget::FormState;
use tracing::{debug, trace};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Normal,
    /// An undo or redo is being applied; commits are ignored.
    Replaying,
}

pub struct History {
    entries: Vec<FormState>,
    index: usize,
    limit: usize,
    mode: Mode,
}

impl History {
    pub fn new(baseline: FormState, limit: usize) -> Self {
        Self {
            entries: vec![baseline],
            index: 0,
            limit: limit.max(1),
            mode: Mode::Normal,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &FormState {
        &self.entries[self.index]
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    /// Records `snapshot` as the newest entry, discarding any redo branch.
    /// Returns `false` while replaying.
    pub fn commit(&mut self, snapshot: FormState) -> bool {
        if self.mode == Mode::Replaying {
            trace!("commit suppressed during replay");
            return false;
        }
        self.entries.truncate(self.index + 1);
        self.entries.push(snapshot);
        self.index += 1;
        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
            self.index -= excess;
        }
        debug!(index = self.index, len = self.entries.len(), "history commit");
        true
    }

    /// Steps back one entry. The returned guard holds the history in
    /// [`Mode::Replaying`] until dropped.
    pub fn undo(&mut self) -> Option<Replay<'_>> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        debug!(index = self.index, "undo");
        Some(Replay::start(self))
    }

    pub fn redo(&mut self) -> Option<Replay<'_>> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        debug!(index = self.index, "redo");
        Some(Replay::start(self))
    }

    pub fn reset(&mut self, baseline: FormState) {
        self.entries.clear();
        self.entries.push(baseline);
        self.index = 0;
        self.mode = Mode::Normal;
        debug!("history reset");
    }
}

/// An undo/redo in progress. Exposes the snapshot to apply; any commit issued
/// through it while the host re-renders is dropped.
pub struct Replay<'h> {
    history: &'h mut History,
}

impl<'h> Replay<'h> {
    fn start(history: &'h mut History) -> Self {
        history.mode = Mode::Replaying;
        Self { history }
    }

    pub fn snapshot(&self) -> &FormState {
        self.history.current()
    }

    pub fn commit(&mut self, snapshot: FormState) -> bool {
        self.history.commit(snapshot)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}

impl Drop for Replay<'_> {
    fn drop(&mut self) {
        self.history.mode = Mode::Normal;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(title: &str) -> FormState {
        FormState {
            title: title.into(),
            ..FormState::default()
        }
    }

    fn titles(h: &History) -> Vec<String> {
        h.entries.iter().map(|f| f.title.clone()).collect()
    }

    #[test]
    fn test_commit_advances() {
        let mut h = History::new(form("a"), 100);
        assert!(h.commit(form("b")));
        assert!(h.commit(form("c")));
        assert_eq!(h.index(), 2);
        assert_eq!(h.current().title, "c");
        assert!(h.can_undo());
        assert!(!h.can_redo());
    }

    #[test]
    fn test_undo_redo_inverse() {
        let mut h = History::new(form("a"), 100);
        h.commit(form("b"));
        let before = h.current().clone();
        assert_eq!(h.undo().unwrap().snapshot().title, "a");
        assert_eq!(h.redo().unwrap().snapshot(), &before);
        assert_eq!(h.current(), &before);
    }

    #[test]
    fn test_bounds_are_noops() {
        let mut h = History::new(form("a"), 100);
        assert!(h.undo().is_none());
        assert!(h.redo().is_none());
        h.commit(form("b"));
        assert!(h.redo().is_none());
        assert_eq!(h.index(), 1);
    }

    #[test]
    fn test_commit_after_undo_truncates() {
        let mut h = History::new(form("a"), 100);
        h.commit(form("b"));
        h.commit(form("c"));
        drop(h.undo());
        drop(h.undo());
        h.commit(form("d"));
        assert_eq!(titles(&h), vec!["a", "d"]);
        assert!(!h.can_redo());
        assert!(h.redo().is_none());
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut h = History::new(form("0"), 3);
        for i in 1..=5 {
            h.commit(form(&i.to_string()));
        }
        assert_eq!(titles(&h), vec!["3", "4", "5"]);
        assert_eq!(h.index(), 2);
        assert_eq!(h.current().title, "5");
        drop(h.undo());
        drop(h.undo());
        assert!(!h.can_undo());
        assert_eq!(h.current().title, "3");
    }

    #[test]
    fn test_commit_during_replay_is_suppressed() {
        let mut h = History::new(form("a"), 100);
        h.commit(form("b"));
        {
            let mut replay = h.undo().unwrap();
            assert!(!replay.commit(form("echo")));
            assert!(replay.can_redo());
        }
        assert_eq!(h.mode(), Mode::Normal);
        assert_eq!(titles(&h), vec!["a", "b"]);
        assert_eq!(h.index(), 0);
        // Normal mode accepts commits again.
        assert!(h.commit(form("c")));
    }

    #[test]
    fn test_replay_mode_visible_while_guard_lives() {
        let mut h = History::new(form("a"), 100);
        h.commit(form("b"));
        let replay = h.undo().unwrap();
        assert_eq!(replay.history.mode, Mode::Replaying);
        drop(replay);
        assert_eq!(h.mode(), Mode::Normal);
    }

    #[test]
    fn test_reset() {
        let mut h = History::new(form("a"), 100);
        h.commit(form("b"));
        h.reset(form("z"));
        assert_eq!(titles(&h), vec!["z"]);
        assert_eq!(h.index(), 0);
        assert!(!h.can_undo());
        assert!(!h.can_redo());
    }
}
