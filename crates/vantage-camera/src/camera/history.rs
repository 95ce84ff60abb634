use vantage_core::CameraPose;

/// Linear undo/redo log of poses.
///
/// Never empty: entry 0 is the pose the log was created with, and
/// `current_index` always points at a valid entry.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<CameraPose>,
    current_index: usize,
    limit: usize,
}

impl History {
    pub fn new(initial: CameraPose, limit: usize) -> Self {
        Self {
            entries: vec![initial],
            current_index: 0,
            limit: limit.max(1),
        }
    }

    /// Append a pose, discarding any redo branch first
    pub fn push(&mut self, pose: CameraPose) {
        self.entries.truncate(self.current_index + 1);
        self.entries.push(pose);

        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
        }
        self.current_index = self.entries.len() - 1;
    }

    /// Step back; returns the pose to apply
    pub fn undo(&mut self) -> Option<CameraPose> {
        if !self.can_undo() {
            return None;
        }
        self.current_index -= 1;
        Some(self.entries[self.current_index])
    }

    /// Step forward; returns the pose to apply
    pub fn redo(&mut self) -> Option<CameraPose> {
        if !self.can_redo() {
            return None;
        }
        self.current_index += 1;
        Some(self.entries[self.current_index])
    }

    pub fn can_undo(&self) -> bool {
        self.current_index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current_index + 1 < self.entries.len()
    }

    pub fn current(&self) -> &CameraPose {
        &self.entries[self.current_index]
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn entries(&self) -> &[CameraPose] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop everything and start over from `initial`
    pub fn reset(&mut self, initial: CameraPose) {
        self.entries.clear();
        self.entries.push(initial);
        self.current_index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_core::Vec3;

    fn pose(x: f32) -> CameraPose {
        CameraPose::new(Vec3::new(x, 0.0, 10.0), Vec3::ZERO, 50.0)
    }

    #[test]
    fn test_undo_redo() {
        let mut history = History::new(pose(0.0), 10);
        assert!(!history.can_undo());

        history.push(pose(1.0));
        history.push(pose(2.0));
        assert_eq!(history.undo(), Some(pose(1.0)));
        assert_eq!(history.undo(), Some(pose(0.0)));
        assert_eq!(history.undo(), None);
        assert_eq!(history.current_index(), 0);

        assert_eq!(history.redo(), Some(pose(1.0)));
        assert!(history.can_redo());
    }

    #[test]
    fn test_push_discards_redo_branch() {
        let mut history = History::new(pose(0.0), 10);
        history.push(pose(1.0));
        history.push(pose(2.0));
        history.undo();
        history.push(pose(3.0));

        assert!(!history.can_redo());
        assert_eq!(history.len(), 3);
        assert_eq!(*history.current(), pose(3.0));
    }

    #[test]
    fn test_limit_evicts_oldest() {
        let mut history = History::new(pose(0.0), 3);
        for i in 1..=5 {
            history.push(pose(i as f32));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.current_index(), 2);
        assert_eq!(history.entries()[0], pose(3.0));
    }
}
