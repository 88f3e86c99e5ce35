//! Selected device for one category

use dms_discovery::DeviceId;

use crate::event::SelectOutcome;

/// Holds at most one selected device identity.
///
/// Existence checks belong to the engine; the tracker only remembers.
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    selected: Option<DeviceId>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&DeviceId> {
        self.selected.as_ref()
    }

    pub fn is_selected(&self, id: &DeviceId) -> bool {
        self.selected.as_ref() == Some(id)
    }

    /// Make `id` the selection.
    pub fn select(&mut self, id: DeviceId) -> SelectOutcome {
        if self.is_selected(&id) {
            return SelectOutcome::AlreadySelected;
        }
        self.selected = Some(id);
        SelectOutcome::NewlySelected
    }

    /// Clear the selection if it is `id`. Returns whether it was cleared.
    pub fn clear_on_loss(&mut self, id: &DeviceId) -> bool {
        if self.is_selected(id) {
            self.selected = None;
            true
        } else {
            false
        }
    }

    /// Clear unconditionally, returning what was selected.
    pub fn clear(&mut self) -> Option<DeviceId> {
        self.selected.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_reports_already_selected() {
        let mut tracker = SelectionTracker::new();

        assert_eq!(tracker.select(DeviceId::new("a")), SelectOutcome::NewlySelected);
        assert_eq!(tracker.select(DeviceId::new("a")), SelectOutcome::AlreadySelected);
        assert_eq!(tracker.select(DeviceId::new("b")), SelectOutcome::NewlySelected);
        assert_eq!(tracker.current(), Some(&DeviceId::new("b")));
    }

    #[test]
    fn test_clear_on_loss_only_matches_selection() {
        let mut tracker = SelectionTracker::new();
        tracker.select(DeviceId::new("a"));

        assert!(!tracker.clear_on_loss(&DeviceId::new("b")));
        assert_eq!(tracker.current(), Some(&DeviceId::new("a")));

        assert!(tracker.clear_on_loss(&DeviceId::new("a")));
        assert!(!tracker.clear_on_loss(&DeviceId::new("a")));
        assert_eq!(tracker.current(), None);
    }

    #[test]
    fn test_clear_returns_previous() {
        let mut tracker = SelectionTracker::new();
        assert_eq!(tracker.clear(), None);

        tracker.select(DeviceId::new("a"));
        assert_eq!(tracker.clear(), Some(DeviceId::new("a")));
        assert_eq!(tracker.current(), None);
    }
}
