//! Observer interfaces for whoever displays the tree

/// Notified after any action that may change highlighting or undo/redo
/// availability
pub trait SelectionObserver {
    fn selection_changed(&mut self);
}

/// Notified after structural or attribute changes that need re-display
pub trait TreeUpdateObserver {
    fn tree_updated(&mut self);
}

impl<F: FnMut()> SelectionObserver for F {
    fn selection_changed(&mut self) {
        self()
    }
}

impl<F: FnMut()> TreeUpdateObserver for F {
    fn tree_updated(&mut self) {
        self()
    }
}
