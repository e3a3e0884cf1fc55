//! Tree editor - the single entry point for editing a field tree
//!
//! `TreeEditor` owns the tree, the selection and the undo history. Every
//! named action reads the selection, runs the matching edit, records the
//! command and tells the observers.

use crate::{
    AttributeEditKind, Command, DeleteFields, DemoteFields, EditAttributes, EditorSettings,
    InsertFields, MoveDirection, MoveFields, PromoteFields, Replay, Result, SelectionObserver,
    TreeUpdateObserver, UndoManager,
};
use field_tree::mutator::{self, Insertion, SiblingRun};
use field_tree::{
    locking, values, AttributeChange, Attributes, EditOutcome, FieldNode, FieldTree,
    ImportSource, LockLevel, NodeId, SelectionSet, INPUT_TYPE, LOCKED_FIELD_UTC, VERSION,
};

/// Named editing actions, as offered by menus and toolbars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MoveFieldsUp,
    MoveFieldsDown,
    DeleteFields,
    AddNewField,
    DemoteFields,
    PromoteFields,
    DuplicateFields,
    Undo,
    Redo,
    /// Needs a source tree, see [`TreeEditor::import_fields`]
    ImportFields,
    LoadDefaults,
    LoadDefaultsHighlighted,
    ClearFields,
    ClearFieldsHighlighted,
    RequiredFields,
}

impl Action {
    pub const ALL: [Action; 15] = [
        Action::MoveFieldsUp,
        Action::MoveFieldsDown,
        Action::DeleteFields,
        Action::AddNewField,
        Action::DemoteFields,
        Action::PromoteFields,
        Action::DuplicateFields,
        Action::Undo,
        Action::Redo,
        Action::ImportFields,
        Action::LoadDefaults,
        Action::LoadDefaultsHighlighted,
        Action::ClearFields,
        Action::ClearFieldsHighlighted,
        Action::RequiredFields,
    ];

    /// Display label of the action
    pub fn label(&self) -> &'static str {
        match self {
            Action::MoveFieldsUp => "Move Fields Up",
            Action::MoveFieldsDown => "Move Fields Down",
            Action::DeleteFields => "Delete Fields",
            Action::AddNewField => "Add New Field",
            Action::DemoteFields => "Demote Fields",
            Action::PromoteFields => "Promote Fields",
            Action::DuplicateFields => "Duplicate Fields",
            Action::Undo => "Undo Last Action",
            Action::Redo => "Redo",
            Action::ImportFields => "Import Fields",
            Action::LoadDefaults => "Load Default Values",
            Action::LoadDefaultsHighlighted => "Load Defaults for Highlighted Fields",
            Action::ClearFields => "Clear Fields",
            Action::ClearFieldsHighlighted => "Clear Fields for Highlighted Fields",
            Action::RequiredFields => "Set Highlighted Fields as mandatory",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Editing facade over one field tree
pub struct TreeEditor {
    tree: FieldTree,
    selection: SelectionSet,
    history: UndoManager,
    settings: EditorSettings,
    /// Set by every recorded edit, cleared by the owner after saving
    edited: bool,
    selection_observer: Option<Box<dyn SelectionObserver + Send>>,
    tree_observer: Option<Box<dyn TreeUpdateObserver + Send>>,
}

impl TreeEditor {
    /// Create an editor over a blank protocol
    pub fn new() -> Self {
        Self::with_tree(FieldTree::blank_protocol())
    }

    pub fn with_tree(tree: FieldTree) -> Self {
        Self::with_settings(tree, EditorSettings::default())
    }

    pub fn with_settings(tree: FieldTree, settings: EditorSettings) -> Self {
        Self {
            tree,
            selection: SelectionSet::new(),
            history: UndoManager::with_limit(settings.history.max_entries),
            settings,
            edited: false,
            selection_observer: None,
            tree_observer: None,
        }
    }

    pub fn set_selection_observer(&mut self, observer: impl SelectionObserver + Send + 'static) {
        self.selection_observer = Some(Box::new(observer));
    }

    pub fn set_tree_observer(&mut self, observer: impl TreeUpdateObserver + Send + 'static) {
        self.tree_observer = Some(Box::new(observer));
    }

    pub fn tree(&self) -> &FieldTree {
        &self.tree
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn root(&self) -> NodeId {
        self.tree.root_id()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.tree.children(id)
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.tree.get(id).and_then(|node| node.attributes.get(name))
    }

    /// Replace the whole tree. Selection and history refer to the old tree
    /// and are discarded.
    pub fn set_root(&mut self, tree: FieldTree) {
        self.tree = tree;
        self.selection.reset();
        self.history.clear();
        self.edited = false;
        self.notify_tree_updated();
        self.notify_selection_changed();
    }

    // ---- attribute access ----

    /// Set one attribute. With `add_to_history` the change is undoable and
    /// marks the tree as edited.
    pub fn set_attribute(
        &mut self,
        node: NodeId,
        name: &str,
        value: impl Into<String>,
        add_to_history: bool,
    ) -> Result<()> {
        self.write_attribute(node, name, Some(value.into()), add_to_history)
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str, add_to_history: bool) -> Result<()> {
        self.write_attribute(node, name, None, add_to_history)
    }

    fn write_attribute(
        &mut self,
        node: NodeId,
        name: &str,
        value: Option<String>,
        add_to_history: bool,
    ) -> Result<()> {
        let Some(change) = values::set_attribute(&mut self.tree, node, name, value)? else {
            return Ok(());
        };
        if add_to_history {
            self.record(Box::new(EditAttributes::new(
                AttributeEditKind::SetAttribute(name.to_string()),
                vec![change],
            )));
        } else if name == INPUT_TYPE {
            // the field changes kind and has to be redrawn
            self.notify_tree_updated();
        }
        Ok(())
    }

    // ---- named actions ----

    /// Run a named action
    pub fn edit_tree(&mut self, action: Action) -> Result<()> {
        tracing::trace!(action = action.label(), "edit_tree");
        match action {
            Action::MoveFieldsUp => self.move_fields_up(),
            Action::MoveFieldsDown => self.move_fields_down(),
            Action::DeleteFields => self.delete_fields(),
            Action::AddNewField => self.add_field().map(|_| ()),
            Action::DemoteFields => self.demote_fields(),
            Action::PromoteFields => self.promote_fields(),
            Action::DuplicateFields => self.duplicate_fields(),
            Action::Undo => self.undo(),
            Action::Redo => self.redo(),
            Action::ImportFields => {
                tracing::trace!("import needs a source tree, ignored");
                Ok(())
            }
            Action::LoadDefaults => self.load_defaults(),
            Action::LoadDefaultsHighlighted => self.load_defaults_highlighted(),
            Action::ClearFields => self.clear_fields(),
            Action::ClearFieldsHighlighted => self.clear_highlighted_fields(),
            Action::RequiredFields => self.set_required_fields(),
        }
    }

    /// Insert a new field after the last highlighted one, or at the end of
    /// the root's children when nothing is highlighted. The new field
    /// becomes the selection.
    pub fn add_field(&mut self) -> Result<NodeId> {
        let (parent, index) = self.insertion_point();
        let node = FieldNode::with_attributes(self.settings.new_field.attributes());
        let id = mutator::insert_child(&mut self.tree, parent, node, index)?;
        self.selection.select(&mut self.tree, id, true)?;
        self.record(Box::new(InsertFields::added(Insertion {
            parent,
            index,
            ids: vec![id],
        })));
        Ok(id)
    }

    pub fn delete_fields(&mut self) -> Result<()> {
        let ids = self.selection.fields().to_vec();
        if ids.is_empty() {
            return Ok(());
        }
        // checked up front so a failed delete leaves the selection alone
        SiblingRun::resolve(&self.tree, &ids)?;
        self.selection.clear(&mut self.tree);
        let removals = mutator::delete_nodes(&mut self.tree, &ids)?;
        self.record(Box::new(DeleteFields::new(removals)));
        Ok(())
    }

    pub fn move_fields_up(&mut self) -> Result<()> {
        self.move_fields(MoveDirection::Up)
    }

    pub fn move_fields_down(&mut self) -> Result<()> {
        self.move_fields(MoveDirection::Down)
    }

    fn move_fields(&mut self, direction: MoveDirection) -> Result<()> {
        let ids = self.selection.fields().to_vec();
        if ids.is_empty() {
            return Ok(());
        }
        let outcome = match direction {
            MoveDirection::Up => mutator::move_up(&mut self.tree, &ids)?,
            MoveDirection::Down => mutator::move_down(&mut self.tree, &ids)?,
        };
        match outcome {
            EditOutcome::Applied(run) => {
                self.record(Box::new(MoveFields::new(direction, run.into_ids())));
            }
            EditOutcome::Boundary(boundary) => {
                tracing::trace!(?direction, %boundary, "move ignored");
            }
        }
        Ok(())
    }

    /// Move the highlighted run out of its parent, right after it
    pub fn promote_fields(&mut self) -> Result<()> {
        let ids = self.selection.fields().to_vec();
        if ids.is_empty() {
            return Ok(());
        }
        match mutator::promote(&mut self.tree, &ids)? {
            EditOutcome::Applied(movement) => self.record(Box::new(PromoteFields::new(movement))),
            EditOutcome::Boundary(boundary) => tracing::trace!(%boundary, "promote ignored"),
        }
        Ok(())
    }

    /// Move the highlighted run to the end of its preceding sibling's
    /// children
    pub fn demote_fields(&mut self) -> Result<()> {
        let ids = self.selection.fields().to_vec();
        if ids.is_empty() {
            return Ok(());
        }
        match mutator::demote(&mut self.tree, &ids)? {
            EditOutcome::Applied(movement) => self.record(Box::new(DemoteFields::new(movement))),
            EditOutcome::Boundary(boundary) => tracing::trace!(%boundary, "demote ignored"),
        }
        Ok(())
    }

    /// Copy the highlighted run and insert the copies after it. The copies
    /// become the selection.
    pub fn duplicate_fields(&mut self) -> Result<()> {
        let ids = self.selection.fields().to_vec();
        if ids.is_empty() {
            return Ok(());
        }
        let insertion =
            mutator::duplicate(&mut self.tree, &ids, self.settings.duplicate_lock_attributes)?;
        self.selection.select_run(&mut self.tree, &insertion.ids)?;
        self.record(Box::new(InsertFields::duplicated(insertion)));
        Ok(())
    }

    /// Copy fields from another tree and insert them where a new field
    /// would go. Returns the ids of the copies, which become the selection.
    pub fn import_fields<S: ImportSource + ?Sized>(
        &mut self,
        source: &S,
        source_ids: &[NodeId],
    ) -> Result<Vec<NodeId>> {
        if source_ids.is_empty() {
            return Ok(Vec::new());
        }
        let (parent, index) = self.insertion_point();
        let insertion = mutator::import_nodes(&mut self.tree, source, source_ids, parent, index)?;
        self.selection.select_run(&mut self.tree, &insertion.ids)?;
        let ids = insertion.ids.clone();
        self.record(Box::new(InsertFields::imported(insertion)));
        Ok(ids)
    }

    /// Copy default values into every field of the tree
    pub fn load_defaults(&mut self) -> Result<()> {
        let root = self.tree.root_id();
        let changes = values::copy_default_values(&mut self.tree, &[root])?;
        self.record_attribute_edit(AttributeEditKind::LoadDefaults, changes);
        Ok(())
    }

    /// Copy default values into the highlighted fields and their descendants
    pub fn load_defaults_highlighted(&mut self) -> Result<()> {
        let ids = self.highlighted_fields();
        let changes = values::copy_default_values(&mut self.tree, &ids)?;
        self.record_attribute_edit(AttributeEditKind::LoadDefaults, changes);
        Ok(())
    }

    /// Remove the value of every field of the tree
    pub fn clear_fields(&mut self) -> Result<()> {
        let root = self.tree.root_id();
        let changes = values::clear_values(&mut self.tree, &[root])?;
        self.record_attribute_edit(AttributeEditKind::ClearFields, changes);
        Ok(())
    }

    pub fn clear_highlighted_fields(&mut self) -> Result<()> {
        let ids = self.highlighted_fields();
        let changes = values::clear_values(&mut self.tree, &ids)?;
        self.record_attribute_edit(AttributeEditKind::ClearFields, changes);
        Ok(())
    }

    /// Multiply the values of the highlighted number fields by `factor`
    pub fn multiply_values(&mut self, factor: f64) -> Result<()> {
        let ids = self.highlighted_fields();
        let changes = values::multiply_values(&mut self.tree, &ids, factor)?;
        self.record_attribute_edit(AttributeEditKind::MultiplyValues, changes);
        Ok(())
    }

    /// Stamp the highlighted fields as locked now, together with the given
    /// locking attributes (user name, lock level, ...)
    pub fn lock_highlighted_fields(&mut self, locking_attributes: &[(String, String)]) -> Result<()> {
        let ids = self.highlighted_fields();
        let now = chrono::Utc::now().timestamp_millis();
        let changes = values::lock_fields(&mut self.tree, &ids, locking_attributes, now)?;
        self.record_attribute_edit(AttributeEditKind::LockFields, changes);
        Ok(())
    }

    pub fn unlock_highlighted_fields(&mut self) -> Result<()> {
        let ids = self.highlighted_fields();
        let changes = values::unlock_fields(&mut self.tree, &ids)?;
        self.record_attribute_edit(AttributeEditKind::UnlockFields, changes);
        Ok(())
    }

    /// Mark the highlighted fields as mandatory
    pub fn set_required_fields(&mut self) -> Result<()> {
        let ids = self.highlighted_fields();
        let changes = values::set_required(&mut self.tree, &ids, true)?;
        self.record_attribute_edit(AttributeEditKind::RequiredFields, changes);
        Ok(())
    }

    // ---- selection ----

    /// Highlight a node, see [`SelectionSet::select`]
    pub fn node_selected(&mut self, node: NodeId, clear_others: bool) -> Result<()> {
        self.selection.select(&mut self.tree, node, clear_others)?;
        self.notify_selection_changed();
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear(&mut self.tree);
        self.notify_selection_changed();
    }

    pub fn highlighted_fields(&self) -> Vec<NodeId> {
        self.selection.highlighted(&self.tree)
    }

    // ---- history ----

    pub fn undo(&mut self) -> Result<()> {
        self.replay(Replay::Undo)
    }

    pub fn redo(&mut self) -> Result<()> {
        self.replay(Replay::Redo)
    }

    fn replay(&mut self, replay: Replay) -> Result<()> {
        let replayed = match replay {
            Replay::Undo => self.history.undo(&mut self.tree)?,
            Replay::Redo => self.history.redo(&mut self.tree)?,
        };
        let Some(command) = replayed else {
            return Ok(());
        };
        let reselect = command.selection_after(replay);
        let redisplay = command.needs_redisplay();

        self.reselect(&reselect);
        self.edited = true;
        if redisplay {
            self.notify_tree_updated();
        }
        self.notify_selection_changed();
        Ok(())
    }

    fn reselect(&mut self, ids: &[NodeId]) {
        if !ids.is_empty() {
            match self.selection.select_run(&mut self.tree, ids) {
                Ok(()) => return,
                Err(e) => tracing::trace!("replayed fields not reselected: {}", e),
            }
        }
        self.selection.prune(&mut self.tree);
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_command_name(&self) -> String {
        self.history.undo_presentation_name()
    }

    pub fn redo_command_name(&self) -> String {
        self.history.redo_presentation_name()
    }

    pub fn history_state(&self) -> crate::HistoryState {
        self.history.state()
    }

    pub fn history(&self) -> &UndoManager {
        &self.history
    }

    // ---- queries ----

    /// Fields with an attribute value containing `word`, ignoring case, in
    /// tree order
    pub fn search(&self, word: &str) -> Vec<NodeId> {
        self.tree
            .iter()
            .filter(|field| field.attributes.contains_search_word(word))
            .map(FieldNode::id)
            .collect()
    }

    /// Whether a highlighted field, or one of its ancestors, is locked
    pub fn are_highlighted_fields_locked(&self) -> bool {
        locking::is_attribute_set_in_lineage(&self.tree, &self.highlighted_fields(), LOCKED_FIELD_UTC)
    }

    /// Whether an ancestor of the highlighted fields is locked
    pub fn are_ancestor_fields_locked(&self) -> bool {
        locking::is_ancestor_attribute_set(&self.tree, &self.highlighted_fields(), LOCKED_FIELD_UTC)
    }

    /// Lock details of the highlighted fields that are locked
    pub fn locked_fields_attributes(&self) -> Vec<Attributes> {
        locking::locked_fields_attributes(&self.tree, &self.highlighted_fields())
    }

    /// Highest lock level in the whole tree
    pub fn max_locking_level(&self) -> Option<LockLevel> {
        locking::max_lock_level(self.tree.iter())
    }

    pub fn max_highlighted_locking_level(&self) -> Option<LockLevel> {
        let ids = self.highlighted_fields();
        locking::max_lock_level(ids.iter().filter_map(|&id| self.tree.get(id)))
    }

    /// Highest lock level below the highlighted fields, not counting the
    /// fields themselves
    pub fn max_highlighted_child_locking_level(&self) -> Option<LockLevel> {
        let children: Vec<NodeId> = self
            .highlighted_fields()
            .iter()
            .flat_map(|&id| self.tree.children(id).iter().copied())
            .collect();
        locking::max_subtree_lock_level(&self.tree, &children)
    }

    pub fn is_any_required_field_empty(&self) -> bool {
        locking::is_any_required_field_empty(&self.tree)
    }

    /// Whether loading defaults for the whole tree would overwrite a value
    pub fn is_any_default_field_filled(&self) -> bool {
        locking::is_any_default_field_filled(self.tree.iter())
    }

    pub fn is_any_highlighted_default_field_filled(&self) -> bool {
        let ids = self.highlighted_fields();
        locking::is_any_default_field_filled(ids.iter().flat_map(|&id| self.tree.descendants(id)))
    }

    pub fn is_edited(&self) -> bool {
        self.edited
    }

    pub fn set_edited(&mut self, edited: bool) {
        self.edited = edited;
    }

    /// Stamp the root with a version number. Not undoable.
    pub fn set_version_number(&mut self, version: impl Into<String>) -> Result<()> {
        let root = self.tree.root_id();
        values::set_attribute(&mut self.tree, root, VERSION, Some(version.into()))?;
        self.edited = true;
        Ok(())
    }

    pub fn version_number(&self) -> Option<&str> {
        self.tree.root().and_then(|root| root.attributes.get(VERSION))
    }

    // ---- internals ----

    /// After the last highlighted field, else after the root's last child
    fn insertion_point(&self) -> (NodeId, usize) {
        let after_last = self.selection.last().and_then(|last| {
            let parent = self.tree.parent(last)?;
            let index = self.tree.sibling_index(last)?;
            Some((parent, index + 1))
        });
        after_last.unwrap_or_else(|| {
            let root = self.tree.root_id();
            (root, self.tree.children(root).len())
        })
    }

    fn record_attribute_edit(&mut self, kind: AttributeEditKind, changes: Vec<AttributeChange>) {
        if changes.is_empty() {
            tracing::trace!(?kind, "nothing changed");
            return;
        }
        self.record(Box::new(EditAttributes::new(kind, changes)));
    }

    fn record(&mut self, command: Box<dyn Command>) {
        let redisplay = command.needs_redisplay();
        self.history.post(command);
        self.edited = true;
        if redisplay {
            self.notify_tree_updated();
        }
        self.notify_selection_changed();
    }

    fn notify_selection_changed(&mut self) {
        if let Some(observer) = self.selection_observer.as_mut() {
            observer.selection_changed();
        }
    }

    fn notify_tree_updated(&mut self) {
        if let Some(observer) = self.tree_observer.as_mut() {
            observer.tree_updated();
        }
    }
}

impl Default for TreeEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TreeEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeEditor")
            .field("fields", &self.tree.len())
            .field("selection", &self.selection)
            .field("history", &self.history)
            .field("edited", &self.edited)
            .finish()
    }
}
