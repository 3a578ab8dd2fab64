use indexmap::IndexSet;

use super::NodeKind;

/// Ordered set of expanded profile ids.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionController {
    selected: IndexSet<String>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes `id` when it is selected and appends it otherwise.
    ///
    /// Only profile nodes are selectable; returns whether the selection changed.
    pub fn toggle(&mut self, id: &str, kind: NodeKind) -> bool {
        if kind != NodeKind::Profile {
            return false;
        }
        if !self.selected.shift_remove(id) {
            self.selected.insert(id.to_owned());
        }
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.selected.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}
