use std::collections::BTreeMap;

/// A named copy of some context state.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextSnapshot<T> {
    pub name: String,
    pub state: T,
}

/// Saved copies of an explicit context value.
///
/// Supports two access patterns over the same state type: named slots
/// (`save` / `restore`) for switching between long-lived contexts such as
/// split-screen views, and a stack (`push` / `pop`) for temporary overrides.
/// Restoring clones the stored value, so a slot can be restored repeatedly.
#[derive(Debug, Clone)]
pub struct ContextStack<T> {
    slots: BTreeMap<String, T>,
    stack: Vec<ContextSnapshot<T>>,
}

impl<T> Default for ContextStack<T> {
    fn default() -> Self {
        Self {
            slots: BTreeMap::new(),
            stack: Vec::new(),
        }
    }
}

impl<T: Clone> ContextStack<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a copy of `state` under `name`, replacing any previous copy.
    pub fn save(&mut self, name: impl Into<String>, state: &T) {
        let name = name.into();
        tracing::debug!(%name, "saving context");
        self.slots.insert(name, state.clone());
    }

    /// A copy of the state saved under `name`, if any.
    pub fn restore(&self, name: &str) -> Option<T> {
        self.slots.get(name).cloned()
    }

    /// Drop a named slot, returning its state.
    pub fn forget(&mut self, name: &str) -> Option<T> {
        self.slots.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Names of all saved slots in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    pub fn push(&mut self, name: impl Into<String>, state: T) {
        self.stack.push(ContextSnapshot {
            name: name.into(),
            state,
        });
    }

    pub fn pop(&mut self) -> Option<ContextSnapshot<T>> {
        self.stack.pop()
    }

    pub fn peek(&self) -> Option<&ContextSnapshot<T>> {
        self.stack.last()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}
