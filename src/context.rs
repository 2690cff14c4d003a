//! Workflow-scoped store of discovered and selected nodes.
//!
//! Keys form a fixed dependency chain. Replacing a key drops every key derived
//! from it, so a selection can never outlive the list it indexes into.
use crate::node::{Node, NodeSet};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Fixed set of values the workflow keeps between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContextKey {
    Courses,
    SelectedCourse,
    Groups,
    SelectedGroups,
}

impl ContextKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextKey::Courses => "courses",
            ContextKey::SelectedCourse => "selected_course",
            ContextKey::Groups => "groups",
            ContextKey::SelectedGroups => "selected_groups",
        }
    }

    /// Keys whose values are computed from this one.
    pub fn dependents(&self) -> &'static [ContextKey] {
        match self {
            ContextKey::Courses => &[
                ContextKey::SelectedCourse,
                ContextKey::Groups,
                ContextKey::SelectedGroups,
            ],
            ContextKey::SelectedCourse => &[ContextKey::Groups, ContextKey::SelectedGroups],
            ContextKey::Groups => &[ContextKey::SelectedGroups],
            ContextKey::SelectedGroups => &[],
        }
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A selection that does not fit the current context value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("context key `{0}` is not set")]
    Unset(ContextKey),

    #[error("index {index} is outside `{key}` (len {len})")]
    OutOfRange {
        key: ContextKey,
        index: usize,
        len: usize,
    },

    #[error("index {index} selected twice from `{key}`")]
    Duplicate { key: ContextKey, index: usize },
}

/// Node sets shared between workflow states for one run.
#[derive(Debug, Default)]
pub struct SessionContext {
    values: BTreeMap<ContextKey, NodeSet>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: ContextKey) -> Option<&NodeSet> {
        self.values.get(&key)
    }

    /// Replace the value of `key` and clear everything derived from it.
    pub fn replace(&mut self, key: ContextKey, nodes: NodeSet) {
        for dependent in key.dependents() {
            self.values.remove(dependent);
        }
        self.values.insert(key, nodes);
    }

    pub fn clear(&mut self, key: ContextKey) {
        for dependent in key.dependents() {
            self.values.remove(dependent);
        }
        self.values.remove(&key);
    }

    /// Pick nodes from the current value of `source` by index.
    pub fn select(&self, source: ContextKey, indices: &[usize]) -> Result<NodeSet, SelectionError> {
        let nodes = self.get(source).ok_or(SelectionError::Unset(source))?;
        let mut picked: Vec<Node> = Vec::with_capacity(indices.len());
        for (position, &index) in indices.iter().enumerate() {
            if indices[..position].contains(&index) {
                return Err(SelectionError::Duplicate { key: source, index });
            }
            let node = nodes.get(index).ok_or(SelectionError::OutOfRange {
                key: source,
                index,
                len: nodes.len(),
            })?;
            picked.push(node.clone());
        }
        Ok(picked)
    }

    /// The single node stored under `key`, if exactly one is stored.
    pub fn single(&self, key: ContextKey) -> Option<&Node> {
        match self.get(key).map(Vec::as_slice) {
            Some([node]) => Some(node),
            _ => None,
        }
    }
}
