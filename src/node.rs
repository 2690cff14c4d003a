//! Resource nodes discovered on the remote platform.
//!
//! A node is identified by its reference id alone; the kind and title are
//! display and routing data attached by whichever lookup produced it.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference id assigned by the remote platform, unique within one session.
pub type NodeId = i64;

/// Object kinds the platform exposes in its repository tree.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Root,
    Category,
    Course,
    Group,
    Folder,
    File,
}

impl NodeKind {
    /// Return the stable identifier used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Category => "category",
            NodeKind::Course => "course",
            NodeKind::Group => "group",
            NodeKind::Folder => "folder",
            NodeKind::File => "file",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One object in the platform's repository tree.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    #[serde(default)]
    pub title: String,
}

impl Node {
    pub fn new(id: NodeId, kind: NodeKind, title: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            title: title.into(),
        }
    }

    /// True when the lookup that produced this node did not carry a title.
    pub fn needs_title(&self) -> bool {
        self.title.trim().is_empty()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Title for listings, falling back to the reference id.
    pub fn label(&self) -> String {
        if self.needs_title() {
            format!("#{}", self.id)
        } else {
            self.title.clone()
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (ref {})", self.label(), self.id)
    }
}

/// Nodes in discovery order. Duplicates returned by the platform are kept.
pub type NodeSet = Vec<Node>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nodes_compare_by_reference_id_only() {
        let a = Node::new(7, NodeKind::Group, "Tutorial A");
        let b = Node::new(7, NodeKind::Group, "renamed");
        let c = Node::new(8, NodeKind::Group, "Tutorial A");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn label_falls_back_to_reference_id() {
        let mut node = Node::new(42, NodeKind::Course, "  ");
        assert!(node.needs_title());
        assert_eq!(node.label(), "#42");
        node.set_title("Algorithms");
        assert_eq!(node.to_string(), "Algorithms (ref 42)");
    }

    #[test]
    fn kind_uses_snake_case_on_the_wire() {
        let json = serde_json::to_string(&NodeKind::Folder).expect("serialize kind");
        assert_eq!(json, "\"folder\"");
        let node: Node =
            serde_json::from_str(r#"{"id": 3, "kind": "group"}"#).expect("parse node");
        assert_eq!(node.kind, NodeKind::Group);
        assert!(node.title.is_empty());
    }
}
