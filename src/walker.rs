//! Depth-bounded discovery of target nodes below a root.
use crate::endpoint::{Endpoint, Session};
use crate::error::EndpointError;
use crate::node::{Node, NodeId, NodeKind, NodeSet};
use tracing::debug;

/// What to collect and what to descend through.
#[derive(Debug, Clone, Copy)]
pub struct WalkSpec {
    pub target: NodeKind,
    pub container: NodeKind,
    /// Deepest container level explored; 0 means only direct children of the root.
    pub max_depth: u32,
}

impl WalkSpec {
    pub fn groups_in_folders(max_depth: u32) -> Self {
        Self {
            target: NodeKind::Group,
            container: NodeKind::Folder,
            max_depth,
        }
    }
}

/// Collect every `spec.target` node reachable from `root` through
/// `spec.container` nodes without exceeding `spec.max_depth`.
///
/// Containers are visited depth first; the targets of a node follow the
/// targets found in its containers. Any failed lookup fails the whole walk.
pub fn discover(
    endpoint: &dyn Endpoint,
    session: &Session,
    root: NodeId,
    spec: WalkSpec,
) -> Result<NodeSet, EndpointError> {
    let mut found = Vec::new();
    walk(endpoint, session, root, 0, spec, &mut found)?;
    debug!(root, found = found.len(), max_depth = spec.max_depth, "discovery finished");
    Ok(found)
}

fn walk(
    endpoint: &dyn Endpoint,
    session: &Session,
    parent: NodeId,
    depth: u32,
    spec: WalkSpec,
    found: &mut Vec<Node>,
) -> Result<(), EndpointError> {
    let child_depth = depth + 1;
    if child_depth <= spec.max_depth {
        let containers = endpoint.list_children(session, parent, &[spec.container])?;
        for container in containers {
            walk(endpoint, session, container.id, child_depth, spec, found)?;
        }
    }
    let targets = endpoint.list_children(session, parent, &[spec.target])?;
    found.extend(targets);
    Ok(())
}
