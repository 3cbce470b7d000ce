use log::debug;
use nodenav_formats::Node;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("map has no BSP nodes")]
    EmptyTree,
    #[error("node {node} references child node {child}, but the map only has {len} nodes")]
    ChildOutOfRange { node: usize, child: usize, len: usize },
}

/// Parent index of every node. The root (the last node) is its own parent.
///
/// Entries never written by a child reference stay 0, the same value as
/// "parent is node 0". A single-rooted tree writes every non-root entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentMap {
    parents: Vec<usize>,
}

impl ParentMap {
    pub fn build(nodes: &[Node]) -> Result<Self, TreeError> {
        if nodes.is_empty() {
            return Err(TreeError::EmptyTree);
        }

        let len = nodes.len();
        let root = len - 1;
        let mut parents = vec![0usize; len];
        parents[root] = root;

        for (index, node) in nodes.iter().enumerate() {
            for child in node.children().into_iter().filter_map(|child| child.node()) {
                if child >= len {
                    return Err(TreeError::ChildOutOfRange {
                        node: index,
                        child,
                        len,
                    });
                }
                parents[child] = index;
            }
        }

        debug!("built parent map for {len} nodes, root {root}");
        Ok(ParentMap { parents })
    }

    pub fn root(&self) -> usize {
        self.parents.len() - 1
    }

    /// Parent of `index`, or `None` when `index` is out of range.
    pub fn parent(&self, index: usize) -> Option<usize> {
        self.parents.get(index).copied()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.parents
    }
}

pub fn build_parent_map(nodes: &[Node]) -> Result<ParentMap, TreeError> {
    ParentMap::build(nodes)
}
