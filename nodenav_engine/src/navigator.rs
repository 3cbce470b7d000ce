use log::debug;
use nodenav_formats::{ChildRef, Node};
use serde::Serialize;

use crate::tree::{ParentMap, TreeError};
use crate::viewport::{Viewport, ViewportError};

/// Title shown at the start of every heading line.
pub const HEADING_TITLE: &str = "NodeNav v0.94";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Command {
    DescendLeft,
    DescendRight,
    Ascend,
    Quit,
}

/// Whether [`Navigator::apply`] moved the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Applied,
    Ignored,
}

/// Cursor over the BSP node array, starting at the root.
#[derive(Debug, Clone)]
pub struct Navigator<'a> {
    nodes: &'a [Node],
    parents: ParentMap,
    current: usize,
}

impl<'a> Navigator<'a> {
    pub fn new(nodes: &'a [Node]) -> Result<Self, TreeError> {
        let parents = ParentMap::build(nodes)?;
        let current = parents.root();
        Ok(Navigator {
            nodes,
            parents,
            current,
        })
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_node(&self) -> &'a Node {
        &self.nodes[self.current]
    }

    pub fn is_at_root(&self) -> bool {
        self.current == self.parents.root()
    }

    /// Index the cursor would move to, or `None` when `command` leaves it
    /// where it is (leaf child, ascend at the root, quit).
    pub fn transition(&self, command: Command) -> Option<usize> {
        let node = self.current_node();
        let next = match command {
            Command::DescendLeft => node.left().node(),
            Command::DescendRight => node.right().node(),
            Command::Ascend => self.parents.parent(self.current),
            Command::Quit => None,
        };
        next.filter(|&index| index != self.current)
    }

    pub fn apply(&mut self, command: Command) -> Outcome {
        match self.transition(command) {
            Some(next) => {
                debug!("{command:?}: node {} -> {next}", self.current);
                self.current = next;
                Outcome::Applied
            }
            None => Outcome::Ignored,
        }
    }

    pub fn view(&self) -> NodeView {
        let node = *self.current_node();
        NodeView {
            index: self.current,
            node,
            left: node.left(),
            right: node.right(),
            is_root: self.is_at_root(),
        }
    }

    pub fn viewport(&self, width: u32, height: u32, margin: f64) -> Result<Viewport, ViewportError> {
        Viewport::compute(self.current_node(), width, height, margin)
    }
}

/// Snapshot of the current node handed to presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeView {
    pub index: usize,
    pub node: Node,
    pub left: ChildRef,
    pub right: ChildRef,
    pub is_root: bool,
}

impl NodeView {
    pub fn can_descend_left(&self) -> bool {
        self.left.node().is_some()
    }

    pub fn can_descend_right(&self) -> bool {
        self.right.node().is_some()
    }

    pub fn heading(&self) -> String {
        format!(
            "{HEADING_TITLE}           N:0x{:04x}     {}:0x{:04x}   {}:0x{:04x}",
            self.index,
            self.left.type_letter(),
            self.left.index(),
            self.right.type_letter(),
            self.right.index()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::{node, sample_tree, LEAF};

    #[test]
    fn starts_at_the_root() {
        let nodes = sample_tree();
        let nav = Navigator::new(&nodes).unwrap();
        assert_eq!(nav.current_index(), 4);
        assert!(nav.is_at_root());
    }

    #[test]
    fn empty_tree_cannot_be_navigated() {
        assert_eq!(Navigator::new(&[]).unwrap_err(), TreeError::EmptyTree);
    }

    #[test]
    fn ascend_at_root_is_ignored() {
        let nodes = sample_tree();
        let mut nav = Navigator::new(&nodes).unwrap();
        assert_eq!(nav.transition(Command::Ascend), None);
        assert_eq!(nav.apply(Command::Ascend), Outcome::Ignored);
        assert_eq!(nav.current_index(), 4);
    }

    #[test]
    fn descend_then_ascend_returns_to_start() {
        let nodes = sample_tree();
        let mut nav = Navigator::new(&nodes).unwrap();

        assert_eq!(nav.apply(Command::DescendLeft), Outcome::Applied);
        assert_eq!(nav.current_index(), 2);
        assert_eq!(nav.apply(Command::DescendLeft), Outcome::Applied);
        assert_eq!(nav.current_index(), 0);
        assert_eq!(nav.apply(Command::Ascend), Outcome::Applied);
        assert_eq!(nav.current_index(), 2);
        assert_eq!(nav.apply(Command::Ascend), Outcome::Applied);
        assert_eq!(nav.current_index(), 4);

        assert_eq!(nav.apply(Command::DescendRight), Outcome::Applied);
        assert_eq!(nav.current_index(), 3);
        assert_eq!(nav.apply(Command::Ascend), Outcome::Applied);
        assert_eq!(nav.current_index(), 4);
    }

    #[test]
    fn descending_into_a_leaf_is_ignored() {
        let nodes = sample_tree();
        let mut nav = Navigator::new(&nodes).unwrap();
        nav.apply(Command::DescendRight);
        assert_eq!(nav.current_index(), 3);

        assert_eq!(nav.transition(Command::DescendLeft), None);
        assert_eq!(nav.apply(Command::DescendLeft), Outcome::Ignored);
        assert_eq!(nav.apply(Command::DescendRight), Outcome::Ignored);
        assert_eq!(nav.current_index(), 3);
    }

    #[test]
    fn quit_never_moves_the_cursor() {
        let nodes = sample_tree();
        let mut nav = Navigator::new(&nodes).unwrap();
        assert_eq!(nav.apply(Command::Quit), Outcome::Ignored);
        assert_eq!(nav.current_index(), 4);
    }

    #[test]
    fn view_reports_child_kinds_and_heading() {
        let nodes = vec![node(LEAF | 0x12, LEAF | 0x34), node(0, LEAF | 0x56)];
        let nav = Navigator::new(&nodes).unwrap();
        let view = nav.view();
        assert!(view.is_root);
        assert!(view.can_descend_left());
        assert!(!view.can_descend_right());
        assert_eq!(
            view.heading(),
            "NodeNav v0.94           N:0x0001     N:0x0000   S:0x0056"
        );

        let json = serde_json::to_value(view).unwrap();
        assert_eq!(json["left"]["kind"], "node");
        assert_eq!(json["right"]["index"], 0x56);
    }

    #[test]
    fn viewport_follows_the_cursor() {
        let nodes = sample_tree();
        let nav = Navigator::new(&nodes).unwrap();
        let view = nav.viewport(640, 480, 0.1).unwrap();
        assert!((view.scale - 21.6).abs() < 1e-9);
    }
}
