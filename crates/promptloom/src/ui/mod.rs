//! Layout tree of UI nodes.
//!
//! Nodes live in an arena owned by [`UiTree`] and refer to each other by
//! [`NodeId`]. Fragments are never stored in nodes; editors and dropdowns hold
//! fragment names and resolve them against the
//! [`FragmentRegistry`](crate::registry::FragmentRegistry) on every access.
//!
//! Nodes that take part in global Apply/Reset/Clear are additionally listed
//! in the tree's registered set, in registration order.

pub mod container;
pub mod dropdown;
pub mod editor;
pub mod preset;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use container::{Container, ContainerKind};
pub use dropdown::{ChoiceSet, ChoiceView, Dropdown, DropdownInput, DropdownView};
pub use editor::{EditorInput, EditorView, FragmentView, PromptEditor};
pub use preset::Preset;

/// Index of a node in the [`UiTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One element of the layout tree.
#[derive(Debug, Clone, PartialEq)]
pub enum UiNode {
    Separator,
    Editor(PromptEditor),
    Dropdown(Dropdown),
    Container(Container),
    Preset(Preset),
}

impl UiNode {
    /// Display label, where the node has one.
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Separator => None,
            Self::Editor(e) => e.fragment(),
            Self::Dropdown(d) => Some(&d.label),
            Self::Container(c) => Some(&c.label),
            Self::Preset(p) => Some(p.name()),
        }
    }
}

/// Refresh descriptor emitted after a handler runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum WidgetUpdate {
    Editor(EditorView),
    Dropdown(DropdownView),
}

/// Current widget values of one node, consumed by the global Apply/Remove
/// actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum NodeInput {
    Editor(EditorInput),
    Dropdown(DropdownInput),
}

/// Arena of UI nodes plus the registered (editable) subset.
#[derive(Debug, Clone, Default)]
pub struct UiTree {
    nodes: Vec<UiNode>,
    registered: Vec<NodeId>,
    roots: Vec<NodeId>,
}

impl UiTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: UiNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Add `id` to the set used by global actions and non-additive presets.
    pub fn register(&mut self, id: NodeId) {
        if !self.registered.contains(&id) {
            self.registered.push(id);
        }
    }

    pub fn add_root(&mut self, id: NodeId) {
        self.roots.push(id);
    }

    pub fn get(&self, id: NodeId) -> Option<&UiNode> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut UiNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn registered(&self) -> &[NodeId] {
        &self.registered
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// `id` and everything below it, in preorder.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let Some(node) = self.get(next) else {
                continue;
            };
            out.push(next);
            if let UiNode::Container(c) = node {
                stack.extend(c.children.iter().rev());
            }
        }
        out
    }

    /// The registered editor or dropdown that hosts `fragment`.
    pub fn owner_of(&self, fragment: &str) -> Option<NodeId> {
        self.registered.iter().copied().find(|&id| match self.get(id) {
            Some(UiNode::Editor(e)) => e.fragment() == Some(fragment),
            Some(UiNode::Dropdown(d)) => d.owns(fragment),
            _ => false,
        })
    }

    /// First container or dropdown with this label.
    pub fn find_by_label(&self, label: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| match n {
                UiNode::Container(c) => c.label == label,
                UiNode::Dropdown(d) => d.label == label,
                _ => false,
            })
            .map(NodeId)
    }
}
