//! Layout containers.

use serde::Serialize;

use super::NodeId;

/// Presentation flavor of a container. All flavors behave the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    Tab,
    Row,
    Column,
    Accordion,
    Group,
}

impl ContainerKind {
    /// Map a layout directive (`TAB`, `ROW`, ...).
    pub fn from_directive(directive: &str) -> Option<Self> {
        match directive {
            "TAB" => Some(Self::Tab),
            "ROW" => Some(Self::Row),
            "COLUMN" => Some(Self::Column),
            "ACCORDION" => Some(Self::Accordion),
            "GROUP" => Some(Self::Group),
            _ => None,
        }
    }
}

/// A node that holds child nodes, optionally with Reset and Randomize
/// buttons acting on all of them.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub kind: ContainerKind,
    pub label: String,
    pub children: Vec<NodeId>,
    pub reset_button: bool,
    pub random_button: bool,
    /// Accordions start expanded when set.
    pub open: bool,
    /// Relative width hint for rows and columns.
    pub scale: Option<u32>,
}

impl Container {
    pub fn new(kind: ContainerKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            children: Vec::new(),
            reset_button: false,
            random_button: false,
            open: false,
            scale: None,
        }
    }
}
