//! Property tree nodes.
//!
//! A property is a task, resource, account, or shift. Properties form a
//! tree within their [`PropertySet`](super::PropertySet). Each node holds
//! its scenario-independent attributes plus one scenario object per
//! scenario; scenario-specific state is reached through
//! [`PropertyTreeNode::scenario`] rather than through the node itself.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{Attribute, AttributeValue};
use crate::message::SourceLocation;
use crate::scenario::Scenario;

/// Kind of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PropertyKind {
    Task,
    Resource,
    Account,
    Shift,
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PropertyKind::Task => "task",
            PropertyKind::Resource => "resource",
            PropertyKind::Account => "account",
            PropertyKind::Shift => "shift",
        };
        f.write_str(s)
    }
}

/// Addresses any property of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyRef {
    /// Which set the property lives in.
    pub kind: PropertyKind,
    /// Index within that set.
    pub index: usize,
}

impl PropertyRef {
    /// Creates a new reference.
    pub fn new(kind: PropertyKind, index: usize) -> Self {
        Self { kind, index }
    }

    /// Reference to a task.
    pub fn task(index: usize) -> Self {
        Self::new(PropertyKind::Task, index)
    }

    /// Reference to a resource.
    pub fn resource(index: usize) -> Self {
        Self::new(PropertyKind::Resource, index)
    }
}

/// Kind-independent, read-only view of a property.
pub trait Property {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn kind(&self) -> PropertyKind;
    fn index(&self) -> usize;
    fn sequence_no(&self) -> usize;
    fn parent(&self) -> Option<usize>;
    fn children(&self) -> &[usize];
    /// Depth in the tree; roots have level 0.
    fn level(&self) -> usize;
    fn is_leaf(&self) -> bool;
    /// Value of an attribute. `scenario` is `None` for scenario-independent
    /// attributes; scenario lookups fall back to them.
    fn get(&self, attribute: &str, scenario: Option<usize>) -> Option<&AttributeValue>;
    fn source_location(&self) -> Option<&SourceLocation>;
}

/// A node of a property tree.
#[derive(Debug, Clone)]
pub struct PropertyTreeNode<S> {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) kind: PropertyKind,
    pub(crate) index: usize,
    pub(crate) sequence_no: usize,
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,
    pub(crate) level: usize,
    pub(crate) attributes: BTreeMap<String, Attribute>,
    pub(crate) scenarios: Vec<S>,
    pub(crate) source_location: Option<SourceLocation>,
}

impl<S: Scenario> PropertyTreeNode<S> {
    /// Property ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index within the owning set.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Parent index.
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Child indices in declaration order.
    pub fn children(&self) -> &[usize] {
        &self.children
    }

    /// Depth in the tree; roots have level 0.
    pub fn level(&self) -> usize {
        self.level
    }

    /// Whether the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Whether the node has children.
    pub fn is_container(&self) -> bool {
        !self.children.is_empty()
    }

    /// Scenario-specific state.
    ///
    /// # Panics
    /// Panics if `idx` is not a scenario index of the project.
    pub fn scenario(&self, idx: usize) -> &S {
        &self.scenarios[idx]
    }

    /// Mutable scenario-specific state.
    ///
    /// # Panics
    /// Panics if `idx` is not a scenario index of the project.
    pub fn scenario_mut(&mut self, idx: usize) -> &mut S {
        &mut self.scenarios[idx]
    }

    /// All scenario objects.
    pub fn scenarios(&self) -> &[S] {
        &self.scenarios
    }

    /// Scenario-independent attribute entry.
    pub fn attribute(&self, id: &str) -> Option<&Attribute> {
        self.attributes.get(id)
    }

    /// Records where the property was defined.
    pub fn set_source_location(&mut self, location: SourceLocation) {
        self.source_location = Some(location.clone());
        for s in &mut self.scenarios {
            s.data_mut().source_location = Some(location.clone());
        }
    }
}

impl<S: Scenario> Property for PropertyTreeNode<S> {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> PropertyKind {
        self.kind
    }

    fn index(&self) -> usize {
        self.index
    }

    fn sequence_no(&self) -> usize {
        self.sequence_no
    }

    fn parent(&self) -> Option<usize> {
        self.parent
    }

    fn children(&self) -> &[usize] {
        &self.children
    }

    fn level(&self) -> usize {
        self.level
    }

    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn get(&self, attribute: &str, scenario: Option<usize>) -> Option<&AttributeValue> {
        let global = || self.attributes.get(attribute).and_then(Attribute::value);
        match scenario {
            Some(idx) => self
                .scenarios
                .get(idx)
                .and_then(|s| s.data().attribute(attribute))
                .or_else(global),
            None => global(),
        }
    }

    fn source_location(&self) -> Option<&SourceLocation> {
        self.source_location.as_ref()
    }
}
