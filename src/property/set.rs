//! Canonical property collections.
//!
//! A [`PropertySet`] owns every property of one kind, unique by ID, plus
//! the attribute declarations for that kind. Properties are stored in
//! declaration order; a parent is always declared before its children,
//! so iterating by index visits parents first.

use std::collections::HashMap;

use super::{Attribute, AttributeDefinition, AttributeValue, PropertyKind, PropertyTreeNode};
use crate::error::PropertyError;
use crate::scenario::{Scenario, ScenarioData};

/// Attribute IDs every property answers without a declaration.
pub const SPECIAL_ATTRIBUTES: &[&str] = &["id", "name", "seqno", "treelevel"];

/// All properties of one kind.
#[derive(Debug, Clone)]
pub struct PropertySet<S> {
    scenario_count: usize,
    definitions: Vec<AttributeDefinition>,
    nodes: Vec<PropertyTreeNode<S>>,
    by_id: HashMap<String, usize>,
}

impl<S: Scenario> PropertySet<S> {
    /// Creates an empty set with the built-in attributes of `S` declared.
    pub fn new(scenario_count: usize) -> Self {
        Self {
            scenario_count,
            definitions: S::definitions(),
            nodes: Vec::new(),
            by_id: HashMap::new(),
        }
    }

    /// Kind of the properties in this set.
    pub fn kind(&self) -> PropertyKind {
        S::KIND
    }

    /// Number of scenarios each property carries.
    pub fn scenario_count(&self) -> usize {
        self.scenario_count
    }

    /// Declares an additional attribute.
    ///
    /// # Errors
    /// [`PropertyError::LateAttributeDeclaration`] once a property has been
    /// added; [`PropertyError::DuplicateId`] if the attribute exists.
    pub fn declare(&mut self, definition: AttributeDefinition) -> Result<(), PropertyError> {
        if !self.nodes.is_empty() {
            return Err(PropertyError::LateAttributeDeclaration(definition.id));
        }
        if self.definition(&definition.id).is_some() {
            return Err(PropertyError::DuplicateId {
                kind: "attribute".into(),
                id: definition.id,
            });
        }
        self.definitions.push(definition);
        Ok(())
    }

    /// Declaration of an attribute.
    pub fn definition(&self, id: &str) -> Option<&AttributeDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    /// All declarations.
    pub fn definitions(&self) -> &[AttributeDefinition] {
        &self.definitions
    }

    /// Whether `id` is a declared or special attribute.
    pub fn is_known_attribute(&self, id: &str) -> bool {
        SPECIAL_ATTRIBUTES.contains(&id) || self.definition(id).is_some()
    }

    /// Adds a property below `parent` (or as a root).
    ///
    /// Creates one scenario object per scenario with all attributes at
    /// their defaults.
    ///
    /// # Errors
    /// [`PropertyError::DuplicateId`] if the ID is taken;
    /// [`PropertyError::UnknownParent`] if `parent` is not in this set.
    pub fn add(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        parent: Option<usize>,
    ) -> Result<usize, PropertyError> {
        let id = id.into();
        if self.by_id.contains_key(&id) {
            return Err(PropertyError::DuplicateId {
                kind: S::KIND.to_string(),
                id,
            });
        }
        let level = match parent {
            Some(p) => match self.nodes.get(p) {
                Some(node) => node.level + 1,
                None => return Err(PropertyError::UnknownParent(p)),
            },
            None => 0,
        };

        let index = self.nodes.len();
        let scenarios = (0..self.scenario_count)
            .map(|s| S::new(ScenarioData::new(S::KIND, index, id.clone(), s, &self.definitions)))
            .collect();
        let attributes = self
            .definitions
            .iter()
            .filter(|d| !d.scenario_specific)
            .map(|d| (d.id.clone(), Attribute::from_definition(d)))
            .collect();

        self.nodes.push(PropertyTreeNode {
            id: id.clone(),
            name: name.into(),
            kind: S::KIND,
            index,
            sequence_no: index + 1,
            parent,
            children: Vec::new(),
            level,
            attributes,
            scenarios,
            source_location: None,
        });
        if let Some(p) = parent {
            self.nodes[p].children.push(index);
        }
        self.by_id.insert(id, index);
        Ok(index)
    }

    /// Sets a user-provided attribute value.
    ///
    /// `scenario` must be `Some` for scenario-specific attributes and is
    /// ignored for the others.
    ///
    /// # Errors
    /// [`PropertyError::UnknownAttribute`], [`PropertyError::TypeMismatch`],
    /// or [`PropertyError::UnknownScenario`].
    pub fn set_attribute(
        &mut self,
        index: usize,
        attribute: &str,
        scenario: Option<usize>,
        value: AttributeValue,
    ) -> Result<(), PropertyError> {
        let def = self
            .definition(attribute)
            .ok_or_else(|| PropertyError::UnknownAttribute(attribute.to_string()))?;
        if def.kind != value.kind() {
            return Err(PropertyError::TypeMismatch {
                attribute: attribute.to_string(),
                expected: def.kind.to_string(),
            });
        }
        let scenario_specific = def.scenario_specific;
        let scenario_count = self.scenario_count;

        let node = self
            .nodes
            .get_mut(index)
            .ok_or_else(|| PropertyError::UnknownProperty {
                kind: S::KIND.to_string(),
                id: format!("#{index}"),
            })?;

        if scenario_specific {
            let s = scenario.ok_or(PropertyError::UnknownScenario(usize::MAX))?;
            if s >= scenario_count {
                return Err(PropertyError::UnknownScenario(s));
            }
            node.scenarios[s].data_mut().provide(attribute, value);
        } else if let Some(a) = node.attributes.get_mut(attribute) {
            a.provide(value);
        }
        Ok(())
    }

    /// Sets a scenario-specific attribute in every scenario.
    pub fn set_attribute_all(
        &mut self,
        index: usize,
        attribute: &str,
        value: AttributeValue,
    ) -> Result<(), PropertyError> {
        for s in 0..self.scenario_count {
            self.set_attribute(index, attribute, Some(s), value.clone())?;
        }
        Ok(())
    }

    /// Propagates inheritable attribute values from parents to children.
    ///
    /// Only provided or inherited parent values travel; declared defaults
    /// do not. A child value that is provided, or already inherited from
    /// its parent scenario, is kept.
    pub fn inherit_attributes(&mut self) {
        let inheritable: Vec<(String, bool)> = self
            .definitions
            .iter()
            .filter(|d| d.inheritable)
            .map(|d| (d.id.clone(), d.scenario_specific))
            .collect();

        // Parents precede children, so one pass reaches every depth.
        for idx in 0..self.nodes.len() {
            let Some(parent) = self.nodes[idx].parent else {
                continue;
            };
            for (attr, scenario_specific) in &inheritable {
                if *scenario_specific {
                    for s in 0..self.scenario_count {
                        if self.nodes[idx].scenarios[s].data().input(attr).is_some() {
                            continue;
                        }
                        let value = self.nodes[parent].scenarios[s].data().input(attr).cloned();
                        if let Some(value) = value {
                            self.nodes[idx].scenarios[s].data_mut().inherit(attr, value);
                        }
                    }
                } else {
                    let value = self.nodes[parent]
                        .attributes
                        .get(attr)
                        .and_then(Attribute::input_value)
                        .cloned();
                    if let (Some(value), Some(own)) =
                        (value, self.nodes[idx].attributes.get_mut(attr))
                    {
                        if own.input_value().is_none() {
                            own.inherit(value);
                        }
                    }
                }
            }
        }
    }

    /// Lets each scenario with a parent scenario inherit its input data.
    ///
    /// `parents[s]` is the parent of scenario `s`; parents must have a
    /// lower index than their children.
    pub fn inherit_scenarios(&mut self, parents: &[Option<usize>]) {
        for node in &mut self.nodes {
            for (child, parent) in parents.iter().enumerate() {
                let Some(parent) = *parent else {
                    continue;
                };
                if parent >= child || child >= node.scenarios.len() {
                    continue;
                }
                let (head, tail) = node.scenarios.split_at_mut(child);
                tail[0].inherit_from(&head[parent]);
            }
        }
    }

    /// Property at `index`.
    pub fn get(&self, index: usize) -> Option<&PropertyTreeNode<S>> {
        self.nodes.get(index)
    }

    /// Mutable property at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut PropertyTreeNode<S>> {
        self.nodes.get_mut(index)
    }

    /// Index of the property with the given ID.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// Property with the given ID.
    pub fn by_id(&self, id: &str) -> Option<&PropertyTreeNode<S>> {
        self.index_of(id).map(|i| &self.nodes[i])
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates properties in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, PropertyTreeNode<S>> {
        self.nodes.iter()
    }

    /// Iterates properties mutably.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, PropertyTreeNode<S>> {
        self.nodes.iter_mut()
    }

    /// Indices of all leaf properties.
    pub fn leaves(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes.iter().filter(|n| n.is_leaf()).map(|n| n.index)
    }

    /// Indices of the ancestors of `index`, nearest first.
    pub fn ancestors(&self, index: usize) -> Vec<usize> {
        let mut result = Vec::new();
        let mut current = self.nodes.get(index).and_then(|n| n.parent);
        while let Some(p) = current {
            result.push(p);
            current = self.nodes[p].parent;
        }
        result
    }

    /// Whether `ancestor` is a (transitive) parent of `index`.
    pub fn is_ancestor(&self, ancestor: usize, index: usize) -> bool {
        self.ancestors(index).contains(&ancestor)
    }

    /// Indices of all leaf descendants of `index` (itself if a leaf).
    pub fn leaf_descendants(&self, index: usize) -> Vec<usize> {
        let mut result = Vec::new();
        let mut stack = vec![index];
        while let Some(i) = stack.pop() {
            match self.nodes.get(i) {
                Some(n) if n.is_leaf() => result.push(i),
                Some(n) => stack.extend(n.children.iter().rev()),
                None => {}
            }
        }
        result
    }

    /// Hierarchical position of a property: the child positions on the
    /// path from its root, with root positions counted among all roots.
    pub fn tree_index(&self, index: usize) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = index;
        loop {
            let node = &self.nodes[current];
            let position = match node.parent {
                Some(p) => self.nodes[p]
                    .children
                    .iter()
                    .position(|&c| c == current)
                    .unwrap_or(0),
                None => self.nodes[..current]
                    .iter()
                    .filter(|n| n.parent.is_none())
                    .count(),
            };
            path.push(position);
            match node.parent {
                Some(p) => current = p,
                None => break,
            }
        }
        path.reverse();
        path
    }
}

impl<S> std::ops::Index<usize> for PropertySet<S> {
    type Output = PropertyTreeNode<S>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.nodes[index]
    }
}

impl<S> std::ops::IndexMut<usize> for PropertySet<S> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.nodes[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{AttributeKind, Property};
    use crate::scenario::TaskScenario;

    fn set() -> PropertySet<TaskScenario> {
        PropertySet::new(2)
    }

    #[test]
    fn test_add_and_tree() {
        let mut s = set();
        let root = s.add("prj", "Project", None).unwrap();
        let a = s.add("a", "A", Some(root)).unwrap();
        let b = s.add("b", "B", Some(root)).unwrap();
        let a1 = s.add("a1", "A1", Some(a)).unwrap();

        assert_eq!(s.len(), 4);
        assert_eq!(s[a1].level(), 2);
        assert!(s[root].is_container());
        assert!(s[b].is_leaf());
        assert_eq!(s.ancestors(a1), vec![a, root]);
        assert!(s.is_ancestor(root, a1));
        assert_eq!(s.leaf_descendants(root), vec![a1, b]);
        assert_eq!(s.tree_index(b), vec![0, 1]);
        assert_eq!(s.tree_index(a1), vec![0, 0, 0]);
        assert_eq!(s.index_of("b"), Some(b));
        assert_eq!(s[a].scenarios().len(), 2);
    }

    #[test]
    fn test_duplicate_id() {
        let mut s = set();
        s.add("a", "A", None).unwrap();
        assert!(matches!(
            s.add("a", "Again", None),
            Err(PropertyError::DuplicateId { .. })
        ));
        assert_eq!(s.add("b", "B", Some(42)), Err(PropertyError::UnknownParent(42)));
    }

    #[test]
    fn test_declaration_before_properties() {
        let mut s = set();
        s.declare(AttributeDefinition::new("cost", "Cost", AttributeKind::Number))
            .unwrap();
        assert!(s.is_known_attribute("cost"));
        assert!(s.is_known_attribute("name"));
        s.add("a", "A", None).unwrap();
        assert_eq!(
            s.declare(AttributeDefinition::new("late", "Late", AttributeKind::Number)),
            Err(PropertyError::LateAttributeDeclaration("late".into()))
        );
    }

    #[test]
    fn test_set_attribute_type_checked() {
        let mut s = set();
        let a = s.add("a", "A", None).unwrap();
        s.set_attribute(a, "priority", Some(0), AttributeValue::Integer(800))
            .unwrap();
        assert_eq!(s[a].get("priority", Some(0)), Some(&AttributeValue::Integer(800)));
        assert!(matches!(
            s.set_attribute(a, "priority", Some(0), AttributeValue::Text("x".into())),
            Err(PropertyError::TypeMismatch { .. })
        ));
        assert!(matches!(
            s.set_attribute(a, "nonsense", Some(0), AttributeValue::Bool(true)),
            Err(PropertyError::UnknownAttribute(_))
        ));
        assert_eq!(
            s.set_attribute(a, "priority", Some(5), AttributeValue::Integer(1)),
            Err(PropertyError::UnknownScenario(5))
        );
    }

    #[test]
    fn test_inherit_attributes() {
        let mut s = set();
        let root = s.add("prj", "Project", None).unwrap();
        let a = s.add("a", "A", Some(root)).unwrap();
        let b = s.add("b", "B", Some(root)).unwrap();
        s.set_attribute_all(root, "priority", AttributeValue::Integer(900))
            .unwrap();
        s.set_attribute(b, "priority", Some(0), AttributeValue::Integer(100))
            .unwrap();
        s.inherit_attributes();

        assert_eq!(s[a].scenario(0).data().integer("priority"), Some(900));
        assert_eq!(s[a].scenario(1).data().integer("priority"), Some(900));
        assert_eq!(s[b].scenario(0).data().integer("priority"), Some(100));
        assert!(s[a].scenario(0).data().entry("priority").unwrap().is_inherited());
    }

    #[test]
    fn test_scenario_value_survives_attribute_inheritance() {
        let mut s = set();
        let grp = s.add("grp", "Group", None).unwrap();
        let a = s.add("a", "A", Some(grp)).unwrap();
        let b = s.add("b", "B", Some(grp)).unwrap();
        s.set_attribute(b, "priority", Some(0), AttributeValue::Integer(900))
            .unwrap();

        s.inherit_scenarios(&[None, Some(0)]);
        s.inherit_attributes();

        assert_eq!(s[b].scenario(0).data().integer("priority"), Some(900));
        assert_eq!(s[b].scenario(1).data().integer("priority"), Some(900));
        assert_eq!(s[a].scenario(1).data().integer("priority"), Some(500));
        assert!(s[a].scenario(1).data().input("priority").is_none());

        s.inherit_scenarios(&[None, Some(0)]);
        s.inherit_attributes();
        assert_eq!(s[b].scenario(1).data().integer("priority"), Some(900));
    }

    #[test]
    fn test_inherit_scenarios() {
        let mut s = set();
        let a = s.add("a", "A", None).unwrap();
        s.set_attribute(a, "effort", Some(0), AttributeValue::Duration(7200))
            .unwrap();
        s.inherit_scenarios(&[None, Some(0)]);
        assert_eq!(s[a].scenario(1).data().duration("effort"), Some(7200));
    }
}
