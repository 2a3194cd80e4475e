//! Sorted, filtered views over property sets.
//!
//! A [`PropertyList`] never owns properties. It holds references into a
//! project and can be re-sorted and filtered freely; the underlying
//! [`PropertySet`](super::PropertySet) stays authoritative.
//!
//! # Sorting
//! Criteria are applied lexicographically. The pseudo attribute `tree`
//! sorts by hierarchical position. The sequence number breaks any
//! remaining tie, so sorting is deterministic.

use std::cmp::Ordering;

use super::{AttributeValue, PropertyKind, PropertyRef};
use crate::error::{EvalError, PropertyError};
use crate::expression::{LogicalExpression, Query};
use crate::project::Project;

/// One sorting criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortCriterion {
    /// Attribute ID, or `tree`.
    pub attribute: String,
    pub ascending: bool,
    /// `None` for scenario-independent attributes.
    pub scenario: Option<usize>,
}

impl SortCriterion {
    pub fn new(attribute: impl Into<String>, ascending: bool, scenario: Option<usize>) -> Self {
        Self {
            attribute: attribute.into(),
            ascending,
            scenario,
        }
    }

    /// Hierarchical order.
    pub fn tree() -> Self {
        Self::new("tree", true, None)
    }
}

/// A view of properties of one kind.
#[derive(Debug, Clone)]
pub struct PropertyList<'a> {
    project: &'a Project,
    kind: PropertyKind,
    items: Vec<usize>,
    sorting: Vec<SortCriterion>,
}

impl<'a> PropertyList<'a> {
    /// Lists all properties of `kind` in tree order.
    pub fn new(project: &'a Project, kind: PropertyKind) -> Self {
        let mut list = Self {
            project,
            kind,
            items: (0..project.property_count(kind)).collect(),
            sorting: vec![SortCriterion::tree()],
        };
        list.sort();
        list
    }

    /// Copies another list, keeping its items and sorting.
    pub fn from_list(other: &PropertyList<'a>) -> Self {
        other.clone()
    }

    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    /// Replaces the sorting criteria.
    ///
    /// # Errors
    /// [`PropertyError::UnknownAttribute`] if a criterion names an
    /// attribute not declared for this kind; [`PropertyError::UnknownScenario`]
    /// for an out-of-range scenario.
    pub fn set_sorting(&mut self, criteria: Vec<SortCriterion>) -> Result<(), PropertyError> {
        for c in &criteria {
            if c.attribute != "tree" && !self.project.is_known_attribute(self.kind, &c.attribute) {
                return Err(PropertyError::UnknownAttribute(c.attribute.clone()));
            }
            if let Some(s) = c.scenario.filter(|&s| s >= self.project.scenario_count()) {
                return Err(PropertyError::UnknownScenario(s));
            }
        }
        self.sorting = criteria;
        Ok(())
    }

    pub fn sorting(&self) -> &[SortCriterion] {
        &self.sorting
    }

    /// Sorts the items by the current criteria.
    pub fn sort(&mut self) {
        let project = self.project;
        let kind = self.kind;
        let sorting = &self.sorting;
        let seqno = |i: usize| {
            project
                .property(PropertyRef::new(kind, i))
                .map_or(i, |p| p.sequence_no())
        };
        self.items.sort_by(|&a, &b| {
            sorting
                .iter()
                .map(|c| {
                    let ord = compare(project, kind, c, a, b);
                    if c.ascending {
                        ord
                    } else {
                        ord.reverse()
                    }
                })
                .find(|o| *o != Ordering::Equal)
                .unwrap_or_else(|| seqno(a).cmp(&seqno(b)))
        });
    }

    /// Keeps only properties for which `expression` holds.
    ///
    /// `template` supplies scenario, period, and scope property; its
    /// property is replaced by each item in turn.
    ///
    /// # Errors
    /// The first evaluation error.
    pub fn filter(
        &mut self,
        expression: &LogicalExpression,
        template: &Query<'_>,
    ) -> Result<(), EvalError> {
        let mut kept = Vec::with_capacity(self.items.len());
        for &i in &self.items {
            let query = Query {
                property: Some(PropertyRef::new(self.kind, i)),
                ..*template
            };
            if expression.eval(&query)? {
                kept.push(i);
            }
        }
        self.items = kept;
        Ok(())
    }

    /// References in list order.
    pub fn iter(&self) -> impl Iterator<Item = PropertyRef> + '_ {
        self.items.iter().map(move |&i| PropertyRef::new(self.kind, i))
    }

    /// Set indices in list order.
    pub fn indices(&self) -> &[usize] {
        &self.items
    }

    pub fn get(&self, position: usize) -> Option<PropertyRef> {
        self.items
            .get(position)
            .map(|&i| PropertyRef::new(self.kind, i))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Unset values sort before set ones.
fn compare(
    project: &Project,
    kind: PropertyKind,
    criterion: &SortCriterion,
    a: usize,
    b: usize,
) -> Ordering {
    let (ra, rb) = (PropertyRef::new(kind, a), PropertyRef::new(kind, b));
    if criterion.attribute == "tree" {
        return project.tree_index(ra).cmp(&project.tree_index(rb));
    }
    let value = |r: PropertyRef| -> Option<AttributeValue> {
        project
            .attribute_value(r, &criterion.attribute, criterion.scenario)
            .ok()
            .flatten()
    };
    match (value(ra), value(rb)) {
        (Some(x), Some(y)) => x.sort_cmp(&y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{LogicalOperation, Operand, Operator, Value};
    use crate::project::tests::project;

    fn fixture() -> Project {
        let mut p = project();
        p.add_task("b", "Beta", None).unwrap();
        p.add_task("a", "Alpha", None).unwrap();
        p.add_task("a2", "Alpha Two", Some("a")).unwrap();
        p.add_task("b1", "Beta One", Some("b")).unwrap();
        let tasks = p.tasks_mut();
        for (idx, prio) in [(0, 300), (1, 700), (2, 700), (3, 100)] {
            tasks
                .set_attribute(idx, "priority", Some(0), AttributeValue::Integer(prio))
                .unwrap();
        }
        p
    }

    fn ids(list: &PropertyList<'_>, p: &Project) -> Vec<String> {
        list.iter()
            .map(|r| p.property(r).unwrap().id().to_string())
            .collect()
    }

    #[test]
    fn test_tree_order() {
        let p = fixture();
        let list = PropertyList::new(&p, PropertyKind::Task);
        assert_eq!(ids(&list, &p), vec!["b", "b1", "a", "a2"]);
    }

    #[test]
    fn test_multi_criteria_sort() {
        let p = fixture();
        let mut list = PropertyList::new(&p, PropertyKind::Task);
        list.set_sorting(vec![SortCriterion::new("priority", false, Some(0))])
            .unwrap();
        list.sort();
        // Ties on priority fall back to the sequence number.
        assert_eq!(ids(&list, &p), vec!["a", "a2", "b", "b1"]);

        list.set_sorting(vec![
            SortCriterion::new("priority", false, Some(0)),
            SortCriterion::new("name", false, None),
        ])
        .unwrap();
        list.sort();
        assert_eq!(ids(&list, &p), vec!["a2", "a", "b", "b1"]);

        list.set_sorting(vec![SortCriterion::new("id", true, None)])
            .unwrap();
        list.sort();
        assert_eq!(ids(&list, &p), vec!["a", "a2", "b", "b1"]);
    }

    #[test]
    fn test_unset_values_first() {
        let mut p = fixture();
        p.tasks_mut()
            .set_attribute(3, "start", Some(0), AttributeValue::Date(1000))
            .unwrap();
        let mut list = PropertyList::new(&p, PropertyKind::Task);
        list.set_sorting(vec![SortCriterion::new("start", true, Some(0))])
            .unwrap();
        list.sort();
        assert_eq!(ids(&list, &p).last().map(String::as_str), Some("b1"));
    }

    #[test]
    fn test_rejects_unknown_sort_attribute() {
        let p = fixture();
        let mut list = PropertyList::new(&p, PropertyKind::Task);
        assert_eq!(
            list.set_sorting(vec![SortCriterion::new("color", true, None)]),
            Err(PropertyError::UnknownAttribute("color".into()))
        );
        assert_eq!(
            list.set_sorting(vec![SortCriterion::new("priority", true, Some(9))]),
            Err(PropertyError::UnknownScenario(9))
        );
        assert_eq!(list.sorting(), &[SortCriterion::tree()]);
    }

    #[test]
    fn test_filter() {
        let p = fixture();
        let mut list = PropertyList::new(&p, PropertyKind::Task);
        let expr = LogicalExpression::new(LogicalOperation::binary(
            Operand::Attribute("priority".into()),
            Operator::GreaterEq,
            Value::Number(500.0),
        ));
        list.filter(&expr, &Query::new(&p).with_scenario(0)).unwrap();
        assert_eq!(ids(&list, &p), vec!["a", "a2"]);

        let copy = PropertyList::from_list(&list);
        assert_eq!(copy.len(), 2);
        assert_eq!(copy.get(1), Some(PropertyRef::task(2)));
    }
}
