use super::Value;
use crate::error::{EvalError, PropertyError};
use crate::models::{Interval, Timestamp};
use crate::project::Project;
use crate::property::PropertyRef;

/// Evaluation context of an expression.
///
/// `property` is the property being filtered; `scope_property` is the
/// enclosing property of a nested report (e.g. the task when listing its
/// resources). `start`/`end` span the report period.
#[derive(Debug, Clone, Copy)]
pub struct Query<'a> {
    pub project: &'a Project,
    pub property: Option<PropertyRef>,
    pub scope_property: Option<PropertyRef>,
    pub scenario_idx: Option<usize>,
    pub start: Timestamp,
    pub end: Timestamp,
}

impl<'a> Query<'a> {
    /// Query over the whole project period without a property.
    pub fn new(project: &'a Project) -> Self {
        Self {
            project,
            property: None,
            scope_property: None,
            scenario_idx: None,
            start: project.start(),
            end: project.end(),
        }
    }

    pub fn with_property(mut self, property: PropertyRef) -> Self {
        self.property = Some(property);
        self
    }

    pub fn with_scope_property(mut self, property: PropertyRef) -> Self {
        self.scope_property = Some(property);
        self
    }

    pub fn with_scenario(mut self, scenario_idx: usize) -> Self {
        self.scenario_idx = Some(scenario_idx);
        self
    }

    pub fn with_period(mut self, start: Timestamp, end: Timestamp) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// The same query with property and scope property exchanged.
    pub fn swapped(&self) -> Self {
        Self {
            property: self.scope_property,
            scope_property: self.property,
            ..*self
        }
    }

    /// Report period; empty if `end` precedes `start`.
    pub fn period(&self) -> Interval {
        Interval::new(self.start, self.end)
            .unwrap_or_else(|_| Interval::from_ordered(self.start, self.start))
    }

    /// Value of an attribute of the queried property.
    ///
    /// A declared attribute without a value yields an empty string.
    ///
    /// # Errors
    /// [`EvalError::UnknownAttribute`] without a property or for an
    /// undeclared attribute.
    pub fn attribute_value(&self, attribute: &str) -> Result<Value, EvalError> {
        let Some(property) = self.property else {
            return Err(EvalError::UnknownAttribute(attribute.to_string()));
        };
        match self
            .project
            .attribute_value(property, attribute, self.scenario_idx)
        {
            Ok(Some(v)) => Ok(Value::from(&v)),
            Ok(None) => Ok(Value::Str(String::new())),
            Err(PropertyError::UnknownScenario(idx)) => {
                Err(EvalError::UnknownScenario(format!("#{idx}")))
            }
            Err(_) => Err(EvalError::UnknownAttribute(attribute.to_string())),
        }
    }

    /// Resolves a scenario ID argument.
    pub fn scenario(&self, id: &Value) -> Result<usize, EvalError> {
        let id = id.to_string();
        self.project
            .scenario_idx(&id)
            .ok_or(EvalError::UnknownScenario(id))
    }
}
