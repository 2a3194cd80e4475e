//! Scenario-scoped property state.
//!
//! Every property owns one scenario object per scenario. The object holds
//! the scenario-specific attribute bag ([`ScenarioData`]) plus typed state
//! the scheduler needs (allocations, bookings, scoreboards). Scenarios are
//! independent: scheduling one scenario only ever writes the scenario
//! objects with that index.
//!
//! # Specializations
//!
//! | Property | Scenario object |
//! |----------|-----------------|
//! | Task | [`TaskScenario`] |
//! | Resource | [`ResourceScenario`] |
//! | Account | [`AccountScenario`] |
//! | Shift | [`ShiftScenario`] |

mod account;
mod resource;
mod shift;
mod task;

pub use account::{AccountScenario, CostContext};
pub use resource::ResourceScenario;
pub use shift::ShiftScenario;
pub use task::{Charge, ChargeShare, Dependency, TaskScenario};

use std::collections::BTreeMap;

use crate::error::SchedulingError;
use crate::message::{Message, MessageHandler, MessageLevel, SourceLocation};
use crate::models::{Duration, Timestamp};
use crate::property::{Attribute, AttributeDefinition, AttributeValue, PropertyKind};

/// Behaviour shared by all scenario objects.
pub trait Scenario: Sized {
    /// Kind of property this scenario object belongs to.
    const KIND: PropertyKind;

    /// Wraps a freshly initialized attribute bag.
    fn new(data: ScenarioData) -> Self;

    /// Built-in attribute declarations for this property kind.
    fn definitions() -> Vec<AttributeDefinition>;

    fn data(&self) -> &ScenarioData;

    fn data_mut(&mut self) -> &mut ScenarioData;

    /// Takes over input data of the parent scenario where this scenario
    /// provides none.
    fn inherit_from(&mut self, parent: &Self) {
        self.data_mut().inherit_from(parent.data());
    }

    /// Drops the results of a previous scheduling pass.
    fn reset(&mut self) {
        self.data_mut().reset_computed();
    }
}

/// Attribute bag of one property in one scenario.
#[derive(Debug, Clone)]
pub struct ScenarioData {
    kind: PropertyKind,
    property: usize,
    property_id: String,
    scenario_idx: usize,
    attributes: BTreeMap<String, Attribute>,
    pub(crate) source_location: Option<SourceLocation>,
}

impl ScenarioData {
    /// Creates the bag with every scenario-specific attribute at its default.
    pub fn new(
        kind: PropertyKind,
        property: usize,
        property_id: impl Into<String>,
        scenario_idx: usize,
        definitions: &[AttributeDefinition],
    ) -> Self {
        let attributes = definitions
            .iter()
            .filter(|d| d.scenario_specific)
            .map(|d| (d.id.clone(), Attribute::from_definition(d)))
            .collect();
        Self {
            kind,
            property,
            property_id: property_id.into(),
            scenario_idx,
            attributes,
            source_location: None,
        }
    }

    /// Kind of the owning property.
    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    /// Index of the owning property within its set.
    pub fn property(&self) -> usize {
        self.property
    }

    /// ID of the owning property.
    pub fn property_id(&self) -> &str {
        &self.property_id
    }

    /// Scenario index.
    pub fn scenario_idx(&self) -> usize {
        self.scenario_idx
    }

    /// Current value of an attribute.
    pub fn attribute(&self, id: &str) -> Option<&AttributeValue> {
        self.attributes.get(id).and_then(Attribute::value)
    }

    /// Attribute entry including provenance flags.
    pub fn entry(&self, id: &str) -> Option<&Attribute> {
        self.attributes.get(id)
    }

    /// Provided or inherited value, ignoring computed results.
    pub fn input(&self, id: &str) -> Option<&AttributeValue> {
        self.attributes.get(id).and_then(Attribute::input_value)
    }

    pub(crate) fn provide(&mut self, id: &str, value: AttributeValue) -> bool {
        match self.attributes.get_mut(id) {
            Some(a) => {
                a.provide(value);
                true
            }
            None => false,
        }
    }

    pub(crate) fn inherit(&mut self, id: &str, value: AttributeValue) {
        if let Some(a) = self.attributes.get_mut(id) {
            a.inherit(value);
        }
    }

    /// Stores a computed value of a declared attribute.
    pub(crate) fn compute(&mut self, id: &str, value: AttributeValue) {
        debug_assert!(self.attributes.contains_key(id), "undeclared attribute {id}");
        if let Some(a) = self.attributes.get_mut(id) {
            a.compute(value);
        }
    }

    /// Drops all computed values.
    pub fn reset_computed(&mut self) {
        self.attributes.values_mut().for_each(Attribute::reset);
    }

    /// Inherits every value the parent scenario has as input.
    pub fn inherit_from(&mut self, parent: &ScenarioData) {
        for (id, attr) in &parent.attributes {
            if let (Some(value), Some(own)) = (attr.input_value(), self.attributes.get_mut(id)) {
                own.inherit(value.clone());
            }
        }
    }

    /// Date attribute.
    pub fn date(&self, id: &str) -> Option<Timestamp> {
        match self.attribute(id) {
            Some(AttributeValue::Date(t)) => Some(*t),
            _ => None,
        }
    }

    /// Duration attribute, in seconds.
    pub fn duration(&self, id: &str) -> Option<Duration> {
        match self.attribute(id) {
            Some(AttributeValue::Duration(d)) => Some(*d),
            _ => None,
        }
    }

    /// Numeric attribute; integers are widened.
    pub fn number(&self, id: &str) -> Option<f64> {
        match self.attribute(id) {
            Some(AttributeValue::Number(n)) => Some(*n),
            Some(AttributeValue::Integer(i)) => Some(*i as f64),
            _ => None,
        }
    }

    /// Integer attribute.
    pub fn integer(&self, id: &str) -> Option<i64> {
        match self.attribute(id) {
            Some(AttributeValue::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    /// Boolean attribute; unset means `false`.
    pub fn flag(&self, id: &str) -> bool {
        matches!(self.attribute(id), Some(AttributeValue::Bool(true)))
    }

    fn message(
        &self,
        messages: &MessageHandler,
        level: MessageLevel,
        id: &str,
        text: impl Into<String>,
    ) -> Message {
        Message::new(level, id, text)
            .with_property(self.property_id.clone())
            .with_scenario(messages.scenario_id(self.scenario_idx))
            .with_source_location(self.source_location.clone())
    }

    /// Records an error and returns the error that aborts the scenario.
    ///
    /// Callers propagate the returned value: `return Err(data.error(..))`.
    pub fn error(
        &self,
        messages: &mut MessageHandler,
        id: &str,
        text: impl Into<String>,
    ) -> SchedulingError {
        let message = self.message(messages, MessageLevel::Error, id, text);
        let error = SchedulingError::Aborted {
            scenario: messages.scenario_id(self.scenario_idx),
            message: message.to_string(),
        };
        messages.send(message);
        error
    }

    /// Records an error without aborting.
    pub fn report_error(&self, messages: &mut MessageHandler, id: &str, text: impl Into<String>) {
        let message = self.message(messages, MessageLevel::Error, id, text);
        messages.send(message);
    }

    /// Records a warning.
    pub fn warning(&self, messages: &mut MessageHandler, id: &str, text: impl Into<String>) {
        let message = self.message(messages, MessageLevel::Warning, id, text);
        messages.send(message);
    }

    /// Records an info message.
    pub fn info(&self, messages: &mut MessageHandler, id: &str, text: impl Into<String>) {
        let message = self.message(messages, MessageLevel::Info, id, text);
        messages.send(message);
    }
}
