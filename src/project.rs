//! The project: scenarios plus the four property trees.
//!
//! A [`Project`] is built from a [`ProjectConfig`] by the (external) parser
//! front-end, which then adds tasks, resources, accounts, and shifts and
//! fills in their user-provided attributes. [`Project::schedule`] computes
//! every enabled scenario; afterwards reports read the project through
//! [`PropertyList`](crate::property::PropertyList) and
//! [`Query`](crate::expression::Query).

use crate::config::{ProjectConfig, ScenarioConfig};
use crate::error::{ConfigError, PropertyError, SchedulingError};
use crate::message::MessageHandler;
use crate::models::{Duration, Interval, Timestamp, WorkingHours};
use crate::property::{
    AttributeValue, Property, PropertyKind, PropertyRef, PropertySet, SPECIAL_ATTRIBUTES,
};
use crate::scenario::{AccountScenario, CostContext, ResourceScenario, ShiftScenario, TaskScenario};
use crate::scheduler::Scheduler;

/// A project with all its properties.
#[derive(Debug, Clone)]
pub struct Project {
    config: ProjectConfig,
    vacations: Vec<Interval>,
    pub(crate) tasks: PropertySet<TaskScenario>,
    pub(crate) resources: PropertySet<ResourceScenario>,
    pub(crate) accounts: PropertySet<AccountScenario>,
    pub(crate) shifts: PropertySet<ShiftScenario>,
}

impl Project {
    /// Creates an empty project.
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] if the configuration is inconsistent.
    pub fn new(config: ProjectConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let vacations = config
            .vacations
            .iter()
            .map(|v| Interval::new(v.start.timestamp(), v.end.timestamp()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let n = config.scenarios.len();
        Ok(Self {
            config,
            vacations,
            tasks: PropertySet::new(n),
            resources: PropertySet::new(n),
            accounts: PropertySet::new(n),
            shifts: PropertySet::new(n),
        })
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn start(&self) -> Timestamp {
        self.config.start_timestamp()
    }

    pub fn end(&self) -> Timestamp {
        self.config.end_timestamp()
    }

    /// `[start, end)` of the project.
    pub fn period(&self) -> Interval {
        Interval::from_ordered(self.start(), self.end())
    }

    /// Scoreboard slot length.
    pub fn resolution(&self) -> Duration {
        self.config.timing_resolution
    }

    /// Default working hours.
    pub fn working_hours(&self) -> &WorkingHours {
        &self.config.working_hours
    }

    /// Project-wide vacations.
    pub fn vacations(&self) -> &[Interval] {
        &self.vacations
    }

    /// Working seconds in one day, for cost conversion.
    pub fn daily_working_seconds(&self) -> f64 {
        self.config.daily_working_hours * 3600.0
    }

    pub fn scenarios(&self) -> &[ScenarioConfig] {
        &self.config.scenarios
    }

    pub fn scenario_count(&self) -> usize {
        self.config.scenarios.len()
    }

    /// Index of the scenario with the given ID.
    pub fn scenario_idx(&self, id: &str) -> Option<usize> {
        self.config.scenarios.iter().position(|s| s.id == id)
    }

    /// Parent scenario index of every scenario.
    pub fn scenario_parents(&self) -> Vec<Option<usize>> {
        self.config
            .scenarios
            .iter()
            .map(|s| s.parent.as_deref().and_then(|p| self.scenario_idx(p)))
            .collect()
    }

    /// Scenario IDs in index order.
    pub fn scenario_ids(&self) -> Vec<String> {
        self.config.scenarios.iter().map(|s| s.id.clone()).collect()
    }

    pub fn tasks(&self) -> &PropertySet<TaskScenario> {
        &self.tasks
    }

    pub fn tasks_mut(&mut self) -> &mut PropertySet<TaskScenario> {
        &mut self.tasks
    }

    pub fn resources(&self) -> &PropertySet<ResourceScenario> {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut PropertySet<ResourceScenario> {
        &mut self.resources
    }

    pub fn accounts(&self) -> &PropertySet<AccountScenario> {
        &self.accounts
    }

    pub fn accounts_mut(&mut self) -> &mut PropertySet<AccountScenario> {
        &mut self.accounts
    }

    pub fn shifts(&self) -> &PropertySet<ShiftScenario> {
        &self.shifts
    }

    pub fn shifts_mut(&mut self) -> &mut PropertySet<ShiftScenario> {
        &mut self.shifts
    }

    /// Adds a task below the task with ID `parent`.
    pub fn add_task(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        parent: Option<&str>,
    ) -> Result<usize, PropertyError> {
        let parent = resolve_parent(PropertyKind::Task, parent, |p| self.tasks.index_of(p))?;
        self.tasks.add(id, name, parent)
    }

    /// Adds a resource below the resource with ID `parent`.
    pub fn add_resource(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        parent: Option<&str>,
    ) -> Result<usize, PropertyError> {
        let parent = resolve_parent(PropertyKind::Resource, parent, |p| self.resources.index_of(p))?;
        self.resources.add(id, name, parent)
    }

    /// Adds an account below the account with ID `parent`.
    pub fn add_account(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        parent: Option<&str>,
    ) -> Result<usize, PropertyError> {
        let parent = resolve_parent(PropertyKind::Account, parent, |p| self.accounts.index_of(p))?;
        self.accounts.add(id, name, parent)
    }

    /// Adds a shift below the shift with ID `parent`.
    pub fn add_shift(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        parent: Option<&str>,
    ) -> Result<usize, PropertyError> {
        let parent = resolve_parent(PropertyKind::Shift, parent, |p| self.shifts.index_of(p))?;
        self.shifts.add(id, name, parent)
    }

    /// Kind-independent view of a property.
    pub fn property(&self, r: PropertyRef) -> Option<&dyn Property> {
        match r.kind {
            PropertyKind::Task => self.tasks.get(r.index).map(|n| n as &dyn Property),
            PropertyKind::Resource => self.resources.get(r.index).map(|n| n as &dyn Property),
            PropertyKind::Account => self.accounts.get(r.index).map(|n| n as &dyn Property),
            PropertyKind::Shift => self.shifts.get(r.index).map(|n| n as &dyn Property),
        }
    }

    /// Reference to the property of `kind` with the given ID.
    pub fn property_by_id(&self, kind: PropertyKind, id: &str) -> Option<PropertyRef> {
        let index = match kind {
            PropertyKind::Task => self.tasks.index_of(id),
            PropertyKind::Resource => self.resources.index_of(id),
            PropertyKind::Account => self.accounts.index_of(id),
            PropertyKind::Shift => self.shifts.index_of(id),
        };
        index.map(|i| PropertyRef::new(kind, i))
    }

    /// Number of properties of `kind`.
    pub fn property_count(&self, kind: PropertyKind) -> usize {
        match kind {
            PropertyKind::Task => self.tasks.len(),
            PropertyKind::Resource => self.resources.len(),
            PropertyKind::Account => self.accounts.len(),
            PropertyKind::Shift => self.shifts.len(),
        }
    }

    /// Whether `attribute` is declared for `kind` or is a special attribute.
    pub fn is_known_attribute(&self, kind: PropertyKind, attribute: &str) -> bool {
        match kind {
            PropertyKind::Task => self.tasks.is_known_attribute(attribute),
            PropertyKind::Resource => self.resources.is_known_attribute(attribute),
            PropertyKind::Account => self.accounts.is_known_attribute(attribute),
            PropertyKind::Shift => self.shifts.is_known_attribute(attribute),
        }
    }

    /// Hierarchical position of a property, see [`PropertySet::tree_index`].
    pub fn tree_index(&self, r: PropertyRef) -> Vec<usize> {
        match r.kind {
            PropertyKind::Task => self.tasks.tree_index(r.index),
            PropertyKind::Resource => self.resources.tree_index(r.index),
            PropertyKind::Account => self.accounts.tree_index(r.index),
            PropertyKind::Shift => self.shifts.tree_index(r.index),
        }
    }

    /// Value of `attribute` of a property, `property[attribute, scenario]`.
    ///
    /// `scenario` is `None` for scenario-independent access. Special
    /// attributes `id`, `name`, `seqno`, and `treelevel` are always
    /// answered.
    ///
    /// # Errors
    /// [`PropertyError::UnknownProperty`], [`PropertyError::UnknownScenario`],
    /// or [`PropertyError::UnknownAttribute`].
    pub fn attribute_value(
        &self,
        r: PropertyRef,
        attribute: &str,
        scenario: Option<usize>,
    ) -> Result<Option<AttributeValue>, PropertyError> {
        let property = self
            .property(r)
            .ok_or_else(|| PropertyError::UnknownProperty {
                kind: r.kind.to_string(),
                id: format!("#{}", r.index),
            })?;
        if let Some(s) = scenario.filter(|&s| s >= self.scenario_count()) {
            return Err(PropertyError::UnknownScenario(s));
        }

        let special = match attribute {
            "id" => Some(AttributeValue::Text(property.id().to_string())),
            "name" => Some(AttributeValue::Text(property.name().to_string())),
            "seqno" => Some(AttributeValue::Integer(property.sequence_no() as i64)),
            "treelevel" => Some(AttributeValue::Integer(property.level() as i64 + 1)),
            _ => None,
        };
        if special.is_some() {
            return Ok(special);
        }
        debug_assert!(!SPECIAL_ATTRIBUTES.contains(&attribute));
        if !self.is_known_attribute(r.kind, attribute) {
            return Err(PropertyError::UnknownAttribute(attribute.to_string()));
        }
        Ok(property.get(attribute, scenario).cloned())
    }

    /// Data needed to compute account turnover.
    pub fn cost_context(&self) -> CostContext<'_> {
        CostContext {
            accounts: &self.accounts,
            tasks: &self.tasks,
            resources: &self.resources,
            daily_working_seconds: self.daily_working_seconds(),
        }
    }

    /// Turnover of the account with ID `account` in `scenario` over `period`.
    pub fn turnover(&self, account: usize, scenario: usize, period: &Interval) -> f64 {
        self.accounts
            .get(account)
            .and_then(|a| a.scenarios().get(scenario))
            .map_or(0.0, |a| a.turnover(period, &self.cost_context()))
    }

    /// Schedules every enabled scenario.
    ///
    /// See [`Scheduler::schedule`].
    pub fn schedule(&mut self, messages: &mut MessageHandler) -> Result<(), SchedulingError> {
        Scheduler::new().schedule(self, messages)
    }
}

fn resolve_parent(
    kind: PropertyKind,
    parent: Option<&str>,
    lookup: impl Fn(&str) -> Option<usize>,
) -> Result<Option<usize>, PropertyError> {
    match parent {
        Some(id) => lookup(id).map(Some).ok_or_else(|| PropertyError::UnknownProperty {
            kind: kind.to_string(),
            id: id.to_string(),
        }),
        None => Ok(None),
    }
}
