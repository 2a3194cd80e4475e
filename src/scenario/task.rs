use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{CostContext, Scenario, ScenarioData};
use crate::allocation::Allocation;
use crate::error::IntervalError;
use crate::models::{Duration, Interval, IntervalList, Timestamp};
use crate::property::{AttributeDefinition, AttributeKind, AttributeValue, PropertyKind, PropertySet};

/// Default task priority.
pub const DEFAULT_PRIORITY: i64 = 500;

/// A dependency on another task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    /// Index of the task depended on.
    pub task: usize,
    /// Wait for the end (`true`) or only the start of the other task.
    pub on_end: bool,
    /// Calendar time to keep between the two tasks.
    pub gap_duration: Duration,
}

impl Dependency {
    /// Finish-to-start dependency without gap.
    pub fn new(task: usize) -> Self {
        Self {
            task,
            on_end: true,
            gap_duration: 0,
        }
    }

    /// Depends on the start of the other task instead of its end.
    pub fn on_start(mut self) -> Self {
        self.on_end = false;
        self
    }

    /// Sets the gap.
    pub fn with_gap(mut self, gap: Duration) -> Self {
        self.gap_duration = gap;
        self
    }
}

/// Part of a task's cost credited to an account.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChargeShare {
    pub account: usize,
    /// Fraction in `(0, 1]`.
    pub share: f64,
}

/// A fixed amount charged at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Charge {
    pub amount: f64,
    pub at: Timestamp,
}

/// Scenario state of a task.
///
/// User input lives in the attribute bag (`start`, `effort`, `priority`,
/// ...) and in the typed lists below. The scheduler writes the computed
/// `start`, `end`, criticalness values, and the per-resource bookings.
#[derive(Debug, Clone)]
pub struct TaskScenario {
    data: ScenarioData,
    pub allocations: Vec<Allocation>,
    pub depends: Vec<Dependency>,
    pub chargeset: Vec<ChargeShare>,
    pub charges: Vec<Charge>,
    pub(crate) bookings: BTreeMap<usize, IntervalList>,
    pub(crate) done_effort: f64,
}

impl Scenario for TaskScenario {
    const KIND: PropertyKind = PropertyKind::Task;

    fn new(data: ScenarioData) -> Self {
        Self {
            data,
            allocations: Vec::new(),
            depends: Vec::new(),
            chargeset: Vec::new(),
            charges: Vec::new(),
            bookings: BTreeMap::new(),
            done_effort: 0.0,
        }
    }

    fn definitions() -> Vec<AttributeDefinition> {
        use AttributeKind as K;
        vec![
            AttributeDefinition::new("start", "Start", K::Date),
            AttributeDefinition::new("end", "End", K::Date),
            AttributeDefinition::new("effort", "Effort", K::Duration),
            AttributeDefinition::new("duration", "Duration", K::Duration),
            AttributeDefinition::new("length", "Length", K::Duration),
            AttributeDefinition::new("milestone", "Milestone", K::Bool)
                .with_default(AttributeValue::Bool(false)),
            AttributeDefinition::new("priority", "Priority", K::Integer)
                .inheritable()
                .with_default(AttributeValue::Integer(DEFAULT_PRIORITY)),
            AttributeDefinition::new("criticalness", "Criticalness", K::Number)
                .with_default(AttributeValue::Number(0.0)),
            AttributeDefinition::new("pathcriticalness", "Path Criticalness", K::Number)
                .with_default(AttributeValue::Number(0.0)),
            AttributeDefinition::new("scheduled", "Scheduled", K::Bool)
                .with_default(AttributeValue::Bool(false)),
            AttributeDefinition::new("complete", "Completion", K::Number)
                .with_default(AttributeValue::Number(0.0)),
            AttributeDefinition::new("alert", "Alert", K::Integer)
                .global()
                .with_default(AttributeValue::Integer(0)),
        ]
    }

    fn data(&self) -> &ScenarioData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut ScenarioData {
        &mut self.data
    }

    fn inherit_from(&mut self, parent: &Self) {
        self.data.inherit_from(&parent.data);
        if self.allocations.is_empty() {
            self.allocations = parent.allocations.clone();
        }
        if self.depends.is_empty() {
            self.depends = parent.depends.clone();
        }
        if self.chargeset.is_empty() {
            self.chargeset = parent.chargeset.clone();
        }
        if self.charges.is_empty() {
            self.charges = parent.charges.clone();
        }
    }

    fn reset(&mut self) {
        self.data.reset_computed();
        self.bookings.clear();
        self.allocations.iter_mut().for_each(Allocation::unlock);
        self.done_effort = 0.0;
    }
}

impl TaskScenario {
    /// Start date, provided or computed.
    pub fn start(&self) -> Option<Timestamp> {
        self.data.date("start")
    }

    /// End date, provided or computed.
    pub fn end(&self) -> Option<Timestamp> {
        self.data.date("end")
    }

    /// Requested effort in resource seconds; 0 if none.
    pub fn effort(&self) -> Duration {
        self.data.duration("effort").unwrap_or(0)
    }

    /// Requested calendar duration.
    pub fn duration(&self) -> Option<Duration> {
        self.data.duration("duration")
    }

    /// Requested working-time length.
    pub fn length(&self) -> Option<Duration> {
        self.data.duration("length")
    }

    pub fn is_milestone(&self) -> bool {
        self.data.flag("milestone")
    }

    pub fn priority(&self) -> i64 {
        self.data.integer("priority").unwrap_or(DEFAULT_PRIORITY)
    }

    pub fn criticalness(&self) -> f64 {
        self.data.number("criticalness").unwrap_or(0.0)
    }

    pub fn path_criticalness(&self) -> f64 {
        self.data.number("pathcriticalness").unwrap_or(0.0)
    }

    /// Whether the scheduler has placed the task in this scenario.
    pub fn is_scheduled(&self) -> bool {
        self.data.flag("scheduled")
    }

    /// Completion in percent.
    pub fn complete(&self) -> f64 {
        self.data.number("complete").unwrap_or(0.0)
    }

    /// Whether the task has a start and end provided by the user.
    pub fn is_fixed(&self) -> bool {
        self.data.input("start").is_some() && self.data.input("end").is_some()
    }

    pub(crate) fn set_start(&mut self, start: Timestamp) {
        self.data.compute("start", AttributeValue::Date(start));
    }

    pub(crate) fn set_end(&mut self, end: Timestamp) {
        self.data.compute("end", AttributeValue::Date(end));
    }

    pub(crate) fn set_scheduled(&mut self) {
        self.data.compute("scheduled", AttributeValue::Bool(true));
    }

    pub(crate) fn set_criticalness(&mut self, value: f64) {
        self.data.compute("criticalness", AttributeValue::Number(value));
    }

    pub(crate) fn set_path_criticalness(&mut self, value: f64) {
        self.data.compute("pathcriticalness", AttributeValue::Number(value));
    }

    /// Records that `resource` works on this task during `interval`.
    ///
    /// Bookings per resource must be appended in ascending order; adjacent
    /// bookings merge.
    pub fn book(&mut self, resource: usize, interval: Interval) -> Result<(), IntervalError> {
        self.bookings.entry(resource).or_default().append(interval)
    }

    /// Bookings per resource index.
    pub fn bookings(&self) -> &BTreeMap<usize, IntervalList> {
        &self.bookings
    }

    /// Resources with at least one booking, by index.
    pub fn assigned_resources(&self) -> Vec<usize> {
        self.bookings
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(&r, _)| r)
            .collect()
    }

    /// Effort already performed, in resource seconds.
    pub fn done_effort(&self) -> f64 {
        self.done_effort
    }

    /// Whether the scheduler may place this task now.
    ///
    /// True for unscheduled leaf tasks whose own dependencies and those of
    /// all ancestors refer to scheduled tasks.
    pub fn ready_for_scheduling(&self, tasks: &PropertySet<TaskScenario>) -> bool {
        let own = self.data.property();
        let scenario = self.data.scenario_idx();
        if self.is_scheduled() || tasks.get(own).is_some_and(|n| n.is_container()) {
            return false;
        }
        let deps_done = |deps: &[Dependency]| {
            deps.iter().all(|d| {
                tasks
                    .get(d.task)
                    .is_some_and(|t| t.scenario(scenario).is_scheduled())
            })
        };
        deps_done(self.depends.as_slice())
            && tasks
                .ancestors(own)
                .into_iter()
                .all(|a| deps_done(tasks[a].scenario(scenario).depends.as_slice()))
    }

    /// Charge share for `account`, from this task or its nearest ancestor
    /// with a chargeset.
    fn charge_share(&self, account: usize, tasks: &PropertySet<TaskScenario>) -> f64 {
        let scenario = self.data.scenario_idx();
        let chain = std::iter::once(self).chain(
            tasks
                .ancestors(self.data.property())
                .into_iter()
                .map(|a| tasks[a].scenario(scenario)),
        );
        for task in chain {
            if !task.chargeset.is_empty() {
                return task
                    .chargeset
                    .iter()
                    .filter(|c| c.account == account)
                    .map(|c| c.share)
                    .sum();
            }
        }
        0.0
    }

    /// Cost this task credits to `account` within `period`.
    ///
    /// Booked time is charged at the resource's daily rate; fixed charges
    /// count when they fall inside the period.
    pub fn turnover(&self, account: usize, period: &Interval, ctx: &CostContext<'_>) -> f64 {
        let share = self.charge_share(account, ctx.tasks);
        if share == 0.0 {
            return 0.0;
        }
        let scenario = self.data.scenario_idx();

        let booked: f64 = self
            .bookings
            .iter()
            .map(|(&r, list)| {
                let rate = ctx
                    .resources
                    .get(r)
                    .map_or(0.0, |n| n.scenario(scenario).rate());
                list.duration_within(period) as f64 / ctx.daily_working_seconds * rate
            })
            .sum();
        let charged: f64 = self
            .charges
            .iter()
            .filter(|c| period.contains(c.at))
            .map(|c| c.amount)
            .sum();

        share * (booked + charged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = 3600;

    fn tasks() -> PropertySet<TaskScenario> {
        let mut set: PropertySet<TaskScenario> = PropertySet::new(1);
        let prj = set.add("prj", "Project", None).unwrap();
        let a = set.add("a", "A", Some(prj)).unwrap();
        let b = set.add("b", "B", Some(prj)).unwrap();
        let c = set.add("c", "C", None).unwrap();
        set[b].scenario_mut(0).depends.push(Dependency::new(a));
        set[prj].scenario_mut(0).depends.push(Dependency::new(c));
        set
    }

    #[test]
    fn test_defaults() {
        let set = tasks();
        let t = set[1].scenario(0);
        assert_eq!(t.priority(), DEFAULT_PRIORITY);
        assert_eq!(t.effort(), 0);
        assert_eq!(t.start(), None);
        assert!(!t.is_milestone());
        assert!(!t.is_scheduled());
    }

    #[test]
    fn test_ready_for_scheduling() {
        let mut set = tasks();
        // Container tasks are never placed directly.
        assert!(!set[0].scenario(0).ready_for_scheduling(&set));
        // The parent depends on c.
        assert!(!set[1].scenario(0).ready_for_scheduling(&set));
        assert!(set[3].scenario(0).ready_for_scheduling(&set));

        set[3].scenario_mut(0).set_scheduled();
        assert!(set[1].scenario(0).ready_for_scheduling(&set));
        assert!(!set[2].scenario(0).ready_for_scheduling(&set));

        set[1].scenario_mut(0).set_scheduled();
        assert!(set[2].scenario(0).ready_for_scheduling(&set));
        assert!(!set[1].scenario(0).ready_for_scheduling(&set));
    }

    #[test]
    fn test_bookings_merge() {
        let mut set = tasks();
        let t = set[1].scenario_mut(0);
        t.book(0, Interval::new(0, HOUR).unwrap()).unwrap();
        t.book(0, Interval::new(HOUR, 2 * HOUR).unwrap()).unwrap();
        t.book(2, Interval::new(0, HOUR).unwrap()).unwrap();
        assert!(t.book(0, Interval::new(0, HOUR).unwrap()).is_err());

        assert_eq!(t.bookings()[&0].len(), 1);
        assert_eq!(t.assigned_resources(), vec![0, 2]);

        t.reset();
        assert!(t.assigned_resources().is_empty());
    }

    #[test]
    fn test_computed_values_reset() {
        let mut set = tasks();
        set.set_attribute(1, "start", Some(0), AttributeValue::Date(100))
            .unwrap();
        let t = set[1].scenario_mut(0);
        t.set_start(500);
        t.set_end(900);
        assert_eq!(t.start(), Some(500));
        t.reset();
        assert_eq!(t.start(), Some(100));
        assert_eq!(t.end(), None);
    }
}
