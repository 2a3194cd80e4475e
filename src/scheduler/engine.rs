//! Forward (ASAP) task placement for one scenario.
//!
//! # Algorithm
//!
//! 1. Reset the scenario, build resource scoreboards, and compute
//!    criticalness values.
//! 2. Pick the ready leaf task with the highest priority, then the highest
//!    path criticalness, then the lowest sequence number.
//! 3. Place it as soon as possible after its earliest start. Effort tasks
//!    are booked slot by slot through their allocations.
//! 4. Roll finished children up into their container tasks.
//! 5. Repeat until no task is ready.
//!
//! # Complexity
//! O(n² + n * s * a * c) where n=tasks, s=slots per task, a=allocations,
//! c=candidates per allocation.

use rand::Rng;
use tracing::debug;

use super::criticalness;
use crate::error::SchedulingError;
use crate::message::MessageHandler;
use crate::models::{format_timestamp, on_vacation, Duration, Interval, Timestamp};
use crate::project::Project;
use crate::property::AttributeValue;
use crate::scenario::{Scenario, TaskScenario};

/// How a leaf task is placed.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Placement {
    /// Start and end provided by the user.
    Fixed(Timestamp, Timestamp),
    Milestone,
    /// Calendar time.
    Duration(Duration),
    /// Working time of the project calendar.
    Length(Duration),
    /// Resource time.
    Effort(Duration),
    Unspecified,
}

impl Placement {
    fn of(task: &TaskScenario) -> Self {
        if let (Some(start), Some(end)) = (task.start(), task.end()) {
            if task.is_fixed() {
                return Placement::Fixed(start, end);
            }
        }
        if task.is_milestone() {
            Placement::Milestone
        } else if let Some(d) = task.duration() {
            Placement::Duration(d)
        } else if let Some(l) = task.length() {
            Placement::Length(l)
        } else if task.effort() > 0 {
            Placement::Effort(task.effort())
        } else {
            Placement::Unspecified
        }
    }
}

/// Schedules the tasks of one scenario.
pub(crate) struct TaskScheduler<'a, R: Rng + ?Sized> {
    project: &'a mut Project,
    scenario: usize,
    rng: &'a mut R,
}

impl<'a, R: Rng + ?Sized> TaskScheduler<'a, R> {
    pub(crate) fn new(project: &'a mut Project, scenario: usize, rng: &'a mut R) -> Self {
        Self {
            project,
            scenario,
            rng,
        }
    }

    /// Runs the whole pass.
    ///
    /// # Errors
    /// [`SchedulingError::Aborted`] on the first task that cannot be placed.
    pub(crate) fn run(&mut self, messages: &mut MessageHandler) -> Result<(), SchedulingError> {
        self.prepare(messages)?;

        while let Some(t) = self.next_ready() {
            self.place(t, messages)?;
            self.roll_up(t);
        }

        let s = self.scenario;
        let stuck = self
            .project
            .tasks
            .leaves()
            .find(|&t| !self.project.tasks[t].scenario(s).is_scheduled());
        if let Some(t) = stuck {
            return Err(self.error(
                t,
                messages,
                "unscheduled_task",
                "task cannot be scheduled because its dependencies are never met",
            ));
        }
        Ok(())
    }

    fn prepare(&mut self, messages: &mut MessageHandler) -> Result<(), SchedulingError> {
        let s = self.scenario;
        let project = &mut *self.project;

        project.tasks.iter_mut().for_each(|n| n.scenario_mut(s).reset());
        project.resources.iter_mut().for_each(|n| n.scenario_mut(s).reset());
        project.accounts.iter_mut().for_each(|n| n.scenario_mut(s).reset());
        project.shifts.iter_mut().for_each(|n| n.scenario_mut(s).reset());

        let period = project.period();
        let resolution = project.resolution();
        for r in 0..project.resources.len() {
            // Working hours come from the nearest resource that defines
            // them; vacations of all ancestors apply.
            let chain: Vec<usize> = std::iter::once(r)
                .chain(project.resources.ancestors(r))
                .collect();
            let hours = chain
                .iter()
                .find_map(|&i| project.resources[i].scenario(s).working_hours.clone())
                .unwrap_or_else(|| project.working_hours().clone());
            let mut vacations = project.vacations().to_vec();
            for &a in &chain[1..] {
                vacations.extend(project.resources[a].scenario(s).vacations.iter().copied());
            }

            let resource = project.resources[r].scenario_mut(s);
            if let Err(e) = resource.prepare_scoreboard(&period, resolution, &hours, &vacations) {
                return Err(resource.data().error(messages, "scoreboard", e.to_string()));
            }
        }

        criticalness::compute(project, s);
        debug!(
            scenario = %messages.scenario_id(s),
            tasks = project.tasks.len(),
            resources = project.resources.len(),
            "prepared scenario"
        );
        Ok(())
    }

    fn next_ready(&self) -> Option<usize> {
        let s = self.scenario;
        let tasks = &self.project.tasks;
        tasks
            .leaves()
            .filter(|&t| tasks[t].scenario(s).ready_for_scheduling(tasks))
            .max_by(|&a, &b| {
                let (ta, tb) = (tasks[a].scenario(s), tasks[b].scenario(s));
                ta.priority()
                    .cmp(&tb.priority())
                    .then(ta.path_criticalness().total_cmp(&tb.path_criticalness()))
                    .then(b.cmp(&a))
            })
    }

    /// Latest of the project start, provided start dates of the task and
    /// its ancestors, and all dependency constraints.
    fn earliest_start(&self, t: usize) -> Timestamp {
        let s = self.scenario;
        let tasks = &self.project.tasks;
        let mut earliest = self.project.start();
        for i in std::iter::once(t).chain(tasks.ancestors(t)) {
            let task = tasks[i].scenario(s);
            if let Some(AttributeValue::Date(start)) = task.data().input("start") {
                earliest = earliest.max(*start);
            }
            for dep in &task.depends {
                let other = tasks[dep.task].scenario(s);
                let base = if dep.on_end { other.end() } else { other.start() };
                if let Some(base) = base {
                    earliest = earliest.max(base + dep.gap_duration);
                }
            }
        }
        earliest
    }

    /// Rounds `date` up to the next slot boundary.
    fn align(&self, date: Timestamp) -> Timestamp {
        let start = self.project.start();
        let res = self.project.resolution();
        if date <= start {
            start
        } else {
            start + (date - start + res - 1) / res * res
        }
    }

    fn place(&mut self, t: usize, messages: &mut MessageHandler) -> Result<(), SchedulingError> {
        let s = self.scenario;
        let earliest = self.earliest_start(t);
        let placement = Placement::of(self.project.tasks[t].scenario(s));

        let (start, end) = match placement {
            Placement::Fixed(start, end) => {
                self.book_span(t, start, end, messages)?;
                (start, end)
            }
            Placement::Milestone => (earliest, earliest),
            Placement::Duration(d) => {
                self.book_span(t, earliest, earliest + d, messages)?;
                (earliest, earliest + d)
            }
            Placement::Length(l) => self.place_length(t, earliest, l, messages)?,
            Placement::Effort(e) => self.place_effort(t, earliest, e, messages)?,
            Placement::Unspecified => {
                self.project.tasks[t].scenario(s).data().warning(
                    messages,
                    "no_duration",
                    "task has no effort, duration, or length and is scheduled as a milestone",
                );
                (earliest, earliest)
            }
        };

        if end > self.project.end() {
            return Err(self.error(
                t,
                messages,
                "end_after_project",
                format!(
                    "task end {} is after the project end {}",
                    format_timestamp(end),
                    format_timestamp(self.project.end())
                ),
            ));
        }

        let node = &mut self.project.tasks[t];
        let id = node.id().to_string();
        let task = node.scenario_mut(s);
        task.set_start(start);
        task.set_end(end);
        task.set_scheduled();
        debug!(
            task = %id,
            start = %format_timestamp(start),
            end = %format_timestamp(end),
            "placed task"
        );
        Ok(())
    }

    /// Books resources wherever they are free within `[start, end)`.
    fn book_span(
        &mut self,
        t: usize,
        start: Timestamp,
        end: Timestamp,
        messages: &mut MessageHandler,
    ) -> Result<(), SchedulingError> {
        let res = self.project.resolution();
        let mut date = self.align(start);
        let mut done = 0.0;
        while date < end && date < self.project.end() {
            done += self.book_slot(t, date, messages)?;
            date += res;
        }
        self.project.tasks[t].scenario_mut(self.scenario).done_effort = done;
        Ok(())
    }

    fn place_length(
        &mut self,
        t: usize,
        earliest: Timestamp,
        length: Duration,
        messages: &mut MessageHandler,
    ) -> Result<(Timestamp, Timestamp), SchedulingError> {
        let res = self.project.resolution();
        let hours = self.project.working_hours().clone();
        let vacations = self.project.vacations().to_vec();
        let mut date = self.align(earliest);
        let mut first = None;
        let mut last_end = date;
        let mut worked = 0;

        while worked < length {
            if date >= self.project.end() {
                return Err(self.error(
                    t,
                    messages,
                    "length_not_completed",
                    format!(
                        "length of {}h could not be completed before the project end",
                        length as f64 / 3600.0
                    ),
                ));
            }
            if hours.on_shift(date) && !on_vacation(&vacations, date) {
                first.get_or_insert(date);
                self.book_slot(t, date, messages)?;
                worked += res;
                last_end = date + res;
            }
            date += res;
        }
        Ok((first.unwrap_or(last_end), last_end))
    }

    fn place_effort(
        &mut self,
        t: usize,
        earliest: Timestamp,
        effort: Duration,
        messages: &mut MessageHandler,
    ) -> Result<(Timestamp, Timestamp), SchedulingError> {
        let res = self.project.resolution();
        let effort = effort as f64;
        let mut date = self.align(earliest);
        let mut first = None;
        let mut last_end = date;
        let mut done = 0.0;

        while done < effort {
            if date >= self.project.end() {
                return Err(self.error(
                    t,
                    messages,
                    "effort_not_completed",
                    format!(
                        "effort of {:.1}h could not be completed before the project end {} ({:.1}h done)",
                        effort / 3600.0,
                        format_timestamp(self.project.end()),
                        done / 3600.0
                    ),
                ));
            }
            let booked = self.book_slot(t, date, messages)?;
            if booked > 0.0 {
                first.get_or_insert(date);
                last_end = date + res;
                done += booked;
            }
            date += res;
        }

        self.project.tasks[t].scenario_mut(self.scenario).done_effort = done;
        Ok((first.unwrap_or(last_end), last_end))
    }

    /// Serves every allocation of task `t` for the slot at `date`.
    ///
    /// Returns the effort performed in this slot. A mandatory allocation
    /// without a free candidate blocks the whole slot.
    fn book_slot(
        &mut self,
        t: usize,
        date: Timestamp,
        messages: &mut MessageHandler,
    ) -> Result<f64, SchedulingError> {
        let s = self.scenario;
        let res = self.project.resolution();
        let project = &mut *self.project;
        let allocations = project.tasks[t].scenario(s).allocations.clone();

        let mut picks: Vec<(usize, usize)> = Vec::new();
        for (ai, alloc) in allocations.iter().enumerate() {
            let pick = if alloc.on_shift(date, &project.shifts, s) {
                let candidates = match alloc.locked() {
                    Some(r) => vec![r],
                    None => alloc.candidates(Some(s), &project.resources, &mut *self.rng),
                };
                candidates.into_iter().find(|&r| {
                    project
                        .resources
                        .get(r)
                        .is_some_and(|n| n.is_leaf() && n.scenario(s).is_free(date))
                        && !picks.iter().any(|&(_, p)| p == r)
                })
            } else {
                None
            };
            match pick {
                Some(r) => picks.push((ai, r)),
                None if alloc.mandatory => return Ok(0.0),
                None => {}
            }
        }

        let slot = Interval::from_ordered(date, date + res);
        let mut done = 0.0;
        for (ai, r) in picks {
            let resource = project.resources[r].scenario_mut(s);
            if !resource.book(date, t) {
                continue;
            }
            done += res as f64 * resource.efficiency();

            let task = project.tasks[t].scenario_mut(s);
            task.allocations[ai].lock(r);
            if let Err(e) = task.book(r, slot) {
                return Err(task.data().error(messages, "booking", e.to_string()));
            }
        }
        Ok(done)
    }

    /// Marks ancestors whose children are all scheduled as scheduled,
    /// spanning their children.
    fn roll_up(&mut self, t: usize) {
        let s = self.scenario;
        let tasks = &mut self.project.tasks;
        for a in tasks.ancestors(t) {
            let children = tasks[a].children().to_vec();
            if !children.iter().all(|&c| tasks[c].scenario(s).is_scheduled()) {
                break;
            }
            let start = children.iter().filter_map(|&c| tasks[c].scenario(s).start()).min();
            let end = children.iter().filter_map(|&c| tasks[c].scenario(s).end()).max();
            let container = tasks[a].scenario_mut(s);
            if let Some(start) = start {
                container.set_start(start);
            }
            if let Some(end) = end {
                container.set_end(end);
            }
            container.set_scheduled();
        }
    }

    fn error(
        &self,
        t: usize,
        messages: &mut MessageHandler,
        id: &str,
        text: impl Into<String>,
    ) -> SchedulingError {
        self.project.tasks[t]
            .scenario(self.scenario)
            .data()
            .error(messages, id, text)
    }
}
