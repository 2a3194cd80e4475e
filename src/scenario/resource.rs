use super::{Scenario, ScenarioData};
use crate::error::ScoreboardError;
use crate::models::{on_vacation, Duration, Interval, Scoreboard, Slot, Timestamp, WorkingHours};
use crate::property::{AttributeDefinition, AttributeKind, AttributeValue, PropertyKind};

/// Scenario state of a resource.
///
/// The scoreboard is built by the scheduler at the start of each pass and
/// records, per slot, whether the resource is off duty, on vacation, free,
/// or booked by a task.
#[derive(Debug, Clone)]
pub struct ResourceScenario {
    data: ScenarioData,
    /// Own working hours; `None` uses the parent's or the project's.
    pub working_hours: Option<WorkingHours>,
    /// Personal vacations.
    pub vacations: Vec<Interval>,
    pub(crate) scoreboard: Option<Scoreboard<Slot>>,
}

impl Scenario for ResourceScenario {
    const KIND: PropertyKind = PropertyKind::Resource;

    fn new(data: ScenarioData) -> Self {
        Self {
            data,
            working_hours: None,
            vacations: Vec::new(),
            scoreboard: None,
        }
    }

    fn definitions() -> Vec<AttributeDefinition> {
        vec![
            AttributeDefinition::new("efficiency", "Efficiency", AttributeKind::Number)
                .inheritable()
                .with_default(AttributeValue::Number(1.0)),
            AttributeDefinition::new("rate", "Rate", AttributeKind::Number)
                .inheritable()
                .with_default(AttributeValue::Number(0.0)),
            AttributeDefinition::new("criticalness", "Criticalness", AttributeKind::Number)
                .with_default(AttributeValue::Number(0.0)),
            AttributeDefinition::new("effort", "Effort", AttributeKind::Duration)
                .with_default(AttributeValue::Duration(0)),
            AttributeDefinition::new("alloctdeffort", "Allocated Effort", AttributeKind::Number)
                .with_default(AttributeValue::Number(0.0)),
            AttributeDefinition::new("alert", "Alert", AttributeKind::Integer)
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
        if self.working_hours.is_none() {
            self.working_hours = parent.working_hours.clone();
        }
        if self.vacations.is_empty() {
            self.vacations = parent.vacations.clone();
        }
    }

    fn reset(&mut self) {
        self.data.reset_computed();
        self.scoreboard = None;
    }
}

impl ResourceScenario {
    /// Work performed per booked second.
    pub fn efficiency(&self) -> f64 {
        self.data.number("efficiency").unwrap_or(1.0)
    }

    /// Cost per working day.
    pub fn rate(&self) -> f64 {
        self.data.number("rate").unwrap_or(0.0)
    }

    /// Ratio of requested effort to available time.
    pub fn criticalness(&self) -> f64 {
        self.data.number("criticalness").unwrap_or(0.0)
    }

    pub(crate) fn set_criticalness(&mut self, value: f64) {
        self.data.compute("criticalness", AttributeValue::Number(value));
    }

    /// Seconds booked so far in this scenario.
    pub fn allocated_seconds(&self) -> Duration {
        self.data.duration("effort").unwrap_or(0)
    }

    /// Effort tasks have requested from this resource.
    pub fn requested_effort(&self) -> f64 {
        self.data.number("alloctdeffort").unwrap_or(0.0)
    }

    /// Adds requested effort (seconds) from a task allocation.
    pub fn add_requested_effort(&mut self, seconds: f64) {
        let total = self.requested_effort() + seconds;
        self.data.compute("alloctdeffort", AttributeValue::Number(total));
    }

    /// Builds the availability scoreboard for this pass.
    ///
    /// Slots off the working hours are [`Slot::OffDuty`]; slots in a
    /// personal vacation or one of `extra_vacations` (project-wide or
    /// inherited from a parent resource) are [`Slot::Vacation`].
    pub fn prepare_scoreboard(
        &mut self,
        period: &Interval,
        resolution: Duration,
        default_hours: &WorkingHours,
        extra_vacations: &[Interval],
    ) -> Result<(), ScoreboardError> {
        let mut board = Scoreboard::new(period.start(), period.end(), resolution, Slot::Free)?;
        let hours = self.working_hours.as_ref().unwrap_or(default_hours);
        for idx in 0..board.size() {
            let date = board.slot_start(idx);
            board[idx] = if on_vacation(&self.vacations, date) || on_vacation(extra_vacations, date)
            {
                Slot::Vacation
            } else if hours.on_shift(date) {
                Slot::Free
            } else {
                Slot::OffDuty
            };
        }
        self.scoreboard = Some(board);
        Ok(())
    }

    /// Availability scoreboard of the current pass.
    pub fn scoreboard(&self) -> Option<&Scoreboard<Slot>> {
        self.scoreboard.as_ref()
    }

    /// Whether the slot starting at `date` is free.
    pub fn is_free(&self, date: Timestamp) -> bool {
        self.scoreboard
            .as_ref()
            .and_then(|b| b.get(date).ok())
            .is_some_and(|slot| *slot == Slot::Free)
    }

    /// Books the slot at `date` for `task`.
    ///
    /// Returns `false` if the slot is not free.
    pub fn book(&mut self, date: Timestamp, task: usize) -> bool {
        if !self.is_free(date) {
            return false;
        }
        let booked = self.allocated_seconds();
        let Some(board) = self.scoreboard.as_mut() else {
            return false;
        };
        if board.set(date, Slot::Booked(task)).is_err() {
            return false;
        }
        let booked = booked + board.resolution();
        self.data.compute("effort", AttributeValue::Duration(booked));
        true
    }

    /// Seconds of free (unbooked, on-duty) time before the scoreboard end.
    pub fn free_seconds(&self) -> Duration {
        let Some(board) = self.scoreboard.as_ref() else {
            return 0;
        };
        let span = Interval::from_ordered(board.start_date(), board.end_date());
        board
            .collect_intervals(&span, board.resolution(), |s| *s == Slot::Free)
            .iter()
            .map(Interval::duration)
            .sum()
    }

    /// Seconds booked by any task within `period`.
    pub fn booked_seconds_in(&self, period: &Interval) -> Duration {
        let Some(board) = self.scoreboard.as_ref() else {
            return 0;
        };
        board
            .collect_intervals(period, board.resolution(), |s| matches!(s, Slot::Booked(_)))
            .iter()
            .map(Interval::duration)
            .sum()
    }

    /// Off-duty and vacation runs of at least `min_duration` within `period`.
    pub fn time_off(&self, period: &Interval, min_duration: Duration) -> Vec<Interval> {
        self.scoreboard.as_ref().map_or_else(Vec::new, |b| {
            b.collect_time_off_intervals(period, min_duration, &[Slot::OffDuty, Slot::Vacation])
        })
    }
}
