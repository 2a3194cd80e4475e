use super::{Scenario, ScenarioData};
use crate::models::{on_vacation, Interval, Timestamp, WorkingHours};
use crate::property::{AttributeDefinition, AttributeKind, AttributeValue, PropertyKind};

/// Scenario state of a shift: a named working-hours pattern with its own
/// vacations that allocations can be restricted to.
#[derive(Debug, Clone)]
pub struct ShiftScenario {
    data: ScenarioData,
    /// Own working hours; `None` falls back to the office default.
    pub working_hours: Option<WorkingHours>,
    pub vacations: Vec<Interval>,
}

impl Scenario for ShiftScenario {
    const KIND: PropertyKind = PropertyKind::Shift;

    fn new(data: ScenarioData) -> Self {
        Self {
            data,
            working_hours: None,
            vacations: Vec::new(),
        }
    }

    fn definitions() -> Vec<AttributeDefinition> {
        vec![AttributeDefinition::new("alert", "Alert", AttributeKind::Integer)
            .global()
            .with_default(AttributeValue::Integer(0))]
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
}

impl ShiftScenario {
    /// Whether `date` lies within the shift's working hours.
    pub fn on_shift(&self, date: Timestamp) -> bool {
        match &self.working_hours {
            Some(hours) => hours.on_shift(date),
            None => WorkingHours::default().on_shift(date),
        }
    }

    /// Whether any shift vacation contains `date`.
    pub fn on_vacation(&self, date: Timestamp) -> bool {
        on_vacation(&self.vacations, date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeWindow;
    use chrono::Weekday;

    const MONDAY: Timestamp = 1_767_571_200;

    fn shift() -> ShiftScenario {
        let defs = ShiftScenario::definitions();
        ShiftScenario::new(ScenarioData::new(PropertyKind::Shift, 0, "early", 0, &defs))
    }

    #[test]
    fn test_on_shift_and_vacation() {
        let mut s = shift();
        s.working_hours =
            Some(WorkingHours::none().with_day(Weekday::Mon, vec![TimeWindow::hours(6, 14)]));
        s.vacations
            .push(Interval::new(MONDAY + 7 * 86_400, MONDAY + 8 * 86_400).unwrap());

        assert!(s.on_shift(MONDAY + 6 * 3600));
        assert!(!s.on_shift(MONDAY + 14 * 3600));
        assert!(!s.on_vacation(MONDAY + 6 * 3600));
        assert!(s.on_vacation(MONDAY + 7 * 86_400 + 6 * 3600));
    }

    #[test]
    fn test_inherits_working_hours() {
        let mut parent = shift();
        parent.working_hours =
            Some(WorkingHours::none().with_day(Weekday::Mon, vec![TimeWindow::hours(6, 14)]));
        let mut child = shift();
        assert!(child.on_shift(MONDAY + 9 * 3600));

        child.inherit_from(&parent);
        assert_eq!(child.working_hours, parent.working_hours);
        assert!(child.on_shift(MONDAY + 6 * 3600));
        assert!(!child.on_shift(MONDAY + 15 * 3600));

        let mut own = shift();
        own.working_hours = Some(WorkingHours::always());
        own.inherit_from(&parent);
        assert_eq!(own.working_hours, Some(WorkingHours::always()));
    }
}
