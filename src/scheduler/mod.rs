//! Scenario scheduling driver.
//!
//! Validates a project, resolves inheritance, and schedules every enabled
//! scenario independently with a forward (as soon as possible) placement
//! pass.
//!
//! # Algorithm
//!
//! 1. Propagate scenario values (parent scenario to child scenario), then
//!    inheritable attributes (parent property to child property).
//! 2. Validate; any issue aborts before a scenario is touched.
//! 3. For each enabled scenario: reset, build resource scoreboards,
//!    compute criticalness, and place tasks in priority order.
//! 4. A failing scenario is reported and skipped; the others still run.
//!
//! # Random Selection
//! Allocations in `random` mode draw from a `StdRng` seeded per scenario
//! with `seed + scenario index`, so runs are reproducible.
//!
//! # Reference
//! Kolisch (1996), "Serial and parallel resource-constrained project
//! scheduling methods revisited"

mod criticalness;
mod engine;

pub(crate) use criticalness::successors;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::error::SchedulingError;
use crate::message::MessageHandler;
use crate::project::Project;
use crate::validation;
use engine::TaskScheduler;

/// Schedules all enabled scenarios of a project.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use proj_schedule::config::ProjectConfig;
/// use proj_schedule::message::MessageHandler;
/// use proj_schedule::project::Project;
/// use proj_schedule::property::AttributeValue;
/// use proj_schedule::scheduler::Scheduler;
///
/// let config = ProjectConfig::new(
///     "prj",
///     "Example",
///     Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap(),
///     Utc.with_ymd_and_hms(2026, 1, 12, 0, 0, 0).unwrap(),
/// );
/// let mut project = Project::new(config).unwrap();
/// let t = project.add_task("kickoff", "Kickoff", None).unwrap();
/// project
///     .tasks_mut()
///     .set_attribute(t, "milestone", Some(0), AttributeValue::Bool(true))
///     .unwrap();
///
/// let mut messages = MessageHandler::new();
/// Scheduler::new().schedule(&mut project, &mut messages).unwrap();
/// assert!(project.tasks()[t].scenario(0).is_scheduled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    seed: Option<u64>,
}

impl Scheduler {
    /// Creates a new scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the configured random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Schedules every enabled scenario.
    ///
    /// # Errors
    /// - [`SchedulingError::Validation`] if the project is inconsistent;
    ///   each issue is recorded in `messages`.
    /// - [`SchedulingError::ScenariosFailed`] with the IDs of the scenarios
    ///   that could not be scheduled. Successful scenarios keep their
    ///   results.
    pub fn schedule(
        &self,
        project: &mut Project,
        messages: &mut MessageHandler,
    ) -> Result<(), SchedulingError> {
        messages.set_scenarios(project.scenario_ids());
        inherit(project);

        let issues = validation::report(project, messages);
        if issues > 0 {
            warn!(project = %project.id(), issues, "project validation failed");
            return Err(SchedulingError::Validation(issues));
        }

        let seed = self.seed.or(project.config().random_seed).unwrap_or(0);
        let enabled: Vec<(usize, String)> = project
            .scenarios()
            .iter()
            .enumerate()
            .filter(|(_, s)| s.enabled)
            .map(|(i, s)| (i, s.id.clone()))
            .collect();

        let mut failed = Vec::new();
        for (idx, id) in enabled {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(idx as u64));
            let result = TaskScheduler::new(project, idx, &mut rng).run(messages);
            match result {
                Ok(()) => info!(scenario = %id, tasks = project.tasks().len(), "scenario scheduled"),
                Err(e) => {
                    warn!(scenario = %id, error = %e, "scenario failed");
                    failed.push(id);
                }
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(SchedulingError::ScenariosFailed(failed))
        }
    }
}

fn inherit(project: &mut Project) {
    let parents = project.scenario_parents();
    project.tasks.inherit_scenarios(&parents);
    project.resources.inherit_scenarios(&parents);
    project.accounts.inherit_scenarios(&parents);
    project.shifts.inherit_scenarios(&parents);

    project.tasks.inherit_attributes();
    project.resources.inherit_attributes();
    project.accounts.inherit_attributes();
    project.shifts.inherit_attributes();
}
