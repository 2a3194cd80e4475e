//! Project scheduling core.
//!
//! Holds the scenario-scoped data model of a project (tasks, resources,
//! accounts, shifts), the time primitives the scheduler works on, resource
//! allocation, and the logical expressions reports use to filter
//! properties. Parsing project files and rendering reports happen in
//! front-ends on top of this crate.
//!
//! # Modules
//!
//! - **`models`**: Time primitives: `Interval`, `IntervalList`,
//!   `WorkingHours`, `Scoreboard`
//! - **`property`**: Attributes, `PropertyTreeNode`, `PropertySet`,
//!   `PropertyList`
//! - **`scenario`**: `ScenarioData` and the task, resource, account, and
//!   shift specializations
//! - **`allocation`**: Candidate resources and selection modes
//! - **`expression`**: `LogicalExpression`, `LogicalOperation`,
//!   `LogicalFunction`, evaluated against a `Query`
//! - **`project`**: The `Project` tying scenarios and property trees together
//! - **`scheduler`**: Forward scheduling of every enabled scenario
//! - **`validation`**: Input integrity checks (dependencies, cycles, allocations)
//! - **`message`**: Diagnostics sink passed into the scheduler
//! - **`config`**: Project configuration, loadable from JSON
//!
//! # Data Flow
//!
//! A front-end builds a [`Project`] from a [`ProjectConfig`], adds
//! properties, and sets their provided attributes. [`Project::schedule`]
//! fills in start, end, and bookings per scenario. Reports then read the
//! results through [`PropertyList`] and [`LogicalExpression`] filters.
//!
//! # Logging
//!
//! Events are emitted through `tracing`; installing a subscriber is left to
//! the application.
//!
//! # References
//!
//! - Kolisch (1996), "Serial and parallel resource-constrained project
//!   scheduling methods revisited"
//! - Cormen et al. (2009), "Introduction to Algorithms"

pub mod allocation;
pub mod config;
pub mod error;
pub mod expression;
pub mod message;
pub mod models;
pub mod project;
pub mod property;
pub mod scenario;
pub mod scheduler;
pub mod validation;

pub use allocation::{Allocation, SelectionMode};
pub use config::{ProjectConfig, ScenarioConfig};
pub use error::{
    AllocationError, ConfigError, EvalError, IntervalError, PropertyError, SchedulingError,
    ScoreboardError,
};
pub use expression::{LogicalExpression, LogicalFunction, LogicalOperation, Query, Value};
pub use message::{Message, MessageHandler, MessageLevel};
pub use models::{Interval, IntervalList, Scoreboard, Timestamp, WorkingHours};
pub use project::Project;
pub use property::{PropertyKind, PropertyList, PropertyRef, PropertySet, PropertyTreeNode};
pub use scheduler::Scheduler;
