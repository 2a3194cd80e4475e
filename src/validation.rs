//! Input validation for projects.
//!
//! Checks structural integrity of the property trees before scheduling.
//! Detects:
//! - Dependencies on unknown tasks, on the task itself, or along its
//!   own branch of the tree
//! - Circular dependencies (DAG validation on leaf tasks)
//! - Allocations of unknown or container resources
//! - Effort tasks without allocations
//! - Milestones with a duration, and tasks with several duration kinds
//! - Charges to unknown accounts
//!
//! Every scenario is checked, since each carries its own dependencies
//! and allocations.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use crate::message::MessageHandler;
use crate::project::Project;
use crate::scheduler::successors;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A dependency names a task that doesn't exist.
    InvalidDependency,
    /// A task depends on itself.
    SelfDependency,
    /// A task depends on one of its ancestors or descendants.
    HierarchyDependency,
    /// Dependency graph contains a cycle.
    CyclicDependency,
    /// An allocation names a resource that doesn't exist.
    InvalidResourceReference,
    /// An allocation names a resource group.
    ContainerAllocation,
    /// A leaf task has effort but nothing to allocate.
    MissingAllocation,
    /// A milestone has an effort, duration, or length.
    InvalidMilestone,
    /// More than one of effort, duration, and length is set.
    ConflictingDurations,
    /// A chargeset names an account that doesn't exist.
    UnknownAccount,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Stable message identifier.
    pub fn id(&self) -> &'static str {
        match self.kind {
            ValidationErrorKind::InvalidDependency => "unknown_dependency",
            ValidationErrorKind::SelfDependency => "self_dependency",
            ValidationErrorKind::HierarchyDependency => "hierarchy_dependency",
            ValidationErrorKind::CyclicDependency => "loop_detected",
            ValidationErrorKind::InvalidResourceReference => "unknown_resource",
            ValidationErrorKind::ContainerAllocation => "container_allocation",
            ValidationErrorKind::MissingAllocation => "no_allocation",
            ValidationErrorKind::InvalidMilestone => "milestone_duration",
            ValidationErrorKind::ConflictingDurations => "multiple_durations",
            ValidationErrorKind::UnknownAccount => "unknown_account",
        }
    }
}

/// Validates a project before scheduling.
///
/// Checks, per scenario:
/// 1. Dependencies point to existing tasks
/// 2. No task depends on itself, an ancestor, or a descendant
/// 3. Allocations name existing leaf resources
/// 4. Leaf tasks with effort have allocations
/// 5. Milestones carry no effort, duration, or length
/// 6. At most one of effort, duration, and length is set
/// 7. Chargesets name existing accounts
/// 8. No circular dependencies (only when 1 and 2 pass)
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_project(project: &Project) -> ValidationResult {
    let mut errors = Vec::new();
    let tasks = project.tasks();
    let resources = project.resources();
    let scenario_ids = project.scenario_ids();

    for (s, scenario) in scenario_ids.iter().enumerate() {
        let mut references_ok = true;

        for node in tasks.iter() {
            let t = node.index();
            let task = node.scenario(s);

            for dep in &task.depends {
                let Some(other) = tasks.get(dep.task) else {
                    references_ok = false;
                    errors.push(ValidationError::new(
                        ValidationErrorKind::InvalidDependency,
                        format!(
                            "[{scenario}] Task '{}' depends on unknown task #{}",
                            node.id(),
                            dep.task
                        ),
                    ));
                    continue;
                };
                if dep.task == t {
                    references_ok = false;
                    errors.push(ValidationError::new(
                        ValidationErrorKind::SelfDependency,
                        format!("[{scenario}] Task '{}' depends on itself", node.id()),
                    ));
                } else if tasks.is_ancestor(dep.task, t) || tasks.is_ancestor(t, dep.task) {
                    references_ok = false;
                    errors.push(ValidationError::new(
                        ValidationErrorKind::HierarchyDependency,
                        format!(
                            "[{scenario}] Task '{}' depends on '{}' in its own branch",
                            node.id(),
                            other.id()
                        ),
                    ));
                }
            }

            for alloc in &task.allocations {
                for &r in alloc.declared_candidates() {
                    match resources.get(r) {
                        None => errors.push(ValidationError::new(
                            ValidationErrorKind::InvalidResourceReference,
                            format!(
                                "[{scenario}] Task '{}' allocates unknown resource #{r}",
                                node.id()
                            ),
                        )),
                        Some(res) if res.is_container() => errors.push(ValidationError::new(
                            ValidationErrorKind::ContainerAllocation,
                            format!(
                                "[{scenario}] Task '{}' allocates resource group '{}'",
                                node.id(),
                                res.id()
                            ),
                        )),
                        Some(_) => {}
                    }
                }
            }

            for share in &task.chargeset {
                if project.accounts().get(share.account).is_none() {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::UnknownAccount,
                        format!(
                            "[{scenario}] Task '{}' charges unknown account #{}",
                            node.id(),
                            share.account
                        ),
                    ));
                }
            }

            if node.is_container() {
                continue;
            }

            let has_effort = task.effort() > 0;
            let kinds = [has_effort, task.duration().is_some(), task.length().is_some()];
            let kind_count = kinds.iter().filter(|&&k| k).count();
            if task.is_milestone() && kind_count > 0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidMilestone,
                    format!(
                        "[{scenario}] Milestone '{}' must not have effort, duration, or length",
                        node.id()
                    ),
                ));
            } else if kind_count > 1 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::ConflictingDurations,
                    format!(
                        "[{scenario}] Task '{}' has more than one of effort, duration, and length",
                        node.id()
                    ),
                ));
            }
            if has_effort && !task.is_fixed() && task.allocations.is_empty() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::MissingAllocation,
                    format!(
                        "[{scenario}] Task '{}' has effort but no resource allocations",
                        node.id()
                    ),
                ));
            }
        }

        if references_ok {
            if let Some(cycle_err) = detect_cycles(project, s, scenario) {
                errors.push(cycle_err);
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates and records every issue in `messages`.
///
/// Returns the number of issues found.
pub fn report(project: &Project, messages: &mut MessageHandler) -> usize {
    match validate_project(project) {
        Ok(()) => 0,
        Err(errors) => {
            for e in &errors {
                messages.error(e.id(), e.message.clone());
            }
            errors.len()
        }
    }
}

/// Detects cycles in the leaf-task dependency graph using DFS.
///
/// # Algorithm
/// Topological sort via DFS. If a back-edge is found (visiting a node
/// currently in the recursion stack), a cycle exists.
///
/// # Reference
/// Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4
fn detect_cycles(project: &Project, s: usize, scenario: &str) -> Option<ValidationError> {
    let adj = successors(project, s);
    let mut visited = vec![false; adj.len()];
    let mut in_stack = vec![false; adj.len()];

    for node in project.tasks().leaves() {
        if !visited[node] && has_cycle_dfs(node, &adj, &mut visited, &mut in_stack) {
            return Some(ValidationError::new(
                ValidationErrorKind::CyclicDependency,
                format!(
                    "[{scenario}] Circular dependency detected involving task '{}'",
                    project.tasks()[node].id()
                ),
            ));
        }
    }

    None
}

fn has_cycle_dfs(
    node: usize,
    adj: &[Vec<usize>],
    visited: &mut [bool],
    in_stack: &mut [bool],
) -> bool {
    visited[node] = true;
    in_stack[node] = true;

    for &next in &adj[node] {
        if in_stack[next] {
            return true; // Back edge → cycle
        }
        if !visited[next] && has_cycle_dfs(next, adj, visited, in_stack) {
            return true;
        }
    }

    in_stack[node] = false;
    false
}
