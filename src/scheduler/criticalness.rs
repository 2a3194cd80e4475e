//! Criticalness heuristics.
//!
//! Decides the order in which ready tasks are placed.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Requested effort (resource) | Sum over allocations of task effort / candidate count |
//! | Criticalness (resource) | Requested effort / free scoreboard time |
//! | Criticalness (task) | Effort in working days * mean candidate criticalness |
//! | Path criticalness (task) | Own criticalness + max path criticalness of successors |
//!
//! A resource with requested effort but no free time has criticalness 1.

use crate::project::Project;

/// Computes all criticalness values of one scenario.
///
/// Expects freshly built resource scoreboards.
pub(crate) fn compute(project: &mut Project, scenario: usize) {
    request_effort(project, scenario);
    resource_criticalness(project, scenario);
    task_criticalness(project, scenario);
    path_criticalness(project, scenario);
}

fn request_effort(project: &mut Project, s: usize) {
    let Project {
        tasks, resources, ..
    } = project;
    for node in tasks.iter().filter(|n| n.is_leaf()) {
        let task = node.scenario(s);
        let effort = task.effort() as f64;
        if effort <= 0.0 {
            continue;
        }
        for alloc in &task.allocations {
            let candidates = alloc.declared_candidates();
            let share = effort / candidates.len() as f64;
            for &r in candidates {
                if let Some(res) = resources.get_mut(r) {
                    res.scenario_mut(s).add_requested_effort(share);
                }
            }
        }
    }
}

fn resource_criticalness(project: &mut Project, s: usize) {
    for node in project.resources.iter_mut() {
        let res = node.scenario_mut(s);
        let requested = res.requested_effort();
        let free = res.free_seconds();
        let value = if requested <= 0.0 {
            0.0
        } else if free == 0 {
            1.0
        } else {
            requested / free as f64
        };
        res.set_criticalness(value);
    }
}

fn task_criticalness(project: &mut Project, s: usize) {
    let daily = project.daily_working_seconds();
    let Project {
        tasks, resources, ..
    } = project;
    for node in tasks.iter_mut().filter(|n| n.is_leaf()) {
        let task = node.scenario_mut(s);
        let criticalness: Vec<f64> = task
            .allocations
            .iter()
            .flat_map(|a| a.declared_candidates())
            .filter_map(|&r| resources.get(r))
            .map(|r| r.scenario(s).criticalness())
            .collect();
        let value = if criticalness.is_empty() {
            0.0
        } else {
            let mean = criticalness.iter().sum::<f64>() / criticalness.len() as f64;
            task.effort() as f64 / daily * mean
        };
        task.set_criticalness(value);
    }
}

/// Successors of every leaf task: the leaves that depend on it directly or
/// through a container on either side.
pub(crate) fn successors(project: &Project, s: usize) -> Vec<Vec<usize>> {
    let tasks = &project.tasks;
    let mut succ = vec![Vec::new(); tasks.len()];
    for t in tasks.leaves() {
        let deps = std::iter::once(t)
            .chain(tasks.ancestors(t))
            .flat_map(|i| tasks[i].scenario(s).depends.iter().map(|d| d.task));
        for dep in deps {
            for p in tasks.leaf_descendants(dep) {
                if !succ[p].contains(&t) {
                    succ[p].push(t);
                }
            }
        }
    }
    succ
}

fn path_criticalness(project: &mut Project, s: usize) {
    let succ = successors(project, s);
    let n = project.tasks.len();
    let own: Vec<f64> = project
        .tasks
        .iter()
        .map(|t| t.scenario(s).criticalness())
        .collect();
    let mut memo: Vec<Option<f64>> = vec![None; n];
    let mut on_stack = vec![false; n];

    fn visit(
        t: usize,
        own: &[f64],
        succ: &[Vec<usize>],
        memo: &mut [Option<f64>],
        on_stack: &mut [bool],
    ) -> f64 {
        if let Some(v) = memo[t] {
            return v;
        }
        // Cycles are rejected by validation; treat a back edge as a dead end.
        if on_stack[t] {
            return 0.0;
        }
        on_stack[t] = true;
        let mut longest = 0.0_f64;
        for &next in &succ[t] {
            longest = longest.max(visit(next, own, succ, memo, on_stack));
        }
        on_stack[t] = false;
        let value = own[t] + longest;
        memo[t] = Some(value);
        value
    }

    let leaves: Vec<usize> = project.tasks.leaves().collect();
    for &t in &leaves {
        let value = visit(t, &own, &succ, &mut memo, &mut on_stack);
        project.tasks[t].scenario_mut(s).set_path_criticalness(value);
    }
    for t in 0..n {
        if project.tasks[t].is_container() {
            let value = project
                .tasks
                .leaf_descendants(t)
                .into_iter()
                .filter_map(|l| memo[l])
                .fold(0.0, f64::max);
            project.tasks[t].scenario_mut(s).set_path_criticalness(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::Allocation;
    use crate::models::{Interval, WorkingHours};
    use crate::project::tests::project;
    use crate::property::AttributeValue;
    use crate::scenario::Dependency;

    const DAY: i64 = 86_400;

    fn fixture() -> Project {
        let mut p = project();
        let a = p.add_task("a", "A", None).unwrap();
        let b = p.add_task("b", "B", None).unwrap();
        let c = p.add_task("c", "C", None).unwrap();
        let r1 = p.add_resource("r1", "R1", None).unwrap();
        let r2 = p.add_resource("r2", "R2", None).unwrap();

        for (t, hours) in [(a, 16), (b, 8), (c, 8)] {
            p.tasks
                .set_attribute(t, "effort", Some(0), AttributeValue::Duration(hours * 3600))
                .unwrap();
        }
        p.tasks[a].scenario_mut(0).allocations.push(Allocation::new(vec![r1]).unwrap());
        p.tasks[b].scenario_mut(0).allocations.push(Allocation::new(vec![r1, r2]).unwrap());
        p.tasks[c].scenario_mut(0).allocations.push(Allocation::new(vec![r2]).unwrap());
        p.tasks[c].scenario_mut(0).depends.push(Dependency::new(a));

        // Four days of eight hours each.
        let period = Interval::new(p.start(), p.start() + 4 * DAY).unwrap();
        let hours = WorkingHours::always();
        for r in [r1, r2] {
            let res = p.resources[r].scenario_mut(0);
            res.working_hours = Some(hours.clone());
            res.prepare_scoreboard(&period, 8 * 3600, &hours, &[]).unwrap();
        }
        p
    }

    #[test]
    fn test_resource_criticalness() {
        let mut p = fixture();
        compute(&mut p, 0);
        // r1: 16h + 4h requested over 4 days * 24h free.
        let r1 = p.resources[0].scenario(0);
        assert_eq!(r1.requested_effort(), 20.0 * 3600.0);
        assert!((r1.criticalness() - 20.0 / 96.0).abs() < 1e-9);
        let r2 = p.resources[1].scenario(0);
        assert!((r2.criticalness() - 12.0 / 96.0).abs() < 1e-9);
    }

    #[test]
    fn test_task_and_path_criticalness() {
        let mut p = fixture();
        compute(&mut p, 0);
        let a = p.tasks[0].scenario(0);
        let c = p.tasks[2].scenario(0);
        // 16h effort is two working days.
        assert!((a.criticalness() - 2.0 * 20.0 / 96.0).abs() < 1e-9);
        assert!((a.path_criticalness() - (a.criticalness() + c.criticalness())).abs() < 1e-9);
        assert_eq!(c.path_criticalness(), c.criticalness());
    }

    #[test]
    fn test_successors_through_containers() {
        let mut p = project();
        p.add_task("grp", "Group", None).unwrap();
        let x = p.add_task("x", "X", Some("grp")).unwrap();
        let y = p.add_task("y", "Y", Some("grp")).unwrap();
        let z = p.add_task("z", "Z", None).unwrap();
        p.tasks[z].scenario_mut(0).depends.push(Dependency::new(0));
        let succ = successors(&p, 0);
        assert_eq!(succ[x], vec![z]);
        assert_eq!(succ[y], vec![z]);
        assert!(succ[z].is_empty());
    }
}
