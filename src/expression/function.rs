use std::collections::{HashSet, VecDeque};
use std::fmt;

use super::{Query, Value};
use crate::error::EvalError;
use crate::property::{Property, PropertyKind, PropertyRef};

/// Known functions and their arity.
pub const FUNCTIONS: &[(&str, usize)] = &[
    ("hasalert", 1),
    ("isactive", 1),
    ("isdependencyof", 3),
    ("isdutyof", 2),
    ("isleaf", 0),
    ("isongoing", 1),
    ("isresource", 0),
    ("istask", 0),
    ("treelevel", 0),
];

/// A call of a named predicate function.
///
/// A trailing underscore (`isleaf_`) evaluates the function with property
/// and scope property exchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalFunction {
    name: String,
    args: Vec<Value>,
}

impl LogicalFunction {
    /// Creates a checked function call.
    ///
    /// # Errors
    /// [`EvalError::UnknownFunction`] or [`EvalError::ArityMismatch`].
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Result<Self, EvalError> {
        let name = name.into();
        let base = name.strip_suffix('_').unwrap_or(&name);
        let Some(&(_, arity)) = FUNCTIONS.iter().find(|(n, _)| *n == base) else {
            return Err(EvalError::UnknownFunction(name));
        };
        if args.len() != arity {
            return Err(EvalError::ArityMismatch {
                name,
                expected: arity,
                actual: args.len(),
            });
        }
        Ok(Self { name, args })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Evaluates the call against `query`.
    pub fn eval(&self, query: &Query<'_>) -> Result<Value, EvalError> {
        let (base, query) = match self.name.strip_suffix('_') {
            Some(base) => (base, query.swapped()),
            None => (self.name.as_str(), *query),
        };
        let result = match base {
            "hasalert" => Value::Bool(has_alert(&query, &self.args[0])?),
            "isactive" => Value::Bool(is_active(&query, &self.args[0])?),
            "isdependencyof" => Value::Bool(is_dependency_of(&query, &self.args)?),
            "isdutyof" => Value::Bool(is_duty_of(&query, &self.args)?),
            "isleaf" => Value::Bool(property(&query)?.is_some_and(|p| p.is_leaf())),
            "isongoing" => Value::Bool(is_ongoing(&query, &self.args[0])?),
            "isresource" => Value::Bool(is_kind(&query, PropertyKind::Resource)),
            "istask" => Value::Bool(is_kind(&query, PropertyKind::Task)),
            "treelevel" => Value::Number(
                property(&query)?.map_or(0.0, |p| (p.level() + 1) as f64),
            ),
            _ => return Err(EvalError::UnknownFunction(self.name.clone())),
        };
        Ok(result)
    }
}

impl fmt::Display for LogicalFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self.args.iter().map(Value::to_string).collect();
        write!(f, "{}({})", self.name, args.join(", "))
    }
}

fn is_kind(query: &Query<'_>, kind: PropertyKind) -> bool {
    query.property.is_some_and(|p| p.kind == kind)
}

/// The queried property. A reference to a missing property is an error.
fn property<'a>(query: &Query<'a>) -> Result<Option<&'a dyn Property>, EvalError> {
    let Some(r) = query.property else {
        return Ok(None);
    };
    query.project.property(r).map(Some).ok_or_else(|| missing(r))
}

fn missing(r: PropertyRef) -> EvalError {
    EvalError::UnknownProperty(format!("{} #{}", r.kind, r.index))
}

fn task_of(query: &Query<'_>) -> Result<Option<usize>, EvalError> {
    property(query)?;
    Ok(query
        .property
        .filter(|p| p.kind == PropertyKind::Task)
        .map(|p| p.index))
}

/// The property carries an alert (level above zero) of at least `level`.
fn has_alert(query: &Query<'_>, level: &Value) -> Result<bool, EvalError> {
    let level = level.to_number()?;
    let Some(target) = property(query)? else {
        return Ok(false);
    };
    let alert = target
        .get("alert", None)
        .map_or(Value::Number(0.0), Value::from)
        .to_number()?;
    Ok(alert > 0.0 && alert >= level)
}

/// Tasks and resources with bookings inside the report period.
fn is_active(query: &Query<'_>, scenario: &Value) -> Result<bool, EvalError> {
    let scenario = query.scenario(scenario)?;
    let period = query.period();
    let project = query.project;
    property(query)?;
    let Some(p) = query.property else {
        return Ok(false);
    };
    let active = match p.kind {
        PropertyKind::Task => project.tasks().leaf_descendants(p.index).into_iter().any(|t| {
            project.tasks()[t]
                .scenario(scenario)
                .bookings()
                .values()
                .any(|list| list.overlaps(&period))
        }),
        PropertyKind::Resource => project
            .resources()
            .leaf_descendants(p.index)
            .into_iter()
            .any(|r| project.resources()[r].scenario(scenario).booked_seconds_in(&period) > 0),
        PropertyKind::Account | PropertyKind::Shift => false,
    };
    Ok(active)
}

/// Tasks whose scheduled time overlaps the report period.
fn is_ongoing(query: &Query<'_>, scenario: &Value) -> Result<bool, EvalError> {
    let scenario = query.scenario(scenario)?;
    let Some(task) = task_of(query)? else {
        return Ok(false);
    };
    let Some(node) = query.project.tasks().get(task) else {
        return Err(missing(PropertyRef::task(task)));
    };
    let t = node.scenario(scenario);
    Ok(match (t.start(), t.end()) {
        (Some(start), Some(end)) if start == end => start >= query.start && start < query.end,
        (Some(start), Some(end)) => start < query.end && end > query.start,
        _ => false,
    })
}

/// The property is a task the given task depends on, at most `distance`
/// dependency hops away. A distance of zero or less is unlimited.
fn is_dependency_of(query: &Query<'_>, args: &[Value]) -> Result<bool, EvalError> {
    let id = args[0].to_string();
    let scenario = query.scenario(&args[1])?;
    let distance = args[2].to_number()?;
    let tasks = query.project.tasks();
    let target = tasks
        .index_of(&id)
        .ok_or_else(|| EvalError::UnknownProperty(id.clone()))?;
    let Some(task) = task_of(query)? else {
        return Ok(false);
    };

    let limit = if distance <= 0.0 { usize::MAX } else { distance as usize };
    let mut seen = HashSet::from([target]);
    let mut queue = VecDeque::from([(target, 0usize)]);
    while let Some((current, depth)) = queue.pop_front() {
        if depth >= limit {
            continue;
        }
        let mut preds: Vec<usize> = tasks[current]
            .scenario(scenario)
            .depends
            .iter()
            .map(|d| d.task)
            .collect();
        for a in tasks.ancestors(current) {
            preds.extend(tasks[a].scenario(scenario).depends.iter().map(|d| d.task));
        }
        for pred in preds {
            if pred == task {
                return Ok(true);
            }
            if seen.insert(pred) {
                queue.push_back((pred, depth + 1));
            }
        }
    }
    Ok(false)
}

/// The property is a task the given resource is booked for.
fn is_duty_of(query: &Query<'_>, args: &[Value]) -> Result<bool, EvalError> {
    let id = args[0].to_string();
    let scenario = query.scenario(&args[1])?;
    let resource = query
        .project
        .resources()
        .index_of(&id)
        .ok_or_else(|| EvalError::UnknownProperty(id.clone()))?;
    let Some(task) = task_of(query)? else {
        return Ok(false);
    };
    let Some(node) = query.project.tasks().get(task) else {
        return Err(missing(PropertyRef::task(task)));
    };
    Ok(node
        .scenario(scenario)
        .bookings()
        .get(&resource)
        .is_some_and(|list| !list.is_empty()))
}
