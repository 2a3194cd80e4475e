//! Logical expressions over project data.
//!
//! Reports use expressions to decide which properties to include, e.g.
//! `(isleaf() & (priority > 500))`. An expression is a tree of
//! [`LogicalOperation`] nodes whose leaves are literals, attribute
//! references, or [`LogicalFunction`] calls. Evaluation is read-only and
//! runs against a [`Query`].
//!
//! # Coercion
//!
//! | Context | Bool | Number | String |
//! |---------|------|--------|--------|
//! | boolean | as is | non-zero is true | error |
//! | numeric | error | as is | parsed |
//!
//! Comparisons are chosen by the type of the first operand.

mod function;
mod operation;
mod query;
mod value;

pub use function::{LogicalFunction, FUNCTIONS};
pub use operation::{LogicalOperation, Operand, Operator};
pub use query::Query;
pub use value::Value;

use crate::error::EvalError;
use crate::message::{Message, MessageHandler, MessageLevel, SourceLocation};

/// A complete expression with the place it was defined.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalExpression {
    pub operation: LogicalOperation,
    pub source_location: Option<SourceLocation>,
}

impl LogicalExpression {
    pub fn new(operation: LogicalOperation) -> Self {
        Self {
            operation,
            source_location: None,
        }
    }

    pub fn with_source_location(mut self, location: SourceLocation) -> Self {
        self.source_location = Some(location);
        self
    }

    /// Evaluates the expression to a boolean.
    ///
    /// # Errors
    /// [`EvalError::Evaluation`] carrying the failing sub-expression.
    pub fn eval(&self, query: &Query<'_>) -> Result<bool, EvalError> {
        self.operation
            .eval(query)?
            .to_bool()
            .map_err(|e| EvalError::Evaluation {
                expression: self.operation.to_string(),
                message: e.to_string(),
            })
    }

    /// Evaluates the expression; failures are reported to `messages` and
    /// count as `false`.
    pub fn eval_or_report(&self, query: &Query<'_>, messages: &mut MessageHandler) -> bool {
        match self.eval(query) {
            Ok(b) => b,
            Err(e) => {
                let mut message = Message::new(MessageLevel::Error, "expression_error", e.to_string())
                    .with_source_location(self.source_location.clone());
                if let Some(p) = query.property.and_then(|p| query.project.property(p)) {
                    message = message.with_property(p.id());
                }
                if let Some(s) = query.scenario_idx {
                    message = message.with_scenario(messages.scenario_id(s));
                }
                messages.send(message);
                false
            }
        }
    }
}

impl std::fmt::Display for LogicalExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Interval;
    use crate::project::tests::{project, MONDAY};
    use crate::project::Project;
    use crate::property::{AttributeValue, PropertyRef};
    use crate::scenario::Dependency;

    const HOUR: i64 = 3600;

    fn lit(v: impl Into<Value>) -> Operand {
        Operand::Literal(v.into())
    }

    fn attr(name: &str) -> Operand {
        Operand::Attribute(name.into())
    }

    fn func(name: &str, args: Vec<Value>) -> Operand {
        Operand::Function(LogicalFunction::new(name, args).unwrap())
    }

    /// prj > (design, build), build depends on design; r1 booked for design.
    fn fixture() -> Project {
        let mut p = project();
        let prj = p.add_task("prj", "Project", None).unwrap();
        let design = p.add_task("design", "Design", Some("prj")).unwrap();
        let build = p.add_task("build", "Build", Some("prj")).unwrap();
        let test = p.add_task("test", "Test", None).unwrap();
        let r1 = p.add_resource("r1", "Developer", None).unwrap();

        let tasks = p.tasks_mut();
        tasks
            .set_attribute(design, "priority", Some(0), AttributeValue::Integer(800))
            .unwrap();
        tasks[build].scenario_mut(0).depends.push(Dependency::new(design));
        tasks[test].scenario_mut(0).depends.push(Dependency::new(build));
        let s = tasks[design].scenario_mut(0);
        s.book(r1, Interval::new(MONDAY + 9 * HOUR, MONDAY + 17 * HOUR).unwrap())
            .unwrap();
        s.set_start(MONDAY + 9 * HOUR);
        s.set_end(MONDAY + 17 * HOUR);
        tasks[prj]
            .attributes
            .get_mut("alert")
            .unwrap()
            .provide(AttributeValue::Integer(2));
        p
    }

    fn query(p: &Project, task: usize) -> Query<'_> {
        Query::new(p).with_property(PropertyRef::task(task)).with_scenario(0)
    }

    #[test]
    fn test_not_coercion() {
        let p = fixture();
        let q = Query::new(&p);
        let zero = LogicalOperation::not(lit(0.0));
        assert_eq!(zero.eval(&q), Ok(Value::Bool(true)));
        let negative = LogicalOperation::not(lit(-5.0));
        assert_eq!(negative.eval(&q), Ok(Value::Bool(false)));
    }

    #[test]
    fn test_comparison_families() {
        let p = fixture();
        let q = query(&p, 1);

        let gt = LogicalOperation::binary(attr("priority"), Operator::Greater, lit(500.0));
        assert_eq!(gt.eval(&q), Ok(Value::Bool(true)));

        // Second operand is coerced to a number.
        let eq = LogicalOperation::binary(lit(800.0), Operator::Equal, lit("800"));
        assert_eq!(eq.eval(&q), Ok(Value::Bool(true)));

        // String comparison uses the display form of the second operand.
        let s = LogicalOperation::binary(lit("10"), Operator::Less, lit(9.0));
        assert_eq!(s.eval(&q), Ok(Value::Bool(true)));

        let name = LogicalOperation::binary(attr("id"), Operator::Equal, lit("design"));
        assert_eq!(name.eval(&q), Ok(Value::Bool(true)));
    }

    #[test]
    fn test_errors_are_wrapped_once() {
        let p = fixture();
        let q = query(&p, 1);
        let bad = LogicalOperation::binary(lit(1.0), Operator::Less, lit("abc"));
        let outer = LogicalExpression::new(LogicalOperation::binary(
            lit(true),
            Operator::And,
            bad,
        ));
        match outer.eval(&q) {
            Err(EvalError::Evaluation { expression, message }) => {
                assert_eq!(expression, "(1 < 'abc')");
                assert!(message.contains("cannot coerce"));
            }
            other => panic!("unexpected result {other:?}"),
        }

        let boolean = LogicalOperation::binary(lit(true), Operator::Equal, lit(true));
        assert!(matches!(boolean.eval(&q), Err(EvalError::Evaluation { .. })));

        let unknown = LogicalOperation::leaf(attr("nonsense"));
        assert!(unknown.eval(&q).is_err());
    }

    #[test]
    fn test_connectives() {
        let p = fixture();
        let q = query(&p, 1);
        let and = LogicalOperation::binary(lit(1.0), Operator::And, lit(0.0));
        assert_eq!(and.eval(&q), Ok(Value::Bool(false)));
        let or = LogicalOperation::binary(lit(-1.0), Operator::Or, lit(0.0));
        assert_eq!(or.eval(&q), Ok(Value::Bool(true)));
    }

    #[test]
    fn test_tree_functions() {
        let p = fixture();
        let leaf = LogicalExpression::new(LogicalOperation::leaf(func("isleaf", vec![])));
        assert!(leaf.eval(&query(&p, 1)).unwrap());
        assert!(!leaf.eval(&query(&p, 0)).unwrap());

        let level = LogicalOperation::leaf(func("treelevel", vec![]));
        assert_eq!(level.eval(&query(&p, 1)), Ok(Value::Number(2.0)));
        assert_eq!(level.eval(&Query::new(&p)), Ok(Value::Number(0.0)));

        let task = LogicalOperation::leaf(func("istask", vec![]));
        assert_eq!(task.eval(&query(&p, 0)), Ok(Value::Bool(true)));
        let resource = LogicalOperation::leaf(func("isresource", vec![]));
        assert_eq!(resource.eval(&query(&p, 0)), Ok(Value::Bool(false)));
    }

    #[test]
    fn test_swapped_functions() {
        let p = fixture();
        // Resource r1 listed within task prj.
        let q = Query::new(&p)
            .with_property(PropertyRef::resource(0))
            .with_scope_property(PropertyRef::task(0))
            .with_scenario(0);
        let isleaf = LogicalOperation::leaf(func("isleaf", vec![]));
        let isleaf_ = LogicalOperation::leaf(func("isleaf_", vec![]));
        assert_eq!(isleaf.eval(&q), Ok(Value::Bool(true)));
        assert_eq!(isleaf_.eval(&q), Ok(Value::Bool(false)));

        let istask_ = LogicalOperation::leaf(func("istask_", vec![]));
        assert_eq!(istask_.eval(&q), Ok(Value::Bool(true)));
    }

    #[test]
    fn test_booking_functions() {
        let p = fixture();
        let monday = query(&p, 1).with_period(MONDAY, MONDAY + 24 * HOUR);
        let tuesday = query(&p, 1).with_period(MONDAY + 24 * HOUR, MONDAY + 48 * HOUR);

        let active = LogicalOperation::leaf(func("isactive", vec!["plan".into()]));
        assert_eq!(active.eval(&monday), Ok(Value::Bool(true)));
        assert_eq!(active.eval(&tuesday), Ok(Value::Bool(false)));

        // Containers are active through their children.
        let prj = query(&p, 0).with_period(MONDAY, MONDAY + 24 * HOUR);
        assert_eq!(active.eval(&prj), Ok(Value::Bool(true)));

        let ongoing = LogicalOperation::leaf(func("isongoing", vec!["plan".into()]));
        assert_eq!(ongoing.eval(&monday), Ok(Value::Bool(true)));
        assert_eq!(ongoing.eval(&tuesday), Ok(Value::Bool(false)));

        let duty = LogicalOperation::leaf(func("isdutyof", vec!["r1".into(), "plan".into()]));
        assert_eq!(duty.eval(&monday), Ok(Value::Bool(true)));
        assert_eq!(duty.eval(&query(&p, 2)), Ok(Value::Bool(false)));

        let bad = LogicalOperation::leaf(func("isactive", vec!["nope".into()]));
        assert!(bad.eval(&monday).is_err());
    }

    #[test]
    fn test_isdependencyof() {
        let p = fixture();
        let direct = LogicalOperation::leaf(func(
            "isdependencyof",
            vec!["build".into(), "plan".into(), 1.0.into()],
        ));
        assert_eq!(direct.eval(&query(&p, 1)), Ok(Value::Bool(true)));

        let one_hop = LogicalOperation::leaf(func(
            "isdependencyof",
            vec!["test".into(), "plan".into(), 1.0.into()],
        ));
        assert_eq!(one_hop.eval(&query(&p, 1)), Ok(Value::Bool(false)));

        let any = LogicalOperation::leaf(func(
            "isdependencyof",
            vec!["test".into(), "plan".into(), 0.0.into()],
        ));
        assert_eq!(any.eval(&query(&p, 1)), Ok(Value::Bool(true)));
    }

    #[test]
    fn test_hasalert() {
        let p = fixture();
        let alert = |level: f64| LogicalOperation::leaf(func("hasalert", vec![level.into()]));
        assert_eq!(alert(1.0).eval(&query(&p, 0)), Ok(Value::Bool(true)));
        assert_eq!(alert(3.0).eval(&query(&p, 0)), Ok(Value::Bool(false)));
        assert_eq!(alert(0.0).eval(&query(&p, 1)), Ok(Value::Bool(false)));
    }

    #[test]
    fn test_eval_or_report() {
        let p = fixture();
        let mut messages = MessageHandler::new();
        messages.set_scenarios(p.scenario_ids());
        let expr = LogicalExpression::new(LogicalOperation::leaf(lit("text")))
            .with_source_location(SourceLocation::new("report.tji", 12));
        assert!(!expr.eval_or_report(&query(&p, 1), &mut messages));
        assert_eq!(messages.error_count(), 1);
        assert_eq!(messages.messages()[0].property.as_deref(), Some("design"));
    }
}
