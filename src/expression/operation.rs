use std::cmp::Ordering;
use std::fmt;

use super::{LogicalFunction, Query, Value};
use crate::error::EvalError;

/// Operators of a [`LogicalOperation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `~`
    Not,
    /// `>`
    Greater,
    /// `>=`
    GreaterEq,
    /// `=`
    Equal,
    /// `<`
    Less,
    /// `<=`
    LessEq,
    /// `!=`
    NotEqual,
    /// `&`
    And,
    /// `|`
    Or,
}

impl Operator {
    fn matches(self, ordering: Ordering) -> bool {
        match self {
            Operator::Greater => ordering == Ordering::Greater,
            Operator::GreaterEq => ordering != Ordering::Less,
            Operator::Equal => ordering == Ordering::Equal,
            Operator::Less => ordering == Ordering::Less,
            Operator::LessEq => ordering != Ordering::Greater,
            Operator::NotEqual => ordering != Ordering::Equal,
            Operator::Not | Operator::And | Operator::Or => false,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Not => "~",
            Operator::Greater => ">",
            Operator::GreaterEq => ">=",
            Operator::Equal => "=",
            Operator::Less => "<",
            Operator::LessEq => "<=",
            Operator::NotEqual => "!=",
            Operator::And => "&",
            Operator::Or => "|",
        };
        f.write_str(s)
    }
}

/// An operand: a literal, an attribute reference, or a nested node.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Value),
    /// Attribute of the queried property.
    Attribute(String),
    Operation(Box<LogicalOperation>),
    Function(LogicalFunction),
}

impl Operand {
    fn resolve(&self, query: &Query<'_>) -> Result<Value, EvalError> {
        match self {
            Operand::Literal(v) => Ok(v.clone()),
            Operand::Attribute(name) => query.attribute_value(name),
            Operand::Operation(op) => op.eval(query),
            Operand::Function(f) => f.eval(query),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(Value::Str(s)) => write!(f, "'{s}'"),
            Operand::Literal(v) => write!(f, "{v}"),
            Operand::Attribute(name) => f.write_str(name),
            Operand::Operation(op) => write!(f, "{op}"),
            Operand::Function(func) => write!(f, "{func}"),
        }
    }
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::Literal(v)
    }
}

impl From<LogicalOperation> for Operand {
    fn from(op: LogicalOperation) -> Self {
        Operand::Operation(Box::new(op))
    }
}

impl From<LogicalFunction> for Operand {
    fn from(f: LogicalFunction) -> Self {
        Operand::Function(f)
    }
}

/// A node of an expression tree.
///
/// Without an operator the node evaluates to its single operand. `~`
/// takes one operand; every other operator takes two.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalOperation {
    pub operand1: Operand,
    pub operator: Option<Operator>,
    pub operand2: Option<Operand>,
}

impl LogicalOperation {
    /// Node without operator.
    pub fn leaf(operand: impl Into<Operand>) -> Self {
        Self {
            operand1: operand.into(),
            operator: None,
            operand2: None,
        }
    }

    /// Negation.
    pub fn not(operand: impl Into<Operand>) -> Self {
        Self {
            operand1: operand.into(),
            operator: Some(Operator::Not),
            operand2: None,
        }
    }

    /// Binary node.
    pub fn binary(
        operand1: impl Into<Operand>,
        operator: Operator,
        operand2: impl Into<Operand>,
    ) -> Self {
        Self {
            operand1: operand1.into(),
            operator: Some(operator),
            operand2: Some(operand2.into()),
        }
    }

    /// Evaluates the node.
    ///
    /// # Errors
    /// The innermost failing node wraps the cause into
    /// [`EvalError::Evaluation`] with its own textual form; outer nodes
    /// pass that error through unchanged.
    pub fn eval(&self, query: &Query<'_>) -> Result<Value, EvalError> {
        self.eval_inner(query).map_err(|e| match e {
            EvalError::Evaluation { .. } => e,
            other => EvalError::Evaluation {
                expression: self.to_string(),
                message: other.to_string(),
            },
        })
    }

    fn eval_inner(&self, query: &Query<'_>) -> Result<Value, EvalError> {
        let Some(operator) = self.operator else {
            return self.operand1.resolve(query);
        };
        if operator == Operator::Not {
            let v = self.operand1.resolve(query)?;
            return Ok(Value::Bool(!v.to_bool()?));
        }
        let Some(operand2) = &self.operand2 else {
            return Err(EvalError::UnsupportedOperand {
                operator: operator.to_string(),
                operand: "a single operand".into(),
            });
        };

        match operator {
            Operator::And => {
                let a = self.operand1.resolve(query)?.to_bool()?;
                Ok(Value::Bool(a && operand2.resolve(query)?.to_bool()?))
            }
            Operator::Or => {
                let a = self.operand1.resolve(query)?.to_bool()?;
                Ok(Value::Bool(a || operand2.resolve(query)?.to_bool()?))
            }
            _ => {
                let v1 = self.operand1.resolve(query)?;
                let v2 = operand2.resolve(query)?;
                compare(operator, &v1, &v2).map(Value::Bool)
            }
        }
    }
}

/// The type of the first operand selects the comparison: numbers compare
/// numerically, strings compare against the display form of the second
/// operand.
fn compare(operator: Operator, v1: &Value, v2: &Value) -> Result<bool, EvalError> {
    match v1 {
        Value::Number(a) => {
            let b = v2.to_number()?;
            Ok(a.partial_cmp(&b).is_some_and(|o| operator.matches(o)))
        }
        Value::Str(a) => Ok(operator.matches(a.as_str().cmp(v2.to_string().as_str()))),
        Value::Bool(_) => Err(EvalError::UnsupportedOperand {
            operator: operator.to_string(),
            operand: v1.type_name().into(),
        }),
    }
}

impl fmt::Display for LogicalOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.operator, &self.operand2) {
            (None, _) => write!(f, "{}", self.operand1),
            (Some(Operator::Not), _) => write!(f, "~{}", self.operand1),
            (Some(op), Some(op2)) => write!(f, "({} {} {})", self.operand1, op, op2),
            (Some(op), None) => write!(f, "({} {})", self.operand1, op),
        }
    }
}
