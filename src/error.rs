//! Error types.
//!
//! One enum per concern. Structural errors (intervals, scoreboards,
//! allocations, property declarations) are raised at construction or
//! configuration time. Evaluation errors are wrapped with the text of the
//! failing expression. Scheduling errors abort a single scenario.

use thiserror::Error;

use crate::models::Timestamp;

/// Errors raised by interval arithmetic and interval lists.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntervalError {
    /// The end of an interval lies before its start.
    #[error("invalid interval: end {end} is before start {start}")]
    InvalidInterval { start: Timestamp, end: Timestamp },

    /// An interval was appended out of order or overlapping the last one.
    #[error("interval [{start}, {end}) overlaps or precedes the last interval ending at {last_end}")]
    OverlapError {
        start: Timestamp,
        end: Timestamp,
        last_end: Timestamp,
    },

    /// Two overlapping, non-identical intervals were compared.
    #[error("overlapping intervals [{0}, {1}) and [{2}, {3}) cannot be ordered")]
    Incomparable(Timestamp, Timestamp, Timestamp, Timestamp),
}

/// Errors raised by scoreboard index and date conversion.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScoreboardError {
    /// A date lies outside the scoreboard range.
    #[error("date {date} is outside of the scoreboard range [{start}, {end}]")]
    DateOutOfRange {
        date: Timestamp,
        start: Timestamp,
        end: Timestamp,
    },

    /// A slot index lies outside the scoreboard.
    #[error("index {index} is outside of the scoreboard (size {size})")]
    IndexOutOfRange { index: i64, size: usize },

    /// The resolution is zero or negative, or the range is inverted.
    #[error("invalid scoreboard geometry: {0}")]
    InvalidGeometry(String),
}

/// Errors raised while configuring an allocation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AllocationError {
    /// The selection mode name is not known.
    #[error("unknown selection mode '{0}'")]
    UnknownSelectionMode(String),

    /// An allocation was created without candidates.
    #[error("allocation needs at least one candidate resource")]
    EmptyCandidates,
}

/// Errors raised by property sets and property lists.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PropertyError {
    /// A property with the same ID already exists in the set.
    #[error("duplicate {kind} ID '{id}'")]
    DuplicateId { kind: String, id: String },

    /// The attribute is not declared for this kind of property.
    #[error("unknown attribute '{0}'")]
    UnknownAttribute(String),

    /// Attribute declarations must precede the first property.
    #[error("attribute '{0}' must be declared before any property is added")]
    LateAttributeDeclaration(String),

    /// The parent index does not name a property of this set.
    #[error("unknown parent property #{0}")]
    UnknownParent(usize),

    /// The property ID is not known.
    #[error("unknown {kind} '{id}'")]
    UnknownProperty { kind: String, id: String },

    /// A value does not match the declared attribute type.
    #[error("attribute '{attribute}' expects a {expected} value")]
    TypeMismatch { attribute: String, expected: String },

    /// The scenario index is out of range.
    #[error("scenario index {0} is out of range")]
    UnknownScenario(usize),
}

/// Errors raised while evaluating logical expressions.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    /// An operand could not be coerced to the required type.
    #[error("cannot coerce {value} to {target}")]
    TypeCoercionError { value: String, target: String },

    /// The function name is not known.
    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    /// The function was called with the wrong number of arguments.
    #[error("function '{name}' expects {expected} argument(s) but got {actual}")]
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// A scenario ID argument does not name a scenario.
    #[error("unknown scenario '{0}'")]
    UnknownScenario(String),

    /// A property ID argument does not name a property.
    #[error("unknown property '{0}'")]
    UnknownProperty(String),

    /// The attribute does not exist for the queried property.
    #[error("unknown attribute '{0}'")]
    UnknownAttribute(String),

    /// An operator was applied to an operand type it does not support.
    #[error("operator '{operator}' cannot be applied to {operand}")]
    UnsupportedOperand { operator: String, operand: String },

    /// Wrapped failure carrying the failing (sub)expression.
    #[error("error in expression '{expression}': {message}")]
    Evaluation { expression: String, message: String },
}

/// Errors raised while loading the project configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration is well-formed but inconsistent.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised while scheduling a project.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchedulingError {
    /// An error message was recorded and the scenario pass was aborted.
    #[error("scheduling of scenario '{scenario}' aborted: {message}")]
    Aborted { scenario: String, message: String },

    /// The project failed input validation.
    #[error("project validation failed with {0} error(s)")]
    Validation(usize),

    /// One or more scenarios could not be scheduled.
    #[error("scheduling failed for scenario(s): {}", .0.join(", "))]
    ScenariosFailed(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = IntervalError::InvalidInterval { start: 10, end: 5 };
        assert_eq!(e.to_string(), "invalid interval: end 5 is before start 10");

        let e = EvalError::ArityMismatch {
            name: "isleaf".into(),
            expected: 0,
            actual: 1,
        };
        assert!(e.to_string().contains("isleaf"));

        let e = SchedulingError::ScenariosFailed(vec!["plan".into(), "delayed".into()]);
        assert_eq!(
            e.to_string(),
            "scheduling failed for scenario(s): plan, delayed"
        );
    }

    #[test]
    fn test_config_error_from_json() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let e: ConfigError = err.into();
        assert!(e.to_string().starts_with("invalid configuration"));
    }
}
