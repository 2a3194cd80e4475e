//! Attribute declarations and values.
//!
//! Every property kind declares its attributes up front. Each stored
//! [`Attribute`] remembers where its value came from: provided by the
//! user, inherited from a parent property or scenario, or computed by the
//! scheduler.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::models::{format_timestamp, Duration, Interval, Timestamp};

/// Type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeKind {
    Bool,
    Number,
    Integer,
    Text,
    Date,
    Duration,
    References,
    Intervals,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AttributeKind::Bool => "boolean",
            AttributeKind::Number => "number",
            AttributeKind::Integer => "integer",
            AttributeKind::Text => "text",
            AttributeKind::Date => "date",
            AttributeKind::Duration => "duration",
            AttributeKind::References => "reference list",
            AttributeKind::Intervals => "interval list",
        };
        f.write_str(s)
    }
}

/// Value of an attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Bool(bool),
    Number(f64),
    Integer(i64),
    Text(String),
    Date(Timestamp),
    Duration(Duration),
    /// IDs of other properties.
    References(Vec<String>),
    Intervals(Vec<Interval>),
}

impl AttributeValue {
    /// Type of this value.
    pub fn kind(&self) -> AttributeKind {
        match self {
            AttributeValue::Bool(_) => AttributeKind::Bool,
            AttributeValue::Number(_) => AttributeKind::Number,
            AttributeValue::Integer(_) => AttributeKind::Integer,
            AttributeValue::Text(_) => AttributeKind::Text,
            AttributeValue::Date(_) => AttributeKind::Date,
            AttributeValue::Duration(_) => AttributeKind::Duration,
            AttributeValue::References(_) => AttributeKind::References,
            AttributeValue::Intervals(_) => AttributeKind::Intervals,
        }
    }

    /// Total order used for sorting property lists.
    ///
    /// Values of the same kind compare naturally; numbers use IEEE total
    /// order. Values of different kinds order by kind.
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        use AttributeValue::*;
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Number(a), Number(b)) => a.total_cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Number(a), Integer(b)) => a.total_cmp(&(*b as f64)),
            (Integer(a), Number(b)) => (*a as f64).total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            (Duration(a), Duration(b)) => a.cmp(b),
            (References(a), References(b)) => a.cmp(b),
            (Intervals(a), Intervals(b)) => a.len().cmp(&b.len()),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            AttributeValue::Bool(_) => 0,
            AttributeValue::Number(_) | AttributeValue::Integer(_) => 1,
            AttributeValue::Duration(_) => 2,
            AttributeValue::Date(_) => 3,
            AttributeValue::Text(_) => 4,
            AttributeValue::References(_) => 5,
            AttributeValue::Intervals(_) => 6,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Bool(b) => write!(f, "{b}"),
            AttributeValue::Number(n) => write!(f, "{n}"),
            AttributeValue::Integer(i) => write!(f, "{i}"),
            AttributeValue::Text(s) => f.write_str(s),
            AttributeValue::Date(t) => f.write_str(&format_timestamp(*t)),
            AttributeValue::Duration(d) => write!(f, "{}h", *d as f64 / 3600.0),
            AttributeValue::References(ids) => f.write_str(&ids.join(", ")),
            AttributeValue::Intervals(ivs) => {
                let parts: Vec<String> = ivs.iter().map(|iv| iv.to_string()).collect();
                f.write_str(&parts.join(", "))
            }
        }
    }
}

/// Declaration of an attribute for one property kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    /// Attribute identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Value type.
    pub kind: AttributeKind,
    /// Whether each scenario holds its own value.
    pub scenario_specific: bool,
    /// Whether children inherit the value from their parent.
    pub inheritable: bool,
    /// Value before anything is provided or computed.
    pub default: Option<AttributeValue>,
}

impl AttributeDefinition {
    /// Declares a scenario-specific, non-inheritable attribute without default.
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            scenario_specific: true,
            inheritable: false,
            default: None,
        }
    }

    /// Marks the attribute as shared by all scenarios.
    pub fn global(mut self) -> Self {
        self.scenario_specific = false;
        self
    }

    /// Marks the attribute as inherited by child properties.
    pub fn inheritable(mut self) -> Self {
        self.inheritable = true;
        self
    }

    /// Sets the default value.
    pub fn with_default(mut self, value: AttributeValue) -> Self {
        self.default = Some(value);
        self
    }
}

/// A stored attribute value with provenance flags.
///
/// The provided, inherited, or default value is kept apart from the
/// computed one, so a scheduling pass can be reset without losing input.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Attribute {
    base: Option<AttributeValue>,
    computed: Option<AttributeValue>,
    provided: bool,
    inherited: bool,
}

impl Attribute {
    /// Creates an attribute holding the declared default.
    pub fn from_definition(def: &AttributeDefinition) -> Self {
        Self {
            base: def.default.clone(),
            ..Default::default()
        }
    }

    /// Current value: computed if present, else provided, inherited, or default.
    pub fn value(&self) -> Option<&AttributeValue> {
        self.computed.as_ref().or(self.base.as_ref())
    }

    /// The user-provided or inherited value, ignoring computed results.
    pub fn input_value(&self) -> Option<&AttributeValue> {
        if self.provided || self.inherited {
            self.base.as_ref()
        } else {
            None
        }
    }

    /// Whether the value was provided by the user.
    pub fn is_provided(&self) -> bool {
        self.provided
    }

    /// Whether the value was inherited.
    pub fn is_inherited(&self) -> bool {
        self.inherited
    }

    /// Whether the value was computed by the scheduler.
    pub fn is_computed(&self) -> bool {
        self.computed.is_some()
    }

    /// Stores a user-provided value.
    pub fn provide(&mut self, value: AttributeValue) {
        self.base = Some(value);
        self.provided = true;
        self.inherited = false;
    }

    /// Stores an inherited value unless one was provided.
    ///
    /// Returns whether the value was taken.
    pub fn inherit(&mut self, value: AttributeValue) -> bool {
        if self.provided {
            return false;
        }
        self.base = Some(value);
        self.inherited = true;
        true
    }

    /// Stores a computed value.
    pub fn compute(&mut self, value: AttributeValue) {
        self.computed = Some(value);
    }

    /// Drops the computed value.
    pub fn reset(&mut self) {
        self.computed = None;
    }
}
