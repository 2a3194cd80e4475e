//! Property trees and their attributes.
//!
//! Tasks, resources, accounts, and shifts are all properties. Each kind is
//! stored in its own [`PropertySet`]; [`PropertyList`] provides sorted,
//! filtered views for report consumers.

mod attribute;
mod list;
mod node;
mod set;

pub use attribute::{Attribute, AttributeDefinition, AttributeKind, AttributeValue};
pub use list::{PropertyList, SortCriterion};
pub use node::{Property, PropertyKind, PropertyRef, PropertyTreeNode};
pub use set::{PropertySet, SPECIAL_ATTRIBUTES};
