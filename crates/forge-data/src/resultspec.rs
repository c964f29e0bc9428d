//! Declarative filter and projection descriptor for build reads
//!
//! A `ResultSpec` travels with every read. It is interpreted twice behind
//! one interface: the store-expressible part is popped into a `BuildQuery`
//! and delegated, the remainder is applied in memory. Callers cannot tell
//! which path ran.

use forge_state::BuildQuery;
use serde::{Deserialize, Serialize};

/// A typed filter value, as it arrives from a caller.
///
/// Values are coerced to the filtered field's native type before
/// comparison: a textual `"82"` matches an integer field holding 82.
/// `Null` matches fields that are absent or unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
}

impl FieldValue {
    fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            FieldValue::Str(s) => s.parse().ok(),
            _ => None,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Equality after native-type coercion.
    pub fn coerced_eq(&self, other: &FieldValue) -> bool {
        if self == other {
            return true;
        }
        matches!((self.as_int(), other.as_int()), (Some(a), Some(b)) if a == b)
    }
}

/// Filter operator. `Eq` is set membership, `Ne` its complement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Ne,
}

/// One `(field, operator, value-set)` filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub values: Vec<FieldValue>,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp, values: Vec<FieldValue>) -> Self {
        Filter {
            field: field.into(),
            op,
            values,
        }
    }

    /// Apply the operator to a field's current value.
    pub fn matches(&self, actual: &FieldValue) -> bool {
        let member = self.values.iter().any(|v| v.coerced_eq(actual));
        match self.op {
            FilterOp::Eq => member,
            FilterOp::Ne => !member,
        }
    }
}

/// Filter set plus optional property projection.
///
/// `properties: None` returns all known properties; `Some(names)` keeps
/// only the named ones in the returned mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSpec {
    pub filters: Vec<Filter>,
    pub properties: Option<Vec<String>>,
}

impl ResultSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_properties(mut self, names: Vec<String>) -> Self {
        self.properties = Some(names);
        self
    }

    /// Move every filter the store can express into `query`, leaving the
    /// in-memory remainder in `self`.
    ///
    /// Only single-value `eq` filters on fields with a query slot are
    /// delegated, and only if the slot is still unconstrained (an address
    /// may have claimed it first).
    pub fn pop_store_query(&mut self, query: &mut BuildQuery) {
        self.filters.retain(|f| {
            if f.op != FilterOp::Eq || f.values.len() != 1 {
                return true;
            }
            let value = &f.values[0];
            match f.field.as_str() {
                "builderid" if query.builderid.is_none() => match value.as_int() {
                    Some(id) => {
                        query.builderid = Some(id);
                        false
                    }
                    None => true,
                },
                "buildrequestid" if query.buildrequestid.is_none() => match value.as_int() {
                    Some(id) => {
                        query.buildrequestid = Some(id);
                        false
                    }
                    None => true,
                },
                "workerid" if query.workerid.is_none() => match value.as_int() {
                    Some(id) => {
                        query.workerid = Some(id);
                        false
                    }
                    None => true,
                },
                "complete" if query.complete.is_none() => match value.as_bool() {
                    Some(c) => {
                        query.complete = Some(c);
                        false
                    }
                    None => true,
                },
                _ => true,
            }
        });
    }

    /// Apply the remaining filters in memory, preserving order.
    pub fn apply_filters<T>(&self, items: Vec<T>, field: impl Fn(&T, &str) -> FieldValue) -> Vec<T> {
        if self.filters.is_empty() {
            return items;
        }
        items
            .into_iter()
            .filter(|item| self.filters.iter().all(|f| f.matches(&field(item, &f.field))))
            .collect()
    }

    /// True if the projection keeps the given property name.
    pub fn keeps_property(&self, name: &str) -> bool {
        match &self.properties {
            None => true,
            Some(names) => names.iter().any(|n| n == name),
        }
    }
}
