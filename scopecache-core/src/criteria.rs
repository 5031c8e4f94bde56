//! Query criteria forwarded to a store gateway.
//!
//! The cache layer never looks inside a [`Criteria`]; it passes the value
//! through to the gateway unchanged.

use serde::{Deserialize, Serialize};

use crate::{FilterExpr, ModelId};

/// Sort direction for an ordering term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// One ordering term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

/// Row lock requested for the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockMode {
    /// `FOR UPDATE`
    Update,
    /// `FOR SHARE`
    Share,
}

/// Related-entity include.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Include {
    /// Relation name as the gateway knows it.
    pub relation: String,
    /// Inner join (`true`) vs. outer join.
    pub required: bool,
}

/// Criteria for `load` / `load_many`.
///
/// `filter` terms are combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    pub attributes: Option<Vec<String>>,
    pub include: Vec<Include>,
    pub filter: Vec<FilterExpr>,
    pub order: Vec<OrderBy>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
    pub lock: Option<LockMode>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Criteria selecting a single id.
    pub fn by_id(id: ModelId) -> Self {
        Self::new().filter(FilterExpr::eq("id", serde_json::json!(id.get())))
    }

    pub fn attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = Some(attributes.into_iter().map(Into::into).collect());
        self
    }

    pub fn include(mut self, relation: impl Into<String>, required: bool) -> Self {
        self.include.push(Include {
            relation: relation.into(),
            required,
        });
        self
    }

    pub fn filter(mut self, expr: FilterExpr) -> Self {
        self.filter.push(expr);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order.push(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn lock(mut self, mode: LockMode) -> Self {
        self.lock = Some(mode);
        self
    }
}
