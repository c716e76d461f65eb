//! Backend-neutral statement model.
//!
//! A [Statement] accumulates predicate clauses, join declarations and a
//! sort selection while an entity filter interprets request parameters.
//! The two generators ([sql], [pipeline]) read it; nothing in here
//! talks to a store. One instance per query, never shared across
//! requests: the random seed is drawn per instance.

mod sql;

pub mod pipeline;

pub use sql::{SelectQuery, render_count, render_select};

use rand::RngCore;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::entities::EntityMeta;

/// Requested result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Random,
    Ascending,
    Descending,
    #[default]
    None,
}

impl SortOrder {
    /// Parse a canonical name or short alias, case-insensitively.
    /// Unrecognized input falls back to [SortOrder::None].
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "RANDOM" | "RAND" => SortOrder::Random,
            "ASCENDING" | "ASC" => SortOrder::Ascending,
            "DESCENDING" | "DESC" => SortOrder::Descending,
            "NONE" => SortOrder::None,
            _ => SortOrder::None,
        }
    }

    pub fn canonical_name(&self) -> &'static str {
        match self {
            SortOrder::Random => "RANDOM",
            SortOrder::Ascending => "ASCENDING",
            SortOrder::Descending => "DESCENDING",
            SortOrder::None => "NONE",
        }
    }

    /// True for the two orders that name a concrete sort field.
    pub fn is_explicit(&self) -> bool {
        matches!(self, SortOrder::Ascending | SortOrder::Descending)
    }
}

/// A positional parameter value bound by the execution collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(time::Date),
    /// Collection bound to a single membership placeholder.
    List(Vec<ParamValue>),
}

impl ParamValue {
    /// Document-store representation of the value.
    pub fn to_json(&self) -> JsonValue {
        match self {
            ParamValue::Text(s) => JsonValue::String(s.clone()),
            ParamValue::Int(i) => JsonValue::from(*i),
            ParamValue::Float(f) => JsonValue::from(*f),
            ParamValue::Bool(b) => JsonValue::Bool(*b),
            ParamValue::Date(d) => JsonValue::String(d.to_string()),
            ParamValue::List(values) => {
                JsonValue::Array(values.iter().map(ParamValue::to_json).collect())
            }
        }
    }
}

/// One predicate fragment: clause text plus its positional values.
///
/// Placeholders are written as bare `?`; the relational generator
/// rewrites them into ordinals at render time so independently composed
/// clauses still bind correctly after [Statement::combine].
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub text: String,
    pub params: Vec<ParamValue>,
}

/// A join declaration from one entity to another.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub local: &'static EntityMeta,
    pub foreign: &'static EntityMeta,
    pub local_field: &'static str,
    /// When present the join is keyed on an explicit foreign column
    /// instead of following the association path.
    pub foreign_field: Option<&'static str>,
}

/// Accumulator for one query's clauses, joins and sort selection.
#[derive(Debug)]
pub struct Statement {
    entity: &'static EntityMeta,
    clauses: Vec<Clause>,
    joins: Vec<Join>,
    sort_field: Option<String>,
    sort_order: SortOrder,
    seed: u32,
}

impl Statement {
    /// Create an empty statement for `entity` with a fresh random seed
    /// drawn from the request-scoped `rng`.
    pub fn new(entity: &'static EntityMeta, rng: &mut dyn RngCore) -> Self {
        Self {
            entity,
            clauses: Vec::new(),
            joins: Vec::new(),
            sort_field: None,
            sort_order: SortOrder::None,
            seed: rng.next_u32(),
        }
    }

    pub fn entity(&self) -> &'static EntityMeta {
        self.entity
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn sort_field(&self) -> Option<&str> {
        self.sort_field.as_deref()
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Append a predicate clause.
    ///
    /// The number of bare `?` placeholders in `text` must equal
    /// `params.len()`.
    pub fn add_clause(&mut self, text: impl Into<String>, params: Vec<ParamValue>) {
        let text = text.into();
        debug_assert_eq!(
            count_placeholders(&text),
            params.len(),
            "clause {text:?} placeholder/param mismatch"
        );
        self.clauses.push(Clause { text, params });
    }

    /// Declare a join to `foreign`. A second join to the same foreign
    /// entity is elided.
    pub fn add_join(
        &mut self,
        local: &'static EntityMeta,
        foreign: &'static EntityMeta,
        local_field: &'static str,
        foreign_field: Option<&'static str>,
    ) {
        self.push_join(Join {
            local,
            foreign,
            local_field,
            foreign_field,
        });
    }

    fn push_join(&mut self, join: Join) {
        if self.joins.iter().any(|j| j.foreign == join.foreign) {
            return;
        }
        self.joins.push(join);
    }

    /// Absorb another statement's clauses and joins. Used when a parent
    /// entity's filter delegates to a joined child entity's filter.
    /// The child's sort selection and seed are not carried over.
    pub fn combine(&mut self, other: Statement) {
        self.clauses.extend(other.clauses);
        for join in other.joins {
            self.push_join(join);
        }
    }

    /// Select an explicit field sort. `field` is a descriptor path.
    pub fn set_sort(&mut self, field: impl Into<String>, order: SortOrder) {
        debug_assert!(order.is_explicit(), "set_sort takes ASC or DESC");
        self.sort_field = Some(field.into());
        self.sort_order = order;
    }

    /// Mark the statement for store-native random ordering. The sort
    /// field stays unset; random results are non-reproducible.
    pub fn set_random_order(&mut self) {
        self.sort_order = SortOrder::Random;
    }

    /// Alias-qualify a descriptor path: paths entering a joined entity
    /// use the join alias directly, everything else hangs off the root
    /// alias.
    pub fn qualify_path(&self, path: &str) -> String {
        let first = path.split('.').next().unwrap_or(path);
        if self.joins.iter().any(|j| j.foreign.alias == first) {
            path.to_string()
        } else {
            format!("{}.{}", self.entity.alias, path)
        }
    }
}

/// Count bare `?` placeholders (ones not already ordinal-numbered).
fn count_placeholders(text: &str) -> usize {
    let bytes = text.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|(i, b)| {
            **b == b'?' && !bytes.get(i + 1).is_some_and(|next| next.is_ascii_digit())
        })
        .count()
}
